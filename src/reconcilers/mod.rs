// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes reconciliation controllers for Jenkins resources.
//!
//! # Reconciliation Architecture
//!
//! The operator follows the standard Kubernetes controller pattern:
//!
//! 1. **Watch** - Monitor the custom resources and every child kind they own
//! 2. **Reconcile** - Compute the desired children of an instance
//! 3. **Create** - Create the children that are missing, never touching existing ones
//!
//! Deleting an instance needs no reconciler: children carry a controller owner
//! reference and are removed by the cluster garbage collector.
//!
//! # Available Reconcilers
//!
//! - [`reconcile_jenkins`] - Deployment, Services, Route, storage and RBAC of a Jenkins server
//! - [`reconcile_jenkins_image`] - ImageStream and BuildConfig of a custom Jenkins image
//!
//! # Example: Using a Reconciler
//!
//! ```rust,no_run
//! use jenkins_operator::cluster::ObjectKey;
//! use jenkins_operator::config::OperatorConfig;
//! use jenkins_operator::context::Context;
//! use jenkins_operator::reconcilers::{reconcile_jenkins, requeue_action};
//! use std::sync::Arc;
//!
//! async fn reconcile_one(client: kube::Client) -> anyhow::Result<()> {
//!     let ctx = Arc::new(Context::from_client(client, OperatorConfig::default()));
//!     let outcome = reconcile_jenkins(ctx, ObjectKey::new("demo", "jenkins")).await?;
//!     let _action = requeue_action(&outcome);
//!     Ok(())
//! }
//! ```

pub mod converge;
pub mod jenkins;
pub mod jenkinsimage;
pub mod messages;
pub mod ownership;

#[cfg(test)]
mod converge_tests;

pub use converge::{ChildRef, PassContext, PassOutcome, ReconcileError};
pub use jenkins::reconcile_jenkins;
pub use jenkinsimage::reconcile_jenkins_image;

use crate::constants::{ERROR_REQUEUE_DURATION_SECS, TRANSIENT_REQUEUE_DURATION_SECS};
use kube::runtime::controller::Action;
use std::time::Duration;

/// Controller action after a completed pass.
///
/// A pass with a pending transient failure runs again shortly. Otherwise the
/// instance waits for the next change to itself or to one of its children.
#[must_use]
pub fn requeue_action(outcome: &PassOutcome) -> Action {
    if outcome.requeue {
        Action::requeue(Duration::from_secs(TRANSIENT_REQUEUE_DURATION_SECS))
    } else {
        Action::await_change()
    }
}

/// Controller action after a failed pass.
#[must_use]
pub fn error_action(err: &ReconcileError) -> Action {
    if err.is_transient() {
        Action::requeue(Duration::from_secs(TRANSIENT_REQUEUE_DURATION_SECS))
    } else {
        Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
    }
}
