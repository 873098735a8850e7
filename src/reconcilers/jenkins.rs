// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `Jenkins` reconciliation.

use crate::children::{ChildKind, ChildResource, Primary};
use crate::cluster::{ClusterClient, ObjectKey};
use crate::context::Context;
use crate::crd::Jenkins;
use crate::jenkins_resources::build_jenkins_children;
use crate::reconcilers::converge::{reconcile_with_timeout, PassOutcome, ReconcileError};
use std::sync::Arc;
use tracing::info;

impl Primary for Jenkins {
    const SECONDARY_KINDS: &'static [ChildKind] = &[
        ChildKind::Deployment,
        ChildKind::ServiceAccount,
        ChildKind::RoleBinding,
        ChildKind::Service,
        ChildKind::Route,
        ChildKind::PersistentVolumeClaim,
    ];

    fn desired_children(&self) -> Vec<ChildResource> {
        build_jenkins_children(self)
    }
}

/// Reconciles the `Jenkins` instance at `key`.
///
/// Creates whichever of the Deployment, ServiceAccount, RoleBinding, web and agent
/// Services, Route and (when persistence is enabled) PersistentVolumeClaim are missing.
///
/// # Errors
///
/// Returns an error when the instance cannot be fetched, its children cannot be owned,
/// the API server rejects a child, or the pass times out.
pub async fn reconcile_jenkins<C: ClusterClient>(
    ctx: Arc<Context<C>>,
    key: ObjectKey,
) -> Result<PassOutcome, ReconcileError> {
    info!("Reconciling Jenkins: {key}");
    reconcile_with_timeout::<Jenkins, C>(&ctx, &key).await
}
