// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # Jenkins Operator for Kubernetes and OpenShift
//!
//! Runs Jenkins servers and builds custom Jenkins images from two custom resources
//! in the `jenkins.dev/v1alpha1` API group.
//!
//! ## Overview
//!
//! - A `Jenkins` resource gets a Deployment, a ServiceAccount with edit rights, a
//!   web Service, an agent Service, an edge-terminated Route and, when persistence
//!   is enabled, a PersistentVolumeClaim.
//! - A `JenkinsImage` resource gets an ImageStream and a binary-source
//!   BuildConfig. A build is started with the requested plugin list whenever the
//!   BuildConfig is created.
//!
//! Reconciliation is create-only: missing children are created with a controller
//! owner reference, existing ones are left untouched.
//!
//! ## Modules
//!
//! - [`crd`] - Custom resource types
//! - [`openshift`] - Route, ImageStream and BuildConfig types
//! - [`jenkins_resources`] / [`jenkinsimage_resources`] - Desired children builders
//! - [`children`] - Closed set of child kinds and the `Primary` trait
//! - [`cluster`] - Cluster client abstraction and error classification
//! - [`binary_build`] - Starting binary builds
//! - [`reconcilers`] - Reconciliation passes
//! - [`watches`] - Controller watch registration
//! - [`leader`] - Lease based leader election
//!
//! ## Example
//!
//! ```rust,no_run
//! use jenkins_operator::crd::{Jenkins, JenkinsPersistence, JenkinsSpec};
//! use jenkins_operator::jenkins_resources::build_jenkins_children;
//!
//! let mut jenkins = Jenkins::new(
//!     "jenkins",
//!     JenkinsSpec {
//!         persistence: JenkinsPersistence {
//!             enabled: true,
//!             size: Some("5Gi".to_string()),
//!         },
//!     },
//! );
//! jenkins.metadata.namespace = Some("ci".to_string());
//!
//! assert_eq!(build_jenkins_children(&jenkins).len(), 7);
//! ```

pub mod binary_build;
pub mod children;
pub mod cluster;
pub mod config;
pub mod constants;
pub mod context;
pub mod crd;
pub mod jenkins_resources;
pub mod jenkinsimage_resources;
pub mod labels;
pub mod leader;
pub mod metrics;
pub mod openshift;
pub mod reconcilers;
pub mod watches;

#[cfg(test)]
mod testing;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod watches_tests;
