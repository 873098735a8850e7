// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `JenkinsImage` reconciliation.

use crate::binary_build::BinaryBuildRequest;
use crate::children::{ChildKind, ChildResource, Primary};
use crate::cluster::{ClusterClient, ObjectKey};
use crate::context::Context;
use crate::crd::JenkinsImage;
use crate::jenkinsimage_resources::{build_jenkins_image_children, build_request};
use crate::reconcilers::converge::{reconcile_with_timeout, PassOutcome, ReconcileError};
use std::sync::Arc;
use tracing::info;

impl Primary for JenkinsImage {
    const SECONDARY_KINDS: &'static [ChildKind] = &[ChildKind::ImageStream, ChildKind::BuildConfig];

    fn desired_children(&self) -> Vec<ChildResource> {
        build_jenkins_image_children(self)
    }

    fn binary_build(&self) -> Option<BinaryBuildRequest> {
        Some(build_request(self))
    }
}

/// Reconciles the `JenkinsImage` at `key`.
///
/// Creates the ImageStream and BuildConfig when missing. Creating the BuildConfig
/// starts one binary build with the instance's plugin list.
///
/// # Errors
///
/// Returns an error when the instance cannot be fetched, its children cannot be owned,
/// the API server rejects a child, or the pass times out.
pub async fn reconcile_jenkins_image<C: ClusterClient>(
    ctx: Arc<Context<C>>,
    key: ObjectKey,
) -> Result<PassOutcome, ReconcileError> {
    info!("Reconciling JenkinsImage: {key}");
    reconcile_with_timeout::<JenkinsImage, C>(&ctx, &key).await
}
