// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Create-if-missing convergence of a primary resource's children.
//!
//! One pass:
//!
//! 1. Fetch the instance by key. A missing or terminating instance ends the pass
//!    quietly; its children are garbage collected through their owner references.
//! 2. Template the desired children and give each one a controller reference to the
//!    instance. Ownership failures abort the pass before anything is created.
//! 3. Walk the children in order. Missing ones are created, existing ones are left
//!    untouched. Transient failures are recorded and the walk continues; any other
//!    failure aborts the pass.
//! 4. Requeue while a transient failure is pending.
//!
//! When the `BuildConfig` child is created by the pass, the instance's binary build is
//! started in the background. Its outcome never affects the pass.

use crate::binary_build::{BinaryBuildRequest, BuildTrigger};
use crate::children::{ChildKind, ChildResource, Primary};
use crate::cluster::{ClusterClient, ClusterError, ObjectKey};
use crate::context::Context;
use crate::metrics;
use crate::reconcilers::messages::{Message, Messages, PassResult};
use crate::reconcilers::ownership::{
    controller_owner_reference, set_controller_reference, OwnershipError,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Resource;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Kind and name of a child touched by a pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildRef {
    pub kind: ChildKind,
    pub name: String,
}

impl From<&ChildResource> for ChildRef {
    fn from(child: &ChildResource) -> Self {
        Self {
            kind: child.kind(),
            name: child.name().to_string(),
        }
    }
}

/// Result of a completed pass.
#[derive(Debug, Default)]
pub struct PassOutcome {
    /// Run the pass again: a transient failure is pending.
    pub requeue: bool,
    /// Children created by this pass, in order.
    pub created: Vec<ChildRef>,
    /// Children that already existed.
    pub skipped: Vec<ChildRef>,
    pub messages: Vec<Message>,
}

impl PassOutcome {
    /// Outcome of a pass with nothing to do.
    #[must_use]
    pub fn done() -> Self {
        Self::default()
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to fetch {key}: {source}")]
    Fetch {
        key: ObjectKey,
        #[source]
        source: ClusterError,
    },

    #[error("cannot take ownership of the children of {key}: {source}")]
    OwnerReference {
        key: ObjectKey,
        #[source]
        source: OwnershipError,
    },

    #[error("{kind} {key}: {source}")]
    Fatal {
        kind: ChildKind,
        key: ObjectKey,
        #[source]
        source: ClusterError,
    },

    #[error("reconciliation of {key} did not finish within {after:?}")]
    Timeout { key: ObjectKey, after: Duration },
}

impl ReconcileError {
    /// Whether a later pass may succeed without any change to the cluster.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ReconcileError::Fetch { source, .. } => source.is_transient(),
            ReconcileError::Timeout { .. } => true,
            ReconcileError::OwnerReference { .. } | ReconcileError::Fatal { .. } => false,
        }
    }

    /// Short label used for the `error_type` metric.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            ReconcileError::Fetch { .. } => "fetch",
            ReconcileError::OwnerReference { .. } => "owner_reference",
            ReconcileError::Fatal { source, .. } => source.category(),
            ReconcileError::Timeout { .. } => "timeout",
        }
    }
}

/// State threaded through the steps of one pass.
pub struct PassContext<'a, C: ClusterClient> {
    pub key: ObjectKey,
    pub owner: OwnerReference,
    pub cluster: &'a C,
    pub messages: Messages,
}

enum ChildOutcome {
    Created,
    Skipped,
    /// Left for a later pass.
    Deferred,
}

/// Run one pass for the instance of `P` at `key`, bounded by the configured timeout.
///
/// # Errors
///
/// See [`ReconcileError`]. A timeout cancels in-flight cluster calls.
pub async fn reconcile_with_timeout<P, C>(
    ctx: &Context<C>,
    key: &ObjectKey,
) -> Result<PassOutcome, ReconcileError>
where
    P: Primary,
    C: ClusterClient,
{
    let after = ctx.config.reconcile_timeout;
    tokio::time::timeout(
        after,
        reconcile::<P, C>(&ctx.cluster, &ctx.build_trigger, key),
    )
    .await
    .map_err(|_| ReconcileError::Timeout {
        key: key.clone(),
        after,
    })?
}

/// Run one pass for the instance of `P` at `key`.
///
/// # Errors
///
/// - [`ReconcileError::Fetch`] when the instance cannot be read
/// - [`ReconcileError::OwnerReference`] when children cannot be owned by the instance
/// - [`ReconcileError::Fatal`] when the API server rejects a child
pub async fn reconcile<P, C>(
    cluster: &C,
    build_trigger: &Arc<dyn BuildTrigger>,
    key: &ObjectKey,
) -> Result<PassOutcome, ReconcileError>
where
    P: Primary,
    C: ClusterClient,
{
    let kind = P::kind(&()).to_string();

    let instance = match cluster.get::<P>(&key.namespace, &key.name).await {
        Ok(instance) => instance,
        Err(ClusterError::NotFound) => {
            debug!("{kind} {key} no longer exists, nothing to do");
            return Ok(PassOutcome::done());
        }
        Err(source) => {
            return Err(ReconcileError::Fetch {
                key: key.clone(),
                source,
            })
        }
    };

    if instance.meta().deletion_timestamp.is_some() {
        debug!("{kind} {key} is being deleted, leaving its children to the garbage collector");
        return Ok(PassOutcome::done());
    }

    let owner = controller_owner_reference(&instance).map_err(|source| {
        ReconcileError::OwnerReference {
            key: key.clone(),
            source,
        }
    })?;

    let mut children = instance.desired_children();
    for child in &mut children {
        set_controller_reference(child.meta_mut(), &owner, &key.namespace).map_err(
            |source| ReconcileError::OwnerReference {
                key: key.clone(),
                source,
            },
        )?;
    }

    let mut pass = PassContext {
        key: key.clone(),
        owner,
        cluster,
        messages: Messages::new(format!("{kind} {key}")),
    };
    let mut outcome = PassOutcome::done();

    for child in &children {
        match converge_child(&mut pass, child).await? {
            ChildOutcome::Created => {
                outcome.created.push(child.into());
                if child.kind() == ChildKind::BuildConfig {
                    if let Some(request) = instance.binary_build() {
                        spawn_build(Arc::clone(build_trigger), request);
                    }
                }
            }
            ChildOutcome::Skipped => outcome.skipped.push(child.into()),
            ChildOutcome::Deferred => {}
        }
    }

    outcome.requeue = pass.messages.derive_result() == PassResult::Requeue;
    outcome.messages = pass.messages.into_entries();
    Ok(outcome)
}

async fn converge_child<C: ClusterClient>(
    pass: &mut PassContext<'_, C>,
    child: &ChildResource,
) -> Result<ChildOutcome, ReconcileError> {
    let kind = child.kind();
    let child_key = ObjectKey::new(child.namespace(), child.name());

    match child.exists(pass.cluster).await {
        Ok(true) => {
            debug!("{kind} {child_key} already exists");
            metrics::record_child_skipped(kind.as_str());
            return Ok(ChildOutcome::Skipped);
        }
        Ok(false) => {}
        Err(e) => return defer_or_abort(pass, kind, child_key, e),
    }

    match child.create(pass.cluster).await {
        Ok(()) => {
            pass.messages.info(format!("created {kind} {child_key}"));
            metrics::record_child_created(kind.as_str());
            Ok(ChildOutcome::Created)
        }
        Err(ClusterError::AlreadyExists) => {
            debug!("{kind} {child_key} was created concurrently");
            metrics::record_child_skipped(kind.as_str());
            Ok(ChildOutcome::Skipped)
        }
        // The kind is not served by this cluster (e.g. Route on plain Kubernetes)
        Err(ClusterError::NotFound) => {
            pass.messages
                .warning(format!("cannot create {kind} {child_key}: kind not served"));
            Ok(ChildOutcome::Deferred)
        }
        Err(e) => defer_or_abort(pass, kind, child_key, e),
    }
}

fn defer_or_abort<C: ClusterClient>(
    pass: &mut PassContext<'_, C>,
    kind: ChildKind,
    child_key: ObjectKey,
    err: ClusterError,
) -> Result<ChildOutcome, ReconcileError> {
    if err.is_transient() {
        // Fatal errors are recorded by the controller against the primary kind
        metrics::record_error(kind.as_str(), err.category());
        pass.messages.error(format!("{kind} {child_key}: {err}"), true);
        Ok(ChildOutcome::Deferred)
    } else {
        pass.messages
            .error(format!("{kind} {child_key}: {err}"), false);
        Err(ReconcileError::Fatal {
            kind,
            key: child_key,
            source: err,
        })
    }
}

fn spawn_build(trigger: Arc<dyn BuildTrigger>, request: BinaryBuildRequest) {
    tokio::spawn(async move {
        match trigger.start_build(&request).await {
            Ok(()) => metrics::record_build_trigger("started"),
            Err(e) => {
                warn!(
                    namespace = %request.namespace,
                    build_config = %request.build_config,
                    "Failed to start build: {e}"
                );
                metrics::record_build_trigger("failed");
            }
        }
    });
}
