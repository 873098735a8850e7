// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Watch registration for the controllers.
//!
//! Each controller watches its primary kind and every kind the primary may own. Events
//! on a child are routed to the instance named by the child's controller owner
//! reference, so a deleted or drifting child triggers a pass on its owner.
//!
//! Child watches only list objects labelled `app.kubernetes.io/managed-by=jenkins-operator`,
//! which every child carries.
//!
//! The primary kind must be served by the API server. Child kinds that are not served
//! (for example `Route` outside OpenShift) are skipped with a warning.

use crate::children::{ChildKind, Primary};
use crate::cluster::ClusterObject;
use crate::config::OperatorConfig;
use crate::labels::{K8S_MANAGED_BY, MANAGED_BY_JENKINS_OPERATOR};
use crate::openshift::{BuildConfig, ImageStream, Route};
use crate::reconcilers::ownership::controller_of;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Service, ServiceAccount};
use k8s_openapi::api::rbac::v1::RoleBinding;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::ListParams;
use kube::runtime::reflector::ObjectRef;
use kube::runtime::{watcher, Controller};
use kube::{Api, Client, Resource};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Something a controller watches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchTarget {
    /// The custom resource itself. Events enqueue the object.
    Primary,
    /// A child kind. Events enqueue the child's controller owner.
    Secondary(ChildKind),
}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("{kind} is not served by the API server: {source}")]
    PrimaryNotServed {
        kind: String,
        #[source]
        source: kube::Error,
    },
}

/// Everything the controller for `P` watches: the primary first, then each child kind.
#[must_use]
pub fn watch_targets<P: Primary>() -> Vec<WatchTarget> {
    std::iter::once(WatchTarget::Primary)
        .chain(P::SECONDARY_KINDS.iter().copied().map(WatchTarget::Secondary))
        .collect()
}

/// Key of the `P` instance controlling the object with metadata `meta`.
///
/// Returns `None` for objects without a controller reference, or controlled by
/// another kind.
#[must_use]
pub fn owner_key<P>(meta: &ObjectMeta) -> Option<ObjectRef<P>>
where
    P: Resource<DynamicType = ()>,
{
    let owner = controller_of(meta)?;
    if owner.kind != P::kind(&()) || owner.api_version != P::api_version(&()) {
        return None;
    }
    let namespace = meta.namespace.as_deref()?;
    Some(ObjectRef::new(&owner.name).within(namespace))
}

/// Watcher configuration for child kinds, limited to objects this operator manages.
#[must_use]
pub fn child_watcher_config() -> watcher::Config {
    watcher::Config::default().labels(&format!("{K8S_MANAGED_BY}={MANAGED_BY_JENKINS_OPERATOR}"))
}

fn scoped_api<K: ClusterObject>(client: &Client, config: &OperatorConfig) -> Api<K> {
    match config.watch_namespace.as_deref() {
        Some(namespace) => Api::namespaced(client.clone(), namespace),
        None => Api::all(client.clone()),
    }
}

async fn ensure_served<K: ClusterObject>(api: &Api<K>) -> Result<(), kube::Error> {
    api.list(&ListParams::default().limit(1)).await.map(|_| ())
}

/// Build the controller for `P` with all of its watches registered.
///
/// # Errors
///
/// Fails when the primary kind cannot be listed.
pub async fn build_controller<P: Primary>(
    client: &Client,
    config: &OperatorConfig,
) -> Result<Controller<P>, WatchError> {
    let kind = P::kind(&()).to_string();
    let primary: Api<P> = scoped_api(client, config);
    ensure_served(&primary)
        .await
        .map_err(|source| WatchError::PrimaryNotServed {
            kind: kind.clone(),
            source,
        })?;

    let controller = Controller::new(primary, watcher::Config::default());
    let controller = register_watches(controller, client, config).await;

    info!(
        "{kind} controller watching {}",
        config.watch_namespace.as_deref().unwrap_or("all namespaces")
    );
    Ok(controller)
}

/// Add a watch for every child kind of `P` that the cluster serves.
pub async fn register_watches<P: Primary>(
    mut controller: Controller<P>,
    client: &Client,
    config: &OperatorConfig,
) -> Controller<P> {
    for target in watch_targets::<P>() {
        if let WatchTarget::Secondary(child) = target {
            controller = watch_child_kind(controller, client, config, child).await;
        }
    }
    controller
}

async fn watch_child_kind<P: Primary>(
    controller: Controller<P>,
    client: &Client,
    config: &OperatorConfig,
    child: ChildKind,
) -> Controller<P> {
    match child {
        ChildKind::Deployment => watch_owned::<P, Deployment>(controller, client, config).await,
        ChildKind::ServiceAccount => {
            watch_owned::<P, ServiceAccount>(controller, client, config).await
        }
        ChildKind::RoleBinding => watch_owned::<P, RoleBinding>(controller, client, config).await,
        ChildKind::Service => watch_owned::<P, Service>(controller, client, config).await,
        ChildKind::Route => watch_owned::<P, Route>(controller, client, config).await,
        ChildKind::PersistentVolumeClaim => {
            watch_owned::<P, PersistentVolumeClaim>(controller, client, config).await
        }
        ChildKind::ImageStream => watch_owned::<P, ImageStream>(controller, client, config).await,
        ChildKind::BuildConfig => watch_owned::<P, BuildConfig>(controller, client, config).await,
    }
}

async fn watch_owned<P, K>(
    controller: Controller<P>,
    client: &Client,
    config: &OperatorConfig,
) -> Controller<P>
where
    P: Primary,
    K: ClusterObject,
{
    let api: Api<K> = scoped_api(client, config);
    match ensure_served(&api).await {
        Ok(()) => {
            debug!("{} controller watching owned {}", P::kind(&()), K::kind(&()));
            controller.watches(api, child_watcher_config(), |child: K| {
                owner_key::<P>(child.meta())
            })
        }
        Err(e) => {
            warn!(
                "{} is not served by this cluster, {} controller will not watch it: {e}",
                K::kind(&()),
                P::kind(&())
            );
            controller
        }
    }
}
