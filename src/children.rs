// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Child resources owned by the operator's custom resources.
//!
//! [`ChildResource`] is the closed set of object kinds a reconciliation pass may create.
//! Each pass computes the desired children of a [`Primary`] resource fresh, then
//! compares them with the cluster by namespaced name only. Existing children are left
//! untouched.

use crate::binary_build::BinaryBuildRequest;
use crate::cluster::{ClusterClient, ClusterError, ClusterObject};
use crate::openshift::{BuildConfig, ImageStream, Route};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Service, ServiceAccount};
use k8s_openapi::api::rbac::v1::RoleBinding;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Resource;
use std::fmt;

/// Kind of a child resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChildKind {
    Deployment,
    ServiceAccount,
    RoleBinding,
    Service,
    Route,
    PersistentVolumeClaim,
    ImageStream,
    BuildConfig,
}

impl ChildKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ChildKind::Deployment => "Deployment",
            ChildKind::ServiceAccount => "ServiceAccount",
            ChildKind::RoleBinding => "RoleBinding",
            ChildKind::Service => "Service",
            ChildKind::Route => "Route",
            ChildKind::PersistentVolumeClaim => "PersistentVolumeClaim",
            ChildKind::ImageStream => "ImageStream",
            ChildKind::BuildConfig => "BuildConfig",
        }
    }
}

impl fmt::Display for ChildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A desired child object.
#[derive(Clone, Debug, PartialEq)]
pub enum ChildResource {
    Deployment(Deployment),
    ServiceAccount(ServiceAccount),
    RoleBinding(RoleBinding),
    Service(Service),
    Route(Route),
    PersistentVolumeClaim(PersistentVolumeClaim),
    ImageStream(ImageStream),
    BuildConfig(BuildConfig),
}

// Expands `$body` once per variant with `$obj` bound to the typed object.
macro_rules! with_child {
    ($child:expr, $obj:ident => $body:expr) => {
        match $child {
            ChildResource::Deployment($obj) => $body,
            ChildResource::ServiceAccount($obj) => $body,
            ChildResource::RoleBinding($obj) => $body,
            ChildResource::Service($obj) => $body,
            ChildResource::Route($obj) => $body,
            ChildResource::PersistentVolumeClaim($obj) => $body,
            ChildResource::ImageStream($obj) => $body,
            ChildResource::BuildConfig($obj) => $body,
        }
    };
}

impl ChildResource {
    #[must_use]
    pub fn kind(&self) -> ChildKind {
        match self {
            ChildResource::Deployment(_) => ChildKind::Deployment,
            ChildResource::ServiceAccount(_) => ChildKind::ServiceAccount,
            ChildResource::RoleBinding(_) => ChildKind::RoleBinding,
            ChildResource::Service(_) => ChildKind::Service,
            ChildResource::Route(_) => ChildKind::Route,
            ChildResource::PersistentVolumeClaim(_) => ChildKind::PersistentVolumeClaim,
            ChildResource::ImageStream(_) => ChildKind::ImageStream,
            ChildResource::BuildConfig(_) => ChildKind::BuildConfig,
        }
    }

    #[must_use]
    pub fn meta(&self) -> &ObjectMeta {
        with_child!(self, obj => obj.meta())
    }

    pub fn meta_mut(&mut self) -> &mut ObjectMeta {
        with_child!(self, obj => obj.meta_mut())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.meta().name.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        self.meta().namespace.as_deref().unwrap_or_default()
    }

    /// Whether an object of the same kind and namespaced name exists.
    ///
    /// # Errors
    ///
    /// Returns every lookup failure other than `NotFound`.
    pub async fn exists<C: ClusterClient>(&self, cluster: &C) -> Result<bool, ClusterError> {
        with_child!(self, obj => exists_like(cluster, obj).await)
    }

    /// Create the object.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure, including `AlreadyExists`.
    pub async fn create<C: ClusterClient>(&self, cluster: &C) -> Result<(), ClusterError> {
        with_child!(self, obj => cluster.create(self.namespace(), obj).await.map(|_| ()))
    }
}

async fn exists_like<C, K>(cluster: &C, obj: &K) -> Result<bool, ClusterError>
where
    C: ClusterClient,
    K: ClusterObject,
{
    let meta = obj.meta();
    let namespace = meta.namespace.as_deref().unwrap_or_default();
    let name = meta.name.as_deref().unwrap_or_default();
    match cluster.get::<K>(namespace, name).await {
        Ok(_) => Ok(true),
        Err(ClusterError::NotFound) => Ok(false),
        Err(e) => Err(e),
    }
}

/// A custom resource that owns child resources.
pub trait Primary: ClusterObject {
    /// Every kind that [`Primary::desired_children`] may produce.
    const SECONDARY_KINDS: &'static [ChildKind];

    /// The children this instance should have, in creation order.
    fn desired_children(&self) -> Vec<ChildResource>;

    /// Build to start after the child of kind `BuildConfig` was created by this operator.
    fn binary_build(&self) -> Option<BinaryBuildRequest> {
        None
    }
}
