// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Narrow cluster access used by the reconcilers.
//!
//! Reconcilers only ever read an object by namespaced name or create a new one. Both
//! operations go through [`ClusterClient`] so the convergence logic can run against the
//! real API server ([`KubeCluster`]) or an in-memory double in tests.
//!
//! API failures are classified once, here, into [`ClusterError`]. The reconcilers branch
//! on that classification instead of on raw HTTP status codes.

use async_trait::async_trait;
use kube::api::PostParams;
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Any namespaced, statically typed Kubernetes object the operator reads or creates.
pub trait ClusterObject:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + fmt::Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<T> ClusterObject for T where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + fmt::Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Namespace and name of an object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of an existing object, `None` when its name or namespace is unset.
    pub fn of<K: Resource>(obj: &K) -> Option<Self> {
        let meta = obj.meta();
        Some(Self::new(meta.namespace.clone()?, meta.name.clone()?))
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Classified failure of a cluster call.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ClusterError {
    /// The object does not exist.
    #[error("not found")]
    NotFound,

    /// Creation raced with another writer; the object exists now.
    #[error("already exists")]
    AlreadyExists,

    /// Rate limiting, server errors, conflicts and transport failures. Worth retrying.
    #[error("transient API failure: {message}")]
    Transient { code: Option<u16>, message: String },

    /// The API server refused the request. Retrying the same request cannot succeed.
    #[error("request rejected ({code} {reason}): {message}")]
    Rejected {
        code: u16,
        reason: String,
        message: String,
    },

    /// The object could not be encoded or decoded.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ClusterError {
    /// Whether the failure may go away on its own.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, ClusterError::Transient { .. })
    }

    /// Short label used for the `error_type` metric.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            ClusterError::NotFound => "not_found",
            ClusterError::AlreadyExists => "already_exists",
            ClusterError::Transient { .. } => "transient",
            ClusterError::Rejected { .. } => "rejected",
            ClusterError::Serialization(_) => "serialization",
        }
    }
}

impl From<kube::Error> for ClusterError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(ae) => match ae.code {
                404 => ClusterError::NotFound,
                409 if ae.reason == "AlreadyExists" => ClusterError::AlreadyExists,
                409 | 429 | 500..=599 => ClusterError::Transient {
                    code: Some(ae.code),
                    message: ae.message,
                },
                code => ClusterError::Rejected {
                    code,
                    reason: ae.reason,
                    message: ae.message,
                },
            },
            kube::Error::SerdeError(e) => ClusterError::Serialization(e.to_string()),
            // Connection, TLS and other transport level failures
            other => ClusterError::Transient {
                code: None,
                message: other.to_string(),
            },
        }
    }
}

/// Read and create access to namespaced objects.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Fetch `namespace/name`.
    async fn get<K: ClusterObject>(&self, namespace: &str, name: &str) -> Result<K, ClusterError>;

    /// Create `obj` in `namespace`, returning the object as stored.
    async fn create<K: ClusterObject>(&self, namespace: &str, obj: &K) -> Result<K, ClusterError>;
}

/// [`ClusterClient`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ClusterClient for KubeCluster {
    async fn get<K: ClusterObject>(&self, namespace: &str, name: &str) -> Result<K, ClusterError> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get(name).await?)
    }

    async fn create<K: ClusterObject>(&self, namespace: &str, obj: &K) -> Result<K, ClusterError> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.create(&PostParams::default(), obj).await?)
    }
}
