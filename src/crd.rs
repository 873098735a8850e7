// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for Jenkins management.
//!
//! This module defines the Kubernetes Custom Resource Definitions watched by the operator.
//!
//! # Resource Types
//!
//! - [`Jenkins`] - A Jenkins server: Deployment, Services, Route, storage and RBAC
//! - [`JenkinsImage`] - A custom Jenkins image built from a plugin list
//!
//! # Example: Declaring a Jenkins instance
//!
//! ```rust,no_run
//! use jenkins_operator::crd::{JenkinsPersistence, JenkinsSpec};
//!
//! let spec = JenkinsSpec {
//!     persistence: JenkinsPersistence {
//!         enabled: true,
//!         size: Some("5Gi".to_string()),
//!     },
//! };
//! ```

use crate::constants::JENKINS_PVC_SIZE;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Persistence settings of a Jenkins instance.
///
/// When `enabled` is `true`, `JENKINS_HOME` is backed by a `PersistentVolumeClaim`
/// sized from `size`. Otherwise an `emptyDir` volume is used and all data is lost when
/// the pod restarts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JenkinsPersistence {
    /// Back `JENKINS_HOME` with a `PersistentVolumeClaim`.
    #[serde(default)]
    pub enabled: bool,

    /// Requested storage quantity (e.g. "5Gi"). Defaults to "1Gi" when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl JenkinsPersistence {
    /// Storage quantity to request, falling back to the default when unset or blank.
    #[must_use]
    pub fn storage_size(&self) -> &str {
        self.size
            .as_deref()
            .map(str::trim)
            .filter(|size| !size.is_empty())
            .unwrap_or(JENKINS_PVC_SIZE)
    }
}

/// `Jenkins` describes the desired state of a Jenkins server.
///
/// The operator creates and owns the workload, the web and agent services, an edge
/// terminated route, the service account with its role binding, and optionally a
/// `PersistentVolumeClaim`. Existing children are never modified.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "jenkins.dev",
    version = "v1alpha1",
    kind = "Jenkins",
    plural = "jenkins",
    namespaced,
    doc = "Jenkins represents a Jenkins server. The operator creates the Deployment, Services, Route, ServiceAccount, RoleBinding and optional PersistentVolumeClaim it needs."
)]
#[serde(rename_all = "camelCase")]
pub struct JenkinsSpec {
    /// Persistence configuration for `JENKINS_HOME`.
    #[serde(default)]
    pub persistence: JenkinsPersistence,
}

/// A Jenkins plugin pinned to a version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JenkinsPlugin {
    /// Plugin short name (e.g. "kubernetes").
    pub name: String,

    /// Plugin version (e.g. "1.21.2").
    pub version: String,
}

/// `JenkinsImage` describes a Jenkins image built on top of the OpenShift base image.
///
/// The operator creates an `ImageStream` and a binary `BuildConfig`, then starts one
/// build fed with the plugin list when the `BuildConfig` is first created.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "jenkins.dev",
    version = "v1alpha1",
    kind = "JenkinsImage",
    plural = "jenkinsimages",
    namespaced,
    doc = "JenkinsImage builds a custom Jenkins image containing the listed plugins."
)]
#[serde(rename_all = "camelCase")]
pub struct JenkinsImageSpec {
    /// Plugins installed into the image.
    #[serde(default)]
    pub plugins: Vec<JenkinsPlugin>,
}
