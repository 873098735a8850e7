// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for all controllers.
//!
//! Both controllers receive an `Arc<Context>` holding:
//! - the cluster client used to read and create children
//! - the build trigger started when a `BuildConfig` is created
//! - the operator configuration
//!
//! Nothing in the context changes during a pass. Pass-scoped state lives in
//! [`crate::reconcilers::converge::PassContext`].

use crate::binary_build::{BuildTrigger, OcBuildTrigger};
use crate::cluster::{ClusterClient, KubeCluster};
use crate::config::OperatorConfig;
use kube::Client;
use std::sync::Arc;

/// Shared context passed to all controllers.
pub struct Context<C: ClusterClient = KubeCluster> {
    /// Cluster access for reconciliation passes
    pub cluster: C,

    /// Starts binary builds for `JenkinsImage` resources
    pub build_trigger: Arc<dyn BuildTrigger>,

    /// Operator settings
    pub config: OperatorConfig,
}

impl<C: ClusterClient> Context<C> {
    pub fn new(cluster: C, build_trigger: Arc<dyn BuildTrigger>, config: OperatorConfig) -> Self {
        Self {
            cluster,
            build_trigger,
            config,
        }
    }
}

impl Context<KubeCluster> {
    /// Context backed by the API server, starting builds with `oc`.
    #[must_use]
    pub fn from_client(client: Client, config: OperatorConfig) -> Self {
        Self::new(
            KubeCluster::new(client),
            Arc::new(OcBuildTrigger::default()),
            config,
        )
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        self.cluster.client()
    }
}
