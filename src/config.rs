// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command line and environment configuration.

use crate::constants::{
    DEFAULT_CONCURRENCY, DEFAULT_LEASE_NAME, DEFAULT_METRICS_ADDR, DEFAULT_RECONCILE_TIMEOUT_SECS,
};
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Jenkins operator for Kubernetes and OpenShift.
#[derive(Clone, Debug, Parser)]
#[command(name = "jenkins-operator", version, about)]
pub struct Cli {
    /// Namespace to watch. Watches all namespaces when empty.
    #[arg(long, env = "WATCH_NAMESPACE", default_value = "")]
    pub namespace: String,

    /// Address of the metrics and health endpoint.
    #[arg(long, env = "METRICS_ADDR", default_value = DEFAULT_METRICS_ADDR)]
    pub metrics_addr: SocketAddr,

    /// Only reconcile while holding the leader lease.
    #[arg(long, env = "LEADER_ELECTION", default_value_t = false)]
    pub leader_election: bool,

    /// Name of the leader election lease.
    #[arg(long, env = "LEASE_NAME", default_value = DEFAULT_LEASE_NAME)]
    pub lease_name: String,

    /// Namespace of the leader election lease. Defaults to the pod namespace.
    #[arg(long, env = "POD_NAMESPACE", default_value = "default")]
    pub lease_namespace: String,

    /// Identity used for the lease. Defaults to the pod name.
    #[arg(long, env = "POD_NAME")]
    pub pod_name: Option<String>,

    /// Number of objects reconciled concurrently per controller.
    #[arg(long, env = "RECONCILE_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: u16,

    /// Upper bound in seconds for a single reconciliation pass.
    #[arg(long, env = "RECONCILE_TIMEOUT_SECS", default_value_t = DEFAULT_RECONCILE_TIMEOUT_SECS)]
    pub reconcile_timeout: u64,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(long, env = "OPERATOR_DEBUG", default_value_t = false)]
    pub debug: bool,
}

/// Settings shared by the controllers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatorConfig {
    /// `None` watches every namespace.
    pub watch_namespace: Option<String>,
    pub concurrency: u16,
    pub reconcile_timeout: Duration,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            watch_namespace: None,
            concurrency: DEFAULT_CONCURRENCY,
            reconcile_timeout: Duration::from_secs(DEFAULT_RECONCILE_TIMEOUT_SECS),
        }
    }
}

impl From<&Cli> for OperatorConfig {
    fn from(cli: &Cli) -> Self {
        let namespace = cli.namespace.trim();
        Self {
            watch_namespace: (!namespace.is_empty()).then(|| namespace.to_string()),
            concurrency: cli.concurrency,
            reconcile_timeout: Duration::from_secs(cli.reconcile_timeout.max(1)),
        }
    }
}

impl Cli {
    /// Default log filter when `RUST_LOG` is unset.
    #[must_use]
    pub fn default_log_filter(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}
