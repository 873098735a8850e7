// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Leader election on a `coordination.k8s.io` Lease.
//!
//! When several operator replicas run, only the lease holder starts controllers.
//! A replica that loses the lease stops reconciling and exits so that it restarts
//! as a follower.

use crate::constants::{DEFAULT_LEASE_DURATION_SECS, DEFAULT_LEASE_GRACE_SECS};
use crate::metrics::{record_leader_elected, record_leader_lost};
use anyhow::{Context as _, Result};
use kube::Client;
use kube_lease_manager::{LeaseManager, LeaseManagerBuilder, LeaseManagerError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Lease settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaseSettings {
    pub name: String,
    pub namespace: String,
    pub identity: String,
    pub duration_secs: u64,
    pub grace_secs: u64,
}

impl LeaseSettings {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        identity: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            identity: identity.unwrap_or_else(default_identity),
            duration_secs: DEFAULT_LEASE_DURATION_SECS,
            grace_secs: DEFAULT_LEASE_GRACE_SECS,
        }
    }
}

/// Identity used when no pod name is configured.
#[must_use]
pub fn default_identity() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| format!("jenkins-operator-{}", std::process::id()))
}

/// Held leadership. Dropping it stops renewing the lease.
pub struct Leadership {
    identity: String,
    channel: watch::Receiver<bool>,
    task: JoinHandle<Result<LeaseManager, LeaseManagerError>>,
}

impl Leadership {
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Resolves once the lease is lost or the lease task stops.
    pub async fn lost(&mut self) {
        loop {
            if self.channel.changed().await.is_err() {
                warn!("Lease manager for {} stopped", self.identity);
                break;
            }
            if !*self.channel.borrow_and_update() {
                break;
            }
        }
        record_leader_lost(&self.identity);
    }
}

impl Drop for Leadership {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Block until this replica holds the lease.
///
/// # Errors
///
/// Fails when the lease manager cannot be built or stops before leadership is acquired.
pub async fn acquire(client: Client, settings: &LeaseSettings) -> Result<Leadership> {
    info!(
        "Waiting for lease {}/{} as {}",
        settings.namespace, settings.name, settings.identity
    );

    let manager = LeaseManagerBuilder::new(client, &settings.name)
        .with_namespace(&settings.namespace)
        .with_identity(&settings.identity)
        .with_duration(settings.duration_secs)
        .with_grace(settings.grace_secs)
        .build()
        .await
        .with_context(|| format!("failed to create lease manager for {}", settings.name))?;

    let (mut channel, task) = manager.watch().await;
    while !*channel.borrow_and_update() {
        debug!("Lease {} held by another replica", settings.name);
        channel
            .changed()
            .await
            .context("lease manager stopped before leadership was acquired")?;
    }

    info!("Acquired lease {} as {}", settings.name, settings.identity);
    record_leader_elected(&settings.identity);

    Ok(Leadership {
        identity: settings.identity.clone(),
        channel,
        task,
    })
}
