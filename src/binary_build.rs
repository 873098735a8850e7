// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Binary builds for `JenkinsImage` resources.
//!
//! When the operator creates the `BuildConfig` of a `JenkinsImage`, it starts one
//! build fed with the plugin list. The list is written to `plugins.txt` in a fresh
//! temporary directory that is uploaded with `oc start-build --from-dir`. The directory
//! is removed when the trigger returns, whether the build started or not. A trigger
//! that does not return within its deadline is killed.
//!
//! Build failures never fail a reconciliation pass. Callers log them and move on.

use crate::constants::{BUILD_TRIGGER_COMMAND, BUILD_TRIGGER_TIMEOUT_SECS, PLUGINS_LIST_FILENAME};
use crate::crd::JenkinsPlugin;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// A request to start one binary build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryBuildRequest {
    pub namespace: String,
    /// Name of the `BuildConfig` to instantiate.
    pub build_config: String,
    pub plugins: Vec<JenkinsPlugin>,
}

#[derive(Debug, Error)]
pub enum BuildTriggerError {
    #[error("failed to prepare build input: {0}")]
    Io(#[from] std::io::Error),

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("`{command}` did not finish within {after:?}")]
    TimedOut { command: String, after: Duration },

    #[error("invalid plugin entry {entry:?}: names and versions must not contain ':' or whitespace")]
    InvalidPlugin { entry: String },
}

/// Starts binary builds.
#[async_trait]
pub trait BuildTrigger: Send + Sync {
    /// Start a build and return once it has been submitted.
    async fn start_build(&self, request: &BinaryBuildRequest) -> Result<(), BuildTriggerError>;
}

fn valid_plugin_field(value: &str) -> bool {
    !value.is_empty() && !value.contains(':') && !value.chars().any(char::is_whitespace)
}

/// Render the plugin list in the `name:version` per line format read by the
/// OpenShift Jenkins image.
///
/// # Errors
///
/// Rejects entries whose name or version is empty or would split the line.
pub fn render_plugin_list(plugins: &[JenkinsPlugin]) -> Result<String, BuildTriggerError> {
    plugins
        .iter()
        .map(|p| {
            if valid_plugin_field(&p.name) && valid_plugin_field(&p.version) {
                Ok(format!("{}:{}\n", p.name, p.version))
            } else {
                Err(BuildTriggerError::InvalidPlugin {
                    entry: format!("{}:{}", p.name, p.version),
                })
            }
        })
        .collect()
}

/// Create a temporary directory holding the plugin list.
///
/// # Errors
///
/// Returns an error when a plugin entry is invalid or the directory or the file
/// cannot be written.
pub async fn prepare_build_dir(plugins: &[JenkinsPlugin]) -> Result<TempDir, BuildTriggerError> {
    let content = render_plugin_list(plugins)?;
    let dir = tempfile::Builder::new().prefix("jenkinsimage-").tempdir()?;
    tokio::fs::write(dir.path().join(PLUGINS_LIST_FILENAME), content).await?;
    Ok(dir)
}

/// [`BuildTrigger`] shelling out to `oc start-build`.
#[derive(Clone, Debug)]
pub struct OcBuildTrigger {
    command: String,
    timeout: Duration,
}

impl Default for OcBuildTrigger {
    fn default() -> Self {
        Self::with_command(BUILD_TRIGGER_COMMAND)
    }
}

impl OcBuildTrigger {
    /// Use `command` instead of `oc`.
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: Duration::from_secs(BUILD_TRIGGER_TIMEOUT_SECS),
        }
    }

    /// Kill the command when it runs longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn args(request: &BinaryBuildRequest, dir: &Path) -> Vec<OsString> {
        vec![
            "start-build".into(),
            request.build_config.clone().into(),
            "--from-dir".into(),
            dir.as_os_str().to_owned(),
            "--namespace".into(),
            request.namespace.clone().into(),
        ]
    }
}

#[async_trait]
impl BuildTrigger for OcBuildTrigger {
    async fn start_build(&self, request: &BinaryBuildRequest) -> Result<(), BuildTriggerError> {
        let dir = prepare_build_dir(&request.plugins).await?;
        let args = Self::args(request, dir.path());

        debug!(
            namespace = %request.namespace,
            build_config = %request.build_config,
            dir = %dir.path().display(),
            "Starting binary build"
        );

        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.command)
                .args(&args)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| BuildTriggerError::TimedOut {
            command: self.command.clone(),
            after: self.timeout,
        })??;
        if !output.status.success() {
            return Err(BuildTriggerError::CommandFailed {
                command: self.command.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!(
            "Started build of BuildConfig {}/{}",
            request.namespace, request.build_config
        );
        Ok(())
    }
}
