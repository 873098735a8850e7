// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the Jenkins operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for the Jenkins CRDs
pub const API_GROUP: &str = "jenkins.dev";

/// API version for the Jenkins CRDs
pub const API_VERSION: &str = "v1alpha1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "jenkins.dev/v1alpha1";

/// Kind name for `Jenkins` resource
pub const KIND_JENKINS: &str = "Jenkins";

/// Kind name for `JenkinsImage` resource
pub const KIND_JENKINS_IMAGE: &str = "JenkinsImage";

// ============================================================================
// Jenkins Workload Constants
// ============================================================================

/// Default Jenkins container image
pub const JENKINS_IMAGE: &str = "image-registry.openshift-image-registry.svc:5000/openshift/jenkins";

/// Name of the Jenkins container inside the pod
pub const JENKINS_CONTAINER_NAME: &str = "jenkins";

/// Memory limit of the Jenkins container
pub const JENKINS_CONTAINER_MEMORY: &str = "1Gi";

/// Name of the Jenkins data volume
pub const JENKINS_VOLUME_NAME: &str = "jenkins-data";

/// Mount path of the Jenkins data volume (`JENKINS_HOME`)
pub const JENKINS_VOLUME_MOUNT_PATH: &str = "/var/lib/jenkins";

/// Termination message path of the Jenkins container
pub const JENKINS_TERMINATION_MESSAGE_PATH: &str = "/dev/termination-log";

/// Default size of the Jenkins `PersistentVolumeClaim`
pub const JENKINS_PVC_SIZE: &str = "1Gi";

/// Suffix appended to the instance name for the agent (JNLP) service
pub const JENKINS_JNLP_SERVICE_SUFFIX: &str = "-jnlp";

/// Value of the `name` label placed on Jenkins resources
pub const JENKINS_NAME_LABEL_VALUE: &str = "jenkins";

/// Cluster role granted to the Jenkins service account
pub const JENKINS_EDIT_ROLE: &str = "edit";

/// Kubernetes master URL handed to the Jenkins kubernetes plugin
pub const KUBERNETES_MASTER_URL: &str = "https://kubernetes.default:443";

// ============================================================================
// Jenkins Network Constants
// ============================================================================

/// Name of the web service port
pub const JENKINS_WEB_PORT_NAME: &str = "web";

/// Service port of the web service
pub const JENKINS_WEB_PORT: i32 = 80;

/// Container port Jenkins serves HTTP on
pub const JENKINS_WEB_TARGET_PORT: i32 = 8080;

/// Name of the agent service port
pub const JENKINS_AGENT_PORT_NAME: &str = "agent";

/// Service port (and container port) of the JNLP agent listener
pub const JENKINS_AGENT_PORT: i32 = 50000;

/// Protocol of every Jenkins service port
pub const JENKINS_PORT_PROTOCOL: &str = "TCP";

// ============================================================================
// Kubernetes Health Check Constants
// ============================================================================

/// Path probed by liveness and readiness checks
pub const JENKINS_PROBE_PATH: &str = "/login";

/// Liveness probe initial delay (Jenkins takes minutes to boot)
pub const LIVENESS_INITIAL_DELAY_SECS: i32 = 420;

/// Liveness probe timeout
pub const LIVENESS_TIMEOUT_SECS: i32 = 240;

/// Liveness probe period
pub const LIVENESS_PERIOD_SECS: i32 = 360;

/// Readiness probe initial delay
pub const READINESS_INITIAL_DELAY_SECS: i32 = 3;

/// Readiness probe timeout
pub const READINESS_TIMEOUT_SECS: i32 = 240;

/// Failure threshold shared by both probes
pub const PROBE_FAILURE_THRESHOLD: i32 = 2;

// ============================================================================
// JenkinsImage Build Constants
// ============================================================================

/// Hostname of the OpenShift internal image registry
pub const DEFAULT_REGISTRY_HOSTNAME: &str = "image-registry.openshift-image-registry.svc:5000";

/// Namespace holding the Jenkins base image stream
pub const DEFAULT_IMAGE_NAMESPACE: &str = "openshift";

/// Base image stream tag used by the source-to-image build
pub const DEFAULT_JENKINS_BASE_IMAGE: &str = "jenkins:2";

/// Tag written by the build and tracked by the image stream
pub const DEFAULT_IMAGE_STREAM_TAG: &str = "latest";

/// Kind used to reference an image stream tag
pub const IMAGE_STREAM_TAG_KIND: &str = "ImageStreamTag";

/// Kind used to reference an external docker image
pub const DOCKER_IMAGE_KIND: &str = "DockerImage";

/// Name of the plugin list file handed to the binary build
pub const PLUGINS_LIST_FILENAME: &str = "plugins.txt";

/// Command used to trigger binary builds
pub const BUILD_TRIGGER_COMMAND: &str = "oc";

/// Upper bound in seconds for `oc start-build` to submit a build
pub const BUILD_TRIGGER_TIMEOUT_SECS: u64 = 120;

// ============================================================================
// Controller Error Handling Constants
// ============================================================================

/// Requeue duration for controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Requeue duration after a pass recorded transient child failures (10 seconds)
pub const TRANSIENT_REQUEUE_DURATION_SECS: u64 = 10;

/// Upper bound for a single reconciliation pass (60 seconds)
pub const DEFAULT_RECONCILE_TIMEOUT_SECS: u64 = 60;

/// Default number of keys reconciled concurrently per controller
pub const DEFAULT_CONCURRENCY: u16 = 4;

// ============================================================================
// Leader Election Constants
// ============================================================================

/// Default leader election lease name
pub const DEFAULT_LEASE_NAME: &str = "jenkins-operator-lock";

/// Default leader election lease duration (15 seconds)
pub const DEFAULT_LEASE_DURATION_SECS: u64 = 15;

/// Default leader election grace period (5 seconds)
pub const DEFAULT_LEASE_GRACE_SECS: u64 = 5;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of Tokio worker threads
pub const TOKIO_WORKER_THREADS: usize = 4;

/// Default bind address of the metrics and health server
pub const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:8383";
