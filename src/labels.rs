// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label and annotation constants used across all reconcilers.
//!
//! Selector labels (`app`, `name`) are part of the Deployment selector and must never
//! change once a Jenkins instance exists. The `app.kubernetes.io/*` labels are informational
//! and only ever placed on object metadata.

// ============================================================================
// Jenkins Selector Labels
// ============================================================================

/// Label pairing every child with the owning instance name
pub const APP_LABEL: &str = "app";

/// Label identifying the Jenkins component
pub const NAME_LABEL: &str = "name";

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the name of a higher-level application this one is part of
pub const K8S_PART_OF: &str = "app.kubernetes.io/part-of";

/// Value for `app.kubernetes.io/managed-by` on resources created by this operator
pub const MANAGED_BY_JENKINS_OPERATOR: &str = "jenkins-operator";

/// Value for `app.kubernetes.io/part-of`
pub const PART_OF_JENKINS: &str = "jenkins";

// ============================================================================
// OpenShift Annotations
// ============================================================================

/// Prefix of the service account annotation wiring OAuth redirects to a route
pub const OAUTH_REDIRECT_REFERENCE_PREFIX: &str = "serviceaccounts.openshift.io/oauth-redirectreference.";
