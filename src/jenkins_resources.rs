// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Jenkins child resource builders.
//!
//! This module turns a [`Jenkins`] instance into the Kubernetes objects that run it:
//!
//! - `Deployment` running the OpenShift Jenkins image
//! - `ServiceAccount` with the OAuth redirect annotation
//! - `RoleBinding` granting the service account the `edit` cluster role
//! - web and agent (JNLP) `Service`s
//! - edge terminated `Route` to the web service
//! - `PersistentVolumeClaim` for `JENKINS_HOME` when persistence is enabled
//!
//! Builders are pure. They never fail, and the same instance always yields the same
//! objects. Owner references are added later by the reconciler.

use crate::children::ChildResource;
use crate::constants::{
    JENKINS_AGENT_PORT, JENKINS_AGENT_PORT_NAME, JENKINS_CONTAINER_MEMORY,
    JENKINS_CONTAINER_NAME, JENKINS_EDIT_ROLE, JENKINS_IMAGE, JENKINS_JNLP_SERVICE_SUFFIX,
    JENKINS_NAME_LABEL_VALUE, JENKINS_PORT_PROTOCOL, JENKINS_PROBE_PATH,
    JENKINS_TERMINATION_MESSAGE_PATH, JENKINS_VOLUME_MOUNT_PATH, JENKINS_VOLUME_NAME,
    JENKINS_WEB_PORT, JENKINS_WEB_PORT_NAME, JENKINS_WEB_TARGET_PORT, KUBERNETES_MASTER_URL,
    LIVENESS_INITIAL_DELAY_SECS, LIVENESS_PERIOD_SECS, LIVENESS_TIMEOUT_SECS,
    PROBE_FAILURE_THRESHOLD, READINESS_INITIAL_DELAY_SECS, READINESS_TIMEOUT_SECS,
};
use crate::crd::Jenkins;
use crate::labels::{
    APP_LABEL, K8S_MANAGED_BY, K8S_PART_OF, MANAGED_BY_JENKINS_OPERATOR, NAME_LABEL,
    OAUTH_REDIRECT_REFERENCE_PREFIX, PART_OF_JENKINS,
};
use crate::openshift::{Route, RoutePort, RouteSpec, RouteTargetReference, TlsConfig};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStrategy};
use k8s_openapi::api::core::v1::{
    Container, EmptyDirVolumeSource, EnvVar, HTTPGetAction, PersistentVolumeClaim,
    PersistentVolumeClaimSpec, PersistentVolumeClaimVolumeSource, PodSpec, PodTemplateSpec,
    Probe, ResourceRequirements, Service, ServiceAccount, ServicePort, ServiceSpec, Volume,
    VolumeMount, VolumeResourceRequirements,
};
use k8s_openapi::api::rbac::v1::{RoleBinding, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::ResourceExt;
use std::collections::BTreeMap;

/// Builds every child of a Jenkins instance, in creation order.
///
/// The `PersistentVolumeClaim` is last and only present when persistence is enabled.
#[must_use]
pub fn build_jenkins_children(jenkins: &Jenkins) -> Vec<ChildResource> {
    let mut children = vec![
        ChildResource::Deployment(build_deployment(jenkins)),
        ChildResource::ServiceAccount(build_service_account(jenkins)),
        ChildResource::RoleBinding(build_role_binding(jenkins)),
        ChildResource::Service(build_web_service(jenkins)),
        ChildResource::Service(build_agent_service(jenkins)),
        ChildResource::Route(build_route(jenkins)),
    ];
    if jenkins.spec.persistence.enabled {
        children.push(ChildResource::PersistentVolumeClaim(build_pvc(jenkins)));
    }
    children
}

/// Selector labels of the Jenkins pods: `{app: <name>, name: jenkins}`.
///
/// These are immutable once the Deployment exists.
#[must_use]
pub fn build_selector_labels(instance_name: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(APP_LABEL.into(), instance_name.into());
    labels.insert(NAME_LABEL.into(), JENKINS_NAME_LABEL_VALUE.into());
    labels
}

/// Object labels: the selector labels plus the informational `app.kubernetes.io` ones.
#[must_use]
pub fn build_labels(instance_name: &str) -> BTreeMap<String, String> {
    let mut labels = build_selector_labels(instance_name);
    labels.insert(K8S_MANAGED_BY.into(), MANAGED_BY_JENKINS_OPERATOR.into());
    labels.insert(K8S_PART_OF.into(), PART_OF_JENKINS.into());
    labels
}

/// Name of the agent (JNLP) service.
#[must_use]
pub fn agent_service_name(instance_name: &str) -> String {
    format!("{instance_name}{JENKINS_JNLP_SERVICE_SUFFIX}")
}

fn child_metadata(jenkins: &Jenkins, name: String, labels: BTreeMap<String, String>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name),
        namespace: jenkins.namespace(),
        labels: Some(labels),
        ..Default::default()
    }
}

/// Builds the Jenkins `Deployment`.
///
/// One replica with the `Recreate` strategy, since two pods must never share
/// `JENKINS_HOME`. The data volume is backed by the instance's claim when persistence
/// is enabled and by an `emptyDir` otherwise.
#[must_use]
pub fn build_deployment(jenkins: &Jenkins) -> Deployment {
    let name = jenkins.name_any();
    let selector_labels = build_selector_labels(&name);

    Deployment {
        metadata: child_metadata(jenkins, name.clone(), build_labels(&name)),
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(selector_labels.clone()),
                ..Default::default()
            },
            strategy: Some(DeploymentStrategy {
                type_: Some("Recreate".into()),
                ..Default::default()
            }),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(selector_labels),
                    ..Default::default()
                }),
                spec: Some(build_pod_spec(jenkins)),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn build_pod_spec(jenkins: &Jenkins) -> PodSpec {
    let name = jenkins.name_any();
    PodSpec {
        containers: vec![build_container(&name)],
        volumes: Some(vec![build_data_volume(jenkins)]),
        service_account_name: Some(name),
        ..Default::default()
    }
}

fn build_container(instance_name: &str) -> Container {
    Container {
        name: JENKINS_CONTAINER_NAME.into(),
        image: Some(JENKINS_IMAGE.into()),
        env: Some(build_env(instance_name)),
        volume_mounts: Some(vec![VolumeMount {
            name: JENKINS_VOLUME_NAME.into(),
            mount_path: JENKINS_VOLUME_MOUNT_PATH.into(),
            ..Default::default()
        }]),
        liveness_probe: Some(build_probe(
            LIVENESS_INITIAL_DELAY_SECS,
            LIVENESS_TIMEOUT_SECS,
            Some(LIVENESS_PERIOD_SECS),
        )),
        readiness_probe: Some(build_probe(
            READINESS_INITIAL_DELAY_SECS,
            READINESS_TIMEOUT_SECS,
            None,
        )),
        resources: Some(ResourceRequirements {
            limits: Some(BTreeMap::from([(
                "memory".to_string(),
                Quantity(JENKINS_CONTAINER_MEMORY.into()),
            )])),
            ..Default::default()
        }),
        termination_message_path: Some(JENKINS_TERMINATION_MESSAGE_PATH.into()),
        ..Default::default()
    }
}

fn build_env(instance_name: &str) -> Vec<EnvVar> {
    let jnlp_service = agent_service_name(instance_name);
    [
        ("OPENSHIFT_ENABLE_OAUTH", "true"),
        ("OPENSHIFT_ENABLE_REDIRECT_PROMPT", "true"),
        ("DISABLE_ADMINISTRATIVE_MONITORS", "false"),
        ("KUBERNETES_MASTER", KUBERNETES_MASTER_URL),
        ("KUBERNETES_TRUST_CERTIFICATES", "true"),
        ("JENKINS_SERVICE_NAME", instance_name),
        ("JNLP_SERVICE_NAME", jnlp_service.as_str()),
        ("ENABLE_FATAL_ERROR_LOG_FILE", "false"),
        ("JENKINS_UC_INSECURE", "false"),
    ]
    .into_iter()
    .map(|(name, value)| EnvVar {
        name: name.into(),
        value: Some(value.into()),
        ..Default::default()
    })
    .collect()
}

fn build_probe(initial_delay: i32, timeout: i32, period: Option<i32>) -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some(JENKINS_PROBE_PATH.into()),
            port: IntOrString::Int(JENKINS_WEB_TARGET_PORT),
            ..Default::default()
        }),
        initial_delay_seconds: Some(initial_delay),
        timeout_seconds: Some(timeout),
        period_seconds: period,
        failure_threshold: Some(PROBE_FAILURE_THRESHOLD),
        ..Default::default()
    }
}

fn build_data_volume(jenkins: &Jenkins) -> Volume {
    if jenkins.spec.persistence.enabled {
        Volume {
            name: JENKINS_VOLUME_NAME.into(),
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                claim_name: jenkins.name_any(),
                ..Default::default()
            }),
            ..Default::default()
        }
    } else {
        Volume {
            name: JENKINS_VOLUME_NAME.into(),
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Default::default()
        }
    }
}

/// Builds the Jenkins `ServiceAccount`.
///
/// The OAuth redirect annotation lets the OpenShift OAuth server send users back to the
/// instance's route after login.
#[must_use]
pub fn build_service_account(jenkins: &Jenkins) -> ServiceAccount {
    let name = jenkins.name_any();
    let mut metadata = child_metadata(jenkins, name.clone(), build_labels(&name));
    metadata.annotations = Some(BTreeMap::from([(
        format!("{OAUTH_REDIRECT_REFERENCE_PREFIX}{name}"),
        oauth_redirect_reference(&name),
    )]));

    ServiceAccount {
        metadata,
        ..Default::default()
    }
}

/// Value of the OAuth redirect annotation pointing at route `route_name`.
#[must_use]
pub fn oauth_redirect_reference(route_name: &str) -> String {
    format!(
        r#"{{"kind":"OAuthRedirectReference","apiVersion":"v1","reference":{{"kind":"Route","name":"{route_name}"}}}}"#
    )
}

/// Builds the `RoleBinding` granting the service account the `edit` cluster role.
#[must_use]
pub fn build_role_binding(jenkins: &Jenkins) -> RoleBinding {
    let name = jenkins.name_any();
    RoleBinding {
        metadata: child_metadata(jenkins, name.clone(), build_labels(&name)),
        role_ref: RoleRef {
            api_group: "rbac.authorization.k8s.io".into(),
            kind: "ClusterRole".into(),
            name: JENKINS_EDIT_ROLE.into(),
        },
        subjects: Some(vec![Subject {
            kind: "ServiceAccount".into(),
            name,
            namespace: jenkins.namespace(),
            ..Default::default()
        }]),
    }
}

/// Builds the web `Service` (`<name>`, port 80 to 8080).
#[must_use]
pub fn build_web_service(jenkins: &Jenkins) -> Service {
    build_service(
        jenkins,
        jenkins.name_any(),
        ServicePort {
            name: Some(JENKINS_WEB_PORT_NAME.into()),
            port: JENKINS_WEB_PORT,
            target_port: Some(IntOrString::Int(JENKINS_WEB_TARGET_PORT)),
            protocol: Some(JENKINS_PORT_PROTOCOL.into()),
            ..Default::default()
        },
    )
}

/// Builds the agent `Service` (`<name>-jnlp`, port 50000).
#[must_use]
pub fn build_agent_service(jenkins: &Jenkins) -> Service {
    build_service(
        jenkins,
        agent_service_name(&jenkins.name_any()),
        ServicePort {
            name: Some(JENKINS_AGENT_PORT_NAME.into()),
            port: JENKINS_AGENT_PORT,
            target_port: Some(IntOrString::Int(JENKINS_AGENT_PORT)),
            protocol: Some(JENKINS_PORT_PROTOCOL.into()),
            ..Default::default()
        },
    )
}

fn build_service(jenkins: &Jenkins, service_name: String, port: ServicePort) -> Service {
    let instance_name = jenkins.name_any();
    let selector = BTreeMap::from([(APP_LABEL.to_string(), instance_name.clone())]);

    let mut labels = selector.clone();
    labels.insert(K8S_MANAGED_BY.into(), MANAGED_BY_JENKINS_OPERATOR.into());
    labels.insert(K8S_PART_OF.into(), PART_OF_JENKINS.into());

    Service {
        metadata: child_metadata(jenkins, service_name, labels),
        spec: Some(ServiceSpec {
            ports: Some(vec![port]),
            selector: Some(selector),
            type_: Some("ClusterIP".into()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Builds the `Route` exposing the web service with edge TLS termination.
#[must_use]
pub fn build_route(jenkins: &Jenkins) -> Route {
    let name = jenkins.name_any();
    let mut route = Route::new(
        &name,
        RouteSpec {
            host: None,
            to: RouteTargetReference {
                kind: "Service".into(),
                name: name.clone(),
                weight: None,
            },
            port: Some(RoutePort {
                target_port: IntOrString::String(JENKINS_WEB_PORT_NAME.into()),
            }),
            tls: Some(TlsConfig {
                termination: "edge".into(),
                insecure_edge_termination_policy: Some("Redirect".into()),
            }),
        },
    );
    route.metadata = child_metadata(jenkins, name.clone(), build_labels(&name));
    route
}

/// Builds the `PersistentVolumeClaim` backing `JENKINS_HOME`.
#[must_use]
pub fn build_pvc(jenkins: &Jenkins) -> PersistentVolumeClaim {
    let name = jenkins.name_any();
    PersistentVolumeClaim {
        metadata: child_metadata(jenkins, name.clone(), build_labels(&name)),
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".into()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".to_string(),
                    Quantity(jenkins.spec.persistence.storage_size().into()),
                )])),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}
