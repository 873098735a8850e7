// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `JenkinsImage` child resource builders.
//!
//! A `JenkinsImage` owns an `ImageStream` tracking the built image and a binary
//! source-to-image `BuildConfig` layered on the OpenShift Jenkins base image.

use crate::binary_build::BinaryBuildRequest;
use crate::children::ChildResource;
use crate::constants::{
    DEFAULT_IMAGE_NAMESPACE, DEFAULT_IMAGE_STREAM_TAG, DEFAULT_JENKINS_BASE_IMAGE,
    DEFAULT_REGISTRY_HOSTNAME, DOCKER_IMAGE_KIND, IMAGE_STREAM_TAG_KIND,
};
use crate::crd::JenkinsImage;
use crate::labels::{K8S_MANAGED_BY, K8S_PART_OF, MANAGED_BY_JENKINS_OPERATOR, PART_OF_JENKINS};
use crate::openshift::{
    BinaryBuildSource, BuildConfig, BuildConfigSpec, BuildOutput, BuildSource, BuildStrategy,
    ImageStream, ImageStreamSpec, SourceBuildStrategy, TagReference,
};
use k8s_openapi::api::core::v1::ObjectReference;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use std::collections::BTreeMap;

/// Builds every child of a `JenkinsImage`: the `ImageStream`, then the `BuildConfig`.
#[must_use]
pub fn build_jenkins_image_children(image: &JenkinsImage) -> Vec<ChildResource> {
    vec![
        ChildResource::ImageStream(build_image_stream(image)),
        ChildResource::BuildConfig(build_build_config(image)),
    ]
}

fn child_metadata(image: &JenkinsImage) -> ObjectMeta {
    ObjectMeta {
        name: Some(image.name_any()),
        namespace: image.namespace(),
        labels: Some(BTreeMap::from([
            (K8S_MANAGED_BY.to_string(), MANAGED_BY_JENKINS_OPERATOR.to_string()),
            (K8S_PART_OF.to_string(), PART_OF_JENKINS.to_string()),
        ])),
        ..Default::default()
    }
}

/// Repository of the built image in the internal registry: `<registry>/<ns>/<name>`.
#[must_use]
pub fn image_repository(image: &JenkinsImage) -> String {
    format!(
        "{DEFAULT_REGISTRY_HOSTNAME}/{}/{}",
        image.namespace().unwrap_or_default(),
        image.name_any()
    )
}

/// Builds the `ImageStream` with a `latest` tag tracking the built image.
#[must_use]
pub fn build_image_stream(image: &JenkinsImage) -> ImageStream {
    let mut stream = ImageStream::new(
        &image.name_any(),
        ImageStreamSpec {
            tags: vec![TagReference {
                name: DEFAULT_IMAGE_STREAM_TAG.into(),
                from: Some(ObjectReference {
                    kind: Some(DOCKER_IMAGE_KIND.into()),
                    name: Some(image_repository(image)),
                    ..Default::default()
                }),
            }],
        },
    );
    stream.metadata = child_metadata(image);
    stream
}

/// Builds the binary `BuildConfig` producing `<name>:latest` from `openshift/jenkins:2`.
#[must_use]
pub fn build_build_config(image: &JenkinsImage) -> BuildConfig {
    let mut config = BuildConfig::new(
        &image.name_any(),
        BuildConfigSpec {
            run_policy: Some("Serial".into()),
            source: BuildSource {
                source_type: "Binary".into(),
                binary: Some(BinaryBuildSource::default()),
            },
            strategy: BuildStrategy {
                strategy_type: "Source".into(),
                source_strategy: Some(SourceBuildStrategy {
                    from: ObjectReference {
                        kind: Some(IMAGE_STREAM_TAG_KIND.into()),
                        name: Some(DEFAULT_JENKINS_BASE_IMAGE.into()),
                        namespace: Some(DEFAULT_IMAGE_NAMESPACE.into()),
                        ..Default::default()
                    },
                }),
            },
            output: BuildOutput {
                to: Some(ObjectReference {
                    kind: Some(IMAGE_STREAM_TAG_KIND.into()),
                    name: Some(format!("{}:{DEFAULT_IMAGE_STREAM_TAG}", image.name_any())),
                    ..Default::default()
                }),
            },
        },
    );
    config.metadata = child_metadata(image);
    config
}

/// The build started when the `BuildConfig` is created.
#[must_use]
pub fn build_request(image: &JenkinsImage) -> BinaryBuildRequest {
    BinaryBuildRequest {
        namespace: image.namespace().unwrap_or_default(),
        build_config: image.name_any(),
        plugins: image.spec.plugins.clone(),
    }
}
