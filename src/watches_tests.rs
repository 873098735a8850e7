// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `watches.rs`

#[cfg(test)]
mod tests {
    use crate::children::ChildKind;
    use crate::crd::{Jenkins, JenkinsImage, JenkinsImageSpec, JenkinsPersistence, JenkinsSpec};
    use crate::jenkins_resources::build_jenkins_children;
    use crate::jenkinsimage_resources::build_jenkins_image_children;
    use crate::labels::{K8S_MANAGED_BY, MANAGED_BY_JENKINS_OPERATOR};
    use crate::reconcilers::ownership::{controller_owner_reference, set_controller_reference};
    use crate::watches::{child_watcher_config, owner_key, watch_targets, WatchTarget};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

    fn owned_by_jenkins() -> ObjectMeta {
        let mut jenkins = Jenkins::new("jenkins", Default::default());
        jenkins.metadata.namespace = Some("demo".into());
        jenkins.metadata.uid = Some("uid-1".into());
        let owner = controller_owner_reference(&jenkins).unwrap();

        let mut meta = ObjectMeta {
            name: Some("jenkins-jnlp".into()),
            namespace: Some("demo".into()),
            ..Default::default()
        };
        set_controller_reference(&mut meta, &owner, "demo").unwrap();
        meta
    }

    #[test]
    fn test_jenkins_watch_targets() {
        assert_eq!(
            watch_targets::<Jenkins>(),
            vec![
                WatchTarget::Primary,
                WatchTarget::Secondary(ChildKind::Deployment),
                WatchTarget::Secondary(ChildKind::ServiceAccount),
                WatchTarget::Secondary(ChildKind::RoleBinding),
                WatchTarget::Secondary(ChildKind::Service),
                WatchTarget::Secondary(ChildKind::Route),
                WatchTarget::Secondary(ChildKind::PersistentVolumeClaim),
            ]
        );
    }

    #[test]
    fn test_jenkins_image_watch_targets() {
        assert_eq!(
            watch_targets::<JenkinsImage>(),
            vec![
                WatchTarget::Primary,
                WatchTarget::Secondary(ChildKind::ImageStream),
                WatchTarget::Secondary(ChildKind::BuildConfig),
            ]
        );
    }

    #[test]
    fn test_child_watches_select_managed_objects() {
        assert_eq!(
            child_watcher_config().label_selector.as_deref(),
            Some("app.kubernetes.io/managed-by=jenkins-operator")
        );
    }

    #[test]
    fn test_every_child_matches_watch_selector() {
        let mut jenkins = Jenkins::new(
            "jenkins",
            JenkinsSpec {
                persistence: JenkinsPersistence {
                    enabled: true,
                    size: None,
                },
            },
        );
        jenkins.metadata.namespace = Some("demo".into());
        let mut image = JenkinsImage::new("custom", JenkinsImageSpec::default());
        image.metadata.namespace = Some("demo".into());

        let children = build_jenkins_children(&jenkins)
            .into_iter()
            .chain(build_jenkins_image_children(&image));
        for child in children {
            let managed_by = child
                .meta()
                .labels
                .as_ref()
                .and_then(|l| l.get(K8S_MANAGED_BY))
                .map(String::as_str);
            assert_eq!(
                managed_by,
                Some(MANAGED_BY_JENKINS_OPERATOR),
                "{} {} would be invisible to its watch",
                child.kind(),
                child.name()
            );
        }
    }

    #[test]
    fn test_child_event_maps_to_owner() {
        let key = owner_key::<Jenkins>(&owned_by_jenkins()).unwrap();
        assert_eq!(key.name, "jenkins");
        assert_eq!(key.namespace.as_deref(), Some("demo"));
    }

    #[test]
    fn test_other_kind_owner_is_ignored() {
        assert!(owner_key::<JenkinsImage>(&owned_by_jenkins()).is_none());
    }

    #[test]
    fn test_unowned_child_is_ignored() {
        let meta = ObjectMeta {
            name: Some("jenkins".into()),
            namespace: Some("demo".into()),
            ..Default::default()
        };
        assert!(owner_key::<Jenkins>(&meta).is_none());
    }

    #[test]
    fn test_non_controller_owner_is_ignored() {
        let meta = ObjectMeta {
            name: Some("jenkins".into()),
            namespace: Some("demo".into()),
            owner_references: Some(vec![OwnerReference {
                api_version: "jenkins.dev/v1alpha1".into(),
                kind: "Jenkins".into(),
                name: "jenkins".into(),
                uid: "uid-1".into(),
                controller: Some(false),
                block_owner_deletion: None,
            }]),
            ..Default::default()
        };
        assert!(owner_key::<Jenkins>(&meta).is_none());
    }
}
