// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `converge.rs`

#[cfg(test)]
mod tests {
    use crate::binary_build::BuildTrigger;
    use crate::children::ChildKind;
    use crate::cluster::{ClusterClient, ClusterError, ClusterObject, ObjectKey};
    use crate::config::OperatorConfig;
    use crate::context::Context;
    use crate::crd::{Jenkins, JenkinsPersistence, JenkinsSpec};
    use crate::metrics::ERRORS_TOTAL;
    use crate::reconcilers::converge::{reconcile, reconcile_with_timeout, ReconcileError};
    use crate::reconcilers::messages::Severity;
    use crate::reconcilers::ownership::controller_of;
    use crate::testing::{FakeCluster, RecordingBuildTrigger};
    use async_trait::async_trait;
    use k8s_openapi::api::apps::v1::Deployment;
    use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Service};
    use std::sync::Arc;
    use std::time::Duration;

    fn key() -> ObjectKey {
        ObjectKey::new("demo", "jenkins")
    }

    fn trigger() -> Arc<dyn BuildTrigger> {
        Arc::new(RecordingBuildTrigger::new())
    }

    fn transient() -> ClusterError {
        ClusterError::Transient {
            code: Some(503),
            message: "service unavailable".into(),
        }
    }

    /// A persisted `Jenkins` with persistence enabled.
    fn seeded_cluster() -> (FakeCluster, Jenkins) {
        let cluster = FakeCluster::new();
        let mut jenkins = Jenkins::new(
            "jenkins",
            JenkinsSpec {
                persistence: JenkinsPersistence {
                    enabled: true,
                    size: Some("5Gi".into()),
                },
            },
        );
        jenkins.metadata.namespace = Some("demo".into());
        let jenkins = cluster.insert(&jenkins);
        (cluster, jenkins)
    }

    #[tokio::test]
    async fn test_missing_instance_is_done() {
        let cluster = FakeCluster::new();

        let outcome = reconcile::<Jenkins, _>(&cluster, &trigger(), &key())
            .await
            .unwrap();

        assert!(!outcome.requeue);
        assert!(outcome.created.is_empty());
        assert!(cluster.create_calls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_error() {
        let (cluster, _) = seeded_cluster();
        cluster.fail_get("Jenkins", "jenkins", transient());

        let err = reconcile::<Jenkins, _>(&cluster, &trigger(), &key())
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::Fetch { .. }));
        assert!(err.is_transient());
        assert!(cluster.create_calls().is_empty());
    }

    #[tokio::test]
    async fn test_owner_without_uid_aborts_before_creating() {
        let cluster = FakeCluster::new();
        let mut jenkins = Jenkins::new("jenkins", JenkinsSpec::default());
        jenkins.metadata.namespace = Some("demo".into());
        cluster.put(&jenkins);

        let err = reconcile::<Jenkins, _>(&cluster, &trigger(), &key())
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::OwnerReference { .. }));
        assert!(cluster.create_calls().is_empty());
    }

    #[tokio::test]
    async fn test_terminating_instance_creates_nothing() {
        let cluster = FakeCluster::new();
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
        jenkins.metadata.deletion_timestamp =
            Some(serde_json::from_value(serde_json::json!("2025-06-01T12:00:00Z")).unwrap());
        cluster.insert(&jenkins);

        let outcome = reconcile::<Jenkins, _>(&cluster, &trigger(), &key())
            .await
            .unwrap();

        assert!(!outcome.requeue);
        assert!(outcome.created.is_empty());
        assert!(cluster.create_calls().is_empty());
        assert_eq!(cluster.total(), 1);
    }

    #[tokio::test]
    async fn test_creates_all_children_owned_by_instance() {
        let (cluster, jenkins) = seeded_cluster();

        let outcome = reconcile::<Jenkins, _>(&cluster, &trigger(), &key())
            .await
            .unwrap();

        assert!(!outcome.requeue);
        assert_eq!(outcome.created.len(), 7);
        assert!(outcome.skipped.is_empty());
        // instance + 7 children
        assert_eq!(cluster.total(), 8);

        let deployment = cluster.stored::<Deployment>("demo", "jenkins").unwrap();
        let owner = controller_of(&deployment.metadata).unwrap();
        assert_eq!(owner.kind, "Jenkins");
        assert_eq!(owner.name, "jenkins");
        assert_eq!(Some(&owner.uid), jenkins.metadata.uid.as_ref());
    }

    #[tokio::test]
    async fn test_second_pass_is_idempotent() {
        let (cluster, _) = seeded_cluster();
        reconcile::<Jenkins, _>(&cluster, &trigger(), &key())
            .await
            .unwrap();
        let creates_after_first = cluster.create_calls().len();

        let outcome = reconcile::<Jenkins, _>(&cluster, &trigger(), &key())
            .await
            .unwrap();

        assert!(outcome.created.is_empty());
        assert_eq!(outcome.skipped.len(), 7);
        assert!(!outcome.requeue);
        assert_eq!(cluster.create_calls().len(), creates_after_first);
        assert_eq!(cluster.total(), 8);
    }

    #[tokio::test]
    async fn test_existing_child_is_not_modified() {
        let (cluster, _) = seeded_cluster();
        let mut foreign = Service::default();
        foreign.metadata.name = Some("jenkins".into());
        foreign.metadata.namespace = Some("demo".into());
        foreign.metadata.labels = Some([("owner".to_string(), "someone".to_string())].into());
        cluster.insert(&foreign);

        reconcile::<Jenkins, _>(&cluster, &trigger(), &key())
            .await
            .unwrap();

        let stored = cluster.stored::<Service>("demo", "jenkins").unwrap();
        assert_eq!(stored.metadata.labels, foreign.metadata.labels);
        assert!(stored.spec.is_none());
    }

    #[tokio::test]
    async fn test_deleted_child_is_recreated_alone() {
        let (cluster, _) = seeded_cluster();
        reconcile::<Jenkins, _>(&cluster, &trigger(), &key())
            .await
            .unwrap();
        assert!(cluster.remove::<Service>("demo", "jenkins-jnlp"));

        let outcome = reconcile::<Jenkins, _>(&cluster, &trigger(), &key())
            .await
            .unwrap();

        assert_eq!(outcome.created.len(), 1);
        assert_eq!(outcome.created[0].kind, ChildKind::Service);
        assert_eq!(outcome.created[0].name, "jenkins-jnlp");
    }

    #[tokio::test]
    async fn test_transient_create_failure_continues_and_requeues() {
        let (cluster, _) = seeded_cluster();
        cluster.fail_create("Service", "jenkins", transient());

        let outcome = reconcile::<Jenkins, _>(&cluster, &trigger(), &key())
            .await
            .unwrap();

        assert!(outcome.requeue);
        assert_eq!(outcome.created.len(), 6);
        assert!(cluster.stored::<PersistentVolumeClaim>("demo", "jenkins").is_some());
        assert!(cluster.stored::<Service>("demo", "jenkins").is_none());
        assert!(outcome
            .messages
            .iter()
            .any(|m| m.severity == Severity::Error && m.transient));

        // The next pass only creates what is still missing
        cluster.clear_failures();
        let outcome = reconcile::<Jenkins, _>(&cluster, &trigger(), &key())
            .await
            .unwrap();
        assert!(!outcome.requeue);
        assert_eq!(outcome.created.len(), 1);
        assert_eq!(outcome.created[0].name, "jenkins");
        assert_eq!(outcome.created[0].kind, ChildKind::Service);
    }

    #[tokio::test]
    async fn test_transient_lookup_failure_defers_child() {
        let (cluster, _) = seeded_cluster();
        cluster.fail_get("Route", "jenkins", transient());

        let outcome = reconcile::<Jenkins, _>(&cluster, &trigger(), &key())
            .await
            .unwrap();

        assert!(outcome.requeue);
        assert_eq!(outcome.created.len(), 6);
        assert!(!cluster
            .create_calls()
            .contains(&("Route".to_string(), "jenkins".to_string())));
    }

    #[tokio::test]
    async fn test_rejected_create_aborts_pass() {
        let (cluster, _) = seeded_cluster();
        cluster.fail_create(
            "RoleBinding",
            "jenkins",
            ClusterError::Rejected {
                code: 422,
                reason: "Invalid".into(),
                message: "roleRef is immutable".into(),
            },
        );

        let err = reconcile::<Jenkins, _>(&cluster, &trigger(), &key())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::Fatal {
                kind: ChildKind::RoleBinding,
                ..
            }
        ));
        // Deployment and ServiceAccount come first, nothing after the RoleBinding
        assert_eq!(cluster.create_calls().len(), 3);
        assert_eq!(cluster.count::<Service>(), 0);
    }

    #[tokio::test]
    async fn test_fatal_child_error_is_not_counted_by_the_pass() {
        let (cluster, _) = seeded_cluster();
        cluster.fail_create(
            "PersistentVolumeClaim",
            "jenkins",
            ClusterError::Rejected {
                code: 403,
                reason: "Forbidden".into(),
                message: "exceeded quota".into(),
            },
        );
        let errors = ERRORS_TOTAL.with_label_values(&["PersistentVolumeClaim", "rejected"]);
        let before = errors.get();

        let err = reconcile::<Jenkins, _>(&cluster, &trigger(), &key())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::Fatal {
                kind: ChildKind::PersistentVolumeClaim,
                ..
            }
        ));
        assert_eq!(err.category(), "rejected");
        assert!((errors.get() - before).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_rejected_lookup_aborts_pass() {
        let (cluster, _) = seeded_cluster();
        cluster.fail_get(
            "Deployment",
            "jenkins",
            ClusterError::Rejected {
                code: 403,
                reason: "Forbidden".into(),
                message: "cannot get deployments".into(),
            },
        );

        let err = reconcile::<Jenkins, _>(&cluster, &trigger(), &key())
            .await
            .unwrap_err();

        assert!(!err.is_transient());
        assert!(cluster.create_calls().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_creation_counts_as_skip() {
        let (cluster, _) = seeded_cluster();
        cluster.fail_create("Deployment", "jenkins", ClusterError::AlreadyExists);

        let outcome = reconcile::<Jenkins, _>(&cluster, &trigger(), &key())
            .await
            .unwrap();

        assert!(!outcome.requeue);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].kind, ChildKind::Deployment);
        assert_eq!(outcome.created.len(), 6);
    }

    #[tokio::test]
    async fn test_unserved_kind_is_skipped_with_warning() {
        let (cluster, _) = seeded_cluster();
        cluster.fail_create("Route", "jenkins", ClusterError::NotFound);

        let outcome = reconcile::<Jenkins, _>(&cluster, &trigger(), &key())
            .await
            .unwrap();

        assert!(!outcome.requeue);
        assert_eq!(outcome.created.len(), 6);
        assert!(outcome
            .messages
            .iter()
            .any(|m| m.severity == Severity::Warning && m.text.contains("Route")));
    }

    /// Cluster whose every call takes longer than any test deadline.
    struct StalledCluster;

    #[async_trait]
    impl ClusterClient for StalledCluster {
        async fn get<K: ClusterObject>(
            &self,
            _namespace: &str,
            _name: &str,
        ) -> Result<K, ClusterError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(ClusterError::NotFound)
        }

        async fn create<K: ClusterObject>(
            &self,
            _namespace: &str,
            obj: &K,
        ) -> Result<K, ClusterError> {
            Ok(obj.clone())
        }
    }

    #[tokio::test]
    async fn test_pass_is_bounded_by_timeout() {
        let ctx = Context::new(
            StalledCluster,
            trigger(),
            OperatorConfig {
                reconcile_timeout: Duration::from_millis(50),
                ..OperatorConfig::default()
            },
        );

        let err = reconcile_with_timeout::<Jenkins, _>(&ctx, &key())
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::Timeout { .. }));
        assert!(err.is_transient());
    }
}
