// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory doubles shared by the unit tests.

use crate::binary_build::{BinaryBuildRequest, BuildTrigger, BuildTriggerError};
use crate::cluster::{ClusterClient, ClusterError, ClusterObject};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

type StoreKey = (String, String, String);

/// Cluster call observed by [`FakeCluster`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Get { kind: String, name: String },
    Create { kind: String, name: String },
}

/// In-memory [`ClusterClient`] with per-object failure injection.
#[derive(Default)]
pub struct FakeCluster {
    objects: Mutex<BTreeMap<StoreKey, serde_json::Value>>,
    get_failures: Mutex<BTreeMap<(String, String), ClusterError>>,
    create_failures: Mutex<BTreeMap<(String, String), ClusterError>>,
    calls: Mutex<Vec<Call>>,
    next_uid: Mutex<u64>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `obj` as if it had been created by someone else, assigning a uid.
    pub fn insert<K: ClusterObject>(&self, obj: &K) -> K {
        let mut obj = obj.clone();
        if obj.meta().uid.is_none() {
            obj.meta_mut().uid = Some(self.uid());
        }
        self.put(&obj);
        obj
    }

    /// Store `obj` exactly as given.
    pub fn put<K: ClusterObject>(&self, obj: &K) {
        let key = store_key::<K>(
            obj.meta().namespace.as_deref().unwrap_or_default(),
            obj.meta().name.as_deref().unwrap_or_default(),
        );
        self.objects
            .lock()
            .unwrap()
            .insert(key, serde_json::to_value(obj).unwrap());
    }

    /// Remove an object, returning whether it was present.
    pub fn remove<K: ClusterObject>(&self, namespace: &str, name: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .remove(&store_key::<K>(namespace, name))
            .is_some()
    }

    /// Read back a stored object.
    pub fn stored<K: ClusterObject>(&self, namespace: &str, name: &str) -> Option<K> {
        self.objects
            .lock()
            .unwrap()
            .get(&store_key::<K>(namespace, name))
            .map(|v| serde_json::from_value(v.clone()).unwrap())
    }

    /// Number of stored objects of kind `K`.
    pub fn count<K: ClusterObject>(&self) -> usize {
        let kind = K::kind(&()).to_string();
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(k, _, _)| *k == kind)
            .count()
    }

    pub fn total(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn fail_get(&self, kind: &str, name: &str, err: ClusterError) {
        self.get_failures
            .lock()
            .unwrap()
            .insert((kind.to_string(), name.to_string()), err);
    }

    pub fn fail_create(&self, kind: &str, name: &str, err: ClusterError) {
        self.create_failures
            .lock()
            .unwrap()
            .insert((kind.to_string(), name.to_string()), err);
    }

    pub fn clear_failures(&self) {
        self.get_failures.lock().unwrap().clear();
        self.create_failures.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create { kind, name } => Some((kind, name)),
                Call::Get { .. } => None,
            })
            .collect()
    }

    fn uid(&self) -> String {
        let mut next = self.next_uid.lock().unwrap();
        *next += 1;
        format!("uid-{next}")
    }
}

fn store_key<K: ClusterObject>(namespace: &str, name: &str) -> StoreKey {
    (
        K::kind(&()).to_string(),
        namespace.to_string(),
        name.to_string(),
    )
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn get<K: ClusterObject>(&self, namespace: &str, name: &str) -> Result<K, ClusterError> {
        let kind = K::kind(&()).to_string();
        self.calls.lock().unwrap().push(Call::Get {
            kind: kind.clone(),
            name: name.to_string(),
        });
        if let Some(err) = self
            .get_failures
            .lock()
            .unwrap()
            .get(&(kind, name.to_string()))
        {
            return Err(err.clone());
        }
        self.stored(namespace, name).ok_or(ClusterError::NotFound)
    }

    async fn create<K: ClusterObject>(&self, namespace: &str, obj: &K) -> Result<K, ClusterError> {
        let kind = K::kind(&()).to_string();
        let name = obj.meta().name.clone().unwrap_or_default();
        self.calls.lock().unwrap().push(Call::Create {
            kind: kind.clone(),
            name: name.clone(),
        });
        if let Some(err) = self
            .create_failures
            .lock()
            .unwrap()
            .get(&(kind, name.clone()))
        {
            return Err(err.clone());
        }
        if self.stored::<K>(namespace, &name).is_some() {
            return Err(ClusterError::AlreadyExists);
        }
        let mut obj = obj.clone();
        obj.meta_mut().namespace = Some(namespace.to_string());
        Ok(self.insert(&obj))
    }
}

/// [`BuildTrigger`] that records requests instead of running builds.
#[derive(Default)]
pub struct RecordingBuildTrigger {
    requests: Mutex<Vec<BinaryBuildRequest>>,
    fail: bool,
}

impl RecordingBuildTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn requests(&self) -> Vec<BinaryBuildRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Wait until at least `count` builds were requested or a second has passed.
    pub async fn wait_for(&self, count: usize) -> Vec<BinaryBuildRequest> {
        let _ = tokio::time::timeout(Duration::from_secs(1), async {
            while self.requests.lock().unwrap().len() < count {
                tokio::task::yield_now().await;
            }
        })
        .await;
        self.requests()
    }

    /// Give detached tasks a chance to run, then return what was requested.
    pub async fn settle(&self) -> Vec<BinaryBuildRequest> {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        self.requests()
    }
}

#[async_trait]
impl BuildTrigger for RecordingBuildTrigger {
    async fn start_build(&self, request: &BinaryBuildRequest) -> Result<(), BuildTriggerError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(BuildTriggerError::CommandFailed {
                command: "oc".into(),
                status: "exit status: 1".into(),
                stderr: "build config not found".into(),
            });
        }
        Ok(())
    }
}
