//! Shared test utilities for filesystem integration tests
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use common::prelude::*;
use object_store::{BlobStoreError, Result as BlobResult};
use tempfile::TempDir;
use tokio::sync::Notify;

/// Set up an in-memory store and a session for `alice`
pub async fn setup_test_env() -> (Store, FileSystem) {
    let store = Store::ephemeral().await.unwrap();
    let fs = store.session("alice").unwrap();
    (store, fs)
}

/// Set up a store whose blob storage can be told to fail
pub async fn setup_faulty_env() -> (Store, FileSystem, Arc<FaultyStorage>) {
    let db = Database::in_memory().await.unwrap();
    let faulty = Arc::new(FaultyStorage::new());
    let store = Store::new(db, faulty.clone());
    let fs = store.session("alice").unwrap();
    (store, fs, faulty)
}

/// Set up a store whose physical deletes can be parked mid-flight
pub async fn setup_gated_env() -> (Store, FileSystem, Arc<GatedStorage>) {
    let db = Database::in_memory().await.unwrap();
    let gated = Arc::new(GatedStorage::new());
    let store = Store::new(db, gated.clone());
    let fs = store.session("alice").unwrap();
    (store, fs, gated)
}

/// Set up a store backed by a database file and local blob directory
pub async fn setup_on_disk() -> (Store, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = open_on_disk(&temp_dir).await;
    (store, temp_dir)
}

pub async fn open_on_disk(temp_dir: &TempDir) -> Store {
    Store::open(
        &temp_dir.path().join("db.sqlite"),
        ObjectStoreConfig::Local {
            path: temp_dir.path().join("blobs"),
        },
    )
    .await
    .unwrap()
}

/// Reference count of the blob currently behind `path`
pub async fn ref_count(fs: &FileSystem, path: &str) -> i64 {
    let node = fs.get_info(path).await.unwrap();
    let blob = fs
        .store()
        .blob(node.blob_id().unwrap())
        .await
        .unwrap()
        .unwrap();
    blob.reference_count
}

/// Every node row for every owner, raw column values in path order
pub type NodeRow = (
    String,
    String,
    String,
    String,
    i64,
    String,
    Option<String>,
    String,
    String,
);

pub async fn node_rows(store: &Store) -> Vec<NodeRow> {
    sqlx::query_as::<_, NodeRow>(
        "SELECT owner_id, path, name, kind, size, content_type, blob_id, created_at, updated_at \
         FROM nodes ORDER BY owner_id, path",
    )
    .fetch_all(&**store.database())
    .await
    .unwrap()
}

/// Install a trigger that aborts the statement it fires on
pub async fn fail_when(store: &Store, trigger: &str, event: &str, condition: &str) {
    let sql = format!(
        "CREATE TRIGGER {} BEFORE {} WHEN {} BEGIN SELECT RAISE(ABORT, 'injected failure'); END",
        trigger, event, condition
    );
    sqlx::query(&sql)
        .execute(&**store.database())
        .await
        .unwrap();
}

/// In-memory blob storage with switchable failures
#[derive(Debug)]
pub struct FaultyStorage {
    inner: ObjectStore,
    failing_gets: Mutex<HashSet<BlobId>>,
    failing_deletes: Mutex<HashSet<BlobId>>,
    fail_all_puts: Mutex<bool>,
}

impl FaultyStorage {
    pub fn new() -> Self {
        Self {
            inner: ObjectStore::memory(),
            failing_gets: Mutex::new(HashSet::new()),
            failing_deletes: Mutex::new(HashSet::new()),
            fail_all_puts: Mutex::new(false),
        }
    }

    pub fn fail_get(&self, id: &BlobId) {
        self.failing_gets.lock().unwrap().insert(id.clone());
    }

    pub fn fail_delete(&self, id: &BlobId) {
        self.failing_deletes.lock().unwrap().insert(id.clone());
    }

    pub fn fail_puts(&self, fail: bool) {
        *self.failing_puts() = fail;
    }

    pub fn heal(&self) {
        self.failing_gets.lock().unwrap().clear();
        self.failing_deletes.lock().unwrap().clear();
        *self.failing_puts() = false;
    }

    fn failing_puts(&self) -> std::sync::MutexGuard<'_, bool> {
        self.fail_all_puts.lock().unwrap()
    }

    fn injected(op: &str, id: &BlobId) -> BlobStoreError {
        BlobStoreError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("injected {} failure for {}", op, id),
        ))
    }
}

#[async_trait]
impl BlobStorage for FaultyStorage {
    async fn put(&self, id: &BlobId, data: Bytes) -> BlobResult<()> {
        if *self.failing_puts() {
            return Err(Self::injected("put", id));
        }
        self.inner.put(id, data).await
    }

    async fn get(&self, id: &BlobId) -> BlobResult<Bytes> {
        if self.failing_gets.lock().unwrap().contains(id) {
            return Err(Self::injected("get", id));
        }
        self.inner.get(id).await
    }

    async fn delete(&self, id: &BlobId) -> BlobResult<()> {
        if self.failing_deletes.lock().unwrap().contains(id) {
            return Err(Self::injected("delete", id));
        }
        self.inner.delete(id).await
    }

    async fn exists(&self, id: &BlobId) -> BlobResult<bool> {
        self.inner.exists(id).await
    }

    async fn list(&self) -> BlobResult<Vec<BlobId>> {
        self.inner.list().await
    }
}

/// In-memory blob storage whose deletes can be held until released
#[derive(Debug)]
pub struct GatedStorage {
    inner: ObjectStore,
    holding: AtomicBool,
    entered: Notify,
    released: Notify,
}

impl GatedStorage {
    pub fn new() -> Self {
        Self {
            inner: ObjectStore::memory(),
            holding: AtomicBool::new(false),
            entered: Notify::new(),
            released: Notify::new(),
        }
    }

    /// Make the next delete wait for `release_deletes`
    pub fn hold_deletes(&self) {
        self.holding.store(true, Ordering::SeqCst);
    }

    /// Wait until a held delete has started
    pub async fn wait_for_delete(&self) {
        self.entered.notified().await;
    }

    pub fn release_deletes(&self) {
        self.holding.store(false, Ordering::SeqCst);
        self.released.notify_one();
    }
}

#[async_trait]
impl BlobStorage for GatedStorage {
    async fn put(&self, id: &BlobId, data: Bytes) -> BlobResult<()> {
        self.inner.put(id, data).await
    }

    async fn get(&self, id: &BlobId) -> BlobResult<Bytes> {
        self.inner.get(id).await
    }

    async fn delete(&self, id: &BlobId) -> BlobResult<()> {
        if self.holding.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.released.notified().await;
        }
        self.inner.delete(id).await
    }

    async fn exists(&self, id: &BlobId) -> BlobResult<bool> {
        self.inner.exists(id).await
    }

    async fn list(&self) -> BlobResult<Vec<BlobId>> {
        self.inner.list().await
    }
}
