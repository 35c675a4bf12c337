//! External collaborator interfaces (SPEC_FULL §6).
//!
//! Everything in this module is a trait: the read-only caches, the API
//! client, the item-backup pipeline, the object store, the plugin
//! manager, and the clock are all owned by other subsystems. This core
//! only ever talks to them through these boundaries, which is also
//! what makes the scenarios in SPEC_FULL §8 possible to write without
//! a real cluster.

use anyhow::Error;

use crate::types::{Backup, BackupStorageLocation, Key, SnapshotLocationMap, VolumeSnapshotLocation};

/// A not-found outcome from a cache lookup, distinct from a lookup
/// failure: caches are assumed never to fail, only to miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFound;

impl std::fmt::Display for NotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("not found")
    }
}

impl std::error::Error for NotFound {}

/// Read-only, already-populated indexed cache over a resource type.
pub trait Cache<T>: Send + Sync {
    fn get(&self, namespace: &str, name: &str) -> Result<T, NotFound>;
}

/// Read-only cache that additionally supports listing every resource
/// in a namespace, used by the snapshot-location resolver to find
/// implicit single-candidate providers.
pub trait ListableCache<T>: Cache<T> {
    fn list(&self, namespace: &str) -> Vec<T>;
}

/// Mutating access to the cluster-visible Backup resource. Never the
/// cache: the Runner always reads the latest version and writes
/// through this client.
pub trait ApiClient: Send + Sync {
    fn get_backup(&self, namespace: &str, name: &str) -> Result<Backup, NotFound>;
    fn update_backup(&self, backup: &Backup) -> Result<(), Error>;
}

/// Per-item actions the plugin manager can hand to the pipeline; this
/// core only threads the value through, it never inspects it.
pub struct ItemActions;

/// Per-reconcile handle to the backup item pipeline, obtained from a
/// `PluginManager` and acquired fresh every `processBackup` call.
pub trait Backupper: Send + Sync {
    /// Runs the item-extraction pipeline against `request`, mutating
    /// `request.status.errors`/`warnings` as a side-effect, writing
    /// artifact bytes through `writer`, and using `snapshot_locations`
    /// (the resolved provider -> location mapping from the Validator)
    /// to pick a snapshotter per provider. Returns an error only for a
    /// pipeline-level failure (error-taxonomy kind 6); per-item
    /// failures are recorded into the status counts instead.
    fn backup(
        &self,
        request: &mut Backup,
        writer: &mut dyn ArtifactWriter,
        actions: &ItemActions,
        snapshot_locations: &SnapshotLocationMap,
    ) -> Result<(), Error>;
}

/// Sink for the artifact bytes produced by a pipeline run. The actual
/// encoding is the pipeline's concern; this core only owns the
/// lifecycle of the writer and drains it once the pipeline returns.
pub trait ArtifactWriter: Send {
    fn write_item(&mut self, path: &str, data: &[u8]) -> Result<(), Error>;

    /// Returns everything written through `write_item` so far, leaving
    /// the writer empty. Called once, after the pipeline returns
    /// successfully, to hand the artifact stream to `BackupStore`.
    fn finish(&mut self) -> Vec<u8>;
}

/// Metadata and artifact bundle handed to the object store on upload.
pub struct BackupInfo {
    pub name: String,
    pub metadata: Vec<u8>,
    pub contents: Vec<u8>,
}

/// External object-store driver.
pub trait BackupStore: Send + Sync {
    fn backup_exists(&self, bucket: &str, name: &str) -> Result<bool, Error>;
    fn put_backup(&self, info: BackupInfo) -> Result<(), Error>;
}

/// Plugin process lifecycle, acquired per reconcile and released on
/// every exit path (SPEC_FULL §5, §9).
pub trait PluginManager: Send {
    fn get_backup_item_actions(&mut self) -> Result<ItemActions, Error>;
    fn cleanup_clients(&mut self);
}

/// Injectable source of the current time, so the Request builder and
/// Runner are deterministic under test (SPEC_FULL §8 scenario 4).
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

pub type BackupCache = dyn Cache<Backup>;
pub type StorageLocationCache = dyn ListableCache<BackupStorageLocation>;
pub type SnapshotLocationCache = dyn ListableCache<VolumeSnapshotLocation>;

/// Parses a work-queue key of the form `"namespace/name"`
/// (error-taxonomy kind 1).
pub fn parse_key(key: &str) -> Result<Key, Error> {
    match key.split_once('/') {
        Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
            Ok((namespace.to_string(), name.to_string()))
        }
        _ => anyhow::bail!("malformed work queue key: {key:?}"),
    }
}
