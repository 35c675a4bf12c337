//! In-memory mock implementations of the external interfaces (SPEC_FULL
//! §6), used to exercise the Runner's scenarios (SPEC_FULL §8) without
//! a real cluster, object store, or plugin process.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Error;

use crate::interfaces::{
    ApiClient, ArtifactWriter, Backupper, BackupInfo, BackupStore, Cache, Clock, ItemActions,
    ListableCache, NotFound, PluginManager,
};
use crate::types::{Backup, BackupStorageLocation, Key, SnapshotLocationMap, VolumeSnapshotLocation};

/// A fixed point in time, for the clock-frozen scenarios in SPEC_FULL §8.
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

/// Read-only cache backed by a fixed `Vec`, keyed by `(namespace, name)`.
pub struct MockCache<T> {
    items: Vec<T>,
}

impl<T: Clone> MockCache<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl Cache<Backup> for MockCache<Backup> {
    fn get(&self, namespace: &str, name: &str) -> Result<Backup, NotFound> {
        self.items
            .iter()
            .find(|b| b.namespace == namespace && b.name == name)
            .cloned()
            .ok_or(NotFound)
    }
}

impl Cache<BackupStorageLocation> for MockCache<BackupStorageLocation> {
    fn get(&self, namespace: &str, name: &str) -> Result<BackupStorageLocation, NotFound> {
        self.items
            .iter()
            .find(|l| l.namespace == namespace && l.name == name)
            .cloned()
            .ok_or(NotFound)
    }
}

impl ListableCache<BackupStorageLocation> for MockCache<BackupStorageLocation> {
    fn list(&self, namespace: &str) -> Vec<BackupStorageLocation> {
        self.items.iter().filter(|l| l.namespace == namespace).cloned().collect()
    }
}

impl Cache<VolumeSnapshotLocation> for MockCache<VolumeSnapshotLocation> {
    fn get(&self, namespace: &str, name: &str) -> Result<VolumeSnapshotLocation, NotFound> {
        self.items
            .iter()
            .find(|l| l.namespace == namespace && l.name == name)
            .cloned()
            .ok_or(NotFound)
    }
}

impl ListableCache<VolumeSnapshotLocation> for MockCache<VolumeSnapshotLocation> {
    fn list(&self, namespace: &str) -> Vec<VolumeSnapshotLocation> {
        self.items.iter().filter(|l| l.namespace == namespace).cloned().collect()
    }
}

/// Records every `update_backup` call so assertions can inspect the
/// final written state, and optionally serves `get_backup`.
#[derive(Default)]
pub struct MockApiClient {
    pub updates: Mutex<Vec<Backup>>,
}

impl ApiClient for MockApiClient {
    fn get_backup(&self, namespace: &str, name: &str) -> Result<Backup, NotFound> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|b| b.namespace == namespace && b.name == name)
            .cloned()
            .ok_or(NotFound)
    }

    fn update_backup(&self, backup: &Backup) -> Result<(), Error> {
        self.updates.lock().unwrap().push(backup.clone());
        Ok(())
    }
}

impl MockApiClient {
    pub fn last_update(&self) -> Option<Backup> {
        self.updates.lock().unwrap().last().cloned()
    }
}

/// A backupper that records whether it was invoked and returns a
/// fixed outcome, matching SPEC_FULL §8 scenario 5's "Backup not
/// invoked" assertion.
pub struct MockBackupper {
    pub invoked: Mutex<bool>,
    pub errors: u32,
    pub warnings: u32,
    pub hard_error: Option<String>,
}

impl Default for MockBackupper {
    fn default() -> Self {
        Self {
            invoked: Mutex::new(false),
            errors: 0,
            warnings: 0,
            hard_error: None,
        }
    }
}

impl Backupper for MockBackupper {
    fn backup(
        &self,
        request: &mut Backup,
        writer: &mut dyn ArtifactWriter,
        _actions: &ItemActions,
        _snapshot_locations: &SnapshotLocationMap,
    ) -> Result<(), Error> {
        *self.invoked.lock().unwrap() = true;
        if let Some(msg) = &self.hard_error {
            anyhow::bail!("{msg}");
        }
        writer.write_item(&request.name, b"mock-item-bytes")?;
        request.status.errors = self.errors;
        request.status.warnings = self.warnings;
        Ok(())
    }
}

/// Object store double. `exists` and `exists_err` control the
/// idempotency-conflict scenario; `put_backup` is recorded.
pub struct MockBackupStore {
    pub exists: bool,
    pub exists_err: bool,
    pub put_calls: Mutex<Vec<BackupInfo>>,
}

impl Default for MockBackupStore {
    fn default() -> Self {
        Self {
            exists: false,
            exists_err: false,
            put_calls: Mutex::new(Vec::new()),
        }
    }
}

impl BackupStore for MockBackupStore {
    fn backup_exists(&self, _bucket: &str, _name: &str) -> Result<bool, Error> {
        if self.exists_err {
            anyhow::bail!("existence check failed");
        }
        Ok(self.exists)
    }

    fn put_backup(&self, info: BackupInfo) -> Result<(), Error> {
        self.put_calls.lock().unwrap().push(info);
        Ok(())
    }
}

impl MockBackupStore {
    pub fn put_call_count(&self) -> usize {
        self.put_calls.lock().unwrap().len()
    }

    pub fn last_put(&self) -> Option<BackupInfo> {
        self.put_calls.lock().unwrap().last().map(|info| BackupInfo {
            name: info.name.clone(),
            metadata: info.metadata.clone(),
            contents: info.contents.clone(),
        })
    }
}

pub struct MockPluginManager {
    pub cleaned_up: Mutex<bool>,
}

impl Default for MockPluginManager {
    fn default() -> Self {
        Self {
            cleaned_up: Mutex::new(false),
        }
    }
}

impl PluginManager for MockPluginManager {
    fn get_backup_item_actions(&mut self) -> Result<ItemActions, Error> {
        Ok(ItemActions)
    }

    fn cleanup_clients(&mut self) {
        *self.cleaned_up.lock().unwrap() = true;
    }
}

#[derive(Default)]
pub struct MockArtifactWriter {
    buffer: Vec<u8>,
}

impl ArtifactWriter for MockArtifactWriter {
    fn write_item(&mut self, _path: &str, data: &[u8]) -> Result<(), Error> {
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }
}

pub fn snapshot_location_defaults() -> HashMap<String, String> {
    HashMap::new()
}

pub fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}
