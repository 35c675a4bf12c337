//! The Runner: drives a Backup through its phase machine, invokes the
//! item pipeline, and uploads the artifact (SPEC_FULL §4.6).

use std::sync::Arc;

use anyhow::Error;
use log::{debug, error, info, warn};

use crate::config::ReconcilerConfig;
use crate::interfaces::{
    ApiClient, ArtifactWriter, Backupper, BackupInfo, BackupStore, Clock, ListableCache, NotFound,
    PluginManager,
};
use crate::request::prepare_backup_request;
use crate::tracker::BackupTracker;
use crate::types::{Backup, BackupStorageLocation, Phase, SnapshotLocationMap, VolumeSnapshotLocation};
use crate::validate::validate_backup;

/// Everything `processBackup` needs, grouped so constructing a Runner
/// is a single call rather than threading six collaborators through
/// every method. Every field is an injected trait object per
/// SPEC_FULL §9 ("Testing seams").
pub struct Runner {
    pub config: Arc<ReconcilerConfig>,
    pub backup_cache: Arc<dyn crate::interfaces::Cache<Backup>>,
    pub storage_locations: Arc<dyn ListableCache<BackupStorageLocation>>,
    pub snapshot_locations: Arc<dyn ListableCache<VolumeSnapshotLocation>>,
    pub api_client: Arc<dyn ApiClient>,
    pub backup_store: Arc<dyn BackupStore>,
    pub clock: Arc<dyn Clock>,
    pub tracker: BackupTracker,
}

/// A freshly acquired plugin manager and backupper for one reconcile.
/// The Runner obtains one of these per call to `process_backup` and
/// releases it on every exit path via `PluginManagerGuard`.
pub struct ReconcileCollaborators {
    pub plugin_manager: Box<dyn PluginManager>,
    pub backupper: Arc<dyn Backupper>,
    pub artifact_writer: Box<dyn ArtifactWriter>,
}

struct PluginManagerGuard<'a> {
    manager: &'a mut dyn PluginManager,
}

impl Drop for PluginManagerGuard<'_> {
    fn drop(&mut self) {
        self.manager.cleanup_clients();
    }
}

impl PluginManagerGuard<'_> {
    fn get_backup_item_actions(&mut self) -> Result<crate::interfaces::ItemActions, Error> {
        self.manager.get_backup_item_actions()
    }
}

impl Runner {
    /// Idempotent reconcile entry point. Only a final status-write
    /// failure (error-taxonomy kind 8) is returned; every other
    /// outcome is a terminal phase persisted through the API client.
    pub fn process_backup(
        &self,
        key: &str,
        collaborators: &mut ReconcileCollaborators,
    ) -> Result<(), Error> {
        let (namespace, name) = match crate::interfaces::parse_key(key) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("skipping malformed work queue key {key:?}: {err}");
                return Ok(());
            }
        };

        debug!("processing backup {namespace}/{name}");

        let backup = match self.backup_cache.get(&namespace, &name) {
            Ok(b) => b,
            Err(NotFound) => {
                debug!("backup {namespace}/{name} not found in cache, skipping");
                return Ok(());
            }
        };

        if !backup.status.phase.is_eligible() {
            debug!(
                "backup {namespace}/{name} has non-pending phase {}, skipping",
                backup.status.phase
            );
            return Ok(());
        }

        let request = prepare_backup_request(&backup, &self.config, self.clock.as_ref());
        let outcome = validate_backup(
            &request,
            self.storage_locations.as_ref(),
            self.snapshot_locations.as_ref(),
            &self.config.default_snapshot_locations,
        );

        if !outcome.is_ok() {
            let mut failed = request.into_inner();
            failed.status.phase = Phase::FailedValidation;
            failed.status.validation_errors = outcome.errors;
            warn!(
                "backup {namespace}/{name} failed validation: {:?}",
                failed.status.validation_errors
            );
            return self.write_status(&failed);
        }

        let mut in_progress = request.into_inner();
        in_progress.status.phase = Phase::InProgress;
        info!("backup {namespace}/{name} transitioning New -> InProgress");
        if let Err(err) = self.write_status(&in_progress) {
            error!("backup {namespace}/{name}: failed to write InProgress status: {err}");
            return Err(err);
        }

        let guard = self.tracker.track(in_progress.key());
        let result = self.run_in_progress(in_progress, outcome.snapshot_locations, collaborators);
        drop(guard);
        result
    }

    fn run_in_progress(
        &self,
        mut backup: Backup,
        snapshot_locations: SnapshotLocationMap,
        collaborators: &mut ReconcileCollaborators,
    ) -> Result<(), Error> {
        let bucket = backup.spec.storage_location.clone();
        let name = backup.name.clone();
        let namespace = backup.namespace.clone();
        let mut plugin_guard = PluginManagerGuard {
            manager: collaborators.plugin_manager.as_mut(),
        };

        match self.backup_store.backup_exists(&bucket, &name) {
            Ok(true) => {
                warn!("backup {namespace}/{name}: artifact already exists in store");
                backup.status.phase = Phase::Failed;
                backup.status.error_message =
                    Some(format!("backup {name} already exists in object storage"));
                return self.write_status(&backup);
            }
            Ok(false) => {}
            Err(err) => {
                warn!("backup {namespace}/{name}: existence check failed: {err}");
                backup.status.phase = Phase::Failed;
                backup.status.error_message = Some(format!(
                    "error checking if backup already exists in object storage: {err}"
                ));
                return self.write_status(&backup);
            }
        }

        let actions = match plugin_guard.get_backup_item_actions() {
            Ok(actions) => actions,
            Err(err) => {
                error!("backup {namespace}/{name}: failed to get backup item actions: {err}");
                backup.status.phase = Phase::Failed;
                backup.status.error_message = Some(format!("{err}"));
                return self.write_status(&backup);
            }
        };

        let pipeline_result = collaborators.backupper.backup(
            &mut backup,
            collaborators.artifact_writer.as_mut(),
            &actions,
            &snapshot_locations,
        );

        if let Err(err) = pipeline_result {
            error!("backup {namespace}/{name}: pipeline returned a hard error: {err}");
            backup.status.phase = Phase::Failed;
            backup.status.error_message = Some(format!("{err}"));
            return self.write_status(&backup);
        }

        backup.status.completion_timestamp = Some(self.clock.now());
        let metadata = self.serialize_metadata(&backup);
        let contents = collaborators.artifact_writer.finish();

        match self.backup_store.put_backup(BackupInfo {
            name: backup.name.clone(),
            metadata,
            contents,
        }) {
            Ok(()) => {
                backup.status.phase = if backup.status.errors > 0 {
                    Phase::PartiallyFailed
                } else {
                    Phase::Completed
                };
                info!(
                    "backup {namespace}/{name} completed with phase {} ({} errors, {} warnings)",
                    backup.status.phase, backup.status.errors, backup.status.warnings
                );
            }
            Err(err) => {
                error!("backup {namespace}/{name}: upload failed: {err}");
                backup.status.phase = Phase::Failed;
                backup.status.error_message = Some(format!("{err}"));
            }
        }

        self.write_status(&backup)
    }

    /// Reads the latest version from the cache, mutates a deep copy,
    /// and issues the update through the API client; the cache itself
    /// is never written to directly (SPEC_FULL §4.6 "Status write is last").
    fn write_status(&self, backup: &Backup) -> Result<(), Error> {
        self.api_client.update_backup(backup)
    }

    /// Serializes the parts of the backup's resource the store needs
    /// at rest, with `completionTimestamp` already stamped, per
    /// SPEC_FULL §4.6 "Artifact upload contract". Falls back to an
    /// empty object on a serialization failure rather than failing the
    /// whole upload over a logging-adjacent concern.
    fn serialize_metadata(&self, backup: &Backup) -> Vec<u8> {
        let metadata = BackupMetadata {
            namespace: &backup.namespace,
            name: &backup.name,
            storage_location: &backup.spec.storage_location,
            completion_timestamp: backup.status.completion_timestamp.unwrap_or_default(),
        };
        serde_json::to_vec(&metadata).unwrap_or_default()
    }
}

#[derive(serde::Serialize)]
struct BackupMetadata<'a> {
    namespace: &'a str,
    name: &'a str,
    #[serde(rename = "storageLocation")]
    storage_location: &'a str,
    #[serde(rename = "completionTimestamp")]
    completion_timestamp: i64,
}
