//! Validator: include/exclude disjointness, storage-location
//! existence/writability, and snapshot-location resolution, combined
//! into a single error list gating `FailedValidation` (SPEC_FULL §4.4).

use crate::interfaces::{ListableCache, NotFound};
use crate::location::{check_writable, resolve_snapshot_locations};
use crate::types::{Backup, BackupStorageLocation, SnapshotLocationMap, VolumeSnapshotLocation};

/// Result of validating a `Request`: the combined error list plus,
/// when validation succeeded, the resolved snapshot locations the
/// Runner needs to carry forward.
pub struct ValidationOutcome {
    pub errors: Vec<String>,
    pub snapshot_locations: SnapshotLocationMap,
}

impl ValidationOutcome {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

fn check_disjoint(kind: &str, includes: &[String], excludes: &[String], errors: &mut Vec<String>) {
    if let Some(overlap) = excludes.iter().find(|e| includes.contains(e)) {
        errors.push(format!(
            "Invalid included/excluded {kind} lists: excludes list cannot contain an item in the includes list: {overlap}"
        ));
    }
}

/// Validates `backup` against the given caches, returning the
/// combined error list and (on success) the resolved snapshot
/// locations.
pub fn validate_backup(
    backup: &Backup,
    storage_locations: &dyn ListableCache<BackupStorageLocation>,
    snapshot_locations: &dyn ListableCache<VolumeSnapshotLocation>,
    defaults: &std::collections::HashMap<String, String>,
) -> ValidationOutcome {
    let mut errors = Vec::new();

    check_disjoint(
        "resource",
        &backup.spec.included_resources,
        &backup.spec.excluded_resources,
        &mut errors,
    );
    check_disjoint(
        "namespace",
        &backup.spec.included_namespaces,
        &backup.spec.excluded_namespaces,
        &mut errors,
    );

    match storage_locations.get(&backup.namespace, &backup.spec.storage_location) {
        Ok(location) => {
            if let Some(err) = check_writable(&location) {
                errors.push(err);
            }
        }
        Err(NotFound) => {
            errors.push(format!(
                "a BackupStorageLocation CRD with the name specified in the backup spec needs to be created before this backup can be executed. Error: {} not found",
                backup.spec.storage_location
            ));
        }
    }

    let resolved = resolve_snapshot_locations(
        snapshot_locations,
        &backup.namespace,
        &backup.spec.volume_snapshot_locations,
        defaults,
        &mut errors,
    );

    ValidationOutcome {
        errors,
        snapshot_locations: resolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::Cache;
    use crate::types::AccessMode;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FixedCache<T> {
        items: Mutex<Vec<T>>,
    }

    impl Cache<BackupStorageLocation> for FixedCache<BackupStorageLocation> {
        fn get(&self, namespace: &str, name: &str) -> Result<BackupStorageLocation, NotFound> {
            self.items
                .lock()
                .unwrap()
                .iter()
                .find(|l| l.namespace == namespace && l.name == name)
                .cloned()
                .ok_or(NotFound)
        }
    }
    impl ListableCache<BackupStorageLocation> for FixedCache<BackupStorageLocation> {
        fn list(&self, namespace: &str) -> Vec<BackupStorageLocation> {
            self.items
                .lock()
                .unwrap()
                .iter()
                .filter(|l| l.namespace == namespace)
                .cloned()
                .collect()
        }
    }

    impl Cache<VolumeSnapshotLocation> for FixedCache<VolumeSnapshotLocation> {
        fn get(&self, namespace: &str, name: &str) -> Result<VolumeSnapshotLocation, NotFound> {
            self.items
                .lock()
                .unwrap()
                .iter()
                .find(|l| l.namespace == namespace && l.name == name)
                .cloned()
                .ok_or(NotFound)
        }
    }
    impl ListableCache<VolumeSnapshotLocation> for FixedCache<VolumeSnapshotLocation> {
        fn list(&self, namespace: &str) -> Vec<VolumeSnapshotLocation> {
            self.items
                .lock()
                .unwrap()
                .iter()
                .filter(|l| l.namespace == namespace)
                .cloned()
                .collect()
        }
    }

    fn bsl(namespace: &str, name: &str, mode: AccessMode) -> BackupStorageLocation {
        BackupStorageLocation {
            namespace: namespace.to_string(),
            name: name.to_string(),
            provider: "aws".to_string(),
            bucket: "bucket".to_string(),
            prefix: None,
            access_mode: mode,
        }
    }

    fn empty_vsl_cache() -> FixedCache<VolumeSnapshotLocation> {
        FixedCache { items: Mutex::new(vec![]) }
    }

    #[test]
    fn spec_scenario_1_include_exclude_overlap() {
        let mut backup = Backup::default();
        backup.namespace = "ns".to_string();
        backup.spec.included_resources = vec!["foo".to_string()];
        backup.spec.excluded_resources = vec!["foo".to_string()];
        backup.spec.storage_location = "loc-1".to_string();

        let storage = FixedCache {
            items: Mutex::new(vec![bsl("ns", "loc-1", AccessMode::ReadWrite)]),
        };
        let outcome = validate_backup(&backup, &storage, &empty_vsl_cache(), &HashMap::new());

        assert!(outcome.errors.iter().any(|e| e
            == "Invalid included/excluded resource lists: excludes list cannot contain an item in the includes list: foo"));
    }

    #[test]
    fn spec_scenario_2_unknown_storage_location() {
        let mut backup = Backup::default();
        backup.namespace = "ns".to_string();
        backup.spec.storage_location = "nonexistent".to_string();

        let storage = FixedCache { items: Mutex::new(vec![]) };
        let outcome = validate_backup(&backup, &storage, &empty_vsl_cache(), &HashMap::new());

        assert!(outcome.errors.iter().any(|e| e.contains("a BackupStorageLocation CRD") && e.contains("nonexistent")));
    }

    #[test]
    fn spec_scenario_3_read_only_storage_location() {
        let mut backup = Backup::default();
        backup.namespace = "ns".to_string();
        backup.spec.storage_location = "read-only".to_string();

        let storage = FixedCache {
            items: Mutex::new(vec![bsl("ns", "read-only", AccessMode::ReadOnly)]),
        };
        let outcome = validate_backup(&backup, &storage, &empty_vsl_cache(), &HashMap::new());

        assert!(outcome.errors.iter().any(|e| e.contains("currently in read-only mode")));
    }

    #[test]
    fn valid_backup_produces_no_errors() {
        let mut backup = Backup::default();
        backup.namespace = "ns".to_string();
        backup.spec.storage_location = "loc-1".to_string();

        let storage = FixedCache {
            items: Mutex::new(vec![bsl("ns", "loc-1", AccessMode::ReadWrite)]),
        };
        let outcome = validate_backup(&backup, &storage, &empty_vsl_cache(), &HashMap::new());
        assert!(outcome.is_ok());
    }
}
