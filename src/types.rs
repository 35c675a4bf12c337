//! Core resource types: `Backup` and the storage/snapshot locations it
//! references.

use std::collections::HashMap;
use std::time::Duration;

/// (namespace, name) identity shared by every resource in this crate.
pub type Key = (String, String);

/// Progress tag owned entirely by this controller.
///
/// `New` (or an empty/default phase) is the only state eligible for
/// reconciliation; every other variant is terminal from this
/// controller's point of view. `Deleting` is synthetic: it is never
/// written by the Runner, only derived for display by the Printer
/// adapter from a non-zero deletion timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Phase {
    #[default]
    New,
    FailedValidation,
    InProgress,
    Completed,
    PartiallyFailed,
    Failed,
    Deleting,
}

impl Phase {
    /// Only `New` (including the zero-value default) is eligible for
    /// processing; everything else is terminal with respect to this
    /// controller.
    pub fn is_eligible(self) -> bool {
        matches!(self, Phase::New)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::New => "New",
            Phase::FailedValidation => "FailedValidation",
            Phase::InProgress => "InProgress",
            Phase::Completed => "Completed",
            Phase::PartiallyFailed => "PartiallyFailed",
            Phase::Failed => "Failed",
            Phase::Deleting => "Deleting",
        };
        f.write_str(s)
    }
}

/// Access mode of a `BackupStorageLocation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadWrite,
    ReadOnly,
}

/// Named, namespaced pointer to a bucket in an external object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupStorageLocation {
    pub namespace: String,
    pub name: String,
    pub provider: String,
    pub bucket: String,
    pub prefix: Option<String>,
    pub access_mode: AccessMode,
}

/// Named, namespaced, provider-scoped target for volume snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSnapshotLocation {
    pub namespace: String,
    pub name: String,
    pub provider: String,
}

/// Canonical short form of a label selector, used by the Printer
/// adapter (SPEC_FULL §4.7) and carried on `BackupSpec` unmodified by
/// everything else in this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector(pub Vec<(String, String)>);

impl LabelSelector {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `key=value,key=value`, sorted for determinism; `<none>` when empty.
    pub fn to_canonical_string(&self) -> String {
        if self.0.is_empty() {
            return "<none>".to_string();
        }
        let mut pairs: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}={v}")).collect();
        pairs.sort();
        pairs.join(",")
    }
}

/// Hook actions attached to a backup; opaque to this core, forwarded
/// to the item pipeline verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hooks {
    pub entries: Vec<String>,
}

/// Immutable user inputs to a Backup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupSpec {
    pub included_resources: Vec<String>,
    pub excluded_resources: Vec<String>,
    pub included_namespaces: Vec<String>,
    pub excluded_namespaces: Vec<String>,
    pub label_selector: LabelSelector,
    pub storage_location: String,
    pub volume_snapshot_locations: Vec<String>,
    pub ttl: Duration,
    pub hooks: Hooks,
}

/// Controller-written outputs of a Backup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupStatus {
    pub phase: Phase,
    pub version: u32,
    pub start_timestamp: Option<i64>,
    pub completion_timestamp: Option<i64>,
    pub expiration: Option<i64>,
    pub validation_errors: Vec<String>,
    /// Set on a terminal `Failed` reached outside the validation gate
    /// (idempotency conflict, existence-check failure, plugin
    /// acquisition failure, pipeline hard error, upload error).
    /// Distinct from `validation_errors`, which is reserved for the
    /// Validator's own output: a consumer inspecting a `Failed` backup
    /// should not have to guess whether `validation_errors` describes
    /// a real validation problem or an unrelated runtime failure.
    pub error_message: Option<String>,
    pub errors: u32,
    pub warnings: u32,
    pub storage_location: String,
    pub labels: Vec<(String, String)>,
}

/// A user-authored record describing one point-in-time capture of
/// cluster state. Identity is `(namespace, name)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Backup {
    pub namespace: String,
    pub name: String,
    pub creation_timestamp: i64,
    /// Non-zero when the resource has been marked for deletion
    /// upstream; this core never sets it, only reads it for display.
    pub deletion_timestamp: Option<i64>,
    pub spec: BackupSpec,
    pub status: BackupStatus,
}

impl Backup {
    pub fn key(&self) -> Key {
        (self.namespace.clone(), self.name.clone())
    }

    /// Effective display phase: `Deleting` overrides whatever the
    /// stored phase is once a deletion timestamp is set.
    pub fn display_phase(&self) -> Phase {
        if self.deletion_timestamp.filter(|ts| *ts != 0).is_some() {
            Phase::Deleting
        } else {
            self.status.phase
        }
    }
}

/// Resolved provider -> location name mapping produced by the
/// snapshot-location resolver (SPEC_FULL §4.5).
pub type SnapshotLocationMap = HashMap<String, String>;
