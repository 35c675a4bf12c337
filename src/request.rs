//! Request builder: defaults and seeds a Backup ahead of validation and
//! execution (SPEC_FULL §4.3).

use std::ops::{Deref, DerefMut};

use crate::config::ReconcilerConfig;
use crate::interfaces::Clock;
use crate::naming::label_encode;
use crate::types::Backup;

/// Label key this core attaches to identify the effective storage
/// location of a backup.
pub const STORAGE_LOCATION_LABEL_KEY: &str = "velero.io/storage-location";

/// A transient, defaulted working copy of a `Backup`. Never written
/// back directly: the Runner marshals it into an `ApiClient` update at
/// the end of a reconcile. The newtype exists so a `Request` can never
/// be accidentally handed to the cache in place of the canonical
/// resource.
#[derive(Debug, Clone)]
pub struct Request(pub Backup);

impl Deref for Request {
    type Target = Backup;
    fn deref(&self) -> &Backup {
        &self.0
    }
}

impl DerefMut for Request {
    fn deref_mut(&mut self) -> &mut Backup {
        &mut self.0
    }
}

impl Request {
    pub fn into_inner(self) -> Backup {
        self.0
    }
}

/// Builds a `Request` from a raw `Backup`, applying the defaulting
/// rules in SPEC_FULL §4.3 in order. Never touches any external
/// collaborator; the result is purely in-memory.
pub fn prepare_backup_request(backup: &Backup, config: &ReconcilerConfig, clock: &dyn Clock) -> Request {
    let mut backup = backup.clone();

    if backup.spec.storage_location.is_empty() {
        backup.spec.storage_location = config.default_backup_location.clone();
    }
    if backup.spec.ttl.is_zero() {
        backup.spec.ttl = config.default_backup_ttl;
    }

    backup.status.storage_location = backup.spec.storage_location.clone();

    let label_value = label_encode(&backup.spec.storage_location);
    backup
        .status
        .labels
        .retain(|(k, _)| k != STORAGE_LOCATION_LABEL_KEY);
    backup
        .status
        .labels
        .push((STORAGE_LOCATION_LABEL_KEY.to_string(), label_value));

    backup.status.version = 1;
    let start = clock.now();
    backup.status.start_timestamp = Some(start);
    backup.status.expiration = Some(start + backup.spec.ttl.as_secs() as i64);

    Request(backup)
}
