//! Tabular row production for Backups (SPEC_FULL §4.7).

use brc_tools::duration::render_relative;

use crate::listing::sort_names;
use crate::types::{Backup, Phase};

/// One printable row: Name, Status, Created, Expires, Storage Location,
/// Selector, in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub name: String,
    pub status: String,
    pub created: String,
    pub expires: String,
    pub storage_location: String,
    pub selector: String,
}

fn status_column(backup: &Backup) -> String {
    let phase = backup.display_phase();
    let mut s = phase.to_string();
    if phase == Phase::PartiallyFailed {
        let n = backup.status.errors;
        let suffix = if n == 1 { "error" } else { "errors" };
        s.push_str(&format!(" ({n} {suffix})"));
    }
    s
}

fn expires_column(backup: &Backup, now: i64) -> String {
    let expiration = backup.status.expiration.filter(|e| *e != 0).or_else(|| {
        if backup.spec.ttl.as_secs() > 0 {
            Some(backup.creation_timestamp + backup.spec.ttl.as_secs() as i64)
        } else {
            None
        }
    });

    match expiration {
        Some(ts) => render_relative(ts, now),
        None => "n/a".to_string(),
    }
}

/// Produces a single row for `backup`, relative to `now`.
pub fn print_backup(backup: &Backup, now: i64) -> Row {
    Row {
        name: backup.name.clone(),
        status: status_column(backup),
        created: render_relative(backup.creation_timestamp, now),
        expires: expires_column(backup, now),
        storage_location: backup.status.storage_location.clone(),
        selector: backup.spec.label_selector.to_canonical_string(),
    }
}

/// Produces rows for a collection of backups, in listing order
/// (SPEC_FULL §4.1) relative to `now`.
pub fn print_list(backups: &[Backup], now: i64) -> Vec<Row> {
    let mut names: Vec<String> = backups.iter().map(|b| b.name.clone()).collect();
    sort_names(&mut names);

    names
        .into_iter()
        .filter_map(|name| backups.iter().find(|b| b.name == name))
        .map(|b| print_backup(b, now))
        .collect()
}
