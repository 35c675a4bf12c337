//! Construction-time configuration (SPEC_FULL §6).

use std::collections::HashMap;
use std::time::Duration;

/// Output format for the ambient logger; affects logging only, never
/// reconcile behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// The four environment/config inputs the core is constructed with.
/// Shared read-only (typically behind an `Arc`) across every worker.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    pub default_backup_location: String,
    pub default_backup_ttl: Duration,
    pub default_snapshot_locations: HashMap<String, String>,
}

impl ReconcilerConfig {
    /// Builds a config after checking the invariants SPEC_FULL §6
    /// requires of its inputs: a non-empty default location and a
    /// strictly positive default TTL.
    pub fn new(
        default_backup_location: impl Into<String>,
        default_backup_ttl: Duration,
        default_snapshot_locations: HashMap<String, String>,
    ) -> anyhow::Result<Self> {
        let default_backup_location = default_backup_location.into();
        if default_backup_location.is_empty() {
            anyhow::bail!("default_backup_location must not be empty");
        }
        if default_backup_ttl.is_zero() {
            anyhow::bail!("default_backup_ttl must be greater than zero");
        }
        Ok(Self {
            default_backup_location,
            default_backup_ttl,
            default_snapshot_locations,
        })
    }
}

/// Initializes the ambient `env_logger` backend according to
/// `format`. Called once at process start, mirroring the teacher's own
/// `init_logger`-style entry points.
pub fn init_logger(format: LogFormat) {
    let mut builder = env_logger::Builder::from_default_env();
    match format {
        LogFormat::Text => {
            builder.format_timestamp_secs();
        }
        LogFormat::Json => {
            builder.format(|buf, record| {
                use std::io::Write;
                writeln!(
                    buf,
                    "{{\"level\":\"{}\",\"target\":\"{}\",\"message\":{:?}}}",
                    record.level(),
                    record.target(),
                    record.args().to_string()
                )
            });
        }
    }
    let _ = builder.try_init();
}
