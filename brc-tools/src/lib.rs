//! Small helpers shared by the backup reconciliation core and its binaries.

pub mod duration;
pub mod sha;
