//! Bounded-length label encoding (SPEC_FULL §4.2).

use brc_tools::sha::sha256_hex_prefix;

/// Maximum length of a label value in the target system.
const LABEL_MAX_LEN: usize = 63;
const HASH_SUFFIX_LEN: usize = 6;
const TRUNCATED_PREFIX_LEN: usize = LABEL_MAX_LEN - HASH_SUFFIX_LEN;

/// Encode `name` as a label value no longer than 63 characters.
///
/// Names at or below the limit pass through unchanged. Longer names
/// are truncated to their first 57 characters and suffixed with the
/// first 6 hex characters of the SHA-256 digest of the full name, so
/// the same input always produces the same output.
pub fn label_encode(name: &str) -> String {
    if name.chars().count() <= LABEL_MAX_LEN {
        return name.to_string();
    }

    let prefix: String = name.chars().take(TRUNCATED_PREFIX_LEN).collect();
    let suffix = sha256_hex_prefix(name.as_bytes(), HASH_SUFFIX_LEN);
    format!("{prefix}{suffix}")
}
