//! SHA helpers.

/// Calculate the sha256sum of a byte slice.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    openssl::sha::sha256(data)
}

/// Render the first `len` hex characters of a sha256 digest.
pub fn sha256_hex_prefix(data: &[u8], len: usize) -> String {
    let digest = sha256(data);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex.truncate(len);
    hex
}
