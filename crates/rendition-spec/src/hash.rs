//! Seed derivation.
//!
//! Every random stream in a render is seeded from a `u32` derived with BLAKE3,
//! so renders are reproducible from file identity alone:
//!
//! ```text
//! file_seed      = truncate_u32(BLAKE3(file_stem))
//! track_seed     = truncate_u32(BLAKE3(file_seed || track_index))
//! component_seed = truncate_u32(BLAKE3(track_seed || key))
//! ```

/// Truncates a BLAKE3 hash to its first 4 bytes, little-endian.
fn truncate_u32(hash: &blake3::Hash) -> u32 {
    let bytes = hash.as_bytes();
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Derives the base seed for a file from its identity (usually the file stem).
///
/// # Example
/// ```
/// use rendition_spec::hash::derive_file_seed;
///
/// assert_eq!(derive_file_seed("bolero"), derive_file_seed("bolero"));
/// assert_ne!(derive_file_seed("bolero"), derive_file_seed("pavane"));
/// ```
pub fn derive_file_seed(identity: &str) -> u32 {
    truncate_u32(&blake3::hash(identity.as_bytes()))
}

/// Derives an independent seed for one track of a file.
///
/// # Arguments
/// * `base_seed` - The file seed
/// * `track_index` - The 0-indexed track number
pub fn derive_track_seed(base_seed: u32, track_index: u32) -> u32 {
    // Concatenate base_seed and track_index as little-endian bytes
    let mut input = Vec::with_capacity(8);
    input.extend_from_slice(&base_seed.to_le_bytes());
    input.extend_from_slice(&track_index.to_le_bytes());

    truncate_u32(&blake3::hash(&input))
}

/// Derives a seed for a named component ("partition", "tempo", ...) from a base seed.
pub fn derive_component_seed(base_seed: u32, key: &str) -> u32 {
    let mut input = Vec::with_capacity(4 + key.len());
    input.extend_from_slice(&base_seed.to_le_bytes());
    input.extend_from_slice(key.as_bytes());

    truncate_u32(&blake3::hash(&input))
}

/// Hex-encoded BLAKE3 hash of raw bytes, used to fingerprint score files.
///
/// # Returns
/// * A 64-character lowercase hexadecimal string
pub fn content_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}
