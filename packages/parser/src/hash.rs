use crc32fast::Hasher;

/// CRC32 of the source text, used to key compiled modules
pub fn source_hash(source: &str) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(source.as_bytes());
    hasher.finalize()
}

/// Short hex id for a source text, for logs and cache diagnostics
pub fn source_id(source: &str) -> String {
    format!("{:08x}", source_hash(source))
}
