//! In-process content fingerprints for certifiable files.

use std::fs;
use std::io;
use std::path::Path;

/// 32-char lowercase hex MD5 digest of `data`.
pub fn hash_bytes(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// Hash the full contents of the file at `path`.
pub fn content_hash(path: &Path) -> io::Result<String> {
    let data = fs::read(path)?;
    Ok(hash_bytes(&data))
}
