use crate::error::{IoContext, Result};
use md5::{Digest, Md5};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const CHUNK_BYTES: usize = 64 * 1024;

/// Streams `path` through MD5 and returns the 32-char lowercase hex digest.
pub fn digest_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).io_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; CHUNK_BYTES];
    loop {
        let read = file
            .read(&mut buf)
            .io_context(|| format!("failed to read {}", path.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
pub(crate) fn digest_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Md5::digest(bytes))
}
