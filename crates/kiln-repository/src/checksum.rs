//! Checksum sidecars (SHA-256, SHA-1, MD5) for stored files.

use std::fs;
use std::path::{Path, PathBuf};

use kiln_util::errors::KilnError;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Sidecar extensions in verification preference order.
pub const SIDECARS: [&str; 3] = ["sha256", "sha1", "md5"];

/// Whether `file_name` is a checksum sidecar rather than a payload.
pub fn is_sidecar(file_name: &str) -> bool {
    SIDECARS
        .iter()
        .any(|ext| file_name.ends_with(&format!(".{ext}")))
}

/// Write every sidecar next to `path` from its current contents.
pub fn write_sidecars(path: &Path, data: &[u8]) -> miette::Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(SIDECARS.len());
    for ext in SIDECARS {
        let sidecar = sidecar_path(path, ext);
        fs::write(&sidecar, digest(ext, data)).map_err(KilnError::Io)?;
        written.push(sidecar);
    }
    Ok(written)
}

/// Verify a stored file against its sidecars.
///
/// Tries SHA-256 first, falls back to SHA-1, then MD5. A file without any
/// sidecar is accepted with a warning.
pub fn verify(path: &Path) -> miette::Result<()> {
    let data = fs::read(path).map_err(KilnError::Io)?;
    for ext in SIDECARS {
        let Ok(expected) = fs::read_to_string(sidecar_path(path, ext)) else {
            continue;
        };
        let expected = extract_hash(&expected);
        return check(&digest(ext, &data), &expected, ext, path);
    }
    tracing::warn!("No checksum sidecar found for {}", path.display());
    Ok(())
}

fn check(actual: &str, expected: &str, algo: &str, path: &Path) -> miette::Result<()> {
    if actual.eq_ignore_ascii_case(expected) {
        tracing::debug!("{algo} ok for {}", path.display());
        Ok(())
    } else {
        Err(KilnError::Repository {
            message: format!(
                "{algo} mismatch for {}: expected {expected}, got {actual}",
                path.display()
            ),
        }
        .into())
    }
}

fn sidecar_path(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Checksum files may contain just the hash, or `hash  filename`.
fn extract_hash(content: &str) -> String {
    content.split_whitespace().next().unwrap_or("").to_string()
}

fn digest(ext: &str, data: &[u8]) -> String {
    match ext {
        "sha1" => hex_sha1(data),
        "md5" => hex_md5(data),
        _ => hex_sha256(data),
    }
}

fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn hex_sha1(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn hex_md5(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
