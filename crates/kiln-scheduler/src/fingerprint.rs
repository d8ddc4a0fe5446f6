//! Content fingerprints for up-to-date checks.
//!
//! A module's fingerprint hashes everything that determines its published
//! output: its coordinate, input digest, build command and declared outputs,
//! plus the coordinates and fingerprints of its direct dependencies. A change
//! anywhere upstream therefore changes every downstream fingerprint.
//!
//! Fingerprints of successful builds are kept in `.kiln/fingerprints.json`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use kiln_core::coordinate::Coordinate;
use kiln_core::module::Module;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint {
    pub hash: String,
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hash)
    }
}

/// Compute a module's fingerprint. `dependencies` pairs each direct
/// dependency with its fingerprint; external ones have none.
pub fn compute(module: &Module, dependencies: &[(&Coordinate, Option<&Fingerprint>)]) -> Fingerprint {
    let mut hasher = Sha256::new();

    hasher.update(b"module:");
    hasher.update(module.coordinate.to_string().as_bytes());
    hasher.update(b"\n");

    if let Some(digest) = &module.inputs_digest {
        hasher.update(b"inputs:");
        hasher.update(digest.as_bytes());
        hasher.update(b"\n");
    }

    if let Some(build) = &module.build {
        hasher.update(b"build:");
        hasher.update(build.as_bytes());
        hasher.update(b"\n");
    }

    for output in &module.outputs {
        hasher.update(b"output:");
        hasher.update(output.path.to_string_lossy().as_bytes());
        hasher.update(b":");
        hasher.update(output.classifier.as_deref().unwrap_or("").as_bytes());
        hasher.update(b":");
        hasher.update(output.extension.as_bytes());
        hasher.update(b"\n");
    }

    for (coordinate, fingerprint) in dependencies {
        hasher.update(b"dep:");
        hasher.update(coordinate.to_string().as_bytes());
        hasher.update(b":");
        hasher.update(fingerprint.map_or("external", |f| f.hash.as_str()).as_bytes());
        hasher.update(b"\n");
    }

    let result = hasher.finalize();
    Fingerprint {
        hash: format!("{result:x}"),
    }
}

/// Load recorded fingerprints. A missing or unreadable file means nothing is
/// up to date.
pub fn load(path: &Path) -> BTreeMap<Coordinate, Fingerprint> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return BTreeMap::new();
    };
    let stored: BTreeMap<String, Fingerprint> = match serde_json::from_str(&content) {
        Ok(stored) => stored,
        Err(e) => {
            tracing::warn!("Ignoring corrupt fingerprint file {}: {e}", path.display());
            return BTreeMap::new();
        }
    };
    stored
        .into_iter()
        .filter_map(|(key, fp)| Coordinate::parse(&key).map(|c| (c, fp)))
        .collect()
}

/// Persist fingerprints, keyed by `group:name:version`.
pub fn save(path: &Path, fingerprints: &BTreeMap<Coordinate, Fingerprint>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let stored: BTreeMap<String, &Fingerprint> = fingerprints
        .iter()
        .map(|(c, fp)| (c.to_string(), fp))
        .collect();
    let json = serde_json::to_string_pretty(&stored).map_err(std::io::Error::other)?;
    std::fs::write(path, json)
}
