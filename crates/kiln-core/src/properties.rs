//! `.kiln.env` loading and `${env:VAR}` interpolation for `Kiln.toml`.

use std::collections::BTreeMap;
use std::path::Path;

use kiln_util::errors::KilnError;

const OPEN: &str = "${env:";

/// Read `KEY=value` lines from `path`; blank lines and `#` comments are
/// ignored. A missing file yields an empty map.
pub fn load_env_file(path: &Path) -> miette::Result<BTreeMap<String, String>> {
    if !path.is_file() {
        return Ok(BTreeMap::new());
    }
    let content = std::fs::read_to_string(path).map_err(KilnError::Io)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect())
}

/// Replace every `${env:VAR}` in `input`.
///
/// `overrides` (from `.kiln.env`) win over the process environment; unknown
/// variables become empty. Substituted values are not scanned again, and an
/// unterminated reference is kept verbatim.
pub fn interpolate(input: &str, overrides: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find(OPEN) {
        let after = &rest[start + OPEN.len()..];
        let Some(len) = after.find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let key = &after[..len];
        match overrides.get(key) {
            Some(value) => out.push_str(value),
            None => out.push_str(&std::env::var(key).unwrap_or_default()),
        }
        rest = &after[len + 1..];
    }
    out.push_str(rest);
    out
}
