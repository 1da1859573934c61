//! Secrets-file parsing and artifact writing helpers.

use crate::field::FieldElement;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Parses one decimal secret per line.
///
/// Blank lines and lines starting with `#` are skipped. Duplicate secrets are
/// kept (they produce identical leaves) but logged.
///
/// # Errors
/// Returns an error naming the offending line if a secret is not a canonical
/// decimal field element.
///
/// # Examples
///
/// ```
/// use zkp_merkle_membership::utils::parse_secrets;
///
/// let secrets = parse_secrets("# members\n11\n22\n\n33\n").unwrap();
/// assert_eq!(secrets.len(), 3);
/// ```
pub fn parse_secrets(content: &str) -> Result<Vec<FieldElement>> {
    let mut seen = HashSet::new();
    let mut secrets = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let secret = FieldElement::from_decimal_str(line)
            .with_context(|| format!("Invalid secret at line {}: '{}'", i + 1, line))?;
        if !seen.insert(secret.to_repr()) {
            warn!("Duplicate secret at line {}", i + 1);
        }
        secrets.push(secret);
    }

    Ok(secrets)
}

/// Reads and parses a secrets file, refusing files above `max_file_size` bytes.
pub fn read_secrets_file(path: &Path, max_file_size: u64) -> Result<Vec<FieldElement>> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("Failed to read secrets file metadata: {}", path.display()))?;

    if metadata.len() > max_file_size {
        return Err(anyhow::anyhow!(
            "Secrets file too large: {} bytes (max {} bytes)",
            metadata.len(),
            max_file_size
        ));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read secrets file: {}", path.display()))?;
    let secrets = parse_secrets(&content)
        .with_context(|| format!("Failed to parse secrets file: {}", path.display()))?;

    if secrets.is_empty() {
        return Err(anyhow::anyhow!(
            "No secrets found in '{}'",
            path.display()
        ));
    }

    debug!("Loaded {} secrets from {}", secrets.len(), path.display());
    Ok(secrets)
}

/// Writes `contents` to `path`, creating parent directories as needed.
pub fn write_artifact(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}
