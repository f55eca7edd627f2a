// libs/shared/database/src/snapshot.rs
//
// JSON snapshot persistence for the scheduling store. Writes go to a
// sibling temp file first and are moved into place with a rename, so a
// crash mid-write never leaves a truncated snapshot behind.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::store::StoreState;

pub(crate) fn load(path: &Path) -> Result<Option<StoreState>> {
    if !path.exists() {
        debug!("No scheduling snapshot at {}", path.display());
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let state: StoreState = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;

    Ok(Some(state))
}

pub(crate) fn save(path: &Path, state: &StoreState) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create snapshot dir {}", parent.display()))?;
        }
    }

    let raw = serde_json::to_string_pretty(state).context("Failed to serialize snapshot")?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, raw)
        .with_context(|| format!("Failed to write snapshot {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move snapshot into place at {}", path.display()))?;

    Ok(())
}
