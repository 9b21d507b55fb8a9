//! # Snapshot Persistence
//!
//! Reads and writes the persisted state snapshot. Saves are atomic: the JSON
//! is written to a temp file, parsed back as a sanity check, then renamed
//! over the target, so a crash mid-write never corrupts the slot.
//!
//! Persistence is fire-and-forget for the host: wire [`save_snapshot`] to a
//! store subscription and log failures without surfacing or retrying them;
//! an absent or corrupt snapshot loads as `None` and the session starts
//! fresh.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::errors::{QuoteError, QuoteResult};
use crate::state::{AppState, Snapshot};

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Save the state snapshot atomically.
pub fn save_snapshot(state: &AppState, path: &Path) -> QuoteResult<()> {
    let json = serde_json::to_string_pretty(state).map_err(|err| QuoteError::Serialization {
        reason: err.to_string(),
    })?;

    let temp_path = temp_path_for(path);
    fs::write(&temp_path, &json).map_err(|err| {
        QuoteError::file_error("write", temp_path.display().to_string(), err.to_string())
    })?;

    // Verify the temp file parses before it replaces the real snapshot.
    let written = fs::read_to_string(&temp_path).map_err(|err| {
        QuoteError::file_error("verify", temp_path.display().to_string(), err.to_string())
    })?;
    serde_json::from_str::<Snapshot>(&written).map_err(|err| QuoteError::Serialization {
        reason: err.to_string(),
    })?;

    fs::rename(&temp_path, path).map_err(|err| {
        QuoteError::file_error("rename", path.display().to_string(), err.to_string())
    })?;
    Ok(())
}

/// Load a snapshot, if a readable one exists.
///
/// A missing file is a normal first run; anything unreadable or unparseable
/// logs a warning and also yields `None` — the caller falls back to fresh
/// initial state either way.
pub fn load_snapshot(path: &Path) -> Option<Snapshot> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return None,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read snapshot");
            return None;
        }
    };

    match serde_json::from_str::<Snapshot>(&text) {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "snapshot is corrupt; starting fresh");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Command, QuoteStore};

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("quote_core-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = scratch_path("roundtrip.json");
        let mut store = QuoteStore::new();
        store.dispatch(Command::AddTab);
        store.dispatch(Command::UpdateField {
            tab_id: store.state().active_tab_id.clone(),
            field_id: "printHours".to_string(),
            value: "2".into(),
        });

        save_snapshot(store.state(), &path).unwrap();
        let snapshot = load_snapshot(&path).expect("snapshot should load");
        assert_eq!(snapshot.tabs.len(), 2);

        let rehydrated = QuoteStore::hydrate(snapshot);
        assert_eq!(rehydrated.state().tabs.len(), 2);
        assert_eq!(
            rehydrated.state().active_tab_id,
            store.state().active_tab_id
        );

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_snapshot_loads_as_none() {
        assert!(load_snapshot(&scratch_path("does-not-exist.json")).is_none());
    }

    #[test]
    fn test_corrupt_snapshot_loads_as_none() {
        let path = scratch_path("corrupt.json");
        fs::write(&path, "{ definitely not json").unwrap();
        assert!(load_snapshot(&path).is_none());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_save_leaves_no_temp_file_behind() {
        let path = scratch_path("clean.json");
        let store = QuoteStore::new();
        save_snapshot(store.state(), &path).unwrap();
        assert!(path.exists());
        assert!(!temp_path_for(&path).exists());
        let _ = fs::remove_file(&path);
    }
}
