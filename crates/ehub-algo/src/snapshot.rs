//! Hub snapshots
//!
//! A snapshot is the whole [`EnergyHub`] (input data, sets, assembled model,
//! submodels and, if present, the solution) wrapped in a versioned envelope.

use crate::hub::EnergyHub;
use ehub_core::{HubError, HubResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Bumped whenever the serialised layout of [`EnergyHub`] changes.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    format_version: u32,
    hub: &'a EnergyHub,
}

#[derive(Deserialize)]
struct Snapshot {
    format_version: u32,
    hub: EnergyHub,
}

impl EnergyHub {
    pub fn to_snapshot_bytes(&self) -> HubResult<Vec<u8>> {
        Ok(serde_json::to_vec(&SnapshotRef {
            format_version: SNAPSHOT_FORMAT_VERSION,
            hub: self,
        })?)
    }

    pub fn from_snapshot_bytes(bytes: &[u8]) -> HubResult<Self> {
        let snapshot: Snapshot = serde_json::from_slice(bytes)?;
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(HubError::Parse(format!(
                "snapshot format version {} is not supported (expected {})",
                snapshot.format_version, SNAPSHOT_FORMAT_VERSION
            )));
        }
        Ok(snapshot.hub)
    }

    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> HubResult<()> {
        let path = path.as_ref();
        let bytes = self.to_snapshot_bytes()?;
        std::fs::write(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "snapshot saved");
        Ok(())
    }

    pub fn load_snapshot(path: impl AsRef<Path>) -> HubResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let hub = Self::from_snapshot_bytes(&bytes)
            .map_err(|e| HubError::Parse(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "snapshot loaded");
        Ok(hub)
    }
}
