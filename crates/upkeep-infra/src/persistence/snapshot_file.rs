//! JSON snapshot of the whole fleet on disk

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use upkeep_store::{FleetSnapshot, SNAPSHOT_VERSION};
use upkeep_types::{Error, Result};

const SNAPSHOT_FILE: &str = "fleet.json";

/// File-backed fleet snapshot
///
/// Stores every vehicle, service record, alert and log entry in one JSON
/// file. Writes go to a temporary file first and are renamed into place.
pub struct SnapshotFile {
    store_path: PathBuf,
}

impl SnapshotFile {
    /// Open (creating the directory if needed) the snapshot in `store_dir`
    pub fn open(store_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&store_dir)?;
        Ok(Self {
            store_path: store_dir.join(SNAPSHOT_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.store_path
    }

    /// Load the snapshot, or an empty one if nothing was saved yet
    pub fn load(&self) -> Result<FleetSnapshot> {
        if !self.store_path.exists() {
            tracing::debug!(path = %self.store_path.display(), "no snapshot yet, starting empty");
            return Ok(FleetSnapshot {
                version: SNAPSHOT_VERSION,
                ..Default::default()
            });
        }

        let file = File::open(&self.store_path)?;
        let reader = BufReader::new(file);
        let snapshot: FleetSnapshot = serde_json::from_reader(reader)?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(Error::Store(format!(
                "snapshot {} has version {}, newer than supported version {}",
                self.store_path.display(),
                snapshot.version,
                SNAPSHOT_VERSION
            )));
        }
        Ok(snapshot)
    }

    /// Save store to disk
    pub fn save(&self, snapshot: &FleetSnapshot) -> Result<()> {
        let tmp_path = self.store_path.with_extension("json.tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, snapshot)?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.store_path)?;
        tracing::debug!(path = %self.store_path.display(), "snapshot saved");
        Ok(())
    }
}
