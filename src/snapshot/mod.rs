use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::filesystem::{self, FilesystemError, WriteOptions};
use crate::metadata::{self, MetadataError};

/// Identity and version of a single mod, as read from its jar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModRecord {
    /// Stable identifier, e.g. `mcwlights`.
    pub id: String,
    /// Display name, e.g. `Macaw's Lights and Lamps`.
    pub human_name: String,
    pub version: String,
}

/// One element of a snapshot.
///
/// Jars whose metadata could not be read are stored by file name only; the
/// file name then doubles as the entry's ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotEntry {
    Record(ModRecord),
    FileName(String),
}

impl SnapshotEntry {
    /// The ID two snapshots are matched on.
    pub fn id(&self) -> &str {
        match self {
            SnapshotEntry::Record(record) => &record.id,
            SnapshotEntry::FileName(name) => name,
        }
    }

    pub fn record(&self) -> Option<&ModRecord> {
        match self {
            SnapshotEntry::Record(record) => Some(record),
            SnapshotEntry::FileName(_) => None,
        }
    }
}

impl From<ModRecord> for SnapshotEntry {
    fn from(record: ModRecord) -> Self {
        SnapshotEntry::Record(record)
    }
}

/// The mods of a pack at one point in time, in folder order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    pub entries: Vec<SnapshotEntry>,
}

/// Errors raised while building, saving or loading snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
    #[error("Failed to parse snapshot {path}: {source}")]
    JsonParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize snapshot: {0}")]
    JsonWriteError(#[source] serde_json::Error),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

impl Snapshot {
    pub fn new(entries: Vec<SnapshotEntry>) -> Self {
        Self { entries }
    }

    /// Reads a snapshot JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON array of
    /// records and strings.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let content = filesystem::read_file(path)?;
        serde_json::from_str(&content).map_err(|source| SnapshotError::JsonParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes the snapshot as JSON, replacing any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SnapshotError> {
        let json = serde_json::to_string(self).map_err(SnapshotError::JsonWriteError)?;
        filesystem::write_file(path, &json, WriteOptions::default())?;
        Ok(())
    }

    /// Looks up the entry with the given ID.
    pub fn get(&self, id: &str) -> Option<&SnapshotEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(SnapshotEntry::id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Returns true if the file name has a lowercase `.jar` extension.
pub fn is_jar(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "jar")
}

/// Builds a snapshot of every jar in `mods_dir` and writes it to `out_file`.
///
/// Files are visited in name order. Anything that is not a jar is skipped
/// with a warning.
///
/// # Errors
///
/// Returns an error if the folder cannot be listed, a jar cannot be opened, or
/// the output file cannot be written.
pub fn generate_snapshot<P: AsRef<Path>, Q: AsRef<Path>>(
    mods_dir: P,
    out_file: Q,
) -> Result<Snapshot, SnapshotError> {
    let mut snapshot = Snapshot::default();
    for path in filesystem::list_files(mods_dir.as_ref())? {
        if !is_jar(&path) {
            warn!("File \"{}\" isn't a JAR file!", filesystem::file_name_of(&path));
            continue;
        }
        snapshot.entries.push(metadata::extract_metadata(&path)?);
    }

    snapshot.save(out_file.as_ref())?;
    info!(
        mods = snapshot.len(),
        path = %out_file.as_ref().display(),
        "wrote snapshot"
    );
    Ok(snapshot)
}

/// Turns the user's choice of output name into a snapshot file name.
///
/// An empty (or blank) input yields `snapshot-<timestamp>.json`; any other
/// input gets a `.json` extension unless it already has one.
pub fn snapshot_file_name(input: &str, now: DateTime<Local>) -> String {
    let input = input.trim();
    if input.is_empty() {
        format!("snapshot-{}.json", now.format("%Y-%m-%d-%H-%M-%S"))
    } else if input.ends_with(".json") {
        input.to_string()
    } else {
        format!("{input}.json")
    }
}
