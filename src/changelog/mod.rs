//! Diffing two snapshots into a changelog.
//!
//! Entries are matched by ID. An ID only in the new snapshot is an addition,
//! one only in the old snapshot a removal. IDs present in both are unchanged
//! when the whole entry is equal and updated otherwise.

use std::collections::HashSet;
use std::fmt::Write;
use std::path::Path;

use tracing::info;

use crate::snapshot::{Snapshot, SnapshotEntry, SnapshotError};

/// Controls how a changelog is rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangelogFormat {
    /// Use emoji markers instead of `+`, `-` and `~`.
    pub use_emojis: bool,
    /// Placed before and after each mod name.
    pub name_delimiter: String,
    /// Placed before and after each mod ID.
    pub id_delimiter: String,
    /// Placed before and after each version.
    pub version_delimiter: String,
}

impl ChangelogFormat {
    /// The starting values offered when the user customizes the format:
    /// IDs as inline code, versions in bold (Markdown).
    pub fn customized_defaults() -> Self {
        Self {
            use_emojis: false,
            name_delimiter: String::new(),
            id_delimiter: "`".to_string(),
            version_delimiter: "**".to_string(),
        }
    }

    fn added_marker(&self) -> &'static str {
        if self.use_emojis { "➕" } else { "+" }
    }

    fn removed_marker(&self) -> &'static str {
        if self.use_emojis { "❌" } else { "-" }
    }

    fn updated_marker(&self) -> &'static str {
        if self.use_emojis { "📈" } else { "~" }
    }

    fn name(&self, name: &str) -> String {
        surround(name, &self.name_delimiter)
    }

    fn id(&self, id: &str) -> String {
        surround(id, &self.id_delimiter)
    }

    fn version(&self, version: &str) -> String {
        surround(version, &self.version_delimiter)
    }
}

fn surround(text: &str, delimiter: &str) -> String {
    format!("{delimiter}{text}{delimiter}")
}

/// An ID present in both snapshots whose entry changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub old: SnapshotEntry,
    pub new: SnapshotEntry,
}

/// The difference between two snapshots.
///
/// Every partition keeps the order of the snapshot it was taken from: the old
/// snapshot for `removed`, `updated` and `unchanged`, the new one for `added`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changelog {
    pub added: Vec<SnapshotEntry>,
    pub removed: Vec<SnapshotEntry>,
    pub updated: Vec<Update>,
    pub unchanged: Vec<SnapshotEntry>,
}

impl Changelog {
    /// Compares `old` against `new`.
    pub fn diff(old: &Snapshot, new: &Snapshot) -> Self {
        let mut changelog = Changelog::default();
        let mut kept: HashSet<&str> = HashSet::new();

        for old_entry in &old.entries {
            match new.get(old_entry.id()) {
                Some(new_entry) => {
                    kept.insert(old_entry.id());
                    if new_entry == old_entry {
                        changelog.unchanged.push(old_entry.clone());
                    } else {
                        changelog.updated.push(Update {
                            old: old_entry.clone(),
                            new: new_entry.clone(),
                        });
                    }
                }
                None => changelog.removed.push(old_entry.clone()),
            }
        }

        changelog.added = new
            .entries
            .iter()
            .filter(|entry| !kept.contains(entry.id()))
            .cloned()
            .collect();

        changelog
    }

    /// True when nothing was added, removed or updated.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }

    /// Renders one line per change: additions first, then removals, then
    /// updates. Each line ends with a newline.
    pub fn render(&self, format: &ChangelogFormat) -> String {
        let mut out = String::new();

        for entry in &self.added {
            let marker = format.added_marker();
            let id = format.id(entry.id());
            let _ = match entry.record() {
                Some(record) => writeln!(
                    out,
                    "- {marker} {} ({id}) {}",
                    format.name(&record.human_name),
                    format.version(&record.version)
                ),
                None => writeln!(out, "- {marker} {id}"),
            };
        }

        for entry in &self.removed {
            let marker = format.removed_marker();
            let id = format.id(entry.id());
            let _ = match entry.record() {
                Some(record) => writeln!(out, "- {marker} {} ({id})", format.name(&record.human_name)),
                None => writeln!(out, "- {marker} {id}"),
            };
        }

        for update in &self.updated {
            let marker = format.updated_marker();
            let id = format.id(update.old.id());
            let _ = match (update.old.record(), update.new.record()) {
                (Some(old), Some(new)) => writeln!(
                    out,
                    "- {marker} {} ({id}) {} -> {}",
                    format.name(&old.human_name),
                    format.version(&old.version),
                    format.version(&new.version)
                ),
                _ => writeln!(out, "- {marker} {id}"),
            };
        }

        out
    }
}

/// Loads two snapshot files and renders their changelog.
///
/// # Arguments
///
/// * `old_path` - The earlier snapshot.
/// * `new_path` - The later snapshot.
/// * `format` - How entries are decorated.
///
/// # Returns
///
/// The rendered changelog, empty when nothing changed.
///
/// # Errors
///
/// Returns an error if either snapshot cannot be read or parsed.
pub fn generate_changelog<P: AsRef<Path>, Q: AsRef<Path>>(
    old_path: P,
    new_path: Q,
    format: &ChangelogFormat,
) -> Result<String, SnapshotError> {
    let old = Snapshot::load(old_path)?;
    let new = Snapshot::load(new_path)?;
    let changelog = Changelog::diff(&old, &new);
    info!(
        added = changelog.added.len(),
        removed = changelog.removed.len(),
        updated = changelog.updated.len(),
        unchanged = changelog.unchanged.len(),
        "compared snapshots"
    );
    Ok(changelog.render(format))
}
