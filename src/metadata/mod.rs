//! Reads mod identity and version out of jar archives.
//!
//! Lookup order inside a jar:
//! 1. the first entry whose name ends with `mods.toml` (Forge and NeoForge),
//! 2. `fabric.mod.json` (Fabric and Quilt).
//!
//! Jars without a readable descriptor are recorded by file name.

use std::fs::File;
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::filesystem::file_name_of;
use crate::manifest_parser;
use crate::mods_toml::{self, JAR_VERSION_PLACEHOLDER};
use crate::snapshot::{ModRecord, SnapshotEntry};

const FABRIC_MOD_JSON: &str = "fabric.mod.json";
const MANIFEST_SUFFIX: &str = "MANIFEST.MF";
const MODS_TOML_SUFFIX: &str = "mods.toml";

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Extracts the snapshot entry for a single jar.
///
/// Archives that are not valid zips, and jars without a usable descriptor,
/// degrade to [`SnapshotEntry::FileName`]. A version equal to
/// `${file.jarVersion}` is replaced by the manifest's `Implementation-Version`,
/// or by an empty string when the manifest does not provide one.
///
/// # Errors
///
/// Returns an error only if the file itself cannot be opened.
pub fn extract_metadata(jar: &Path) -> Result<SnapshotEntry, MetadataError> {
    let file_name = file_name_of(jar);
    let file = File::open(jar).map_err(|source| MetadataError::Open {
        path: jar.to_path_buf(),
        source,
    })?;

    let mut archive = match ZipArchive::new(file) {
        Ok(archive) => archive,
        Err(e) => {
            warn!(jar = %file_name, "not a readable archive, recording file name: {e}");
            return Ok(SnapshotEntry::FileName(file_name));
        }
    };

    let Some(mut record) = read_descriptor(&mut archive, &file_name) else {
        warn!(jar = %file_name, "no mod metadata found, recording file name");
        return Ok(SnapshotEntry::FileName(file_name));
    };

    if record.version == JAR_VERSION_PLACEHOLDER {
        record.version = manifest_version(&mut archive).unwrap_or_default();
        debug!(id = %record.id, version = %record.version, "resolved version from manifest");
    }

    debug!(jar = %file_name, id = %record.id, "extracted metadata");
    Ok(record.into())
}

fn read_descriptor<R: Read + Seek>(archive: &mut ZipArchive<R>, file_name: &str) -> Option<ModRecord> {
    if let Some(name) = find_entry(archive, |n| n.ends_with(MODS_TOML_SUFFIX)) {
        match read_entry(archive, &name).map(|content| mods_toml::parse_mods_toml(&content)) {
            Ok(Ok(record)) => return Some(record),
            Ok(Err(e)) => warn!(jar = %file_name, entry = %name, "malformed descriptor: {e}"),
            Err(e) => warn!(jar = %file_name, entry = %name, "unreadable descriptor: {e}"),
        }
    }

    if let Some(name) = find_entry(archive, |n| n == FABRIC_MOD_JSON) {
        match read_entry(archive, &name).map(|content| mods_toml::parse_fabric_mod_json(&content)) {
            Ok(Ok(record)) => return Some(record),
            Ok(Err(e)) => warn!(jar = %file_name, entry = %name, "malformed descriptor: {e}"),
            Err(e) => warn!(jar = %file_name, entry = %name, "unreadable descriptor: {e}"),
        }
    }

    None
}

fn manifest_version<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Option<String> {
    let name = find_entry(archive, |n| n.ends_with(MANIFEST_SUFFIX))?;
    let content = read_entry(archive, &name).ok()?;
    manifest_parser::implementation_version(&content)
}

fn find_entry<R, F>(archive: &ZipArchive<R>, predicate: F) -> Option<String>
where
    R: Read + Seek,
    F: Fn(&str) -> bool,
{
    archive
        .file_names()
        .find(|name| predicate(*name))
        .map(str::to_string)
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String, ZipError> {
    let mut entry = archive.by_name(name)?;
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    /// Writes a jar at `path` containing the given `(entry name, contents)` pairs.
    pub(crate) fn write_jar(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        for (name, contents) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    const CREATE_TOML: &str = r#"
modLoader = "javafml"
loaderVersion = "[47,)"
[[mods]]
modId = "create"
version = "${file.jarVersion}"
displayName = "Create"
"#;

    #[test]
    fn extracts_mods_toml_record() {
        let dir = tempdir().unwrap();
        let jar = dir.path().join("mcw-lights-1.0.6.jar");
        write_jar(
            &jar,
            &[(
                "META-INF/mods.toml",
                "[[mods]]\nmodId = \"mcwlights\"\nversion = \"1.0.6\"\ndisplayName = \"Macaw's Lights and Lamps\"\n",
            )],
        );

        let entry = extract_metadata(&jar).unwrap();
        assert_eq!(
            entry,
            SnapshotEntry::Record(ModRecord {
                id: "mcwlights".into(),
                human_name: "Macaw's Lights and Lamps".into(),
                version: "1.0.6".into(),
            })
        );
    }

    #[test]
    fn resolves_placeholder_version_from_manifest() {
        let dir = tempdir().unwrap();
        let jar = dir.path().join("create-1.20.1-0.5.1.f.jar");
        write_jar(
            &jar,
            &[
                ("META-INF/MANIFEST.MF", "Manifest-Version: 1.0\r\nImplementation-Version: 0.5.1.F\r\n"),
                ("META-INF/mods.toml", CREATE_TOML),
            ],
        );

        let entry = extract_metadata(&jar).unwrap();
        assert_eq!(entry.record().unwrap().version, "0.5.1.f");
    }

    #[test]
    fn placeholder_without_manifest_becomes_empty() {
        let dir = tempdir().unwrap();
        let jar = dir.path().join("create.jar");
        write_jar(&jar, &[("META-INF/mods.toml", CREATE_TOML)]);

        let entry = extract_metadata(&jar).unwrap();
        assert_eq!(entry.record().unwrap().version, "");
    }

    #[test]
    fn matches_neoforge_descriptor_name() {
        let dir = tempdir().unwrap();
        let jar = dir.path().join("ae2.jar");
        write_jar(
            &jar,
            &[(
                "META-INF/neoforge.mods.toml",
                "[[mods]]\nmodId = \"ae2\"\nversion = \"19.0.0\"\ndisplayName = \"Applied Energistics 2\"\n",
            )],
        );
        assert_eq!(extract_metadata(&jar).unwrap().id(), "ae2");
    }

    #[test]
    fn reads_fabric_mod_json() {
        let dir = tempdir().unwrap();
        let jar = dir.path().join("sodium.jar");
        write_jar(
            &jar,
            &[("fabric.mod.json", r#"{"id": "sodium", "name": "Sodium", "version": "0.5.8"}"#)],
        );
        let entry = extract_metadata(&jar).unwrap();
        assert_eq!(entry.record().unwrap().human_name, "Sodium");
    }

    #[test]
    fn malformed_mods_toml_degrades_to_file_name() {
        let dir = tempdir().unwrap();
        let jar = dir.path().join("weird.jar");
        write_jar(&jar, &[("META-INF/mods.toml", "modLoader = \"javafml\"\n")]);
        assert_eq!(
            extract_metadata(&jar).unwrap(),
            SnapshotEntry::FileName("weird.jar".into())
        );
    }

    #[test]
    fn jar_without_descriptor_degrades_to_file_name() {
        let dir = tempdir().unwrap();
        let jar = dir.path().join("library.jar");
        write_jar(&jar, &[("META-INF/MANIFEST.MF", "Manifest-Version: 1.0\n")]);
        assert_eq!(
            extract_metadata(&jar).unwrap(),
            SnapshotEntry::FileName("library.jar".into())
        );
    }

    #[test]
    fn non_zip_degrades_to_file_name() {
        let dir = tempdir().unwrap();
        let jar = dir.path().join("corrupt.jar");
        std::fs::write(&jar, b"definitely not a zip").unwrap();
        assert_eq!(
            extract_metadata(&jar).unwrap(),
            SnapshotEntry::FileName("corrupt.jar".into())
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = extract_metadata(&dir.path().join("gone.jar"));
        assert!(matches!(result, Err(MetadataError::Open { .. })));
    }
}
