//! Snapshots of packwiz packs.
//!
//! A packwiz `mods` folder holds one `<slug>.pw.toml` proxy manifest per mod
//! instead of the jars. Each manifest is resolved to a download URL, the jar
//! is fetched into a scratch directory, its metadata is extracted like for a
//! regular mods folder, and the jar is deleted again.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::curseforge::{CurseForgeClient, CurseForgeError};
use crate::filesystem::{self, FilesystemError};
use crate::http::{self, DownloadError};
use crate::metadata::{self, MetadataError};
use crate::snapshot::{Snapshot, SnapshotEntry, SnapshotError};

const PACKWIZ_SUFFIX: &str = ".pw.toml";

/// A parsed `.pw.toml` mod manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct PackwizMod {
    pub name: String,
    /// Name of the jar the manifest stands for.
    pub filename: String,
    pub side: Option<String>,
    pub download: PackwizDownload,
    #[serde(default)]
    pub update: Option<PackwizUpdate>,
}

/// The `[download]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackwizDownload {
    /// Direct URL; absent for CurseForge mods.
    pub url: Option<String>,
    pub hash_format: String,
    pub hash: String,
    /// `metadata:curseforge` when the URL must be looked up.
    pub mode: Option<String>,
}

impl PackwizDownload {
    /// The hash to check the download against, when its format is one the
    /// downloader can verify.
    pub fn verifiable_hash(&self) -> Option<&str> {
        match self.hash_format.as_str() {
            "sha1" | "sha256" | "sha512" => Some(self.hash.as_str()),
            _ => None,
        }
    }
}

/// The `[update]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct PackwizUpdate {
    pub curseforge: Option<CurseForgeUpdate>,
    pub modrinth: Option<ModrinthUpdate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CurseForgeUpdate {
    pub project_id: u64,
    pub file_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ModrinthUpdate {
    pub mod_id: String,
    pub version: String,
}

#[derive(Debug, Error)]
pub enum PackwizError {
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
    #[error("Failed to parse {path}: {source}")]
    TomlParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{name} is hosted on CurseForge but no API key is configured")]
    MissingApiKey { name: String },
    #[error(transparent)]
    CurseForge(#[from] CurseForgeError),
    #[error(transparent)]
    Download(#[from] DownloadError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl PackwizMod {
    /// Parses the text of a `.pw.toml` file.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reads and parses a `.pw.toml` file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PackwizError> {
        let path = path.as_ref();
        let content = filesystem::read_file(path)?;
        Self::parse(&content).map_err(|source| PackwizError::TomlParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn curseforge(&self) -> Option<&CurseForgeUpdate> {
        self.update.as_ref().and_then(|u| u.curseforge.as_ref())
    }
}

/// Returns true for packwiz proxy manifests (`*.pw.toml`).
pub fn is_packwiz_manifest(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().ends_with(PACKWIZ_SUFFIX))
}

/// Turns packwiz manifests into snapshot entries by downloading the jars they
/// point at.
pub struct PackwizResolver {
    client: reqwest::Client,
    curseforge: Option<CurseForgeClient>,
    scratch_dir: PathBuf,
}

impl PackwizResolver {
    /// `curseforge` may be `None` for packs that only reference direct URLs;
    /// resolving a CurseForge-only manifest then fails with
    /// [`PackwizError::MissingApiKey`].
    pub fn new(client: reqwest::Client, curseforge: Option<CurseForgeClient>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            curseforge,
            scratch_dir: scratch_dir.into(),
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Finds where the jar of `manifest` can be downloaded from.
    ///
    /// A direct `download.url` wins; otherwise the CurseForge ids from the
    /// `[update.curseforge]` table are looked up. `Ok(None)` means the jar
    /// cannot be fetched.
    pub async fn download_url(&self, manifest: &PackwizMod) -> Result<Option<String>, PackwizError> {
        if let Some(url) = &manifest.download.url {
            return Ok(Some(url.clone()));
        }
        let Some(ids) = manifest.curseforge() else {
            return Ok(None);
        };
        let client = self.curseforge.as_ref().ok_or_else(|| PackwizError::MissingApiKey {
            name: manifest.name.clone(),
        })?;
        Ok(client.download_url(ids.project_id, ids.file_id).await?)
    }

    /// Downloads the jar behind `manifest` into `scratch`, extracts its
    /// metadata and deletes the jar.
    ///
    /// Manifests without a reachable URL degrade to the manifest's `filename`.
    pub async fn resolve(&self, manifest: &PackwizMod, scratch: &Path) -> Result<SnapshotEntry, PackwizError> {
        let Some(url) = self.download_url(manifest).await? else {
            warn!(name = %manifest.name, "no download url, recording file name");
            return Ok(SnapshotEntry::FileName(manifest.filename.clone()));
        };

        let hash = manifest.download.verifiable_hash();
        if hash.is_none() {
            debug!(name = %manifest.name, format = %manifest.download.hash_format, "hash format not verified");
        }

        let jar = http::download_to_file(&self.client, &url, scratch, hash, true).await?;
        let entry = metadata::extract_metadata(&jar)?;
        filesystem::remove_file_if_exists(&jar)?;
        Ok(entry)
    }
}

/// Builds a snapshot from the `.pw.toml` manifests in `mods_dir` and writes it
/// to `out_file`.
///
/// Manifests are visited in name order; any other file is skipped with a
/// warning. Jars are downloaded into a fresh directory below the resolver's
/// scratch directory, which is removed afterwards, also when resolving fails.
/// The scratch directory itself and anything already in it are left alone.
///
/// # Errors
///
/// Returns the first filesystem, parse, API or download error encountered.
pub async fn generate_packwiz_snapshot<P: AsRef<Path>, Q: AsRef<Path>>(
    mods_dir: P,
    out_file: Q,
    resolver: &PackwizResolver,
) -> Result<Snapshot, PackwizError> {
    let files = filesystem::list_files(mods_dir.as_ref())?;
    let scratch = filesystem::create_scratch_dir(resolver.scratch_dir())?;

    let mut snapshot = Snapshot::default();
    for path in files {
        if !is_packwiz_manifest(&path) {
            warn!("File \"{}\" isn't a packwiz manifest!", filesystem::file_name_of(&path));
            continue;
        }
        let manifest = PackwizMod::load(&path)?;
        let entry = resolver.resolve(&manifest, scratch.path()).await?;
        info!(name = %manifest.name, id = %entry.id(), "resolved");
        snapshot.entries.push(entry);
    }
    filesystem::close_scratch_dir(scratch)?;

    snapshot.save(out_file.as_ref())?;
    info!(
        mods = snapshot.len(),
        path = %out_file.as_ref().display(),
        "wrote snapshot"
    );
    Ok(snapshot)
}
