/// The `changelog` module compares two snapshots and renders the additions,
/// removals and version updates between them as a text changelog.
pub mod changelog;

/// The `snapshot` module defines the saved list of mods (`Snapshot`) and builds
/// one from a folder of jars.
pub mod snapshot;

/// The `metadata` module reads mod id, display name and version out of a jar,
/// falling back to the file name when the jar carries no usable descriptor.
pub mod metadata;

/// The `mods_toml` module parses the descriptors embedded in mod jars:
/// Forge/NeoForge `mods.toml` and Fabric `fabric.mod.json`.
pub mod mods_toml;

/// The `manifest_parser` module parses `META-INF/MANIFEST.MF` files, used to
/// resolve versions left as a build placeholder in `mods.toml`.
pub mod manifest_parser;

/// The `packwiz` module snapshots packwiz packs by resolving their `.pw.toml`
/// manifests and downloading each referenced jar.
pub mod packwiz;

pub mod curseforge;
pub mod http;
pub mod filesystem;

pub mod config;
pub mod logging;
pub mod cli;
pub mod interactive;
