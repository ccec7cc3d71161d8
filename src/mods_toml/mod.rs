use serde::Deserialize;
use thiserror::Error;

use crate::snapshot::ModRecord;

/// Version string Forge substitutes at build time with the jar's
/// `Implementation-Version`. Jars that were not processed still carry it.
pub const JAR_VERSION_PLACEHOLDER: &str = "${file.jarVersion}";

/// Represents the contents of a Forge/NeoForge `mods.toml` file.
///
/// Only the fields needed to identify a mod are read; the rest of the document
/// (dependencies, loader ranges, ...) is ignored.
#[derive(Debug, Deserialize)]
pub struct ModsToml {
    /// The `[[mods]]` tables. A jar may declare several mods; the first one
    /// identifies the jar.
    #[serde(default)]
    pub mods: Vec<ModsTomlEntry>,
}

/// A single `[[mods]]` table.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModsTomlEntry {
    /// The mod identifier, e.g. `create`.
    pub mod_id: String,
    /// The human readable name. Forge falls back to the mod id.
    pub display_name: Option<String>,
    /// The version, possibly the [`JAR_VERSION_PLACEHOLDER`].
    pub version: Option<String>,
}

/// Represents the identifying part of a Fabric/Quilt `fabric.mod.json` file.
#[derive(Debug, Deserialize)]
pub struct FabricModJson {
    pub id: String,
    pub name: Option<String>,
    pub version: String,
}

/// Errors raised while reading embedded mod descriptors.
#[derive(Debug, Error)]
pub enum ModsTomlError {
    #[error("Failed to parse TOML: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to parse JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),
    #[error("No [[mods]] table in the mods.toml file")]
    MissingModsTable,
}

/// Parses the text of a `mods.toml` file and returns the record of its first
/// declared mod.
///
/// A missing `displayName` falls back to the mod id and a missing `version`
/// to [`JAR_VERSION_PLACEHOLDER`], mirroring what Forge does at runtime.
///
/// # Arguments
///
/// * `content` - The text of a `mods.toml` file.
///
/// # Returns
///
/// The record of the first `[[mods]]` entry.
///
/// # Errors
///
/// Returns an error if the contents are not valid TOML, a `[[mods]]` table lacks
/// `modId`, or there is no `[[mods]]` table at all.
pub fn parse_mods_toml(content: &str) -> Result<ModRecord, ModsTomlError> {
    let parsed: ModsToml = toml::from_str(content)?;
    let first = parsed
        .mods
        .into_iter()
        .next()
        .ok_or(ModsTomlError::MissingModsTable)?;

    Ok(ModRecord {
        human_name: first.display_name.unwrap_or_else(|| first.mod_id.clone()),
        version: first
            .version
            .unwrap_or_else(|| JAR_VERSION_PLACEHOLDER.to_string()),
        id: first.mod_id,
    })
}

/// Parses the text of a `fabric.mod.json` file into a record.
pub fn parse_fabric_mod_json(content: &str) -> Result<ModRecord, ModsTomlError> {
    let parsed: FabricModJson = serde_json::from_str(content)?;
    Ok(ModRecord {
        human_name: parsed.name.unwrap_or_else(|| parsed.id.clone()),
        id: parsed.id,
        version: parsed.version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_mod_of_mods_toml() {
        let content = r#"
modLoader = "javafml"
loaderVersion = "[47,)"
license = "MIT"

[[mods]]
modId = "mcwlights"
version = "1.0.6"
displayName = "Macaw's Lights and Lamps"

[[mods]]
modId = "mcwlights_compat"
version = "0.1"

[[dependencies.mcwlights]]
modId = "forge"
mandatory = true
versionRange = "[47,)"
"#;
        let record = parse_mods_toml(content).unwrap();
        assert_eq!(record.id, "mcwlights");
        assert_eq!(record.human_name, "Macaw's Lights and Lamps");
        assert_eq!(record.version, "1.0.6");
    }

    #[test]
    fn falls_back_to_mod_id_and_placeholder() {
        let content = "[[mods]]\nmodId = \"jei\"\n";
        let record = parse_mods_toml(content).unwrap();
        assert_eq!(record.human_name, "jei");
        assert_eq!(record.version, JAR_VERSION_PLACEHOLDER);
    }

    #[test]
    fn returns_error_without_mods_table() {
        let result = parse_mods_toml("modLoader = \"javafml\"\n");
        assert!(matches!(result, Err(ModsTomlError::MissingModsTable)));
    }

    #[test]
    fn returns_error_for_missing_mod_id() {
        let result = parse_mods_toml("[[mods]]\nversion = \"1.0\"\n");
        assert!(matches!(result, Err(ModsTomlError::TomlParseError(_))));
    }

    #[test]
    fn returns_error_for_invalid_toml() {
        assert!(parse_mods_toml("[[mods]\nmodId = ").is_err());
    }

    #[test]
    fn parses_fabric_mod_json() {
        let content = r#"{
            "schemaVersion": 1,
            "id": "sodium",
            "version": "0.5.8",
            "name": "Sodium",
            "environment": "client"
        }"#;
        let record = parse_fabric_mod_json(content).unwrap();
        assert_eq!(record.id, "sodium");
        assert_eq!(record.human_name, "Sodium");
        assert_eq!(record.version, "0.5.8");
    }

    #[test]
    fn fabric_name_defaults_to_id() {
        let record = parse_fabric_mod_json(r#"{"id": "lithium", "version": "1.0"}"#).unwrap();
        assert_eq!(record.human_name, "lithium");
    }

    #[test]
    fn fabric_json_without_version_is_an_error() {
        let result = parse_fabric_mod_json(r#"{"id": "lithium"}"#);
        assert!(matches!(result, Err(ModsTomlError::JsonParseError(_))));
    }
}
