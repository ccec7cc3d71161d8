use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::{Args, Parser, Subcommand};

use crate::changelog::{self, ChangelogFormat};
use crate::config::Config;
use crate::curseforge::CurseForgeClient;
use crate::packwiz::{self, PackwizResolver};
use crate::snapshot::{self, snapshot_file_name};

#[derive(Debug, Parser)]
#[command(name = "modpack-changelog", version, about = "Snapshot a mods folder and turn two snapshots into a changelog")]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run without a command to be asked interactively
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Record the mods of a folder of jars
    Snapshot(SnapshotArgs),

    /// Record the mods of a packwiz pack, downloading each jar once
    #[command(alias = "pw")]
    PackwizSnapshot(SnapshotArgs),

    /// Print the changes between two snapshots
    Changelog(ChangelogArgs),
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct SnapshotArgs {
    /// The mods folder
    #[arg(short, long)]
    pub mods: PathBuf,

    /// Folder to write the snapshot to (defaults to the mods folder)
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Snapshot file name; `.json` is appended if missing (defaults to a timestamped name)
    #[arg(short, long)]
    pub name: Option<String>,
}

impl SnapshotArgs {
    /// Where the snapshot will be written.
    pub fn output_path(&self, now: DateTime<Local>) -> PathBuf {
        let dir = self.out_dir.as_deref().unwrap_or(&self.mods);
        dir.join(snapshot_file_name(self.name.as_deref().unwrap_or(""), now))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct ChangelogArgs {
    /// The older snapshot
    pub old: PathBuf,

    /// The newer snapshot
    pub new: PathBuf,

    /// Use emoji markers
    #[arg(short, long)]
    pub emojis: bool,

    /// Text placed around mod names
    #[arg(long, default_value = "")]
    pub name_delimiter: String,

    /// Text placed around mod ids
    #[arg(long, default_value = "")]
    pub id_delimiter: String,

    /// Text placed around versions
    #[arg(long, default_value = "")]
    pub version_delimiter: String,
}

impl ChangelogArgs {
    pub fn format(&self) -> ChangelogFormat {
        ChangelogFormat {
            use_emojis: self.emojis,
            name_delimiter: self.name_delimiter.clone(),
            id_delimiter: self.id_delimiter.clone(),
            version_delimiter: self.version_delimiter.clone(),
        }
    }
}

/// Runs a parsed or interactively built command.
pub async fn execute(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Snapshot(args) => {
            let out_file = args.output_path(Local::now());
            snapshot::generate_snapshot(&args.mods, &out_file)
                .with_context(|| format!("Failed to snapshot {}", args.mods.display()))?;
            report_snapshot(&out_file);
        }
        Command::PackwizSnapshot(args) => {
            let out_file = args.output_path(Local::now());
            let resolver = resolver_from_config(config);
            packwiz::generate_packwiz_snapshot(&args.mods, &out_file, &resolver)
                .await
                .with_context(|| format!("Failed to snapshot packwiz pack {}", args.mods.display()))?;
            report_snapshot(&out_file);
        }
        Command::Changelog(args) => {
            let text = changelog::generate_changelog(&args.old, &args.new, &args.format())
                .context("Failed to generate changelog")?;
            println!();
            print!("{text}");
        }
    }
    Ok(())
}

fn report_snapshot(out_file: &Path) {
    println!("Successfully generated snapshot at {}.", out_file.display());
}

fn resolver_from_config(config: &Config) -> PackwizResolver {
    let client = reqwest::Client::new();
    let curseforge = config
        .api_key
        .as_ref()
        .map(|key| CurseForgeClient::with_client(client.clone(), config.api_base_url.clone(), key.clone()));
    PackwizResolver::new(client, curseforge, config.scratch_dir.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parses_snapshot_command() {
        let cli = Cli::try_parse_from(["modpack-changelog", "snapshot", "--mods", "/srv/pack/mods", "--name", "v1"]).unwrap();
        assert!(!cli.verbose);
        assert_eq!(
            cli.command,
            Some(Command::Snapshot(SnapshotArgs {
                mods: PathBuf::from("/srv/pack/mods"),
                out_dir: None,
                name: Some("v1".to_string()),
            }))
        );
    }

    #[test]
    fn parses_changelog_command_with_formatting() {
        let cli = Cli::try_parse_from([
            "modpack-changelog",
            "-v",
            "changelog",
            "old.json",
            "new.json",
            "--emojis",
            "--id-delimiter",
            "`",
            "--version-delimiter",
            "**",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Some(Command::Changelog(args)) = cli.command else {
            panic!("expected changelog command");
        };
        assert_eq!(
            args.format(),
            ChangelogFormat {
                use_emojis: true,
                ..ChangelogFormat::customized_defaults()
            }
        );
    }

    #[test]
    fn no_command_means_interactive() {
        let cli = Cli::try_parse_from(["modpack-changelog"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn packwiz_alias_is_accepted() {
        let cli = Cli::try_parse_from(["modpack-changelog", "pw", "--mods", "mods"]).unwrap();
        assert!(matches!(cli.command, Some(Command::PackwizSnapshot(_))));
    }

    #[test]
    fn output_path_defaults_to_mods_folder_and_timestamp() {
        let now = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let args = SnapshotArgs {
            mods: PathBuf::from("mods"),
            out_dir: None,
            name: None,
        };
        assert_eq!(args.output_path(now), PathBuf::from("mods/snapshot-2024-01-02-03-04-05.json"));

        let args = SnapshotArgs {
            out_dir: Some(PathBuf::from("out")),
            name: Some("release".to_string()),
            ..args
        };
        assert_eq!(args.output_path(now), PathBuf::from("out/release.json"));
    }

    #[tokio::test]
    async fn executes_snapshot_and_changelog() {
        let mods = tempdir().unwrap();
        let out = tempdir().unwrap();
        fs::write(mods.path().join("broken.jar"), b"not a zip").unwrap();
        let config = Config::from_lookup(|_| None, out.path().to_path_buf()).unwrap();

        execute(
            Command::Snapshot(SnapshotArgs {
                mods: mods.path().to_path_buf(),
                out_dir: Some(out.path().to_path_buf()),
                name: Some("first".to_string()),
            }),
            &config,
        )
        .await
        .unwrap();
        assert!(out.path().join("first.json").exists());

        execute(
            Command::Changelog(ChangelogArgs {
                old: out.path().join("first.json"),
                new: out.path().join("first.json"),
                emojis: false,
                name_delimiter: String::new(),
                id_delimiter: String::new(),
                version_delimiter: String::new(),
            }),
            &config,
        )
        .await
        .unwrap();
    }
}
