//! Interactive prompts used when the binary runs without a command.

use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};

use crate::changelog::ChangelogFormat;
use crate::cli::{ChangelogArgs, Command, SnapshotArgs};
use crate::filesystem::{self, expand_home};

const MODES: [&str; 3] = [
    "Generate a version snapshot",
    "Generate a version snapshot from a packwiz pack",
    "Generate a changelog",
];

/// Asks the user what to do and collects the arguments for it.
pub fn prompt_command() -> Result<Command> {
    let theme = ColorfulTheme::default();
    let mode = Select::with_theme(&theme)
        .with_prompt("What would you like to do?")
        .items(&MODES[..])
        .default(0)
        .interact()?;

    Ok(match mode {
        0 => Command::Snapshot(prompt_snapshot(&theme)?),
        1 => Command::PackwizSnapshot(prompt_snapshot(&theme)?),
        _ => Command::Changelog(prompt_changelog(&theme)?),
    })
}

fn prompt_snapshot(theme: &ColorfulTheme) -> Result<SnapshotArgs> {
    let start = with_trailing_separator(&filesystem::default_start_dir());
    let mods = prompt_dir(theme, "Enter the path to the mods folder.", &start)?;
    let out_dir = prompt_dir(
        theme,
        "Enter the path to the output directory.",
        &mods.to_string_lossy(),
    )?;
    let name: String = Input::with_theme(theme)
        .with_prompt("Enter the name for the output file, leave empty to auto-generate.")
        .allow_empty(true)
        .interact_text()?;

    Ok(SnapshotArgs {
        mods,
        out_dir: Some(out_dir),
        name: Some(name),
    })
}

fn prompt_changelog(theme: &ColorfulTheme) -> Result<ChangelogArgs> {
    let start = with_trailing_separator(&filesystem::default_start_dir());
    let old = prompt_file(theme, "Enter the path to the old snapshot.", &start)?;
    let new = prompt_file(theme, "Enter the path to the new snapshot.", &parent_dir_hint(&old))?;

    let customize = Confirm::with_theme(theme)
        .with_prompt("Do you want to customize the formatting of the changelog?")
        .default(false)
        .interact()?;

    let format = if customize {
        prompt_format(theme)?
    } else {
        ChangelogFormat::default()
    };

    Ok(ChangelogArgs {
        old,
        new,
        emojis: format.use_emojis,
        name_delimiter: format.name_delimiter,
        id_delimiter: format.id_delimiter,
        version_delimiter: format.version_delimiter,
    })
}

fn prompt_format(theme: &ColorfulTheme) -> Result<ChangelogFormat> {
    let defaults = ChangelogFormat::customized_defaults();
    let use_emojis = Confirm::with_theme(theme)
        .with_prompt("Do you want to include emojis in the changelog?")
        .default(true)
        .interact()?;
    let name_delimiter = prompt_delimiter(
        theme,
        "What should surround the mod name (e.g. \"Macaw's Lights and Lamps\")?",
        defaults.name_delimiter,
    )?;
    let id_delimiter = prompt_delimiter(
        theme,
        "What should surround the mod id (e.g. \"mcwlights\")?",
        defaults.id_delimiter,
    )?;
    let version_delimiter = prompt_delimiter(
        theme,
        "What should surround the mod version (e.g. \"1.0.6\")?",
        defaults.version_delimiter,
    )?;

    Ok(ChangelogFormat {
        use_emojis,
        name_delimiter,
        id_delimiter,
        version_delimiter,
    })
}

fn prompt_delimiter(theme: &ColorfulTheme, prompt: &str, default: String) -> Result<String> {
    Ok(Input::with_theme(theme)
        .with_prompt(prompt)
        .default(default)
        .allow_empty(true)
        .interact_text()?)
}

fn prompt_dir(theme: &ColorfulTheme, prompt: &str, initial: &str) -> Result<PathBuf> {
    let input: String = Input::with_theme(theme)
        .with_prompt(prompt)
        .with_initial_text(initial)
        .validate_with(|input: &String| -> Result<(), &str> {
            if expand_home(input.trim()).is_ok_and(filesystem::dir_exists) {
                Ok(())
            } else {
                Err("Not a directory.")
            }
        })
        .interact_text()?;
    Ok(expand_home(input.trim())?)
}

fn prompt_file(theme: &ColorfulTheme, prompt: &str, initial: &str) -> Result<PathBuf> {
    let input: String = Input::with_theme(theme)
        .with_prompt(prompt)
        .with_initial_text(initial)
        .validate_with(|input: &String| -> Result<(), &str> {
            if expand_home(input.trim()).is_ok_and(filesystem::file_exists) {
                Ok(())
            } else {
                Err("Not a file.")
            }
        })
        .interact_text()?;
    Ok(expand_home(input.trim())?)
}

/// The folder containing `path`, with a trailing separator, so the next path
/// prompt starts next to the previous answer.
pub fn parent_dir_hint(path: &Path) -> String {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => with_trailing_separator(parent),
        _ => String::new(),
    }
}

fn with_trailing_separator(path: &Path) -> String {
    let mut text = path.to_string_lossy().into_owned();
    if !text.ends_with(MAIN_SEPARATOR) {
        text.push(MAIN_SEPARATOR);
    }
    text
}
