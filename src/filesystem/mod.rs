use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use tracing::debug;

const SCRATCH_PREFIX: &str = "modpack-changelog";

/// Represents errors that can occur during filesystem operations.
#[derive(Debug, Error)]
pub enum FilesystemError {
    /// Wrapper for standard IO errors.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The destination exists and the caller asked not to overwrite it.
    #[error("{0} already exists and overwrite is false")]
    AlreadyExists(PathBuf),
    /// Error for empty path input.
    #[error("Path is empty")]
    EmptyPath,
    /// Error when the home directory cannot be determined.
    #[error("Home directory not found")]
    HomeDirNotFound,
    /// Error for unsupported user expansion in paths (e.g., ~user).
    #[error("User expansion (~user) not supported")]
    UserExpansionNotSupported,
}

impl FilesystemError {
    fn io(path: &Path, source: io::Error) -> Self {
        FilesystemError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Options for writing files, such as whether to overwrite existing files.
pub struct WriteOptions {
    /// If true, allows overwriting an existing file.
    pub overwrite: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { overwrite: true }
    }
}

/// Lists the regular files directly inside `dir`, sorted by file name.
///
/// Subdirectories and symlinks to directories are left out.
///
/// # Arguments
///
/// * `dir` - Path to the directory to list.
///
/// # Returns
///
/// The paths of the files found.
///
/// # Errors
///
/// Returns `FilesystemError` if the directory cannot be read.
pub fn list_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, FilesystemError> {
    let dir = dir.as_ref();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| FilesystemError::io(dir, e))? {
        let entry = entry.map_err(|e| FilesystemError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Returns the final component of `path` as a string, lossily converted.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Checks if a directory exists at the given path.
pub fn dir_exists<P: AsRef<Path>>(dir: P) -> bool {
    dir.as_ref().is_dir()
}

/// Checks if a file exists at the given path.
pub fn file_exists<P: AsRef<Path>>(file: P) -> bool {
    file.as_ref().is_file()
}

/// Creates a fresh scratch directory for downloaded artifacts inside `parent`.
///
/// `parent` is created if needed and is never removed; only the returned
/// directory is deleted, when the [`TempDir`] is closed or dropped.
///
/// # Arguments
///
/// * `parent` - Folder the scratch directory is created in.
///
/// # Returns
///
/// The handle owning the new directory.
///
/// # Errors
///
/// Returns `FilesystemError` if either directory cannot be created.
pub fn create_scratch_dir<P: AsRef<Path>>(parent: P) -> Result<TempDir, FilesystemError> {
    let parent = parent.as_ref();
    fs::create_dir_all(parent).map_err(|e| FilesystemError::io(parent, e))?;
    let scratch = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempdir_in(parent)
        .map_err(|e| FilesystemError::io(parent, e))?;
    debug!(path = %scratch.path().display(), "created scratch directory");
    Ok(scratch)
}

/// Deletes a scratch directory made by [`create_scratch_dir`] together with
/// its contents.
pub fn close_scratch_dir(scratch: TempDir) -> Result<(), FilesystemError> {
    let path = scratch.path().to_path_buf();
    scratch.close().map_err(|e| FilesystemError::io(&path, e))?;
    debug!(path = %path.display(), "removed scratch directory");
    Ok(())
}

/// Removes a single file, ignoring files that do not exist.
///
/// # Arguments
///
/// * `path` - Path to the file to remove.
pub fn remove_file_if_exists<P: AsRef<Path>>(path: P) -> Result<(), FilesystemError> {
    let p = path.as_ref();
    match fs::remove_file(p) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(FilesystemError::io(p, e)),
        _ => Ok(()),
    }
}

/// Reads the contents of a file into a string.
///
/// # Arguments
///
/// * `path` - Path to the file to read.
///
/// # Returns
///
/// The file contents.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<String, FilesystemError> {
    let p = path.as_ref();
    fs::read_to_string(p).map_err(|e| FilesystemError::io(p, e))
}

/// Writes content to a file, with options for overwriting.
///
/// # Arguments
///
/// * `path` - Path to the file to write.
/// * `content` - Content to write to the file.
/// * `options` - Options for writing (e.g., overwrite).
///
/// # Errors
///
/// Returns `FilesystemError` if the write fails or overwrite is not allowed.
pub fn write_file<P: AsRef<Path>>(
    path: P,
    content: &str,
    options: WriteOptions,
) -> Result<(), FilesystemError> {
    let p = path.as_ref();
    if p.exists() && !options.overwrite {
        return Err(FilesystemError::AlreadyExists(p.to_path_buf()));
    }
    let mut file = fs::File::create(p).map_err(|e| FilesystemError::io(p, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| FilesystemError::io(p, e))?;
    Ok(())
}

/// Expands a path that starts with `~` to the user's home directory.
///
/// # Arguments
///
/// * `path` - The path, possibly starting with `~` or `~/`.
///
/// # Returns
///
/// The path with the home directory substituted, or the input unchanged when
/// it does not start with `~`.
///
/// # Errors
///
/// Returns `FilesystemError::EmptyPath` for an empty input,
/// `FilesystemError::HomeDirNotFound` when the home directory is unknown, and
/// `FilesystemError::UserExpansionNotSupported` for `~user` forms.
pub fn expand_home(path: &str) -> Result<PathBuf, FilesystemError> {
    if path.is_empty() {
        return Err(FilesystemError::EmptyPath);
    }
    if !path.starts_with('~') {
        return Ok(PathBuf::from(path));
    }
    let home = dirs::home_dir().ok_or(FilesystemError::HomeDirNotFound)?;
    if path == "~" {
        return Ok(home);
    }
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        return Ok(home.join(rest));
    }
    Err(FilesystemError::UserExpansionNotSupported)
}

/// Suggested starting point for path prompts: the user's home directory, or
/// the filesystem root when it cannot be determined.
pub fn default_start_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        if cfg!(windows) {
            PathBuf::from("C:\\")
        } else {
            PathBuf::from("/")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn lists_only_files_in_name_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.jar"), b"").unwrap();
        fs::write(dir.path().join("a.jar"), b"").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let files = list_files(dir.path()).unwrap();
        let names: Vec<String> = files.iter().map(|p| file_name_of(p)).collect();
        assert_eq!(names, vec!["a.jar", "b.jar"]);
    }

    #[test]
    fn list_files_fails_for_missing_directory() {
        let dir = tempdir().unwrap();
        let result = list_files(dir.path().join("missing"));
        assert!(matches!(result, Err(FilesystemError::Io { .. })));
    }

    #[test]
    fn scratch_dir_is_created_and_removed() {
        let root = tempdir().unwrap();
        let parent = root.path().join("cached_files");
        let scratch = create_scratch_dir(&parent).unwrap();
        let path = scratch.path().to_path_buf();
        fs::write(path.join("mod.jar"), b"data").unwrap();
        assert!(path.starts_with(&parent));

        close_scratch_dir(scratch).unwrap();
        assert!(!path.exists());
        assert!(dir_exists(&parent));
    }

    #[test]
    fn existing_parent_and_its_contents_survive() {
        let parent = tempdir().unwrap();
        let keep = parent.path().join("keep.txt");
        fs::write(&keep, b"user data").unwrap();
        {
            let scratch = create_scratch_dir(parent.path()).unwrap();
            fs::write(scratch.path().join("mod.jar"), b"data").unwrap();
        }
        assert_eq!(read_file(&keep).unwrap(), "user data");
        let remaining: Vec<PathBuf> = fs::read_dir(parent.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(remaining, vec![keep]);
    }

    #[test]
    fn write_file_respects_overwrite_flag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        write_file(&path, "[]", WriteOptions::default()).unwrap();

        let result = write_file(&path, "[1]", WriteOptions { overwrite: false });
        assert!(matches!(result, Err(FilesystemError::AlreadyExists(_))));
        assert_eq!(read_file(&path).unwrap(), "[]");
        assert!(file_exists(&path));
    }

    #[test]
    fn remove_file_if_exists_ignores_missing_file() {
        let dir = tempdir().unwrap();
        assert!(remove_file_if_exists(dir.path().join("nope.jar")).is_ok());
    }

    #[test]
    fn expands_home_prefix() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/mods").unwrap(), home.join("mods"));
            assert_eq!(expand_home("~").unwrap(), home);
        }
        assert_eq!(expand_home("/srv/mods").unwrap(), PathBuf::from("/srv/mods"));
    }

    #[test]
    fn rejects_user_expansion_and_empty_paths() {
        assert!(matches!(
            expand_home("~other/mods"),
            Err(FilesystemError::UserExpansionNotSupported | FilesystemError::HomeDirNotFound)
        ));
        assert!(matches!(expand_home(""), Err(FilesystemError::EmptyPath)));
    }
}
