use futures_util::StreamExt;
use sha1::{Digest as Sha1Digest, Sha1};
use sha2::{Digest as Sha2Digest, Sha256, Sha512};
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Enum representing supported hashers for file integrity verification.
pub enum HasherEnum {
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
    None,
}

impl HasherEnum {
    /// Picks the hasher matching a hex digest by its length: 40 characters for
    /// SHA-1, 64 for SHA-256 and 128 for SHA-512. Other lengths disable
    /// verification.
    pub fn for_digest(expected: &str) -> Self {
        match expected.len() {
            40 => HasherEnum::Sha1(Sha1::new()),
            64 => HasherEnum::Sha256(Sha256::new()),
            128 => HasherEnum::Sha512(Sha512::new()),
            _ => HasherEnum::None,
        }
    }

    /// Updates the internal state of the hasher with the provided data.
    ///
    /// # Arguments
    ///
    /// * `data` - A byte slice to update the hash with.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            HasherEnum::Sha1(h) => h.update(data),
            HasherEnum::Sha256(h) => h.update(data),
            HasherEnum::Sha512(h) => h.update(data),
            HasherEnum::None => {}
        }
    }

    /// Finalizes the hash computation and returns the resulting digest as a byte vector.
    pub fn finalize(self) -> Vec<u8> {
        match self {
            HasherEnum::Sha1(h) => h.finalize().to_vec(),
            HasherEnum::Sha256(h) => h.finalize().to_vec(),
            HasherEnum::Sha512(h) => h.finalize().to_vec(),
            HasherEnum::None => Vec::new(),
        }
    }
}

/// Errors raised while downloading an artifact.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("download of {url} failed: status code {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("cannot derive a file name from {0}")]
    NoFileName(String),
    #[error("hash mismatch for {path}: got {actual}, want {expected}")]
    HashMismatch {
        path: PathBuf,
        actual: String,
        expected: String,
    },
}

/// Returns the last path segment of `url`, without query or fragment.
pub fn file_name_from_url(url: &str) -> Option<&str> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && !segment.contains(':'))
}

/// Downloads the file at `url` into `dir` and returns its local path.
///
/// The local file name is the last segment of the URL. If the file is already
/// present and `override_file` is false, it is reused as long as it matches
/// `expected_hash` (or unconditionally when no hash is given).
///
/// # Arguments
///
/// * `client` - The HTTP client to send the request with.
/// * `url` - The URL to download the file from.
/// * `dir` - The directory the file is written to.
/// * `expected_hash` - Optional hex digest the file must match.
/// * `override_file` - Whether to download again when the file already exists.
///
/// # Returns
///
/// The path of the downloaded (or reused) file.
///
/// # Errors
///
/// Returns an error if the request fails, the server answers with a non-success
/// status, writing fails, or the downloaded bytes do not match `expected_hash`.
/// A file failing verification is removed.
pub async fn download_to_file(
    client: &reqwest::Client,
    url: &str,
    dir: &Path,
    expected_hash: Option<&str>,
    override_file: bool,
) -> Result<PathBuf, DownloadError> {
    let file_name = file_name_from_url(url).ok_or_else(|| DownloadError::NoFileName(url.to_string()))?;
    let filepath = dir.join(file_name);

    if filepath.exists() && !override_file {
        match expected_hash {
            Some(expected) if verify_hash(&filepath, expected)? => {
                debug!(path = %filepath.display(), "reusing verified download");
                return Ok(filepath);
            }
            None => return Ok(filepath),
            Some(_) => {}
        }
    }

    fs::create_dir_all(dir)?;

    info!(url, "downloading");
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let mut out_file = File::create(&filepath)?;
    let mut hasher = expected_hash.map(HasherEnum::for_digest).unwrap_or(HasherEnum::None);

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        out_file.write_all(&chunk)?;
        hasher.update(&chunk);
    }
    out_file.flush()?;

    if let Some(expected) = expected_hash {
        if !matches!(hasher, HasherEnum::None) {
            let actual = hex::encode(hasher.finalize());
            if !actual.eq_ignore_ascii_case(expected) {
                drop(out_file);
                let _ = fs::remove_file(&filepath);
                return Err(DownloadError::HashMismatch {
                    path: filepath,
                    actual,
                    expected: expected.to_string(),
                });
            }
        }
    }

    Ok(filepath)
}

/// Verifies the hash of a file against an expected hash string.
///
/// Supports SHA-1, SHA-256, and SHA-512 based on the length of the expected
/// hash. Digests of any other length never match.
///
/// # Arguments
///
/// * `path` - The file to hash.
/// * `expected` - The expected hex digest; case is ignored.
///
/// # Returns
///
/// * `io::Result<bool>` - `Ok(true)` if the digest matches, or an error if the
///   file cannot be read.
pub fn verify_hash(path: &Path, expected: &str) -> io::Result<bool> {
    let mut hasher = HasherEnum::for_digest(expected);
    if matches!(hasher, HasherEnum::None) {
        return Ok(false);
    }

    let f = File::open(path)?;
    let mut reader = BufReader::new(f);
    let mut buffer = [0u8; 8192];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    let actual = hex::encode(hasher.finalize());
    Ok(actual.eq_ignore_ascii_case(expected))
}
