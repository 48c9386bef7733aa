use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Upper bound on the sanitized title portion of a filename.
pub const MAX_TITLE_CHARS: usize = 100;

/// `{date}_{sanitized title}.md`. The date stamp is injected by the caller
/// so downloads are deterministic under test.
pub fn dated_filename(date: &str, title: Option<&str>) -> String {
    format!("{date}_{}.md", sanitize_title(title.unwrap_or("untitled")))
}

fn sanitize_title(input: &str) -> String {
    let mut cleaned: String = input
        .chars()
        .map(|c| {
            if is_forbidden(c) || c.is_whitespace() {
                '_'
            } else {
                c
            }
        })
        .collect();
    cleaned = cleaned.trim_matches(&['_', '.'][..]).to_string();
    if cleaned.is_empty() {
        return "untitled".to_string();
    }
    // Collapse runs of underscores so whitespace runs become one separator.
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }
    if compacted.chars().count() > MAX_TITLE_CHARS {
        compacted = compacted.chars().take(MAX_TITLE_CHARS).collect();
    }
    compacted
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

/// Bytes crossing the download boundary travel base64-encoded: the issuing
/// context may lack access to transient object references, so the payload
/// must be self-contained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadPayload {
    pub data: String,
    pub filename: String,
    /// Always false: downloads are issued without a save prompt.
    pub prompt: bool,
}

impl DownloadPayload {
    pub fn markdown(markdown: &str, filename: String) -> Self {
        Self {
            data: BASE64.encode(markdown.as_bytes()),
            filename,
            prompt: false,
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>, DownloadError> {
        BASE64
            .decode(&self.data)
            .map_err(|err| DownloadError::Encoding(err.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("download directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("payload is not valid base64: {0}")]
    Encoding(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// The download facility seam.
pub trait Downloader: Send + Sync {
    fn download(&self, payload: &DownloadPayload) -> Result<PathBuf, DownloadError>;
}

/// Decodes payloads into a directory, writing atomically via a temp file
/// and rename so no partial download is ever observable.
#[derive(Debug, Clone)]
pub struct FileDownloader {
    dir: PathBuf,
}

impl FileDownloader {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl Downloader for FileDownloader {
    fn download(&self, payload: &DownloadPayload) -> Result<PathBuf, DownloadError> {
        let bytes = payload.decode()?;
        ensure_download_dir(&self.dir)?;

        let target = self.dir.join(&payload.filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // Replace an existing file of the same name.
        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| DownloadError::Io(e.error))?;
        Ok(target)
    }
}

/// Ensure the download directory exists and is writable; create if missing.
fn ensure_download_dir(dir: &Path) -> Result<(), DownloadError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| DownloadError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(DownloadError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| DownloadError::OutputDir(e.to_string()))?;
    }
    // Writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| DownloadError::OutputDir(e.to_string()))?;
    Ok(())
}
