//! Document loading.
//!
//! Inspection and thermal reports are read as UTF-8 plain text. The
//! loader checks extension, size and encoding before handing the text
//! to the pipeline.

use crate::config::LoaderConfig;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Reasons a document could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("Unsupported file type: .{extension} (supported: {supported})")]
    UnsupportedFormat {
        extension: String,
        supported: String,
    },

    #[error("Document too large: {} is {size} bytes (limit {limit})", .path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("Document is not valid UTF-8 text: {}", .0.display())]
    NotUtf8(PathBuf),

    #[error("Document is empty: {}", .0.display())]
    Empty(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Basic size figures for a loaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentStats {
    pub characters: usize,
    pub lines: usize,
    pub non_empty_lines: usize,
}

impl DocumentStats {
    pub fn of(text: &str) -> Self {
        Self {
            characters: text.chars().count(),
            lines: text.lines().count(),
            non_empty_lines: text.lines().filter(|l| !l.trim().is_empty()).count(),
        }
    }
}

/// Load a document as text.
pub fn load_document(path: &Path, config: &LoaderConfig) -> Result<String, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let metadata = fs::metadata(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if !metadata.is_file() {
        return Err(LoadError::NotAFile(path.to_path_buf()));
    }

    check_extension(path, config)?;

    if metadata.len() > config.max_document_bytes {
        return Err(LoadError::TooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            limit: config.max_document_bytes,
        });
    }

    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let text = String::from_utf8(bytes).map_err(|_| LoadError::NotUtf8(path.to_path_buf()))?;

    if text.trim().is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }

    info!(
        "Loaded {} ({} characters)",
        path.display(),
        text.chars().count()
    );

    Ok(text)
}

fn check_extension(path: &Path, config: &LoaderConfig) -> Result<(), LoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if config
        .extensions
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(&extension))
    {
        return Ok(());
    }

    debug!("Rejected {} by extension", path.display());
    Err(LoadError::UnsupportedFormat {
        extension,
        supported: config.extensions.join(", "),
    })
}
