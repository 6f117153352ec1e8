//! File-backed image source.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageSourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("{path} is not a decodable image: {source}")]
    Decode {
        path: String,
        source: image::ImageError,
    },
}

/// An uploaded image, validated and fingerprinted.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHandle {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Lowercase hex SHA-256 of the file bytes.
    pub fingerprint: String,
}

/// Read an image file, check that it decodes, and fingerprint its bytes.
pub fn load(path: &Path) -> Result<ImageHandle, ImageSourceError> {
    let bytes = std::fs::read(path).map_err(|source| ImageSourceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let decoded = image::load_from_memory(&bytes).map_err(|source| ImageSourceError::Decode {
        path: path.display().to_string(),
        source,
    })?;

    let handle = ImageHandle {
        path: path.to_path_buf(),
        width: decoded.width(),
        height: decoded.height(),
        fingerprint: fingerprint(&bytes),
    };
    tracing::debug!(
        path = %path.display(),
        width = handle.width,
        height = handle.height,
        fingerprint = %handle.fingerprint,
        "image loaded"
    );
    Ok(handle)
}

pub fn fingerprint(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
