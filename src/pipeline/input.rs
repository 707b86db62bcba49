//! Input validation and decoding.
//!
//! The accepted formats are fixed by what the press workflow uploads:
//! `.jpg`, `.jpeg`, `.png`. The check is on the filename extension only;
//! the decode step is what actually proves the bytes are an image, and a
//! decode failure aborts the whole run before any output exists.

use crate::error::ImposeError;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Filename extensions accepted for upload.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// A decoded source image plus the filename it arrived under.
pub struct SourceImage {
    /// The decoded raster, still in its source colour type.
    pub image: DynamicImage,
    /// Original filename, used for error messages and recognition fallback.
    pub filename: String,
}

impl SourceImage {
    /// Load a source image from a file on disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ImposeError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImposeError::FileNotFound {
                path: PathBuf::from(path),
            });
        }
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = std::fs::read(path).map_err(|e| ImposeError::DecodeFailed {
            filename: filename.clone(),
            detail: e.to_string(),
        })?;
        Self::from_bytes(&bytes, filename)
    }

    /// Decode in-memory bytes that arrived under `filename`.
    pub fn from_bytes(bytes: &[u8], filename: impl Into<String>) -> Result<Self, ImposeError> {
        let filename = filename.into();
        check_extension(&filename)?;

        let image = image::load_from_memory(bytes).map_err(|e| ImposeError::DecodeFailed {
            filename: filename.clone(),
            detail: e.to_string(),
        })?;
        debug!(
            "Decoded '{}': {}x{} px, {:?}",
            filename,
            image.width(),
            image.height(),
            image.color()
        );
        Ok(Self { image, filename })
    }
}

/// Reject filenames whose extension is not in the accepted set.
///
/// Case-insensitive; the content itself is not sniffed.
fn check_extension(filename: &str) -> Result<(), ImposeError> {
    let ext = Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase());
    match ext {
        Some(ref e) if ACCEPTED_EXTENSIONS.contains(&e.as_str()) => Ok(()),
        _ => Err(ImposeError::UnsupportedExtension {
            filename: filename.to_string(),
        }),
    }
}
