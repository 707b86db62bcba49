//! OCR engines: the external recognition collaborator behind a trait.
//!
//! The engine is a black box: image in, raw text out. Keeping it behind
//! [`OcrEngine`] lets tests inject a canned engine and lets deployments
//! swap the default `tesseract` subprocess for anything else that reads
//! a raster.

use crate::error::RecognizeError;
use image::DynamicImage;
use std::io::Write;
use std::process::Command;
use tracing::debug;

/// An external text recognition engine.
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs and error messages.
    fn name(&self) -> &str;

    /// Recognise raw text from the image.
    fn recognize(&self, image: &DynamicImage) -> Result<String, RecognizeError>;
}

/// The default engine: the `tesseract` binary invoked as a subprocess.
///
/// The image is written to a managed temporary PNG, because tesseract
/// reads from a filesystem path; the file is removed when the call
/// returns. Output goes to stdout (`tesseract <path> stdout`).
pub struct TesseractCli {
    binary: String,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
        }
    }
}

impl TesseractCli {
    /// Use a non-PATH tesseract binary.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl OcrEngine for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String, RecognizeError> {
        let mut tmp = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .map_err(|e| RecognizeError::EngineFailed {
                engine: self.name().to_string(),
                detail: format!("temp file: {e}"),
            })?;

        let mut png = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| RecognizeError::EngineFailed {
                engine: self.name().to_string(),
                detail: format!("temp PNG encode: {e}"),
            })?;
        tmp.write_all(&png).map_err(|e| RecognizeError::EngineFailed {
            engine: self.name().to_string(),
            detail: format!("temp file write: {e}"),
        })?;

        let output = Command::new(&self.binary)
            .arg(tmp.path())
            .arg("stdout")
            .output()
            .map_err(|e| RecognizeError::EngineUnavailable {
                engine: self.name().to_string(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(RecognizeError::EngineFailed {
                engine: self.name().to_string(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        if text.trim().is_empty() {
            return Err(RecognizeError::EmptyText);
        }
        debug!("tesseract produced {} bytes of text", text.len());
        Ok(text)
    }
}
