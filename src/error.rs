//! Error types for the sixup library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ImposeError`] — **Fatal**: the imposition cannot proceed at all
//!   (bad input image, inconsistent geometry, PDF write failure). Returned as
//!   `Err(ImposeError)` from the top-level `impose*` functions.
//!
//! * [`RecognizeError`] — **Non-fatal**: label recognition failed (engine
//!   missing, unreadable text) but the sheet itself is fine. Swallowed by the
//!   recognizer, which falls back to the fixed default filename.
//!
//! The separation lets callers decide their own tolerance: a bad OCR pass
//! never costs them the PDF, while a bad input image always aborts before any
//! output exists.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the sixup library.
///
/// Recognition failures use [`RecognizeError`] and degrade to the fallback
/// filename rather than propagating here.
#[derive(Debug, Error)]
pub enum ImposeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The filename extension is not one of the accepted raster formats.
    #[error("Unsupported file type '{filename}': expected a .jpg, .jpeg or .png file")]
    UnsupportedExtension { filename: String },

    /// The bytes could not be decoded as an image.
    #[error("Failed to decode image '{filename}': {detail}")]
    DecodeFailed { filename: String, detail: String },

    // ── Geometry errors ───────────────────────────────────────────────────
    /// The placement parameters would push a cell off the sheet.
    #[error(
        "Placement does not fit: cell at column {col}, row {row} spans \
         ({x0:.2}, {y0:.2})..({x1:.2}, {y1:.2}) pt on a {side:.0} pt sheet.\n\
         Reduce the gripper/gutter/margins or use a larger sheet."
    )]
    Geometry {
        col: u32,
        row: u32,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        side: f32,
    },

    // ── Encode / compose errors ───────────────────────────────────────────
    /// Re-encoding the transformed raster failed.
    #[error("Failed to encode label raster as {format}: {detail}")]
    EncodeFailed { format: String, detail: String },

    /// The PDF document could not be serialised.
    #[error("Failed to build PDF sheet: {detail}")]
    PdfFailed { detail: String },

    // ── Dispatch errors ───────────────────────────────────────────────────
    /// SMTP settings are incomplete.
    #[error("SMTP is not configured: missing {var}\nSet {var} in the environment.")]
    SmtpNotConfigured { var: String },

    /// The e-mail could not be built or sent. The PDF remains valid.
    #[error("Failed to send '{filename}': {detail}")]
    DispatchFailed { filename: String, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A non-fatal error from the label recognizer.
///
/// The recognizer converts any of these into the fallback filename; the
/// imposition itself never fails because of them.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum RecognizeError {
    /// The OCR engine could not be invoked at all.
    #[error("OCR engine '{engine}' unavailable: {detail}")]
    EngineUnavailable { engine: String, detail: String },

    /// The engine ran but exited with a failure.
    #[error("OCR engine '{engine}' failed: {detail}")]
    EngineFailed { engine: String, detail: String },

    /// The engine produced no usable text.
    #[error("OCR produced no usable text")]
    EmptyText,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_display_names_the_cell() {
        let e = ImposeError::Geometry {
            col: 1,
            row: 2,
            x0: 400.0,
            y0: -12.5,
            x1: 693.25,
            y1: 172.37,
            side: 648.0,
        };
        let msg = e.to_string();
        assert!(msg.contains("column 1"), "got: {msg}");
        assert!(msg.contains("row 2"), "got: {msg}");
        assert!(msg.contains("648 pt"), "got: {msg}");
    }

    #[test]
    fn unsupported_extension_display() {
        let e = ImposeError::UnsupportedExtension {
            filename: "label.webp".into(),
        };
        assert!(e.to_string().contains("label.webp"));
        assert!(e.to_string().contains(".png"));
    }

    #[test]
    fn smtp_not_configured_names_the_var() {
        let e = ImposeError::SmtpNotConfigured {
            var: "SIXUP_SMTP_PASSWORD".into(),
        };
        assert!(e.to_string().contains("SIXUP_SMTP_PASSWORD"));
    }

    #[test]
    fn dispatch_failed_display() {
        let e = ImposeError::DispatchFailed {
            filename: "label_sheet.pdf".into(),
            detail: "connection refused".into(),
        };
        assert!(e.to_string().contains("label_sheet.pdf"));
        assert!(e.to_string().contains("connection refused"));
    }

    #[test]
    fn recognize_engine_unavailable_display() {
        let e = RecognizeError::EngineUnavailable {
            engine: "tesseract".into(),
            detail: "No such file or directory".into(),
        };
        assert!(e.to_string().contains("tesseract"));
    }
}
