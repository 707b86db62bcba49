//! Output types for label imposition.
//!
//! One imposition run produces exactly one [`ImposeOutput`]: the finished
//! PDF bytes, the filename they should be saved or mailed under, and the
//! run statistics. The value is immutable; download and dispatch both take
//! it by reference, and a new run replaces it wholesale.

use serde::{Deserialize, Serialize};

/// The result of one imposition run.
#[derive(Debug, Clone)]
pub struct ImposeOutput {
    /// The finished single-page PDF.
    pub pdf: Vec<u8>,
    /// Filename for the PDF, either recognised from the label text or the
    /// fixed default.
    pub filename: String,
    /// Statistics about the run.
    pub stats: ImposeStats,
}

impl ImposeOutput {
    /// Approximate artifact size in KiB, for human-facing reports.
    pub fn approx_kib(&self) -> u64 {
        (self.pdf.len() as u64).div_ceil(1024)
    }
}

/// Statistics about a single imposition run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImposeStats {
    /// Transformed raster width in pixels.
    pub label_px_width: u32,
    /// Transformed raster height in pixels.
    pub label_px_height: u32,
    /// Format tag of the embedded raster ("png" or "jpeg").
    pub encoded_format: String,
    /// Size of the encoded raster in bytes.
    pub encoded_bytes: usize,
    /// Size of the finished PDF in bytes.
    pub pdf_bytes: usize,
    /// Time spent decoding and transforming the source image.
    pub transform_duration_ms: u64,
    /// Time spent re-encoding the raster.
    pub encode_duration_ms: u64,
    /// Time spent composing the PDF sheet.
    pub compose_duration_ms: u64,
    /// Time spent on label recognition, if it ran.
    pub recognize_duration_ms: Option<u64>,
    /// Total wall-clock time for the run.
    pub total_duration_ms: u64,
}
