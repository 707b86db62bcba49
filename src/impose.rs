//! Top-level orchestration: one source image in, one imposed sheet out.
//!
//! ```text
//! SourceImage ──► transform ──► encode ──► compose ──► ImposeOutput
//!      │                          layout ──┘               ▲
//!      └───────── recognize (optional, best-effort) ───────┘
//! ```
//!
//! Each stage is timed into [`ImposeStats`]. Recognition runs over the
//! untouched source image, never the transformed raster, and can only
//! affect the filename. A recognition failure degrades to the fallback
//! name; every other stage failure aborts the run with an error.

use crate::config::ImposeConfig;
use crate::error::ImposeError;
use crate::output::{ImposeOutput, ImposeStats};
use crate::pipeline::compose::compose_sheet;
use crate::pipeline::encode::encode_label;
use crate::pipeline::input::SourceImage;
use crate::pipeline::layout::compute_grid;
use crate::pipeline::transform::transform;
use crate::recognize::{recognize_filename, OcrEngine, TesseractCli, FALLBACK_FILENAME};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Impose the source image onto a sheet according to the configuration.
pub fn impose(src: &SourceImage, config: &ImposeConfig) -> Result<ImposeOutput, ImposeError> {
    let total_start = Instant::now();
    debug!(
        "Imposing '{}' ({}x{} px source)",
        src.filename,
        src.image.width(),
        src.image.height()
    );

    // ── Step 1: transform the label raster ──────────────────────────────
    let stage = Instant::now();
    let transformed = transform(src, &config.label)?;
    let transform_duration_ms = stage.elapsed().as_millis() as u64;

    // ── Step 2: encode for embedding ────────────────────────────────────
    let stage = Instant::now();
    let encoded = encode_label(&transformed, config.jpeg_quality)?;
    let encode_duration_ms = stage.elapsed().as_millis() as u64;

    // ── Step 3: place six cells on the sheet ────────────────────────────
    let grid = compute_grid(&config.label, &config.sheet)?;

    // ── Step 4: recognise a filename (optional) ─────────────────────────
    let (filename, recognize_duration_ms) = if config.recognize {
        let stage = Instant::now();
        let engine = resolve_engine(config);
        let name = recognize_filename(engine.as_ref(), &src.image);
        (name, Some(stage.elapsed().as_millis() as u64))
    } else {
        (FALLBACK_FILENAME.to_string(), None)
    };

    // ── Step 5: compose the single-page PDF ─────────────────────────────
    let stage = Instant::now();
    let title = filename.trim_end_matches(".pdf");
    let pdf = compose_sheet(&encoded, &grid, title)?;
    let compose_duration_ms = stage.elapsed().as_millis() as u64;

    let stats = ImposeStats {
        label_px_width: transformed.width,
        label_px_height: transformed.height,
        encoded_format: encoded.format.as_str().to_string(),
        encoded_bytes: encoded.bytes.len(),
        pdf_bytes: pdf.len(),
        transform_duration_ms,
        encode_duration_ms,
        compose_duration_ms,
        recognize_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Imposed '{}' -> '{}' ({} KB) in {}ms",
        src.filename,
        filename,
        pdf.len().div_ceil(1024),
        stats.total_duration_ms
    );

    Ok(ImposeOutput {
        pdf,
        filename,
        stats,
    })
}

/// Impose and write the sheet to `path`, creating parent directories.
///
/// The PDF is written to a temporary sibling first and renamed into
/// place, so a crash mid-write never leaves a truncated sheet behind.
pub fn impose_to_file(
    src: &SourceImage,
    path: &Path,
    config: &ImposeConfig,
) -> Result<ImposeStats, ImposeError> {
    let output = impose(src, config)?;

    let io_err = |source: std::io::Error| ImposeError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let tmp = path.with_extension("pdf.tmp");
    std::fs::write(&tmp, &output.pdf).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;

    debug!("Wrote {} bytes to {}", output.pdf.len(), path.display());
    Ok(output.stats)
}

/// The engine from the configuration, or the default tesseract CLI.
fn resolve_engine(config: &ImposeConfig) -> Arc<dyn OcrEngine> {
    match &config.ocr_engine {
        Some(engine) => Arc::clone(engine),
        None => Arc::new(TesseractCli::default()),
    }
}
