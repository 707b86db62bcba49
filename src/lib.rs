//! # sixup
//!
//! Impose six copies of one label image onto a square, print-ready PDF sheet.
//!
//! ## Why this crate?
//!
//! Packing rooms print self-adhesive produce labels on square sheet stock,
//! six to a sheet. Doing that by hand in a layout tool means re-cropping,
//! re-scaling, and re-placing the same artwork for every new label file.
//! This crate turns one uploaded label image into a finished sheet in a
//! single call: normalised for print, tiled in a fixed 2x3 grid, framed by
//! hairline cutting guides, and optionally named from the label text and
//! e-mailed to prepress.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image file
//!  │
//!  ├─ 1. Input      accept .jpg/.jpeg/.png, decode to a raster
//!  ├─ 2. Transform  crop (auto or fixed trim), colour-convert, resize
//!  ├─ 3. Encode     PNG (RGB/grayscale) or quality-capped CMYK JPEG
//!  ├─ 4. Layout     six cell origins on the sheet, bounds-checked
//!  ├─ 5. Compose    one-page PDF, raster embedded once, referenced six times
//!  ├─ 6. Recognize  optional OCR over the source image → filename
//!  └─ 7. Dispatch   optional SMTP delivery of the attached sheet
//! ```
//!
//! The heart of the crate is [`impose`]: it takes an opened [`SourceImage`]
//! and an [`ImposeConfig`] and returns the finished sheet as bytes plus the
//! derived filename and per-stage timings. [`impose_to_file`] adds an atomic
//! write to disk, and [`Mailer`] sends the result over authenticated SMTP.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sixup::{impose, ColorMode, CropMode, ImposeConfig, SourceImage};
//!
//! fn main() -> Result<(), sixup::ImposeError> {
//!     let src = SourceImage::open(std::path::Path::new("label.jpg"))?;
//!     let config = ImposeConfig::builder()
//!         .dpi(450)
//!         .color_mode(ColorMode::Cmyk)
//!         .crop(CropMode::Auto)
//!         .build()?;
//!     let output = impose(&src, &config)?;
//!     eprintln!("{} ({} KB)", output.filename, output.approx_kib());
//!     std::fs::write(&output.filename, &output.pdf)
//!         .map_err(|e| sixup::ImposeError::OutputWriteFailed {
//!             path: output.filename.clone().into(),
//!             source: e,
//!         })?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `sixup` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! sixup = { version = "0.4", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod dispatch;
pub mod error;
pub mod impose;
pub mod output;
pub mod pipeline;
pub mod recognize;

// ── Re-exports: the public surface ───────────────────────────────────────

pub use config::{
    ColorMode, CropMode, ImposeConfig, ImposeConfigBuilder, LabelSpec, PlacementPolicy, SheetSpec,
};
pub use dispatch::{Mailer, SmtpConfig};
pub use error::{ImposeError, RecognizeError};
pub use impose::{impose, impose_to_file};
pub use output::{ImposeOutput, ImposeStats};
pub use pipeline::input::SourceImage;
pub use recognize::{LabelTags, OcrEngine, TesseractCli, FALLBACK_FILENAME};
