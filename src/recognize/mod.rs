//! Label recognition: derive a descriptive filename from the label text.
//!
//! The recogniser is strictly optional and strictly best-effort. It reads
//! the original source image (not the transformed raster), runs an external
//! OCR engine behind the [`OcrEngine`] trait, and mines the raw text for
//! the tags a packing-room operator names a sheet by. Any failure along the
//! way degrades to [`FALLBACK_FILENAME`]; recognition can never abort an
//! imposition run.

pub mod engine;
pub mod extract;

pub use engine::{OcrEngine, TesseractCli};
pub use extract::{extract_tags, LabelTags};

use image::DynamicImage;
use std::time::Instant;
use tracing::{debug, warn};

/// Filename used when recognition is off, fails, or finds nothing.
pub const FALLBACK_FILENAME: &str = "label_sheet.pdf";

/// Run the engine over the source image and render a filename.
///
/// Returns [`FALLBACK_FILENAME`] on any engine or extraction failure.
pub fn recognize_filename(engine: &dyn OcrEngine, image: &DynamicImage) -> String {
    let start = Instant::now();
    match engine.recognize(image) {
        Ok(text) if !text.trim().is_empty() => {
            let tags = extract_tags(&text);
            let filename = tags.filename();
            debug!(
                "Recognition ({}) took {}ms: '{}'",
                engine.name(),
                start.elapsed().as_millis(),
                filename
            );
            filename
        }
        Ok(_) => {
            warn!("OCR engine '{}' returned no text, using fallback name", engine.name());
            FALLBACK_FILENAME.to_string()
        }
        Err(e) => {
            warn!("Recognition failed ({e}), using fallback name");
            FALLBACK_FILENAME.to_string()
        }
    }
}
