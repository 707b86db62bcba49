//! Raster encoding: one in-memory buffer per run.
//!
//! The one- and three-channel paths encode as lossless PNG so text edges
//! survive untouched. The four-channel path has to be JPEG: PDF embeds CMYK
//! raster data either raw or as a DCT stream, and PNG has no four-channel
//! representation. The JPEG is written without chroma subsampling (CMYK scan
//! lines are never subsampled), so the only loss is the DCT quantisation at
//! the configured quality.
//!
//! Exactly one `EncodedLabel` is produced per run and reused for all six
//! placements.

use crate::config::ColorMode;
use crate::error::ImposeError;
use crate::pipeline::transform::{LabelPixels, TransformedLabel};
use std::io::Cursor;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::debug;

/// Container format of the encoded raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodedFormat {
    Png,
    Jpeg,
}

impl EncodedFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            EncodedFormat::Png => "png",
            EncodedFormat::Jpeg => "jpeg",
        }
    }
}

/// The single encoded raster embedded into the PDF.
pub struct EncodedLabel {
    pub format: EncodedFormat,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub color_mode: ColorMode,
}

/// Encode the transformed raster into its one in-memory buffer.
pub fn encode_label(label: &TransformedLabel, jpeg_quality: u8) -> Result<EncodedLabel, ImposeError> {
    let (format, bytes) = match &label.pixels {
        LabelPixels::Rgb(rgb) => {
            let mut buf = Vec::new();
            rgb.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
                .map_err(|e| ImposeError::EncodeFailed {
                    format: "png".into(),
                    detail: e.to_string(),
                })?;
            (EncodedFormat::Png, buf)
        }
        LabelPixels::Gray(gray) => {
            let mut buf = Vec::new();
            gray.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
                .map_err(|e| ImposeError::EncodeFailed {
                    format: "png".into(),
                    detail: e.to_string(),
                })?;
            (EncodedFormat::Png, buf)
        }
        LabelPixels::Cmyk(data) => {
            let buf = encode_cmyk_jpeg(data, label.width, label.height, jpeg_quality)?;
            (EncodedFormat::Jpeg, buf)
        }
    };

    debug!(
        "Encoded {}x{} {:?} raster as {} ({} bytes)",
        label.width,
        label.height,
        label.color_mode,
        format.as_str(),
        bytes.len()
    );

    Ok(EncodedLabel {
        format,
        bytes,
        width: label.width,
        height: label.height,
        color_mode: label.color_mode,
    })
}

/// Encode four-channel scan lines as a CMYK JPEG at the given quality.
///
/// mozjpeg aborts via panic on internal errors, so the whole call is fenced
/// with `catch_unwind` and surfaced as an [`ImposeError::EncodeFailed`].
fn encode_cmyk_jpeg(
    data: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, ImposeError> {
    let result = catch_unwind(AssertUnwindSafe(|| -> std::io::Result<Vec<u8>> {
        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_CMYK);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(quality as f32);
        let mut writer = comp.start_compress(Vec::new())?;
        writer.write_scanlines(data)?;
        writer.finish()
    }));

    match result {
        Ok(Ok(buf)) => Ok(buf),
        Ok(Err(e)) => Err(ImposeError::EncodeFailed {
            format: "jpeg".into(),
            detail: e.to_string(),
        }),
        Err(_) => Err(ImposeError::EncodeFailed {
            format: "jpeg".into(),
            detail: "CMYK JPEG encoder aborted".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn rgb_label(w: u32, h: u32) -> TransformedLabel {
        TransformedLabel {
            width: w,
            height: h,
            color_mode: ColorMode::Rgb,
            pixels: LabelPixels::Rgb(RgbImage::from_pixel(w, h, Rgb([200, 30, 90]))),
        }
    }

    #[test]
    fn rgb_encodes_as_png() {
        let enc = encode_label(&rgb_label(16, 12), 95).unwrap();
        assert_eq!(enc.format, EncodedFormat::Png);
        assert_eq!(&enc.bytes[..4], b"\x89PNG");
        assert_eq!((enc.width, enc.height), (16, 12));
    }

    #[test]
    fn gray_encodes_as_png() {
        let label = TransformedLabel {
            width: 16,
            height: 12,
            color_mode: ColorMode::Gray,
            pixels: LabelPixels::Gray(GrayImage::from_pixel(16, 12, Luma([60]))),
        };
        let enc = encode_label(&label, 95).unwrap();
        assert_eq!(enc.format, EncodedFormat::Png);
        assert_eq!(&enc.bytes[..4], b"\x89PNG");
    }

    #[test]
    fn cmyk_encodes_as_jpeg() {
        let label = TransformedLabel {
            width: 16,
            height: 12,
            color_mode: ColorMode::Cmyk,
            pixels: LabelPixels::Cmyk(vec![128u8; 16 * 12 * 4]),
        };
        let enc = encode_label(&label, 90).unwrap();
        assert_eq!(enc.format, EncodedFormat::Jpeg);
        assert_eq!(&enc.bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn encode_is_stable_for_identical_input() {
        let a = encode_label(&rgb_label(16, 12), 95).unwrap();
        let b = encode_label(&rgb_label(16, 12), 95).unwrap();
        assert_eq!(a.bytes, b.bytes);
    }
}
