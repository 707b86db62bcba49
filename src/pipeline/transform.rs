//! Image transformation: crop, colour conversion, and resizing.
//!
//! The stage takes the decoded source and produces one raster of exactly
//! the target pixel size, in the requested colour path:
//!
//! 1. **Crop** — either the automatic dark-content bounding box or a fixed
//!    millimetre trim from all four edges.
//! 2. **Resize** — Lanczos3 to `trunc(width_in * dpi) x trunc(height_in * dpi)`
//!    pixels. Aspect is not preserved; the die-cut stock dictates the target.
//! 3. **Colour** — three-channel (alpha composited over white), single-channel
//!    luminance, or four-channel separation. The CMYK split runs on the
//!    resized raster because the separation has no resampling representation
//!    of its own.

use crate::config::{ColorMode, CropMode, LabelSpec};
use crate::error::ImposeError;
use crate::pipeline::input::SourceImage;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbImage};
use tracing::debug;

/// Luminance below this value counts as label content during auto-crop.
const LUMA_THRESHOLD: u8 = 80;

/// Fraction of histogram tail clipped on each side before thresholding.
const STRETCH_CLIP: f32 = 0.02;

/// The transformed raster, sized and colour-converted, ready to encode.
pub struct TransformedLabel {
    pub width: u32,
    pub height: u32,
    pub color_mode: ColorMode,
    pub pixels: LabelPixels,
}

/// Channel data for the transformed raster.
pub enum LabelPixels {
    /// Three channels, row-major.
    Rgb(RgbImage),
    /// One channel, row-major.
    Gray(GrayImage),
    /// Four channels (C, M, Y, K), row-major, one byte each.
    Cmyk(Vec<u8>),
}

/// Run the full transform for one source image.
pub fn transform(src: &SourceImage, spec: &LabelSpec) -> Result<TransformedLabel, ImposeError> {
    let cropped = match spec.crop {
        CropMode::None => src.image.clone(),
        CropMode::Auto => auto_crop(&src.image),
        CropMode::TrimMm(mm) => trim_mm(&src.image, mm, spec)?,
    };

    let (tw, th) = (spec.px_width(), spec.px_height());
    debug!(
        "Transform: {}x{} -> {}x{} px, {:?}, crop {:?}",
        cropped.width(),
        cropped.height(),
        tw,
        th,
        spec.color_mode,
        spec.crop
    );

    let transformed = match spec.color_mode {
        ColorMode::Rgb => {
            let rgb = composite_over_white(&cropped);
            let resized = DynamicImage::ImageRgb8(rgb).resize_exact(tw, th, FilterType::Lanczos3);
            LabelPixels::Rgb(resized.into_rgb8())
        }
        ColorMode::Gray => {
            let gray = DynamicImage::ImageLuma8(cropped.to_luma8());
            let resized = gray.resize_exact(tw, th, FilterType::Lanczos3);
            LabelPixels::Gray(resized.into_luma8())
        }
        ColorMode::Cmyk => {
            let rgb = composite_over_white(&cropped);
            let resized = DynamicImage::ImageRgb8(rgb).resize_exact(tw, th, FilterType::Lanczos3);
            LabelPixels::Cmyk(rgb_to_cmyk(&resized.into_rgb8()))
        }
    };

    Ok(TransformedLabel {
        width: tw,
        height: th,
        color_mode: spec.color_mode,
        pixels: transformed,
    })
}

/// Crop to the bounding box of dark content.
///
/// Works on a contrast-stretched luminance copy so faint scans still
/// threshold cleanly; the crop itself is applied to the untouched source.
/// An image with no pixel darker than the threshold passes through
/// unchanged.
pub fn auto_crop(img: &DynamicImage) -> DynamicImage {
    let luma = stretch_contrast(&img.to_luma8());

    let (w, h) = luma.dimensions();
    let mut min_x = w;
    let mut min_y = h;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut found = false;

    for (x, y, px) in luma.enumerate_pixels() {
        if px.0[0] < LUMA_THRESHOLD {
            found = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if !found {
        debug!("Auto-crop: no content below threshold, passing through");
        return img.clone();
    }

    let (cw, ch) = (max_x - min_x + 1, max_y - min_y + 1);
    debug!("Auto-crop: bbox ({min_x}, {min_y}) {cw}x{ch}");
    img.crop_imm(min_x, min_y, cw, ch)
}

/// Linear contrast stretch clipping `STRETCH_CLIP` of each histogram tail.
fn stretch_contrast(luma: &GrayImage) -> GrayImage {
    let mut hist = [0u64; 256];
    for px in luma.pixels() {
        hist[px.0[0] as usize] += 1;
    }
    let total: u64 = luma.width() as u64 * luma.height() as u64;
    if total == 0 {
        return luma.clone();
    }
    let clip = (total as f32 * STRETCH_CLIP) as u64;

    let mut lo = 0usize;
    let mut acc = 0u64;
    for (v, &count) in hist.iter().enumerate() {
        acc += count;
        if acc > clip {
            lo = v;
            break;
        }
    }
    let mut hi = 255usize;
    acc = 0;
    for (v, &count) in hist.iter().enumerate().rev() {
        acc += count;
        if acc > clip {
            hi = v;
            break;
        }
    }

    if hi <= lo {
        return luma.clone();
    }

    let range = (hi - lo) as f32;
    let mut out = luma.clone();
    for px in out.pixels_mut() {
        let v = px.0[0] as f32;
        px.0[0] = (((v - lo as f32) / range).clamp(0.0, 1.0) * 255.0) as u8;
    }
    out
}

/// Trim `mm` millimetres of label space from all four edges.
///
/// The millimetre amount is converted to source pixels in proportion to
/// the label's physical size, so a 2 mm trim removes the same physical
/// sliver regardless of the upload's resolution.
fn trim_mm(img: &DynamicImage, mm: f32, spec: &LabelSpec) -> Result<DynamicImage, ImposeError> {
    let (w, h) = (img.width(), img.height());
    let label_w_mm = spec.width_in * 25.4;
    let label_h_mm = spec.height_in * 25.4;

    let trim_x = (mm / label_w_mm * w as f32) as u32;
    let trim_y = (mm / label_h_mm * h as f32) as u32;

    if 2 * trim_x >= w || 2 * trim_y >= h {
        return Err(ImposeError::InvalidConfig(format!(
            "Trimming {mm} mm removes the entire {w}x{h} px image"
        )));
    }

    debug!("Trim: {mm} mm = {trim_x}x{trim_y} px per edge");
    Ok(img.crop_imm(trim_x, trim_y, w - 2 * trim_x, h - 2 * trim_y))
}

/// Flatten any source colour type to three channels over a white background.
fn composite_over_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (src, dst) in rgba.pixels().zip(out.pixels_mut()) {
        let a = src.0[3] as u16;
        for c in 0..3 {
            dst.0[c] = ((src.0[c] as u16 * a + 255 * (255 - a)) / 255) as u8;
        }
    }
    out
}

/// Split a three-channel raster into a four-channel CMYK separation.
fn rgb_to_cmyk(rgb: &RgbImage) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgb.len() / 3 * 4);
    for px in rgb.pixels() {
        let r = px.0[0] as f32 / 255.0;
        let g = px.0[1] as f32 / 255.0;
        let b = px.0[2] as f32 / 255.0;
        let k = 1.0 - r.max(g).max(b);
        let (c, m, y) = if k >= 1.0 {
            (0.0, 0.0, 0.0)
        } else {
            (
                (1.0 - r - k) / (1.0 - k),
                (1.0 - g - k) / (1.0 - k),
                (1.0 - b - k) / (1.0 - k),
            )
        };
        out.push((c * 255.0).round() as u8);
        out.push((m * 255.0).round() as u8);
        out.push((y * 255.0).round() as u8);
        out.push((k * 255.0).round() as u8);
    }
    out
}
