//! Sheet composition: one single-page PDF with six placements.
//!
//! The encoded raster becomes exactly one image XObject in the document;
//! the six cells each reference it with their own placement transform, so
//! the PDF stays a sixth of the size a naive embed-per-cell would produce.
//! Every cell also gets a stroked, unfilled rectangle of identical bounds
//! as a cutting guide.
//!
//! PNG-encoded rasters are unpacked to raw samples because PDF embeds
//! raster streams either raw (flate) or as DCT; the CMYK JPEG passes
//! through untouched with a DCT filter tag.

use crate::config::{ColorMode, PT_PER_MM};
use crate::error::ImposeError;
use crate::pipeline::encode::{EncodedFormat, EncodedLabel};
use crate::pipeline::layout::PlacementGrid;
use printpdf::{
    Color, ColorBits, ColorSpace, ImageFilter, ImageTransform, ImageXObject, Line, Mm,
    PdfDocument, PdfLayerReference, Point, Px, Rgb,
};
use tracing::debug;

/// Stroke width of the cutting guides in points.
const GUIDE_STROKE_PT: f32 = 0.1;

fn pt_to_mm(pt: f32) -> Mm {
    Mm(pt / PT_PER_MM)
}

/// Compose the one-page sheet PDF from the encoded raster and the grid.
pub fn compose_sheet(
    encoded: &EncodedLabel,
    grid: &PlacementGrid,
    title: &str,
) -> Result<Vec<u8>, ImposeError> {
    let side_mm = pt_to_mm(grid.side);
    let (doc, page, layer) = PdfDocument::new(title, side_mm, side_mm, "Layer 1");
    let layer = doc.get_page(page).get_layer(layer);

    let xobject = build_xobject(encoded)?;
    // one XObject, six references
    let xref = layer.add_image(xobject);
    for &(x, y) in &grid.origins {
        layer.use_xobject(
            xref.clone(),
            ImageTransform {
                translate_x: Some(pt_to_mm(x)),
                translate_y: Some(pt_to_mm(y)),
                // scale applies to the XObject's unit square, in points
                scale_x: Some(grid.cell_w),
                scale_y: Some(grid.cell_h),
                ..Default::default()
            },
        );
    }

    draw_guides(&layer, grid);

    let bytes = doc
        .save_to_bytes()
        .map_err(|e| ImposeError::PdfFailed {
            detail: e.to_string(),
        })?;
    debug!(
        "Composed sheet: {:.0}x{:.0} pt, {} bytes",
        grid.side,
        grid.side,
        bytes.len()
    );
    Ok(bytes)
}

/// Turn the encoded raster into the single image XObject.
fn build_xobject(encoded: &EncodedLabel) -> Result<ImageXObject, ImposeError> {
    let (color_space, image_data, image_filter) = match (encoded.format, encoded.color_mode) {
        (EncodedFormat::Png, ColorMode::Rgb) => {
            (ColorSpace::Rgb, decode_png(encoded)?, None)
        }
        (EncodedFormat::Png, _) => (ColorSpace::Greyscale, decode_png(encoded)?, None),
        // the JPEG stream is embedded as-is; the viewer runs the DCT decode
        (EncodedFormat::Jpeg, _) => (
            ColorSpace::Cmyk,
            encoded.bytes.clone(),
            Some(ImageFilter::DCT),
        ),
    };

    Ok(ImageXObject {
        width: Px(encoded.width as usize),
        height: Px(encoded.height as usize),
        color_space,
        bits_per_component: ColorBits::Bit8,
        interpolate: false,
        image_data,
        image_filter,
        clipping_bbox: None,
        smask: None,
    })
}

/// Unpack a PNG buffer back to raw samples in its encoded channel layout.
fn decode_png(encoded: &EncodedLabel) -> Result<Vec<u8>, ImposeError> {
    let img = image::load_from_memory_with_format(&encoded.bytes, image::ImageFormat::Png)
        .map_err(|e| ImposeError::PdfFailed {
            detail: format!("re-reading encoded raster: {e}"),
        })?;
    Ok(match encoded.color_mode {
        ColorMode::Rgb => img.into_rgb8().into_raw(),
        _ => img.into_luma8().into_raw(),
    })
}

/// Stroke one hairline rectangle per cell.
fn draw_guides(layer: &PdfLayerReference, grid: &PlacementGrid) {
    layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    layer.set_outline_thickness(GUIDE_STROKE_PT);

    for &(x, y) in &grid.origins {
        let rect = Line {
            points: vec![
                (Point::new(pt_to_mm(x), pt_to_mm(y)), false),
                (Point::new(pt_to_mm(x + grid.cell_w), pt_to_mm(y)), false),
                (
                    Point::new(pt_to_mm(x + grid.cell_w), pt_to_mm(y + grid.cell_h)),
                    false,
                ),
                (Point::new(pt_to_mm(x), pt_to_mm(y + grid.cell_h)), false),
            ],
            is_closed: true,
        };
        layer.add_line(rect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LabelSpec, SheetSpec};
    use crate::pipeline::layout::compute_grid;

    fn tiny_encoded_rgb() -> EncodedLabel {
        let rgb = image::RgbImage::from_pixel(8, 6, image::Rgb([180, 20, 70]));
        let mut buf = Vec::new();
        rgb.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        EncodedLabel {
            format: EncodedFormat::Png,
            bytes: buf,
            width: 8,
            height: 6,
            color_mode: ColorMode::Rgb,
        }
    }

    fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
        haystack
            .windows(needle.len())
            .filter(|w| *w == needle)
            .count()
    }

    #[test]
    fn produces_a_pdf() {
        let grid = compute_grid(&LabelSpec::default(), &SheetSpec::default()).unwrap();
        let pdf = compose_sheet(&tiny_encoded_rgb(), &grid, "test sheet").unwrap();
        assert_eq!(&pdf[..5], b"%PDF-");
    }

    #[test]
    fn raster_is_embedded_exactly_once() {
        let grid = compute_grid(&LabelSpec::default(), &SheetSpec::default()).unwrap();
        let pdf = compose_sheet(&tiny_encoded_rgb(), &grid, "test sheet").unwrap();
        // one /XObject image dictionary, six references to it
        assert_eq!(count_occurrences(&pdf, b"/Subtype /Image"), 1);
    }

    #[test]
    fn decode_png_round_trips_rgb_samples() {
        let enc = tiny_encoded_rgb();
        let raw = decode_png(&enc).unwrap();
        assert_eq!(raw.len(), 8 * 6 * 3);
        assert_eq!(&raw[..3], &[180, 20, 70]);
    }
}
