//! Configuration types for label imposition.
//!
//! All imposition behaviour is controlled through [`ImposeConfig`], built via
//! its [`ImposeConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across calls, serialise the plain-data parts for
//! logging, and diff two runs to understand why their outputs differ.
//!
//! The physical label size is fixed by the die-cut stock; everything else
//! (resolution, colour path, cropping, sheet geometry) is a knob.

use crate::error::ImposeError;
use crate::recognize::OcrEngine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Label width in inches, fixed by the die-cut stock.
pub const LABEL_WIDTH_IN: f32 = 4.072965;
/// Label height in inches, fixed by the die-cut stock.
pub const LABEL_HEIGHT_IN: f32 = 2.56757;

/// Points per inch in PDF user space.
pub const PT_PER_IN: f32 = 72.0;
/// Points per millimetre.
pub const PT_PER_MM: f32 = 72.0 / 25.4;

/// Physical description of one label and how its raster is prepared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelSpec {
    /// Label width in inches. Fixed at [`LABEL_WIDTH_IN`].
    pub width_in: f32,
    /// Label height in inches. Fixed at [`LABEL_HEIGHT_IN`].
    pub height_in: f32,
    /// Raster resolution in dots per inch. Range: 300-600. Default: 450.
    ///
    /// 450 DPI keeps small type on a 4-inch label legible after the press
    /// screens it. 300 is the floor any printer will accept; above 600 the
    /// extra pixels only inflate the file.
    pub dpi: u32,
    /// Colour path the raster is converted to before embedding.
    pub color_mode: ColorMode,
    /// Border handling applied before resizing.
    pub crop: CropMode,
}

impl Default for LabelSpec {
    fn default() -> Self {
        Self {
            width_in: LABEL_WIDTH_IN,
            height_in: LABEL_HEIGHT_IN,
            dpi: 450,
            color_mode: ColorMode::default(),
            crop: CropMode::default(),
        }
    }
}

impl LabelSpec {
    /// Target raster width in pixels. Fractional pixels are truncated.
    pub fn px_width(&self) -> u32 {
        (self.width_in * self.dpi as f32) as u32
    }

    /// Target raster height in pixels. Fractional pixels are truncated.
    pub fn px_height(&self) -> u32 {
        (self.height_in * self.dpi as f32) as u32
    }

    /// Label width in points.
    pub fn pt_width(&self) -> f32 {
        self.width_in * PT_PER_IN
    }

    /// Label height in points.
    pub fn pt_height(&self) -> f32 {
        self.height_in * PT_PER_IN
    }
}

/// Geometry of the square output sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetSpec {
    /// Side length of the square sheet in inches. Default: 9.0.
    pub side_in: f32,
    /// How the six cells are placed on the sheet.
    pub placement: PlacementPolicy,
}

impl Default for SheetSpec {
    fn default() -> Self {
        Self {
            side_in: 9.0,
            placement: PlacementPolicy::default(),
        }
    }
}

impl SheetSpec {
    /// Sheet side length in points.
    pub fn side_pt(&self) -> f32 {
        self.side_in * PT_PER_IN
    }
}

/// Configuration for one imposition run.
///
/// Built via [`ImposeConfig::builder()`] or using
/// [`ImposeConfig::default()`].
///
/// # Example
/// ```rust
/// use sixup::{ColorMode, CropMode, ImposeConfig};
///
/// let config = ImposeConfig::builder()
///     .dpi(450)
///     .color_mode(ColorMode::Cmyk)
///     .crop(CropMode::Auto)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ImposeConfig {
    /// Label raster preparation.
    pub label: LabelSpec,

    /// Sheet geometry and cell placement.
    pub sheet: SheetSpec,

    /// JPEG quality for the four-channel path. Range: 85-95. Default: 95.
    ///
    /// Only the CMYK path is lossy; PNG carries the one- and three-channel
    /// paths losslessly. Chroma subsampling is always off so fine rules and
    /// small type survive the press.
    pub jpeg_quality: u8,

    /// Derive the output filename by reading the label text. Default: false.
    ///
    /// Recognition is best-effort: any engine or extraction failure falls
    /// back to the fixed default filename and the run continues.
    pub recognize: bool,

    /// Pre-constructed OCR engine. If None and `recognize` is set, the
    /// default `tesseract` subprocess engine is used.
    pub ocr_engine: Option<Arc<dyn OcrEngine>>,
}

impl Default for ImposeConfig {
    fn default() -> Self {
        Self {
            label: LabelSpec::default(),
            sheet: SheetSpec::default(),
            jpeg_quality: 95,
            recognize: false,
            ocr_engine: None,
        }
    }
}

impl fmt::Debug for ImposeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImposeConfig")
            .field("label", &self.label)
            .field("sheet", &self.sheet)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("recognize", &self.recognize)
            .field("ocr_engine", &self.ocr_engine.as_ref().map(|e| e.name()))
            .finish()
    }
}

impl ImposeConfig {
    /// Create a new builder for `ImposeConfig`.
    pub fn builder() -> ImposeConfigBuilder {
        ImposeConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ImposeConfig`].
#[derive(Debug)]
pub struct ImposeConfigBuilder {
    config: ImposeConfig,
}

impl ImposeConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.label.dpi = dpi.clamp(300, 600);
        self
    }

    pub fn color_mode(mut self, mode: ColorMode) -> Self {
        self.config.label.color_mode = mode;
        self
    }

    pub fn crop(mut self, crop: CropMode) -> Self {
        self.config.label.crop = crop;
        self
    }

    pub fn sheet_side_in(mut self, side: f32) -> Self {
        self.config.sheet.side_in = side;
        self
    }

    pub fn placement(mut self, policy: PlacementPolicy) -> Self {
        self.config.sheet.placement = policy;
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(85, 95);
        self
    }

    pub fn recognize(mut self, v: bool) -> Self {
        self.config.recognize = v;
        self
    }

    pub fn ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.ocr_engine = Some(engine);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Placement bounds are NOT checked here. They depend on the derived
    /// cell size and are validated when the grid is computed, so the error
    /// can name the offending cell.
    pub fn build(self) -> Result<ImposeConfig, ImposeError> {
        let c = &self.config;
        if !(c.sheet.side_in.is_finite() && c.sheet.side_in > 0.0) {
            return Err(ImposeError::InvalidConfig(format!(
                "Sheet side must be a positive length, got {}",
                c.sheet.side_in
            )));
        }
        if let CropMode::TrimMm(mm) = c.label.crop {
            if !(0.0..=5.0).contains(&mm) {
                return Err(ImposeError::InvalidConfig(format!(
                    "Trim must be 0-5 mm, got {mm}"
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Colour path the label raster is converted to before embedding.
///
/// Exactly one path runs per invocation. `Rgb` and `Gray` embed losslessly
/// as PNG; `Cmyk` must go through JPEG because PNG has no four-channel
/// representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Three-channel colour. Alpha and palette inputs are composited over
    /// white. (default)
    #[default]
    Rgb,
    /// Single-channel luminance, the "black plate".
    Gray,
    /// Four-channel print separation.
    Cmyk,
}

/// Border handling applied to the source image before resizing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum CropMode {
    /// Use the source as-is. (default)
    #[default]
    None,
    /// Crop to the dark-content bounding box. An all-light image passes
    /// through unchanged.
    Auto,
    /// Trim a fixed amount, in millimetres of label space, from all four
    /// edges. Accepted range: 0-5 mm.
    TrimMm(f32),
}

/// How the 2x3 grid of cells is placed on the sheet.
///
/// All variants produce the same grid shape; they differ only in how the
/// gaps and offsets are derived. `GripperGutter` is the canonical policy
/// for press output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum PlacementPolicy {
    /// Even gaps on both axes, computed from whatever space the labels
    /// leave over.
    Centered,
    /// Explicit margins and gaps, all in points.
    Margins {
        top: f32,
        left: f32,
        h_gap: f32,
        v_gap: f32,
    },
    /// A gripper margin reserved at the top edge and a uniform gutter
    /// between cells, both in millimetres; the grid is centred
    /// horizontally.
    GripperGutter { gripper_mm: f32, gutter_mm: f32 },
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        PlacementPolicy::GripperGutter {
            gripper_mm: 10.0,
            gutter_mm: 8.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_label_pixel_dims_truncate() {
        let spec = LabelSpec::default();
        // 4.072965 * 450 = 1832.83..., 2.56757 * 450 = 1155.40...
        assert_eq!(spec.px_width(), 1832);
        assert_eq!(spec.px_height(), 1155);
    }

    #[test]
    fn dpi_is_clamped() {
        let config = ImposeConfig::builder().dpi(1200).build().unwrap();
        assert_eq!(config.label.dpi, 600);
        let config = ImposeConfig::builder().dpi(72).build().unwrap();
        assert_eq!(config.label.dpi, 300);
    }

    #[test]
    fn jpeg_quality_is_clamped() {
        let config = ImposeConfig::builder().jpeg_quality(50).build().unwrap();
        assert_eq!(config.jpeg_quality, 85);
        let config = ImposeConfig::builder().jpeg_quality(100).build().unwrap();
        assert_eq!(config.jpeg_quality, 95);
    }

    #[test]
    fn oversize_trim_is_rejected() {
        let err = ImposeConfig::builder()
            .crop(CropMode::TrimMm(7.5))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("0-5 mm"), "got: {err}");
    }

    #[test]
    fn non_positive_sheet_is_rejected() {
        assert!(ImposeConfig::builder().sheet_side_in(0.0).build().is_err());
        assert!(ImposeConfig::builder().sheet_side_in(-9.0).build().is_err());
    }

    #[test]
    fn default_placement_is_gripper_gutter() {
        match SheetSpec::default().placement {
            PlacementPolicy::GripperGutter {
                gripper_mm,
                gutter_mm,
            } => {
                assert_eq!(gripper_mm, 10.0);
                assert_eq!(gutter_mm, 8.0);
            }
            other => panic!("unexpected default: {other:?}"),
        }
    }
}
