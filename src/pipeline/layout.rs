//! Placement geometry: six cell origins on the sheet.
//!
//! Pure computation, no I/O. All values are in PDF points with the origin
//! at the bottom-left corner of the sheet, matching PDF user space. The
//! grid is fixed at 2 columns by 3 rows; the three policies differ only in
//! how the gaps and offsets are derived.
//!
//! Any parameter set that would push a cell outside the sheet is rejected
//! here with a descriptive error. Nothing is ever clamped into place; a
//! silently shifted cell would cut through the neighbouring label at the
//! guillotine.

use crate::config::{LabelSpec, PlacementPolicy, SheetSpec, PT_PER_MM};
use crate::error::ImposeError;

/// Columns in the imposition grid.
pub const GRID_COLS: u32 = 2;
/// Rows in the imposition grid.
pub const GRID_ROWS: u32 = 3;

/// Tolerance for the bounds check, to absorb float noise at the sheet edge.
const EDGE_EPSILON: f32 = 1e-3;

/// The six cell origins, derived per run and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementGrid {
    /// Bottom-left corner of each cell in points, row-major from the top
    /// row down (row 0 col 0, row 0 col 1, row 1 col 0, ...).
    pub origins: [(f32, f32); 6],
    /// Cell width in points.
    pub cell_w: f32,
    /// Cell height in points.
    pub cell_h: f32,
    /// Sheet side length in points.
    pub side: f32,
}

/// Compute the placement grid for the given label and sheet.
pub fn compute_grid(label: &LabelSpec, sheet: &SheetSpec) -> Result<PlacementGrid, ImposeError> {
    let w = label.pt_width();
    let h = label.pt_height();
    let side = sheet.side_pt();

    let mut origins = [(0.0f32, 0.0f32); 6];
    let mut i = 0;
    for row in 0..GRID_ROWS {
        for col in 0..GRID_COLS {
            let (x, y) = cell_origin(&sheet.placement, col, row, w, h, side);
            check_bounds(col, row, x, y, w, h, side)?;
            origins[i] = (x, y);
            i += 1;
        }
    }

    Ok(PlacementGrid {
        origins,
        cell_w: w,
        cell_h: h,
        side,
    })
}

/// Origin of one cell under the given policy.
fn cell_origin(
    policy: &PlacementPolicy,
    col: u32,
    row: u32,
    w: f32,
    h: f32,
    side: f32,
) -> (f32, f32) {
    let (col, row) = (col as f32, row as f32);
    match *policy {
        PlacementPolicy::Centered => {
            let h_gap = (side - 2.0 * w) / 3.0;
            let v_gap = (side - 3.0 * h) / 4.0;
            (h_gap + col * (w + h_gap), side - (row + 1.0) * (h + v_gap))
        }
        PlacementPolicy::Margins {
            top,
            left,
            h_gap,
            v_gap,
        } => (
            left + col * (w + h_gap),
            side - top - h - row * (h + v_gap),
        ),
        PlacementPolicy::GripperGutter {
            gripper_mm,
            gutter_mm,
        } => {
            let gripper = gripper_mm * PT_PER_MM;
            let gutter = gutter_mm * PT_PER_MM;
            let left = (side - (2.0 * w + gutter)) / 2.0;
            (
                left + col * (w + gutter),
                side - gripper - h - row * (h + gutter),
            )
        }
    }
}

/// Reject any cell that would land outside `[0, side]` on either axis.
fn check_bounds(
    col: u32,
    row: u32,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    side: f32,
) -> Result<(), ImposeError> {
    let (x1, y1) = (x + w, y + h);
    if x < -EDGE_EPSILON || y < -EDGE_EPSILON || x1 > side + EDGE_EPSILON || y1 > side + EDGE_EPSILON
    {
        return Err(ImposeError::Geometry {
            col,
            row,
            x0: x,
            y0: y,
            x1,
            y1,
            side,
        });
    }
    Ok(())
}
