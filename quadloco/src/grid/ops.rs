//! Raster operations: gradient field, border fill, bilinear sampling,
//! range scans, and sub-grid copies.

use super::{ChipSpec, Grid, RowCol, SizeHW};
use crate::geom::{Grad, Span, Spot};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Gradient of a float raster by centered half-step differences.
///
/// Each axis is differenced independently (this is not a cross-window
/// filter):
///
/// ```text
/// g.row = (src(r+h, c) - src(r-h, c)) / (2h)
/// g.col = (src(r, c+h) - src(r, c-h)) / (2h)
/// ```
///
/// The `step_half` border is filled with the invalid gradient. An input too
/// small to hold any interior yields a fully invalid grid of the same shape.
pub fn gradient_grid_for(src: &Grid<f32>, step_half: usize) -> Grid<Grad> {
    let hw = src.hw();
    let mut grads = Grid::filled(hw, Grad::NULL);

    let step_full = 2 * step_half;
    if !(step_full < hw.high && step_full < hw.wide) {
        return grads;
    }

    let scl = 1.0f32 / step_full as f32;
    let row_for = |row: usize, out_row: &mut [Grad]| {
        for col in step_half..(hw.wide - step_half) {
            let row_grad = scl * (src.get(row + step_half, col) - src.get(row - step_half, col));
            let col_grad = scl * (src.get(row, col + step_half) - src.get(row, col - step_half));
            out_row[col] = Grad::new(row_grad as f64, col_grad as f64);
        }
    };

    #[cfg(feature = "parallel")]
    {
        let wide = hw.wide;
        grads
            .as_mut_slice()
            .par_chunks_mut(wide)
            .enumerate()
            .for_each(|(row, out_row)| {
                if step_half <= row && row < hw.high - step_half {
                    row_for(row, out_row);
                }
            });
    }

    #[cfg(not(feature = "parallel"))]
    {
        for row in step_half..(hw.high - step_half) {
            let beg = row * hw.wide;
            let wide = hw.wide;
            row_for(row, &mut grads.as_mut_slice()[beg..beg + wide]);
        }
    }

    grads
}

/// Overwrite an `n_pad`-cell-thick border with `value`.
pub fn fill_border<T: Clone>(grid: &mut Grid<T>, n_pad: usize, value: T) {
    let high = grid.high();
    let wide = grid.wide();
    let pad = n_pad.min(high).min(wide);
    for row in 0..high {
        let edge_row = row < pad || high - pad <= row;
        for col in 0..wide {
            if edge_row || col < pad || wide - pad <= col {
                *grid.get_mut(row, col) = value.clone();
            }
        }
    }
}

/// Bilinear interpolation of the raster at `at` (row, col), treating each
/// cell value as the sample at the cell center (r+0.5, c+0.5); NaN when
/// the 2x2 support does not lie fully inside the grid.
pub fn bilin_value_at(grid: &Grid<f32>, at: Spot) -> f32 {
    if !at.is_valid() {
        return f32::NAN;
    }
    let at_row = at.row - 0.5;
    let at_col = at.col - 0.5;
    if at_row < 0. || at_col < 0. {
        return f32::NAN;
    }
    let row1 = at_row.floor() as usize;
    let col1 = at_col.floor() as usize;
    let (row2, col2) = (row1 + 1, col1 + 1);
    if grid.high() <= row2 || grid.wide() <= col2 {
        return f32::NAN;
    }

    let val11 = *grid.get(row1, col1);
    let val21 = *grid.get(row2, col1);
    let val12 = *grid.get(row1, col2);
    let val22 = *grid.get(row2, col2);

    let frac_row = (at_row - row1 as f64) as f32;
    let frac_col = (at_col - col1 as f64) as f32;

    let val_a = val11 + frac_row * (val21 - val11);
    let val_b = val12 + frac_row * (val22 - val12);
    val_a + frac_col * (val_b - val_a)
}

/// Smallest and largest finite values, ignoring invalid cells.
pub fn valid_min_max(grid: &Grid<f32>) -> Option<(f32, f32)> {
    let mut min_max: Option<(f32, f32)> = None;
    for &value in grid.iter() {
        if !value.is_finite() {
            continue;
        }
        min_max = Some(match min_max {
            None => (value, value),
            Some((lo, hi)) => (lo.min(value), hi.max(value)),
        });
    }
    min_max
}

/// Span running from the smallest valid value to just past the largest, so
/// the largest observed value maps strictly inside the (half-open) span.
pub fn full_span_for(grid: &Grid<f32>) -> Span {
    match valid_min_max(grid) {
        None => Span::NULL,
        Some((lo, hi)) => {
            let lo = lo as f64;
            let hi = hi as f64;
            let bump = ((hi - lo) * 1e-6).max(hi.abs() * 1e-12).max(1e-9);
            Span::new(lo, hi + bump)
        }
    }
}

/// Byte grid widened to float values.
pub fn real_grid_of(src: &Grid<u8>) -> Grid<f32> {
    Grid::from_vec(src.hw(), src.iter().map(|&v| v as f32).collect())
}

/// Nearest-neighbor upsample by an integer factor.
pub fn larger_grid<T: Clone>(src: &Grid<T>, up_factor: usize) -> Grid<T> {
    let hw = SizeHW::new(up_factor * src.high(), up_factor * src.wide());
    let mut out = Vec::with_capacity(hw.size());
    for row in 0..hw.high {
        for col in 0..hw.wide {
            out.push(src.get(row / up_factor, col / up_factor).clone());
        }
    }
    Grid::from_vec(hw, out)
}

/// Copy of the chip region out of `full`; empty grid when the chip does not
/// fit.
pub fn sub_grid_values_from<T: Clone>(full: &Grid<T>, chip: &ChipSpec) -> Grid<T> {
    if !chip.fits_into(full.hw()) {
        return Grid::empty();
    }
    let mut out = Vec::with_capacity(chip.hw.size());
    for row in 0..chip.high() {
        for col in 0..chip.wide() {
            let full_rc = chip.full_rc_for_chip_rc(RowCol::new(row, col));
            out.push(full.at(full_rc).clone());
        }
    }
    Grid::from_vec(chip.hw, out)
}

/// Paste `chip_data` into `full` with its origin at `rc0`; false when the
/// region does not fit.
pub fn set_sub_grid_inside<T: Clone>(full: &mut Grid<T>, chip_data: &Grid<T>, rc0: RowCol) -> bool {
    let chip = ChipSpec::new(rc0, chip_data.hw());
    if !chip.fits_into(full.hw()) {
        return false;
    }
    for row in 0..chip.high() {
        for col in 0..chip.wide() {
            let full_rc = chip.full_rc_for_chip_rc(RowCol::new(row, col));
            *full.at_mut(full_rc) = chip_data.get(row, col).clone();
        }
    }
    true
}
