//! Anti-podal symmetry-ring filter: an independent center nominator keyed
//! on two-fold rotational symmetry of the local intensity pattern.

use crate::grid::{Grid, RowCol, SizeHW};
use crate::stats::RunningStats;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A raster peak: cell location plus response strength.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PeakRCV {
    pub rc: RowCol,
    pub value: f64,
}

impl PeakRCV {
    pub fn is_valid(&self) -> bool {
        self.value.is_finite()
    }
}

/// Ring offsets at Chebyshev radius `half_size`, one per antipodal pair.
fn ring_pair_offsets(half_size: usize) -> Vec<(isize, isize)> {
    let h = half_size as isize;
    let mut offsets = Vec::with_capacity(4 * half_size);
    for dc in -h..=h {
        offsets.push((h, dc));
    }
    for dr in 1..h {
        offsets.push((dr, h));
        offsets.push((dr, -h));
    }
    // the (0, h) pair closes the half-ring
    offsets.push((0, h));
    offsets
}

/// Symmetry response of one cell against the ring at `half_size`.
///
/// Each antipodal sample pair contributes its squared disagreement and the
/// squared excursion of its mean from the ring mean. The response
///
/// ```text
/// sum(excursion) / (sum(excursion) + sum(disagreement) + guard)
/// ```
///
/// is translation-equivariant, invariant under a 180-degree rotation of
/// the neighborhood, and maximal where antipodal samples agree while the
/// ring values swing about their mean — the signature of a two-fold
/// symmetric intensity structure. The guard term, scaled by the overall
/// image variance, pins the response of flat regions to zero.
fn ring_response(
    src: &Grid<f32>,
    row: usize,
    col: usize,
    offsets: &[(isize, isize)],
    guard: f64,
) -> f64 {
    let mut ring_mean = 0.;
    let mut count = 0.;
    for &(dr, dc) in offsets {
        let val_pos = *src.get((row as isize + dr) as usize, (col as isize + dc) as usize);
        let val_neg = *src.get((row as isize - dr) as usize, (col as isize - dc) as usize);
        if !(val_pos.is_finite() && val_neg.is_finite()) {
            return 0.;
        }
        ring_mean += (val_pos + val_neg) as f64;
        count += 2.;
    }
    ring_mean /= count;

    let mut sum_excursion = 0.;
    let mut sum_disagree = 0.;
    for &(dr, dc) in offsets {
        let val_pos = *src.get((row as isize + dr) as usize, (col as isize + dc) as usize) as f64;
        let val_neg = *src.get((row as isize - dr) as usize, (col as isize - dc) as usize) as f64;
        let pair_mean = 0.5 * (val_pos + val_neg);
        let excursion = pair_mean - ring_mean;
        let disagree = val_pos - val_neg;
        sum_excursion += excursion * excursion;
        sum_disagree += disagree * disagree;
    }

    let denom = sum_excursion + sum_disagree + guard;
    if denom <= 0. {
        return 0.;
    }
    sum_excursion / denom
}

/// Symmetry-ring response grid for one ring half size. Cells closer than
/// `half_size` to the border respond zero.
pub fn sym_ring_grid_for(
    src: &Grid<f32>,
    src_stats: &RunningStats,
    half_size: usize,
) -> Grid<f32> {
    let hw = src.hw();
    let mut resp = Grid::filled(hw, 0.0f32);
    if hw.high <= 2 * half_size || hw.wide <= 2 * half_size || half_size == 0 {
        return resp;
    }

    let offsets = ring_pair_offsets(half_size);
    let variance = src_stats.variance();
    let guard = offsets.len() as f64 * (0.01 * variance.max(0.) + 1e-9);

    let row_for = |row: usize, out_row: &mut [f32]| {
        for col in half_size..(hw.wide - half_size) {
            out_row[col] = ring_response(src, row, col, &offsets, guard) as f32;
        }
    };

    #[cfg(feature = "parallel")]
    {
        let wide = hw.wide;
        resp.as_mut_slice()
            .par_chunks_mut(wide)
            .enumerate()
            .for_each(|(row, out_row)| {
                if half_size <= row && row < hw.high - half_size {
                    row_for(row, out_row);
                }
            });
    }

    #[cfg(not(feature = "parallel"))]
    {
        for row in half_size..(hw.high - half_size) {
            let beg = row * hw.wide;
            let wide = hw.wide;
            row_for(row, &mut resp.as_mut_slice()[beg..beg + wide]);
        }
    }

    resp
}

/// Local maxima of a response grid, strongest first. A cell peaks when it
/// is at least as large as its already-scanned neighbors and strictly
/// larger than the yet-to-come ones, so a flat plateau reports once.
fn peaks_2d(resp: &Grid<f32>) -> Vec<PeakRCV> {
    let high = resp.high();
    let wide = resp.wide();
    let mut peaks = Vec::new();
    for row in 1..high.saturating_sub(1) {
        for col in 1..wide.saturating_sub(1) {
            let val = *resp.get(row, col);
            if !(0. < val) {
                continue;
            }
            let behind = [
                *resp.get(row - 1, col - 1),
                *resp.get(row - 1, col),
                *resp.get(row - 1, col + 1),
                *resp.get(row, col - 1),
            ];
            let ahead = [
                *resp.get(row, col + 1),
                *resp.get(row + 1, col - 1),
                *resp.get(row + 1, col),
                *resp.get(row + 1, col + 1),
            ];
            if behind.iter().all(|&nb| nb <= val) && ahead.iter().all(|&nb| nb < val) {
                peaks.push(PeakRCV {
                    rc: RowCol::new(row, col),
                    value: val as f64,
                });
            }
        }
    }
    peaks.sort_by(|p1, p2| {
        p2.value
            .partial_cmp(&p1.value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    peaks
}

/// Multi-scale symmetry peaks: the per-scale ring responses are multiplied
/// cell-wise and the peaks of the combined response are returned strongest
/// first.
pub fn multi_sym_ring_peaks(
    src: &Grid<f32>,
    src_stats: &RunningStats,
    ring_half_sizes: &[usize],
) -> Vec<PeakRCV> {
    if ring_half_sizes.is_empty() || !src.is_valid() {
        return Vec::new();
    }
    let hw: SizeHW = src.hw();
    let mut combined = Grid::filled(hw, 1.0f32);
    for &half_size in ring_half_sizes {
        let resp = sym_ring_grid_for(src, src_stats, half_size);
        for (out, &val) in combined.iter_mut().zip(resp.iter()) {
            *out *= val;
        }
    }
    peaks_2d(&combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim;

    fn stats_of(grid: &Grid<f32>) -> RunningStats {
        RunningStats::from_samples(grid.iter().map(|&v| v as f64))
    }

    #[test]
    fn flat_image_has_no_peaks() {
        let grid = Grid::filled(SizeHW::new(32, 32), 7.0f32);
        let stats = stats_of(&grid);
        let peaks = multi_sym_ring_peaks(&grid, &stats, &[5, 3]);
        assert!(peaks.is_empty());
    }

    #[test]
    fn response_is_higher_at_quad_center_than_off_center() {
        let (grid, quad) = sim::render_face_on(48, 4);
        let stats = stats_of(&grid);
        let resp = sym_ring_grid_for(&grid, &stats, 3);
        let center = quad.center;
        // center corner cell vs a spot well into one quadrant
        let at_center = *resp.get(center.row as usize, center.col as usize);
        let off_center = *resp.get(center.row as usize + 8, center.col as usize + 2);
        assert!(
            off_center < at_center,
            "center {at_center} vs off {off_center}"
        );
    }

    #[test]
    fn multi_scale_peak_lands_at_quad_center() {
        let (grid, quad) = sim::render_face_on(64, 4);
        let stats = stats_of(&grid);
        let peaks = multi_sym_ring_peaks(&grid, &stats, &[5, 3]);
        assert!(!peaks.is_empty());
        let best = &peaks[0];
        let miss_row = best.rc.row as f64 + 0.5 - quad.center.row;
        let miss_col = best.rc.col as f64 + 0.5 - quad.center.col;
        let miss = miss_row.hypot(miss_col);
        // the exact center falls on a cell corner, so the best cell is one
        // of the four touching it
        assert!(miss < 1.5, "peak {:?} missed by {miss}", best.rc);
        // sorted descending
        for pair in peaks.windows(2) {
            assert!(pair[1].value <= pair[0].value);
        }
    }

    #[test]
    fn edge_without_symmetry_center_scores_low() {
        // a single straight step edge has strong variation but no
        // two-fold symmetric center along its length
        let mut grid = Grid::filled(SizeHW::new(32, 32), 0.0f32);
        for row in 16..32 {
            for col in 0..32 {
                *grid.get_mut(row, col) = 10.;
            }
        }
        let stats = stats_of(&grid);
        let resp = sym_ring_grid_for(&grid, &stats, 3);
        // along the edge, antipodal ring samples disagree strongly
        let on_edge = *resp.get(16, 16);
        assert!(on_edge < 0.5, "edge response {on_edge}");
    }

    #[test]
    fn ring_offsets_cover_half_ring_once() {
        let offsets = ring_pair_offsets(2);
        // Chebyshev ring of radius 2 has 16 cells, i.e. 8 antipodal pairs
        assert_eq!(offsets.len(), 8);
        for &(dr, dc) in &offsets {
            assert_eq!(dr.abs().max(dc.abs()), 2);
            // no offset appears together with its antipode
            assert!(!offsets.contains(&(-dr, -dc)));
        }
    }
}
