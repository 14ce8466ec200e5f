//! Azimuthal intensity-cycle verification of a candidate quad center.

use crate::ang::{atan2, Ring, TWO_PI};
use crate::geom::Spot;
use crate::grid::ops::bilin_value_at;
use crate::grid::Grid;
use crate::stats::RunningStats;

/// Checks whether image intensities around a candidate center follow the
/// Hi/Lo/Hi/Lo azimuthal pattern of a quad target.
///
/// Samples are taken on a disk about the center (excluding a small inner
/// disk) and binned by azimuth with roughly one-pixel perimeter
/// resolution. A bin is Hi when even its minimum exceeds the overall mean,
/// Lo when even its maximum stays below it, and ignored otherwise.
#[derive(Debug, Clone)]
pub struct AzimCycle {
    src_stat: RunningStats,
    azim_ring: Ring,
    azim_stats: Vec<RunningStats>,
}

impl AzimCycle {
    /// Ring sized for about one source cell of perimeter per bin at
    /// `radius`.
    fn azim_ring(radius: f64) -> Ring {
        let num_samp = (TWO_PI * radius).floor().max(1.) as usize;
        Ring::new(num_samp)
    }

    pub fn new(src_grid: &Grid<f32>, eval_center: Spot, eval_radius: f64, eval_min_rad: f64) -> Self {
        let azim_ring = Self::azim_ring(eval_radius);
        let mut azim_stats = vec![RunningStats::new(); azim_ring.size()];
        let mut src_stat = RunningStats::new();

        let rc_max = eval_radius + 0.5;
        let mut rel_row = -eval_radius;
        while rel_row < rc_max {
            let mut rel_col = -eval_radius;
            while rel_col < rc_max {
                let rel_spot = Spot::new(rel_row, rel_col);
                let samp_radius = rel_spot.magnitude();
                if eval_min_rad <= samp_radius && samp_radius <= eval_radius {
                    let samp_angle = atan2(rel_spot.col, rel_spot.row);
                    let samp_value = bilin_value_at(src_grid, rel_spot + eval_center) as f64;
                    let azim_ndx = azim_ring.index_for(samp_angle);
                    azim_stats[azim_ndx].consider(samp_value);
                    src_stat.consider(samp_value);
                }
                rel_col += 1.;
            }
            rel_row += 1.;
        }

        Self {
            src_stat,
            azim_ring,
            azim_stats,
        }
    }

    /// Condensed sequence of statistically strong Hi(+1)/Lo(-1) azimuth
    /// classifications, adjacent duplicates removed.
    pub fn azim_hi_lo_signs(&self) -> Vec<i32> {
        let full_mean = self.src_stat.mean();
        let mut signs = Vec::with_capacity(self.azim_ring.size());
        let mut prev_sign = 0;
        for azim_stat in &self.azim_stats {
            let mut curr_sign = 0;
            if full_mean < azim_stat.min() {
                curr_sign = 1;
            }
            if azim_stat.max() < full_mean {
                curr_sign = -1;
            }
            if curr_sign != 0 && (signs.is_empty() || prev_sign != curr_sign) {
                signs.push(curr_sign);
                prev_sign = curr_sign;
            }
        }
        signs
    }

    /// True for exactly four or five condensed transitions: five when
    /// sampling starts mid-quadrant, four when it starts on a radial edge.
    pub fn has_quad_transitions(&self) -> bool {
        let num = self.azim_hi_lo_signs().len();
        num == 4 || num == 5
    }
}
