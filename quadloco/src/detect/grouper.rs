//! Assignment of edgels to dominant direction peaks, and the per-group
//! edge-ray fits.

use super::edgeinfo::EdgeInfo;
use super::quad::{sort_descending_by_weight, AngleWgt, NdxWgt, RayWgt};
use super::tracker::AngleTracker;
use crate::geom::ray::Ray;
use crate::geom::vec2::{dot, Vec2};
use crate::grid::{Grid, SizeHW};

/// Minimum edgel/peak direction alignment for table membership.
pub const MIN_ALIGN: f64 = 0.75;

/// Edgel-to-angle association table.
///
/// Rows are edgels, columns are peak angles. A cell holds the edgel's
/// gradient magnitude attenuated by `align^cos_power`, zero when the
/// alignment `dot(edge_dir, angle_dir)` is at or below [`MIN_ALIGN`]. Each
/// column is one direction group.
#[derive(Debug, Clone)]
pub struct EdgeGrouper {
    ang_wgts: Vec<AngleWgt>,
    ndx_ang_weights: Grid<f64>,
}

impl EdgeGrouper {
    /// Group against externally supplied peak angles.
    pub fn from_peaks(edge_infos: &[EdgeInfo], peak_aws: Vec<AngleWgt>, cos_power: f64) -> Self {
        let ndx_ang_weights = Self::fill_table(edge_infos, &peak_aws, cos_power);
        Self {
            ang_wgts: peak_aws,
            ndx_ang_weights,
        }
    }

    /// Group against direction peaks accumulated from the edge infos
    /// themselves.
    pub fn new(
        edge_infos: &[EdgeInfo],
        num_angle_bins: usize,
        cos_power: f64,
        half_spread: usize,
    ) -> Self {
        let mut tracker = AngleTracker::new(num_angle_bins);
        for info in edge_infos {
            tracker.consider(info.considered_angle(), info.considered_weight(), half_spread);
        }
        Self::from_peaks(edge_infos, tracker.peak_angle_weights(), cos_power)
    }

    pub fn peak_angle_weights(&self) -> &[AngleWgt] {
        &self.ang_wgts
    }

    fn fill_table(
        edge_infos: &[EdgeInfo],
        peak_aws: &[AngleWgt],
        cos_power: f64,
    ) -> Grid<f64> {
        let hw = SizeHW::new(edge_infos.len(), peak_aws.len());
        let mut tab = Grid::filled(hw, 0.);
        if !hw.is_valid() {
            return tab;
        }

        let ang_dirs: Vec<Vec2> = peak_aws
            .iter()
            .map(|aw| Vec2::from_angle(aw.item))
            .collect();

        for (e_ndx, info) in edge_infos.iter().enumerate() {
            let edgel = info.edgel();
            let edge_dir = edgel.direction();
            for (a_ndx, ang_dir) in ang_dirs.iter().enumerate() {
                let align = dot(edge_dir, *ang_dir);
                if MIN_ALIGN < align {
                    *tab.get_mut(e_ndx, a_ndx) += align.powf(cos_power) * edgel.magnitude();
                }
            }
        }
        tab
    }

    /// Per-column groups of (edgel index, table weight), skipping zeros.
    pub fn group_ndx_weights(&self) -> Vec<Vec<NdxWgt>> {
        let num_groups = self.ndx_ang_weights.wide();
        let num_elem = self.ndx_ang_weights.high();
        let mut groups = Vec::with_capacity(num_groups);
        for col in 0..num_groups {
            let mut ndx_wgts = Vec::new();
            for row in 0..num_elem {
                let wgt = *self.ndx_ang_weights.get(row, col);
                if 0. < wgt {
                    ndx_wgts.push(NdxWgt::new(row, wgt));
                }
            }
            groups.push(ndx_wgts);
        }
        groups
    }

    /// Gradient-weighted ray fit over one group:
    ///
    /// ```text
    /// start     = sum(w_radial * |grad| * location) / sum(w_radial * |grad|)
    /// direction = direction(sum(w_radial * gradient))
    /// weight    = sum(w_radial * |grad|)
    /// ```
    pub fn fit_ray_weight_for(ndx_wgts: &[NdxWgt], edge_infos: &[EdgeInfo]) -> RayWgt {
        let mut sum_loc = Vec2::new(0., 0.);
        let mut sum_dir = Vec2::new(0., 0.);
        let mut sum_wgt = 0.;
        for ndx_wgt in ndx_wgts {
            let info = &edge_infos[ndx_wgt.item];
            let edgel = info.edgel();
            let wgt_radial = info.considered_weight();
            let wgt_grad_mag = edgel.magnitude();
            // the gradient itself carries |grad| * direction
            sum_dir = sum_dir + wgt_radial * edgel.gradient();
            sum_loc = sum_loc + (wgt_radial * wgt_grad_mag) * edgel.location();
            sum_wgt += wgt_radial * wgt_grad_mag;
        }
        if 0. < sum_wgt {
            let ray = Ray::new((1. / sum_wgt) * sum_loc, sum_dir);
            RayWgt::new(ray, sum_wgt)
        } else {
            RayWgt::new(Ray::NULL, f64::NAN)
        }
    }

    /// Fitted edge rays for all groups, strongest first.
    pub fn group_ray_weights(&self, edge_infos: &[EdgeInfo]) -> Vec<RayWgt> {
        let mut ray_wgts: Vec<RayWgt> = self
            .group_ndx_weights()
            .iter()
            .map(|group| Self::fit_ray_weight_for(group, edge_infos))
            .filter(|rw| rw.is_valid() && rw.item.is_valid())
            .collect();
        sort_descending_by_weight(&mut ray_wgts);
        ray_wgts
    }
}
