//! Pairwise corroboration statistics for edgels that may lie on opposing
//! radial edges of a quad target.

use super::edgel::{linked_edgels_from, Edgel};
use super::DetectorParams;
use crate::geom::vec2::{dot, Grad, Vec2};
use crate::grid::Grid;

/// Running tracker of how strongly an edgel behaves like a radial-edge
/// sample, accumulated from comparisons against candidate partner edgels.
#[derive(Debug, Clone)]
pub struct EdgeInfo {
    edgel: Edgel,
    wgt_radial_sum: f64,
    edge_dir_sum: Vec2,
}

impl EdgeInfo {
    pub fn new(edgel: Edgel) -> Self {
        Self {
            edgel,
            wgt_radial_sum: 0.,
            edge_dir_sum: Vec2::new(0., 0.),
        }
    }

    #[inline]
    pub fn edgel(&self) -> &Edgel {
        &self.edgel
    }

    /// Propensity of this edgel to lie on a radial edge.
    #[inline]
    pub fn considered_weight(&self) -> f64 {
        self.wgt_radial_sum
    }

    /// Best-estimate outward gradient direction of the radial edge through
    /// this edgel.
    #[inline]
    pub fn considered_direction(&self) -> Vec2 {
        self.edge_dir_sum.direction()
    }

    #[inline]
    pub fn considered_angle(&self) -> f64 {
        self.edge_dir_sum.angle()
    }

    /// Outward-pointing mean direction of an (assumed) anti-parallel pair,
    /// positive toward `edgel1`.
    pub fn align_dir_between(edgel1: &Edgel, edgel2: &Edgel) -> Vec2 {
        (edgel1.direction() - edgel2.direction()).direction()
    }

    /// Mean perpendicular distance of each edgel from the other's line.
    pub fn average_line_gap(edgel1: &Edgel, edgel2: &Edgel) -> f64 {
        let loc1 = edgel1.location();
        let loc2 = edgel2.location();
        let dist_2_from_1 = dot(loc2 - loc1, edgel1.direction());
        let dist_1_from_2 = dot(loc1 - loc2, edgel2.direction());
        0.5 * (dist_2_from_1 + dist_1_from_2)
    }

    /// Fold `other` into this edgel's tracking sums.
    ///
    /// Pairs qualify when nearly anti-parallel (`-dot >= 0.5`, about a
    /// +/-60 degree window) and with a line gap inside four sigma. The
    /// anti-alignment weight `(-dot)^N` with N near 30 approximates a
    /// Gaussian in angle with sigma around 0.25 rad.
    pub fn consider(&mut self, other: &Edgel, line_gap_sigma: f64, anti_align_power: f64) {
        let dot_facing = -dot(self.edgel.direction(), other.direction());
        if dot_facing <= 0.5 {
            return;
        }
        let line_gap = Self::average_line_gap(&self.edgel, other);
        if 4. * line_gap_sigma <= line_gap.abs() {
            return;
        }

        let wgt_facing = dot_facing.powf(anti_align_power);
        let gap_arg = line_gap / line_gap_sigma;
        let wgt_gap = (-gap_arg * gap_arg).exp();
        let wgt_radial = wgt_facing * wgt_gap;

        let pair_dir = Self::align_dir_between(&self.edgel, other);
        self.wgt_radial_sum += wgt_radial;
        self.edge_dir_sum = self.edge_dir_sum + wgt_radial * pair_dir;
    }
}

/// Strongest-magnitude edgels from the gradient grid, capped at
/// `diag_multiple * diagonal` to bound the pairwise stage.
pub fn dominant_edgels_from(grad_grid: &Grid<Grad>, params: &DetectorParams) -> Vec<Edgel> {
    let mut edgels = linked_edgels_from(grad_grid, params.support_ratio);

    let est = (params.diag_multiple as f64 * grad_grid.hw().diagonal()) as usize;
    let num_to_use = est.min(edgels.len());

    let descending = |e1: &Edgel, e2: &Edgel| {
        e2.magnitude()
            .partial_cmp(&e1.magnitude())
            .unwrap_or(std::cmp::Ordering::Equal)
    };
    if 0 < num_to_use && num_to_use < edgels.len() {
        edgels.select_nth_unstable_by(num_to_use - 1, descending);
    }
    edgels.truncate(num_to_use);
    edgels.sort_unstable_by(descending);
    edgels
}

/// Pairwise (combinatorial) accumulation: every edgel considers every
/// other, symmetrically.
pub fn edge_infos_likely_radial(edgels: &[Edgel], params: &DetectorParams) -> Vec<EdgeInfo> {
    let mut edge_infos: Vec<EdgeInfo> = Vec::with_capacity(edgels.len());
    if edgels.len() < 3 {
        return edgels.iter().map(|e| EdgeInfo::new(*e)).collect();
    }

    for edgel in edgels {
        let mut info_new = EdgeInfo::new(*edgel);
        for info_prev in edge_infos.iter_mut() {
            info_new.consider(
                info_prev.edgel(),
                params.line_gap_sigma,
                params.anti_align_cos_power,
            );
            info_prev.consider(
                &info_new.edgel,
                params.line_gap_sigma,
                params.anti_align_cos_power,
            );
        }
        edge_infos.push(info_new);
    }
    edge_infos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Grad, Spot};

    fn params() -> DetectorParams {
        DetectorParams::default()
    }

    fn edgel(row: f64, col: f64, grad_row: f64, grad_col: f64) -> Edgel {
        Edgel::new(Spot::new(row, col), Grad::new(grad_row, grad_col))
    }

    #[test]
    fn anti_parallel_collinear_pair_supports_strongly() {
        // two edgels on the same vertical line, gradients facing each other
        let e1 = edgel(2., 5., 0., 1.);
        let e2 = edgel(6., 5., 0., -1.);
        let mut info = EdgeInfo::new(e1);
        info.consider(&e2, 2.0, 30.0);
        assert!(0.9 < info.considered_weight());
        // outward direction points along e1's gradient
        let dir = info.considered_direction();
        assert!(dir.nearly_equals(&Grad::new(0., 1.), 1e-9));
    }

    #[test]
    fn parallel_pair_is_rejected() {
        let e1 = edgel(2., 5., 0., 1.);
        let e2 = edgel(6., 5., 0., 1.);
        let mut info = EdgeInfo::new(e1);
        info.consider(&e2, 2.0, 30.0);
        assert_eq!(info.considered_weight(), 0.);
    }

    #[test]
    fn wide_line_gap_is_rejected() {
        // anti-parallel but offset far along the gradient direction
        let e1 = edgel(2., 0., 0., 1.);
        let e2 = edgel(2., 20., 0., -1.);
        let mut info = EdgeInfo::new(e1);
        info.consider(&e2, 2.0, 30.0);
        assert_eq!(info.considered_weight(), 0.);
    }

    #[test]
    fn accumulation_is_order_insensitive() {
        let partners = [
            edgel(6., 5., 0., -1.),
            edgel(7., 5.5, 0.05, -1.),
            edgel(5., 4.5, -0.05, -1.),
        ];
        let base = edgel(2., 5., 0., 1.);

        let mut fwd = EdgeInfo::new(base);
        for p in &partners {
            fwd.consider(p, 2.0, 30.0);
        }
        let mut rev = EdgeInfo::new(base);
        for p in partners.iter().rev() {
            rev.consider(p, 2.0, 30.0);
        }
        assert!((fwd.considered_weight() - rev.considered_weight()).abs() < 1e-12);
        assert!(fwd
            .considered_direction()
            .nearly_equals(&rev.considered_direction(), 1e-12));
    }

    #[test]
    fn pairwise_driver_updates_both_sides() {
        let edgels = vec![
            edgel(2., 5., 0., 1.),
            edgel(6., 5., 0., -1.),
            edgel(4., 9., 1., 0.),
        ];
        let infos = edge_infos_likely_radial(&edgels, &params());
        assert_eq!(infos.len(), 3);
        // the facing pair supports each other; the perpendicular one is
        // outside the anti-alignment window of both
        assert!(0.5 < infos[0].considered_weight());
        assert!(0.5 < infos[1].considered_weight());
        assert_eq!(infos[2].considered_weight(), 0.);
    }

    #[test]
    fn dominant_cap_keeps_strongest() {
        use crate::grid::ops::gradient_grid_for;
        use crate::grid::SizeHW;
        // strong step edge in a grid small enough that the cap binds at
        // 6 * diagonal >= count; check ordering is by descending magnitude
        let mut grid = Grid::filled(SizeHW::new(8, 8), 0.0f32);
        for row in 4..8 {
            for col in 0..8 {
                *grid.get_mut(row, col) = 10.;
            }
        }
        let grads = gradient_grid_for(&grid, 1);
        let edgels = dominant_edgels_from(&grads, &params());
        assert!(!edgels.is_empty());
        for pair in edgels.windows(2) {
            assert!(pair[1].magnitude() <= pair[0].magnitude());
        }
    }
}
