//! Evaluation of edgels into weighted quad-target center candidates.
//!
//! Stages: grouped edge rays -> pairwise ray intersections -> consensus
//! reweighting against all rays -> per-spot quad axis synthesis ->
//! least-squares center refit. Each stage consumes and produces owned
//! vectors; invalid intermediate values are dropped at the stage boundary.

use smallvec::SmallVec;

use super::edgeinfo::{dominant_edgels_from, edge_infos_likely_radial, EdgeInfo};
use super::edgel::Edgel;
use super::edgeline::EdgeLine;
use super::fitter::CenterFitter;
use super::grouper::EdgeGrouper;
use super::quad::{
    sort_descending_by_weight, NdxWgt, QuadTarget, QuadWgt, RayWgt, SpotWgt,
};
use super::DetectorParams;
use crate::geom::vec2::{outer, Grad, Spot};
use crate::geom::{Area, Ray, Span};
use crate::grid::{Grid, RowCol, SizeHW};

/// Pseudo-probability table of spot (row) / ray (col) collinearity:
/// `p = exp(-d^2)` with `d` the spot's distance along the ray direction
/// (which, for edge rays, is the miss distance off the edge line).
struct SpotRayProbs {
    prob_tab: Grid<f64>,
}

impl SpotRayProbs {
    fn new(spot_wgts: &[SpotWgt], ray_wgts: &[RayWgt]) -> Self {
        let hw = SizeHW::new(spot_wgts.len(), ray_wgts.len());
        let mut prob_tab = Grid::filled(hw, 0.);
        for (spot_ndx, spot_wgt) in spot_wgts.iter().enumerate() {
            for (ray_ndx, ray_wgt) in ray_wgts.iter().enumerate() {
                let edge_miss = ray_wgt.item.distance_along(spot_wgt.item);
                *prob_tab.get_mut(spot_ndx, ray_ndx) = (-edge_miss * edge_miss).exp();
            }
        }
        Self { prob_tab }
    }

    /// Ray indices and collinearity probabilities for one spot, highest
    /// probability first.
    fn ray_ndx_wgts_for(&self, spot_ndx: usize) -> Vec<NdxWgt> {
        let num_rays = self.prob_tab.wide();
        let mut ndx_wgts: Vec<NdxWgt> = (0..num_rays)
            .map(|ray_ndx| NdxWgt::new(ray_ndx, *self.prob_tab.get(spot_ndx, ray_ndx)))
            .collect();
        sort_descending_by_weight(&mut ndx_wgts);
        ndx_wgts
    }
}

/// Candidate center from intersecting two weighted rays.
fn intersection_of(rw1: &RayWgt, rw2: &RayWgt) -> SpotWgt {
    let mut fitter = CenterFitter::new();
    fitter.add_ray(&rw1.item, rw1.weight);
    fitter.add_ray(&rw2.item, rw2.weight);
    fitter.solution_spot_weight()
}

/// Evaluator of edgels likely to belong to a quad target image.
pub struct EdgeEval {
    edge_infos: Vec<EdgeInfo>,
    params: DetectorParams,
}

impl EdgeEval {
    /// Extract dominant edgels from the gradient grid and accumulate their
    /// pairwise radial-edge statistics.
    pub fn new(grad_grid: &Grid<Grad>, params: &DetectorParams) -> Self {
        let edgels = dominant_edgels_from(grad_grid, params);
        let edge_infos = edge_infos_likely_radial(&edgels, params);
        Self {
            edge_infos,
            params: *params,
        }
    }

    pub fn edge_infos(&self) -> &[EdgeInfo] {
        &self.edge_infos
    }

    /// Edge elements actually in use for evaluation.
    pub fn edgels_in_use(&self) -> Vec<Edgel> {
        self.edge_infos.iter().map(|info| *info.edgel()).collect()
    }

    /// Raster of accumulated radial weights at edgel locations
    /// (diagnostic dump).
    pub fn edge_info_grid(&self, hw: SizeHW) -> Grid<f32> {
        let mut grid = Grid::filled(hw, 0.0f32);
        for info in &self.edge_infos {
            if let Some(rc) = RowCol::from_spot(info.edgel().location()) {
                if rc.row < hw.high && rc.col < hw.wide {
                    *grid.at_mut(rc) = info.considered_weight() as f32;
                }
            }
        }
        grid
    }

    /// Pseudo-probability that two edge rays are *not* artifacts of the
    /// same multi-pixel gradient footprint: `1 - exp(-(d/sigma)^2)` on the
    /// distance between their start points.
    pub fn separation_weight(ray1: &Ray, ray2: &Ray, sigma: f64) -> f64 {
        let delta = (ray2.start() - ray1.start()).magnitude();
        let arg = delta / sigma;
        1. - (-arg * arg).exp()
    }

    /// Fitted radial-edge ray candidates, strongest first.
    pub fn ray_weights(&self) -> Vec<RayWgt> {
        let grouper = EdgeGrouper::new(
            &self.edge_infos,
            self.params.num_angle_bins,
            self.params.group_cos_power,
            self.params.angle_half_spread,
        );
        grouper.group_ray_weights(&self.edge_infos)
    }

    /// Spots (and weights) from all pairwise edge-ray intersections that
    /// land inside the raster.
    fn spot_weights_pairwise(&self, ray_wgts: &[RayWgt], hw: SizeHW) -> Vec<SpotWgt> {
        let hw_area = Area::new(
            Span::new(0., hw.high as f64),
            Span::new(0., hw.wide as f64),
        );

        let num = ray_wgts.len();
        let mut spot_wgts = Vec::with_capacity(num * num.saturating_sub(1) / 2);
        for ndx1 in 0..num {
            let rw1 = &ray_wgts[ndx1];
            for rw2 in ray_wgts.iter().skip(ndx1 + 1) {
                let tmp_spot_wgt = intersection_of(rw1, rw2);
                if !(tmp_spot_wgt.is_valid() && tmp_spot_wgt.item.is_valid()) {
                    continue;
                }
                if !hw_area.contains(tmp_spot_wgt.item) {
                    continue;
                }
                let wgt_distinct = Self::separation_weight(
                    &rw1.item,
                    &rw2.item,
                    self.params.ray_separation_sigma,
                );
                spot_wgts.push(SpotWgt::new(
                    tmp_spot_wgt.item,
                    wgt_distinct * tmp_spot_wgt.weight,
                ));
            }
        }
        spot_wgts
    }

    /// Reweight candidate spots by the consensus of all edge rays.
    fn spot_weights_consensus(&self, in_spot_wgts: &[SpotWgt], ray_wgts: &[RayWgt]) -> Vec<SpotWgt> {
        let spot_ray_probs = SpotRayProbs::new(in_spot_wgts, ray_wgts);

        let mut spot_wgts = Vec::with_capacity(in_spot_wgts.len());
        for (spot_ndx, in_spot_wgt) in in_spot_wgts.iter().enumerate() {
            let mut vote_total = 0.;
            for ray_ndx_wgt in spot_ray_probs.ray_ndx_wgts_for(spot_ndx) {
                let wgt_ray = ray_wgts[ray_ndx_wgt.item].weight;
                vote_total += wgt_ray * ray_ndx_wgt.weight;
            }
            spot_wgts.push(SpotWgt::new(in_spot_wgt.item, in_spot_wgt.weight * vote_total));
        }
        spot_wgts
    }

    /// Quad-axis candidates for one center spot given its radial edge
    /// lines.
    ///
    /// Lines are walked in angle order: the first positive-moment line is
    /// the +X candidate, the next line within a CCW half turn whose moment
    /// has the opposite sign is the +Y candidate. Each must have an
    /// opposing line (same moment sign, nearest the antipode); the axis
    /// direction is the difference of the paired line directions and the
    /// candidate weight is the product of the two opposing-match weights.
    fn quad_wgts_for(&self, all_rad_lines: &[EdgeLine], center_spot: Spot) -> Vec<QuadWgt> {
        let mut quad_wgts = Vec::new();

        let num_rad = all_rad_lines.len();
        if num_rad < 4 {
            return quad_wgts;
        }

        let mut rad_lines: SmallVec<[EdgeLine; 16]> =
            SmallVec::from_iter(all_rad_lines.iter().copied());
        rad_lines.sort_by(|line1, line2| {
            line1
                .angle_of_line()
                .partial_cmp(&line2.angle_of_line())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // candidate for the "+X" axis: first positively turned edge
        let Some(ndx_curr) = rad_lines.iter().position(|line| 0. < line.turn_moment()) else {
            return quad_wgts;
        };
        let rad_curr = rad_lines[ndx_curr];
        let line_dir_curr = rad_curr.line_direction();

        let ang_sigma = self.params.edge_line_angle_sigma;
        for n_off in 1..num_rad {
            let ndx_next = (ndx_curr + n_off) % num_rad;
            let rad_next = rad_lines[ndx_next];
            let line_dir_next = rad_next.line_direction();

            // the partner axis must lie within a CCW half turn; the outer
            // product keeps the test free of phase wrap issues
            if outer(line_dir_curr, line_dir_next) <= 0. {
                break;
            }
            if !rad_next.is_turn_dir_opposite_to(&rad_curr) {
                continue;
            }

            let nw_curr = rad_curr.opposing_ndx_wgt(&rad_lines, ndx_curr, ang_sigma);
            let nw_next = rad_next.opposing_ndx_wgt(&rad_lines, ndx_next, ang_sigma);
            if !(nw_curr.is_valid() && nw_next.is_valid()) {
                continue;
            }

            let delta_curr =
                rad_lines[ndx_curr].line_direction() - rad_lines[nw_curr.item].line_direction();
            let delta_next =
                rad_lines[ndx_next].line_direction() - rad_lines[nw_next.item].line_direction();
            let dir_x = delta_curr.direction();
            let dir_y = delta_next.direction();

            let sig_quad = QuadTarget::new(center_spot, dir_x, dir_y);
            quad_wgts.push(QuadWgt::new(sig_quad, nw_curr.weight * nw_next.weight));
        }

        quad_wgts
    }

    /// Quad-target candidates synthesized from every spot and its most
    /// collinear rays.
    fn sig_quad_estimates(&self, spot_wgts: &[SpotWgt], ray_wgts: &[RayWgt]) -> Vec<QuadWgt> {
        let spot_ray_probs = SpotRayProbs::new(spot_wgts, ray_wgts);

        let mut all_quad_wgts = Vec::with_capacity(spot_wgts.len());
        for (spot_ndx, spot_wgt) in spot_wgts.iter().enumerate() {
            let spot = spot_wgt.item;
            let rad_lines: Vec<EdgeLine> = spot_ray_probs
                .ray_ndx_wgts_for(spot_ndx)
                .into_iter()
                .map(|nw| EdgeLine::from(spot, ray_wgts[nw.item].item))
                .filter(|line| line.is_valid())
                .collect();
            all_quad_wgts.extend(self.quad_wgts_for(&rad_lines, spot));
        }
        all_quad_wgts
    }

    /// Indices and weights of rays nearly collinear with a candidate
    /// center (edge miss under `edge_miss_max`).
    fn ray_ndx_weights(
        &self,
        spot_candidate: Spot,
        wgt_candidate: f64,
        ray_wgts: &[RayWgt],
    ) -> Vec<NdxWgt> {
        let mut colin_ray_ndx_wgts = Vec::with_capacity(ray_wgts.len());
        for (ray_ndx, ray_wgt) in ray_wgts.iter().enumerate() {
            let edge_miss = ray_wgt.item.distance_along(spot_candidate).abs();
            if edge_miss < self.params.edge_miss_max {
                let prob_collin = (-edge_miss * edge_miss).exp();
                let wgt = wgt_candidate * ray_wgt.weight * prob_collin;
                colin_ray_ndx_wgts.push(NdxWgt::new(ray_ndx, wgt));
            }
        }
        colin_ray_ndx_wgts
    }

    /// Least-squares refit of each candidate center against its
    /// supporting rays (at least four required). The candidate keeps its
    /// axis directions; the center and weight come from the fit.
    fn fit_quad_wgts_for(&self, quad_wgts: &[QuadWgt], ray_wgts: &[RayWgt]) -> Vec<QuadWgt> {
        let mut fit_quad_wgts = Vec::with_capacity(quad_wgts.len());
        for quad_wgt in quad_wgts {
            let src_quad = &quad_wgt.item;
            let src_wgt = quad_wgt.weight;

            let ray_nws = self.ray_ndx_weights(src_quad.center, src_wgt, ray_wgts);
            if ray_nws.len() < 4 {
                continue;
            }

            let mut fitter = CenterFitter::new();
            for ray_nw in &ray_nws {
                let ray = &ray_wgts[ray_nw.item].item;
                fitter.add_ray(ray, ray_nw.weight * src_wgt);
            }
            let fit_spot_sigma = fitter.solution_spot_sigma();
            if !fit_spot_sigma.is_valid() {
                continue;
            }

            let mut fit_quad = QuadTarget::new(fit_spot_sigma.spot, src_quad.dir_x, src_quad.dir_y);
            fit_quad.center_sigma = fit_spot_sigma.sigma;
            fit_quad_wgts.push(QuadWgt::new(fit_quad, fit_spot_sigma.weight(1.)));
        }

        sort_descending_by_weight(&mut fit_quad_wgts);
        fit_quad_wgts
    }

    /// Weighted quad-target candidates for a raster of the given size,
    /// strongest first.
    pub fn sig_quad_weights(&self, hw: SizeHW) -> Vec<QuadWgt> {
        let ray_wgts = self.ray_weights();
        let pair_spot_wgts = self.spot_weights_pairwise(&ray_wgts, hw);
        let qual_spot_wgts = self.spot_weights_consensus(&pair_spot_wgts, &ray_wgts);
        let quad_wgts = self.sig_quad_estimates(&qual_spot_wgts, &ray_wgts);
        self.fit_quad_wgts_for(&quad_wgts, &ray_wgts)
    }
}

/// Convenience entry point: run the full edge evaluation over a gradient
/// grid.
pub fn sig_quad_weights(grad_grid: &Grid<Grad>, params: &DetectorParams) -> Vec<QuadWgt> {
    EdgeEval::new(grad_grid, params).sig_quad_weights(grad_grid.hw())
}
