//! The quad-target detection pipeline.

pub mod azimcycle;
pub mod edgel;
pub mod edgeinfo;
pub mod edgeline;
pub mod eval;
pub mod fitter;
pub mod grouper;
pub mod parmad;
pub mod peaks1d;
pub mod quad;
pub mod quadness;
pub mod symring;
pub mod tracker;

pub use azimcycle::AzimCycle;
pub use edgel::{all_edgels_from, linked_edgels_from, Edgel};
pub use edgeinfo::{dominant_edgels_from, edge_infos_likely_radial, EdgeInfo};
pub use edgeline::EdgeLine;
pub use eval::{sig_quad_weights, EdgeEval};
pub use fitter::{CenterFitter, SpotSigma};
pub use grouper::EdgeGrouper;
pub use parmad::ParmAD;
pub use peaks1d::{DataDomain, PeakFinder1D};
pub use quad::{AngleWgt, ItemWgt, NdxWgt, QuadTarget, QuadWgt, RayWgt, SpotWgt};
pub use quadness::quad_likeness;
pub use symring::{multi_sym_ring_peaks, sym_ring_grid_for, PeakRCV};
pub use tracker::AngleTracker;

/// Thresholds of the detection pipeline. Defaults match the calibrated
/// values for a gradient stride of one pixel; in particular
/// `ray_separation_sigma` must be reconsidered if `step_half` changes.
#[derive(Debug, Clone, Copy)]
pub struct DetectorParams {
    /// Half step of the gradient difference stencil.
    pub step_half: usize,
    /// Neighborhood agreement multiple for linked edgel extraction.
    pub support_ratio: f64,
    /// Dominant-edgel cap as a multiple of the raster diagonal.
    pub diag_multiple: usize,
    /// Number of bins in the edge-direction histogram.
    pub num_angle_bins: usize,
    /// Neighbor bins on each side receiving histogram smear.
    pub angle_half_spread: usize,
    /// Attenuation power on edgel/peak direction alignment.
    pub group_cos_power: f64,
    /// Attenuation power on pairwise anti-alignment (approximates a
    /// Gaussian in angle with sigma near 0.25 rad).
    pub anti_align_cos_power: f64,
    /// Expected collinearity deviation between opposing radial edgels.
    pub line_gap_sigma: f64,
    /// Minimum meaningful separation of two edge-ray start points.
    pub ray_separation_sigma: f64,
    /// Maximum spot-to-ray miss distance for refit support.
    pub edge_miss_max: f64,
    /// Angular uncertainty of opposing edge-line matches.
    pub edge_line_angle_sigma: f64,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            step_half: 1,
            support_ratio: 2.5,
            diag_multiple: 6,
            num_angle_bins: 32,
            angle_half_spread: 1,
            group_cos_power: 10.,
            anti_align_cos_power: 30.,
            line_gap_sigma: 2.0,
            ray_separation_sigma: 2.5,
            edge_miss_max: 2.0,
            edge_line_angle_sigma: 0.5,
        }
    }
}
