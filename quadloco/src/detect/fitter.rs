//! Least-squares estimation of the point central to multiple edge rays.

use super::quad::SpotWgt;
use crate::geom::ray::Ray;
use crate::geom::vec2::{dot, Spot};

/// A spot estimate plus a scalar uncertainty.
#[derive(Debug, Clone, Copy)]
pub struct SpotSigma {
    pub spot: Spot,
    pub sigma: f64,
}

impl SpotSigma {
    pub const NULL: SpotSigma = SpotSigma {
        spot: Spot::NULL,
        sigma: f64::NAN,
    };

    pub fn is_valid(&self) -> bool {
        self.spot.is_valid()
    }

    /// Weight of this estimate relative to an expected uncertainty:
    /// `exp(-(sigma/exp_sigma)^2)`.
    pub fn weight(&self, exp_sigma: f64) -> f64 {
        let arg = self.sigma / exp_sigma;
        (-arg * arg).exp()
    }

    /// Root of the largest eigenvalue of a 2x2 covariance, via the
    /// characteristic polynomial. NaN for non-positive-definite input or
    /// fewer than two observations.
    pub fn sigma_from_covar(
        covar00: f64,
        covar01: f64,
        covar10: f64,
        covar11: f64,
        num_obs: usize,
    ) -> f64 {
        let det = covar00 * covar11 - covar10 * covar01;
        if !(0. < det) || num_obs < 2 {
            return f64::NAN;
        }
        let beta = -0.5 * (covar00 + covar11);
        let radicand = beta * beta - det;
        if radicand < 0. {
            return f64::NAN;
        }
        let root = radicand.sqrt();
        let lam_neg = -beta - root;
        let lam_pos = -beta + root;
        lam_neg.abs().max(lam_pos.abs()).sqrt()
    }
}

/// Incremental normal-equation solver for "point on the perpendicular of
/// each ray at its start": each ray contributes the constraint
/// `dot(dir, p) = dot(dir, start)` with a scalar weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct CenterFitter {
    ata00: f64,
    ata01: f64,
    // ata10 is symmetric with ata01
    ata11: f64,
    atb0: f64,
    atb1: f64,
    num_obs: usize,
}

impl CenterFitter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn num_obs(&self) -> usize {
        self.num_obs
    }

    /// Fold one weighted ray into the normal system.
    pub fn add_ray(&mut self, ray: &Ray, wgt: f64) {
        let dir = ray.direction();
        let rhs = dot(dir, ray.start());
        self.ata00 += wgt * dir.row * dir.row;
        self.ata01 += wgt * dir.row * dir.col;
        self.ata11 += wgt * dir.col * dir.col;
        self.atb0 += wgt * dir.row * rhs;
        self.atb1 += wgt * dir.col * rhs;
        self.num_obs += 1;
    }

    /// Closed-form 2x2 solve; invalid when the system is singular
    /// (`|det| <= epsilon`). The sigma is derived from the covariance
    /// `(AtA)^-1`.
    pub fn solution_spot_sigma(&self) -> SpotSigma {
        let det = self.ata00 * self.ata11 - self.ata01 * self.ata01;
        if det.abs() <= f64::EPSILON {
            return SpotSigma::NULL;
        }
        let scl = 1. / det;
        let inv00 = scl * self.ata11;
        let inv01 = -scl * self.ata01;
        let inv11 = scl * self.ata00;
        let inv10 = inv01;

        let spot = Spot::new(
            inv00 * self.atb0 + inv01 * self.atb1,
            inv10 * self.atb0 + inv11 * self.atb1,
        );
        let sigma = SpotSigma::sigma_from_covar(inv00, inv01, inv10, inv11, self.num_obs);
        SpotSigma { spot, sigma }
    }

    /// Solution packaged as a spot with its sigma-derived weight.
    pub fn solution_spot_weight(&self) -> SpotWgt {
        let spot_sigma = self.solution_spot_sigma();
        if spot_sigma.is_valid() {
            SpotWgt::new(spot_sigma.spot, spot_sigma.weight(1.))
        } else {
            SpotWgt::new(Spot::NULL, f64::NAN)
        }
    }
}
