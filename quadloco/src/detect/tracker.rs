//! Circular histogram of weighted angle votes with Gaussian smear.

use super::peaks1d::{DataDomain, PeakFinder1D};
use super::quad::AngleWgt;
use crate::ang::{principal_angle, Ring};
use crate::stats::Gauss1D;

/// Accumulator of weighted angle observations over a fixed set of circular
/// bins. Peaks of the accumulated histogram nominate dominant directions.
#[derive(Debug, Clone)]
pub struct AngleTracker {
    ring: Ring,
    bin_sums: Vec<f64>,
    total_sum: f64,
}

impl AngleTracker {
    pub fn new(num_ang_bins: usize) -> Self {
        Self {
            ring: Ring::new(num_ang_bins),
            bin_sums: vec![0.; num_ang_bins],
            total_sum: 0.,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.ring.is_valid() && !self.bin_sums.is_empty()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.bin_sums.len()
    }

    #[inline]
    pub fn ring(&self) -> &Ring {
        &self.ring
    }

    /// Angle at the start of bin `ndx`.
    #[inline]
    pub fn angle_at(&self, ndx: usize) -> f64 {
        self.ring.angle_at(ndx)
    }

    /// Relative histogram mass of bin `ndx`; NaN while the histogram is
    /// empty.
    pub fn prob_at_index(&self, ndx: usize) -> f64 {
        if f64::EPSILON < self.total_sum && ndx < self.bin_sums.len() {
            self.bin_sums[ndx] / self.total_sum
        } else {
            f64::NAN
        }
    }

    pub fn prob_at_angle(&self, angle: f64) -> f64 {
        self.prob_at_index(self.ring.index_for(angle))
    }

    /// Deposit a Gaussian of total amplitude `weight` centered at `angle`.
    ///
    /// The density has a standard deviation of one bin width and lands in
    /// the containing bin plus `half_spread` neighbors on each side, all
    /// wrapped circularly. Invalid angles are ignored.
    pub fn consider(&mut self, angle: f64, weight: f64, half_spread: usize) {
        if !angle.is_finite() || !weight.is_finite() {
            return;
        }
        let bin_delta = self.ring.angle_delta();
        let gauss = Gauss1D::new(0., bin_delta);

        let angle = principal_angle(angle);
        let ndx_curr = self.ring.index_for(angle);
        let offset = angle - self.angle_at(ndx_curr);

        let mut deposits: Vec<(usize, f64)> = Vec::with_capacity(1 + 2 * half_spread);
        deposits.push((ndx_curr, offset));
        for dn in 1..=half_spread {
            let ang_delta = bin_delta * dn as f64;
            let ndx_pos = self.ring.index_relative_to(ndx_curr, dn as isize);
            deposits.push((ndx_pos, offset - ang_delta));
            let ndx_neg = self.ring.index_relative_to(ndx_curr, -(dn as isize));
            deposits.push((ndx_neg, offset + ang_delta));
        }
        for (ndx, at) in deposits {
            let sum = weight * gauss.value(at);
            self.bin_sums[ndx] += sum;
            self.total_sum += sum;
        }
    }

    /// Bin indices of local histogram peaks (circular domain).
    pub fn indices_of_peaks(&self) -> Vec<usize> {
        PeakFinder1D::from_values(&self.bin_sums, DataDomain::Circle).peak_indices()
    }

    /// Peak angles paired with their relative histogram mass, one entry per
    /// local peak.
    pub fn peak_angle_weights(&self) -> Vec<AngleWgt> {
        self.indices_of_peaks()
            .into_iter()
            .map(|ndx| AngleWgt::new(self.angle_at(ndx), self.prob_at_index(ndx)))
            .filter(|aw| aw.is_valid())
            .collect()
    }
}
