//! Plateau-aware peak detection over 1-D data.
//!
//! A peak is a maximal run of equal values preceded by a strict rise and
//! followed by a strict drop. The scan is a single sweep driven by the
//! Rise/Flat/Drop classification of successive value transitions.

use smallvec::SmallVec;

/// Interpretation of the sequence ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDomain {
    /// Finite sequence; both ends behave as if padded with zero.
    Linear,
    /// The sequence wraps end-to-end (e.g. angle histograms).
    Circle,
}

/// Value transition from the previous sample to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Drop,
    Flat,
    Rise,
}

#[inline]
fn change_for(val_prev: f64, val_curr: f64) -> Change {
    if val_prev < val_curr {
        Change::Rise
    } else if val_curr < val_prev {
        Change::Drop
    } else {
        Change::Flat
    }
}

type NdxGroup = SmallVec<[usize; 8]>;

/// Tracks the plateau of an in-progress candidate peak.
struct PeakTracker {
    peak_ndx_groups: Vec<NdxGroup>,
    active_ndxs: NdxGroup,
    tracking: bool,
}

impl PeakTracker {
    fn new() -> Self {
        Self {
            peak_ndx_groups: Vec::new(),
            active_ndxs: NdxGroup::new(),
            tracking: false,
        }
    }

    /// A rise lands on the first index of a potential plateau.
    fn begin_peak_maybe(&mut self, ndx: usize) {
        self.active_ndxs.clear();
        self.active_ndxs.push(ndx);
        self.tracking = true;
    }

    /// A drop confirms the tracked plateau as a peak.
    fn end_peak(&mut self) {
        if !self.active_ndxs.is_empty() {
            self.peak_ndx_groups.push(std::mem::take(&mut self.active_ndxs));
        }
        self.tracking = false;
    }

    fn curr_peak_beg_ndx(&self) -> Option<usize> {
        self.active_ndxs.first().copied()
    }

    fn consider(&mut self, change: Change, ndx: usize) {
        match change {
            Change::Rise => self.begin_peak_maybe(ndx),
            Change::Drop => {
                if self.tracking {
                    self.end_peak();
                }
            }
            Change::Flat => {
                if self.tracking {
                    self.active_ndxs.push(ndx);
                }
            }
        }
    }
}

/// Peak locations found in a sequence of values.
#[derive(Debug, Clone)]
pub struct PeakFinder1D {
    peak_ndx_groups: Vec<NdxGroup>,
}

impl PeakFinder1D {
    pub fn from_values(values: &[f64], domain: DataDomain) -> Self {
        Self {
            peak_ndx_groups: peak_index_groups(values, domain),
        }
    }

    /// Index groups spanning each peak's plateau, in detection order.
    pub fn peak_index_groups(&self) -> &[NdxGroup] {
        &self.peak_ndx_groups
    }

    /// One index per peak: the middle of its plateau (lower-middle for
    /// even plateau widths).
    pub fn peak_indices(&self) -> Vec<usize> {
        self.peak_ndx_groups
            .iter()
            .map(|grp| grp[(grp.len() - 1) / 2])
            .collect()
    }
}

fn peak_index_groups(values: &[f64], domain: DataDomain) -> Vec<NdxGroup> {
    let num_elem = values.len();
    if num_elem == 0 {
        return Vec::new();
    }
    let num_last = num_elem - 1;

    let (value_prior, value_after) = match domain {
        DataDomain::Circle => (values[num_last], values[0]),
        DataDomain::Linear => (0., 0.),
    };

    let mut tracker = PeakTracker::new();

    // transition into the first sample
    tracker.consider(change_for(value_prior, values[0]), 0);

    // interior transitions
    for ndx in 1..num_elem {
        tracker.consider(change_for(values[ndx - 1], values[ndx]), ndx);
    }

    // transition out of the last sample
    match change_for(values[num_last], value_after) {
        Change::Drop => tracker.end_peak(),
        Change::Rise => {}
        Change::Flat => {
            // a plateau still active at the seam of a circular domain
            // continues into the start until a drop resolves it
            if tracker.tracking && domain == DataDomain::Circle {
                if let Some(beg_ndx) = tracker.curr_peak_beg_ndx() {
                    for ndx in 0..beg_ndx {
                        let prev = values[(num_last + ndx) % num_elem];
                        tracker.consider(change_for(prev, values[ndx]), ndx);
                        if !tracker.tracking {
                            break;
                        }
                    }
                }
            }
        }
    }

    tracker.peak_ndx_groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peaks(values: &[f64], domain: DataDomain) -> Vec<usize> {
        PeakFinder1D::from_values(values, domain).peak_indices()
    }

    #[test]
    fn constant_sequence_has_no_peaks() {
        assert!(peaks(&[3., 3., 3., 3.], DataDomain::Circle).is_empty());
        assert!(peaks(&[3., 3., 3., 3.], DataDomain::Linear).is_empty());
    }

    #[test]
    fn single_spike_is_one_peak() {
        assert_eq!(peaks(&[0., 0., 5., 0., 0.], DataDomain::Linear), vec![2]);
        assert_eq!(peaks(&[0., 0., 5., 0., 0.], DataDomain::Circle), vec![2]);
    }

    #[test]
    fn plateau_reports_middle_index() {
        // plateau over indices 2..=4, odd width -> exact middle
        assert_eq!(
            peaks(&[0., 1., 4., 4., 4., 1., 0.], DataDomain::Linear),
            vec![3]
        );
        // even width -> lower middle
        assert_eq!(
            peaks(&[0., 1., 4., 4., 1., 0.], DataDomain::Linear),
            vec![2]
        );
    }

    #[test]
    fn linear_end_values_can_peak() {
        // zero padding means a high boundary value counts as a peak
        assert_eq!(peaks(&[5., 1., 0., 0.], DataDomain::Linear), vec![0]);
        assert_eq!(peaks(&[0., 0., 1., 5.], DataDomain::Linear), vec![3]);
    }

    #[test]
    fn circular_end_values_respect_wrap() {
        // in circular mode the high end value is part of a rise into
        // index 0, so only index 0 peaks
        assert_eq!(peaks(&[9., 1., 0., 5.], DataDomain::Circle), vec![0]);
    }

    #[test]
    fn circular_plateau_across_seam() {
        // plateau covers indices {3, 0} with drop after index 0; the
        // lower-middle of the wrapped run is index 3
        let got = peaks(&[7., 1., 1., 7.], DataDomain::Circle);
        assert_eq!(got, vec![3]);

        // wider seam plateau: indices {4, 5, 0, 1}
        let got = peaks(&[7., 7., 1., 1., 7., 7.], DataDomain::Circle);
        assert_eq!(got, vec![5]);
    }

    #[test]
    fn two_separated_peaks() {
        let got = peaks(&[0., 4., 0., 0., 6., 0.], DataDomain::Circle);
        assert_eq!(got, vec![1, 4]);
    }

    #[test]
    fn rise_without_drop_is_not_a_peak_linear() {
        // monotonic increase: final value peaks only via zero padding
        assert_eq!(peaks(&[1., 2., 3.], DataDomain::Linear), vec![2]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(peaks(&[], DataDomain::Circle).is_empty());
    }
}
