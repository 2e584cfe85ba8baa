//! Kimura two-parameter divergence with CpG-aware transition counting.
//!
//! $$ K = -\frac{1}{2} \ln(1 - 2p - q) - \frac{1}{4} \ln(1 - 2q) $$
//!
//! where `p` and `q` are the transition and transversion frequencies over the
//! well-characterized columns. Results are percentages.

use crate::libs::nt::Substitution;
use serde::Serialize;

/// Weight of a lone transition at a CpG site.
pub const CPG_TRANSITION_WEIGHT: f64 = 0.1;

/// Divergence reported when nothing could be compared.
pub const UNDEFINED_DIVERGENCE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum KimuraEstimate {
    /// Percent divergence
    Estimated(f64),
    /// A log argument was not positive
    Saturated,
    /// No well-characterized bases
    Undefined,
}

impl KimuraEstimate {
    /// Resolve to a percentage, clamping to `ceiling`.
    ///
    /// ```
    /// use rmrescore::libs::divergence::KimuraEstimate;
    /// assert_eq!(KimuraEstimate::Estimated(12.5).value(70.0), 12.5);
    /// assert_eq!(KimuraEstimate::Estimated(80.0).value(70.0), 70.0);
    /// assert_eq!(KimuraEstimate::Saturated.value(70.0), 70.0);
    /// assert_eq!(KimuraEstimate::Undefined.value(70.0), 100.0);
    /// ```
    pub fn value(&self, ceiling: f64) -> f64 {
        match *self {
            KimuraEstimate::Estimated(k) => k.min(ceiling),
            KimuraEstimate::Saturated => ceiling,
            KimuraEstimate::Undefined => UNDEFINED_DIVERGENCE,
        }
    }

    pub fn is_saturated(&self) -> bool {
        matches!(self, KimuraEstimate::Saturated)
    }
}

/// Kimura divergence from transition and transversion counts.
///
/// ```
/// use rmrescore::libs::divergence::{estimate, KimuraEstimate};
/// assert_eq!(estimate(0.0, 0.0, 100), KimuraEstimate::Estimated(0.0));
/// assert_eq!(estimate(0.0, 0.0, 0), KimuraEstimate::Undefined);
/// assert_eq!(estimate(40.0, 30.0, 100), KimuraEstimate::Saturated);
/// ```
pub fn estimate(transitions: f64, transversions: f64, well_characterized: u32) -> KimuraEstimate {
    if well_characterized == 0 {
        return KimuraEstimate::Undefined;
    }
    let n = well_characterized as f64;
    let p = transitions / n;
    let q = transversions / n;

    let log_p = 1.0 - 2.0 * p - q;
    let log_q = 1.0 - 2.0 * q;
    if log_p <= 0.0 || log_q <= 0.0 {
        return KimuraEstimate::Saturated;
    }

    let k = -0.5 * log_p.ln() - 0.25 * log_q.ln();
    // -0.0 from ln(1.0)
    KimuraEstimate::Estimated((k * 100.0).max(0.0))
}

/// Per-alignment substitution tallies feeding [`estimate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SubstitutionCounts {
    /// Fractional when CpG sites are down-weighted
    pub transitions: f64,
    pub transversions: u32,
    pub well_characterized: u32,
    pub ambiguous: u32,
}

impl SubstitutionCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a substitution column. Transitions are added at full weight.
    pub fn add(&mut self, sub: Substitution) {
        match sub {
            Substitution::Match => self.well_characterized += 1,
            Substitution::Transition => {
                self.well_characterized += 1;
                self.transitions += 1.0;
            }
            Substitution::Transversion => {
                self.well_characterized += 1;
                self.transversions += 1;
            }
            Substitution::Ambiguous => self.ambiguous += 1,
        }
    }

    /// Count a substitution column at one position of a CpG site whose transitions are
    /// tallied separately by [`add_cpg_transitions`](Self::add_cpg_transitions).
    pub fn add_cpg_position(&mut self, sub: Substitution) {
        match sub {
            Substitution::Transition => self.well_characterized += 1,
            other => self.add(other),
        }
    }

    /// Add the transitions seen at the two positions of one CpG site.
    ///
    /// One transition weighs [`CPG_TRANSITION_WEIGHT`]; transitions at both positions
    /// count together as a single full transition.
    pub fn add_cpg_transitions(&mut self, c_transition: bool, g_transition: bool) {
        self.transitions += match (c_transition, g_transition) {
            (true, true) => 1.0,
            (true, false) | (false, true) => CPG_TRANSITION_WEIGHT,
            (false, false) => 0.0,
        };
    }

    pub fn kimura(&self) -> KimuraEstimate {
        estimate(
            self.transitions,
            self.transversions as f64,
            self.well_characterized,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kimura_known_value() {
        // p = 0.1, q = 0.05
        // -0.5 * ln(0.75) - 0.25 * ln(0.9) = 0.14384 + 0.02634
        match estimate(10.0, 5.0, 100) {
            KimuraEstimate::Estimated(k) => assert_relative_eq!(k, 17.0180, epsilon = 1e-3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_kimura_saturation_boundaries() {
        // 1 - 2p - q < 0
        assert!(estimate(40.0, 30.0, 100).is_saturated());
        // 1 - 2q == 0
        assert!(estimate(0.0, 50.0, 100).is_saturated());
        assert!(!estimate(24.0, 49.0, 100).is_saturated());
    }

    #[test]
    fn test_kimura_monotone() {
        let n = 200;
        let mut last = 0.0;
        for ts in 0..60 {
            let k = estimate(ts as f64, 10.0, n).value(100.0);
            assert!(k >= last, "{} < {} at ts {}", k, last, ts);
            last = k;
        }
        let mut last = 0.0;
        for tv in 0..100 {
            let k = estimate(10.0, tv as f64, n).value(100.0);
            assert!(k >= last, "{} < {} at tv {}", k, last, tv);
            last = k;
        }
    }

    #[test]
    fn test_counts_with_cpg_sites() {
        let mut counts = SubstitutionCounts::new();
        counts.add(Substitution::Match);
        counts.add(Substitution::Transversion);
        counts.add(Substitution::Transition);
        counts.add(Substitution::Ambiguous);

        // a site where only C->T happened
        counts.add_cpg_position(Substitution::Transition);
        counts.add_cpg_position(Substitution::Match);
        counts.add_cpg_transitions(true, false);

        // a site where both positions moved
        counts.add_cpg_position(Substitution::Transition);
        counts.add_cpg_position(Substitution::Transition);
        counts.add_cpg_transitions(true, true);

        assert_relative_eq!(counts.transitions, 2.1, epsilon = 1e-9);
        assert_eq!(counts.transversions, 1);
        assert_eq!(counts.well_characterized, 7);
        assert_eq!(counts.ambiguous, 1);
    }
}
