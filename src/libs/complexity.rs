//! Down-weighting of low-complexity stretches and X-drop fragmentation.
//!
//! Simple repeats match almost anything with a similar motif, so their columns inflate
//! alignment scores. Each column's positive score is scaled by a weight computed from the
//! base composition of a window of the subject around it, then a local maximum-subarray
//! scan with an X-drop bound finds the best-scoring contiguous run and the columns where
//! the alignment would better be split.

use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOW: usize = 24;
pub const DEFAULT_XDROP: i32 = 50;

/// Maps the A/C/G/T counts of a window to a score multiplier in `[0, 1]`.
///
/// Implementations must not increase the weight as the window loses diversity.
pub trait ComplexityWeight: Send + Sync {
    fn weight(&self, counts: &[u32; 4]) -> f64;
}

impl<F> ComplexityWeight for F
where
    F: Fn(&[u32; 4]) -> f64 + Send + Sync,
{
    fn weight(&self, counts: &[u32; 4]) -> f64 {
        self(counts).clamp(0.0, 1.0)
    }
}

/// Shannon entropy of the window, in bits, relative to `full_weight_entropy`.
///
/// The default of 2 bits is the entropy of a uniform A/C/G/T window, so any composition
/// bias costs score in proportion: a dinucleotide repeat keeps half, a homopolymer run
/// nothing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntropyWeight {
    pub full_weight_entropy: f64,
}

impl Default for EntropyWeight {
    fn default() -> Self {
        EntropyWeight {
            full_weight_entropy: 2.0,
        }
    }
}

impl ComplexityWeight for EntropyWeight {
    fn weight(&self, counts: &[u32; 4]) -> f64 {
        let total: u32 = counts.iter().sum();
        if total == 0 {
            return 1.0;
        }
        let entropy = counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| c as f64 / total as f64)
            .map(|p| -p * p.log2())
            .sum::<f64>();
        (entropy / self.full_weight_entropy).clamp(0.0, 1.0)
    }
}

/// Window and X-drop parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityParams {
    /// Width of the subject window, in alignment columns
    pub window: usize,
    /// How far the running score may fall below its maximum before the segment ends
    pub xdrop: i32,
}

impl Default for ComplexityParams {
    fn default() -> Self {
        ComplexityParams {
            window: DEFAULT_WINDOW,
            xdrop: DEFAULT_XDROP,
        }
    }
}

pub struct ComplexityAdjuster<W = EntropyWeight> {
    weight: W,
    params: ComplexityParams,
}

impl Default for ComplexityAdjuster {
    fn default() -> Self {
        Self::new(EntropyWeight::default(), ComplexityParams::default())
    }
}

impl<W: ComplexityWeight> ComplexityAdjuster<W> {
    pub fn new(weight: W, params: ComplexityParams) -> Self {
        ComplexityAdjuster { weight, params }
    }

    /// Rescale column scores and scan for the best contiguous run.
    ///
    /// Returns the rounded score of the best contiguous run of down-weighted columns and
    /// the columns where a segment peaked before its score dropped by more than the X-drop
    /// bound. A segment also restarts, without a break, when its sum falls below zero.
    ///
    /// Penalties at either end of the alignment fall outside the best run, so the result
    /// can exceed the plain column sum.
    ///
    /// `position_scores` and `subject` are indexed in lock-step.
    pub fn adjust(&self, position_scores: &[i32], subject: &[u8]) -> (i32, Vec<usize>) {
        let len = position_scores.len().min(subject.len());
        let half = self.params.window / 2;
        let xdrop = self.params.xdrop as f64;

        let mut window = BaseWindow::default();
        for &b in subject.iter().take((half + 1).min(len)) {
            window.push(b);
        }

        let mut breaks = vec![];
        let mut best = 0.0f64;
        let mut run = 0.0f64;
        let mut run_max = 0.0f64;
        let mut run_max_col: Option<usize> = None;

        for (i, &raw) in position_scores.iter().enumerate().take(len) {
            if i > 0 {
                if i + half < len {
                    window.push(subject[i + half]);
                }
                if i > half {
                    window.pop(subject[i - half - 1]);
                }
            }

            let score = if raw > 0 {
                raw as f64 * self.weight.weight(&window.counts)
            } else {
                raw as f64
            };

            run += score;
            if run > run_max {
                run_max = run;
                run_max_col = Some(i);
            }
            best = best.max(run_max);

            if run_max - run > xdrop {
                if let Some(col) = run_max_col {
                    breaks.push(col);
                }
                run = 0.0;
                run_max = 0.0;
                run_max_col = None;
            } else if run < 0.0 {
                run = 0.0;
                run_max = 0.0;
                run_max_col = None;
            }
        }

        (best.round() as i32, breaks)
    }
}

/// Base counts of the subject columns inside the window.
#[derive(Debug, Default)]
struct BaseWindow {
    counts: [u32; 4],
}

impl BaseWindow {
    fn slot(b: u8) -> Option<usize> {
        match b.to_ascii_uppercase() {
            b'A' => Some(0),
            b'C' => Some(1),
            b'G' => Some(2),
            b'T' => Some(3),
            _ => None,
        }
    }

    fn push(&mut self, b: u8) {
        if let Some(i) = Self::slot(b) {
            self.counts[i] += 1;
        }
    }

    fn pop(&mut self, b: u8) {
        if let Some(i) = Self::slot(b) {
            self.counts[i] = self.counts[i].saturating_sub(1);
        }
    }
}
