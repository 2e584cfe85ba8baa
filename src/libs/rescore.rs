//! Rescoring of gapped pairwise alignments.
//!
//! One pass over the aligned columns computes:
//!
//! * the score under a substitution matrix and affine gap scores,
//! * transition / transversion tallies and the Kimura divergence,
//! * CpG sites of the subject (consensus) and their special treatment,
//! * insertion / deletion percentages,
//! * optionally, a complexity-adjusted score and X-drop fragment breaks.
//!
//! Inputs are only read, so matrices and gap models can be shared by any number of
//! concurrent calls.

use crate::libs::complexity::{
    ComplexityAdjuster, ComplexityParams, ComplexityWeight, EntropyWeight,
};
use crate::libs::divergence::SubstitutionCounts;
use crate::libs::error::{Diagnostic, RescoreError};
use crate::libs::gap::{GapKind, GapPenaltyModel, GapRun};
use crate::libs::matrix::ScoringMatrix;
use crate::libs::nt::{self, Substitution};
use crate::libs::record::AlignmentRecord;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RescoreOptions {
    /// Replace the score by the best down-weighted contiguous run
    pub complexity_adjust: bool,
    /// Score transitions at CpG sites with `cpg_transition_score`
    pub score_cpg_mod: bool,
    /// Count transitions at CpG sites fractionally in the divergence
    pub div_cpg_mod: bool,
    /// Used instead of the gap model passed to [`rescore`]
    pub gap_override: Option<GapPenaltyModel>,
    pub cpg_transition_score: i32,
    /// Divergence reported when the Kimura estimate saturates
    pub divergence_ceiling: f64,
    pub complexity: ComplexityParams,
}

impl Default for RescoreOptions {
    fn default() -> Self {
        RescoreOptions {
            complexity_adjust: false,
            score_cpg_mod: false,
            div_cpg_mod: false,
            gap_override: None,
            cpg_transition_score: 0,
            divergence_ceiling: 100.0,
            complexity: ComplexityParams::default(),
        }
    }
}

impl RescoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_complexity_adjust(mut self, on: bool) -> Self {
        self.complexity_adjust = on;
        self
    }

    pub fn with_score_cpg_mod(mut self, on: bool) -> Self {
        self.score_cpg_mod = on;
        self
    }

    pub fn with_div_cpg_mod(mut self, on: bool) -> Self {
        self.div_cpg_mod = on;
        self
    }

    pub fn with_gaps(mut self, gaps: GapPenaltyModel) -> Self {
        self.gap_override = Some(gaps);
        self
    }

    pub fn with_cpg_transition_score(mut self, score: i32) -> Self {
        self.cpg_transition_score = score;
        self
    }

    pub fn with_divergence_ceiling(mut self, ceiling: f64) -> Self {
        self.divergence_ceiling = ceiling;
        self
    }

    pub fn with_complexity(mut self, params: ComplexityParams) -> Self {
        self.complexity = params;
        self
    }

    pub fn validate(&self) -> Result<(), RescoreError> {
        if !self.divergence_ceiling.is_finite() || self.divergence_ceiling <= 0.0 {
            return Err(RescoreError::InvalidParameter(format!(
                "divergence ceiling must be positive, got {}",
                self.divergence_ceiling
            )));
        }
        if self.complexity.xdrop < 0 {
            return Err(RescoreError::InvalidParameter(format!(
                "xdrop must not be negative, got {}",
                self.complexity.xdrop
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RescoreResult {
    /// Complexity-adjusted when requested, otherwise equal to `raw_score`.
    ///
    /// The adjusted score is the best contiguous run, so gap penalties at the ends of the
    /// alignment are not charged and it may exceed `raw_score`.
    pub score: i32,
    pub raw_score: i32,
    /// Percent, in `[0, divergence_ceiling]`, or 100 when nothing was comparable
    pub kimura_divergence: f64,
    pub divergence_saturated: bool,
    pub cpg_sites: u32,
    pub pct_insert: f64,
    pub pct_delete: f64,
    /// Each column's contribution to `raw_score`
    pub position_scores: Vec<i32>,
    pub fragment_breaks: Vec<usize>,
    pub well_characterized_bases: u32,
    pub ambiguous_bases: u32,
    pub transitions: f64,
    pub transversions: u32,
    pub inserted_bases: u32,
    pub deleted_bases: u32,
    /// Columns whose pair has no matrix entry
    pub unknown_pairs: u32,
    pub diagnostics: Vec<Diagnostic>,
}

/// Where a column sits relative to a CpG site of the subject.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CpgRole {
    /// The C, with the G at the given column
    C(usize),
    G,
}

/// A CpG site whose G column has not been reached yet.
#[derive(Clone, Copy, Debug)]
struct PendingSite {
    g_col: usize,
    c_transition: bool,
}

/// Next column after `i` where the subject has a base.
fn next_subject_base(subj: &[u8], i: usize) -> Option<usize> {
    subj.iter()
        .enumerate()
        .skip(i + 1)
        .find(|&(_, &b)| !nt::is_gap(b))
        .map(|(j, _)| j)
}

/// Rescore an alignment with the default entropy weighting for complexity adjustment.
///
/// `gaps` is used unless `options.gap_override` is set.
///
/// ```
/// use rmrescore::libs::gap::GapPenaltyModel;
/// use rmrescore::libs::matrix::ScoringMatrix;
/// use rmrescore::libs::record::AlignmentRecord;
/// use rmrescore::libs::rescore::{rescore, RescoreOptions};
///
/// let rec = AlignmentRecord::from_pair("ACGTA-", "ACGTAC");
/// let res = rescore(
///     &rec,
///     &ScoringMatrix::identity(),
///     &GapPenaltyModel::repeatmasker(),
///     &RescoreOptions::default(),
/// )
/// .unwrap();
/// assert_eq!(res.score, 5 * 100 - 30);
/// assert_eq!(res.kimura_divergence, 0.0);
/// ```
pub fn rescore(
    record: &AlignmentRecord,
    matrix: &ScoringMatrix,
    gaps: &GapPenaltyModel,
    options: &RescoreOptions,
) -> Result<RescoreResult, RescoreError> {
    let adjuster = ComplexityAdjuster::new(EntropyWeight::default(), options.complexity);
    rescore_with(record, matrix, gaps, options, &adjuster)
}

/// Rescore an alignment, down-weighting low-complexity columns with `adjuster`.
pub fn rescore_with<W: ComplexityWeight>(
    record: &AlignmentRecord,
    matrix: &ScoringMatrix,
    gaps: &GapPenaltyModel,
    options: &RescoreOptions,
    adjuster: &ComplexityAdjuster<W>,
) -> Result<RescoreResult, RescoreError> {
    let query = record.query_seq.as_bytes();
    let subj = record.subj_seq.as_bytes();
    if query.len() != subj.len() {
        return Err(RescoreError::AlignmentShape {
            query_len: query.len(),
            subj_len: subj.len(),
        });
    }
    options.validate()?;
    let gaps = options.gap_override.as_ref().unwrap_or(gaps);

    let len = query.len();
    let mut position_scores: Vec<i32> = Vec::with_capacity(len);
    let mut counts = SubstitutionCounts::new();
    let mut run = GapRun::new();
    let mut pending: Option<PendingSite> = None;

    let mut inserted_bases = 0u32;
    let mut deleted_bases = 0u32;
    let mut cpg_sites = 0u32;
    let mut unknown_pairs = 0u32;
    let mut diagnostics: Vec<Diagnostic> = vec![];

    for i in 0..len {
        let (qb, sb) = (query[i], subj[i]);
        let q_gap = nt::is_gap(qb);
        let s_gap = nt::is_gap(sb);

        if q_gap && s_gap {
            position_scores.push(0);
            continue;
        }

        let role = match pending {
            Some(site) if site.g_col == i => Some(CpgRole::G),
            _ if sb.eq_ignore_ascii_case(&b'C') => next_subject_base(subj, i)
                .filter(|&j| subj[j].eq_ignore_ascii_case(&b'G'))
                .map(CpgRole::C),
            _ => None,
        };
        if let Some(CpgRole::C(g_col)) = role {
            cpg_sites += 1;
            pending = Some(PendingSite {
                g_col,
                c_transition: false,
            });
        }

        if q_gap || s_gap {
            let kind = if s_gap {
                inserted_bases += 1;
                GapKind::Insertion
            } else {
                deleted_bases += 1;
                GapKind::Deletion
            };
            position_scores.push(run.step(kind, gaps));

            // the G of a site was deleted from the query
            if role == Some(CpgRole::G) {
                if let Some(site) = pending.take() {
                    if options.div_cpg_mod {
                        counts.add_cpg_transitions(site.c_transition, false);
                    }
                }
            }
            continue;
        }

        run.close();
        let (sub, mut score) = match matrix.get(qb, sb) {
            Some(score) => (Substitution::classify(qb, sb), score),
            None => {
                unknown_pairs += 1;
                let diag = Diagnostic::UnknownSymbol {
                    query: qb as char,
                    subject: sb as char,
                };
                if !diagnostics.contains(&diag) {
                    log::debug!(
                        "{}: {} at column {} of {} vs {}",
                        matrix.name(),
                        diag,
                        i,
                        record.query_name,
                        record.subj_name
                    );
                    diagnostics.push(diag);
                }
                (Substitution::Ambiguous, 0)
            }
        };
        let is_transition = sub == Substitution::Transition;

        if options.score_cpg_mod && role.is_some() && is_transition {
            score = options.cpg_transition_score;
        }
        position_scores.push(score);

        match role {
            Some(CpgRole::C(_)) if options.div_cpg_mod => {
                counts.add_cpg_position(sub);
                if let Some(site) = pending.as_mut() {
                    site.c_transition = is_transition;
                }
            }
            Some(CpgRole::G) if options.div_cpg_mod => {
                counts.add_cpg_position(sub);
                if let Some(site) = pending.take() {
                    counts.add_cpg_transitions(site.c_transition, is_transition);
                }
            }
            Some(CpgRole::G) => {
                pending = None;
                counts.add(sub);
            }
            _ => counts.add(sub),
        }
    }

    let raw_score: i32 = position_scores.iter().sum();

    let mut fragment_breaks = vec![];
    let mut divergence_saturated = false;
    let (score, kimura_divergence) = if counts.well_characterized == 0 {
        // Nothing comparable, e.g. a hit that is all gap on one side
        counts.transitions = 0.0;
        counts.transversions = 0;
        (raw_score, counts.kimura().value(options.divergence_ceiling))
    } else {
        let score = if options.complexity_adjust {
            let (adjusted, breaks) = adjuster.adjust(&position_scores, subj);
            fragment_breaks = breaks;
            adjusted
        } else {
            raw_score
        };

        let estimate = counts.kimura();
        if estimate.is_saturated() {
            divergence_saturated = true;
            let diag = Diagnostic::DivergenceSaturation {
                transitions: counts.transitions,
                transversions: counts.transversions,
                well_characterized: counts.well_characterized,
            };
            log::debug!("{} vs {}: {}", record.query_name, record.subj_name, diag);
            diagnostics.push(diag);
        }
        (score, estimate.value(options.divergence_ceiling))
    };

    let span = match record.query_span() {
        0 => query.iter().filter(|&&b| !nt::is_gap(b)).count(),
        n => n,
    };
    let pct = |n: u32| -> f64 {
        if span == 0 {
            0.0
        } else {
            (n as f64 / span as f64 * 100.0).min(100.0)
        }
    };

    log::trace!(
        "{} vs {}: score {} (raw {}), kimura {:.2}, ts {:.1}, tv {}, well {}",
        record.query_name,
        record.subj_name,
        score,
        raw_score,
        kimura_divergence,
        counts.transitions,
        counts.transversions,
        counts.well_characterized
    );

    Ok(RescoreResult {
        score,
        raw_score,
        kimura_divergence,
        divergence_saturated,
        cpg_sites,
        pct_insert: pct(inserted_bases),
        pct_delete: pct(deleted_bases),
        position_scores,
        fragment_breaks,
        well_characterized_bases: counts.well_characterized,
        ambiguous_bases: counts.ambiguous,
        transitions: counts.transitions,
        transversions: counts.transversions,
        inserted_bases,
        deleted_bases,
        unknown_pairs,
        diagnostics,
    })
}

/// Rescore and write score, divergence and indel percentages back onto the record.
pub fn rescore_in_place(
    record: &mut AlignmentRecord,
    matrix: &ScoringMatrix,
    gaps: &GapPenaltyModel,
    options: &RescoreOptions,
) -> Result<RescoreResult, RescoreError> {
    let result = rescore(record, matrix, gaps, options)?;
    record.apply(&result);
    Ok(result)
}

/// Rescore independent records in parallel. Results keep the input order.
pub fn rescore_all(
    records: &[AlignmentRecord],
    matrix: &ScoringMatrix,
    gaps: &GapPenaltyModel,
    options: &RescoreOptions,
) -> Vec<Result<RescoreResult, RescoreError>> {
    records
        .par_iter()
        .map(|record| rescore(record, matrix, gaps, options))
        .collect()
}
