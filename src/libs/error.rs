use serde::Serialize;
use thiserror::Error;

/// Errors that abort a single rescore call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RescoreError {
    /// The gapped query and subject strings differ in length
    #[error("Alignment lengths differ: query {query_len} vs subject {subj_len}")]
    AlignmentShape { query_len: usize, subj_len: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Non-fatal anomalies reported next to a best-effort result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Diagnostic {
    /// The matrix has no entry for this pair; the column was scored 0 and counted ambiguous
    UnknownSymbol { query: char, subject: char },
    /// The Kimura log argument was not positive; the divergence was clamped
    DivergenceSaturation {
        transitions: f64,
        transversions: u32,
        well_characterized: u32,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnknownSymbol { query, subject } => {
                write!(f, "No matrix entry for {}/{}", query, subject)
            }
            Diagnostic::DivergenceSaturation {
                transitions,
                transversions,
                well_characterized,
            } => write!(
                f,
                "Too divergent for Kimura estimate: ts {:.2}, tv {}, over {} bases",
                transitions, transversions, well_characterized
            ),
        }
    }
}
