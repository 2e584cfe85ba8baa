//! Rescoring and divergence estimation for repeat annotation alignments.
//!
//! Takes gapped query/consensus alignments produced by an external aligner and
//! recomputes their scores under arbitrary matrices and gap scores, with optional
//! low-complexity down-weighting and a CpG-aware Kimura divergence.

pub mod libs;

pub use libs::error::{Diagnostic, RescoreError};
pub use libs::rescore::{rescore, rescore_all, rescore_in_place, RescoreOptions, RescoreResult};
