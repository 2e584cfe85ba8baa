use crate::libs::nt;
use crate::libs::rescore::RescoreResult;
use std::str::FromStr;

/// Strand of the subject (consensus) in a hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Forward,
    Reverse,
}

impl FromStr for Orientation {
    type Err = anyhow::Error;

    /// Accepts `+`, `-` and RepeatMasker's `C`.
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "+" => Ok(Orientation::Forward),
            "-" | "C" | "c" => Ok(Orientation::Reverse),
            _ => Err(anyhow::anyhow!("Invalid orientation: {}", s)),
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Forward => write!(f, "+"),
            Orientation::Reverse => write!(f, "C"),
        }
    }
}

/// One scored hit of a query against a repeat consensus.
///
/// Coordinates are 1-based and inclusive. On reverse hits the subject start is the
/// larger coordinate, as the aligner reports it. `query_seq` and `subj_seq` are the
/// gapped strings of the alignment and have the same length.
#[derive(Debug, Clone, Default)]
pub struct AlignmentRecord {
    pub score: i32,
    pub pct_diverge: Option<f64>,
    pub pct_insert: Option<f64>,
    pub pct_delete: Option<f64>,
    pub pct_kimura_diverge: Option<f64>,
    pub query_name: String,
    pub query_start: usize,
    pub query_end: usize,
    pub query_remaining: usize,
    pub subj_name: String,
    pub subj_start: usize,
    pub subj_end: usize,
    pub subj_remaining: usize,
    pub orientation: Orientation,
    pub matrix_name: String,
    pub query_seq: String,
    pub subj_seq: String,
    // Bookkeeping for overlap resolution; never read here
    pub id: Option<u64>,
    pub lineage_id: Option<u64>,
    pub overlap: Option<u64>,
}

impl AlignmentRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// A record covering the whole of both gapped strings, forward strand.
    ///
    /// ```
    /// use rmrescore::libs::record::AlignmentRecord;
    /// let rec = AlignmentRecord::from_pair("AC-GT", "ACCGT");
    /// assert_eq!((rec.query_start, rec.query_end), (1, 4));
    /// assert_eq!((rec.subj_start, rec.subj_end), (1, 5));
    /// ```
    pub fn from_pair(query_seq: &str, subj_seq: &str) -> Self {
        let ungapped = |s: &str| s.bytes().filter(|&b| !nt::is_gap(b)).count();
        let q_len = ungapped(query_seq);
        let s_len = ungapped(subj_seq);

        AlignmentRecord {
            query_name: "query".to_string(),
            query_start: if q_len > 0 { 1 } else { 0 },
            query_end: q_len,
            subj_name: "subject".to_string(),
            subj_start: if s_len > 0 { 1 } else { 0 },
            subj_end: s_len,
            query_seq: query_seq.to_string(),
            subj_seq: subj_seq.to_string(),
            ..Self::default()
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        if orientation != self.orientation {
            std::mem::swap(&mut self.subj_start, &mut self.subj_end);
            self.orientation = orientation;
        }
        self
    }

    /// Gapped alignment length.
    pub fn len(&self) -> usize {
        self.query_seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.query_seq.is_empty()
    }

    /// Number of query bases the hit covers, 0 when the coordinates are unset.
    pub fn query_span(&self) -> usize {
        if self.query_start == 0 || self.query_end < self.query_start {
            0
        } else {
            self.query_end - self.query_start + 1
        }
    }

    /// Subject coordinates in ascending order, whatever the orientation.
    pub fn subj_bounds(&self) -> (usize, usize) {
        if self.subj_start <= self.subj_end {
            (self.subj_start, self.subj_end)
        } else {
            (self.subj_end, self.subj_start)
        }
    }

    pub fn subj_span(&self) -> usize {
        let (start, end) = self.subj_bounds();
        if start == 0 {
            0
        } else {
            end - start + 1
        }
    }

    /// Write a rescoring outcome back onto the hit. The aligned strings are not touched.
    pub fn apply(&mut self, result: &RescoreResult) {
        self.score = result.score;
        self.pct_kimura_diverge = Some(result.kimura_divergence);
        self.pct_insert = Some(result.pct_insert);
        self.pct_delete = Some(result.pct_delete);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation() {
        assert_eq!("+".parse::<Orientation>().unwrap(), Orientation::Forward);
        assert_eq!("C".parse::<Orientation>().unwrap(), Orientation::Reverse);
        assert_eq!("-".parse::<Orientation>().unwrap(), Orientation::Reverse);
        assert!("x".parse::<Orientation>().is_err());
        assert_eq!(Orientation::Reverse.to_string(), "C");
    }

    #[test]
    fn test_reverse_bounds() {
        let rec =
            AlignmentRecord::from_pair("ACGT-A", "ACGTTA").with_orientation(Orientation::Reverse);
        assert_eq!(rec.subj_start, 6);
        assert_eq!(rec.subj_end, 1);
        assert_eq!(rec.subj_bounds(), (1, 6));
        assert_eq!(rec.subj_span(), 6);
        assert_eq!(rec.query_span(), 5);
        assert_eq!(rec.len(), 6);
    }

    #[test]
    fn test_unset_coordinates() {
        let rec = AlignmentRecord::new();
        assert!(rec.is_empty());
        assert_eq!(rec.query_span(), 0);
        assert_eq!(rec.subj_span(), 0);
    }
}
