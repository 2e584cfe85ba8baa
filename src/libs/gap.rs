use serde::{Deserialize, Serialize};

/// Affine gap scores, configurable separately for insertions and deletions.
///
/// Values are added to the alignment score, so penalties are normally negative.
/// The first column of a gap run scores `open`; every further column of the same
/// run scores the extension of its kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapPenaltyModel {
    pub open: i32,
    pub ins_extend: i32,
    pub del_extend: i32,
}

impl Default for GapPenaltyModel {
    fn default() -> Self {
        Self::repeatmasker()
    }
}

impl GapPenaltyModel {
    pub fn new(open: i32, ins_extend: i32, del_extend: i32) -> Self {
        GapPenaltyModel {
            open,
            ins_extend,
            del_extend,
        }
    }

    /// Same extension for insertions and deletions.
    pub fn symmetric(open: i32, extend: i32) -> Self {
        Self::new(open, extend, extend)
    }

    /// Open -30, extend -6.
    pub fn repeatmasker() -> Self {
        Self::symmetric(-30, -6)
    }

    pub fn extend(&self, kind: GapKind) -> i32 {
        match kind {
            GapKind::Insertion => self.ins_extend,
            GapKind::Deletion => self.del_extend,
        }
    }

    /// Score of a single gap of `len` columns.
    ///
    /// ```
    /// use rmrescore::libs::gap::{GapKind, GapPenaltyModel};
    /// let gaps = GapPenaltyModel::repeatmasker();
    /// assert_eq!(gaps.run_score(GapKind::Insertion, 0), 0);
    /// assert_eq!(gaps.run_score(GapKind::Insertion, 1), -30);
    /// assert_eq!(gaps.run_score(GapKind::Deletion, 16), -120);
    /// ```
    pub fn run_score(&self, kind: GapKind, len: usize) -> i32 {
        if len == 0 {
            0
        } else {
            self.open + self.extend(kind) * (len as i32 - 1)
        }
    }
}

/// Insertion: the query has bases the subject lacks (subject gapped).
/// Deletion: the subject has bases the query lacks (query gapped).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GapKind {
    Insertion,
    Deletion,
}

/// Tracks the gap run the column walk is in.
#[derive(Clone, Copy, Debug, Default)]
pub struct GapRun {
    kind: Option<GapKind>,
}

impl GapRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score one gap column of `kind`, opening a new run if needed.
    pub fn step(&mut self, kind: GapKind, gaps: &GapPenaltyModel) -> i32 {
        if self.kind == Some(kind) {
            gaps.extend(kind)
        } else {
            self.kind = Some(kind);
            gaps.open
        }
    }

    /// A substitution column ends any run.
    pub fn close(&mut self) {
        self.kind = None;
    }

    pub fn is_active(&self) -> bool {
        self.kind.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gap_run_charges() {
        let gaps = GapPenaltyModel::new(-30, -6, -5);
        let mut run = GapRun::new();
        assert!(!run.is_active());

        let scores: Vec<i32> = [
            GapKind::Insertion,
            GapKind::Insertion,
            GapKind::Insertion,
            GapKind::Deletion,
            GapKind::Deletion,
        ]
        .iter()
        .map(|&k| run.step(k, &gaps))
        .collect();
        // switching kind opens a new run
        assert_eq!(scores, vec![-30, -6, -6, -30, -5]);
        assert!(run.is_active());

        run.close();
        assert_eq!(run.step(GapKind::Deletion, &gaps), -30);
    }

    #[test]
    fn test_run_score_matches_steps() {
        let gaps = GapPenaltyModel::new(-25, -4, -7);
        for kind in [GapKind::Insertion, GapKind::Deletion] {
            let mut run = GapRun::new();
            let summed: i32 = (0..9).map(|_| run.step(kind, &gaps)).sum();
            assert_eq!(summed, gaps.run_score(kind, 9));
        }
    }
}
