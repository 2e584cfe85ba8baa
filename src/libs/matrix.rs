use crate::libs::gap::GapPenaltyModel;
use crate::libs::nt;
use anyhow::{anyhow, Result};
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use std::io::BufRead;
use std::str::FromStr;

lazy_static! {
    static ref GAP_PARAM: Regex = Regex::new(r"\b([OE])\s*=\s*(-?\d+)").unwrap();
}

/// A nucleotide substitution matrix for rescoring alignments.
///
/// Stores scores for all pairs of bytes (256x256). An entry is either defined or
/// undefined; undefined entries are pairs the matrix does not characterize. Lookups
/// ignore case.
///
/// A matrix never changes after construction and can be shared between threads.
#[derive(Clone, Debug)]
pub struct ScoringMatrix {
    name: String,
    matrix: Vec<Option<i32>>,
    gaps: Option<GapPenaltyModel>,
}

impl Default for ScoringMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl ScoringMatrix {
    fn empty(name: &str) -> Self {
        ScoringMatrix {
            name: name.to_string(),
            matrix: vec![None; 256 * 256],
            gaps: None,
        }
    }

    /// Fill an entry for all case combinations.
    fn set(&mut self, r: u8, c: u8, score: i32) {
        let rows = [r.to_ascii_uppercase(), r.to_ascii_lowercase()];
        let cols = [c.to_ascii_uppercase(), c.to_ascii_lowercase()];
        for &r in &rows {
            for &c in &cols {
                self.matrix[(r as usize) * 256 + (c as usize)] = Some(score);
            }
        }
    }

    /// Build from a symbol list and a square table of scores.
    ///
    /// ```
    /// use rmrescore::libs::matrix::ScoringMatrix;
    /// let m = ScoringMatrix::from_table("tiny", b"AC", &[vec![5, -4], vec![-4, 5]]).unwrap();
    /// assert_eq!(m.get(b'a', b'C'), Some(-4));
    /// assert_eq!(m.get(b'A', b'G'), None);
    /// ```
    pub fn from_table(name: &str, symbols: &[u8], scores: &[Vec<i32>]) -> Result<Self> {
        if scores.len() != symbols.len() || scores.iter().any(|row| row.len() != symbols.len()) {
            return Err(anyhow!(
                "Matrix {} is not square over {} symbols",
                name,
                symbols.len()
            ));
        }
        let mut m = Self::empty(name);
        for (i, &r) in symbols.iter().enumerate() {
            for (j, &c) in symbols.iter().enumerate() {
                m.set(r, c, scores[i][j]);
            }
        }
        Ok(m)
    }

    /// +100 for a match, -100 for a mismatch, -100 for anything against N.
    pub fn identity() -> Self {
        let mut m = Self::empty("identity");
        let bases = b"ACGT";
        for &b1 in bases {
            for &b2 in bases {
                m.set(b1, b2, if b1 == b2 { 100 } else { -100 });
            }
        }
        for &b in b"ACGTN" {
            m.set(b'N', b, -100);
            m.set(b, b'N', -100);
        }
        m
    }

    /// HoxD55 matrix (Lastz default), gap costs 400/30.
    pub fn hoxd55() -> Self {
        //     A    C    G    T
        // A  91 -114  -31 -123
        // C -114 100 -125  -31
        // G  -31 -125 100 -114
        // T -123  -31 -114  91
        let scores = [
            vec![91, -114, -31, -123],
            vec![-114, 100, -125, -31],
            vec![-31, -125, 100, -114],
            vec![-123, -31, -114, 91],
        ];
        let mut m = Self::empty("hoxd55");
        for (i, &b1) in b"ACGT".iter().enumerate() {
            for (j, &b2) in b"ACGT".iter().enumerate() {
                m.set(b1, b2, scores[i][j]);
            }
        }
        for &b in b"ACGTN" {
            m.set(b'N', b, -100);
            m.set(b, b'N', -100);
        }
        m.gaps = Some(GapPenaltyModel::symmetric(-400, -30));
        m
    }

    /// Load a preset by name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "identity" | "default" => Ok(Self::identity()),
            "hoxd55" => Ok(Self::hoxd55()),
            _ => Err(anyhow!(
                "Unknown matrix preset: {}. Parse the matrix text with ScoringMatrix::from_reader",
                name
            )),
        }
    }

    /// Parse a matrix in BLAST / RepeatMasker layout.
    ///
    /// The text contains a header line of single-letter symbols (e.g. "A R G C Y T K M S W N X")
    /// and one row of scores per symbol, optionally prefixed by the row symbol.
    /// Lines starting with '#' are comments and lines that do not fit the table are skipped.
    /// Optional gap scores can be given with "O=..." and "E=..." lines.
    pub fn from_reader<R: BufRead>(name: &str, reader: R) -> Result<Self> {
        let mut m = Self::empty(name);
        let mut gap_open = None;
        let mut gap_extend = None;

        // Default to A, C, G, T if no header found
        let mut chars: Vec<u8> = b"ACGT".to_vec();
        let mut rows_read = 0;

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if GAP_PARAM.is_match(line) {
                for cap in GAP_PARAM.captures_iter(line) {
                    let v: i32 = cap[2].parse()?;
                    match &cap[1] {
                        "O" => gap_open = Some(v),
                        _ => gap_extend = Some(v),
                    }
                }
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();

            if rows_read == 0
                && parts
                    .iter()
                    .all(|s| s.len() == 1 && s.as_bytes()[0].is_ascii_alphabetic())
            {
                chars = parts.iter().map(|s| s.as_bytes()[0]).collect();
                continue;
            }

            if rows_read >= chars.len() {
                continue;
            }
            let row_char = chars[rows_read];
            let val_start = if parts.len() > chars.len() { 1 } else { 0 };
            if val_start == 1 && !parts[0].as_bytes()[0].eq_ignore_ascii_case(&row_char) {
                continue;
            }

            let values: Vec<i32> = match parts[val_start..]
                .iter()
                .take(chars.len())
                .map(|s| s.parse::<i32>())
                .collect::<Result<Vec<_>, _>>()
            {
                Ok(v) if v.len() == chars.len() => v,
                _ => continue,
            };
            for (j, &val) in values.iter().enumerate() {
                m.set(row_char, chars[j], val);
            }
            rows_read += 1;
        }

        if rows_read < chars.len() {
            return Err(anyhow!(
                "Matrix {} has {} rows, expected {}",
                name,
                rows_read,
                chars.len()
            ));
        }

        m.gaps = match (gap_open, gap_extend) {
            (Some(o), Some(e)) => Some(GapPenaltyModel::symmetric(o, e)),
            (Some(o), None) => Some(GapPenaltyModel::symmetric(o, 0)),
            (None, Some(e)) => Some(GapPenaltyModel::symmetric(0, e)),
            (None, None) => None,
        };
        log::trace!("Loaded matrix {} over {} symbols", name, chars.len());
        Ok(m)
    }

    /// Fill undefined IUPAC entries with the rounded mean of the base pairs they stand for.
    ///
    /// Entries already present are left as they are. An entry stays undefined if none of
    /// its expanded base pairs is defined.
    pub fn with_ambiguity_averages(mut self) -> Self {
        let mut symbols: Vec<u8> = b"ACGT".to_vec();
        symbols.extend(nt::IUPAC_CODES.iter().map(|(code, _)| *code));

        for &r in &symbols {
            for &c in &symbols {
                if self.get(r, c).is_some() {
                    continue;
                }
                let (Some(rs), Some(cs)) = (nt::expand_iupac(r), nt::expand_iupac(c)) else {
                    continue;
                };
                let defined: Vec<i32> = rs
                    .iter()
                    .cartesian_product(cs.iter())
                    .filter_map(|(&x, &y)| self.get(x, y))
                    .collect();
                if defined.is_empty() {
                    continue;
                }
                let mean = defined.iter().sum::<i32>() as f64 / defined.len() as f64;
                self.set(r, c, mean.round() as i32);
            }
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gap scores carried by the matrix text, if any.
    pub fn gaps(&self) -> Option<&GapPenaltyModel> {
        self.gaps.as_ref()
    }

    /// The substitution score for an aligned pair, `None` when the pair is not characterized.
    #[inline]
    pub fn get(&self, q: u8, s: u8) -> Option<i32> {
        self.matrix[(q as usize) * 256 + (s as usize)]
    }
}

impl FromStr for ScoringMatrix {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_reader("custom", s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let m = ScoringMatrix::default();
        assert_eq!(m.get(b'A', b'A'), Some(100));
        assert_eq!(m.get(b'A', b'C'), Some(-100));
        assert_eq!(m.get(b'a', b'A'), Some(100));
        assert_eq!(m.get(b'A', b'a'), Some(100));
        assert_eq!(m.get(b'N', b'A'), Some(-100));
        assert_eq!(m.get(b'R', b'A'), None);
    }

    #[test]
    fn test_parse_repeatmasker_layout() {
        let text = "\
# toy matrix
FREQS A 0.325 C 0.175 G 0.175 T 0.325
    A   G   C   T   N
A   8  -2 -15 -16  -1
G  -2  10 -15 -15  -1
C -15 -15  10  -2  -1
T -16 -15  -2   8  -1
N  -1  -1  -1  -1  -1
O = -30, E = -6
";
        let m: ScoringMatrix = text.parse().unwrap();
        assert_eq!(m.get(b'A', b'A'), Some(8));
        assert_eq!(m.get(b'g', b'a'), Some(-2));
        assert_eq!(m.get(b'T', b'C'), Some(-2));
        assert_eq!(m.get(b'N', b't'), Some(-1));
        assert_eq!(m.get(b'R', b'A'), None);

        let gaps = m.gaps().unwrap();
        assert_eq!(gaps.open, -30);
        assert_eq!(gaps.ins_extend, -6);
        assert_eq!(gaps.del_extend, -6);
    }

    #[test]
    fn test_parse_unlabelled_rows() {
        let text = "\
A C G T
1 -1 -1 -1
-1 1 -1 -1
-1 -1 1 -1
-1 -1 -1 1
";
        let m = ScoringMatrix::from_reader("unit", text.as_bytes()).unwrap();
        assert_eq!(m.name(), "unit");
        assert_eq!(m.get(b'C', b'C'), Some(1));
        assert_eq!(m.get(b'C', b'G'), Some(-1));
        assert!(m.gaps().is_none());
    }

    #[test]
    fn test_parse_short_matrix_fails() {
        let text = "A C G T\n1 -1 -1 -1\n";
        assert!(ScoringMatrix::from_reader("short", text.as_bytes()).is_err());
        assert!(ScoringMatrix::from_name("25p41g").is_err());
    }

    #[test]
    fn test_ambiguity_averages() {
        let m = ScoringMatrix::hoxd55().with_ambiguity_averages();
        // R = A/G; against A: (91 + -31) / 2
        assert_eq!(m.get(b'R', b'A'), Some(30));
        assert_eq!(m.get(b'a', b'r'), Some(30));
        // existing N entries are kept
        assert_eq!(m.get(b'N', b'A'), Some(-100));
        assert_eq!(m.gaps().map(|g| g.open), Some(-400));
    }
}
