//! Nucleotide classes used when walking gapped alignments.

/// Symbols treated as alignment gaps.
pub const GAP_SYMBOLS: &[u8] = b"-.";

/// The IUPAC nucleotide codes and the unambiguous bases they stand for.
pub const IUPAC_CODES: &[(u8, &[u8])] = &[
    (b'R', b"AG"),
    (b'Y', b"CT"),
    (b'K', b"GT"),
    (b'M', b"AC"),
    (b'S', b"CG"),
    (b'W', b"AT"),
    (b'B', b"CGT"),
    (b'D', b"AGT"),
    (b'H', b"ACT"),
    (b'V', b"ACG"),
    (b'N', b"ACGT"),
];

/// Is `b` a gap character.
#[inline]
pub fn is_gap(b: u8) -> bool {
    GAP_SYMBOLS.contains(&b)
}

/// Is `b` one of `ACGT`, ignoring case.
#[inline]
pub fn is_base(b: u8) -> bool {
    matches!(b.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T')
}

#[inline]
pub fn is_purine(b: u8) -> bool {
    matches!(b.to_ascii_uppercase(), b'A' | b'G')
}

#[inline]
pub fn is_pyrimidine(b: u8) -> bool {
    matches!(b.to_ascii_uppercase(), b'C' | b'T')
}

/// Unambiguous bases an IUPAC code may stand for.
///
/// ```
/// use rmrescore::libs::nt::expand_iupac;
/// assert_eq!(expand_iupac(b'A'), Some(&b"A"[..]));
/// assert_eq!(expand_iupac(b'y'), Some(&b"CT"[..]));
/// assert_eq!(expand_iupac(b'X'), None);
/// ```
pub fn expand_iupac(b: u8) -> Option<&'static [u8]> {
    match b.to_ascii_uppercase() {
        b'A' => Some(b"A"),
        b'C' => Some(b"C"),
        b'G' => Some(b"G"),
        b'T' => Some(b"T"),
        u => IUPAC_CODES
            .iter()
            .find(|(code, _)| *code == u)
            .map(|(_, bases)| *bases),
    }
}

/// How the two symbols of an ungapped column relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Substitution {
    Match,
    /// A<->G or C<->T
    Transition,
    /// purine<->pyrimidine
    Transversion,
    /// Either symbol is not one of ACGT
    Ambiguous,
}

impl Substitution {
    /// Classify an aligned pair, ignoring case.
    ///
    /// ```
    /// use rmrescore::libs::nt::Substitution;
    /// assert_eq!(Substitution::classify(b'a', b'A'), Substitution::Match);
    /// assert_eq!(Substitution::classify(b'C', b'T'), Substitution::Transition);
    /// assert_eq!(Substitution::classify(b'G', b'C'), Substitution::Transversion);
    /// assert_eq!(Substitution::classify(b'N', b'C'), Substitution::Ambiguous);
    /// ```
    pub fn classify(q: u8, s: u8) -> Self {
        if !is_base(q) || !is_base(s) {
            return Substitution::Ambiguous;
        }
        let (q, s) = (q.to_ascii_uppercase(), s.to_ascii_uppercase());
        if q == s {
            Substitution::Match
        } else if (is_purine(q) && is_purine(s)) || (is_pyrimidine(q) && is_pyrimidine(s)) {
            Substitution::Transition
        } else {
            Substitution::Transversion
        }
    }

    pub fn is_well_characterized(&self) -> bool {
        !matches!(self, Substitution::Ambiguous)
    }
}
