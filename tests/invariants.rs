use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rmrescore::libs::gap::GapPenaltyModel;
use rmrescore::libs::matrix::ScoringMatrix;
use rmrescore::libs::nt;
use rmrescore::libs::record::AlignmentRecord;
use rmrescore::{rescore, rescore_all, RescoreOptions};

const SYMBOLS: &[u8] = b"ACGTACGTACGTacgtNR--";

fn random_pair(rng: &mut SmallRng, len: usize) -> (String, String) {
    let mut q = Vec::with_capacity(len);
    let mut s = Vec::with_capacity(len);
    for _ in 0..len {
        let a = SYMBOLS[rng.gen_range(0..SYMBOLS.len())];
        // mostly similar, like a real hit
        let b = if rng.gen_bool(0.7) && !nt::is_gap(a) {
            a.to_ascii_uppercase()
        } else {
            SYMBOLS[rng.gen_range(0..SYMBOLS.len())]
        };
        q.push(a);
        s.push(b);
    }
    (
        String::from_utf8(q).unwrap(),
        String::from_utf8(s).unwrap(),
    )
}

fn all_options() -> Vec<RescoreOptions> {
    let mut opts = vec![];
    for bits in 0..8 {
        opts.push(
            RescoreOptions::default()
                .with_complexity_adjust(bits & 1 != 0)
                .with_score_cpg_mod(bits & 2 != 0)
                .with_div_cpg_mod(bits & 4 != 0),
        );
    }
    opts
}

#[test]
fn column_accounting() {
    let mut rng = SmallRng::seed_from_u64(42);
    let matrix = ScoringMatrix::hoxd55();
    let gaps = GapPenaltyModel::repeatmasker();

    for _ in 0..200 {
        let len = rng.gen_range(1..300);
        let (q, s) = random_pair(&mut rng, len);
        let rec = AlignmentRecord::from_pair(&q, &s);

        let substitutions = q
            .bytes()
            .zip(s.bytes())
            .filter(|&(a, b)| !nt::is_gap(a) && !nt::is_gap(b))
            .count() as u32;

        for opt in all_options() {
            let res = rescore(&rec, &matrix, &gaps, &opt).unwrap();

            assert_eq!(
                res.well_characterized_bases + res.ambiguous_bases,
                substitutions
            );
            assert!(
                res.transitions + res.transversions as f64
                    <= res.well_characterized_bases as f64 + 1e-9
            );
            assert_eq!(res.position_scores.len(), len);
            assert_eq!(res.position_scores.iter().sum::<i32>(), res.raw_score);
            if !opt.complexity_adjust {
                assert_eq!(res.score, res.raw_score);
                assert!(res.fragment_breaks.is_empty());
            }
            assert!((0.0..=100.0).contains(&res.kimura_divergence));
            assert!((0.0..=100.0).contains(&res.pct_insert));
            assert!((0.0..=100.0).contains(&res.pct_delete));
            if res.well_characterized_bases == 0 {
                assert_eq!(res.kimura_divergence, 100.0);
                assert_eq!(res.transitions, 0.0);
                assert_eq!(res.transversions, 0);
            }
        }
    }
}

#[test]
fn rescoring_is_stable() {
    let mut rng = SmallRng::seed_from_u64(7);
    let matrix = ScoringMatrix::identity();
    let gaps = GapPenaltyModel::new(-30, -6, -5);
    let opt = RescoreOptions::default();

    let mut recs = vec![];
    for _ in 0..50 {
        let len = rng.gen_range(10..120);
        let (q, s) = random_pair(&mut rng, len);
        let mut rec = AlignmentRecord::from_pair(&q, &s);
        rec.score = rescore(&rec, &matrix, &gaps, &opt).unwrap().score;
        recs.push(rec);
    }

    // the score an aligner reported with the same parameters comes back unchanged
    for (rec, res) in recs.iter().zip(rescore_all(&recs, &matrix, &gaps, &opt)) {
        assert_eq!(res.unwrap().score, rec.score);
    }
}

#[test]
fn matches_only_alignment_has_no_divergence() {
    let matrix = ScoringMatrix::hoxd55();
    let rec = AlignmentRecord::from_pair("ACGTTGCAAC", "ACGTTGCAAC");
    let res = rescore(
        &rec,
        &matrix,
        &GapPenaltyModel::default(),
        &RescoreOptions::default(),
    )
    .unwrap();
    assert_eq!(res.kimura_divergence, 0.0);
    assert_eq!(res.score, 91 * 5 + 100 * 5);
}
