//! Statistical and property tests for the similarity engine.
//!
//! The near-dup recall test exercises the probabilistic guarantee of the
//! default band/row split: pairs engineered to sit comfortably above the
//! similarity threshold must surface as candidates of each other in at
//! least 95% of trials. Generation is fully deterministic so the suite is
//! reproducible.

use proptest::prelude::*;

use shardsmith::core::records::{FunctionRecord, RecordStatus};
use shardsmith::detectors::lsh::{BandPlan, LshIndex};
use shardsmith::detectors::minhash::MinHashBuilder;
use shardsmith::detectors::normalize::normalize;
use shardsmith::detectors::resolver::{NearDupResolver, Resolution};
use shardsmith::{CorpusPipeline, MemorySink, ShardsmithConfig};

/// Deterministic 64-bit congruential generator for synthetic token streams.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }
}

fn synthetic_tokens(rng: &mut Lcg, count: usize) -> Vec<String> {
    (0..count).map(|_| format!("tok{}", rng.next() % 50_000)).collect()
}

#[test]
fn near_dup_recall_at_default_band_row_split() {
    let builder = MinHashBuilder::new(128, 7, 1);
    let plan = BandPlan::for_threshold(128, 0.8).unwrap();
    let mut rng = Lcg(0x5eed);

    let threshold_plus_margin = 0.9;
    let mut eligible = 0usize;
    let mut surfaced = 0usize;

    for _ in 0..100 {
        let base = synthetic_tokens(&mut rng, 300);
        let mut variant = base.clone();
        // Mutate a single token; the pair stays far above the threshold.
        let position = (rng.next() % 300) as usize;
        variant[position] = format!("fresh{}", rng.next() % 50_000);

        let text_a = base.join(" ");
        let text_b = variant.join(" ");

        let shingles_a = builder.shingles(&text_a);
        let shingles_b = builder.shingles(&text_b);
        if shingles_a.jaccard(&shingles_b) < threshold_plus_margin {
            continue;
        }
        eligible += 1;

        let mut index = LshIndex::new(plan, 1);
        index.insert(0, builder.signature(&text_a)).unwrap();
        if index.query(&builder.signature(&text_b)).contains(&0) {
            surfaced += 1;
        }
    }

    assert!(eligible >= 90, "generator drifted: only {eligible} eligible pairs");
    let recall = surfaced as f64 / eligible as f64;
    assert!(
        recall >= 0.95,
        "recall {recall:.3} below 0.95 ({surfaced}/{eligible})"
    );
}

#[test]
fn near_dup_precision_no_merge_below_threshold() {
    let builder = MinHashBuilder::new(128, 7, 1);
    let plan = BandPlan::for_threshold(128, 0.8).unwrap();
    let mut rng = Lcg(0xfeed);

    for pair in 0..100 {
        let text_a = synthetic_tokens(&mut rng, 200).join(" ");
        let text_b = synthetic_tokens(&mut rng, 200).join(" ");

        // Unrelated streams sit far below threshold - margin.
        let true_similarity = builder
            .shingles(&text_a)
            .jaccard(&builder.shingles(&text_b));
        assert!(true_similarity < 0.7, "pair {pair} unexpectedly similar");

        let mut resolver = NearDupResolver::new(plan, 1, 0.8);
        let first = resolver.resolve(0, builder.signature(&text_a)).unwrap();
        let second = resolver.resolve(1, builder.signature(&text_b)).unwrap();

        assert!(matches!(first, Resolution::Canonical { .. }));
        assert!(
            matches!(second, Resolution::Canonical { .. }),
            "pair {pair} merged at true similarity {true_similarity:.3}"
        );
    }
}

#[test]
fn estimated_jaccard_tracks_true_jaccard() {
    let builder = MinHashBuilder::new(128, 7, 1);
    let mut rng = Lcg(0xabcd);

    let base = synthetic_tokens(&mut rng, 300);
    let mut variant = base.clone();
    for i in 0..30 {
        variant[i * 10] = format!("fresh{i}");
    }

    let text_a = base.join(" ");
    let text_b = variant.join(" ");

    let true_j = builder.shingles(&text_a).jaccard(&builder.shingles(&text_b));
    let est_j = builder
        .signature(&text_a)
        .estimate_jaccard(&builder.signature(&text_b))
        .unwrap();

    // 128 permutations put the estimator within ~0.15 of truth w.h.p.
    assert!(
        (true_j - est_j).abs() < 0.15,
        "estimate {est_j:.3} far from true {true_j:.3}"
    );
}

fn record(path: &str, code: &str) -> FunctionRecord {
    FunctionRecord {
        repo: "acme/widgets".to_string(),
        commit: "c0ffee".to_string(),
        path: path.to_string(),
        name: None,
        language: "python".to_string(),
        start_line: 0,
        end_line: 0,
        code: code.to_string(),
        docstring: None,
    }
}

/// Pairwise-dissimilar records of graded length and branchiness.
fn graded_records() -> Vec<FunctionRecord> {
    (0..12)
        .map(|i| {
            let mut lines = vec![format!("def graded_{i}(arg_{i}):")];
            for j in 0..=i {
                lines.push(format!("    field_{i}_{j} = probe_{i}_{j}(arg_{i}, {j})"));
            }
            for j in 0..i / 3 {
                lines.push(format!("    if field_{i}_{j} > {j}:"));
                lines.push(format!("        emit_{i}_{j}(field_{i}_{j})"));
            }
            lines.push(format!("    return field_{i}_0"));
            record(&format!("graded_{i}.py"), &(lines.join("\n") + "\n"))
        })
        .collect()
}

fn kept_ids(config: ShardsmithConfig) -> Vec<String> {
    let pipeline = CorpusPipeline::new(config).unwrap();
    let mut sink = MemorySink::new();
    let report = pipeline.run(graded_records(), &mut sink).unwrap();
    report
        .decisions
        .iter()
        .filter(|d| d.status == RecordStatus::Kept)
        .map(|d| d.record_id.clone())
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn tightening_min_loc_never_grows_kept_set(min_loc in 1usize..12) {
        let mut loose = ShardsmithConfig::default();
        loose.quality.min_loc = min_loc;
        let mut tight = loose.clone();
        tight.quality.min_loc = min_loc + 1;

        let kept_loose = kept_ids(loose);
        let kept_tight = kept_ids(tight);

        prop_assert!(kept_tight.len() <= kept_loose.len());
        prop_assert!(kept_tight.iter().all(|id| kept_loose.contains(id)));
    }

    #[test]
    fn tightening_max_cyclomatic_never_grows_kept_set(max_cyclomatic in 1u32..8) {
        let mut loose = ShardsmithConfig::default();
        loose.quality.min_loc = 1;
        loose.quality.max_cyclomatic = max_cyclomatic + 1;
        let mut tight = loose.clone();
        tight.quality.max_cyclomatic = max_cyclomatic;

        let kept_loose = kept_ids(loose);
        let kept_tight = kept_ids(tight);

        prop_assert!(kept_tight.len() <= kept_loose.len());
        prop_assert!(kept_tight.iter().all(|id| kept_loose.contains(id)));
    }

    #[test]
    fn normalization_is_a_fixed_point(chars in prop::collection::vec(prop::char::any(), 0..200)) {
        let input: String = chars.into_iter().collect();
        let once = normalize(&input);
        let twice = normalize(&once);

        prop_assert_eq!(&once, &twice);
        prop_assert!(once.is_empty() || once.ends_with('\n'));
        for line in once.lines() {
            prop_assert_eq!(line, line.trim_end());
        }
    }
}
