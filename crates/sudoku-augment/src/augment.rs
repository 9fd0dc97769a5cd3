//! Random symmetry sampling and corpus expansion.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{DigitMap, Error, Order3, Pair, Result, Symmetry, SymmetryStack, MAX_SAMPLES};

/// How the three-slot orderings (rows in a band, columns in a stack, bands,
/// stacks) are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapPolicy {
    /// Exchange one uniformly chosen pair of slots. The identity ordering and
    /// the two 3-cycles are never produced by a single draw.
    #[default]
    PairSwap,
    /// Draw uniformly from all six orderings
    Uniform,
}

impl SwapPolicy {
    fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> Order3 {
        match self {
            SwapPolicy::PairSwap => {
                Order3::TRANSPOSITIONS[rng.gen_range(0..Order3::TRANSPOSITIONS.len())]
            }
            SwapPolicy::Uniform => Order3::ALL[rng.gen_range(0..Order3::ALL.len())],
        }
    }
}

impl std::fmt::Display for SwapPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwapPolicy::PairSwap => write!(f, "pair_swap"),
            SwapPolicy::Uniform => write!(f, "uniform"),
        }
    }
}

impl std::str::FromStr for SwapPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pair_swap" | "pair-swap" => Ok(SwapPolicy::PairSwap),
            "uniform" => Ok(SwapPolicy::Uniform),
            other => Err(format!("unknown swap policy '{other}'")),
        }
    }
}

/// Draw one composition: relabel, rows per band, columns per stack, bands,
/// stacks, then a transpose on a coin flip.
pub fn sample_stack<R: Rng + ?Sized>(rng: &mut R, policy: SwapPolicy) -> SymmetryStack {
    let mut stack = SymmetryStack::new();

    let mut digits = [1u8, 2, 3, 4, 5, 6, 7, 8, 9];
    digits.shuffle(rng);
    stack.push(Symmetry::Relabel(DigitMap::from_permuted_digits(digits)));

    for band in 0..3 {
        stack.push(Symmetry::RowsInBand {
            band,
            order: policy.sample(rng),
        });
    }
    for stack_idx in 0..3 {
        stack.push(Symmetry::ColsInStack {
            stack: stack_idx,
            order: policy.sample(rng),
        });
    }
    stack.push(Symmetry::Bands(policy.sample(rng)));
    stack.push(Symmetry::Stacks(policy.sample(rng)));

    if rng.gen_bool(0.5) {
        stack.push(Symmetry::Transpose);
    }
    stack
}

/// Derive `factor` pairs from one source using a caller-owned RNG.
/// The source must already be valid.
pub fn augment_pair<R: Rng + ?Sized>(
    pair: &Pair,
    factor: usize,
    policy: SwapPolicy,
    rng: &mut R,
) -> Vec<Pair> {
    (0..factor)
        .map(|_| sample_stack(rng, policy).apply(pair))
        .collect()
}

/// Parallel corpus expander.
///
/// Each source index gets its own RNG derived from the master seed, so the
/// output depends only on the seed and the input, never on thread count.
#[derive(Debug, Clone)]
pub struct Augmenter {
    seed: u64,
    policy: SwapPolicy,
}

impl Augmenter {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            policy: SwapPolicy::default(),
        }
    }

    pub fn with_policy(seed: u64, policy: SwapPolicy) -> Self {
        Self { seed, policy }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn policy(&self) -> SwapPolicy {
        self.policy
    }

    /// Expand every source pair `factor` times. Output is grouped by source,
    /// in source order; `len == pairs.len() * factor`.
    pub fn augment(&self, pairs: &[Pair], factor: usize) -> Result<Vec<Pair>> {
        if factor < 1 {
            return Err(Error::InvalidInput(format!(
                "augmentation factor must be at least 1, got {factor}"
            )));
        }
        for (idx, pair) in pairs.iter().enumerate() {
            pair.validate().map_err(|err| match err {
                Error::InvalidInput(reason) => {
                    Error::InvalidInput(format!("source pair {idx}: {reason}"))
                }
                other => other,
            })?;
        }

        let total = pairs
            .len()
            .checked_mul(factor)
            .filter(|&total| total <= MAX_SAMPLES)
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "{} pairs x{factor} exceeds the {MAX_SAMPLES} sample limit",
                    pairs.len()
                ))
            })?;
        let mut out = Vec::new();
        out.try_reserve_exact(total).map_err(|err| {
            Error::InvalidInput(format!("cannot hold {total} augmented pairs: {err}"))
        })?;

        debug!(
            "Augmenting {} pairs x{} with {} policy (seed {})",
            pairs.len(),
            factor,
            self.policy,
            self.seed
        );

        let groups: Vec<Vec<Pair>> = pairs
            .par_iter()
            .enumerate()
            .map(|(idx, pair)| {
                let mut rng = self.worker_rng(idx);
                augment_pair(pair, factor, self.policy, &mut rng)
            })
            .collect();

        for group in groups {
            out.extend(group);
        }
        info!("Augmented {} source pairs into {} samples", pairs.len(), out.len());
        Ok(out)
    }

    fn worker_rng(&self, index: usize) -> StdRng {
        StdRng::seed_from_u64(split_seed(self.seed, index as u64))
    }
}

/// SplitMix64 finaliser over (seed, index)
fn split_seed(seed: u64, index: u64) -> u64 {
    let mut z = seed ^ index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::tests::canonical_pair;
    use crate::Position;

    #[test]
    fn test_sample_stack_order() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let stack = sample_stack(&mut rng, SwapPolicy::PairSwap);
            let steps = stack.steps();
            assert!(steps.len() == 9 || steps.len() == 10);
            assert!(matches!(steps[0], Symmetry::Relabel(_)));
            for (i, band) in (1..4).zip(0..3) {
                assert!(matches!(steps[i], Symmetry::RowsInBand { band: b, .. } if b == band));
            }
            for (i, stack_idx) in (4..7).zip(0..3) {
                assert!(
                    matches!(steps[i], Symmetry::ColsInStack { stack: s, .. } if s == stack_idx)
                );
            }
            assert!(matches!(steps[7], Symmetry::Bands(_)));
            assert!(matches!(steps[8], Symmetry::Stacks(_)));
            if steps.len() == 10 {
                assert_eq!(steps[9], Symmetry::Transpose);
            }
        }
    }

    #[test]
    fn test_pair_swap_policy_never_identity() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let order = SwapPolicy::PairSwap.sample(&mut rng);
            assert!(!order.is_identity());
            assert_eq!(order.then(order), Order3::IDENTITY);
        }
    }

    #[test]
    fn test_pair_swap_policy_reaches_each_transposition() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let order = SwapPolicy::PairSwap.sample(&mut rng);
            assert!(Order3::TRANSPOSITIONS.contains(&order));
            seen.insert(order);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_sample_stack_always_relabels() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut non_identity = 0;
        for _ in 0..100 {
            let stack = sample_stack(&mut rng, SwapPolicy::Uniform);
            match stack.steps()[0] {
                Symmetry::Relabel(map) => {
                    let mut targets = map.targets();
                    targets.sort_unstable();
                    assert_eq!(targets, [1, 2, 3, 4, 5, 6, 7, 8, 9]);
                    if map != DigitMap::identity() {
                        non_identity += 1;
                    }
                }
                ref other => panic!("first step was {other:?}"),
            }
        }
        assert!(non_identity > 90);
    }

    #[test]
    fn test_uniform_policy_reaches_all_orders() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(SwapPolicy::Uniform.sample(&mut rng));
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn test_augment_count_and_validity() {
        let source = vec![canonical_pair(), Symmetry::Transpose.apply(&canonical_pair())];
        let augmenter = Augmenter::new(42);
        for factor in [1, 2, 5] {
            let out = augmenter.augment(&source, factor).unwrap();
            assert_eq!(out.len(), source.len() * factor);
            for pair in &out {
                assert!(pair.validate().is_ok());
            }
        }
    }

    #[test]
    fn test_augment_is_deterministic() {
        let source = vec![canonical_pair(); 4];
        let a = Augmenter::new(99).augment(&source, 3).unwrap();
        let b = Augmenter::new(99).augment(&source, 3).unwrap();
        let c = Augmenter::new(100).augment(&source, 3).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_augment_rejects_zero_factor() {
        let err = Augmenter::new(1).augment(&[canonical_pair()], 0).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_augment_rejects_oversized_factor() {
        let pair = canonical_pair();
        let err = Augmenter::new(1)
            .augment(&[pair, pair], usize::MAX / 2 + 1)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = Augmenter::new(1)
            .augment(&[pair], MAX_SAMPLES + 1)
            .unwrap_err();
        match err {
            Error::InvalidInput(reason) => assert!(reason.contains("sample limit")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_augment_rejects_inconsistent_source() {
        let mut bad = canonical_pair();
        let pos = Position::new(0, 1);
        bad.puzzle.set(pos, bad.solution.get(pos) % 9 + 1);
        let err = Augmenter::new(1)
            .augment(&[canonical_pair(), bad], 2)
            .unwrap_err();
        match err {
            Error::InvalidInput(reason) => assert!(reason.starts_with("source pair 1")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_augment_preserves_empty_cells() {
        let source = canonical_pair();
        let out = Augmenter::new(5).augment(&[source], 8).unwrap();
        for pair in out {
            assert_eq!(pair.puzzle.empty_count(), source.puzzle.empty_count());
        }
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("uniform".parse::<SwapPolicy>(), Ok(SwapPolicy::Uniform));
        assert_eq!("pair_swap".parse::<SwapPolicy>(), Ok(SwapPolicy::PairSwap));
        assert!("random".parse::<SwapPolicy>().is_err());
        assert_eq!(SwapPolicy::Uniform.to_string(), "uniform");
    }
}
