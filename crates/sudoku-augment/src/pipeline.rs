use log::{info, warn};
use rand::Rng;

use crate::{encode, Augmenter, CorpusSource, EncodedBatch, Error, Pair, Result, SwapPolicy};

/// Generation settings for one run
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Total samples wanted; the actual count is a multiple of the corpus size
    pub requested_samples: usize,
    /// Master seed. Drawn from entropy when absent.
    pub seed: Option<u64>,
    pub policy: SwapPolicy,
    /// Worker threads for augmentation and encoding (rayon default if absent)
    pub workers: Option<usize>,
}

impl GenerateOptions {
    pub fn new(requested_samples: usize) -> Self {
        Self {
            requested_samples,
            seed: None,
            policy: SwapPolicy::default(),
            workers: None,
        }
    }
}

/// Output of one generation run
#[derive(Debug, Clone)]
pub struct GeneratedDataset {
    pub pairs: Vec<Pair>,
    pub batch: EncodedBatch,
    pub factor: usize,
    pub seed: u64,
    pub policy: SwapPolicy,
    pub source_pairs: usize,
}

/// `max(1, round(requested / corpus_len))` with halves rounded up
pub fn derive_factor(requested: usize, corpus_len: usize) -> usize {
    if corpus_len == 0 {
        return 1;
    }
    let whole = requested / corpus_len;
    let rem = requested % corpus_len;
    // 2 * rem >= corpus_len, without the doubling
    let rounded = if rem >= corpus_len - rem { whole + 1 } else { whole };
    rounded.max(1)
}

/// Load the corpus once, expand it, and encode the result
pub fn generate<S: CorpusSource>(
    source: &mut S,
    options: &GenerateOptions,
) -> Result<GeneratedDataset> {
    let corpus = source
        .load()
        .map_err(|err| Error::CorpusLoad(Box::new(err)))?;
    if corpus.is_empty() {
        return Err(Error::InvalidInput("corpus contains no puzzles".to_string()));
    }

    let factor = derive_factor(options.requested_samples, corpus.len());
    if options.requested_samples < corpus.len() / 2 {
        warn!(
            "Requested {} samples but the corpus already has {}; emitting {}",
            options.requested_samples,
            corpus.len(),
            corpus.len() * factor
        );
    }
    let seed = options.seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!(
        "Expanding {} puzzles by factor {} (seed {}, {} policy)",
        corpus.len(),
        factor,
        seed,
        options.policy
    );

    let run = || -> Result<(Vec<Pair>, EncodedBatch)> {
        let pairs = Augmenter::with_policy(seed, options.policy).augment(&corpus, factor)?;
        let batch = encode(&pairs)?;
        Ok((pairs, batch))
    };

    let (pairs, batch) = match options.workers {
        Some(n) => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()?
            .install(run)?,
        None => run()?,
    };

    info!(
        "Encoded {} samples: x {:?}, y {:?}",
        batch.len(),
        batch.x.shape(),
        batch.y.shape()
    );

    Ok(GeneratedDataset {
        pairs,
        batch,
        factor,
        seed,
        policy: options.policy,
        source_pairs: corpus.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::tests::canonical_pair;
    use crate::{is_valid_solution, InMemoryCorpus};

    struct FailingCorpus;

    #[derive(Debug)]
    struct Unavailable;

    impl std::fmt::Display for Unavailable {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "corpus unavailable")
        }
    }

    impl std::error::Error for Unavailable {}

    impl CorpusSource for FailingCorpus {
        type Error = Unavailable;

        fn load(&mut self) -> std::result::Result<Vec<Pair>, Self::Error> {
            Err(Unavailable)
        }
    }

    #[test]
    fn test_derive_factor() {
        assert_eq!(derive_factor(1000, 100), 10);
        assert_eq!(derive_factor(149, 100), 1);
        assert_eq!(derive_factor(150, 100), 2);
        assert_eq!(derive_factor(10, 100), 1);
        assert_eq!(derive_factor(0, 5), 1);
        assert_eq!(derive_factor(7, 0), 1);
    }

    #[test]
    fn test_derive_factor_large_request() {
        assert_eq!(derive_factor(usize::MAX / 2 + 1, 1), usize::MAX / 2 + 1);
        assert_eq!(derive_factor(usize::MAX, 1), usize::MAX);
        assert_eq!(derive_factor(usize::MAX, 2), usize::MAX / 2 + 1);
        assert_eq!(derive_factor(usize::MAX - 1, usize::MAX), 1);
        assert_eq!(derive_factor(usize::MAX, usize::MAX), 1);
    }

    #[test]
    fn test_oversized_request_is_an_error() {
        let mut corpus = InMemoryCorpus(vec![canonical_pair(); 2]);
        let mut options = GenerateOptions::new(usize::MAX / 2 + 1);
        options.seed = Some(1);
        let err = generate(&mut corpus, &options).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_generate_in_memory() {
        let mut corpus = InMemoryCorpus(vec![canonical_pair(); 3]);
        let mut options = GenerateOptions::new(12);
        options.seed = Some(17);
        options.workers = Some(2);
        let dataset = generate(&mut corpus, &options).unwrap();

        assert_eq!(dataset.factor, 4);
        assert_eq!(dataset.source_pairs, 3);
        assert_eq!(dataset.seed, 17);
        assert_eq!(dataset.pairs.len(), 12);
        assert_eq!(dataset.batch.x.shape(), [12, 9, 9, 10]);
        assert_eq!(dataset.batch.y.shape(), [12, 9, 9, 9]);
        assert!(dataset.pairs.iter().all(|p| is_valid_solution(&p.solution)));
    }

    #[test]
    fn test_worker_count_does_not_change_output() {
        let corpus = vec![canonical_pair(); 5];
        let mut options = GenerateOptions::new(20);
        options.seed = Some(3);

        options.workers = Some(1);
        let single = generate(&mut InMemoryCorpus(corpus.clone()), &options).unwrap();
        options.workers = Some(4);
        let many = generate(&mut InMemoryCorpus(corpus), &options).unwrap();
        assert_eq!(single.pairs, many.pairs);
        assert_eq!(single.batch, many.batch);
    }

    #[test]
    fn test_corpus_error_propagates() {
        let err = generate(&mut FailingCorpus, &GenerateOptions::new(10)).unwrap_err();
        match err {
            Error::CorpusLoad(inner) => assert_eq!(inner.to_string(), "corpus unavailable"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_empty_corpus_rejected() {
        let err = generate(&mut InMemoryCorpus(Vec::new()), &GenerateOptions::new(10)).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
