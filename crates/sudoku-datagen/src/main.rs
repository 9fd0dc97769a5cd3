mod config;
mod preview;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use config::DatagenConfig;
use env_logger::Env;
use log::info;
use sudoku_augment::{generate, write_dataset, FileCorpus, GenerateOptions, SwapPolicy};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Expand a Sudoku corpus by symmetry and write one-hot x.npy / y.npy tensors"
)]
struct Cli {
    /// Total number of samples to generate (rounded to a multiple of the corpus size)
    #[arg(short = 'n', long, value_name = "N")]
    samples: Option<usize>,

    /// Corpus file with one `<puzzle> <solution>` pair per line
    #[arg(long, value_name = "FILE")]
    corpus: Option<PathBuf>,

    /// Output directory for x.npy, y.npy, metadata.json
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Seed for reproducible output (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of worker threads (defaults to Rayon default)
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// How row/column/band/stack orders are drawn: pair_swap or uniform
    #[arg(long, value_name = "POLICY")]
    policy: Option<SwapPolicy>,

    /// Overwrite existing outputs if present
    #[arg(long)]
    overwrite: bool,

    /// Print this many random samples after generation
    #[arg(long, value_name = "N")]
    preview: Option<usize>,

    /// JSON config file (defaults to the user config dir if present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Flags win over file values
    fn merge_into(self, mut config: DatagenConfig) -> DatagenConfig {
        if let Some(samples) = self.samples {
            config.samples = samples;
        }
        if let Some(corpus) = self.corpus {
            config.corpus = corpus;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.workers.is_some() {
            config.workers = self.workers;
        }
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(preview) = self.preview {
            config.preview = preview;
        }
        config.overwrite |= self.overwrite;
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let file_config = DatagenConfig::load(cli.config.as_deref())?;
    let config = cli.merge_into(file_config);

    let options = GenerateOptions {
        requested_samples: config.samples,
        seed: config.seed,
        policy: config.policy,
        workers: config.workers.filter(|&n| n > 0),
    };

    let mut corpus = FileCorpus::new(&config.corpus);
    let dataset = generate(&mut corpus, &options)
        .with_context(|| format!("failed to generate from {}", config.corpus.display()))?;

    let metadata = write_dataset(&config.output, &dataset, config.overwrite)
        .with_context(|| format!("failed to write {}", config.output.display()))?;

    if config.preview > 0 {
        let mut rng = rand::thread_rng();
        print!("{}", preview::render_samples(&dataset.batch, config.preview, &mut rng));
    }

    info!(
        "Completed: {} samples from {} puzzles (factor {}, seed {})",
        metadata.samples, metadata.source_pairs, metadata.factor, metadata.seed
    );
    Ok(())
}
