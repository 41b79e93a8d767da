//! `stratified-knn`: split a labeled CSV per class, classify the held-out part
//! with k-NN and print the misses and the accuracy.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use stratified_knn::{ExperimentConfig, MalformedRowPolicy, WriterSink, load_dataset, run_experiment};

#[derive(Parser)]
#[command(name = "stratified-knn")]
#[command(version)]
#[command(about = "Evaluate a k-nearest-neighbours classifier on a stratified hold-out split")]
struct Cli {
    /// TOML configuration file; command-line flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CSV file with numeric features and the class label in the last column
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// Number of neighbours that vote
    #[arg(short)]
    k: Option<usize>,

    /// Share of every class held out for testing, in (0, 1)
    #[arg(short = 'p', long)]
    testing_fraction: Option<f64>,

    /// Shuffle each class with this seed before splitting
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads used for classification
    #[arg(long)]
    threads: Option<usize>,

    /// Treat the first CSV row as a header (true or false)
    #[arg(long, value_name = "BOOL")]
    has_headers: Option<bool>,

    /// CSV field delimiter, a single ASCII character
    #[arg(long)]
    delimiter: Option<char>,

    /// Feature count every row must have; inferred from the file when omitted
    #[arg(long)]
    expected_features: Option<usize>,

    /// What to do with rows that cannot be parsed: abort or skip
    #[arg(long)]
    on_malformed: Option<MalformedRowPolicy>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_config(self) -> Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => ExperimentConfig::default(),
        };
        self.apply_overrides(&mut config);
        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    /// Every flag given on the command line replaces the matching config value.
    fn apply_overrides(&self, config: &mut ExperimentConfig) {
        if let Some(dataset) = &self.dataset {
            config.dataset = dataset.clone();
        }
        if let Some(k) = self.k {
            config.k = k;
        }
        if let Some(fraction) = self.testing_fraction {
            config.testing_fraction = fraction;
        }
        if self.seed.is_some() {
            config.shuffle_seed = self.seed;
        }
        if self.threads.is_some() {
            config.threads = self.threads;
        }
        if let Some(has_headers) = self.has_headers {
            config.csv.has_headers = has_headers;
        }
        if let Some(delimiter) = self.delimiter {
            config.csv.delimiter = delimiter;
        }
        if self.expected_features.is_some() {
            config.csv.expected_features = self.expected_features;
        }
        if let Some(policy) = self.on_malformed {
            config.csv.on_malformed = policy;
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.into_config()?;
    tracing::debug!(?config, "resolved configuration");

    if let Some(threads) = config.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure worker threads")?;
    }

    let dataset = load_dataset(&config.dataset, &config.csv)
        .with_context(|| format!("failed to read dataset {}", config.dataset.display()))?;

    let mut sink = WriterSink::new(io::stdout().lock());
    let report = run_experiment(&dataset, &config, &mut sink).context("evaluation failed")?;
    let mut stdout = sink.into_inner();
    writeln!(stdout, "{}", report)?;
    Ok(())
}
