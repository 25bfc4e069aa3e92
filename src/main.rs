use anyhow::{Context, Result};
use clap::Parser;
use link_constellation::data::json::load_graph;
use link_constellation::{export, Config};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[clap(
    name = "constellation",
    about = "Cluster the article link graph and export a constellation snapshot"
)]
struct Cli {
    /// Link graph JSON file (repeat to process several graphs)
    #[clap(long, required = true)]
    input: Vec<PathBuf>,

    /// Output directory for snapshots
    #[clap(long, default_value = "static")]
    output_dir: PathBuf,

    /// JSON file overriding clustering policy
    #[clap(long)]
    config: Option<PathBuf>,

    /// Seed for the optimizer's node visitation order
    #[clap(long)]
    seed: Option<u64>,

    /// Number of communities to aim for on large graphs
    #[clap(long)]
    target_clusters: Option<usize>,

    /// Maximum members listed per cluster
    #[clap(long)]
    sample_size: Option<usize>,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(target) = self.target_clusters {
            config.target_cluster_count = target;
        }
        if let Some(sample) = self.sample_size {
            config.max_cluster_sample = sample;
        }

        config.validate()?;
        Ok(config)
    }

    /// Destination for one input; several inputs are told apart by file stem
    fn destination(&self, input: &Path) -> PathBuf {
        if self.input.len() == 1 {
            return self.output_dir.join("constellation.json");
        }
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "graph".to_string());
        self.output_dir.join(format!("{}.constellation.json", stem))
    }
}

fn run(input: &Path, destination: &Path, config: &Config) -> Result<()> {
    let dump = load_graph(input)?;
    let snapshot = export(&dump.nodes, &dump.edges, config, Some(destination))
        .with_context(|| format!("export constellation for {}", input.display()))?;

    log::info!(
        "Wrote {} ({} pages, {} links, {} clusters)",
        destination.display(),
        snapshot.totals.pages,
        snapshot.totals.links,
        snapshot.totals.clusters
    );
    Ok(())
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Cli::parse();

    // Configure logging
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    let config = args.load_config()?;

    // Set number of threads
    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    log::info!("Starting constellation export for {} graph(s)", args.input.len());

    // Each graph is an independent invocation with its own optimizer state
    args.input
        .par_iter()
        .map(|input| run(input, &args.destination(input), &config))
        .collect::<Result<Vec<()>>>()?;

    log::info!("Export complete. Snapshots saved to {}", args.output_dir.display());

    Ok(())
}
