use anyhow::{anyhow, Result};
use clap::Parser;

use modularity_clusterer::cluster::metrics;
use modularity_clusterer::data::{self, LoadOptions};
use modularity_clusterer::{storage, viz};
use modularity_clusterer::{CancellationToken, ClusterOutcome, ClusteringEngine, Config};

#[derive(Parser, Debug)]
#[clap(
    name = "modularity-clusterer",
    about = "Partition a graph into clusters by greedy modularity maximization"
)]
struct Cli {
    /// Path to the edge list (.parquet, or a text file with one pair per line)
    #[clap(long)]
    input: String,

    /// Output directory for results
    #[clap(long, default_value = "cluster_results")]
    output_dir: String,

    /// Source vertex column (Parquet input)
    #[clap(long, default_value = "Source")]
    source_column: String,

    /// Target vertex column (Parquet input)
    #[clap(long, default_value = "Target")]
    target_column: String,

    /// Merge cycles between progress reports
    #[clap(long, default_value = "100")]
    progress_interval: usize,

    /// Put all vertices without neighbors into one group
    #[clap(long)]
    group_neighborless: bool,

    /// Skip visualizations
    #[clap(long)]
    skip_viz: bool,

    /// Number of worker threads for statistics (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    log::info!("Starting modularity clustering");
    log::info!("Input: {}", args.input);
    log::info!("Output: {}", args.output_dir);

    std::fs::create_dir_all(&args.output_dir)?;

    // 1. Load data
    let options = LoadOptions {
        source_column: args.source_column.clone(),
        target_column: args.target_column.clone(),
    };
    let graph = data::load_edge_list(&args.input, &options)?;

    // 2. Cluster
    let config = Config::new(args.progress_interval, args.group_neighborless);
    let engine = ClusteringEngine::new(config)?;
    let outcome = engine.cluster_with(&graph, &CancellationToken::new(), &mut |update| {
        log::info!("{}", update.message);
    })?;

    let partition = match outcome {
        ClusterOutcome::Completed(partition) => partition,
        ClusterOutcome::Cancelled => return Err(anyhow!("Clustering was cancelled")),
    };

    let modularity = metrics::modularity(&graph, &partition.assignment);
    log::info!(
        "Found {} groups after {} merges (modularity {:.4})",
        partition.len(),
        partition.merges.len(),
        modularity
    );

    // 3. Save results
    let stats = metrics::group_stats(&graph, &partition);
    storage::save_results(&partition, &stats, &graph, modularity, &args.output_dir)?;

    // 4. Generate visualizations if requested
    if !args.skip_viz {
        viz::generate_visualizations(&partition, &stats, &graph, &args.output_dir)?;
    }

    log::info!("Analysis complete. Results saved to {}", args.output_dir);

    Ok(())
}
