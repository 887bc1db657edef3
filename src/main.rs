use std::path::PathBuf;

use anyhow::Context;
use chroma_cluster::manifest::{self, ManifestConfig};
use chroma_cluster::pipeline::{self, ClusterConfig};
use chroma_cluster::{assign, kmeans};
use clap::{Parser, Subcommand};
use log::error;
use log::LevelFilter;

// Debug level logs every k-means restart of every image; use RUST_LOG=debug for that.
const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Groups a directory of images into visually similar clusters by color statistics.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli
{
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command
{
    /// Cluster the images in a directory and copy them into one folder per cluster.
    Cluster(ClusterArgs),
    /// Write images.json and images_data.js for the web viewer from a clustered directory.
    Manifest(ManifestArgs),
}

#[derive(Debug, clap::Args)]
struct ClusterArgs
{
    /// Directory containing the images to cluster.
    #[arg(short, long, env = "CHROMA_INPUT", default_value = "artworks")]
    input: PathBuf,

    /// Directory to write the clusters to. Replaced if it already exists.
    #[arg(short, long, env = "CHROMA_OUTPUT", default_value = "clustered_artworks")]
    output: PathBuf,

    /// Number of clusters.
    #[arg(short = 'k', long, env = "CHROMA_CLUSTERS", default_value_t = 3)]
    clusters: usize,

    /// Seed for centroid initialization.
    #[arg(long, default_value_t = assign::DEFAULT_SEED)]
    seed: u64,

    /// Number of clustering restarts; the best one is kept.
    #[arg(long, default_value_t = kmeans::DEFAULT_RESTARTS)]
    restarts: usize,

    /// Maximum number of feature extraction threads. Defaults to one per logical CPU.
    #[arg(short, long)]
    jobs: Option<usize>,
}

#[derive(Debug, clap::Args)]
struct ManifestArgs
{
    /// Directory holding the cluster_<n> folders.
    #[arg(long, default_value = "../clustered_artworks")]
    clusters_dir: PathBuf,

    /// Directory to write the manifest files into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

impl From<ClusterArgs> for ClusterConfig
{
    fn from(args: ClusterArgs) -> Self
    {
        ClusterConfig {
            input_dir: args.input,
            output_dir: args.output,
            clusters: args.clusters,
            seed: args.seed,
            restarts: args.restarts,
            jobs: args.jobs,
        }
    }
}

impl From<ManifestArgs> for ManifestConfig
{
    fn from(args: ManifestArgs) -> Self
    {
        ManifestConfig { clusters_dir: args.clusters_dir, out_dir: args.out_dir }
    }
}

fn main() -> anyhow::Result<()>
{
    env_logger::Builder::new()
        .filter_level(LOG_LEVEL)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Cluster(args) => {
            let config = ClusterConfig::from(args);
            pipeline::run(&config)
                .map(|_| ())
                .with_context(|| format!("Error clustering images in {:?}", config.input_dir))
        },
        Command::Manifest(args) => {
            let config = ManifestConfig::from(args);
            manifest::generate(&config)
                .map(|_| ())
                .with_context(|| format!("Error generating manifest from {:?}", config.clusters_dir))
        },
    };

    if let Err(e) = &result {
        error!("{:?}", e);
    }
    result
}
