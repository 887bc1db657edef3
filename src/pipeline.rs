/// The clustering run: enumerate, extract, cluster, stage.

use std::path::PathBuf;

use log::{info, warn};

use crate::assign::{self, ClusterAssigner};
use crate::error::{Error, Result};
use crate::features::FeatureExtractor;
use crate::kmeans;
use crate::models::{ClusterAssignment, FeatureMatrix};
use crate::{scan, staging};

/// Everything a clustering run needs. Nothing is read from ambient state.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterConfig
{
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub clusters: usize,
    /// Seed for the global clustering.
    pub seed: u64,
    pub restarts: usize,
    /// Upper bound on feature extraction threads. None uses one per logical CPU.
    pub jobs: Option<usize>,
}

impl ClusterConfig
{
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, clusters: usize) -> Self
    {
        ClusterConfig {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            clusters,
            seed: assign::DEFAULT_SEED,
            restarts: kmeans::DEFAULT_RESTARTS,
            jobs: None,
        }
    }
}

/// Runs the whole pipeline and stages the result under `config.output_dir`.
/// Nothing is written unless clustering succeeds.
pub fn run(config: &ClusterConfig) -> Result<ClusterAssignment>
{
    if config.clusters == 0 {
        return Err(Error::InvalidClusterCount(config.clusters));
    }

    let assignment = cluster_directory(config)?;
    staging::stage(&assignment, &config.output_dir)?;
    info!("Clustering complete!");
    Ok(assignment)
}

/// Enumerates, extracts and clusters without touching the output directory.
pub fn cluster_directory(config: &ClusterConfig) -> Result<ClusterAssignment>
{
    let image_files = scan::find_images(&config.input_dir)?;
    if image_files.is_empty() {
        return Err(Error::NoImagesFound(config.input_dir.clone()));
    }
    info!("Found {} images. Extracting features...", image_files.len());

    let now = std::time::Instant::now();
    let matrix = extract_features(&image_files, &FeatureExtractor::default(), config.jobs)?;
    info!("Extracted features from {} of {} images in {:?}", matrix.len(), image_files.len(), now.elapsed());

    let assigner = ClusterAssigner { seed: config.seed, restarts: config.restarts };
    assigner.assign(&matrix, config.clusters)
}

/// Extracts a feature vector per path, skipping (and logging) images that
/// fail to decode. Rows stay in the order of `paths`.
pub fn extract_features(paths: &[PathBuf], extractor: &FeatureExtractor, jobs: Option<usize>) -> Result<FeatureMatrix>
{
    let results = extractor.extract_batch(paths, jobs)?;

    let mut rows = Vec::with_capacity(results.len());
    for (path, result) in results
    {
        match result {
            Ok(features) => rows.push((path, features)),
            Err(e @ Error::ImageDecode { .. }) => warn!("Error processing {:?}, skipping: {}", path, e),
            Err(e) => return Err(e),
        }
    }

    FeatureMatrix::from_rows(rows)
}
