/// Global clustering of images by their feature vectors.
/// Feature columns live on very different scales (histogram counts in the
/// thousands next to channel means in [0, 255]), so every column is
/// standardized before any distance is computed.

use log::info;
use ndarray::{Array2, ArrayView2, Axis};

use crate::error::{Error, Result};
use crate::kmeans::{self, KMeansParams};
use crate::models::{ClusterAssignment, FeatureMatrix};

pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAssigner
{
    pub seed: u64,
    pub restarts: usize,
}

impl Default for ClusterAssigner
{
    fn default() -> Self
    {
        ClusterAssigner { seed: DEFAULT_SEED, restarts: kmeans::DEFAULT_RESTARTS }
    }
}

impl ClusterAssigner
{
    /// Partitions the images of `matrix` into `k` clusters.
    ///
    /// Fails with `InsufficientData` when the matrix is empty or has fewer
    /// rows than `k`, and with `InvalidClusterCount` when `k` is 0.
    pub fn assign(&self, matrix: &FeatureMatrix, k: usize) -> Result<ClusterAssignment>
    {
        if k == 0 {
            return Err(Error::InvalidClusterCount(k));
        }
        if matrix.is_empty() {
            return Err(Error::InsufficientData("no images could be processed".to_string()));
        }
        if k > matrix.len() {
            return Err(Error::InsufficientData(format!(
                "cannot form {} clusters from {} processable images", k, matrix.len())));
        }

        let standardized = standardize(matrix.features.view());

        info!("Clustering {} images into {} clusters...", matrix.len(), k);
        let now = std::time::Instant::now();
        let params = KMeansParams::new(k, self.seed).with_restarts(self.restarts);
        let fit = kmeans::fit(standardized.view(), &params)?;
        info!("Clustering took {:?} (inertia {:.4})", now.elapsed(), fit.inertia);

        let entries = matrix.paths.iter().cloned().zip(fit.labels).collect();
        Ok(ClusterAssignment { k, entries })
    }
}

/// Rescales every column to zero mean and unit (population) variance.
/// Constant columns carry no information and become all zeros.
pub fn standardize(features: ArrayView2<f64>) -> Array2<f64>
{
    let mut standardized = features.to_owned();
    if features.nrows() == 0 {
        return standardized;
    }

    let std = features.std_axis(Axis(0), 0.0);
    for (mut column, &sigma) in standardized.axis_iter_mut(Axis(1)).zip(std.iter())
    {
        let mean = column.mean().unwrap_or(0.0);
        let scale = if sigma > 0.0 { sigma } else { 1.0 };
        column.mapv_inplace(|v| (v - mean) / scale);
    }
    standardized
}
