use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2};

use crate::error::Result;
use crate::features::FEATURE_VECTOR_LENGTH;

/// Feature vectors of every successfully processed image, one row each,
/// index-aligned with `paths`. Images that failed to decode have no row.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix
{
    pub paths: Vec<PathBuf>,
    pub features: Array2<f64>,
}

impl FeatureMatrix
{
    pub fn from_rows(rows: Vec<(PathBuf, Array1<f64>)>) -> Result<Self>
    {
        let n = rows.len();
        let mut paths = Vec::with_capacity(n);
        let mut flat = Vec::with_capacity(n * FEATURE_VECTOR_LENGTH);
        for (path, features) in rows
        {
            paths.push(path);
            flat.extend(features.iter());
        }
        let features = Array2::from_shape_vec((n, FEATURE_VECTOR_LENGTH), flat)?;
        Ok(FeatureMatrix { paths, features })
    }

    pub fn len(&self) -> usize
    {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.paths.is_empty()
    }
}

/// The cluster label of every clustered image, in enumeration order.
/// Labels are in [0, k) and carry no ordering meaning.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAssignment
{
    pub k: usize,
    pub entries: Vec<(PathBuf, usize)>,
}

impl ClusterAssignment
{
    pub fn labels(&self) -> Vec<usize>
    {
        self.entries.iter().map(|(_, label)| *label).collect()
    }

    pub fn label_of(&self, path: &Path) -> Option<usize>
    {
        self.entries.iter().find(|(p, _)| p == path).map(|(_, label)| *label)
    }

    /// Number of images per label, indexed by label.
    pub fn cluster_sizes(&self) -> Vec<usize>
    {
        let mut sizes = vec![0; self.k];
        for (_, label) in &self.entries
        {
            sizes[*label] += 1;
        }
        sizes
    }
}
