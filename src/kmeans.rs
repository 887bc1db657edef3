/// Centroid-based clustering (k-means) over the rows of a matrix.
/// This is the one clustering routine in the crate; both the dominant-color
/// pass of the feature extractor and the global image clustering go through
/// `fit()`, differing only in their parameters.
///
/// Centroids are seeded with k-means++ and refined with Lloyd iterations.
/// Several restarts are run from a single seeded random stream and the
/// restart with the lowest inertia (total within-cluster squared distance) wins,
/// so the same data and parameters always give the same result.

use log::debug;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};

pub const DEFAULT_RESTARTS: usize = 10;
pub const DEFAULT_MAX_ITERATIONS: usize = 300;
// Relative to the mean per-column variance of the data.
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansParams
{
    pub k: usize,
    pub seed: u64,
    pub restarts: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl KMeansParams
{
    pub fn new(k: usize, seed: u64) -> Self
    {
        KMeansParams {
            k,
            seed,
            restarts: DEFAULT_RESTARTS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn with_restarts(mut self, restarts: usize) -> Self
    {
        self.restarts = restarts;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self
    {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self
    {
        self.tolerance = tolerance;
        self
    }
}

#[derive(Debug, Clone)]
pub struct KMeansFit
{
    /// Shape (k, columns of the input).
    pub centroids: Array2<f64>,
    /// One label in [0, k) per input row.
    pub labels: Vec<usize>,
    pub inertia: f64,
    pub iterations: usize,
}

/// Clusters the rows of `data` into `params.k` groups.
///
/// Fails with `InvalidClusterCount` if k is 0 and with `InsufficientData`
/// if there are fewer rows than clusters.
pub fn fit(data: ArrayView2<f64>, params: &KMeansParams) -> Result<KMeansFit>
{
    let n = data.nrows();
    if params.k == 0 {
        return Err(Error::InvalidClusterCount(params.k));
    }
    if n == 0 {
        return Err(Error::InsufficientData("cannot cluster an empty matrix".to_string()));
    }
    if params.k > n {
        return Err(Error::InsufficientData(format!(
            "requested {} clusters but only {} rows are available", params.k, n)));
    }

    let tolerance = absolute_tolerance(data, params.tolerance);
    let mut rng = StdRng::seed_from_u64(params.seed);

    let mut best: Option<KMeansFit> = None;
    for restart in 0..params.restarts.max(1)
    {
        let candidate = fit_single(data, params.k, params.max_iterations, tolerance, &mut rng);
        debug!("k-means restart {}: inertia {} after {} iterations", restart, candidate.inertia, candidate.iterations);

        let is_better = match &best {
            Some(current) => candidate.inertia < current.inertia,
            None => true,
        };
        if is_better {
            best = Some(candidate);
        }
    }

    // restarts.max(1) guarantees at least one candidate.
    best.ok_or_else(|| Error::InsufficientData("no k-means restart produced a result".to_string()))
}

fn fit_single(data: ArrayView2<f64>, k: usize, max_iterations: usize, tolerance: f64, rng: &mut StdRng) -> KMeansFit
{
    let n = data.nrows();
    let mut centroids = init_plus_plus(data, k, rng);
    let mut labels = vec![0usize; n];
    let mut distances = vec![0f64; n];
    let mut iterations = 0;

    for iteration in 0..max_iterations
    {
        iterations = iteration + 1;
        assign(data, centroids.view(), &mut labels, &mut distances);

        let mut sums = Array2::<f64>::zeros(centroids.raw_dim());
        let mut counts = vec![0usize; k];
        for (row, &label) in data.outer_iter().zip(labels.iter())
        {
            let mut sum = sums.row_mut(label);
            sum += &row;
            counts[label] += 1;
        }

        relocate_empty_clusters(data, &mut labels, &mut distances, &mut sums, &mut counts);

        let mut updated = sums;
        for (mut centroid, &count) in updated.outer_iter_mut().zip(counts.iter())
        {
            if count > 0 {
                centroid /= count as f64;
            }
        }

        let shift: f64 = centroids
            .outer_iter()
            .zip(updated.outer_iter())
            .map(|(old, new)| squared_distance(old, new))
            .sum();
        centroids = updated;

        if shift <= tolerance {
            break;
        }
    }

    // Final assignment against the converged centroids, so labels and centroids agree.
    assign(data, centroids.view(), &mut labels, &mut distances);
    let inertia = distances.iter().sum();

    KMeansFit { centroids, labels, inertia, iterations }
}

/// k-means++ seeding: the first centroid is a uniformly chosen row, each
/// following one is drawn with probability proportional to its squared
/// distance from the nearest centroid chosen so far.
fn init_plus_plus(data: ArrayView2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64>
{
    let n = data.nrows();
    let mut centroids = Array2::<f64>::zeros((k, data.ncols()));

    let first = rng.gen_range(0..n);
    centroids.row_mut(0).assign(&data.row(first));

    let mut closest: Vec<f64> = data
        .outer_iter()
        .map(|row| squared_distance(row, centroids.row(0)))
        .collect();

    for c in 1..k
    {
        let total: f64 = closest.iter().sum();
        let chosen = if total > 0.0 {
            weighted_index(&closest, rng.gen::<f64>() * total)
        } else {
            // Every row coincides with a chosen centroid.
            rng.gen_range(0..n)
        };
        centroids.row_mut(c).assign(&data.row(chosen));

        for (row, best) in data.outer_iter().zip(closest.iter_mut())
        {
            let d = squared_distance(row, centroids.row(c));
            if d < *best {
                *best = d;
            }
        }
    }

    centroids
}

fn weighted_index(weights: &[f64], mut target: f64) -> usize
{
    let mut last_positive = 0;
    for (i, &w) in weights.iter().enumerate()
    {
        if w <= 0.0 {
            continue;
        }
        last_positive = i;
        target -= w;
        if target < 0.0 {
            return i;
        }
    }
    // Rounding can leave a sliver of the target unspent.
    last_positive
}

/// Assigns every row to its nearest centroid. Ties go to the lowest centroid index.
fn assign(data: ArrayView2<f64>, centroids: ArrayView2<f64>, labels: &mut [usize], distances: &mut [f64])
{
    for (i, row) in data.outer_iter().enumerate()
    {
        let (label, distance) = nearest(row, centroids);
        labels[i] = label;
        distances[i] = distance;
    }
}

fn nearest(row: ArrayView1<f64>, centroids: ArrayView2<f64>) -> (usize, f64)
{
    let mut best = (0, f64::INFINITY);
    for (c, centroid) in centroids.outer_iter().enumerate()
    {
        let d = squared_distance(row, centroid);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

/// Gives each empty cluster the row that sits farthest from its own centroid,
/// taken from a cluster that can spare it.
fn relocate_empty_clusters(
    data: ArrayView2<f64>,
    labels: &mut [usize],
    distances: &mut [f64],
    sums: &mut Array2<f64>,
    counts: &mut [usize],
)
{
    for empty in 0..counts.len()
    {
        if counts[empty] > 0 {
            continue;
        }

        let mut donor: Option<usize> = None;
        for (i, &label) in labels.iter().enumerate()
        {
            if counts[label] < 2 {
                continue;
            }
            match donor {
                Some(d) if distances[d] >= distances[i] => {},
                _ => donor = Some(i),
            }
        }

        // Only possible when k > n, which fit() rules out.
        let Some(i) = donor else { return; };

        let row = data.row(i);
        let old = labels[i];
        {
            let mut old_sum = sums.row_mut(old);
            old_sum -= &row;
        }
        counts[old] -= 1;
        sums.row_mut(empty).assign(&row);
        counts[empty] = 1;
        labels[i] = empty;
        distances[i] = 0.0;
    }
}

fn absolute_tolerance(data: ArrayView2<f64>, tolerance: f64) -> f64
{
    match data.var_axis(Axis(0), 0.0).mean() {
        Some(mean_variance) => mean_variance * tolerance,
        None => 0.0,
    }
}

pub fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64
{
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}
