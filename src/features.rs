/// Handcrafted color features for a single image.
///
/// The feature vector always has FEATURE_VECTOR_LENGTH entries, laid out as:
///
/// | range   | contents                                        |
/// |---------|-------------------------------------------------|
/// | 0..3    | mean R, G, B                                    |
/// | 3..6    | population standard deviation of R, G, B        |
/// | 6..22   | R histogram, HISTOGRAM_BINS bins over [0, 256)  |
/// | 22..38  | G histogram                                     |
/// | 38..54  | B histogram                                     |
/// | 54..63  | DOMINANT_COLORS centroids, R, G, B each         |
///
/// The dominant colors come from clustering a seeded random sample of the
/// pixels, so the same image always produces a bit-identical vector.

use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbImage};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::error::Result;
use crate::kmeans::{self, KMeansParams};
use crate::preprocessing;

pub const HISTOGRAM_BINS: usize = 16;
pub const DOMINANT_COLORS: usize = 3;
pub const FEATURE_VECTOR_LENGTH: usize = 3 + 3 + 3 * HISTOGRAM_BINS + 3 * DOMINANT_COLORS;

pub const MAX_SAMPLE_PIXELS: usize = 1000;
pub const DEFAULT_PIXEL_SAMPLE_SEED: u64 = 42;
pub const DEFAULT_DOMINANT_COLOR_SEED: u64 = 42;

const BIN_WIDTH: usize = 256 / HISTOGRAM_BINS;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureExtractor
{
    /// Seed for choosing which pixels feed the dominant-color pass.
    pub pixel_sample_seed: u64,
    /// Seed for the dominant-color clustering itself.
    pub dominant_color_seed: u64,
    pub dominant_color_restarts: usize,
}

impl Default for FeatureExtractor
{
    fn default() -> Self
    {
        FeatureExtractor {
            pixel_sample_seed: DEFAULT_PIXEL_SAMPLE_SEED,
            dominant_color_seed: DEFAULT_DOMINANT_COLOR_SEED,
            dominant_color_restarts: kmeans::DEFAULT_RESTARTS,
        }
    }
}

impl FeatureExtractor
{
    /// Decodes the file at `path` and extracts its feature vector.
    /// Fails with `Error::ImageDecode` if the file is not a readable image.
    pub fn extract_file(&self, path: &Path) -> Result<Array1<f64>>
    {
        let image = preprocessing::load_image(path)?;
        self.extract(&image)
    }

    pub fn extract(&self, image: &DynamicImage) -> Result<Array1<f64>>
    {
        let canonical = preprocessing::canonicalize(image);
        let pixels = preprocessing::pixel_rows(&canonical);

        let mut features = Vec::with_capacity(FEATURE_VECTOR_LENGTH);

        // A canonical image is never empty, so mean_axis always has a value.
        let means = pixels.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(3));
        features.extend(means.iter());
        features.extend(pixels.std_axis(Axis(0), 0.0).iter());

        for channel_histogram in histograms(&canonical).iter()
        {
            features.extend(channel_histogram.iter().map(|&count| count as f64));
        }

        features.extend(self.dominant_colors(&pixels)?.iter());

        debug_assert_eq!(features.len(), FEATURE_VECTOR_LENGTH);
        Ok(Array1::from_vec(features))
    }

    /// Centroids of a DOMINANT_COLORS-means clustering over at most
    /// MAX_SAMPLE_PIXELS pixels drawn without replacement, flattened row-major.
    pub fn dominant_colors(&self, pixels: &Array2<f64>) -> Result<Array1<f64>>
    {
        let sample_size = pixels.nrows().min(MAX_SAMPLE_PIXELS);
        if sample_size < DOMINANT_COLORS {
            return Ok(Array1::zeros(3 * DOMINANT_COLORS));
        }

        let mut rng = StdRng::seed_from_u64(self.pixel_sample_seed);
        let indices = rand::seq::index::sample(&mut rng, pixels.nrows(), sample_size).into_vec();
        let sample = pixels.select(Axis(0), &indices);

        let params = KMeansParams::new(DOMINANT_COLORS, self.dominant_color_seed)
            .with_restarts(self.dominant_color_restarts);
        let fit = kmeans::fit(sample.view(), &params)?;

        Ok(fit.centroids.iter().copied().collect())
    }

    /// Extracts features for every path on a pool of at most `jobs` threads
    /// (rayon's default when None). Results come back in the order of `paths`.
    pub fn extract_batch(&self, paths: &[PathBuf], jobs: Option<usize>) -> Result<Vec<(PathBuf, Result<Array1<f64>>)>>
    {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(jobs) = jobs {
            builder = builder.num_threads(jobs);
        }
        let pool = builder.build()?;

        let results: Vec<(PathBuf, Result<Array1<f64>>)> = pool.install(|| {
            paths.par_iter().map(|path| (path.clone(), self.extract_file(path))).collect()
        });

        Ok(results)
    }
}

/// Per-channel pixel counts in HISTOGRAM_BINS equal-width bins over [0, 256).
pub fn histograms(image: &RgbImage) -> [[u32; HISTOGRAM_BINS]; 3]
{
    let mut counts = [[0u32; HISTOGRAM_BINS]; 3];
    for pixel in image.pixels()
    {
        for (channel, &value) in pixel.0.iter().enumerate()
        {
            counts[channel][value as usize / BIN_WIDTH] += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests
{
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    use super::*;
    use crate::error::Error;
    use crate::preprocessing::CANONICAL_PIXEL_COUNT;

    fn gradient(width: u32, height: u32) -> DynamicImage
    {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, ((x + y) % 256) as u8])
        }))
    }

    #[test]
    fn vector_length_is_constant_across_resolutions()
    {
        let extractor = FeatureExtractor::default();
        for (w, h) in [(1, 1), (3, 700), (256, 256), (1024, 33)]
        {
            let features = extractor.extract(&gradient(w, h)).unwrap();
            assert_eq!(features.len(), FEATURE_VECTOR_LENGTH);
        }
        assert_eq!(FEATURE_VECTOR_LENGTH, 63);
    }

    #[test]
    fn extraction_is_bit_identical_across_calls()
    {
        let extractor = FeatureExtractor::default();
        let image = gradient(320, 200);
        let a = extractor.extract(&image).unwrap();
        let b = extractor.extract(&image).unwrap();
        let a_bits: Vec<u64> = a.iter().map(|v| v.to_bits()).collect();
        let b_bits: Vec<u64> = b.iter().map(|v| v.to_bits()).collect();
        assert_eq!(a_bits, b_bits);
    }

    #[test]
    fn solid_color_layout()
    {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 80, Rgb([255, 0, 40])));
        let features = FeatureExtractor::default().extract(&image).unwrap();

        assert_eq!(&features.as_slice().unwrap()[0..6], &[255.0, 0.0, 40.0, 0.0, 0.0, 0.0]);

        let total = CANONICAL_PIXEL_COUNT as f64;
        // 255 -> last red bin, 0 -> first green bin, 40 -> third blue bin.
        assert_eq!(features[6 + 15], total);
        assert_eq!(features[22], total);
        assert_eq!(features[38 + 2], total);
        let histogram_total: f64 = features.slice(ndarray::s![6..54]).sum();
        assert_eq!(histogram_total, 3.0 * total);

        for centroid in features.slice(ndarray::s![54..]).exact_chunks(3)
        {
            assert_eq!(centroid.to_vec(), vec![255.0, 0.0, 40.0]);
        }
    }

    #[test]
    fn alpha_is_ignored()
    {
        let opaque = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([9, 99, 199, 255])));
        let clear = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([9, 99, 199, 0])));
        let extractor = FeatureExtractor::default();
        assert_eq!(extractor.extract(&opaque).unwrap(), extractor.extract(&clear).unwrap());
    }

    #[test]
    fn histogram_bins_are_sixteen_wide()
    {
        let mut image = RgbImage::new(4, 1);
        image.put_pixel(0, 0, Rgb([0, 15, 16]));
        image.put_pixel(1, 0, Rgb([31, 32, 255]));
        image.put_pixel(2, 0, Rgb([240, 239, 128]));
        image.put_pixel(3, 0, Rgb([255, 0, 127]));
        let [r, g, b] = histograms(&image);

        assert_eq!(r[0], 1);
        assert_eq!(r[1], 1);
        assert_eq!(r[15], 2);
        assert_eq!(g[0], 2);
        assert_eq!(g[2], 1);
        assert_eq!(g[14], 1);
        assert_eq!(b[1], 1);
        assert_eq!(b[7], 1);
        assert_eq!(b[8], 1);
        assert_eq!(b[15], 1);
    }

    #[test]
    fn dominant_colors_find_a_two_tone_split()
    {
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(64, 64, |x, _| {
            if x < 32 { Rgb([0, 0, 0]) } else { Rgb([200, 200, 200]) }
        }));
        let features = FeatureExtractor::default().extract(&image).unwrap();
        let dominant = features.slice(ndarray::s![54..]).to_vec();

        // Resampling blurs the seam, but both flat halves must be represented.
        let has_dark = dominant.chunks(3).any(|c| c.iter().all(|&v| v < 20.0));
        let has_light = dominant.chunks(3).any(|c| c.iter().all(|&v| v > 180.0));
        assert!(has_dark && has_light, "dominant colors: {:?}", dominant);
    }

    #[test]
    fn different_pixel_seed_changes_only_the_dominant_block()
    {
        let image = gradient(128, 128);
        let a = FeatureExtractor::default().extract(&image).unwrap();
        let b = FeatureExtractor { pixel_sample_seed: 7, ..FeatureExtractor::default() }.extract(&image).unwrap();
        assert_eq!(a.slice(ndarray::s![..54]), b.slice(ndarray::s![..54]));
    }

    #[test]
    fn batch_keeps_order_and_reports_failures()
    {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        let bad = dir.path().join("bad.png");
        RgbImage::from_pixel(10, 10, Rgb([1, 2, 3])).save(&good).unwrap();
        std::fs::write(&bad, b"garbage").unwrap();

        let paths = vec![bad.clone(), good.clone()];
        let results = FeatureExtractor::default().extract_batch(&paths, Some(2)).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, bad);
        assert!(matches!(results[0].1, Err(Error::ImageDecode { .. })));
        assert_eq!(results[1].0, good);
        assert_eq!(results[1].1.as_ref().unwrap().len(), FEATURE_VECTOR_LENGTH);
    }
}
