/// Decoding and normalizing images before feature extraction.
/// Every image is brought to the same 8-bit RGB, fixed-resolution form so
/// that the statistics computed from it always have the same shape.

use std::path::Path;

use image::{imageops::{self, FilterType}, DynamicImage, RgbImage};
use ndarray::Array2;

use crate::error::{Error, Result};

pub const CANONICAL_SIZE: u32 = 256;
pub const CANONICAL_PIXEL_COUNT: usize = (CANONICAL_SIZE * CANONICAL_SIZE) as usize;

pub fn load_image(path: &Path) -> Result<DynamicImage>
{
    image::open(path).map_err(|source| Error::ImageDecode { path: path.to_path_buf(), source })
}

/// Drops alpha, expands palette and grayscale images to RGB, then resizes to
/// CANONICAL_SIZE x CANONICAL_SIZE. Aspect ratio is not preserved.
pub fn canonicalize(image: &DynamicImage) -> RgbImage
{
    let rgb = image.to_rgb8();
    imageops::resize(&rgb, CANONICAL_SIZE, CANONICAL_SIZE, FilterType::CatmullRom)
}

/// Flattens the image into one row per pixel with the R, G and B values as columns.
pub fn pixel_rows(image: &RgbImage) -> Array2<f64>
{
    let (width, height) = image.dimensions();
    let mut rows = Array2::<f64>::zeros(((width * height) as usize, 3));
    for (mut row, pixel) in rows.outer_iter_mut().zip(image.pixels())
    {
        let [r, g, b] = pixel.0;
        row[0] = r as f64;
        row[1] = g as f64;
        row[2] = b as f64;
    }
    rows
}
