/// Structs serialized into the web viewer's image manifest.
/// The viewer reads them from `images.json` or from `window.IMAGE_DATA`,
/// so field names are part of its interface and become the JSON keys.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ManifestImage
{
    /// Path of the image relative to the viewer's directory, with forward slashes.
    pub path: String,
    pub cluster: usize,
    pub filename: String,
    pub cluster_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Manifest
{
    pub images: Vec<ManifestImage>,
    pub total: usize,
    /// Number of distinct clusters that contain at least one image.
    pub clusters: usize,
}
