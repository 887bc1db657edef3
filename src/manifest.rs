/// Builds the image manifest the web viewer loads.
/// Scans a staged output directory (see `staging`) and lists every image in
/// its `cluster_<n>` subdirectories.
///
/// The viewer is expected to live in a directory next to the clusters
/// directory, so image paths are written as `../<clusters dir>/<cluster>/<file>`.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rustc_hash::FxHashSet;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::interface::{Manifest, ManifestImage};
use crate::scan::has_extension;
use crate::staging::CLUSTER_DIR_PREFIX;

pub const MANIFEST_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp"];
pub const MANIFEST_JSON_FILE_NAME: &str = "images.json";
pub const MANIFEST_JS_FILE_NAME: &str = "images_data.js";

#[derive(Debug, Clone, PartialEq)]
pub struct ManifestConfig
{
    pub clusters_dir: PathBuf,
    pub out_dir: PathBuf,
}

/// Scans `config.clusters_dir`, then writes both manifest files into `config.out_dir`.
pub fn generate(config: &ManifestConfig) -> Result<Manifest>
{
    info!("Generating image list for web interface...");
    let manifest = build_manifest(&config.clusters_dir)?;
    write_manifest(&manifest, &config.out_dir)?;

    info!("Generated {} and {} in {:?}", MANIFEST_JSON_FILE_NAME, MANIFEST_JS_FILE_NAME, config.out_dir);
    info!("  Total images: {}", manifest.total);
    info!("  Clusters: {}", manifest.clusters);
    Ok(manifest)
}

pub fn build_manifest(clusters_dir: &Path) -> Result<Manifest>
{
    if !clusters_dir.is_dir() {
        return Err(Error::NotADirectory(clusters_dir.to_path_buf()));
    }
    let web_root = web_root_name(clusters_dir)?;

    let mut images = Vec::new();
    let mut found_cluster_dir = false;
    for entry in WalkDir::new(clusters_dir).min_depth(1).max_depth(1).sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let cluster_name = entry.file_name().to_string_lossy().into_owned();
        let Some(suffix) = cluster_name.strip_prefix(CLUSTER_DIR_PREFIX) else { continue; };
        let cluster = match suffix.parse::<usize>() {
            Ok(cluster) => cluster,
            Err(_) => {
                warn!("Skipping {:?}: not a numbered cluster directory", entry.path());
                continue;
            }
        };
        found_cluster_dir = true;

        for file in WalkDir::new(entry.path()).min_depth(1).max_depth(1).sort_by_file_name()
        {
            let file = file?;
            if !file.file_type().is_file() || !has_extension(file.path(), &MANIFEST_EXTENSIONS) {
                continue;
            }
            let filename = file.file_name().to_string_lossy().into_owned();
            debug!("Selected from {}: {}", cluster_name, filename);
            images.push(ManifestImage {
                path: format!("../{}/{}/{}", web_root, cluster_name, filename),
                cluster,
                filename,
                cluster_name: cluster_name.clone(),
            });
        }
    }

    if !found_cluster_dir {
        return Err(Error::NoClusterDirectories(clusters_dir.to_path_buf()));
    }

    let clusters = images.iter().map(|image| image.cluster).collect::<FxHashSet<usize>>().len();
    Ok(Manifest { total: images.len(), clusters, images })
}

/// Writes `images.json`, and `images_data.js` which embeds the same JSON as
/// `window.IMAGE_DATA` so the viewer works from `file://` without CORS issues.
pub fn write_manifest(manifest: &Manifest, out_dir: &Path) -> Result<()>
{
    fs::create_dir_all(out_dir)?;
    let json = serde_json::to_string_pretty(manifest)?;

    fs::write(out_dir.join(MANIFEST_JSON_FILE_NAME), &json)?;

    let script = format!(
        "// Auto-generated image data (avoids CORS issues)\nwindow.IMAGE_DATA = {};\n",
        json);
    fs::write(out_dir.join(MANIFEST_JS_FILE_NAME), script)?;

    Ok(())
}

fn web_root_name(clusters_dir: &Path) -> Result<String>
{
    // Resolve paths like `..` or `.` so the directory has a real name.
    let resolved = clusters_dir.canonicalize()?;
    let name = resolved
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(name)
}
