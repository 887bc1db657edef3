/// Writing a clustering result to disk: one `cluster_<label>` directory per
/// label holding copies of its images, plus a plain-text mapping file.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::Result;
use crate::models::ClusterAssignment;

pub const MAPPING_FILE_NAME: &str = "cluster_mapping.txt";
pub const CLUSTER_DIR_PREFIX: &str = "cluster_";

pub fn cluster_dir_name(label: usize) -> String
{
    format!("{}{}", CLUSTER_DIR_PREFIX, label)
}

/// Replaces `output_dir` with the staged clusters.
/// Any previous contents of `output_dir` are removed first, so staging the
/// same assignment twice leaves the same tree behind.
pub fn stage(assignment: &ClusterAssignment, output_dir: &Path) -> Result<()>
{
    if output_dir.exists() {
        fs::remove_dir_all(output_dir)?;
    }
    fs::create_dir_all(output_dir)?;

    // Every label gets a directory, even if no image ended up in it.
    for label in 0..assignment.k
    {
        fs::create_dir_all(output_dir.join(cluster_dir_name(label)))?;
    }

    for (path, label) in &assignment.entries
    {
        let destination = staged_path(output_dir, path, *label)?;
        fs::copy(path, &destination)?;
    }

    fs::write(output_dir.join(MAPPING_FILE_NAME), mapping_text(assignment))?;

    info!("Results saved in {:?}:", output_dir);
    for (label, size) in assignment.cluster_sizes().iter().enumerate()
    {
        info!("  Cluster {}: {} images", label, size);
    }

    Ok(())
}

fn staged_path(output_dir: &Path, source: &Path, label: usize) -> Result<PathBuf>
{
    let filename = source.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("{:?} has no file name", source))
    })?;
    Ok(output_dir.join(cluster_dir_name(label)).join(filename))
}

/// The mapping file body: a header, then `<filename> -> Cluster <label>`
/// for every image in enumeration order.
pub fn mapping_text(assignment: &ClusterAssignment) -> String
{
    let mut text = String::new();
    text.push_str("Image Clustering Results\n");
    text.push_str(&"=".repeat(50));
    text.push_str("\n\n");
    for (path, label) in &assignment.entries
    {
        let filename = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        // Writing to a String cannot fail.
        let _ = writeln!(text, "{} -> Cluster {}", filename, label);
    }
    text
}
