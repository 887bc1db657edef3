/// Finding the image files to cluster.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

pub const IMAGE_EXTENSIONS: [&str; 7] = [".png", ".jpg", ".jpeg", ".gif", ".bmp", ".tiff", ".webp"];

/// Case-insensitive suffix match of the file name against `extensions`.
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool
{
    match path.file_name().and_then(|name| name.to_str()) {
        Some(name) => {
            let name = name.to_lowercase();
            extensions.iter().any(|ext| name.ends_with(ext))
        },
        None => false,
    }
}

/// Lists the image files directly inside `directory`, sorted by file name.
/// Subdirectories are not descended into. Sorting keeps the enumeration
/// order, and so the mapping file, identical between runs.
pub fn find_images(directory: &Path) -> Result<Vec<PathBuf>>
{
    if !directory.is_dir() {
        return Err(Error::NotADirectory(directory.to_path_buf()));
    }

    let mut images = Vec::new();
    for entry in WalkDir::new(directory).min_depth(1).max_depth(1).sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file() && has_extension(entry.path(), &IMAGE_EXTENSIONS) {
            images.push(entry.into_path());
        }
    }

    Ok(images)
}
