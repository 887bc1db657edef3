use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chroma_cluster::pipeline::{self, ClusterConfig};
use chroma_cluster::staging::MAPPING_FILE_NAME;
use chroma_cluster::manifest::{self, ManifestConfig};
use image::{Rgb, RgbImage};

const RED: [u8; 3] = [255, 0, 0];
const GREEN: [u8; 3] = [0, 255, 0];
const BLUE: [u8; 3] = [0, 0, 255];

fn write_jpeg(dir: &Path, name: &str, color: [u8; 3], size: (u32, u32))
{
    RgbImage::from_pixel(size.0, size.1, Rgb(color))
        .save(dir.join(name))
        .unwrap();
}

/// Writes three solid-color JPEGs per color. `names` gives the file names in
/// red, red, red, green, green, green, blue, blue, blue order.
fn write_solid_set(dir: &Path, names: [&str; 9])
{
    let colors = [RED, RED, RED, GREEN, GREEN, GREEN, BLUE, BLUE, BLUE];
    let sizes = [(32, 32), (64, 20), (17, 90)];
    for (i, (name, color)) in names.iter().zip(colors).enumerate()
    {
        write_jpeg(dir, name, color, sizes[i % 3]);
    }
}

/// Groups file names by cluster label, ignoring which label each group got.
fn groups(assignment: &chroma_cluster::models::ClusterAssignment) -> Vec<Vec<String>>
{
    let mut by_label: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    for (path, label) in &assignment.entries
    {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        by_label.entry(*label).or_default().push(name);
    }
    let mut groups: Vec<Vec<String>> = by_label.into_values().collect();
    for group in groups.iter_mut()
    {
        group.sort();
    }
    groups.sort();
    groups
}

#[test]
fn solid_colors_cluster_by_color()
{
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_solid_set(input.path(), [
        "r1.jpg", "r2.jpg", "r3.jpg",
        "g1.jpg", "g2.jpg", "g3.jpg",
        "b1.jpg", "b2.jpg", "b3.jpg",
    ]);

    let config = ClusterConfig::new(input.path(), output.path().join("clustered"), 3);
    let assignment = pipeline::run(&config).unwrap();

    assert_eq!(assignment.entries.len(), 9);
    assert_eq!(assignment.cluster_sizes(), vec![3, 3, 3]);
    assert_eq!(groups(&assignment), vec![
        vec!["b1.jpg", "b2.jpg", "b3.jpg"],
        vec!["g1.jpg", "g2.jpg", "g3.jpg"],
        vec!["r1.jpg", "r2.jpg", "r3.jpg"],
    ]);
}

#[test]
fn grouping_does_not_depend_on_enumeration_order()
{
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    // Interleave the colors in name order.
    write_solid_set(input.path(), [
        "a.jpg", "d.jpg", "g.jpg",
        "b.jpg", "e.jpg", "h.jpg",
        "c.jpg", "f.jpg", "i.jpg",
    ]);

    let config = ClusterConfig::new(input.path(), output.path().join("clustered"), 3);
    let assignment = pipeline::run(&config).unwrap();

    assert_eq!(groups(&assignment), vec![
        vec!["a.jpg", "d.jpg", "g.jpg"],
        vec!["b.jpg", "e.jpg", "h.jpg"],
        vec!["c.jpg", "f.jpg", "i.jpg"],
    ]);
}

#[test]
fn rerunning_reproduces_the_output()
{
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_solid_set(input.path(), [
        "r1.jpg", "r2.jpg", "r3.jpg",
        "g1.jpg", "g2.jpg", "g3.jpg",
        "b1.jpg", "b2.jpg", "b3.jpg",
    ]);
    fs::write(input.path().join("corrupt.png"), b"garbage").unwrap();

    let out_dir = output.path().join("clustered");
    let config = ClusterConfig { jobs: Some(3), ..ClusterConfig::new(input.path(), &out_dir, 3) };

    let first = pipeline::run(&config).unwrap();
    let first_mapping = fs::read_to_string(out_dir.join(MAPPING_FILE_NAME)).unwrap();
    let second = pipeline::run(&config).unwrap();
    let second_mapping = fs::read_to_string(out_dir.join(MAPPING_FILE_NAME)).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_mapping, second_mapping);
    assert!(!first_mapping.contains("corrupt.png"));
    assert_eq!(first_mapping.lines().filter(|l| l.contains(" -> Cluster ")).count(), 9);

    for (path, label) in &second.entries
    {
        let staged = out_dir.join(format!("cluster_{}", label)).join(path.file_name().unwrap());
        assert_eq!(fs::read(staged).unwrap(), fs::read(path).unwrap());
    }
}

#[test]
fn manifest_lists_the_staged_images()
{
    let root = tempfile::tempdir().unwrap();
    let input = root.path().join("artworks");
    fs::create_dir(&input).unwrap();
    write_solid_set(&input, [
        "r1.jpg", "r2.jpg", "r3.jpg",
        "g1.jpg", "g2.jpg", "g3.jpg",
        "b1.jpg", "b2.jpg", "b3.jpg",
    ]);

    let clusters_dir = root.path().join("clustered_artworks");
    let assignment = pipeline::run(&ClusterConfig::new(&input, &clusters_dir, 3)).unwrap();

    let web_dir = root.path().join("web_interface");
    let manifest = manifest::generate(&ManifestConfig { clusters_dir, out_dir: web_dir.clone() }).unwrap();

    assert_eq!(manifest.total, 9);
    assert_eq!(manifest.clusters, 3);
    for image in &manifest.images
    {
        let source = input.join(&image.filename);
        assert_eq!(assignment.label_of(&source), Some(image.cluster));
        assert_eq!(image.path, format!("../clustered_artworks/cluster_{}/{}", image.cluster, image.filename));
    }
    assert!(web_dir.join("images.json").is_file());
    assert!(web_dir.join("images_data.js").is_file());
}
