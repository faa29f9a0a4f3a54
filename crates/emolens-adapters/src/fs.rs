//! Filesystem adapter for loading and saving images.

use anyhow::{Context, Result};
use emolens_core::domain::ImageInfo;
use emolens_core::ports::ImageSource;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Supported image extensions.
const RASTER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "webp", "bmp", "gif"];

/// Filesystem image source adapter.
pub struct FsImageSource {
    paths: Vec<PathBuf>,
    recursive: bool,
}

impl FsImageSource {
    /// Creates a new filesystem image source.
    ///
    /// # Arguments
    ///
    /// * `paths` - Files or directories to scan
    /// * `recursive` - Whether to recurse into subdirectories
    #[must_use]
    pub const fn new(paths: Vec<PathBuf>, recursive: bool) -> Self {
        Self { paths, recursive }
    }

    /// Collects all image files from the configured paths.
    fn collect_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for path in &self.paths {
            if path.is_file() {
                if is_supported_image(path) {
                    files.push(path.clone());
                } else {
                    warn!("Unsupported file type: {}", path.display());
                }
            } else if path.is_dir() {
                self.collect_from_dir(path, &mut files);
            } else {
                warn!("Path does not exist: {}", path.display());
            }
        }

        files
    }

    fn collect_from_dir(&self, dir: &Path, files: &mut Vec<PathBuf>) {
        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!("Failed to read directory {}: {e}", dir.display());
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() && is_supported_image(&path) {
                files.push(path);
            } else if path.is_dir() && self.recursive {
                self.collect_from_dir(&path, files);
            }
        }
    }
}

impl ImageSource for FsImageSource {
    fn images(&self) -> Box<dyn Iterator<Item = Result<ImageInfo>> + Send + '_> {
        let files = self.collect_files();
        debug!("Found {} image files", files.len());

        Box::new(files.into_iter().map(|path| load_image(&path)))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.collect_files().len())
    }
}

/// Checks if a path has a supported image extension.
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| RASTER_EXTENSIONS.contains(&e.as_str()))
}

/// Loads an image from the filesystem, decoded to RGBA8.
fn load_image(path: &Path) -> Result<ImageInfo> {
    let decoded = image::open(path)
        .with_context(|| format!("Failed to open image: {}", path.display()))?;

    Ok(ImageInfo::new(
        path.to_string_lossy().into_owned(),
        decoded.to_rgba8(),
    ))
}

/// Writes an annotated visualization next to the given stem in `dir`.
///
/// The file is named after the source image with an `.annotated.png`
/// suffix; the directory is created on demand.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the PNG encode
/// fails.
pub fn save_annotated(dir: &Path, source_path: &str, annotated: &RgbaImage) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let stem = Path::new(source_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let out = dir.join(format!("{stem}.annotated.png"));

    annotated
        .save(&out)
        .with_context(|| format!("Failed to write {}", out.display()))?;

    debug!("Saved annotated image to {}", out.display());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image(Path::new("test.jpg")));
        assert!(is_supported_image(Path::new("test.JPEG")));
        assert!(is_supported_image(Path::new("test.png")));
        assert!(!is_supported_image(Path::new("test.txt")));
        assert!(!is_supported_image(Path::new("test")));
    }

    #[test]
    fn test_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let info = load_image(&path).unwrap();
        assert_eq!(info.width, 3);
        assert_eq!(info.height, 2);
        assert_eq!(info.image.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_source_skips_unsupported_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();
        RgbaImage::new(2, 2).save(dir.path().join("ok.png")).unwrap();

        let source = FsImageSource::new(vec![dir.path().to_path_buf()], false);
        assert_eq!(source.count_hint(), Some(1));
        assert_eq!(source.images().count(), 1);
    }

    #[test]
    fn test_save_annotated_names_output_after_source() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbaImage::new(4, 4);

        let out = save_annotated(dir.path(), "/photos/selfie.jpg", &img).unwrap();
        assert!(out.ends_with("selfie.annotated.png"));
        assert!(out.exists());
    }
}
