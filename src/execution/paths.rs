//! Output location of masked videos.

use std::io;
use std::path::{Path, PathBuf};

/// Suffix appended to the input name.
pub const MASKED_SUFFIX: &str = "_masked";

/// Input name up to the first dot (`clip.v2.mp4` → `clip`).
pub fn base_name(input: &Path) -> String {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    file_name.split('.').next().unwrap_or_default().to_string()
}

/// Input extension after the last dot, without the dot.
pub fn source_extension(input: &Path) -> String {
    input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Path of the masked video for `input`, before the extension is chosen.
///
/// Lands in `output_dir` when given (created if missing), else next to the
/// input.
pub fn resolve_output_stem(input: &Path, output_dir: Option<&Path>) -> io::Result<PathBuf> {
    let name = format!("{}{}", base_name(input), MASKED_SUFFIX);
    match output_dir {
        Some(dir) => {
            if !dir.exists() {
                std::fs::create_dir_all(dir)?;
                log::info!("Created output directory {}", dir.display());
            }
            Ok(dir.join(name))
        }
        None => {
            let parent = input
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            Ok(parent.join(name))
        }
    }
}

/// Full output path with `extension` applied.
pub fn resolve_output_path(
    input: &Path,
    output_dir: Option<&Path>,
    extension: &str,
) -> io::Result<PathBuf> {
    let stem = resolve_output_stem(input, output_dir)?;
    let mut path = stem.into_os_string();
    if !extension.is_empty() {
        path.push(".");
        path.push(extension);
    }
    Ok(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        let input = Path::new("/videos/clip.v2.mkv");
        assert_eq!(base_name(input), "clip");
        assert_eq!(source_extension(input), "mkv");
        assert_eq!(source_extension(Path::new("noext")), "");
    }

    #[test]
    fn test_defaults_next_to_input() {
        let path = resolve_output_path(Path::new("/videos/clip.avi"), None, "avi").unwrap();
        assert_eq!(path, PathBuf::from("/videos/clip_masked.avi"));

        let bare = resolve_output_path(Path::new("clip.avi"), None, "mp4").unwrap();
        assert_eq!(bare, PathBuf::from("./clip_masked.mp4"));
    }

    #[test]
    fn test_creates_output_dir() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("nested").join("out");

        let path = resolve_output_path(Path::new("/videos/clip.avi"), Some(&out), "mp4").unwrap();
        assert!(out.is_dir());
        assert_eq!(path, out.join("clip_masked.mp4"));
    }
}
