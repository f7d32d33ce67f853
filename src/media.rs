//! Media index module
//!
//! Recursively discovers servable media files beneath the media root. The
//! index is owned by its server instance and rebuilt wholesale on reload;
//! nothing here is cached in process-wide state.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Extensions considered media by the index, matched case-insensitively.
const MEDIA_EXTENSIONS: &[&str] = &[
    "mp3", "mp4", "m4a", "wav", "flac", "ogg", "webm", "mov", "jpg", "jpeg", "png", "gif", "webp",
];

/// The set of known media files under one root, sorted for stable listings.
#[derive(Debug)]
pub struct MediaIndex {
    root: PathBuf,
    files: Vec<PathBuf>,
}

impl MediaIndex {
    /// Walk `root` and collect every media file beneath it. `root` should
    /// already be canonicalized so the collected paths are absolute.
    pub fn scan(root: &Path) -> io::Result<Self> {
        let mut files = Vec::new();
        walk(root, &mut files)?;
        files.sort();
        Ok(Self {
            root: root.to_path_buf(),
            files,
        })
    }

    /// Absolute paths of all indexed files.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Paths relative to the media root, as used in listing hrefs.
    pub fn relative_paths(&self) -> impl Iterator<Item = String> + '_ {
        self.files
            .iter()
            .filter_map(|p| p.strip_prefix(&self.root).ok())
            .map(|p| p.to_string_lossy().into_owned())
    }
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let path = entry.path();
        if file_type.is_dir() {
            walk(&path, files)?;
        } else if file_type.is_file() && is_media(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_media(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| MEDIA_EXTENSIONS.iter().any(|m| ext.eq_ignore_ascii_case(m)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_filters_and_recurses() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("song.mp3"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("videos")).unwrap();
        std::fs::write(dir.path().join("videos").join("clip.MP4"), b"x").unwrap();

        let root = dir.path().canonicalize().unwrap();
        let index = MediaIndex::scan(&root).unwrap();
        assert_eq!(index.len(), 2);

        let rel: Vec<String> = index.relative_paths().collect();
        assert!(rel.contains(&"song.mp3".to_string()));
        assert!(rel.iter().any(|p| p.ends_with("clip.MP4")));
    }

    #[test]
    fn test_empty_root() {
        let dir = tempfile::tempdir().unwrap();
        let index = MediaIndex::scan(dir.path()).unwrap();
        assert!(index.is_empty());
        assert!(index.files().is_empty());
    }

    #[test]
    fn test_listing_order_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.mp3"), b"x").unwrap();
        std::fs::write(dir.path().join("a.mp3"), b"x").unwrap();
        let index = MediaIndex::scan(dir.path()).unwrap();
        let rel: Vec<String> = index.relative_paths().collect();
        assert_eq!(rel, vec!["a.mp3".to_string(), "b.mp3".to_string()]);
    }
}
