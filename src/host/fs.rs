//! Filesystem-backed implementation of the storage capability traits.
//!
//! The "drive" is a root directory; every exported run gets its own
//! subdirectory under it. Cloud folders may share a display name, local
//! directories cannot, so a `_N` counter suffix keeps each run's folder
//! distinct.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{BilldropError, Result};
use crate::host::{DriveFolder, DriveTarget};

/// A destination root directory.
pub struct FsDrive {
    root: PathBuf,
}

/// One created folder under the drive root.
pub struct FsFolder {
    path: PathBuf,
}

impl FsDrive {
    /// Use `root` as the drive; it is created if missing.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| BilldropError::io(&root, e))?;
        Ok(Self { root })
    }
}

impl DriveTarget for FsDrive {
    type Folder = FsFolder;

    fn create_folder(&self, name: &str) -> Result<FsFolder> {
        let display = sanitize_filename_part(name, 100);
        let path = unique_path(&self.root.join(display));
        std::fs::create_dir(&path).map_err(|e| BilldropError::io(&path, e))?;
        debug!(path = %path.display(), "Created destination folder");
        Ok(FsFolder { path })
    }
}

impl DriveFolder for FsFolder {
    fn create_file(&mut self, filename: &str, content: &[u8]) -> Result<String> {
        let sanitized = sanitize_filename_part(filename, 150);
        let path = unique_path(&self.path.join(&sanitized));
        std::fs::write(&path, content).map_err(|e| BilldropError::io(&path, e))?;

        let stored = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&sanitized)
            .to_string();
        debug!(file = %stored, bytes = content.len(), "Copied attachment");
        Ok(stored)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Replace characters unsafe in file names and cap the length.
pub fn sanitize_filename_part(s: &str, max_len: usize) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '.' || c == '_' || c == '@' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect();

    if sanitized.trim().is_empty() {
        "unnamed".to_string()
    } else {
        sanitized
    }
}

/// If `path` already exists, append a counter to make it unique.
fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let parent = path.parent().unwrap_or(Path::new("."));

    for i in 1..1000 {
        let candidate = if ext.is_empty() {
            parent.join(format!("{stem}_{i}"))
        } else {
            parent.join(format!("{stem}_{i}.{ext}"))
        };
        if !candidate.exists() {
            return candidate;
        }
    }

    // Fallback — very unlikely
    parent.join(format!("{stem}_dup.{ext}"))
}
