//! Scoped temp files for automation scripts and intermediate bitmaps
//!
//! A [`TempResource`] is deleted when dropped, on every exit path. Deletion
//! failures are logged and otherwise ignored.
//!
//! ImageMagick writes multi-frame inputs as `<stem>-0.png`, `<stem>-1.png`,
//! ... instead of the requested path, so bitmap resources also own those
//! numbered siblings.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use glob::Pattern;
use tempfile::{Builder, TempPath};

use crate::error::Result;

/// What a temp file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempKind {
    Script,
    Bitmap,
}

/// A temp file path that is removed on drop
#[derive(Debug)]
pub struct TempResource {
    kind: TempKind,
    path: Option<TempPath>,
}

fn builder<'a>(prefix: &'a str, suffix: &'a str) -> Builder<'a, 'a> {
    let mut builder = Builder::new();
    builder.prefix(prefix).suffix(suffix);
    builder
}

fn timestamped(stem: &str) -> String {
    format!("{stem}_{}_", Utc::now().timestamp_millis())
}

impl TempResource {
    /// Write `contents` to a new temp file named `<stem>_<timestamp>_<random>.<extension>`
    pub fn with_contents(kind: TempKind, stem: &str, extension: &str, contents: &[u8]) -> Result<Self> {
        let prefix = timestamped(stem);
        let suffix = format!(".{extension}");
        let mut file = builder(&prefix, &suffix).tempfile()?;
        file.write_all(contents)?;
        file.flush()?;

        Ok(Self {
            kind,
            path: Some(file.into_temp_path()),
        })
    }

    /// Reserve a unique temp path without creating the file
    ///
    /// Used for outputs written by an external program.
    pub fn reserve(kind: TempKind, stem: &str, extension: &str) -> Result<Self> {
        let prefix = timestamped(stem);
        let suffix = format!(".{extension}");
        let reserved = builder(&prefix, &suffix).make(|path| Ok(path.to_path_buf()))?;

        Ok(Self {
            kind,
            path: Some(reserved.into_temp_path()),
        })
    }

    pub fn kind(&self) -> TempKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        match &self.path {
            Some(path) => path,
            None => Path::new(""),
        }
    }

    /// Path of frame `index` as written by the raster engine for multi-frame inputs
    pub fn frame_path(&self, index: usize) -> PathBuf {
        frame_path(self.path(), index)
    }

    /// The file an external program actually produced: the reserved path, or
    /// its first frame when the input had several
    pub fn produced(&self) -> Option<PathBuf> {
        let path = self.path();
        if path.exists() {
            return Some(path.to_path_buf());
        }
        let first_frame = self.frame_path(0);
        first_frame.exists().then_some(first_frame)
    }
}

fn frame_path(path: &Path, index: usize) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let name = match path.extension() {
        Some(ext) => format!("{stem}-{index}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{index}"),
    };
    path.with_file_name(name)
}

/// Numbered frame files next to `path` (`<stem>-<n>.<ext>`)
fn frame_files(path: &Path) -> Vec<PathBuf> {
    let (Some(dir), Some(stem)) = (path.parent(), path.file_stem()) else {
        return Vec::new();
    };
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let pattern = format!(
        "{}-*{}",
        Pattern::escape(&dir.join(stem).to_string_lossy()),
        Pattern::escape(&ext)
    );

    let prefix = format!("{}-", stem.to_string_lossy());
    let Ok(entries) = glob::glob(&pattern) else {
        return Vec::new();
    };
    entries
        .flatten()
        .filter(|candidate| {
            candidate
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .and_then(|n| n.strip_prefix(&prefix).map(|rest| rest.trim_end_matches(&ext).to_string()))
                .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
        })
        .collect()
}

impl Drop for TempResource {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        let shown = path.display().to_string();
        let existed = path.exists();

        if self.kind == TempKind::Bitmap {
            for frame in frame_files(&path) {
                if let Err(e) = fs::remove_file(&frame) {
                    tracing::warn!(path = %frame.display(), error = %e, "failed to remove temp frame");
                }
            }
        }

        if let Err(e) = path.close() {
            if existed {
                tracing::warn!(path = %shown, kind = ?self.kind, error = %e, "failed to remove temp file");
            }
        }
    }
}
