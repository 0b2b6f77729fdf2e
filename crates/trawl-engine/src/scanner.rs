use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

use trawl_types::SourceFile;

/// A source entry the scanner could not fully read. Never fatal: the sync
/// engine records these and keeps going.
#[derive(Debug, Clone)]
pub struct ScanWarning {
    pub path: Option<PathBuf>,
    pub message: String,
}

/// Lazy recursive walk over session files under a root directory.
///
/// Yields one `SourceFile` per readable `*.jsonl` file in a deterministic
/// (sorted) order. A missing root yields nothing; an unreadable entry yields
/// a `ScanWarning` in its place.
pub struct SourceScan {
    inner: Option<walkdir::IntoIter>,
}

impl Iterator for SourceScan {
    type Item = std::result::Result<SourceFile, ScanWarning>;

    fn next(&mut self) -> Option<Self::Item> {
        let walker = self.inner.as_mut()?;

        loop {
            let entry = match walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    return Some(Err(ScanWarning {
                        path: err.path().map(Path::to_path_buf),
                        message: err.to_string(),
                    }));
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if path.extension().is_none_or(|e| e != "jsonl") {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    return Some(Err(ScanWarning {
                        path: Some(path.to_path_buf()),
                        message: err.to_string(),
                    }));
                }
            };

            let mtime_epoch = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map_or(0.0, |d| d.as_secs_f64());

            return Some(Ok(SourceFile {
                path: path.to_path_buf(),
                size: metadata.len(),
                mtime_epoch,
            }));
        }
    }
}

/// Enumerate session files under `root`. Restartable: call again for a fresh
/// snapshot of the directory.
pub fn scan(root: &Path) -> SourceScan {
    if !root.exists() {
        return SourceScan { inner: None };
    }

    SourceScan {
        inner: Some(
            WalkDir::new(root)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter(),
        ),
    }
}
