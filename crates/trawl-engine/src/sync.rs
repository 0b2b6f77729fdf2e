use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use trawl_index::{Database, IndexManager, SessionCursor};
use trawl_types::{
    EventRecord, ParseOutcome, SourceFile, SyncError, SyncMode, SyncReport, now_rfc3339,
    session_id_from_path,
};

use crate::parser::parse_line;
use crate::scanner::scan;
use crate::{Error, Result};

/// Filesystems round mtimes differently; anything closer than this is the
/// same instant.
const MTIME_EPSILON: f64 = 0.0005;

/// Progress notifications emitted during a sync pass. The engine stays
/// silent; the caller decides what is worth printing.
#[derive(Debug, Clone)]
pub enum SyncProgress {
    ScanStarted {
        root: PathBuf,
    },
    SessionUnchanged {
        path: PathBuf,
    },
    SessionIngested {
        path: PathBuf,
        events: usize,
        reset: bool,
    },
    SourceSkipped {
        path: Option<PathBuf>,
        message: String,
    },
    IndexRebuilt,
    IndexStale,
    IndexUnavailable {
        message: String,
    },
    Completed {
        sessions_scanned: usize,
        sessions_changed: usize,
        events_ingested: usize,
    },
}

/// Orchestrates scanner, parser and cursor store into an incremental
/// ingestion pass. Sole writer of session and event state.
pub struct SyncEngine<'a> {
    db: &'a Database,
    sessions_root: PathBuf,
}

impl<'a> SyncEngine<'a> {
    pub fn new(db: &'a Database, sessions_root: impl Into<PathBuf>) -> Self {
        Self {
            db,
            sessions_root: sessions_root.into(),
        }
    }

    pub fn sync<F>(&self, mode: SyncMode, reindex: bool, mut on_progress: F) -> Result<SyncReport>
    where
        F: FnMut(SyncProgress),
    {
        let mut report = SyncReport::default();
        let manager = IndexManager::new(self.db);

        if mode == SyncMode::Full {
            self.db.clear_all()?;
            manager.mark_stale()?;
        }

        report.fts_available = manager.ensure_available();

        on_progress(SyncProgress::ScanStarted {
            root: self.sessions_root.clone(),
        });

        for item in scan(&self.sessions_root) {
            match item {
                Err(warning) => {
                    on_progress(SyncProgress::SourceSkipped {
                        path: warning.path.clone(),
                        message: warning.message.clone(),
                    });
                    report.errors.push(SyncError {
                        path: warning.path.map(|p| p.display().to_string()),
                        message: warning.message,
                    });
                }
                Ok(file) => {
                    report.sessions_scanned += 1;
                    match self.sync_file(&file, &mut report, &mut on_progress) {
                        Ok(()) => {}
                        // Storage failures are fatal for the whole pass;
                        // anything else costs only this session.
                        Err(Error::Index(err)) => return Err(Error::Index(err)),
                        Err(err) => {
                            let message = err.to_string();
                            on_progress(SyncProgress::SourceSkipped {
                                path: Some(file.path.clone()),
                                message: message.clone(),
                            });
                            report.errors.push(SyncError {
                                path: Some(file.path.display().to_string()),
                                message,
                            });
                        }
                    }
                }
            }
        }

        if reindex && report.events_ingested > 0 && report.fts_available {
            match manager.rebuild() {
                Ok(()) => {
                    report.fts_reindexed = true;
                    on_progress(SyncProgress::IndexRebuilt);
                }
                Err(err) => {
                    let message = err.to_string();
                    report.index_warning = Some(message.clone());
                    on_progress(SyncProgress::IndexUnavailable { message });
                }
            }
        } else if report.events_ingested > 0 {
            manager.mark_stale()?;
            on_progress(SyncProgress::IndexStale);
        }

        on_progress(SyncProgress::Completed {
            sessions_scanned: report.sessions_scanned,
            sessions_changed: report.sessions_changed,
            events_ingested: report.events_ingested,
        });

        Ok(report)
    }

    fn sync_file<F>(
        &self,
        file: &SourceFile,
        report: &mut SyncReport,
        on_progress: &mut F,
    ) -> Result<()>
    where
        F: FnMut(SyncProgress),
    {
        let session_id = session_id_from_path(&file.path);
        let stored = self.db.get_cursor(&session_id)?;

        if let Some(cursor) = &stored {
            let same_size = cursor.file_size == file.size as i64;
            let same_mtime = (cursor.mtime_epoch - file.mtime_epoch).abs() < MTIME_EPSILON;
            if same_size && same_mtime {
                self.db.touch_session(&session_id, &now_rfc3339())?;
                on_progress(SyncProgress::SessionUnchanged {
                    path: file.path.clone(),
                });
                return Ok(());
            }
        }

        report.sessions_changed += 1;

        // Decide between resuming after the cursor and starting over. The
        // running hasher is seeded with the verified prefix so the new
        // fingerprint always covers the file from byte zero.
        let mut hasher = Sha256::new();
        let mut resume_offset: u64 = 0;
        if let Some(cursor) = &stored {
            let offset = cursor.last_offset.max(0) as u64;
            if offset > 0 && file.size >= offset {
                let (prefix_hex, prefix_hasher) = hash_prefix(&file.path, offset)
                    .map_err(|err| Error::Source(format!("{}: {}", file.path.display(), err)))?;
                if cursor.last_fingerprint.as_deref() == Some(prefix_hex.as_str()) {
                    resume_offset = offset;
                    hasher = prefix_hasher;
                }
            }
        }

        // Resuming from zero on a known session means the prefix diverged
        // (or the cursor was invalidated): drop its events and re-ingest.
        let reset = resume_offset == 0;
        let mut next_seq = if reset {
            0
        } else {
            self.db.max_seq(&session_id)?.map_or(0, |seq| seq + 1)
        };

        let mut reader = BufReader::new(open_source(&file.path)?);
        if resume_offset > 0 {
            reader.seek(SeekFrom::Start(resume_offset))?;
        }

        let mut events: Vec<EventRecord> = Vec::new();
        let mut offset = resume_offset;
        let mut buf: Vec<u8> = Vec::new();
        loop {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf)?;
            if n == 0 {
                break;
            }
            if !buf.ends_with(b"\n") {
                // Partial trailing line, most likely a write in progress.
                // The cursor stops before it so the completed line is picked
                // up on the next pass.
                break;
            }

            hasher.update(&buf);
            offset += n as u64;
            report.lines_read += 1;

            let line = String::from_utf8_lossy(&buf);
            match parse_line(&line) {
                ParseOutcome::Accepted(draft) => {
                    events.push(EventRecord {
                        session_id: session_id.clone(),
                        seq: next_seq,
                        ts: draft.ts,
                        role: draft.role,
                        content: draft.content,
                        opaque: draft.opaque,
                    });
                    next_seq += 1;
                }
                ParseOutcome::Skipped(_) => {
                    report.lines_skipped += 1;
                }
            }
        }

        let cursor = SessionCursor {
            session_id: session_id.clone(),
            path: file.path.display().to_string(),
            file_size: file.size as i64,
            mtime_epoch: file.mtime_epoch,
            last_offset: offset as i64,
            last_fingerprint: Some(format!("{:x}", hasher.finalize())),
            last_seen_at: Some(now_rfc3339()),
        };

        let ingested = events.len();
        self.db.commit_session_ingest(&cursor, &events, reset)?;
        report.events_ingested += ingested;

        on_progress(SyncProgress::SessionIngested {
            path: file.path.clone(),
            events: ingested,
            reset,
        });

        Ok(())
    }
}

fn open_source(path: &Path) -> Result<File> {
    File::open(path).map_err(|err| Error::Source(format!("{}: {}", path.display(), err)))
}

/// Hash the first `offset` bytes of a file, returning the hex digest and the
/// hasher itself so ingestion can keep extending it past the prefix.
fn hash_prefix(path: &Path, offset: u64) -> std::io::Result<(String, Sha256)> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut chunk = [0u8; 64 * 1024];
    let mut remaining = offset;

    while remaining > 0 {
        let want = chunk.len().min(remaining as usize);
        let n = file.read(&mut chunk[..want])?;
        if n == 0 {
            break;
        }
        hasher.update(&chunk[..n]);
        remaining -= n as u64;
    }

    let hex = format!("{:x}", hasher.clone().finalize());
    Ok((hex, hasher))
}
