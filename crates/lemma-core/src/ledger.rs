//! Append-only event ledger.
//!
//! Events live in `<root>/ledger/events.jsonl`: a header line followed by
//! one JSON object per line. The file is the sole source of truth; sequence
//! numbers are dense, 1-based, and assigned at append.
//!
//! # Failure model
//!
//! A torn trailing record (a crash mid-write leaves a partial last line, or
//! a trailing line that is not valid JSON) is detected and ignored on scan:
//! the ledger is treated as the prefix of committed records. The writer
//! truncates the torn tail under the exclusive directory lock before
//! appending, so committed records are never overwritten. A malformed line
//! anywhere *before* the tail is real corruption and fails the scan.
//!
//! Unknown `type` discriminators are skipped with a warning so that ledgers
//! written by newer lemma versions remain readable.

use crate::error::{PersistenceError, Result};
use crate::event::{Event, EventKind, EventPayload};
use chrono::Utc;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Directory under the workspace root holding the event log.
pub const LEDGER_DIR: &str = "ledger";

/// The event log filename.
pub const LEDGER_FILE: &str = "events.jsonl";

/// Header line written at the top of every ledger file.
pub const LEDGER_HEADER: &str = "# lemma ledger v1";

/// The ledger format version understood by this build.
pub const CURRENT_VERSION: u32 = 1;

const HEADER_PREFIX: &str = "# lemma ledger v";

/// Handle to the on-disk ledger of one workspace.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

/// The committed contents of the ledger, as read by one scan.
#[derive(Debug)]
pub struct Loaded {
    /// Parsed events in seq order. Records with unknown kinds are absent.
    pub events: Vec<Event>,
    /// Number of committed records, *including* skipped unknown kinds.
    pub record_count: u64,
    /// Byte length of the committed prefix (excludes any torn tail).
    committed_len: u64,
}

impl Ledger {
    /// Handle to the ledger of `root` without touching the filesystem.
    #[must_use]
    pub fn open(root: &Path) -> Self {
        Self {
            path: root.join(LEDGER_DIR).join(LEDGER_FILE),
        }
    }

    /// Whether the ledger file exists on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// The ledger file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty ledger (directory plus header line).
    ///
    /// # Errors
    ///
    /// Fails when the file already exists or cannot be written.
    pub fn create(root: &Path) -> Result<Self> {
        let ledger = Self::open(root);
        let dir = ledger
            .path
            .parent()
            .ok_or_else(|| io_err(&ledger.path, "ledger path has no parent"))?;
        fs::create_dir_all(dir).map_err(|e| io_err(dir, &e.to_string()))?;

        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&ledger.path)
            .map_err(|e| io_err(&ledger.path, &e.to_string()))?;
        writeln!(file, "{LEDGER_HEADER}").map_err(|e| io_err(&ledger.path, &e.to_string()))?;
        file.sync_data()
            .map_err(|e| io_err(&ledger.path, &e.to_string()))?;
        Ok(ledger)
    }

    /// Read and parse the committed prefix of the ledger.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, an unsupported version header, a malformed
    /// non-trailing record, or a sequence-density violation.
    pub fn load(&self) -> Result<Loaded> {
        let mut file =
            File::open(&self.path).map_err(|e| io_err(&self.path, &e.to_string()))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| io_err(&self.path, &e.to_string()))?;
        parse_content(&content)
    }

    /// Replay committed events with `seq >= from_seq` in order, stopping on
    /// the first callback error.
    ///
    /// # Errors
    ///
    /// Propagates load failures and the first callback error.
    pub fn scan<F>(&self, from_seq: u64, mut callback: F) -> Result<()>
    where
        F: FnMut(u64, &Event) -> Result<()>,
    {
        let loaded = self.load()?;
        for event in &loaded.events {
            if event.seq >= from_seq {
                callback(event.seq, event)?;
            }
        }
        Ok(())
    }

    /// Number of committed records (including skipped unknown kinds).
    ///
    /// # Errors
    ///
    /// Propagates load failures.
    pub fn count(&self) -> Result<u64> {
        Ok(self.load()?.record_count)
    }

    /// Append one event, assigning the next sequence number.
    ///
    /// # Errors
    ///
    /// Same as [`append_all`](Self::append_all).
    pub fn append(&self, payload: EventPayload) -> Result<Event> {
        let mut events = self.append_all(vec![payload])?;
        events
            .pop()
            .ok_or_else(|| io_err(&self.path, "append produced no event").into())
    }

    /// Append a batch of events in order, assigning dense sequence numbers.
    ///
    /// All records are written and fsynced before returning; the caller must
    /// hold the exclusive directory lock so the batch is atomic with respect
    /// to other writers. Any torn tail left by a crashed writer is truncated
    /// first — committed records are never overwritten.
    ///
    /// # Errors
    ///
    /// Fails on load failures, serialization failures, or I/O errors.
    pub fn append_all(&self, payloads: Vec<EventPayload>) -> Result<Vec<Event>> {
        let loaded = self.load()?;
        let timestamp = Utc::now();

        let mut lines = String::new();
        let mut events = Vec::with_capacity(payloads.len());
        for (offset, payload) in payloads.into_iter().enumerate() {
            let event = Event {
                seq: loaded.record_count + offset as u64 + 1,
                timestamp,
                payload,
            };
            let line = serde_json::to_string(&event).map_err(|e| {
                PersistenceError::Serialize {
                    reason: e.to_string(),
                }
            })?;
            lines.push_str(&line);
            lines.push('\n');
            events.push(event);
        }

        let mut file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|e| io_err(&self.path, &e.to_string()))?;
        let file_len = file
            .metadata()
            .map_err(|e| io_err(&self.path, &e.to_string()))?
            .len();
        if file_len > loaded.committed_len {
            warn!(
                torn_bytes = file_len - loaded.committed_len,
                "truncating torn trailing record before append"
            );
            file.set_len(loaded.committed_len)
                .map_err(|e| io_err(&self.path, &e.to_string()))?;
        }
        file.seek(SeekFrom::End(0))
            .map_err(|e| io_err(&self.path, &e.to_string()))?;
        file.write_all(lines.as_bytes())
            .map_err(|e| io_err(&self.path, &e.to_string()))?;
        file.sync_data()
            .map_err(|e| io_err(&self.path, &e.to_string()))?;

        debug!(appended = events.len(), "ledger append committed");
        Ok(events)
    }
}

/// Detect the ledger format version from the header line.
///
/// # Errors
///
/// Fails when the header is missing or malformed, or the version is newer
/// than [`CURRENT_VERSION`].
pub fn detect_version(first_line: &str) -> std::result::Result<u32, PersistenceError> {
    let line = first_line.trim();
    let Some(version_str) = line.strip_prefix(HEADER_PREFIX) else {
        return Err(PersistenceError::LedgerIntegrity {
            reason: format!("invalid ledger header: expected '{HEADER_PREFIX}N', got '{line}'"),
        });
    };
    let version: u32 = version_str
        .parse()
        .map_err(|_| PersistenceError::LedgerIntegrity {
            reason: format!("invalid version number '{version_str}' in ledger header"),
        })?;
    if version > CURRENT_VERSION {
        return Err(PersistenceError::VersionMismatch {
            reason: format!(
                "ledger is v{version}, this build of lemma supports up to v{CURRENT_VERSION}"
            ),
        });
    }
    Ok(version)
}

fn parse_content(content: &str) -> Result<Loaded> {
    let mut events = Vec::new();
    let mut record_count: u64 = 0;
    let mut committed_len: u64 = 0;
    let mut saw_header = false;

    let mut rest = content;
    let mut offset: u64 = 0;
    while !rest.is_empty() {
        let (line_with_nl, line, terminated) = match rest.find('\n') {
            Some(idx) => (&rest[..=idx], &rest[..idx], true),
            None => (rest, rest, false),
        };
        let line_len = line_with_nl.len() as u64;
        let is_last = line_with_nl.len() == rest.len();
        let trimmed = line.trim_end_matches('\r');

        if !saw_header {
            detect_version(trimmed)?;
            saw_header = true;
            committed_len = offset + line_len;
        } else if trimmed.is_empty() || trimmed.starts_with('#') {
            committed_len = offset + line_len;
        } else {
            match parse_record(trimmed, record_count + 1) {
                Ok(Some(event)) => {
                    if terminated {
                        record_count += 1;
                        committed_len = offset + line_len;
                        events.push(event);
                    } else {
                        // A record without its newline never committed.
                        warn!(seq = record_count + 1, "ignoring torn trailing record");
                    }
                }
                Ok(None) => {
                    // Unknown kind: committed, counted, but not projected.
                    if terminated {
                        record_count += 1;
                        committed_len = offset + line_len;
                    } else {
                        warn!("ignoring torn trailing record of unknown kind");
                    }
                }
                Err(err) => {
                    if is_last {
                        warn!(%err, "ignoring unparseable trailing record");
                    } else {
                        return Err(err);
                    }
                }
            }
        }

        offset += line_len;
        rest = &rest[line_with_nl.len()..];
    }

    if !saw_header {
        return Err(PersistenceError::LedgerIntegrity {
            reason: "ledger file is empty (missing header)".into(),
        }
        .into());
    }

    Ok(Loaded {
        events,
        record_count,
        committed_len,
    })
}

/// Parse one data line. `Ok(None)` means a committed record of an unknown
/// kind (skipped for forward compatibility).
fn parse_record(line: &str, expected_seq: u64) -> Result<Option<Event>> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|e| PersistenceError::LedgerIntegrity {
            reason: format!("record {expected_seq} is not valid JSON: {e}"),
        })?;

    let seq = value
        .get("seq")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| PersistenceError::LedgerIntegrity {
            reason: format!("record {expected_seq} is missing a numeric 'seq'"),
        })?;
    if seq != expected_seq {
        return Err(PersistenceError::LedgerIntegrity {
            reason: format!("sequence gap: expected seq {expected_seq}, found {seq}"),
        }
        .into());
    }

    let kind_str = value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| PersistenceError::LedgerIntegrity {
            reason: format!("record {seq} is missing a 'type' discriminator"),
        })?
        .to_string();

    if EventKind::from_str(&kind_str).is_err() {
        warn!(seq, kind = kind_str, "skipping record of unknown event kind");
        return Ok(None);
    }

    let event: Event =
        serde_json::from_value(value).map_err(|e| PersistenceError::LedgerIntegrity {
            reason: format!("record {seq} does not match the {kind_str} schema: {e}"),
        })?;
    Ok(Some(event))
}

fn io_err(path: &Path, reason: &str) -> PersistenceError {
    PersistenceError::Io {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
