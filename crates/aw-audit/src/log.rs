// log.rs — Append-only JSONL decision log.
//
// One JSON object per line, append-friendly, greppable with standard
// tools. Each record carries the SHA-256 of the previous raw line, so
// inserting, deleting, or editing any record breaks the chain and
// `verify_chain` catches it.
//
// The writer sits behind a Mutex: `append` takes `&self` so the log can
// be shared with the engine as a sink, and each record is written and
// flushed atomically with respect to other writers. Cross-writer total
// ordering is whatever the lock hands out — that is all adjudication
// needs from an advisory log.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use aw_policy::{Action, Decision, DecisionSink, SinkError};

use crate::error::AuditError;
use crate::hasher;
use crate::record::DecisionRecord;

struct LogInner {
    writer: BufWriter<File>,
    /// Hash of the last line written — the next record's chain link.
    last_hash: Option<String>,
}

/// An append-only decision log backed by a JSONL file.
pub struct DecisionLog {
    inner: Mutex<LogInner>,
    path: PathBuf,
}

impl DecisionLog {
    /// Open (or create) a decision log at the given path.
    ///
    /// If the file already exists, the chain tail is recovered from the
    /// last line so new records link correctly across reopens.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();

        let last_hash = if path.exists() {
            Self::read_last_hash(&path)?
        } else {
            None
        };

        // Append mode: existing records are never overwritten.
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditError::OpenFailed {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(
            path = %path.display(),
            chained = last_hash.is_some(),
            "decision log opened"
        );

        Ok(Self {
            inner: Mutex::new(LogInner {
                writer: BufWriter::new(file),
                last_hash,
            }),
            path,
        })
    }

    /// Append one decision record, chained to the previous one, and
    /// flush it to the OS.
    pub fn append(&self, decision: &Decision, action: &Action) -> Result<(), AuditError> {
        let mut record = DecisionRecord::new(decision, action);

        // A poisoned lock only means another writer panicked mid-append;
        // the chain state it left behind is still usable.
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        record.previous_hash = inner.last_hash.clone();
        let json = serde_json::to_string(&record)?;
        inner.last_hash = Some(hasher::hash_str(&json));

        writeln!(inner.writer, "{}", json)?;
        inner.writer.flush()?;
        Ok(())
    }

    /// Read all records from a log file, oldest first. Blank lines are
    /// skipped.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<DecisionRecord>, AuditError> {
        let file = File::open(path.as_ref()).map_err(|source| AuditError::OpenFailed {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }

        Ok(records)
    }

    /// Verify the hash chain of a log file.
    ///
    /// Returns `Ok(true)` when intact; an `IntegrityViolation` pinpoints
    /// the first broken link otherwise.
    pub fn verify_chain(path: impl AsRef<Path>) -> Result<bool, AuditError> {
        let file = File::open(path.as_ref()).map_err(|source| AuditError::OpenFailed {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        let mut previous_hash: Option<String> = None;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let record: DecisionRecord = serde_json::from_str(&line)?;
            if record.previous_hash != previous_hash {
                return Err(AuditError::IntegrityViolation {
                    line: line_num + 1,
                    expected: previous_hash.unwrap_or_else(|| "None".to_string()),
                    actual: record.previous_hash.unwrap_or_else(|| "None".to_string()),
                });
            }

            // Hash the raw line, not a re-serialization — field order in
            // the file is authoritative.
            previous_hash = Some(hasher::hash_str(&line));
        }

        Ok(true)
    }

    /// The path this log writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_last_hash(path: &Path) -> Result<Option<String>, AuditError> {
        let file = File::open(path).map_err(|source| AuditError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        let mut last_line: Option<String> = None;

        for line in reader.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                last_line = Some(line);
            }
        }

        Ok(last_line.map(|line| hasher::hash_str(&line)))
    }
}

impl DecisionSink for DecisionLog {
    fn record(&self, decision: &Decision, action: &Action) -> Result<(), SinkError> {
        self.append(decision, action).map_err(Into::into)
    }
}
