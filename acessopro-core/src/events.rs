//! Hash-chained append-only event log
//!
//! Every domain mutation appends one CSV line to `eventos.csv` and advances
//! the chain state in `eventos.chain` (`count=<n>` / `last=<hex|GENESIS>`).
//! Each hash covers the previous hash plus the new line, so any retroactive
//! edit of the log is detectable by [`verify`]. The log rotates wholesale at
//! a size threshold; rotation is best-effort and never loses the new event.

use crate::csv::encode_field;
use crate::model::{now_utc_stamp, EventRecord};
use crate::{Result, StoreError};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const EVENTS_FILE: &str = "eventos.csv";
pub const CHAIN_FILE: &str = "eventos.chain";
const EVENTS_HEADER: &str = "TimestampUtc,Action,EntityType,EntityName,Details";

/// Sentinel hash value of an empty chain.
const GENESIS: &str = "GENESIS";

/// Rotation threshold: 5 MiB.
const MAX_EVENTS_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// Cumulative summary of the hash chain, persisted separately from the log
/// so the append path never rescans the whole file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainState {
    pub count: u64,
    pub last_hash: String,
}

/// Outcome of an integrity check over an event log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Stored chain state matches the replayed log exactly.
    Ok,
    /// No chain-state file next to the log.
    MissingChainState,
    /// Count or hash diverges: a line was edited, added or removed out-of-band.
    Mismatch {
        stored: ChainState,
        computed: ChainState,
    },
    /// Chain state is malformed or the log cannot be read.
    Error(String),
}

pub struct EventLogger {
    dir: PathBuf,
    log_path: PathBuf,
    chain_path: PathBuf,
    max_file_bytes: u64,
}

impl EventLogger {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self::with_rotation_threshold(dir, MAX_EVENTS_FILE_BYTES)
    }

    /// Same as [`EventLogger::new`] with an explicit rotation threshold.
    pub fn with_rotation_threshold<P: AsRef<Path>>(dir: P, max_file_bytes: u64) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let log_path = dir.join(EVENTS_FILE);
        let chain_path = dir.join(CHAIN_FILE);
        Self {
            dir,
            log_path,
            chain_path,
            max_file_bytes,
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Append one audit event and advance the chain state.
    pub fn log(
        &self,
        action: &str,
        entity_type: &str,
        entity_name: &str,
        details: &str,
    ) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        self.ensure_file()?;
        self.rotate_if_needed();
        self.ensure_file()?;

        let record = EventRecord {
            timestamp_utc: now_utc_stamp(),
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_name: entity_name.to_string(),
            details: details.to_string(),
        };
        let line = format!(
            "{},{},{},{},{}",
            encode_field(&record.timestamp_utc),
            encode_field(&record.action),
            encode_field(&record.entity_type),
            encode_field(&record.entity_name),
            encode_field(&record.details),
        );

        let mut file = OpenOptions::new().append(true).open(&self.log_path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;

        self.update_chain(&line)
    }

    fn ensure_file(&self) -> Result<()> {
        if !self.log_path.exists() {
            fs::write(&self.log_path, format!("{EVENTS_HEADER}\n"))?;
        }
        Ok(())
    }

    /// Rename the current log and chain to a timestamped pair once the size
    /// threshold is reached. If the rename fails we keep appending to the
    /// original file rather than losing events.
    fn rotate_if_needed(&self) {
        let size = match fs::metadata(&self.log_path) {
            Ok(meta) => meta.len(),
            Err(_) => return,
        };
        if size < self.max_file_bytes {
            return;
        }

        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let rotated_log = self.dir.join(format!("eventos_{stamp}.csv"));
        let rotated_chain = rotated_log.with_extension("chain");

        if rotated_log.exists() {
            let _ = fs::remove_file(&rotated_log);
        }
        if let Err(e) = fs::rename(&self.log_path, &rotated_log) {
            warn!("event log rotation failed, keeping current file: {e}");
            return;
        }
        if self.chain_path.exists() {
            if let Err(e) = fs::rename(&self.chain_path, &rotated_chain) {
                warn!("chain state rotation failed: {e}");
            }
        }
        debug!("rotated event log to {}", rotated_log.display());
    }

    /// Advance chain state for the line just appended. When the state is
    /// missing or malformed (e.g. after a crash), rebuild it by replaying
    /// the whole log from GENESIS.
    fn update_chain(&self, line: &str) -> Result<()> {
        let next = match read_chain_state(&self.chain_path) {
            Ok(Some(state)) => ChainState {
                count: state.count + 1,
                last_hash: chain_next(&state.last_hash, line),
            },
            Ok(None) | Err(_) => {
                let content = fs::read_to_string(&self.log_path)?;
                fold_chain(&content)
            }
        };
        write_chain_state(&self.chain_path, &next)
    }
}

fn chain_next(last_hash: &str, line: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(last_hash.as_bytes());
    hasher.update(b"\n");
    hasher.update(line.as_bytes());
    hex::encode(hasher.finalize())
}

/// Replay the chain over a log body: skip the header, fold every non-blank
/// line starting from GENESIS. Shared by the logger's rebuild path and the
/// verifier, so both always agree on the fold.
fn fold_chain(content: &str) -> ChainState {
    let mut count = 0u64;
    let mut last_hash = GENESIS.to_string();
    for line in content.lines().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        last_hash = chain_next(&last_hash, line);
        count += 1;
    }
    ChainState { count, last_hash }
}

/// Read chain state: `Ok(None)` when the file does not exist, `Err` when it
/// exists but cannot be parsed.
fn read_chain_state(path: &Path) -> Result<Option<ChainState>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let mut count = None;
    let mut last_hash = None;
    for line in content.lines() {
        if let Some(v) = line.strip_prefix("count=") {
            count = v.trim().parse::<u64>().ok();
        } else if let Some(v) = line.strip_prefix("last=") {
            last_hash = Some(v.trim().to_string());
        }
    }
    match (count, last_hash) {
        (Some(count), Some(last_hash)) if !last_hash.is_empty() => {
            Ok(Some(ChainState { count, last_hash }))
        }
        _ => Err(StoreError::InvalidInput(format!(
            "malformed chain state file: {}",
            path.display()
        ))),
    }
}

fn write_chain_state(path: &Path, state: &ChainState) -> Result<()> {
    fs::write(
        path,
        format!("count={}\nlast={}\n", state.count, state.last_hash),
    )?;
    Ok(())
}

/// Recompute the hash chain of `log_path` and compare it to the stored
/// chain state. Detection only: no attempt to localize or repair.
pub fn verify(log_path: &Path) -> VerifyOutcome {
    let chain_path = log_path.with_extension("chain");
    let stored = match read_chain_state(&chain_path) {
        Ok(Some(state)) => state,
        Ok(None) => return VerifyOutcome::MissingChainState,
        Err(e) => return VerifyOutcome::Error(e.to_string()),
    };
    let content = match fs::read_to_string(log_path) {
        Ok(content) => content,
        Err(e) => return VerifyOutcome::Error(format!("cannot read event log: {e}")),
    };
    let computed = fold_chain(&content);
    if computed == stored {
        VerifyOutcome::Ok
    } else {
        VerifyOutcome::Mismatch { stored, computed }
    }
}
