//! Action logging for Cohort commands.
//!
//! Every command invocation is appended to `action.log` in the data
//! directory as one JSON line: command, arguments, outcome, duration,
//! and user. Logging must never break a command, so all failures here
//! degrade to a stderr warning at worst.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// File name of the audit log inside the data directory.
pub const LOG_FILE: &str = "action.log";

/// One logged command invocation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionLog {
    /// ISO 8601 timestamp when the action occurred
    pub timestamp: DateTime<Utc>,

    /// Command name (e.g., "study add", "import")
    pub command: String,

    /// Command arguments as JSON
    pub args: serde_json::Value,

    /// Whether the command succeeded
    pub success: bool,

    /// Error message if the command failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Command execution duration in milliseconds
    pub duration_ms: u64,

    /// User who executed the command
    pub user: String,
}

/// Append an entry to the action log. Never fails; disabled entirely
/// when `COHORT_ACTION_LOG=0`.
pub fn log_action(
    data_dir: &Path,
    command: &str,
    args: serde_json::Value,
    success: bool,
    error: Option<String>,
    duration_ms: u64,
) {
    if std::env::var("COHORT_ACTION_LOG").as_deref() == Ok("0") {
        return;
    }
    if !data_dir.exists() {
        // Nothing initialized yet; nowhere to log
        return;
    }

    let entry = ActionLog {
        timestamp: Utc::now(),
        command: command.to_string(),
        args,
        success,
        error,
        duration_ms,
        user: get_current_user(),
    };

    if let Err(e) = write_log_entry(&log_path(data_dir), &entry) {
        eprintln!("Warning: Failed to write action log: {}", e);
    }
}

/// Read the most recent `limit` entries, oldest first. Unparseable
/// lines are skipped.
pub fn read_recent(data_dir: &Path, limit: usize) -> crate::Result<Vec<ActionLog>> {
    let path = log_path(data_dir);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = std::fs::File::open(path)?;
    let entries: Vec<ActionLog> = BufReader::new(file)
        .lines()
        .map_while(|line| line.ok())
        .filter_map(|line| serde_json::from_str(&line).ok())
        .collect();
    let skip = entries.len().saturating_sub(limit);
    Ok(entries.into_iter().skip(skip).collect())
}

fn log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_FILE)
}

fn write_log_entry(path: &Path, entry: &ActionLog) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let line = serde_json::to_string(entry)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

fn get_current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
