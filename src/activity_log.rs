use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use chrono::Local;
use tracing::error;

/// Timestamp format used for activity-log lines and emergency dates.
pub const TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// Append-only activity log recording authentications, commands and
/// generator events.
///
/// One instance is shared by every writer in the process; the internal lock
/// keeps concurrently produced lines whole. The file is truncated at
/// startup, matching a fresh log per server run.
pub struct ActivityLog {
    file: Mutex<File>,
}

impl ActivityLog {
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Append one activity line: `<timestamp>, <activity>[, <token>]`.
    ///
    /// A write failure is reported on the tracing side rather than
    /// propagated; losing a log line never degrades request handling.
    pub fn record(&self, activity: &str, token: Option<&str>) {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        let line = match token {
            Some(token) => format!("{timestamp}, {activity}, {token}"),
            None => format!("{timestamp}, {activity}"),
        };

        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(file, "{line}") {
            error!("failed to write activity log line: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_lines_with_and_without_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refuge.log");

        let log = ActivityLog::create(&path).unwrap();
        log.record("New authorized client", Some("amelia"));
        log.record("Server failure", None);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(", New authorized client, amelia"));
        assert!(lines[1].ends_with(", Server failure"));
    }

    #[test]
    fn create_truncates_a_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refuge.log");
        std::fs::write(&path, "stale line\n").unwrap();

        let _log = ActivityLog::create(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
