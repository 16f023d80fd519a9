//! Append-only CSV log of successful summarizations.
//!
//! One row per run: `timestamp,input_chars,model,output_chars,elapsed_seconds,summary`. The
//! header is written only when the file is created. Fields are quoted as RFC 4180 requires.

use std::borrow::Cow;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

const HEADER: &str = "timestamp,input_chars,model,output_chars,elapsed_seconds,summary";

/// One row of the summary log.
#[derive(Debug, Clone, Copy)]
pub struct SummaryRecord<'a> {
    /// Length of the acquired input in characters.
    pub input_chars: usize,
    /// Model that produced the summary.
    pub model: &'a str,
    /// Summary text.
    pub summary: &'a str,
    /// Time spent summarizing chunks.
    pub elapsed: Duration,
}

/// CSV summary log; writes are serialized within the process.
#[derive(Debug)]
pub struct SummaryLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SummaryLog {
    /// Log appending to `path`. Nothing is touched until the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the CSV file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, creating the file (and its header) if needed.
    pub fn append(&self, record: &SummaryRecord<'_>) -> io::Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let needs_header = fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);

        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(io::Error::other)?;
        let row = format!(
            "{},{},{},{},{:.2},{}",
            timestamp,
            record.input_chars,
            csv_field(record.model),
            record.summary.chars().count(),
            record.elapsed.as_secs_f64(),
            csv_field(record.summary),
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut buffer = String::with_capacity(HEADER.len() + row.len() + 2);
        if needs_header {
            buffer.push_str(HEADER);
            buffer.push('\n');
        }
        buffer.push_str(&row);
        buffer.push('\n');
        file.write_all(buffer.as_bytes())
    }
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record<'a>(summary: &'a str) -> SummaryRecord<'a> {
        SummaryRecord {
            input_chars: 1200,
            model: "llama3.2",
            summary,
            elapsed: Duration::from_millis(1500),
        }
    }

    #[test]
    fn header_is_written_once() {
        let dir = tempdir().unwrap();
        let log = SummaryLog::new(dir.path().join("nested/summaries.csv"));

        log.append(&record("First.")).unwrap();
        log.append(&record("Second.")).unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER);
        assert_eq!(contents.matches("timestamp,").count(), 1);
        assert!(lines[1].ends_with(",1200,llama3.2,6,1.50,First."));
        assert!(lines[2].ends_with(",Second."));
    }

    #[test]
    fn existing_file_keeps_its_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summaries.csv");
        fs::write(&path, format!("{HEADER}\n")).unwrap();

        SummaryLog::new(&path).append(&record("Row.")).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches(HEADER).count(), 1);
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn fields_are_quoted() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a, b"), "\"a, b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn timestamp_is_rfc3339() {
        let dir = tempdir().unwrap();
        let log = SummaryLog::new(dir.path().join("log.csv"));
        log.append(&record("Row.")).unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        let row = contents.lines().nth(1).unwrap();
        let timestamp = row.split(',').next().unwrap();
        assert!(OffsetDateTime::parse(timestamp, &Rfc3339).is_ok());
    }
}
