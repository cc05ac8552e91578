use crate::traits::ResultSink;
use crate::{LogLine, ScanError};
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only run log, reopened for every line so a crash never loses
/// what was already found.
#[derive(Debug, Clone)]
pub struct LogFile {
    path: PathBuf,
}

impl LogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `conkeyscan_results_<YYYY_MM_DD_HH_MM>.log` inside `directory`.
    pub fn for_run(directory: &Path, started_at: DateTime<Local>) -> Self {
        Self::new(directory.join(run_log_name(started_at)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn run_log_name(started_at: DateTime<Local>) -> String {
    format!(
        "conkeyscan_results_{}.log",
        started_at.format("%Y_%m_%d_%H_%M")
    )
}

impl ResultSink for LogFile {
    fn record(&self, line: &LogLine) -> Result<(), ScanError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::tempdir;

    fn line(snippet: &str) -> LogLine {
        LogLine {
            keyword: "secret".to_string(),
            url: "https://wiki/x".to_string(),
            title: "Runbook".to_string(),
            snippet: snippet.to_string(),
        }
    }

    #[test]
    fn log_name_uses_run_start_minute() {
        let started = Local
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 59)
            .single()
            .expect("unambiguous local time");
        assert_eq!(run_log_name(started), "conkeyscan_results_2024_03_09_07_05.log");
    }

    #[test]
    fn lines_are_appended_one_per_call() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let sink = LogFile::new(dir.path().join("run.log"));

        sink.record(&line("first secret"))?;
        sink.record(&line("second secret"))?;

        let written = fs::read_to_string(sink.path())?;
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(written.ends_with('\n'));
        assert_eq!(
            lines[1],
            "[Keyword: secret] [URL: https://wiki/x] [Title: Runbook] [second secret]"
        );
        Ok(())
    }
}
