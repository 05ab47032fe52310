use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only JSONL log of what happened to the store in one session
pub struct Journal {
    pub path: PathBuf,
    session_id: String,
    file: File,
}

#[derive(Serialize)]
struct Event<'a> {
    ts: DateTime<Utc>,
    session_id: &'a str,
    #[serde(rename = "type")]
    event_type: &'a str,
    #[serde(flatten)]
    data: serde_json::Value,
}

impl Journal {
    pub fn new(path: &Path, session_id: &str) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            session_id: session_id.to_string(),
            file,
        })
    }

    pub fn log(&mut self, event_type: &str, data: serde_json::Value) -> Result<()> {
        let event = Event {
            ts: Utc::now(),
            session_id: &self.session_id,
            event_type,
            data,
        };
        let line = serde_json::to_string(&event)?;
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        Ok(())
    }

    pub fn load_ok(&mut self, source: &str, count: usize) -> Result<()> {
        self.log(
            "load_ok",
            serde_json::json!({ "url": source, "count": count }),
        )
    }

    pub fn load_failed(&mut self, source: &str, error: &str) -> Result<()> {
        self.log(
            "load_failed",
            serde_json::json!({ "url": source, "error": error }),
        )
    }

    pub fn user_added(&mut self, id: u64) -> Result<()> {
        self.log("user_added", serde_json::json!({ "id": id }))
    }

    pub fn user_updated(&mut self, id: u64, matched: bool) -> Result<()> {
        self.log(
            "user_updated",
            serde_json::json!({ "id": id, "matched": matched }),
        )
    }

    pub fn user_removed(&mut self, id: u64, removed: usize) -> Result<()> {
        self.log(
            "user_removed",
            serde_json::json!({ "id": id, "removed": removed }),
        )
    }

    /// Log a CSV export
    pub fn export(&mut self, path: &Path, rows: usize) -> Result<()> {
        self.log(
            "export",
            serde_json::json!({ "path": path, "rows": rows }),
        )
    }
}
