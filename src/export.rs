//! CSV export of the user list.
//!
//! Every cell is the JSON encoding of the field, so strings come out quoted
//! and escaped while numbers and booleans stay bare. Absent values are empty.

use crate::user::UserRecord;
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const CSV_HEADER: [&str; 6] = ["id", "name", "email", "role", "status", "last Login"];
pub const DEFAULT_EXPORT_NAME: &str = "User Data";

fn cell<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Null) | Err(_) => String::new(),
        Ok(v) => v.to_string(),
    }
}

fn row(user: &UserRecord) -> String {
    let last_login = user
        .last_login
        .map(|ts| ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string());
    [
        cell(&user.id),
        cell(user.name.as_str()),
        cell(user.email.as_str()),
        cell(user.role.as_str()),
        cell(&user.status),
        cell(&last_login),
    ]
    .join(",")
}

/// Render the records as CSV text, rows separated by CRLF
pub fn to_csv(users: &[UserRecord]) -> String {
    std::iter::once(CSV_HEADER.join(","))
        .chain(users.iter().map(row))
        .collect::<Vec<_>>()
        .join("\r\n")
}

/// Write the CSV into `dir/file_name` and return the path written
pub fn write_export(users: &[UserRecord], dir: &Path, file_name: &str) -> Result<PathBuf> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }
    let path = dir.join(file_name);
    std::fs::write(&path, to_csv(users))?;
    Ok(path)
}
