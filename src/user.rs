//! User record model and conversion from the remote wire format.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Avatar given to users created locally until an image is picked
pub const DEFAULT_AVATAR: &str =
    "https://cdn.pixabay.com/photo/2015/10/05/22/37/blank-profile-picture-973460_960_720.png";

/// One administered user account
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: String,
    /// true = active, false = invited/inactive
    pub status: bool,
    /// Plain URL or `data:` URI
    pub avatar: String,
    pub last_login: Option<DateTime<Utc>>,
}

/// Field values for a user created from the add form
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: bool,
    pub avatar: Option<String>,
}

impl NewUser {
    /// Build the record, stamping `last_login` with the creation time
    pub fn into_record(self, id: u64, now: DateTime<Utc>) -> UserRecord {
        UserRecord {
            id,
            name: self.name,
            email: self.email,
            role: self.role,
            status: self.status,
            avatar: self.avatar.unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
            last_login: Some(now),
        }
    }
}

/// Editable fields of a user. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub status: Option<bool>,
    pub avatar: Option<String>,
}

impl UserPatch {
    /// Patch that overwrites every editable field, as the edit form does
    #[cfg(test)]
    pub fn full(name: &str, email: &str, role: &str, status: bool, avatar: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            role: Some(role.to_string()),
            status: Some(status),
            avatar: Some(avatar.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to a record. `id` and `last_login` are never touched.
    pub fn apply(&self, user: &mut UserRecord) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(role) = &self.role {
            user.role = role.clone();
        }
        if let Some(status) = self.status {
            user.status = status;
        }
        if let Some(avatar) = &self.avatar {
            user.avatar = avatar.clone();
        }
    }
}

/// Parse a status word from the command line
pub fn parse_status(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "active" | "true" | "yes" => Some(true),
        "inactive" | "invited" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// A user object as served by the remote endpoint, before typing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUser {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<bool>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub last_login: Value,
}

impl TryFrom<RawUser> for UserRecord {
    type Error = String;

    fn try_from(raw: RawUser) -> Result<Self, Self::Error> {
        let id = parse_id(&raw.id)?;
        let last_login =
            parse_timestamp(&raw.last_login).map_err(|e| format!("user {}: {}", id, e))?;
        Ok(UserRecord {
            id,
            name: raw.name.unwrap_or_default(),
            email: raw.email.unwrap_or_default(),
            role: raw.role.unwrap_or_default(),
            status: raw.status.unwrap_or(false),
            avatar: raw.avatar.unwrap_or_default(),
            last_login,
        })
    }
}

fn parse_id(value: &Value) -> Result<u64, String> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| format!("invalid id {}", n)),
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("invalid id '{}'", s)),
        Value::Null => Err("missing id".to_string()),
        other => Err(format!("invalid id {}", other)),
    }
}

// Epoch values above this are taken as milliseconds
const MILLIS_THRESHOLD: u64 = 100_000_000_000;

// Float epoch to i64, rejecting NaN, infinities and anything outside i64
fn float_epoch(f: f64) -> Option<i64> {
    // i64::MIN and 2^63 are both exact in f64
    if f.is_finite() && f >= i64::MIN as f64 && f < -(i64::MIN as f64) {
        Some(f as i64)
    } else {
        None
    }
}

/// Convert a loosely typed `lastLogin` value into a timestamp
pub fn parse_timestamp(value: &Value) -> Result<Option<DateTime<Utc>>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| format!("invalid lastLogin '{}': {}", s, e)),
        Value::Number(n) => {
            let raw = n
                .as_i64()
                .or_else(|| n.as_f64().and_then(float_epoch))
                .ok_or_else(|| format!("lastLogin out of range: {}", n))?;
            let parsed = if raw.unsigned_abs() > MILLIS_THRESHOLD {
                Utc.timestamp_millis_opt(raw).single()
            } else {
                Utc.timestamp_opt(raw, 0).single()
            };
            parsed
                .map(Some)
                .ok_or_else(|| format!("lastLogin out of range: {}", raw))
        }
        other => Err(format!("invalid lastLogin {}", other)),
    }
}
