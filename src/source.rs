use crate::store::UserStore;
use crate::user::{RawUser, UserRecord};
use chrono::{DateTime, Utc};
use std::time::Duration;

pub const DEFAULT_SOURCE_URL: &str = "https://63d8edcf74f386d4efe0de4b.mockapi.io/api/users/users";

/// Why a bulk load did not produce records
#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    Network(String),
    Status { code: u16, body: String },
    Payload(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Network(msg) => write!(f, "request failed: {}", msg),
            LoadError::Status { code, body } => write!(f, "server returned {}: {}", code, body),
            LoadError::Payload(msg) => write!(f, "malformed payload: {}", msg),
        }
    }
}

impl std::error::Error for LoadError {}

/// Outcome of the most recent bulk load, shown to the operator
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded { count: usize, at: DateTime<Utc> },
    /// The store still holds whatever it had before the failed attempt
    Failed { error: LoadError, at: DateTime<Utc> },
}

impl LoadState {
    pub fn is_stale(&self) -> bool {
        matches!(self, LoadState::Failed { .. })
    }

    pub fn describe(&self) -> String {
        match self {
            LoadState::Idle => "not loaded".to_string(),
            LoadState::Loading => "loading...".to_string(),
            LoadState::Loaded { count, at } => {
                format!("loaded {} users at {}", count, at.format("%H:%M:%S"))
            }
            LoadState::Failed { error, at } => format!(
                "load failed at {} ({}); showing stale data",
                at.format("%H:%M:%S"),
                error
            ),
        }
    }
}

/// Trait for user sources to allow stubbing in tests
pub trait UserSource {
    fn fetch(&self) -> Result<Vec<UserRecord>, LoadError>;

    /// Where the records come from, for logs
    fn describe(&self) -> String;
}

/// Fetches the full user list with a single GET
pub struct HttpSource {
    url: String,
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new(url: &str, timeout_ms: u64) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(timeout_ms))
            .build();
        Self {
            url: url.to_string(),
            agent,
        }
    }
}

impl UserSource for HttpSource {
    fn fetch(&self) -> Result<Vec<UserRecord>, LoadError> {
        let resp = self
            .agent
            .get(&self.url)
            .set("Accept", "application/json")
            .call();

        match resp {
            Ok(r) => {
                let body = r
                    .into_string()
                    .map_err(|e| LoadError::Network(e.to_string()))?;
                parse_users(&body)
            }
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(LoadError::Status { code, body })
            }
            Err(e) => Err(LoadError::Network(e.to_string())),
        }
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Parse a JSON array of users, typing every record at the boundary
pub fn parse_users(body: &str) -> Result<Vec<UserRecord>, LoadError> {
    let raw: Vec<RawUser> = serde_json::from_str(body)
        .map_err(|e| LoadError::Payload(e.to_string()))?;
    raw.into_iter()
        .map(|r| UserRecord::try_from(r).map_err(LoadError::Payload))
        .collect()
}

/// Run one bulk load. On success the store is replaced; on failure it is
/// left untouched and the state records the error.
pub fn load_into(
    store: &mut UserStore,
    source: &dyn UserSource,
    state: &mut LoadState,
) -> Result<usize, LoadError> {
    *state = LoadState::Loading;
    match source.fetch() {
        Ok(records) => {
            let count = records.len();
            store.load(records);
            *state = LoadState::Loaded {
                count,
                at: Utc::now(),
            };
            Ok(count)
        }
        Err(error) => {
            *state = LoadState::Failed {
                error: error.clone(),
                at: Utc::now(),
            };
            Err(error)
        }
    }
}
