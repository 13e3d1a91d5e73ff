use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::error::{ClientError, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/";

/// Key the token is persisted under in the storage file.
pub const TOKEN_KEY: &str = "token";

const API_URL_VAR: &str = "CHATBOT_API_URL";
const TIMEOUT_VAR: &str = "CHATBOT_TIMEOUT_SECS";
const TOKEN_VAR: &str = "CHATBOT_TOKEN";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    /// No timeout unless one is configured.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout: None,
        })
    }

    /// Read the client configuration from the environment (and `.env`, once
    /// `dotenv` has run).
    pub fn from_env() -> Result<Self> {
        let base = env::var(API_URL_VAR).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let mut config = Self::new(&base)?;

        if let Ok(raw) = env::var(TIMEOUT_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Some(Duration::from_secs(secs)),
                _ => warn!("Ignoring invalid {}={:?}", TIMEOUT_VAR, raw),
            }
        }

        debug!("Using backend at {}", config.base_url);
        Ok(config)
    }
}

/// Endpoints are joined onto the base, so it must end with a slash or the
/// last path segment would be replaced.
fn parse_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.ends_with('/') {
        Ok(Url::parse(raw)?)
    } else {
        Ok(Url::parse(&format!("{}/", raw))?)
    }
}

/// Credentials attached to every backend call.
#[derive(Clone)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `CHATBOT_TOKEN` wins over whatever is persisted in `store`.
    pub fn resolve(store: &TokenStore) -> Result<Self> {
        if let Ok(token) = env::var(TOKEN_VAR) {
            if !token.trim().is_empty() {
                return Ok(Self(token.trim().to_string()));
            }
        }
        store.load()?.map(Self).ok_or(ClientError::MissingToken)
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(..)")
    }
}

/// Small JSON key/value file that persists the auth token between runs.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config_dir>/chatbot/storage.json`, falling back to the working
    /// directory when the platform has no config dir.
    pub fn default_location() -> Self {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::with_path(base.join("chatbot").join("storage.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<String>> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(TOKEN_KEY)
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string))
    }

    pub fn save(&self, token: &str) -> Result<()> {
        let mut entries = self.read_entries()?;
        entries.insert(TOKEN_KEY.to_string(), Value::String(token.trim().to_string()));

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&Value::Object(entries))?)?;
        debug!("Saved auth token to {}", self.path.display());
        Ok(())
    }

    fn read_entries(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => {
                warn!("{} is not a JSON object, ignoring it", self.path.display());
                Ok(Map::new())
            }
        }
    }
}
