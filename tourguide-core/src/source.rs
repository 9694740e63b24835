use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// The region's reference cities, served under `/c`
const BUILTIN_CITIES: &str = include_str!("../data/cities.json");

/// Something that can hand out a full snapshot of a data path
///
/// Each call returns the whole document at `path`; callers replace what they
/// hold rather than merging.
pub trait CollectionSource: Send + Sync {
    /// Short human-readable label for logs
    fn name(&self) -> String;

    /// Fetch the current snapshot at `path` (e.g. "/c" or "/c/Salem")
    /// A path with no data yields `Value::Null`.
    fn fetch(&self, path: &str) -> Result<Value>;
}

/// Reads snapshots over the realtime database's REST interface
pub struct RealtimeDbSource {
    database_url: String,
    auth_token: Option<String>,
    client: reqwest::blocking::Client,
}

impl RealtimeDbSource {
    pub fn new(database_url: &str, auth_token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(crate::user_agent())
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            database_url: database_url.trim_end_matches('/').to_string(),
            auth_token,
            client,
        })
    }
}

impl CollectionSource for RealtimeDbSource {
    fn name(&self) -> String {
        self.database_url.clone()
    }

    fn fetch(&self, path: &str) -> Result<Value> {
        let url = rest_url(&self.database_url, path, self.auth_token.as_deref())?;
        log::debug!("Fetching snapshot {} from {}", path, self.database_url);

        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to fetch {}", path))?;

        if !response.status().is_success() {
            anyhow::bail!("Database returned status {} for {}", response.status(), path);
        }

        response
            .json()
            .with_context(|| format!("Failed to parse snapshot for {}", path))
    }
}

/// Serves snapshots out of one JSON document on disk
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CollectionSource for JsonFileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self, path: &str) -> Result<Value> {
        // Re-read on every fetch so edits to the file show up as fresh snapshots
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let doc: Value = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;

        Ok(resolve_path(&doc, path).cloned().unwrap_or(Value::Null))
    }
}

/// The embedded city dataset, for offline use
pub struct BuiltinSource {
    doc: Value,
}

impl BuiltinSource {
    pub fn new() -> Result<Self> {
        let doc = serde_json::from_str(BUILTIN_CITIES).context("Built-in city data is corrupt")?;
        Ok(Self { doc })
    }
}

impl CollectionSource for BuiltinSource {
    fn name(&self) -> String {
        "built-in".to_string()
    }

    fn fetch(&self, path: &str) -> Result<Value> {
        Ok(resolve_path(&self.doc, path).cloned().unwrap_or(Value::Null))
    }
}

/// Builds `<base>/<path>.json[?auth=<token>]` with the token percent-encoded
pub(crate) fn rest_url(base: &str, path: &str, auth_token: Option<&str>) -> Result<reqwest::Url> {
    let path = path.trim_matches('/');
    let raw = if path.is_empty() {
        format!("{}/.json", base)
    } else {
        format!("{}/{}.json", base, path)
    };

    let mut url =
        reqwest::Url::parse(&raw).with_context(|| format!("Invalid database URL: {}", raw))?;
    if let Some(token) = auth_token {
        url.query_pairs_mut().append_pair("auth", token);
    }
    Ok(url)
}

/// Walks "/a/b/c" down a JSON document
fn resolve_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .try_fold(doc, |node, segment| node.get(segment))
}
