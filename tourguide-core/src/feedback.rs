use crate::error::FeedbackError;
use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// Longest message accepted, in characters
pub const MAX_MESSAGE_CHARS: usize = 2000;

lazy_static::lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// A visitor's feedback record, as stored under `/feedback`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub name: String,
    pub email: String,
    pub message: String,
    /// RFC 3339 UTC timestamp taken when the record was created
    pub timestamp: String,
}

impl Feedback {
    /// Validate and timestamp a submission
    pub fn new(name: &str, email: &str, message: &str) -> Result<Self, FeedbackError> {
        let name = name.trim();
        let email = email.trim();
        let message = message.trim();

        if name.is_empty() {
            return Err(FeedbackError::EmptyField("name"));
        }
        if email.is_empty() {
            return Err(FeedbackError::EmptyField("email"));
        }
        if message.is_empty() {
            return Err(FeedbackError::EmptyField("message"));
        }
        if !EMAIL_RE.is_match(email) {
            return Err(FeedbackError::InvalidEmail(email.to_string()));
        }

        let length = message.chars().count();
        if length > MAX_MESSAGE_CHARS {
            return Err(FeedbackError::MessageTooLong(length, MAX_MESSAGE_CHARS));
        }

        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }
}

/// Somewhere feedback can be pushed to
pub trait FeedbackSink {
    /// Store the record and return the key it was stored under
    fn submit(&self, feedback: &Feedback) -> Result<String>;
}

/// Pushes feedback to the realtime database's `/feedback` list
pub struct RealtimeDbFeedbackSink {
    database_url: String,
    auth_token: Option<String>,
    client: reqwest::blocking::Client,
}

/// Body of a successful push: `{"name": "<generated key>"}`
#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

impl RealtimeDbFeedbackSink {
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

impl FeedbackSink for RealtimeDbFeedbackSink {
    fn submit(&self, feedback: &Feedback) -> Result<String> {
        let url = crate::source::rest_url(&self.database_url, "/feedback", self.auth_token.as_deref())?;

        let response = self
            .client
            .post(url)
            .json(feedback)
            .send()
            .context("Failed to submit feedback")?;

        if !response.status().is_success() {
            anyhow::bail!("Database rejected feedback with status {}", response.status());
        }

        let pushed: PushResponse = response
            .json()
            .context("Failed to parse feedback submission response")?;

        log::info!("Feedback stored as {}", pushed.name);
        Ok(pushed.name)
    }
}

/// Appends feedback as JSON lines to a local file
pub struct JsonLinesFeedbackSink {
    path: PathBuf,
}

impl JsonLinesFeedbackSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read back every stored record
    pub fn load(&self) -> Result<Vec<Feedback>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;

        data.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).context("Corrupt feedback record"))
            .collect()
    }

    /// Number of stored records, without parsing them
    fn count(&self) -> Result<usize> {
        if !self.path.exists() {
            return Ok(0);
        }

        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(data.lines().filter(|line| !line.trim().is_empty()).count())
    }
}

impl FeedbackSink for JsonLinesFeedbackSink {
    fn submit(&self, feedback: &Feedback) -> Result<String> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let key = format!("{}", self.count()?);
        let line = serde_json::to_string(feedback)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        writeln!(file, "{}", line)?;

        log::info!("Feedback stored in {} as #{}", self.path.display(), key);
        Ok(key)
    }
}
