//! `config.properties` loading.
//!
//! The samples read region and credentials from a Java-style properties file:
//! `key=value` or `key: value` lines, `#` / `!` comments, and trailing
//! backslash line continuation.

use crate::error::{ConfigurationError, InferenceError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up when no path is given.
pub const DEFAULT_PROPERTIES_FILE: &str = "config.properties";

/// Environment variable overriding the properties file location.
pub const PROPERTIES_PATH_ENV: &str = "AWS_INFERENCE_CONFIG";

/// Property holding the AWS region.
pub const REGION_KEY: &str = "aws.region";
/// Property holding the access key ID.
pub const ACCESS_KEY_ID_KEY: &str = "aws.accessKeyId";
/// Property holding the secret access key.
pub const SECRET_ACCESS_KEY_KEY: &str = "aws.secretAccessKey";
/// Property holding an optional session token.
pub const SESSION_TOKEN_KEY: &str = "aws.sessionToken";

/// Parsed properties file.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    source: String,
    entries: HashMap<String, String>,
}

impl Properties {
    /// Parse properties from text. `source` names the origin in error messages.
    pub fn parse(source: impl Into<String>, content: &str) -> Self {
        let mut entries = HashMap::new();
        let mut logical = String::new();

        for raw in content.lines() {
            // Continuation lines drop their leading whitespace too.
            let line = raw.trim_start();

            if logical.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
                continue;
            }

            if ends_with_continuation(line) {
                logical.push_str(&line[..line.len() - 1]);
                continue;
            }

            logical.push_str(line);
            if let Some((key, value)) = split_entry(&logical) {
                entries.insert(key, value);
            }
            logical.clear();
        }

        if !logical.is_empty() {
            if let Some((key, value)) = split_entry(&logical) {
                entries.insert(key, value);
            }
        }

        Self {
            source: source.into(),
            entries,
        }
    }

    /// Load properties from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            InferenceError::Configuration(ConfigurationError::PropertiesFile {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        })?;

        let properties = Self::parse(path.display().to_string(), &content);
        debug!(path = %path.display(), keys = properties.len(), "Loaded properties file");
        Ok(properties)
    }

    /// Load from `AWS_INFERENCE_CONFIG`, falling back to `config.properties`.
    pub fn load_default() -> Result<Self, InferenceError> {
        Self::load(default_path())
    }

    /// Get a property value. Empty values count as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Get a property that must be present.
    pub fn require(&self, key: &str) -> Result<&str, InferenceError> {
        self.get(key).ok_or_else(|| {
            InferenceError::Configuration(ConfigurationError::MissingProperty {
                key: key.to_string(),
                path: self.source.clone(),
            })
        })
    }

    /// Where these properties were read from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve the properties file path.
pub fn default_path() -> PathBuf {
    std::env::var(PROPERTIES_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_PROPERTIES_FILE))
}

fn ends_with_continuation(line: &str) -> bool {
    let trailing = line.bytes().rev().take_while(|b| *b == b'\\').count();
    trailing % 2 == 1
}

fn split_entry(line: &str) -> Option<(String, String)> {
    let idx = line.find(|c| c == '=' || c == ':');
    let (key, value) = match idx {
        Some(i) => (&line[..i], &line[i + 1..]),
        None => (line, ""),
    };
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}
