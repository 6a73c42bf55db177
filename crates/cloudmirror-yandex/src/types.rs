//! Wire types of the Yandex Disk REST API

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Resource type as reported by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    File,
    Dir,
}

/// A file or folder
#[derive(Debug, Clone, Deserialize)]
pub struct Resource {
    /// Absolute path, e.g. `disk:/Backups/notes.txt`
    pub path: String,
    #[serde(rename = "type")]
    pub kind: ResourceType,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default, rename = "_embedded")]
    pub embedded: Option<ResourceList>,
}

impl Resource {
    /// Modification time, if present and well formed
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.modified
            .as_deref()
            .and_then(|m| DateTime::parse_from_rfc3339(m).ok())
            .map(|m| m.with_timezone(&Utc))
    }
}

/// One page of a folder listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceList {
    #[serde(default)]
    pub items: Vec<Resource>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Link returned for uploads and asynchronous operations
#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub href: String,
}

/// State of an asynchronous operation
#[derive(Debug, Clone, Deserialize)]
pub struct OperationStatus {
    pub status: String,
}

/// Error body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ApiError {
    /// Parse an error body, falling back to the raw text
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|_| Self {
            message: (!body.trim().is_empty()).then(|| body.trim().to_string()),
            ..Self::default()
        })
    }

    /// Most useful human-readable text available
    pub fn text(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.description.clone())
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "no details".to_string())
    }
}
