//! Blocking Yandex Disk client

use std::fs::File;
use std::path::Path;
use std::thread;
use std::time::Duration;

use cloudmirror_core::error::{RemoteResult, RemoteStoreError};
use cloudmirror_core::remote::{FolderStatus, RemoteStore};
use cloudmirror_core::snapshot::{EntryKind, RemoteEntry};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::types::{ApiError, Link, OperationStatus, Resource, ResourceType};

/// Public REST endpoint
pub const DEFAULT_API_URL: &str = "https://cloud-api.yandex.net/v1/disk";

const PAGE_LIMIT: usize = 1000;
const API_TIMEOUT: Duration = Duration::from_secs(30);
const OPERATION_POLLS: u32 = 60;
const OPERATION_POLL_INTERVAL: Duration = Duration::from_secs(1);
const EXISTING_FOLDER: &str = "DiskPathPointsToExistentDirectoryError";

/// Remote store backed by one folder on Yandex Disk
///
/// Relative paths handed to the [`RemoteStore`] methods are anchored at
/// `/<folder>/`; listed `disk:/<folder>/` prefixes are stripped again.
pub struct YandexDiskClient {
    http: Client,
    base_url: String,
    folder: String,
    token: String,
}

impl YandexDiskClient {
    /// Create a client for `folder`, talking to `api_url` or the public endpoint
    ///
    /// No request is sent; call [`Self::check_connection`] to verify access.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::Transport`] if the HTTP client cannot be built.
    pub fn new(token: impl Into<String>, folder: impl Into<String>, api_url: Option<&str>) -> RemoteResult<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(None::<Duration>)
            .user_agent(format!("cloudmirror/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport)?;

        Ok(Self {
            http,
            base_url: api_url.unwrap_or(DEFAULT_API_URL).trim_end_matches('/').to_string(),
            folder: folder.into().trim_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Mirrored folder, without slashes
    #[must_use]
    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Verify the token and make sure the mirrored folder exists
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::Unauthorized`] for a rejected token,
    /// [`RemoteStoreError::Forbidden`] for missing permissions, or whatever
    /// error creating the folder produced.
    pub fn check_connection(&self) -> RemoteResult<()> {
        let response = self.api(self.http.get(format!("{}/", self.base_url))).send().map_err(transport)?;
        check(response, "/")?;
        debug!("Token accepted");

        let root = self.remote_path("");
        let response = self
            .api(self.http.get(self.url("/resources")))
            .query(&[("path", root.as_str()), ("limit", "0")])
            .send()
            .map_err(transport)?;

        match check(response, &root) {
            Ok(_) => Ok(()),
            Err(RemoteStoreError::NotFound(_)) => {
                self.create_folder_chain()?;
                info!(folder = %self.folder, "Created remote folder");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Absolute API path for a path relative to the mirrored folder
    #[must_use]
    pub fn remote_path(&self, rel: &str) -> String {
        let rel = rel.trim_matches('/');
        if rel.is_empty() {
            format!("/{}", self.folder)
        } else {
            format!("/{}/{rel}", self.folder)
        }
    }

    /// Path relative to the mirrored folder for a listed API path
    #[must_use]
    pub fn relative_path(&self, api_path: &str) -> Option<String> {
        let path = api_path.strip_prefix("disk:").unwrap_or(api_path);
        let prefix = format!("/{}/", self.folder);
        path.strip_prefix(&prefix)
            .map(|rel| rel.trim_end_matches('/').to_string())
            .filter(|rel| !rel.is_empty())
    }

    /// Convert a listed resource into an entry relative to the mirrored folder
    #[must_use]
    pub fn to_entry(&self, resource: &Resource) -> Option<RemoteEntry> {
        let Some(path) = self.relative_path(&resource.path) else {
            warn!(path = %resource.path, "Listed resource outside the mirrored folder");
            return None;
        };
        Some(match resource.kind {
            ResourceType::Dir => RemoteEntry::dir(path),
            ResourceType::File => RemoteEntry {
                path,
                kind: EntryKind::File,
                size: resource.size,
                modified: resource.modified_at(),
                sha256: resource.sha256.as_ref().map(|s| s.to_lowercase()),
            },
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    fn api(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("OAuth {}", self.token))
            .header("Accept", "application/json")
            .timeout(API_TIMEOUT)
    }

    /// Create the mirrored folder and any missing ancestors
    fn create_folder_chain(&self) -> RemoteResult<()> {
        let mut current = String::new();
        for segment in self.folder.split('/') {
            current.push('/');
            current.push_str(segment);
            self.put_folder(&current)?;
        }
        Ok(())
    }

    fn put_folder(&self, api_path: &str) -> RemoteResult<FolderStatus> {
        let response = self
            .api(self.http.put(self.url("/resources")))
            .query(&[("path", api_path)])
            .send()
            .map_err(transport)?;

        match check(response, api_path) {
            Ok(_) => Ok(FolderStatus::Created),
            Err(RemoteStoreError::Conflict { message, .. }) if message == EXISTING_FOLDER => {
                Ok(FolderStatus::AlreadyExists)
            }
            Err(e) => Err(e),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder, path: &str) -> RemoteResult<T> {
        let response = check(self.api(request).send().map_err(transport)?, path)?;
        response
            .json()
            .map_err(|e| RemoteStoreError::Malformed(e.to_string()))
    }

    /// Wait for a 202 operation to finish
    fn finish(&self, response: Response, path: &str) -> RemoteResult<()> {
        if response.status() != StatusCode::ACCEPTED {
            return Ok(());
        }
        let link: Link = response
            .json()
            .map_err(|e| RemoteStoreError::Malformed(e.to_string()))?;

        for _ in 0..OPERATION_POLLS {
            let state: OperationStatus = self.get_json(self.http.get(&link.href), path)?;
            match state.status.as_str() {
                "success" => return Ok(()),
                "failed" => {
                    return Err(RemoteStoreError::Status {
                        status: 500,
                        message: format!("asynchronous operation on {path} failed"),
                    });
                }
                _ => thread::sleep(OPERATION_POLL_INTERVAL),
            }
        }
        Err(RemoteStoreError::Transport(format!(
            "asynchronous operation on {path} did not finish"
        )))
    }
}

impl RemoteStore for YandexDiskClient {
    fn upload(&self, local: &Path, remote: &str) -> RemoteResult<()> {
        let target = self.remote_path(remote);
        let link: Link = self.get_json(
            self.http
                .get(self.url("/resources/upload"))
                .query(&[("path", target.as_str()), ("overwrite", "true")]),
            &target,
        )?;

        let file = File::open(local)?;
        let response = self
            .http
            .put(&link.href)
            .body(file)
            .send()
            .map_err(transport)?;
        check(response, &target)?;
        debug!(path = remote, "Upload accepted");
        Ok(())
    }

    fn delete(&self, remote: &str) -> RemoteResult<()> {
        let target = self.remote_path(remote);
        let response = self
            .api(self.http.delete(self.url("/resources")))
            .query(&[("path", target.as_str()), ("permanently", "true")])
            .send()
            .map_err(transport)?;
        let response = check(response, &target)?;
        self.finish(response, &target)
    }

    fn list_children(&self, remote: &str) -> RemoteResult<Vec<RemoteEntry>> {
        let target = self.remote_path(remote);
        let limit = PAGE_LIMIT.to_string();
        let mut entries = Vec::new();
        let mut offset = 0;

        loop {
            let offset_param = offset.to_string();
            let resource: Resource = self.get_json(
                self.http.get(self.url("/resources")).query(&[
                    ("path", target.as_str()),
                    ("limit", limit.as_str()),
                    ("offset", offset_param.as_str()),
                ]),
                &target,
            )?;

            let page = resource.embedded.unwrap_or_default();
            let count = page.items.len();
            entries.extend(page.items.iter().filter_map(|r| self.to_entry(r)));
            offset += count;

            let more = page.total.map_or(count == PAGE_LIMIT, |total| (offset as u64) < total);
            if count == 0 || !more {
                break;
            }
        }

        Ok(entries)
    }

    fn create_folder(&self, remote: &str) -> RemoteResult<FolderStatus> {
        self.put_folder(&self.remote_path(remote))
    }

    fn supports_move(&self) -> bool {
        true
    }

    fn move_item(&self, from: &str, to: &str) -> RemoteResult<()> {
        let source = self.remote_path(from);
        let target = self.remote_path(to);
        let response = self
            .api(self.http.post(self.url("/resources/move")))
            .query(&[
                ("from", source.as_str()),
                ("path", target.as_str()),
                ("overwrite", "true"),
            ])
            .send()
            .map_err(transport)?;
        let response = check(response, &source)?;
        self.finish(response, &source)
    }
}

fn transport(err: reqwest::Error) -> RemoteStoreError {
    RemoteStoreError::Transport(err.to_string())
}

/// Pass successful responses through, map the rest to an error
fn check(response: Response, path: &str) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(error_for_status(status.as_u16(), &body, path))
}

/// Map a non-success status and its body to a store error
#[must_use]
pub fn error_for_status(status: u16, body: &str, path: &str) -> RemoteStoreError {
    let api = ApiError::from_body(body);
    match status {
        401 => RemoteStoreError::Unauthorized(
            "token rejected; it needs cloud_api:disk.read, cloud_api:disk.write and cloud_api:disk.info".to_string(),
        ),
        403 => RemoteStoreError::Forbidden(api.text()),
        404 => RemoteStoreError::NotFound(path.to_string()),
        409 => RemoteStoreError::Conflict {
            path: path.to_string(),
            message: api.error.clone().unwrap_or_else(|| api.text()),
        },
        429 => RemoteStoreError::RateLimited(api.text()),
        _ => RemoteStoreError::Status {
            status,
            message: api.text(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(folder: &str) -> YandexDiskClient {
        YandexDiskClient::new("token", folder, Some("http://127.0.0.1:9/v1/disk/")).unwrap()
    }

    #[test]
    fn test_remote_path() {
        let client = client("/Backups/laptop/");
        assert_eq!(client.folder(), "Backups/laptop");
        assert_eq!(client.remote_path(""), "/Backups/laptop");
        assert_eq!(client.remote_path("docs/a.txt"), "/Backups/laptop/docs/a.txt");
    }

    #[test]
    fn test_relative_path() {
        let client = client("Mirror");
        assert_eq!(
            client.relative_path("disk:/Mirror/docs/a.txt").as_deref(),
            Some("docs/a.txt")
        );
        assert_eq!(client.relative_path("/Mirror/b.txt").as_deref(), Some("b.txt"));
        assert_eq!(client.relative_path("disk:/Mirror"), None);
        assert_eq!(client.relative_path("disk:/MirrorOther/c.txt"), None);
    }

    #[test]
    fn test_to_entry() {
        let client = client("Mirror");
        let resource: Resource = serde_json::from_str(
            r#"{"path": "disk:/Mirror/a.txt", "type": "file", "size": 3,
                "modified": "2024-01-01T00:00:00+03:00", "sha256": "ABCDEF"}"#,
        )
        .unwrap();

        let entry = client.to_entry(&resource).unwrap();
        assert_eq!(entry.path, "a.txt");
        assert!(entry.is_file());
        assert_eq!(entry.size, Some(3));
        assert_eq!(entry.modified.unwrap().timestamp(), 1_704_056_400);
        assert_eq!(entry.sha256.as_deref(), Some("abcdef"));

        let dir: Resource =
            serde_json::from_str(r#"{"path": "disk:/Mirror/docs", "type": "dir"}"#).unwrap();
        assert!(client.to_entry(&dir).unwrap().is_dir());
    }

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            error_for_status(401, "", "/Mirror"),
            RemoteStoreError::Unauthorized(_)
        ));
        assert!(matches!(
            error_for_status(403, r#"{"message": "no scope"}"#, "/Mirror"),
            RemoteStoreError::Forbidden(m) if m == "no scope"
        ));
        assert!(matches!(
            error_for_status(404, "", "/Mirror/x"),
            RemoteStoreError::NotFound(p) if p == "/Mirror/x"
        ));
        assert!(matches!(
            error_for_status(409, r#"{"error": "DiskPathPointsToExistentDirectoryError"}"#, "/Mirror/d"),
            RemoteStoreError::Conflict { message, .. } if message == EXISTING_FOLDER
        ));
        assert!(matches!(
            error_for_status(429, "", "/Mirror"),
            RemoteStoreError::RateLimited(_)
        ));

        let server = error_for_status(503, "Service Unavailable", "/Mirror");
        assert!(server.is_transient());
        assert!(!error_for_status(401, "", "/Mirror").is_transient());
    }
}
