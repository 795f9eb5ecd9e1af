//! Catalog metadata and list-file downloads.
//!
//! Both operations are bearer-authenticated POSTs using the token issued at
//! login. Failures here are deliberately non-fatal values, so a caller
//! sequencing several independent list retrievals can continue past a
//! failure in one list.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::auth::AccessToken;
use crate::error::{Error, TransportError};

/// Metadata describing one published list snapshot.
///
/// Created from a catalog-fetch response and consumed by the download call
/// that references its document id and publication date; never persisted.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDescriptor {
    /// Identifier of the published document, passed back verbatim when
    /// downloading.
    pub document_id: String,
    /// Publication date as a UTC calendar date.
    pub date: NaiveDate,
    /// Whether the snapshot is marked active by the service.
    pub is_active: bool,
    /// Opaque record-status field, passed through untouched.
    pub status_id: Option<serde_json::Value>,
}

impl CatalogDescriptor {
    /// File name for this snapshot: `{prefix}_{YYYYMMDD}.{extension}`.
    pub fn file_name(&self, prefix: &str, extension: &str) -> String {
        format!("{}_{}.{}", prefix, self.date.format("%Y%m%d"), extension)
    }
}

/// Outcome of a catalog fetch.
///
/// `NotPublished` means the service answered but no list snapshot is
/// available; `TransportFailed` carries the reason a fetch could not be
/// completed. Neither halts a multi-list batch.
#[derive(Debug)]
pub enum CatalogOutcome {
    /// A snapshot is published.
    Found(CatalogDescriptor),
    /// The service reported no current snapshot.
    NotPublished,
    /// The fetch did not complete (network, status, or parse failure).
    TransportFailed(Error),
}

impl CatalogOutcome {
    /// The descriptor, if one was found.
    pub fn found(self) -> Option<CatalogDescriptor> {
        match self {
            CatalogOutcome::Found(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    /// Borrowing variant of [`Self::found`].
    pub fn as_found(&self) -> Option<&CatalogDescriptor> {
        match self {
            CatalogOutcome::Found(descriptor) => Some(descriptor),
            _ => None,
        }
    }
}

/// Outcome of a file download.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// The file was written to the given path.
    Saved(PathBuf),
    /// Nothing was written.
    Skipped(SkipReason),
}

/// Why a download wrote nothing.
#[derive(Debug)]
pub enum SkipReason {
    /// The server answered with a non-200 status.
    Http { status: u16, body: String },
    /// The request or body read failed.
    Transport(Error),
    /// The file could not be written.
    Io(std::io::Error),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Http { status, body } => write!(f, "HTTP {status}: {body}"),
            SkipReason::Transport(e) => write!(f, "{e}"),
            SkipReason::Io(e) => write!(f, "write failed: {e}"),
        }
    }
}

/// Publication date as served: an ISO-8601 string or an already-structured
/// timestamp in epoch milliseconds.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogDate {
    Iso(String),
    Millis(i64),
}

impl CatalogDate {
    fn to_naive_date(&self) -> Option<NaiveDate> {
        match self {
            CatalogDate::Iso(s) => parse_iso_date(s),
            CatalogDate::Millis(ms) => {
                chrono::DateTime::from_timestamp_millis(*ms).map(|dt| dt.date_naive())
            }
        }
    }
}

fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&chrono::Utc).date_naive());
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Wire shape of a catalog-fetch response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogResponse {
    #[serde(default)]
    id_xml: Option<String>,
    #[serde(default)]
    date: Option<CatalogDate>,
    #[serde(default)]
    is_active: bool,
    #[serde(default)]
    id_rec_status: Option<serde_json::Value>,
}

/// Bearer-authenticated client for catalog and download endpoints.
#[derive(Debug)]
pub(crate) struct CatalogClient {
    http: reqwest::Client,
    token: AccessToken,
}

impl CatalogClient {
    pub(crate) fn new(token: AccessToken) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("fedsfm/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, token })
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token.as_str())
    }

    /// Fetch catalog metadata with an empty-body POST.
    #[instrument(skip(self))]
    pub(crate) async fn fetch_catalog(&self, url: &str) -> CatalogOutcome {
        debug!("fetching catalog");
        let response = match self
            .http
            .post(url)
            .header(AUTHORIZATION, self.bearer())
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "catalog request failed");
                return CatalogOutcome::TransportFailed(e.into());
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "failed to read catalog response body");
                return CatalogOutcome::TransportFailed(e.into());
            }
        };
        debug!(status, body = %body, "catalog response");

        if status != 200 {
            warn!(status, "catalog request rejected");
            return CatalogOutcome::TransportFailed(
                TransportError::Status { status, body }.into(),
            );
        }

        let parsed: CatalogResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "catalog response was not valid JSON");
                return CatalogOutcome::TransportFailed(
                    TransportError::Http {
                        message: format!("invalid catalog response: {e}"),
                    }
                    .into(),
                );
            }
        };

        let Some(document_id) = parsed.id_xml.filter(|id| !id.is_empty()) else {
            // Nothing new published; not an error.
            info!("no catalog available");
            return CatalogOutcome::NotPublished;
        };

        let Some(date) = parsed.date.as_ref().and_then(CatalogDate::to_naive_date) else {
            warn!("catalog response carried a document id but no parseable date");
            return CatalogOutcome::TransportFailed(
                TransportError::Http {
                    message: "catalog response has no parseable publication date".to_string(),
                }
                .into(),
            );
        };

        CatalogOutcome::Found(CatalogDescriptor {
            document_id,
            date,
            is_active: parsed.is_active,
            status_id: parsed.id_rec_status,
        })
    }

    /// Download the list file named by a descriptor into `dir`.
    ///
    /// The response body is handled as raw bytes end to end; only catalog
    /// and login responses are ever treated as text.
    #[instrument(skip(self, descriptor, dir), fields(document_id = %descriptor.document_id))]
    pub(crate) async fn download_file(
        &self,
        descriptor: &CatalogDescriptor,
        url: &str,
        extension: &str,
        prefix: &str,
        dir: &Path,
    ) -> DownloadOutcome {
        debug!("requesting list file");
        let response = match self
            .http
            .post(url)
            .header(AUTHORIZATION, self.bearer())
            .form(&[("id", descriptor.document_id.as_str())])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "file download request failed");
                return DownloadOutcome::Skipped(SkipReason::Transport(e.into()));
            }
        };

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            error!(status, body = %body, "file download rejected");
            return DownloadOutcome::Skipped(SkipReason::Http { status, body });
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(error = %e, "failed to read file body");
                return DownloadOutcome::Skipped(SkipReason::Transport(e.into()));
            }
        };

        let path = dir.join(descriptor.file_name(prefix, extension));
        if let Err(e) = tokio::fs::write(&path, &bytes).await {
            error!(path = %path.display(), error = %e, "failed to write list file");
            return DownloadOutcome::Skipped(SkipReason::Io(e));
        }

        info!(path = %path.display(), size = bytes.len(), "list file saved");
        DownloadOutcome::Saved(path)
    }
}
