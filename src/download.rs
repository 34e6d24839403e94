//! Network collaborators: Zenodo records, legacy uploads with their linked
//! data, and the probe that checks a URL names a single file.

use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{PfhubError, Result};
use crate::http_client::{AsyncHttpClient, file_name};
use crate::schemas::load_subject;
use crate::zenodo::{RecordReference, record_api_url};

/// Record document returned by the Zenodo records API
#[derive(Debug, Clone, Deserialize)]
pub struct RecordDocument {
    #[serde(default)]
    pub files: Vec<RecordFile>,
}

/// One file entry of a Zenodo record
///
/// Newer API responses name files with `key` and link them with `self`; older
/// ones use `filename` and `download`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordFile {
    pub key: Option<String>,
    pub filename: Option<String>,
    #[serde(default)]
    pub links: RecordFileLinks,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordFileLinks {
    #[serde(rename = "self")]
    pub self_link: Option<String>,
    pub download: Option<String>,
}

impl RecordFile {
    pub fn name(&self) -> Option<&str> {
        self.key.as_deref().or(self.filename.as_deref())
    }

    pub fn link(&self) -> Option<&str> {
        self.links
            .self_link
            .as_deref()
            .or(self.links.download.as_deref())
    }
}

/// Download every file of a Zenodo record into `dest`, in listed order
pub async fn download_record(
    client: &AsyncHttpClient,
    record: &RecordReference,
    api_url: &str,
    sandbox_api_url: &str,
    dest: &Path,
) -> Result<Vec<PathBuf>> {
    let endpoint = record_api_url(record, api_url, sandbox_api_url);
    tracing::debug!(%endpoint, sandbox = record.sandbox, "fetching record");
    let document: RecordDocument = client.get_json(&endpoint).await?;

    let mut written = Vec::with_capacity(document.files.len());
    for file in &document.files {
        let (Some(name), Some(link)) = (file.name(), file.link()) else {
            tracing::warn!(record = %record.id, ?file, "skipping record file without name or link");
            continue;
        };
        // Keys may carry directories; only the final component lands in dest.
        let local_name = Path::new(name)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(name));
        written.push(client.download_as(link, &dest.join(local_name)).await?);
    }

    if written.is_empty() {
        return Err(PfhubError::EmptyRecord {
            id: record.id.clone(),
        });
    }
    Ok(written)
}

/// `data[].url` entries of a legacy upload, in listed order
pub fn linked_data_urls(document: &Value) -> Vec<String> {
    document
        .get("data")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.get("url").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Download a legacy upload and the data files it links to
///
/// Relative data links are resolved against the upload's own URL.
pub async fn download_meta(client: &AsyncHttpClient, url: &str, dest: &Path) -> Result<Vec<PathBuf>> {
    let base = Url::parse(url).map_err(|e| PfhubError::InvalidUrl {
        url: url.to_string(),
        details: e.to_string(),
    })?;
    let meta_path = client.download_to(url, dest).await?;
    let document = load_subject(&meta_path)?;

    let mut written = vec![meta_path];
    for link in linked_data_urls(&document) {
        let resolved = base.join(&link).map_err(|e| PfhubError::InvalidUrl {
            url: link.clone(),
            details: e.to_string(),
        })?;
        written.push(client.download_to(resolved.as_str(), dest).await?);
    }
    Ok(written)
}

/// What a URL turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// The request failed; carries the reason
    Unreachable(String),
    /// The URL answered but names a directory-like resource, not a file
    Directory,
    /// The body was saved to this local path
    File(PathBuf),
}

/// Fetch `url` into `scratch` to learn whether it is a reachable single file
pub async fn probe(client: &AsyncHttpClient, url: &str, scratch: &Path) -> Probe {
    let response = match client.get_response_with_retry(url).await {
        Ok(response) => response,
        Err(error) => return Probe::Unreachable(error.to_string()),
    };

    let name = match file_name(url) {
        Ok(name) => name,
        Err(PfhubError::NoFileName { .. }) => return Probe::Directory,
        Err(error) => return Probe::Unreachable(error.to_string()),
    };

    let target = scratch.join(name);
    let body = match response.bytes().await {
        Ok(body) => body,
        Err(error) => return Probe::Unreachable(error.to_string()),
    };
    match tokio::fs::write(&target, &body).await {
        Ok(()) => Probe::File(target),
        Err(error) => Probe::Unreachable(error.to_string()),
    }
}
