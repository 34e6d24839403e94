//! Command dispatch
//!
//! Each command is a straight line: classify or validate, then hand off to a
//! collaborator, then describe the result as an [`Outcome`]. Outcomes carry
//! the exact lines shown to the user and map onto the exit code.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::Config;
use crate::convert::meta_to_pfhub;
use crate::current::CurrentValidator;
use crate::download::{self, Probe};
use crate::error::Result;
use crate::http_client::AsyncHttpClient;
use crate::legacy::LegacyValidator;
use crate::zenodo::{RecordReference, classify};

/// Result of one command, as presented to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Files were produced, listed in order
    Written(Vec<PathBuf>),
    /// A file passed validation
    Valid {
        diagnostics: Vec<String>,
        verdict: String,
    },
    /// The command failed; the last line is the headline
    Failed(Vec<String>),
}

impl Outcome {
    fn failed(line: impl Into<String>) -> Self {
        Outcome::Failed(vec![line.into()])
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Written(_) | Outcome::Valid { .. } => 0,
            Outcome::Failed(_) => 1,
        }
    }
}

/// The I/O the dispatcher delegates to
#[async_trait]
pub trait Collaborators: Send + Sync {
    /// Download every file of a Zenodo record into `dest`
    async fn download_record(&self, record: &RecordReference, dest: &Path) -> Result<Vec<PathBuf>>;

    /// Download a legacy upload and its linked data into `dest`
    async fn download_meta(&self, url: &str, dest: &Path) -> Result<Vec<PathBuf>>;

    /// Convert a legacy upload into `dest`
    async fn convert(&self, file_path: &Path, dest: &Path) -> Result<Vec<PathBuf>>;

    /// Fetch `url` into `scratch` to learn what it points at
    async fn probe(&self, url: &str, scratch: &Path) -> Probe;
}

/// Collaborators backed by the network and the local file system
pub struct NetworkCollaborators {
    client: AsyncHttpClient,
    api_url: String,
    sandbox_api_url: String,
}

impl NetworkCollaborators {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: AsyncHttpClient::new(config.http_client_config())?,
            api_url: config.zenodo.api_url.clone(),
            sandbox_api_url: config.zenodo.sandbox_api_url.clone(),
        })
    }
}

#[async_trait]
impl Collaborators for NetworkCollaborators {
    async fn download_record(&self, record: &RecordReference, dest: &Path) -> Result<Vec<PathBuf>> {
        download::download_record(
            &self.client,
            record,
            &self.api_url,
            &self.sandbox_api_url,
            dest,
        )
        .await
    }

    async fn download_meta(&self, url: &str, dest: &Path) -> Result<Vec<PathBuf>> {
        download::download_meta(&self.client, url, dest).await
    }

    async fn convert(&self, file_path: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
        meta_to_pfhub(&self.client, file_path, dest).await
    }

    async fn probe(&self, url: &str, scratch: &Path) -> Probe {
        download::probe(&self.client, url, scratch).await
    }
}

/// Runs commands against a set of collaborators and validators
pub struct Dispatcher<C> {
    collaborators: C,
    legacy: LegacyValidator,
    current: CurrentValidator,
}

impl Dispatcher<NetworkCollaborators> {
    /// Dispatcher wired from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            NetworkCollaborators::new(config)?,
            LegacyValidator::new(config.legacy_schema()),
            CurrentValidator::new(config.current_engine()),
        ))
    }
}

impl<C: Collaborators> Dispatcher<C> {
    pub fn new(collaborators: C, legacy: LegacyValidator, current: CurrentValidator) -> Self {
        Self {
            collaborators,
            legacy,
            current,
        }
    }

    /// `download <url>`
    pub async fn download(&self, url: &str, dest: &Path) -> Result<Outcome> {
        let Some(record) = classify(url) else {
            return Ok(Outcome::failed(format!(
                "{} does not match any expected regex for Zenodo",
                url
            )));
        };
        tracing::info!(id = %record.id, sandbox = record.sandbox, "downloading Zenodo record");
        let paths = self.collaborators.download_record(&record, dest).await?;
        Ok(Outcome::Written(paths))
    }

    /// `download-meta <url>`
    pub async fn download_meta(&self, url: &str, dest: &Path) -> Result<Outcome> {
        // Dropped on every return path, taking the probed copy with it.
        let scratch = TempDir::new()?;

        let valid = match self.collaborators.probe(url, scratch.path()).await {
            Probe::Unreachable(reason) => {
                return Ok(Outcome::Failed(vec![reason, format!("{} is invalid", url)]));
            }
            Probe::Directory => {
                return Ok(Outcome::failed(format!("{} is not a link to a file", url)));
            }
            Probe::File(path) => self.legacy.is_valid(&path),
        };
        drop(scratch);

        if !valid {
            return Ok(Outcome::failed(format!("{} is not valid", url)));
        }
        let paths = self.collaborators.download_meta(url, dest).await?;
        Ok(Outcome::Written(paths))
    }

    /// `convert <file_path>`
    pub async fn convert(&self, file_path: &Path, dest: &Path) -> Result<Outcome> {
        if !self.legacy.is_valid(file_path) {
            return Ok(Outcome::failed(format!(
                "{} is not valid",
                file_path.display()
            )));
        }
        let paths = self.collaborators.convert(file_path, dest).await?;
        Ok(Outcome::Written(paths))
    }

    /// `validate-old <file_path>`
    pub fn validate_old(&self, file_path: &Path) -> Outcome {
        if self.legacy.is_valid(file_path) {
            Outcome::Valid {
                diagnostics: Vec::new(),
                verdict: format!("{} is valid", file_path.display()),
            }
        } else {
            Outcome::failed(format!("{} is not valid", file_path.display()))
        }
    }

    /// `validate <file_path>`
    ///
    /// Engine diagnostics precede the verdict line.
    pub async fn validate(&self, file_path: &Path) -> Result<Outcome> {
        let outcome = self.current.check(file_path).await?;
        if outcome.valid {
            Ok(Outcome::Valid {
                diagnostics: outcome.diagnostics,
                verdict: format!("{} is valid", file_path.display()),
            })
        } else {
            let mut lines = outcome.diagnostics;
            lines.push(format!("{} is not valid", file_path.display()));
            Ok(Outcome::Failed(lines))
        }
    }
}
