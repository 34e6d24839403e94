//! # pfhub Library
//!
//! Submit benchmark results to PFHub: classify Zenodo record URLs, download
//! records and legacy uploads, convert legacy `meta.yaml` files to the current
//! `pfhub.yaml` schema, and validate files against either schema.

pub mod cli;
pub mod commands;
pub mod config;
pub mod convert;
pub mod current;
pub mod download;
pub mod engine;
pub mod error;
pub mod http_client;
pub mod legacy;
pub mod output;
pub mod schemas;
pub mod zenodo;

pub use cli::{Cli, Commands, VerbosityLevel};
pub use commands::{Collaborators, Dispatcher, NetworkCollaborators, Outcome};
pub use config::{Config, ConfigManager, EnvProvider};
pub use convert::{Conversion, LinkedFile, PfhubRecord, convert_meta, meta_to_pfhub};
pub use current::{CurrentOutcome, CurrentValidator, validate_current};
pub use download::Probe;
pub use engine::{CommandEngine, EngineError, EngineExit, JsonSchemaEngine, SchemaEngine};
pub use error::{ConfigError, PfhubError, Result};
pub use http_client::{AsyncHttpClient, HttpClientConfig};
pub use legacy::{LegacyCause, LegacyOutcome, LegacySession, LegacyValidator, validate_legacy};
pub use output::Output;
pub use schemas::{SchemaKind, SchemaSource};
pub use zenodo::{RecordPatterns, RecordReference, classify};
