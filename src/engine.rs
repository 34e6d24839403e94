//! Engines that check a subject against the current schema
//!
//! An engine reports the way a validator command line does: an exit code, zero
//! when the subject is valid, plus whatever it printed. A subject too malformed
//! for the engine to reach its exit code surfaces as [`EngineError::MissingKey`].

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;
use tokio::process::Command;

use crate::schemas::{SchemaKind, SchemaSource, load_subject, required_keys};

/// Exit status and output of one engine run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineExit {
    pub code: i32,
    pub messages: Vec<String>,
}

impl EngineExit {
    pub fn success() -> Self {
        Self {
            code: 0,
            messages: Vec::new(),
        }
    }

    pub fn failure(messages: Vec<String>) -> Self {
        Self { code: 1, messages }
    }
}

/// Ways an engine run can end without an exit code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The subject lacks a key the engine looks up before validating
    MissingKey { key: String },
    /// The engine neither exited nor raised a data-shape error
    Abnormal { details: String },
}

#[async_trait]
pub trait SchemaEngine: Send + Sync {
    async fn run(&self, subject: &Path) -> Result<EngineExit, EngineError>;
}

/// In-process engine backed by a compiled JSON Schema
pub struct JsonSchemaEngine {
    schema: SchemaSource,
}

impl Default for JsonSchemaEngine {
    fn default() -> Self {
        Self::new(SchemaSource::embedded(SchemaKind::Current))
    }
}

impl JsonSchemaEngine {
    pub fn new(schema: SchemaSource) -> Self {
        Self { schema }
    }

    fn evaluate(&self, subject: &Path) -> Result<EngineExit, EngineError> {
        let document = self.schema.document().map_err(|e| EngineError::Abnormal {
            details: e.to_string(),
        })?;
        let validator = jsonschema::validator_for(&document).map_err(|e| EngineError::Abnormal {
            details: format!("{}: {}", self.schema.kind.name(), e),
        })?;

        let instance = match load_subject(subject) {
            Ok(instance) => instance,
            Err(e) => return Ok(EngineExit::failure(vec![e.to_string()])),
        };

        // The target class is looked up by key, so the root has to be a mapping.
        if !instance.is_object() {
            let key = required_keys(&document)
                .into_iter()
                .next()
                .unwrap_or_else(|| "<root>".to_string());
            return Err(EngineError::MissingKey { key });
        }

        let messages = violations(&validator, &instance);
        if messages.is_empty() {
            Ok(EngineExit::success())
        } else {
            Ok(EngineExit::failure(messages))
        }
    }
}

fn violations(validator: &jsonschema::Validator, instance: &Value) -> Vec<String> {
    validator
        .iter_errors(instance)
        .map(|e| format!("[ERROR] {}", e))
        .collect()
}

#[async_trait]
impl SchemaEngine for JsonSchemaEngine {
    async fn run(&self, subject: &Path) -> Result<EngineExit, EngineError> {
        self.evaluate(subject)
    }
}

/// Placeholder in a command line replaced by the schema path
pub const SCHEMA_PLACEHOLDER: &str = "{schema}";

/// Engine that runs an external validator command
///
/// The subject path is appended to `argv`. Any argument equal to
/// [`SCHEMA_PLACEHOLDER`] is replaced by the schema path; an embedded schema is
/// written to a scratch directory first.
pub struct CommandEngine {
    argv: Vec<String>,
    schema: SchemaSource,
}

impl CommandEngine {
    pub fn new(argv: Vec<String>, schema: SchemaSource) -> Self {
        Self { argv, schema }
    }

    fn schema_path(&self, scratch: &TempDir) -> Result<PathBuf, EngineError> {
        if let Some(path) = &self.schema.path {
            return Ok(path.clone());
        }
        let text = self.schema.text().map_err(|e| EngineError::Abnormal {
            details: e.to_string(),
        })?;
        let path = scratch.path().join(self.schema.kind.name());
        std::fs::write(&path, text).map_err(|e| EngineError::Abnormal {
            details: e.to_string(),
        })?;
        Ok(path)
    }
}

#[async_trait]
impl SchemaEngine for CommandEngine {
    async fn run(&self, subject: &Path) -> Result<EngineExit, EngineError> {
        let (program, args) = self.argv.split_first().ok_or_else(|| EngineError::Abnormal {
            details: "empty engine command".to_string(),
        })?;

        let scratch = TempDir::new().map_err(|e| EngineError::Abnormal {
            details: e.to_string(),
        })?;
        let mut command = Command::new(program);
        for arg in args {
            if arg == SCHEMA_PLACEHOLDER {
                command.arg(self.schema_path(&scratch)?);
            } else {
                command.arg(arg);
            }
        }
        command
            .arg(subject)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!(?command, "running schema engine");
        let output = command.output().await.map_err(|e| EngineError::Abnormal {
            details: format!("failed to run {}: {}", program, e),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        interpret_output(output.status.code(), &stdout, &stderr)
    }
}

/// Map a finished engine process onto the engine result
pub fn interpret_output(
    code: Option<i32>,
    stdout: &str,
    stderr: &str,
) -> Result<EngineExit, EngineError> {
    if let Some(key) = stderr.lines().find_map(key_error) {
        return Err(EngineError::MissingKey { key });
    }

    match code {
        Some(code) => Ok(EngineExit {
            code,
            messages: stdout
                .lines()
                .chain(stderr.lines())
                .map(str::trim_end)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        }),
        None => Err(EngineError::Abnormal {
            details: "engine terminated without an exit status".to_string(),
        }),
    }
}

fn key_error(line: &str) -> Option<String> {
    let rest = line.trim().strip_prefix("KeyError:")?;
    Some(rest.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
}
