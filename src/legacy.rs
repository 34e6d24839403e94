//! Validation against the legacy `meta.yaml` schema
//!
//! Validation happens in two phases. Opening a [`LegacySession`] compiles the
//! schema and parses the subject; [`LegacySession::validate`] then checks the
//! parsed document. A failure in either phase makes the file invalid, and only
//! the boolean leaves [`validate_legacy`].

use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::schemas::{SchemaKind, SchemaSource, load_subject};

/// Why a legacy validation did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyCause {
    /// Validation succeeded
    None,
    /// The subject could not be parsed or the schema could not be compiled
    MalformedInput,
    /// The subject parsed but breaks one or more schema rules
    RuleViolation,
}

/// Tagged result of one legacy validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyOutcome {
    pub valid: bool,
    pub cause: LegacyCause,
    pub details: Vec<String>,
}

impl LegacyOutcome {
    fn valid() -> Self {
        Self {
            valid: true,
            cause: LegacyCause::None,
            details: Vec::new(),
        }
    }

    fn failed(cause: LegacyCause, details: Vec<String>) -> Self {
        Self {
            valid: false,
            cause,
            details,
        }
    }
}

/// A compiled legacy schema bound to one parsed subject
pub struct LegacySession {
    validator: jsonschema::Validator,
    subject: Value,
    path: PathBuf,
}

impl LegacySession {
    /// Compile the schema and parse the subject
    pub fn open(schema: &SchemaSource, path: &Path) -> std::result::Result<Self, String> {
        let validator = schema.compile().map_err(|e| e.to_string())?;
        let subject = load_subject(path).map_err(|e| e.to_string())?;
        Ok(Self {
            validator,
            subject,
            path: path.to_path_buf(),
        })
    }

    /// Check the parsed subject, collecting every rule violation
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let violations: Vec<String> = self
            .validator
            .iter_errors(&self.subject)
            .map(|e| e.to_string())
            .collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Validates files against a legacy schema source
#[derive(Debug, Clone)]
pub struct LegacyValidator {
    schema: SchemaSource,
}

impl Default for LegacyValidator {
    fn default() -> Self {
        Self::new(SchemaSource::embedded(SchemaKind::Legacy))
    }
}

impl LegacyValidator {
    pub fn new(schema: SchemaSource) -> Self {
        Self { schema }
    }

    /// Run both phases and report which one failed, if any
    pub fn check(&self, path: &Path) -> LegacyOutcome {
        let session = match LegacySession::open(&self.schema, path) {
            Ok(session) => session,
            Err(details) => {
                tracing::debug!(path = %path.display(), %details, "legacy schema session not created");
                return LegacyOutcome::failed(LegacyCause::MalformedInput, vec![details]);
            }
        };

        match session.validate() {
            Ok(()) => LegacyOutcome::valid(),
            Err(violations) => {
                for violation in &violations {
                    tracing::debug!(path = %session.path().display(), %violation, "legacy schema violation");
                }
                LegacyOutcome::failed(LegacyCause::RuleViolation, violations)
            }
        }
    }

    pub fn is_valid(&self, path: &Path) -> bool {
        self.check(path).valid
    }
}

/// Validate a file against the built-in legacy schema
pub fn validate_legacy(path: &Path) -> bool {
    LegacyValidator::default().is_valid(path)
}
