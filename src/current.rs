//! Validation against the current `pfhub.yaml` schema
//!
//! [`CurrentValidator`] is the adapter between a [`SchemaEngine`] and callers
//! that want a verdict. Exit codes and data-shape errors become an ordinary
//! [`CurrentOutcome`]; an engine that ends any other way is an integration
//! failure and is returned as an error.

use std::path::Path;

use crate::engine::{EngineError, JsonSchemaEngine, SchemaEngine};
use crate::error::{PfhubError, Result};

/// Verdict of one current-schema validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentOutcome {
    pub valid: bool,
    /// Engine output worth showing to the user, in the order produced
    pub diagnostics: Vec<String>,
}

pub struct CurrentValidator {
    engine: Box<dyn SchemaEngine>,
}

impl Default for CurrentValidator {
    fn default() -> Self {
        Self::new(Box::new(JsonSchemaEngine::default()))
    }
}

impl CurrentValidator {
    pub fn new(engine: Box<dyn SchemaEngine>) -> Self {
        Self { engine }
    }

    pub async fn check(&self, path: &Path) -> Result<CurrentOutcome> {
        match self.engine.run(path).await {
            Ok(exit) => Ok(CurrentOutcome {
                valid: exit.code == 0,
                diagnostics: exit.messages,
            }),
            Err(EngineError::MissingKey { key }) => Ok(CurrentOutcome {
                valid: false,
                diagnostics: vec![format!("KeyError: '{}'", key)],
            }),
            Err(EngineError::Abnormal { details }) => {
                Err(PfhubError::EngineIntegration { details })
            }
        }
    }

    pub async fn is_valid(&self, path: &Path) -> Result<bool> {
        let outcome = self.check(path).await?;
        for diagnostic in &outcome.diagnostics {
            tracing::warn!(path = %path.display(), "{}", diagnostic);
        }
        Ok(outcome.valid)
    }
}

/// Validate a file against the built-in current schema
pub async fn validate_current(path: &Path) -> Result<bool> {
    CurrentValidator::default().is_valid(path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineExit;
    use async_trait::async_trait;

    struct FixedEngine(std::result::Result<EngineExit, EngineError>);

    #[async_trait]
    impl SchemaEngine for FixedEngine {
        async fn run(&self, _subject: &Path) -> std::result::Result<EngineExit, EngineError> {
            self.0.clone()
        }
    }

    fn validator(result: std::result::Result<EngineExit, EngineError>) -> CurrentValidator {
        CurrentValidator::new(Box::new(FixedEngine(result)))
    }

    #[tokio::test]
    async fn test_zero_exit_is_valid() {
        let outcome = validator(Ok(EngineExit::success()))
            .check(Path::new("pfhub.yaml"))
            .await
            .unwrap();
        assert!(outcome.valid);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_invalid() {
        let exit = EngineExit {
            code: 2,
            messages: vec!["[ERROR] bad".to_string()],
        };
        let outcome = validator(Ok(exit))
            .check(Path::new("pfhub.yaml"))
            .await
            .unwrap();
        assert!(!outcome.valid);
        assert_eq!(outcome.diagnostics, vec!["[ERROR] bad".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_key_is_invalid_with_diagnostic() {
        let outcome = validator(Err(EngineError::MissingKey {
            key: "results".to_string(),
        }))
        .check(Path::new("pfhub.yaml"))
        .await
        .unwrap();
        assert!(!outcome.valid);
        assert_eq!(outcome.diagnostics, vec!["KeyError: 'results'".to_string()]);
    }

    #[tokio::test]
    async fn test_abnormal_engine_is_fatal() {
        let result = validator(Err(EngineError::Abnormal {
            details: "killed".to_string(),
        }))
        .is_valid(Path::new("pfhub.yaml"))
        .await;
        assert!(matches!(result, Err(PfhubError::EngineIntegration { .. })));
    }
}
