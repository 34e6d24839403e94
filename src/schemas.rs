//! Schema documents for the two PFHub submission formats
//!
//! Both schemas are embedded in the binary. A configuration may point either
//! one at a file on disk instead.

use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{PfhubError, Result};

const LEGACY_SCHEMA: &str = include_str!("../schema/schema_meta.yaml");
const CURRENT_SCHEMA: &str = include_str!("../schema/pfhub_schema.yaml");

/// Published location of the current schema, recorded in converted files
pub const CURRENT_SCHEMA_URL: &str =
    "https://github.com/usnistgov/pfhub/raw/master/pfhub/schema/pfhub_schema.yaml";

/// Version number recorded in converted files
pub const CURRENT_SCHEMA_VERSION: u64 = 1;

/// Which of the two submission formats a schema describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// `meta.yaml` uploads
    Legacy,
    /// `pfhub.yaml` uploads
    Current,
}

impl SchemaKind {
    pub fn name(&self) -> &'static str {
        match self {
            SchemaKind::Legacy => "schema_meta.yaml",
            SchemaKind::Current => "pfhub_schema.yaml",
        }
    }

    fn embedded(&self) -> &'static str {
        match self {
            SchemaKind::Legacy => LEGACY_SCHEMA,
            SchemaKind::Current => CURRENT_SCHEMA,
        }
    }
}

/// Where a schema document is read from
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaSource {
    pub kind: SchemaKind,
    pub path: Option<PathBuf>,
}

impl SchemaSource {
    pub fn embedded(kind: SchemaKind) -> Self {
        Self { kind, path: None }
    }

    pub fn file(kind: SchemaKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: Some(path.into()),
        }
    }

    /// Raw text of the schema document
    pub fn text(&self) -> Result<String> {
        match &self.path {
            Some(path) => Ok(std::fs::read_to_string(path)?),
            None => Ok(self.kind.embedded().to_string()),
        }
    }

    /// Parse the schema document (YAML or JSON) into a JSON value
    pub fn document(&self) -> Result<Value> {
        let text = self.text()?;
        serde_yaml::from_str(&text).map_err(|e| PfhubError::Schema {
            name: self.display_name(),
            details: e.to_string(),
        })
    }

    /// Parse and compile the schema document
    pub fn compile(&self) -> Result<jsonschema::Validator> {
        let document = self.document()?;
        jsonschema::validator_for(&document).map_err(|e| PfhubError::Schema {
            name: self.display_name(),
            details: e.to_string(),
        })
    }

    fn display_name(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => self.kind.name().to_string(),
        }
    }
}

/// Top-level keys the schema marks as required, in declared order
pub fn required_keys(document: &Value) -> Vec<String> {
    document
        .get("required")
        .and_then(Value::as_array)
        .map(|keys| {
            keys.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Read a YAML (or JSON) subject file into a JSON value
pub fn load_subject(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_schemas_compile() {
        assert!(SchemaSource::embedded(SchemaKind::Legacy).compile().is_ok());
        assert!(SchemaSource::embedded(SchemaKind::Current).compile().is_ok());
    }

    #[test]
    fn test_required_keys_in_order() {
        let document = SchemaSource::embedded(SchemaKind::Current)
            .document()
            .unwrap();
        let keys = required_keys(&document);
        assert_eq!(keys.first().map(String::as_str), Some("benchmark_problem"));
        assert!(keys.contains(&"results".to_string()));
    }

    #[test]
    fn test_missing_override_is_an_error() {
        let source = SchemaSource::file(SchemaKind::Legacy, "/nonexistent/schema.yaml");
        assert!(matches!(source.compile(), Err(PfhubError::Io(_))));
    }

    #[test]
    fn test_malformed_override_is_a_schema_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "type: [object\n").unwrap();

        let source = SchemaSource::file(SchemaKind::Legacy, &path);
        assert!(matches!(source.compile(), Err(PfhubError::Schema { .. })));
    }
}
