//! Conversion of legacy `meta.yaml` uploads into `pfhub.yaml` records
//!
//! [`convert_meta`] is the pure mapping between the two layouts;
//! [`meta_to_pfhub`] also writes `pfhub.yaml` and gathers the linked data
//! files into the destination directory.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{PfhubError, Result};
use crate::http_client::AsyncHttpClient;
use crate::schemas::{CURRENT_SCHEMA_URL, CURRENT_SCHEMA_VERSION};

/// Name of the converted record written into the destination directory
pub const PFHUB_FILE_NAME: &str = "pfhub.yaml";

/// A string-or-integer scalar, as used for versions in both layouts
///
/// Whole floats such as `1.0` count as integers, matching JSON Schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Number(f64),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(text) => write!(f, "{}", text),
            Scalar::Integer(value) => write!(f, "{}", value),
            Scalar::Number(value) if value.fract() == 0.0 => write!(f, "{:.0}", value),
            Scalar::Number(value) => write!(f, "{}", value),
        }
    }
}

/// Accept any whole, non-negative number, including `1.0`
fn whole_number<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
        Ok(value as u64)
    } else {
        Err(de::Error::custom(format!(
            "expected a whole non-negative number, found {}",
            value
        )))
    }
}

// Legacy layout

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyMeta {
    pub benchmark: LegacyBenchmark,
    pub metadata: LegacyMetadata,
    pub data: Vec<LegacyData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyBenchmark {
    pub id: String,
    pub version: Scalar,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyMetadata {
    pub author: LegacyAuthor,
    pub timestamp: String,
    pub summary: String,
    pub implementation: LegacyImplementation,
    pub software: Option<LegacySoftware>,
    pub hardware: Hardware,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyAuthor {
    pub first: String,
    pub last: String,
    pub email: Option<String>,
    pub github_id: String,
    pub affiliation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyImplementation {
    pub name: Option<String>,
    pub repo: LegacyRepo,
    pub container_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyRepo {
    pub url: String,
    pub version: Option<Scalar>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacySoftware {
    pub name: String,
    pub url: Option<String>,
    pub version: Option<Scalar>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyData {
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub format: Option<DataFormat>,
    #[serde(default)]
    pub values: Vec<Value>,
}

// Shared pieces

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hardware {
    pub architecture: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acc_architecture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clock_rate: Option<f64>,
    #[serde(deserialize_with = "whole_number")]
    pub cores: u64,
    #[serde(deserialize_with = "whole_number")]
    pub nodes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFormat {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse: Option<Value>,
}

// Current layout

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PfhubRecord {
    pub benchmark_problem: String,
    pub contributors: Vec<Contributor>,
    pub date_created: String,
    pub framework: Vec<Framework>,
    pub implementation: Implementation,
    pub results: Results,
    pub schema: SchemaReference,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contributor {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub affiliation: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Framework {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Implementation {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Results {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dataset_temporal: Vec<Dataset>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dataset_spatial: Vec<Dataset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fictive_time: Option<f64>,
    pub hardware: Hardware,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_in_kb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_in_s: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<DataFormat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaReference {
    pub url: String,
    pub version: u64,
}

/// A data file the converted record refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedFile {
    /// Location given in the legacy file (URL or path relative to it)
    pub source: String,
    /// File name inside the destination directory
    pub target: String,
}

/// Result of mapping a legacy upload onto the current layout
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub record: PfhubRecord,
    pub linked_files: Vec<LinkedFile>,
}

/// Map a parsed legacy upload onto the current layout
pub fn convert_meta(meta: &LegacyMeta) -> Conversion {
    let author = &meta.metadata.author;
    let repo = &meta.metadata.implementation.repo;

    let framework = match &meta.metadata.software {
        Some(software) => Framework {
            name: software.name.clone(),
            url: software.url.clone(),
            version: software.version.as_ref().map(Scalar::to_string),
        },
        None => Framework {
            name: meta
                .metadata
                .implementation
                .name
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            url: Some(repo.url.clone()),
            version: repo.version.as_ref().map(Scalar::to_string),
        },
    };

    let mut results = Results {
        dataset_temporal: Vec::new(),
        dataset_spatial: Vec::new(),
        fictive_time: None,
        hardware: with_parallel_model(&meta.metadata.hardware),
        memory_in_kb: None,
        time_in_s: None,
    };
    let mut linked_files = Vec::new();

    for data in &meta.data {
        match data.name.as_str() {
            "run_time" => {
                if let Some(last) = data.values.last() {
                    results.time_in_s = number(last, "wall_time");
                    results.fictive_time = number(last, "sim_time");
                }
            }
            "memory_usage" => {
                results.memory_in_kb = data.values.last().and_then(memory_in_kb);
            }
            _ => {
                let Some(url) = &data.url else { continue };
                let target = dataset_file_name(&data.name, &meta.benchmark.id, data, url);
                let dataset = Dataset {
                    name: data.name.clone(),
                    url: target.clone(),
                    description: data.description.clone(),
                    format: data.format.clone(),
                };
                if matches!(data.kind.as_deref(), Some("contour") | Some("image")) {
                    results.dataset_spatial.push(dataset);
                } else {
                    results.dataset_temporal.push(dataset);
                }
                linked_files.push(LinkedFile {
                    source: url.clone(),
                    target,
                });
            }
        }
    }

    let record = PfhubRecord {
        benchmark_problem: format!("{}.{}", meta.benchmark.id, meta.benchmark.version),
        contributors: vec![Contributor {
            id: format!("github:{}", author.github_id),
            name: format!("{} {}", author.first, author.last),
            email: author.email.clone(),
            affiliation: author.affiliation.iter().cloned().collect(),
        }],
        date_created: normalize_date(&meta.metadata.timestamp),
        framework: vec![framework],
        implementation: Implementation {
            url: repo.url.clone(),
            commit: repo.version.as_ref().map(Scalar::to_string),
            container_url: meta.metadata.implementation.container_url.clone(),
        },
        results,
        schema: SchemaReference {
            url: CURRENT_SCHEMA_URL.to_string(),
            version: CURRENT_SCHEMA_VERSION,
        },
        summary: meta.metadata.summary.clone(),
    };

    Conversion {
        record,
        linked_files,
    }
}

fn with_parallel_model(hardware: &Hardware) -> Hardware {
    let model = if hardware.nodes > 1 {
        "distributed"
    } else if hardware.cores > 1 {
        "threaded"
    } else {
        "serial"
    };
    Hardware {
        parallel_model: Some(model.to_string()),
        ..hardware.clone()
    }
}

fn number(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

fn memory_in_kb(value: &Value) -> Option<f64> {
    let amount = number(value, "value")?;
    let unit = value
        .get("unit")
        .and_then(Value::as_str)
        .unwrap_or("KB")
        .to_ascii_uppercase();
    let scale = match unit.as_str() {
        "B" => 1.0 / 1024.0,
        "MB" => 1024.0,
        "GB" => 1024.0 * 1024.0,
        _ => 1.0,
    };
    Some(amount * scale)
}

/// `<name>_<benchmark id>.<extension>` for a linked data file
///
/// Only the final path component is kept, so the file always lands directly
/// in the destination directory.
fn dataset_file_name(name: &str, benchmark_id: &str, data: &LegacyData, url: &str) -> String {
    let extension = data
        .format
        .as_ref()
        .map(|format| format.kind.clone())
        .or_else(|| {
            Path::new(url.split(['?', '#']).next().unwrap_or(url))
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "csv".to_string());
    let file_name = format!("{}_{}.{}", name, benchmark_id, extension);
    match Path::new(&file_name).file_name().and_then(|name| name.to_str()) {
        Some(local) => local.to_string(),
        None => "data".to_string(),
    }
}

/// Normalize a legacy timestamp to `YYYY-MM-DD`, keeping it verbatim otherwise
pub fn normalize_date(timestamp: &str) -> String {
    let text = timestamp.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return datetime.date_naive().format("%Y-%m-%d").to_string();
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return datetime.date().format("%Y-%m-%d").to_string();
        }
    }
    for format in ["%Y-%m-%d", "%d %B, %Y", "%d %B %Y", "%B %d, %Y", "%d %b %Y", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    text.to_string()
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

async fn same_file(a: &Path, b: &Path) -> bool {
    match (
        tokio::fs::canonicalize(a).await,
        tokio::fs::canonicalize(b).await,
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Convert the legacy upload at `file_path`, writing everything into `dest`
///
/// Returns `pfhub.yaml` followed by the linked data files, in the order the
/// legacy file lists them.
pub async fn meta_to_pfhub(
    client: &AsyncHttpClient,
    file_path: &Path,
    dest: &Path,
) -> Result<Vec<PathBuf>> {
    let text = tokio::fs::read_to_string(file_path).await?;
    let meta: LegacyMeta = serde_yaml::from_str(&text).map_err(|e| PfhubError::Conversion {
        file: file_path.to_path_buf(),
        details: e.to_string(),
    })?;
    let conversion = convert_meta(&meta);

    tokio::fs::create_dir_all(dest).await?;
    let record_path = dest.join(PFHUB_FILE_NAME);
    tokio::fs::write(&record_path, serde_yaml::to_string(&conversion.record)?).await?;

    let base = file_path.parent().unwrap_or_else(|| Path::new("."));
    let mut written = vec![record_path];
    for linked in &conversion.linked_files {
        let target = dest.join(&linked.target);
        if is_remote(&linked.source) {
            client.download_as(&linked.source, &target).await?;
        } else {
            let source = base.join(&linked.source);
            if !same_file(&source, &target).await {
                tokio::fs::copy(&source, &target).await.map_err(|e| {
                    PfhubError::Conversion {
                        file: source.clone(),
                        details: e.to_string(),
                    }
                })?;
            }
        }
        tracing::debug!(source = %linked.source, target = %target.display(), "linked data gathered");
        written.push(target);
    }

    Ok(written)
}
