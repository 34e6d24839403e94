//! Zenodo record URL classification
//!
//! Decides whether an arbitrary URL names a Zenodo record and, if so, which
//! record and which hosting environment (production or sandbox) it lives on.

use regex::Regex;
use std::sync::OnceLock;

/// Record URL shapes on the production service, tried in order
const PRODUCTION_PATTERNS: &[&str] = &[
    r"https://doi\.org/10\.\d+/zenodo\.(\d+)",
    r"https://zenodo\.org/api/records/(\d+)",
    r"https://zenodo\.org/record/(\d+)",
    r"https://zenodo\.org/records/(\d+)",
];

/// Record URL shapes on the sandbox service, tried in order
const SANDBOX_PATTERNS: &[&str] = &[
    r"https://sandbox\.zenodo\.org/record/(\d+)",
    r"https://sandbox\.zenodo\.org/api/records/(\d+)",
    r"https://sandbox\.zenodo\.org/records/(\d+)",
];

static RECORD_PATTERNS: OnceLock<RecordPatterns> = OnceLock::new();

/// A Zenodo record identified from a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordReference {
    /// Numeric record identifier, kept as the digits captured from the URL
    pub id: String,
    /// Whether the record is hosted on the sandbox service
    pub sandbox: bool,
}

impl RecordReference {
    pub fn production(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sandbox: false,
        }
    }

    pub fn sandbox(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sandbox: true,
        }
    }
}

/// The two ordered pattern sets, compiled once
///
/// Every pattern is anchored at both ends so only a full-string match counts.
#[derive(Debug)]
pub struct RecordPatterns {
    production: Vec<Regex>,
    sandbox: Vec<Regex>,
}

impl RecordPatterns {
    /// Get or initialize the process-wide pattern sets
    pub fn global() -> &'static RecordPatterns {
        RECORD_PATTERNS.get_or_init(|| RecordPatterns {
            production: compile(PRODUCTION_PATTERNS),
            sandbox: compile(SANDBOX_PATTERNS),
        })
    }

    /// Classify a URL, trying production shapes before sandbox shapes
    pub fn classify(&self, url: &str) -> Option<RecordReference> {
        if let Some(id) = record_id(url, &self.production) {
            return Some(RecordReference::production(id));
        }
        record_id(url, &self.sandbox).map(RecordReference::sandbox)
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(&format!("^(?:{})$", pattern)).expect("Failed to compile record regex")
        })
        .collect()
}

/// First identifier captured by any of `patterns`, in listed order
pub fn record_id(url: &str, patterns: &[Regex]) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Classify a URL against the built-in Zenodo record shapes
pub fn classify(url: &str) -> Option<RecordReference> {
    RecordPatterns::global().classify(url)
}

/// Record metadata endpoint for a reference, given the two API bases
pub fn record_api_url(record: &RecordReference, api_url: &str, sandbox_api_url: &str) -> String {
    let base = if record.sandbox {
        sandbox_api_url
    } else {
        api_url
    };
    format!("{}/{}", base.trim_end_matches('/'), record.id)
}
