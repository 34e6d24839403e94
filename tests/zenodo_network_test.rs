//! Live tests against Zenodo and GitHub; run with `cargo test -- --ignored`

mod common;

use pfhub::{AsyncHttpClient, HttpClientConfig, RecordReference, classify};
use pfhub::download::{download_meta, download_record};
use tempfile::TempDir;

const API_URL: &str = "https://zenodo.org/api/records";
const SANDBOX_API_URL: &str = "https://sandbox.zenodo.org/api/records";

fn client() -> AsyncHttpClient {
    AsyncHttpClient::new(HttpClientConfig::default()).unwrap()
}

fn file_names(paths: &[std::path::PathBuf]) -> Vec<String> {
    let mut names: Vec<String> = paths
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
#[ignore]
async fn test_download_production_record() {
    let dest = TempDir::new().unwrap();
    let record = classify("https://zenodo.org/record/7255597").unwrap();

    let written = download_record(&client(), &record, API_URL, SANDBOX_API_URL, dest.path())
        .await
        .unwrap();

    assert_eq!(file_names(&written), vec!["phase_field_1.tsv", "stats.tsv"]);
    assert!(written.iter().all(|path| path.is_file()));
}

#[tokio::test]
#[ignore]
async fn test_download_sandbox_record() {
    let dest = TempDir::new().unwrap();

    let written = download_record(
        &client(),
        &RecordReference::sandbox("657937"),
        API_URL,
        SANDBOX_API_URL,
        dest.path(),
    )
    .await
    .unwrap();

    assert!(!written.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_download_meta_with_linked_data() {
    let dest = TempDir::new().unwrap();
    let url = "https://raw.githubusercontent.com/usnistgov/pfhub/master/_data/simulations/fenics_1a_ivan/meta.yaml";

    let written = download_meta(&client(), url, dest.path()).await.unwrap();

    assert_eq!(written[0], dest.path().join("meta.yaml"));
    assert!(written.len() > 1);
    assert!(pfhub::validate_legacy(&written[0]));
}
