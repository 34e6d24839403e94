mod common;

use pfhub::{RecordPatterns, RecordReference, classify};

#[test]
fn test_production_link_forms() {
    let expected = Some(RecordReference::production("7255597"));
    for url in [
        "https://doi.org/10.5281/zenodo.7255597",
        "https://zenodo.org/api/records/7255597",
        "https://zenodo.org/record/7255597",
        "https://zenodo.org/records/7255597",
    ] {
        assert_eq!(classify(url), expected, "{}", url);
    }
}

#[test]
fn test_sandbox_link_forms() {
    let expected = Some(RecordReference::sandbox("657937"));
    for url in [
        "https://sandbox.zenodo.org/record/657937",
        "https://sandbox.zenodo.org/api/records/657937",
        "https://sandbox.zenodo.org/records/657937",
    ] {
        assert_eq!(classify(url), expected, "{}", url);
    }
}

#[test]
fn test_non_zenodo_links_do_not_classify() {
    for url in [
        "https://blah.com",
        "https://zenodo.org/",
        "https://zenodo.org/record/",
        "https://zenodo.org/record/abc",
        "https://github.com/usnistgov/pfhub/blob/master/meta.yaml",
    ] {
        assert_eq!(classify(url), None, "{}", url);
    }
}

#[test]
fn test_patterns_match_whole_url() {
    assert_eq!(classify("https://zenodo.org/record/7255597/files"), None);
    assert_eq!(classify("see https://zenodo.org/record/7255597"), None);
}

#[test]
fn test_sandbox_host_is_not_production() {
    let record = RecordPatterns::global()
        .classify("https://sandbox.zenodo.org/record/1")
        .unwrap();
    assert_eq!(record, RecordReference::sandbox("1"));
}
