use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test fixture paths
pub struct TestFixtures {
    pub root: PathBuf,
}

impl TestFixtures {
    pub fn new() -> Self {
        Self {
            root: PathBuf::from(env!("CARGO_MANIFEST_DIR")),
        }
    }

    pub fn schema_dir(&self) -> PathBuf {
        self.root.join("schema")
    }

    pub fn fixtures_dir(&self) -> PathBuf {
        self.root.join("tests").join("fixtures")
    }

    /// Legacy upload that passes the legacy schema
    pub fn example_old(&self) -> PathBuf {
        self.schema_dir().join("example_old.yaml")
    }

    /// Current record that passes the current schema
    pub fn example(&self) -> PathBuf {
        self.schema_dir().join("example.yaml")
    }

    /// YAML that fails the legacy schema
    pub fn data_only(&self) -> PathBuf {
        self.fixtures_dir().join("8a_data.yaml")
    }

    pub fn free_energy_csv(&self) -> PathBuf {
        self.fixtures_dir().join("1a_square_periodic_out.csv")
    }

    /// Plain text that parses as a bare YAML scalar
    pub fn not_yaml(&self) -> PathBuf {
        self.fixtures_dir().join("not_yaml.txt")
    }
}

/// Copy the legacy example and its data file into a fresh directory
pub fn staged_legacy_upload() -> std::io::Result<(TempDir, PathBuf)> {
    staged_legacy_upload_with(|text| text)
}

/// Like [`staged_legacy_upload`], rewriting the example text first
pub fn staged_legacy_upload_with(
    edit: impl FnOnce(String) -> String,
) -> std::io::Result<(TempDir, PathBuf)> {
    let fixtures = TestFixtures::new();
    let dir = TempDir::new()?;
    let meta = dir.path().join("meta.yaml");
    let text = std::fs::read_to_string(fixtures.example_old())?;
    std::fs::write(&meta, edit(text))?;
    std::fs::copy(
        fixtures.free_energy_csv(),
        dir.path().join("1a_square_periodic_out.csv"),
    )?;
    Ok((dir, meta))
}

/// Write `contents` to `name` inside `dir`
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("Failed to write test file");
    path
}
