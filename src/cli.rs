use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const EPILOG: &str = "See the documentation at https://github.com/usnistgov/pfhub/blob/master/CLI.md";

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show critical errors
    Quiet,
    /// Show standard information
    #[default]
    Normal,
    /// Show detailed information
    Verbose,
}

impl VerbosityLevel {
    /// Default `tracing` filter directive for this level
    pub fn filter(&self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "error",
            VerbosityLevel::Normal => "warn",
            VerbosityLevel::Verbose => "debug",
        }
    }
}

/// Submit results to PFHub and manipulate PFHub data
#[derive(Parser, Debug, Clone)]
#[command(name = "pfhub")]
#[command(about = "Submit results to PFHub and manipulate PFHub data")]
#[command(version, after_help = EPILOG)]
pub struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short = 'q', long = "quiet", global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Download a Zenodo record
    ///
    /// Works with any Zenodo record link, DOI link, or API link, on either the
    /// production or the sandbox service.
    #[command(after_help = EPILOG)]
    Download {
        /// URL of the Zenodo record
        #[arg(value_parser = parse_url)]
        url: String,

        /// Destination directory
        #[arg(short = 'd', long = "dest", default_value = "./", value_parser = existing_dir)]
        dest: PathBuf,
    },

    /// Download an old style PFHub YAML file
    ///
    /// In addition, gets the linked data in the `data` section.
    #[command(after_help = EPILOG)]
    DownloadMeta {
        /// URL of the YAML file
        #[arg(value_parser = parse_url)]
        url: String,

        /// Destination directory
        #[arg(short = 'd', long = "dest", default_value = "./", value_parser = existing_dir)]
        dest: PathBuf,
    },

    /// Convert an old style PFHub YAML file to the new schema
    #[command(after_help = EPILOG)]
    Convert {
        /// Path to the old style PFHub YAML file
        #[arg(value_parser = existing_file)]
        file_path: PathBuf,

        /// Destination directory, created when missing
        #[arg(short = 'd', long = "dest", default_value = "./", value_parser = dir_or_missing)]
        dest: PathBuf,
    },

    /// Validate a PFHub YAML file against the old schema
    #[command(after_help = EPILOG)]
    ValidateOld {
        /// Path to the YAML file
        #[arg(value_parser = existing_file)]
        file_path: PathBuf,
    },

    /// Validate a PFHub YAML file against the new schema
    #[command(after_help = EPILOG)]
    Validate {
        /// Path to the YAML file
        #[arg(value_parser = existing_file)]
        file_path: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Accept only absolute URLs, returning the text unchanged
pub fn parse_url(value: &str) -> Result<String, String> {
    let url = reqwest::Url::parse(value).map_err(|e| format!("{} is not a valid URL: {}", value, e))?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(format!("{} is not a valid URL", value));
    }
    Ok(value.to_string())
}

fn existing_dir(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if !path.exists() {
        return Err(format!("Directory '{}' does not exist", value));
    }
    if !path.is_dir() {
        return Err(format!("'{}' is a file", value));
    }
    let writable = std::fs::metadata(&path)
        .map(|metadata| !metadata.permissions().readonly())
        .unwrap_or(false);
    if !writable {
        return Err(format!("Directory '{}' is not writable", value));
    }
    Ok(path)
}

fn dir_or_missing(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_file() {
        return Err(format!("'{}' is a file", value));
    }
    Ok(path)
}

fn existing_file(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if !path.exists() {
        return Err(format!("File '{}' does not exist", value));
    }
    if path.is_dir() {
        return Err(format!("File '{}' is a directory", value));
    }
    std::fs::File::open(&path).map_err(|e| format!("File '{}' is not readable: {}", value, e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::try_parse_from(["pfhub"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_download_parsing() {
        let cli = Cli::try_parse_from(["pfhub", "download", "https://zenodo.org/record/7255597"])
            .unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Download {
                url: "https://zenodo.org/record/7255597".to_string(),
                dest: PathBuf::from("./"),
            })
        );
    }

    #[test]
    fn test_url_text_is_kept_verbatim() {
        assert_eq!(parse_url("https://blah.com").unwrap(), "https://blah.com");
        assert!(parse_url("blah").is_err());
        assert!(parse_url("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_dest_must_exist_for_downloads() {
        let result = Cli::try_parse_from([
            "pfhub",
            "download",
            "https://zenodo.org/record/1",
            "--dest",
            "/nonexistent/pfhub/dest",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_convert_dest_may_be_missing() {
        let cli = Cli::try_parse_from([
            "pfhub",
            "convert",
            "Cargo.toml",
            "--dest",
            "/nonexistent/pfhub/dest",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Convert { .. })));
    }

    #[test]
    fn test_file_path_must_be_a_file() {
        assert!(Cli::try_parse_from(["pfhub", "validate", "src"]).is_err());
        assert!(Cli::try_parse_from(["pfhub", "validate-old", "missing.yaml"]).is_err());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["pfhub", "-v", "-q", "validate", "Cargo.toml"]).is_err());
    }
}
