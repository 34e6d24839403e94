//! Console rendering of command outcomes
//!
//! Written paths and valid verdicts are green, failures red. Colors are only
//! emitted when the stream is a terminal, so piped output stays plain.

use std::io::{self, Write};
use std::path::PathBuf;

use crate::commands::Outcome;

const GREEN: &str = "32";
const RED: &str = "31";

/// Output formatter for command outcomes
pub struct Output {
    show_colors: bool,
}

impl Output {
    pub fn new() -> Self {
        Self {
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    pub fn plain() -> Self {
        Self { show_colors: false }
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    /// Render an outcome as the lines printed to stdout, newline-terminated
    pub fn format_outcome(&self, outcome: &Outcome) -> String {
        match outcome {
            Outcome::Written(paths) => format!("{}\n", self.format_written(paths)),
            Outcome::Valid { diagnostics, verdict } => {
                let mut output = String::new();
                for line in diagnostics {
                    output.push_str(line);
                    output.push('\n');
                }
                output.push_str(&self.colorize(verdict, GREEN));
                output.push('\n');
                output
            }
            Outcome::Failed(lines) => {
                let mut output = String::new();
                for line in lines {
                    output.push_str(&self.colorize(line, RED));
                    output.push('\n');
                }
                output
            }
        }
    }

    /// `Writing: <p1>, <p2>, ..., <pN>`
    pub fn format_written(&self, paths: &[PathBuf]) -> String {
        let listed = paths
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        self.colorize(&format!("Writing: {}", listed), GREEN)
    }

    /// Print an outcome to stdout
    pub fn emit(&self, outcome: &Outcome) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(self.format_outcome(outcome).as_bytes())?;
        stdout.flush()
    }

    /// Red `Error: ...` line on stderr for failures outside the command contract
    pub fn emit_error(&self, message: &str) {
        let colored = if atty::is(atty::Stream::Stderr) {
            format!("\x1b[{}m{}\x1b[0m", RED, message)
        } else {
            message.to_string()
        };
        eprintln!("Error: {}", colored);
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_written_list() {
        let output = Output::plain();
        let outcome = Outcome::Written(vec![
            PathBuf::from("/tmp/phase_field_1.tsv"),
            PathBuf::from("/tmp/stats.tsv"),
        ]);
        assert_eq!(
            output.format_outcome(&outcome),
            "Writing: /tmp/phase_field_1.tsv, /tmp/stats.tsv\n"
        );
    }

    #[test]
    fn test_single_written_path_has_no_comma() {
        let output = Output::plain();
        let outcome = Outcome::Written(vec![PathBuf::from("a.jpg")]);
        assert_eq!(output.format_outcome(&outcome), "Writing: a.jpg\n");
    }

    #[test]
    fn test_failure_lines() {
        let output = Output::plain();
        let outcome = Outcome::Failed(vec![
            "HTTP error: connection refused".to_string(),
            "https://blah.com is invalid".to_string(),
        ]);
        assert_eq!(
            output.format_outcome(&outcome),
            "HTTP error: connection refused\nhttps://blah.com is invalid\n"
        );
    }

    #[test]
    fn test_valid_verdict_follows_diagnostics() {
        let output = Output::plain();
        let outcome = Outcome::Valid {
            diagnostics: vec!["[WARN] unused key".to_string()],
            verdict: "pfhub.yaml is valid".to_string(),
        };
        let formatted = output.format_outcome(&outcome);
        assert_eq!(formatted.lines().last(), Some("pfhub.yaml is valid"));
    }

    #[test]
    fn test_colors() {
        let output = Output { show_colors: true };
        let formatted = output.format_outcome(&Outcome::Failed(vec!["bad".to_string()]));
        assert_eq!(formatted, "\x1b[31mbad\x1b[0m\n");
    }
}
