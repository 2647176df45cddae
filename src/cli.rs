//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::Provider;
use crate::models::SeverityLevel;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// DDRGen - Detailed Diagnostic Report generator
///
/// Turns a visual inspection report and a thermal-imaging report into a
/// structured, client-ready diagnostic report using an LLM.
///
/// Examples:
///   ddrgen --inspection inspection.txt --thermal thermal.txt
///   ddrgen -i inspection.txt -t thermal.txt --format markdown --text-output ddr.md
///   ddrgen -i inspection.txt -t thermal.txt --provider ollama --model llama3.2:latest
///   ddrgen -i inspection.txt -t thermal.txt --dry-run
///   ddrgen --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Visual inspection report (plain text)
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub inspection: Option<PathBuf>,

    /// Thermal-imaging report (plain text)
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub thermal: Option<PathBuf>,

    /// Model provider
    #[arg(long, value_name = "PROVIDER", env = "DDRGEN_PROVIDER")]
    pub provider: Option<Provider>,

    /// Model to use
    ///
    /// Defaults to models/gemini-2.5-flash for Gemini and llama3.2:latest for Ollama.
    #[arg(short, long, env = "DDRGEN_MODEL")]
    pub model: Option<String>,

    /// Model API base URL
    #[arg(long, value_name = "URL", env = "DDRGEN_API_URL")]
    pub api_url: Option<String>,

    /// Gemini API key
    ///
    /// Falls back to the config file, then to an api_key.txt file.
    #[arg(long, value_name = "KEY", env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output path for the JSON report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output path for the human-readable report
    #[arg(long, value_name = "FILE")]
    pub text_output: Option<PathBuf>,

    /// Format of the human-readable report (text, markdown)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<TextFormat>,

    /// Do not write or print the human-readable report
    #[arg(long)]
    pub no_text: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .ddrgen.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Temperature for LLM responses (0.0 - 2.0)
    ///
    /// Lower values produce more consistent/deterministic output
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Fail if the assessed severity is at or above this level
    ///
    /// Exit code 2 when the threshold is reached. Values: low, medium, high
    #[arg(long, value_name = "LEVEL")]
    pub fail_on: Option<FailOnLevel>,

    /// Dry run: load both documents without calling the model
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .ddrgen.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Format of the human-readable report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TextFormat {
    /// Plain text (default)
    #[default]
    Text,
    /// Markdown
    Markdown,
}

impl TextFormat {
    /// File extension for reports in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            TextFormat::Text => "txt",
            TextFormat::Markdown => "md",
        }
    }
}

/// Severity threshold for --fail-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum FailOnLevel {
    Low,
    Medium,
    High,
}

impl FailOnLevel {
    /// Whether a report with `level` reaches this threshold.
    pub fn is_reached_by(&self, level: SeverityLevel) -> bool {
        let threshold = match self {
            FailOnLevel::Low => SeverityLevel::Low,
            FailOnLevel::Medium => SeverityLevel::Medium,
            FailOnLevel::High => SeverityLevel::High,
        };
        level >= threshold
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        for (label, path) in [("Inspection", &self.inspection), ("Thermal", &self.thermal)] {
            let Some(path) = path else {
                return Err(format!("{} report path is required", label));
            };
            if !path.exists() {
                return Err(format!("{} report not found: {}", label, path.display()));
            }
            if !path.is_file() {
                return Err(format!("{} report is not a file: {}", label, path.display()));
            }
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `[general].verbose` from the config file;
    /// `--quiet` overrides it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::models::SeverityAssessment;
    use tempfile::NamedTempFile;

    pub fn make_args() -> Args {
        Args {
            inspection: None,
            thermal: None,
            provider: None,
            model: None,
            api_url: None,
            api_key: None,
            output: None,
            text_output: None,
            format: None,
            no_text: false,
            config: None,
            verbose: false,
            quiet: false,
            timeout: None,
            temperature: None,
            fail_on: None,
            dry_run: false,
            init_config: false,
        }
    }

    fn args_with_documents(inspection: &NamedTempFile, thermal: &NamedTempFile) -> Args {
        Args {
            inspection: Some(inspection.path().to_path_buf()),
            thermal: Some(thermal.path().to_path_buf()),
            ..make_args()
        }
    }

    #[test]
    fn test_validation_accepts_existing_documents() {
        let inspection = NamedTempFile::new().unwrap();
        let thermal = NamedTempFile::new().unwrap();
        let args = args_with_documents(&inspection, &thermal);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_document() {
        let inspection = NamedTempFile::new().unwrap();
        let mut args = make_args();
        args.inspection = Some(inspection.path().to_path_buf());
        args.thermal = Some(PathBuf::from("/nonexistent/thermal.txt"));

        let err = args.validate().unwrap_err();
        assert!(err.contains("Thermal report not found"));
    }

    #[test]
    fn test_validation_skipped_for_init_config() {
        let mut args = make_args();
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_api_url() {
        let inspection = NamedTempFile::new().unwrap();
        let thermal = NamedTempFile::new().unwrap();
        let mut args = args_with_documents(&inspection, &thermal);
        args.api_url = Some("localhost:11434".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let inspection = NamedTempFile::new().unwrap();
        let thermal = NamedTempFile::new().unwrap();
        let mut args = args_with_documents(&inspection, &thermal);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_config_verbose_raises_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }

    #[test]
    fn test_fail_on_threshold() {
        assert!(FailOnLevel::Medium.is_reached_by(SeverityLevel::High));
        assert!(FailOnLevel::Medium.is_reached_by(SeverityLevel::Medium));
        assert!(!FailOnLevel::Medium.is_reached_by(SeverityLevel::Low));
        assert!(!FailOnLevel::Low.is_reached_by(SeverityLevel::NotAvailable));
    }

    #[test]
    fn test_fail_on_free_form_labels() {
        let critical = SeverityAssessment::new("Critical", "Live wiring exposed");
        assert!(FailOnLevel::High.is_reached_by(critical.level));

        let immediate = SeverityAssessment::new("High - immediate", "r");
        assert!(FailOnLevel::High.is_reached_by(immediate.level));

        let unclear = SeverityAssessment::new("Unclear", "r");
        assert!(!FailOnLevel::Low.is_reached_by(unclear.level));
    }
}
