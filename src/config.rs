//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.ddrgen.toml` files.

use crate::cli::TextFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".ddrgen.toml";

/// Fallback file holding a bare API key.
pub const API_KEY_FILE_NAME: &str = "api_key.txt";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Document loader settings.
    #[serde(default)]
    pub loader: LoaderConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Path of the JSON report.
    #[serde(default = "default_output")]
    pub output: String,

    /// Path of the human-readable report; derived from `format` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_output: Option<String>,

    /// Format of the human-readable report.
    #[serde(default)]
    pub format: TextFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            text_output: None,
            format: TextFormat::default(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "ddr_report.json".to_string()
}

impl GeneralConfig {
    /// Path of the human-readable report, `ddr_report_formatted.<ext>` by default.
    pub fn effective_text_output(&self) -> String {
        self.text_output
            .clone()
            .unwrap_or_else(|| format!("ddr_report_formatted.{}", self.format.extension()))
    }
}

/// Model provider backing the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Gemini (default)
    #[default]
    Gemini,
    /// Local Ollama server
    Ollama,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Gemini => write!(f, "gemini"),
            Provider::Ollama => write!(f, "ollama"),
        }
    }
}

impl Provider {
    fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => "models/gemini-2.5-flash",
            Provider::Ollama => "llama3.2:latest",
        }
    }

    fn default_api_url(&self) -> &'static str {
        match self {
            Provider::Gemini => "https://generativelanguage.googleapis.com",
            Provider::Ollama => "http://localhost:11434",
        }
    }
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Which provider to call.
    #[serde(default)]
    pub provider: Provider,

    /// Model name; the provider default when unset.
    #[serde(default)]
    pub name: Option<String>,

    /// API base URL; the provider default when unset.
    #[serde(default)]
    pub api_url: Option<String>,

    /// API key (Gemini only). Prefer GOOGLE_API_KEY over storing it here.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            name: None,
            api_url: None,
            api_key: None,
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_temperature() -> f32 {
    0.1
}

fn default_timeout() -> u64 {
    300
}

impl ModelConfig {
    /// Model name to request.
    pub fn effective_model(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }

    /// API base URL to call.
    pub fn effective_api_url(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| self.provider.default_api_url().to_string())
    }

    /// Resolve the API key, falling back to `api_key.txt` in the working directory.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_in(Path::new("."))
    }

    /// Resolve the API key, falling back to `api_key.txt` inside `dir`.
    pub fn resolve_api_key_in(&self, dir: &Path) -> Option<String> {
        if let Some(key) = self.api_key.as_deref().map(str::trim) {
            if !key.is_empty() {
                return Some(key.to_string());
            }
        }

        let key = std::fs::read_to_string(dir.join(API_KEY_FILE_NAME)).ok()?;
        let key = key.trim();
        (!key.is_empty()).then(|| key.to_string())
    }
}

/// Document loader settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Accepted file extensions (without dot).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Maximum document size in bytes.
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            max_document_bytes: default_max_document_bytes(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["txt", "md", "text"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_document_bytes() -> u64 {
    2 * 1024 * 1024 // 2MB
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(provider) = args.provider {
            // Switching provider invalidates a provider-specific model/url from the file.
            if provider != self.model.provider {
                self.model.name = None;
                self.model.api_url = None;
            }
            self.model.provider = provider;
        }
        if let Some(ref model) = args.model {
            self.model.name = Some(model.clone());
        }
        if let Some(ref url) = args.api_url {
            self.model.api_url = Some(url.clone());
        }
        if let Some(ref key) = args.api_key {
            self.model.api_key = Some(key.clone());
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(ref text_output) = args.text_output {
            self.general.text_output = Some(text_output.display().to_string());
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
