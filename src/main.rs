//! DDRGen - Detailed Diagnostic Report generator
//!
//! A CLI tool that turns a visual inspection report and a thermal-imaging
//! report into a structured, client-ready diagnostic report using an LLM.
//!
//! Exit codes:
//!   0 - Success (severity below threshold, or no --fail-on set)
//!   1 - Runtime error (missing key, unreadable document, API failure, etc.)
//!   2 - Assessed severity at or above the --fail-on threshold

mod cli;
mod config;
mod llm;
mod loader;
mod models;
mod pipeline;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, TextFormat};
use config::{Config, CONFIG_FILE_NAME};
use loader::DocumentStats;
use models::ReportMetadata;
use pipeline::{DdrPipeline, PipelineOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so [general].verbose applies
    let (mut config, config_path) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("DDRGen v{}", env!("CARGO_PKG_VERSION"));
    match config_path {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }
    debug!(
        "Documents: {:?} / {:?}",
        args.inspection.as_deref(),
        args.thermal.as_deref()
    );

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Report generation failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .ddrgen.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to choose the provider, model, output paths and more.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete workflow. Returns exit code (0 or 2).
async fn run(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    let inspection_path = document_path(args.inspection.as_ref(), "inspection")?;
    let thermal_path = document_path(args.thermal.as_ref(), "thermal")?;

    // Step 1: Load both documents
    if !args.quiet {
        println!("📄 Loading documents...");
    }
    let inspection_text = loader::load_document(inspection_path, &config.loader)
        .context("Failed to load inspection report")?;
    let thermal_text = loader::load_document(thermal_path, &config.loader)
        .context("Failed to load thermal report")?;

    // Handle --dry-run: show what would be sent and exit
    if args.dry_run {
        return handle_dry_run(
            &config,
            args.no_text,
            &[
                (inspection_path, &inspection_text),
                (thermal_path, &thermal_text),
            ],
        );
    }

    // Step 2: Initialize the model client
    let client: Arc<dyn llm::ModelClient> = Arc::from(llm::create_client(&config.model)?);

    if !args.quiet {
        println!("🤖 Initializing model client...");
        println!("   Provider: {}", client.provider_name());
        println!("   Model: {}", client.model_name());
        println!("   Timeout: {}s", config.model.timeout_seconds);
    }

    // Step 3: Run the pipeline
    if !args.quiet {
        println!("\n🔬 Running the four-stage pipeline...");
        println!("   ⏳ Each stage is one model call and may take a while.\n");
    }

    let pipeline = DdrPipeline::new(
        client.clone(),
        PipelineOptions {
            show_progress: !args.quiet,
        },
    );
    let output = pipeline.process(&inspection_text, &thermal_text).await?;

    // Step 4: Attach metadata and save
    let mut ddr = output.report;
    ddr.metadata = Some(ReportMetadata {
        generated_at: Utc::now(),
        model_used: client.model_name().to_string(),
        provider: client.provider_name().to_string(),
        inspection_source: inspection_path.display().to_string(),
        thermal_source: thermal_path.display().to_string(),
        inspection_observations: output.inspection_count,
        thermal_observations: output.thermal_count,
        merged_areas: output.merged.len(),
        conflicts_detected: output.conflicts,
        duration_seconds: start_time.elapsed().as_secs_f64(),
    });

    let json_path = PathBuf::from(&config.general.output);
    report::write_report(&report::generate_json_report(&ddr)?, &json_path)?;
    info!("JSON report saved to {}", json_path.display());

    let text_path = if args.no_text {
        None
    } else {
        let rendered = match config.general.format {
            TextFormat::Text => report::format_ddr_for_display(&ddr),
            TextFormat::Markdown => report::generate_markdown_report(&ddr),
        };
        let path = PathBuf::from(config.general.effective_text_output());
        report::write_report(&rendered, &path)?;
        info!("Formatted report saved to {}", path.display());

        if !args.quiet && config.general.format == TextFormat::Text {
            println!("\n{}\n", rendered);
        }
        Some(path)
    };

    // Print summary
    let severity = &ddr.severity_assessment;
    if !args.quiet {
        println!("\n📊 Report Summary:");
        println!(
            "   Observations: {} inspection, {} thermal",
            output.inspection_count, output.thermal_count
        );
        println!("   Areas: {}", output.merged.len());
        println!("   Conflicts: {}", output.conflicts);
        println!("   Severity: {} {}", severity.level.emoji(), severity.label);
        println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
        println!("\n✅ Report complete! JSON saved to: {}", json_path.display());
        if let Some(path) = text_path {
            println!("   Formatted report saved to: {}", path.display());
        }
    }

    // Check --fail-on threshold
    if let Some(fail_level) = args.fail_on {
        if fail_level.is_reached_by(severity.level) {
            eprintln!(
                "\n⛔ Severity {} ({}) is at or above {:?}. Failing (exit code 2).",
                severity.label, severity.level, fail_level
            );
            return Ok(2);
        }
    }

    Ok(0)
}

fn document_path<'a>(path: Option<&'a PathBuf>, label: &str) -> Result<&'a Path> {
    path.map(PathBuf::as_path)
        .with_context(|| format!("Missing {} report path", label))
}

/// Handle --dry-run: report document sizes and the resolved model, no model calls.
fn handle_dry_run(
    config: &Config,
    no_text: bool,
    documents: &[(&Path, &String)],
) -> Result<i32> {
    println!("\n🔍 Dry run: documents loaded (no model calls)...\n");

    for (path, text) in documents {
        let stats = DocumentStats::of(text);
        println!(
            "   📄 {} ({} characters, {} lines, {} non-empty)",
            path.display(),
            stats.characters,
            stats.lines,
            stats.non_empty_lines
        );
    }

    println!(
        "\n   Would use {} model {} at {}",
        config.model.provider,
        config.model.effective_model(),
        config.model.effective_api_url()
    );
    println!("   JSON output: {}", config.general.output);
    if !no_text {
        println!("   Formatted output: {}", config.general.effective_text_output());
    }

    println!("\n✅ Dry run complete. No model calls were made.");
    Ok(0)
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go to stderr. Returns the
/// path the configuration was read from, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, Some(PathBuf::from(CONFIG_FILE_NAME)))),
        Ok(None) => Ok((Config::default(), None)),
        Err(e) => {
            eprintln!("Warning: failed to load config: {:#}", e);
            Ok((Config::default(), None))
        }
    }
}
