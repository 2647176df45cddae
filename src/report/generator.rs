//! Report rendering.
//!
//! This module renders a [`DdrReport`] as the plain-text client report,
//! as Markdown, or as pretty-printed JSON.

use crate::models::{AreaObservation, DdrReport, ReportMetadata, NOT_AVAILABLE};
use anyhow::{Context, Result};
use std::path::Path;

const BANNER_WIDTH: usize = 80;

/// Render the report as the seven-section plain-text document.
pub fn format_ddr_for_display(report: &DdrReport) -> String {
    let banner = "=".repeat(BANNER_WIDTH);
    let mut output = String::new();

    output.push_str(&format!("{}\nDETAILED DIAGNOSTIC REPORT (DDR)\n{}\n\n", banner, banner));

    push_text_section(&mut output, "1. PROPERTY ISSUE SUMMARY");
    output.push_str(&format!("{}\n\n", report.property_issue_summary));

    push_text_section(&mut output, "2. AREA-WISE OBSERVATIONS");
    for (i, obs) in report.area_wise_observations.iter().enumerate() {
        output.push_str(&format_area_block(i + 1, obs));
    }
    output.push('\n');

    push_text_section(&mut output, "3. PROBABLE ROOT CAUSE");
    output.push_str(&format!("{}\n\n", report.root_cause_analysis));

    push_text_section(&mut output, "4. SEVERITY ASSESSMENT");
    output.push_str(&format!(
        "Level: {}\nReasoning: {}\n\n",
        report.severity_assessment.label, report.severity_assessment.reasoning
    ));

    push_text_section(&mut output, "5. RECOMMENDED ACTIONS");
    output.push_str(&numbered_lines(&report.recommended_actions, NOT_AVAILABLE));
    output.push('\n');

    push_text_section(&mut output, "6. ADDITIONAL NOTES");
    output.push_str(&format!("{}\n\n", report.additional_notes));

    push_text_section(&mut output, "7. MISSING OR UNCLEAR INFORMATION");
    output.push_str(&numbered_lines(
        &report.missing_information,
        "All required information is available",
    ));
    output.push('\n');

    output.push_str(&format!("{}\nEND OF REPORT\n{}", banner, banner));

    output
}

fn push_text_section(output: &mut String, title: &str) {
    output.push_str(title);
    output.push('\n');
    output.push_str(&"-".repeat(BANNER_WIDTH));
    output.push('\n');
}

/// One numbered area entry, preceded by a blank line.
fn format_area_block(index: usize, obs: &AreaObservation) -> String {
    let mut block = format!(
        "\n{}. {}\n   Description: {}\n   Temperature: {}\n",
        index,
        obs.area.to_uppercase(),
        obs.description,
        obs.temperature
    );
    if !obs.notes.is_empty() {
        block.push_str(&format!("   Notes: {}\n", obs.notes));
    }
    block
}

/// Numbered list, one item per line, or `empty` when there are none.
fn numbered_lines(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        return format!("{}\n", empty);
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}\n", i + 1, item))
        .collect()
}

/// Generate the report as Markdown.
pub fn generate_markdown_report(report: &DdrReport) -> String {
    let mut output = String::new();

    output.push_str("# Detailed Diagnostic Report\n\n");

    if let Some(ref metadata) = report.metadata {
        output.push_str(&generate_metadata_section(metadata));
    }

    output.push_str("## Property Issue Summary\n\n");
    output.push_str(&format!("{}\n\n", report.property_issue_summary));

    output.push_str(&generate_observations_section(&report.area_wise_observations));

    output.push_str("## Probable Root Cause\n\n");
    output.push_str(&format!("{}\n\n", report.root_cause_analysis));

    let severity = &report.severity_assessment;
    output.push_str("## Severity Assessment\n\n");
    output.push_str(&format!(
        "{} **{}**\n\n",
        severity.level.emoji(),
        severity.label.to_uppercase()
    ));
    output.push_str(&format!("{}\n\n", severity.reasoning));

    output.push_str("## Recommended Actions\n\n");
    output.push_str(&numbered_lines(&report.recommended_actions, NOT_AVAILABLE));
    output.push('\n');

    output.push_str("## Additional Notes\n\n");
    output.push_str(&format!("{}\n\n", report.additional_notes));

    output.push_str("## Missing or Unclear Information\n\n");
    if report.missing_information.is_empty() {
        output.push_str("All required information is available\n\n");
    } else {
        for item in &report.missing_information {
            output.push_str(&format!("- {}\n", item));
        }
        output.push('\n');
    }

    output.push_str("---\n\n");
    output.push_str("*Report generated by DDRGen*\n");

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Model Used:** `{}` ({})\n",
        metadata.model_used, metadata.provider
    ));
    section.push_str(&format!(
        "- **Inspection Report:** {} ({} observations)\n",
        metadata.inspection_source, metadata.inspection_observations
    ));
    section.push_str(&format!(
        "- **Thermal Report:** {} ({} observations)\n",
        metadata.thermal_source, metadata.thermal_observations
    ));
    section.push_str(&format!("- **Areas:** {}\n", metadata.merged_areas));
    if metadata.conflicts_detected > 0 {
        section.push_str(&format!(
            "- **Conflicts Detected:** {}\n",
            metadata.conflicts_detected
        ));
    }
    section.push_str(&format!(
        "- **Generation Duration:** {:.1}s\n\n",
        metadata.duration_seconds
    ));

    section
}

fn generate_observations_section(observations: &[AreaObservation]) -> String {
    let mut section = String::new();

    section.push_str("## Area-wise Observations\n\n");

    if observations.is_empty() {
        section.push_str("No area observations were reported.\n\n");
        return section;
    }

    for obs in observations {
        section.push_str(&format!("### {}\n\n", obs.area));
        section.push_str(&format!("**Description:** {}\n\n", obs.description));
        section.push_str(&format!("**Temperature:** {}\n\n", obs.temperature));
        if !obs.notes.is_empty() {
            section.push_str(&format!("> **Notes:** {}\n\n", obs.notes));
        }
    }

    section
}

/// Generate a JSON report.
pub fn generate_json_report(report: &DdrReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
