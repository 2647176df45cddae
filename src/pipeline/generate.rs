//! Stage 4: client-facing DDR generation.

use super::prompts::GENERATION_PROMPT;
use super::reasoning::warn_unrecognized_severity;
use super::response::{clean_json_response, preview};
use crate::llm::ModelClient;
use crate::models::{AreaObservation, DdrReport, MergedObservation, RootCauseAnalysis};
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Everything the generation prompt receives.
#[derive(Debug, Serialize)]
pub struct GenerationInput<'a> {
    pub observations: Vec<ObservationSummary<'a>>,
    pub analysis: &'a RootCauseAnalysis,
    pub conflicts_detected: Vec<String>,
    pub data_gaps: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ObservationSummary<'a> {
    pub area: &'a str,
    pub issue: &'a str,
    pub temperature: &'a str,
    pub completeness: String,
}

impl<'a> GenerationInput<'a> {
    /// Collect observations, conflicts and data gaps for the prompt.
    pub fn new(merged: &'a [MergedObservation], analysis: &'a RootCauseAnalysis) -> Self {
        let observations = merged
            .iter()
            .map(|obs| ObservationSummary {
                area: &obs.area,
                issue: &obs.combined_issue,
                temperature: &obs.temperature_reading,
                completeness: obs.data_completeness.to_string(),
            })
            .collect();

        let conflicts_detected = merged
            .iter()
            .filter(|obs| obs.conflict_detected)
            .map(|obs| format!("{}: {}", obs.area, obs.conflict_reason))
            .collect();

        let data_gaps = merged
            .iter()
            .filter(|obs| obs.data_completeness.is_gap())
            .map(|obs| format!("{}: {}", obs.area, obs.data_completeness))
            .collect();

        Self {
            observations,
            analysis,
            conflicts_detected,
            data_gaps,
        }
    }
}

/// Build the generation prompt.
pub fn build_generation_prompt(input: &GenerationInput<'_>) -> Result<String> {
    let payload =
        serde_json::to_string_pretty(input).context("Failed to serialize generation input")?;
    Ok(format!("{}\n\nINPUT DATA:\n{}", GENERATION_PROMPT, payload))
}

/// Generate the final report.
pub async fn generate_ddr(
    client: &dyn ModelClient,
    merged: &[MergedObservation],
    analysis: &RootCauseAnalysis,
) -> Result<DdrReport> {
    info!("STAGE 4: DDR Report Generation");

    let input = GenerationInput::new(merged, analysis);
    debug!(
        "{} conflicts, {} data gaps passed to generation",
        input.conflicts_detected.len(),
        input.data_gaps.len()
    );

    let prompt = build_generation_prompt(&input)?;
    let response = client.generate(&prompt).await?;

    let cleaned = clean_json_response(&response);
    match serde_json::from_str::<DdrReport>(cleaned) {
        Ok(report) => {
            warn_unrecognized_severity(&report.severity_assessment);
            info!("DDR report generated successfully");
            Ok(report)
        }
        Err(e) => {
            warn!("JSON parsing error: {}", e);
            warn!("Response text: {}", preview(cleaned, 500));
            Ok(fallback_report(&input, &e.to_string()))
        }
    }
}

/// Report built from local data when the model response could not be parsed.
pub fn fallback_report(input: &GenerationInput<'_>, error: &str) -> DdrReport {
    DdrReport {
        property_issue_summary: "Error generating report".to_string(),
        area_wise_observations: input
            .observations
            .iter()
            .map(|obs| AreaObservation {
                area: obs.area.to_string(),
                description: obs.issue.to_string(),
                temperature: obs.temperature.to_string(),
                notes: obs.completeness.clone(),
            })
            .collect(),
        root_cause_analysis: input.analysis.root_cause_analysis.clone(),
        severity_assessment: input.analysis.severity_assessment.clone(),
        recommended_actions: vec!["Contact professional for detailed assessment".to_string()],
        additional_notes: format!("Report generation encountered parsing error: {}", error),
        missing_information: input.data_gaps.clone(),
        metadata: None,
    }
}
