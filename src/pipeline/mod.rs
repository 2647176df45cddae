//! The four-stage DDR pipeline.
//!
//! 1. Extract observations from each document (one model call each)
//! 2. Merge observations by area and flag conflicts (local)
//! 3. Root cause and severity reasoning (one model call)
//! 4. Client-facing report generation (one model call)
//!
//! Stages run strictly in sequence; each depends on the previous output.

pub mod extract;
pub mod generate;
pub mod merge;
pub mod prompts;
pub mod reasoning;
pub mod response;

pub use extract::extract_observations;
pub use generate::generate_ddr;
pub use merge::{merge_observations, MergeOutcome};
pub use reasoning::analyze_root_cause;

use crate::llm::ModelClient;
use crate::models::{DdrReport, MergedObservation, SourceType};
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Options controlling pipeline presentation.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Show a spinner while waiting on the model.
    pub show_progress: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            show_progress: true,
        }
    }
}

/// Everything produced by one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// The final report.
    pub report: DdrReport,
    /// Stage 2 output, one entry per area.
    pub merged: Vec<MergedObservation>,
    /// Observations extracted from the inspection document.
    pub inspection_count: usize,
    /// Observations extracted from the thermal document.
    pub thermal_count: usize,
    /// Areas flagged with a conflict.
    pub conflicts: usize,
}

/// Runs the four stages against one model client.
pub struct DdrPipeline {
    client: Arc<dyn ModelClient>,
    options: PipelineOptions,
}

impl DdrPipeline {
    pub fn new(client: Arc<dyn ModelClient>, options: PipelineOptions) -> Self {
        info!(
            "Initializing pipeline with {} model {}",
            client.provider_name(),
            client.model_name()
        );
        Self { client, options }
    }

    /// Run the complete pipeline on the two document texts.
    pub async fn process(&self, inspection_text: &str, thermal_text: &str) -> Result<PipelineOutput> {
        info!("STARTING DDR GENERATION PIPELINE");
        let client = self.client.as_ref();

        let inspection = self
            .with_spinner(
                "Stage 1/4: extracting inspection observations",
                extract_observations(client, inspection_text, SourceType::Inspection),
            )
            .await?;

        let thermal = self
            .with_spinner(
                "Stage 1/4: extracting thermal observations",
                extract_observations(client, thermal_text, SourceType::Thermal),
            )
            .await?;

        let MergeOutcome {
            observations: merged,
            conflicts,
        } = merge_observations(&inspection, &thermal);

        let analysis = self
            .with_spinner(
                "Stage 3/4: analyzing root cause and severity",
                analyze_root_cause(client, &merged),
            )
            .await?;

        let report = self
            .with_spinner(
                "Stage 4/4: generating report",
                generate_ddr(client, &merged, &analysis),
            )
            .await?;

        info!("PIPELINE COMPLETED SUCCESSFULLY");

        Ok(PipelineOutput {
            report,
            merged,
            inspection_count: inspection.len(),
            thermal_count: thermal.len(),
            conflicts,
        })
    }

    /// Await `stage`, showing a spinner with `message` when enabled.
    async fn with_spinner<T, F>(&self, message: &str, stage: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if !self.options.show_progress {
            return stage.await;
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));

        let result = stage.await;
        pb.finish_and_clear();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedClient;
    use crate::models::{DataCompleteness, SeverityLevel};

    const INSPECTION: &str = include_str!("../../fixtures/inspection_report.txt");
    const THERMAL: &str = include_str!("../../fixtures/thermal_report.txt");

    const INSPECTION_RESPONSE: &str = r#"```json
{"observations": [
  {"area": "Living Room", "issue_description": "Water stains observed on ceiling near northwest corner", "temperature_reading": "Not Available", "evidence_source": "Water stains observed", "confidence": "high"},
  {"area": "Bedroom", "issue_description": "Minor crack in wall near window", "temperature_reading": "Not Available", "evidence_source": "Minor crack", "confidence": "medium"},
  {"area": "Roof", "issue_description": "Several shingles missing on south-facing slope", "temperature_reading": "Not Available", "evidence_source": "Several shingles missing", "confidence": "high"}
]}
```"#;

    const THERMAL_RESPONSE: &str = r#"{"observations": [
  {"area": "Living Room Ceiling", "issue_description": "Thermal anomaly detected in northwest corner", "temperature_reading": "72°F", "evidence_source": "Thermal anomaly detected: 72°F", "confidence": "high"},
  {"area": "Bedroom Walls", "issue_description": "No thermal anomalies detected", "temperature_reading": "67°F (normal)", "evidence_source": "No thermal anomalies", "confidence": "high"},
  {"area": "Roof Inspection", "issue_description": "Missing shingle area showing heat loss", "temperature_reading": "62°F", "evidence_source": "Missing shingle area showing 62°F", "confidence": "high"}
]}"#;

    const ANALYSIS_RESPONSE: &str = r#"{
  "property_issue_summary": "Moisture intrusion in the living room ceiling and missing roof shingles.",
  "root_cause_analysis": "Missing shingles allow water penetration that reaches the living room ceiling.",
  "severity_assessment": {"level": "Medium", "reasoning": "Active moisture with potential for escalation."}
}"#;

    const REPORT_RESPONSE: &str = r#"{
  "property_issue_summary": "Moisture intrusion in the living room ceiling and missing roof shingles.",
  "area_wise_observations": [
    {"area": "Living Room", "description": "Water stains and a thermal anomaly", "temperature": "72°F", "notes": ""},
    {"area": "Bedroom", "description": "Minor wall crack", "temperature": "67°F (normal)", "notes": ""},
    {"area": "Roof", "description": "Missing shingles with heat loss", "temperature": "62°F", "notes": ""}
  ],
  "root_cause_analysis": "Missing shingles allow water penetration.",
  "severity_assessment": {"level": "Medium", "reasoning": "Active moisture."},
  "recommended_actions": ["Replace missing shingles", "Repair ceiling after drying"],
  "additional_notes": "No conflicts detected.",
  "missing_information": []
}"#;

    fn pipeline(client: Arc<ScriptedClient>) -> DdrPipeline {
        DdrPipeline::new(
            client,
            PipelineOptions {
                show_progress: false,
            },
        )
    }

    #[tokio::test]
    async fn test_process_runs_four_stages_in_order() {
        let client = Arc::new(ScriptedClient::new([
            INSPECTION_RESPONSE,
            THERMAL_RESPONSE,
            ANALYSIS_RESPONSE,
            REPORT_RESPONSE,
        ]));

        let output = pipeline(client.clone())
            .process(INSPECTION, THERMAL)
            .await
            .unwrap();

        let prompts = client.prompts();
        assert_eq!(prompts.len(), 4);
        assert!(prompts[0].contains("DOCUMENT TYPE: Inspection Report"));
        assert!(prompts[0].contains("Water stains observed on ceiling"));
        assert!(prompts[1].contains("DOCUMENT TYPE: Thermal Report"));
        assert!(prompts[1].contains("THERMAL IMAGING REPORT"));
        assert!(prompts[2].contains("MERGED OBSERVATIONS:"));
        assert!(prompts[3].contains("INPUT DATA:"));
        assert!(prompts[3].contains("Missing shingles allow water penetration"));

        assert_eq!(output.inspection_count, 3);
        assert_eq!(output.thermal_count, 3);
        assert_eq!(output.conflicts, 0);
        assert_eq!(output.report.severity_assessment.level, SeverityLevel::Medium);
        assert_eq!(output.report.recommended_actions.len(), 2);
    }

    #[tokio::test]
    async fn test_process_merges_fixture_areas() {
        let client = Arc::new(ScriptedClient::new([
            INSPECTION_RESPONSE,
            THERMAL_RESPONSE,
            ANALYSIS_RESPONSE,
            REPORT_RESPONSE,
        ]));

        let output = pipeline(client).process(INSPECTION, THERMAL).await.unwrap();

        let areas: Vec<&str> = output.merged.iter().map(|m| m.area.as_str()).collect();
        assert_eq!(areas, vec!["living room", "bedroom", "roof"]);
        assert!(output
            .merged
            .iter()
            .all(|m| m.data_completeness == DataCompleteness::Complete));
        assert_eq!(output.merged[0].temperature_reading, "72°F");
    }

    #[tokio::test]
    async fn test_unparseable_extractions_still_produce_a_report() {
        let client = Arc::new(ScriptedClient::new([
            "Sorry, I cannot help with that.",
            "Sorry, I cannot help with that.",
            "still not json",
            "nor this",
        ]));

        let output = pipeline(client.clone())
            .process(INSPECTION, THERMAL)
            .await
            .unwrap();

        assert_eq!(client.prompts().len(), 4);
        assert!(output.merged.is_empty());
        assert_eq!(
            output.report.property_issue_summary,
            "Error generating report"
        );
        assert_eq!(
            output.report.severity_assessment.reasoning,
            "Analysis could not be completed"
        );
    }

    #[tokio::test]
    async fn test_free_form_severity_survives_all_stages() {
        let client = Arc::new(ScriptedClient::new([
            INSPECTION_RESPONSE,
            THERMAL_RESPONSE,
            r#"{"property_issue_summary": "s", "root_cause_analysis": "r",
                "severity_assessment": {"level": "Critical", "reasoning": "Structural risk"}}"#,
            r#"{"property_issue_summary": "Roof failure.",
                "severity_assessment": {"level": "High - immediate", "reasoning": "Structural risk"},
                "recommended_actions": ["Tarp the roof"]}"#,
        ]));

        let output = pipeline(client.clone())
            .process(INSPECTION, THERMAL)
            .await
            .unwrap();

        assert!(client.prompts()[3].contains("\"level\": \"Critical\""));
        let severity = &output.report.severity_assessment;
        assert_eq!(severity.label, "High - immediate");
        assert_eq!(severity.level, SeverityLevel::High);

        let json = crate::report::generate_json_report(&output.report).unwrap();
        assert!(json.contains("\"level\": \"High - immediate\""));
    }

    #[tokio::test]
    async fn test_model_failure_stops_pipeline() {
        let client = Arc::new(ScriptedClient::new([INSPECTION_RESPONSE]));

        let result = pipeline(client.clone()).process(INSPECTION, THERMAL).await;

        assert!(result.is_err());
        assert_eq!(client.prompts().len(), 2);
    }
}
