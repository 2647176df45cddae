//! Stage 1: structured observation extraction.

use super::prompts::EXTRACTION_PROMPT;
use super::response::{clean_json_response, preview};
use crate::llm::ModelClient;
use crate::models::{scalar_to_string, Observation, SourceType, NOT_AVAILABLE};
use anyhow::Result;
use serde_json::Value;
use tracing::{info, warn};

/// Build the extraction prompt for one document.
pub fn build_extraction_prompt(document_text: &str, source: SourceType) -> String {
    format!(
        "{}\n\nDOCUMENT TYPE: {}\n\nDOCUMENT CONTENT:\n{}",
        EXTRACTION_PROMPT, source, document_text
    )
}

/// Extract observations from a single document.
///
/// A response that is not valid JSON yields an empty list; transport
/// errors are returned.
pub async fn extract_observations(
    client: &dyn ModelClient,
    document_text: &str,
    source: SourceType,
) -> Result<Vec<Observation>> {
    info!("STAGE 1: Extracting from {}", source);

    let prompt = build_extraction_prompt(document_text, source);
    let response = client.generate(&prompt).await?;

    let observations = parse_observations(&response, source);
    info!(
        "Extracted {} observations from {}",
        observations.len(),
        source
    );

    Ok(observations)
}

/// Parse the model's extraction response.
pub fn parse_observations(response: &str, source: SourceType) -> Vec<Observation> {
    let cleaned = clean_json_response(response);

    let data: Value = match serde_json::from_str(cleaned) {
        Ok(v) => v,
        Err(e) => {
            warn!("JSON parsing error: {}", e);
            warn!("Response text: {}", preview(cleaned, 500));
            return Vec::new();
        }
    };

    let Some(items) = data.get("observations").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|item| item.is_object())
        .map(|item| json_to_observation(item, source))
        .collect()
}

fn json_to_observation(json: &Value, source: SourceType) -> Observation {
    let field = |key: &str, default: &str| {
        json.get(key)
            .and_then(scalar_to_string)
            .unwrap_or_else(|| default.to_string())
    };

    Observation {
        area: field("area", "Unknown"),
        issue_description: field("issue_description", NOT_AVAILABLE),
        temperature_reading: field("temperature_reading", NOT_AVAILABLE),
        evidence_source: format!("{}: {}", source, field("evidence_source", "N/A")),
        confidence: field("confidence", "medium"),
    }
}
