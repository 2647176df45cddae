//! Data models for the diagnostic report pipeline.
//!
//! This module contains the structures passed between pipeline stages:
//! raw observations, merged per-area observations, the root cause
//! analysis and the final client-facing report.

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Placeholder written wherever a document or the model gave no data.
pub const NOT_AVAILABLE: &str = "Not Available";

/// Which input document an observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    /// Visual inspection report
    Inspection,
    /// Thermal-imaging report
    Thermal,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Inspection => write!(f, "Inspection Report"),
            SourceType::Thermal => write!(f, "Thermal Report"),
        }
    }
}

/// Severity level assigned by the root cause analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SeverityLevel {
    /// The model gave no usable level
    #[default]
    NotAvailable,
    /// Minor issue, cosmetic, or routine maintenance
    Low,
    /// Significant issue requiring prompt attention
    Medium,
    /// Immediate safety risk, structural damage, or major system failure
    High,
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl SeverityLevel {
    /// Returns the label used in reports and JSON.
    pub fn label(&self) -> &'static str {
        match self {
            SeverityLevel::NotAvailable => NOT_AVAILABLE,
            SeverityLevel::Low => "Low",
            SeverityLevel::Medium => "Medium",
            SeverityLevel::High => "High",
        }
    }

    /// Returns an emoji representation of the severity.
    pub fn emoji(&self) -> &'static str {
        match self {
            SeverityLevel::NotAvailable => "⚪",
            SeverityLevel::Low => "🟢",
            SeverityLevel::Medium => "🟡",
            SeverityLevel::High => "🔴",
        }
    }
}

impl From<&str> for SeverityLevel {
    /// Level named by the first recognized word of a free-form label.
    ///
    /// "High - immediate" is `High`, "Critical" is `High`, "Moderate" is
    /// `Medium`. Labels without a recognized word are `NotAvailable`.
    fn from(s: &str) -> Self {
        s.split(|c: char| !c.is_alphabetic())
            .filter(|word| !word.is_empty())
            .find_map(|word| match word.to_lowercase().as_str() {
                "low" | "minor" => Some(SeverityLevel::Low),
                "medium" | "moderate" => Some(SeverityLevel::Medium),
                "high" | "critical" | "severe" | "urgent" => Some(SeverityLevel::High),
                _ => None,
            })
            .unwrap_or(SeverityLevel::NotAvailable)
    }
}

/// A single observation extracted from one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Location or area named by the document.
    pub area: String,
    /// Issue text as stated in the document.
    pub issue_description: String,
    /// Temperature reading, or "Not Available".
    pub temperature_reading: String,
    /// Source-prefixed quote or reference.
    pub evidence_source: String,
    /// high/medium/low, as judged by the model.
    pub confidence: String,
}

/// How much data backs a merged observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataCompleteness {
    #[serde(rename = "Complete")]
    Complete,
    #[serde(rename = "Only thermal data available")]
    OnlyThermal,
    #[serde(rename = "No thermal data available")]
    NoThermal,
    #[serde(rename = "Temperature data missing")]
    TemperatureMissing,
}

impl fmt::Display for DataCompleteness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DataCompleteness::Complete => "Complete",
            DataCompleteness::OnlyThermal => "Only thermal data available",
            DataCompleteness::NoThermal => "No thermal data available",
            DataCompleteness::TemperatureMissing => "Temperature data missing",
        };
        f.write_str(text)
    }
}

impl DataCompleteness {
    /// Whether this state is reported to the model as a data gap.
    pub fn is_gap(&self) -> bool {
        let text = self.to_string().to_lowercase();
        text.contains("missing") || text.contains("not available")
    }
}

/// Observation for one area after reconciling both documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedObservation {
    pub area: String,
    pub combined_issue: String,
    pub temperature_reading: String,
    pub conflict_detected: bool,
    pub conflict_reason: String,
    pub data_completeness: DataCompleteness,
}

/// Severity level with the model's reasoning.
///
/// `label` is kept exactly as the model wrote it and is what gets
/// serialized and rendered; `level` is derived from it for thresholds
/// and badges.
#[derive(Debug, Clone, PartialEq)]
pub struct SeverityAssessment {
    pub level: SeverityLevel,
    pub label: String,
    pub reasoning: String,
}

impl SeverityAssessment {
    pub fn new(label: impl Into<String>, reasoning: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            level: SeverityLevel::from(label.as_str()),
            label,
            reasoning: reasoning.into(),
        }
    }

    /// False when the label names no known level.
    pub fn is_recognized(&self) -> bool {
        self.level != SeverityLevel::NotAvailable
            || self.label.trim().eq_ignore_ascii_case(NOT_AVAILABLE)
    }
}

impl Default for SeverityAssessment {
    fn default() -> Self {
        Self::new(NOT_AVAILABLE, NOT_AVAILABLE)
    }
}

impl Serialize for SeverityAssessment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SeverityAssessment", 2)?;
        state.serialize_field("level", &self.label)?;
        state.serialize_field("reasoning", &self.reasoning)?;
        state.end()
    }
}

/// Accepts an object, a bare label string, or anything else as the default.
impl<'de> Deserialize<'de> for SeverityAssessment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Object(fields)) => {
                let label = fields
                    .get("level")
                    .and_then(scalar_to_string)
                    .filter(|label| !label.trim().is_empty())
                    .unwrap_or_else(not_available);
                let reasoning = fields
                    .get("reasoning")
                    .and_then(scalar_to_string)
                    .unwrap_or_else(not_available);
                SeverityAssessment::new(label, reasoning)
            }
            Some(Value::String(label)) if !label.trim().is_empty() => {
                SeverityAssessment::new(label, NOT_AVAILABLE)
            }
            _ => SeverityAssessment::default(),
        })
    }
}

/// Output of the root cause stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootCauseAnalysis {
    #[serde(default = "not_available", deserialize_with = "lenient_text")]
    pub property_issue_summary: String,
    #[serde(default = "not_available", deserialize_with = "lenient_text")]
    pub root_cause_analysis: String,
    #[serde(default)]
    pub severity_assessment: SeverityAssessment,
}

/// One area entry in the final report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaObservation {
    #[serde(default = "unknown_area", deserialize_with = "lenient_text")]
    pub area: String,
    #[serde(default = "not_available", deserialize_with = "lenient_text")]
    pub description: String,
    #[serde(default = "not_available", deserialize_with = "lenient_text")]
    pub temperature: String,
    /// Empty when the model had nothing to add.
    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub notes: String,
}

/// Metadata about how a report was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Name of the model used.
    pub model_used: String,
    /// Model provider (gemini, ollama).
    pub provider: String,
    /// Path of the inspection document.
    pub inspection_source: String,
    /// Path of the thermal document.
    pub thermal_source: String,
    /// Observations extracted from the inspection document.
    pub inspection_observations: usize,
    /// Observations extracted from the thermal document.
    pub thermal_observations: usize,
    /// Number of distinct areas after merging.
    pub merged_areas: usize,
    /// Number of temperature/description contradictions flagged.
    pub conflicts_detected: usize,
    /// Wall-clock duration of the pipeline in seconds.
    pub duration_seconds: f64,
}

/// The Detailed Diagnostic Report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DdrReport {
    #[serde(default = "not_available", deserialize_with = "lenient_text")]
    pub property_issue_summary: String,
    #[serde(default, deserialize_with = "lenient_areas")]
    pub area_wise_observations: Vec<AreaObservation>,
    #[serde(default = "not_available", deserialize_with = "lenient_text")]
    pub root_cause_analysis: String,
    #[serde(default)]
    pub severity_assessment: SeverityAssessment,
    #[serde(default, deserialize_with = "lenient_list")]
    pub recommended_actions: Vec<String>,
    #[serde(default = "no_notes", deserialize_with = "lenient_text")]
    pub additional_notes: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub missing_information: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ReportMetadata>,
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

fn unknown_area() -> String {
    "Unknown Area".to_string()
}

fn no_notes() -> String {
    "None".to_string()
}

/// Render a JSON scalar as text; `None` for null, arrays and objects.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(scalar_to_string)
        .unwrap_or_else(not_available))
}

fn lenient_optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_to_string).unwrap_or_default())
}

/// Keeps the object entries of a list; anything else is dropped.
fn lenient_areas<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<AreaObservation>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter(|item| item.is_object())
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Accepts a list of scalars, a single string, or null.
fn lenient_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    })
}
