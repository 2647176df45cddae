//! Stage 2: merging observations across documents and flagging conflicts.
//!
//! Observations are grouped by a normalized area name. Each group yields
//! one [`MergedObservation`] with the combined issue text, the first usable
//! thermal reading, a conflict flag and a data completeness label.

use crate::models::{DataCompleteness, MergedObservation, Observation, NOT_AVAILABLE};
use std::collections::HashMap;
use tracing::info;

/// Area names that absorb any area text containing them, in match order.
const KNOWN_AREAS: [&str; 9] = [
    "living room",
    "bedroom",
    "kitchen",
    "bathroom",
    "roof",
    "basement",
    "attic",
    "exterior",
    "foundation",
];

/// Reason recorded for every temperature/description contradiction.
pub const CONFLICT_REASON: &str = "Temperature reading contradicts issue description";

/// Result of the merge stage.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// One entry per area, in order of first appearance.
    pub observations: Vec<MergedObservation>,
    /// Number of areas flagged with a conflict.
    pub conflicts: usize,
}

/// Observations for one area, split by source.
#[derive(Debug, Default)]
struct AreaGroup<'a> {
    area: String,
    inspection: Vec<&'a Observation>,
    thermal: Vec<&'a Observation>,
}

/// Normalize an area name for grouping.
pub fn normalize_area(area: &str) -> String {
    let normalized = area
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    KNOWN_AREAS
        .iter()
        .find(|key| normalized.contains(*key))
        .map(|key| key.to_string())
        .unwrap_or(normalized)
}

/// Merge inspection and thermal observations by area.
pub fn merge_observations(inspection: &[Observation], thermal: &[Observation]) -> MergeOutcome {
    info!("STAGE 2: Merging & Conflict Detection");

    let groups = group_by_area(inspection, thermal);

    let observations: Vec<MergedObservation> = groups.iter().map(merge_group).collect();
    let conflicts = observations.iter().filter(|o| o.conflict_detected).count();

    info!("Merged into {} unique areas", observations.len());
    info!("Detected {} conflicts", conflicts);

    MergeOutcome {
        observations,
        conflicts,
    }
}

/// Group observations by normalized area, keeping first-appearance order.
fn group_by_area<'a>(
    inspection: &'a [Observation],
    thermal: &'a [Observation],
) -> Vec<AreaGroup<'a>> {
    let mut groups: Vec<AreaGroup<'a>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    let tagged = inspection
        .iter()
        .map(|obs| (obs, true))
        .chain(thermal.iter().map(|obs| (obs, false)));

    for (obs, is_inspection) in tagged {
        let key = normalize_area(&obs.area);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(AreaGroup {
                area: key,
                ..AreaGroup::default()
            });
            groups.len() - 1
        });

        if is_inspection {
            groups[slot].inspection.push(obs);
        } else {
            groups[slot].thermal.push(obs);
        }
    }

    groups
}

fn merge_group(group: &AreaGroup<'_>) -> MergedObservation {
    let combined_issue = combine_issues(
        group
            .inspection
            .iter()
            .chain(group.thermal.iter())
            .map(|obs| obs.issue_description.as_str()),
    );

    let temperature_reading = group
        .thermal
        .iter()
        .map(|obs| obs.temperature_reading.as_str())
        .find(|reading| *reading != NOT_AVAILABLE)
        .unwrap_or(NOT_AVAILABLE)
        .to_string();

    let conflict_detected = detect_conflict(&combined_issue, &temperature_reading);

    let data_completeness = if group.inspection.is_empty() {
        DataCompleteness::OnlyThermal
    } else if group.thermal.is_empty() {
        DataCompleteness::NoThermal
    } else if temperature_reading == NOT_AVAILABLE {
        DataCompleteness::TemperatureMissing
    } else {
        DataCompleteness::Complete
    };

    MergedObservation {
        area: group.area.clone(),
        combined_issue,
        temperature_reading,
        conflict_detected,
        conflict_reason: if conflict_detected {
            CONFLICT_REASON.to_string()
        } else {
            String::new()
        },
        data_completeness,
    }
}

/// Join issue texts with ". ", dropping exact duplicates.
fn combine_issues<'a>(issues: impl Iterator<Item = &'a str>) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for issue in issues {
        if !seen.contains(&issue) {
            seen.push(issue);
        }
    }
    seen.join(". ")
}

/// Whether the thermal reading contradicts the issue text.
pub fn detect_conflict(combined_issue: &str, temperature_reading: &str) -> bool {
    if temperature_reading == NOT_AVAILABLE {
        return false;
    }

    let issue = combined_issue.to_lowercase();
    let reading = temperature_reading.to_lowercase();

    (issue.contains("high temperature") && reading.contains("normal"))
        || (issue.contains("cold") && reading.contains("high"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(area: &str, issue: &str, temperature: &str) -> Observation {
        Observation {
            area: area.to_string(),
            issue_description: issue.to_string(),
            temperature_reading: temperature.to_string(),
            evidence_source: "test".to_string(),
            confidence: "high".to_string(),
        }
    }

    #[test]
    fn test_normalize_known_areas() {
        assert_eq!(normalize_area("Living Room Ceiling"), "living room");
        assert_eq!(normalize_area("  Master BEDROOM  "), "bedroom");
        assert_eq!(normalize_area("Bedroom Walls"), "bedroom");
        assert_eq!(normalize_area("Roof inspection"), "roof");
        assert_eq!(normalize_area("Living   room"), "living room");
    }

    #[test]
    fn test_normalize_unknown_area() {
        assert_eq!(normalize_area("  Garage Door "), "garage door");
        assert_eq!(normalize_area("Hallway"), "hallway");
    }

    #[test]
    fn test_normalize_uses_first_matching_key() {
        // "bedroom" precedes "bathroom" in the vocabulary
        assert_eq!(normalize_area("Bedroom ensuite bathroom"), "bedroom");
        assert_eq!(normalize_area("Kitchen roof"), "kitchen");
    }

    #[test]
    fn test_groups_across_sources() {
        let inspection = vec![obs("Living Room", "Water stains on ceiling", NOT_AVAILABLE)];
        let thermal = vec![obs(
            "Living Room Ceiling",
            "Thermal anomaly in northwest corner",
            "72°F",
        )];

        let outcome = merge_observations(&inspection, &thermal);

        assert_eq!(outcome.observations.len(), 1);
        let merged = &outcome.observations[0];
        assert_eq!(merged.area, "living room");
        assert_eq!(
            merged.combined_issue,
            "Water stains on ceiling. Thermal anomaly in northwest corner"
        );
        assert_eq!(merged.temperature_reading, "72°F");
        assert_eq!(merged.data_completeness, DataCompleteness::Complete);
        assert!(!merged.conflict_detected);
        assert_eq!(merged.conflict_reason, "");
    }

    #[test]
    fn test_area_order_follows_first_appearance() {
        let inspection = vec![
            obs("Roof", "Missing shingles", NOT_AVAILABLE),
            obs("Kitchen", "Loose cabinet door", NOT_AVAILABLE),
        ];
        let thermal = vec![
            obs("Garage", "Heat loss at door", "55°F"),
            obs("Roof", "Heat loss", "62°F"),
        ];

        let outcome = merge_observations(&inspection, &thermal);
        let areas: Vec<&str> = outcome
            .observations
            .iter()
            .map(|o| o.area.as_str())
            .collect();
        assert_eq!(areas, vec!["roof", "kitchen", "garage"]);
    }

    #[test]
    fn test_duplicate_issue_text_is_collapsed() {
        let inspection = vec![
            obs("Bedroom", "Minor crack in wall", NOT_AVAILABLE),
            obs("bedroom", "Minor crack in wall", NOT_AVAILABLE),
        ];
        let thermal = vec![obs("Bedroom Walls", "Minor crack in wall", "67°F (normal)")];

        let outcome = merge_observations(&inspection, &thermal);
        assert_eq!(outcome.observations[0].combined_issue, "Minor crack in wall");
    }

    #[test]
    fn test_first_available_thermal_reading_wins() {
        let inspection = vec![obs("Roof", "Shingles missing", "40°F")];
        let thermal = vec![
            obs("Roof", "External reading", NOT_AVAILABLE),
            obs("Roof", "Heat loss", "62°F"),
            obs("Roof", "Ridge", "58°F"),
        ];

        let outcome = merge_observations(&inspection, &thermal);
        assert_eq!(outcome.observations[0].temperature_reading, "62°F");
    }

    #[test]
    fn test_inspection_temperature_is_ignored() {
        let inspection = vec![obs("Attic", "Hot spot", "110°F")];
        let outcome = merge_observations(&inspection, &[]);

        let merged = &outcome.observations[0];
        assert_eq!(merged.temperature_reading, NOT_AVAILABLE);
        assert_eq!(merged.data_completeness, DataCompleteness::NoThermal);
    }

    #[test]
    fn test_completeness_labels() {
        let inspection = vec![
            obs("Kitchen", "Cabinet door loose", NOT_AVAILABLE),
            obs("Living room", "Water stains", NOT_AVAILABLE),
        ];
        let thermal = vec![
            obs("Kitchen", "Reading unavailable", NOT_AVAILABLE),
            obs("Basement", "Cool spot", "60°F"),
        ];

        let outcome = merge_observations(&inspection, &thermal);
        let by_area: HashMap<&str, DataCompleteness> = outcome
            .observations
            .iter()
            .map(|o| (o.area.as_str(), o.data_completeness))
            .collect();

        assert_eq!(by_area["kitchen"], DataCompleteness::TemperatureMissing);
        assert_eq!(by_area["living room"], DataCompleteness::NoThermal);
        assert_eq!(by_area["basement"], DataCompleteness::OnlyThermal);
    }

    #[test]
    fn test_high_temperature_vs_normal_reading_conflicts() {
        let inspection = vec![obs("Attic", "High temperature near vents", NOT_AVAILABLE)];
        let thermal = vec![obs("Attic", "Reading taken", "70°F (Normal)")];

        let outcome = merge_observations(&inspection, &thermal);
        let merged = &outcome.observations[0];
        assert!(merged.conflict_detected);
        assert_eq!(merged.conflict_reason, CONFLICT_REASON);
        assert_eq!(outcome.conflicts, 1);
    }

    #[test]
    fn test_cold_vs_high_reading_conflicts() {
        let inspection = vec![obs("Bedroom", "Extremely cold wall on north side", NOT_AVAILABLE)];
        let thermal = vec![obs("Bedroom", "North wall", "High - 85°F")];

        let outcome = merge_observations(&inspection, &thermal);
        assert!(outcome.observations[0].conflict_detected);
    }

    #[test]
    fn test_hot_wording_is_not_a_conflict() {
        // Only the two fixed substring rules count.
        let inspection = vec![obs("Bedroom", "Extremely cold wall", NOT_AVAILABLE)];
        let thermal = vec![obs("Bedroom", "North wall", "85°F (very hot)")];

        let outcome = merge_observations(&inspection, &thermal);
        assert!(!outcome.observations[0].conflict_detected);
        assert_eq!(outcome.conflicts, 0);
    }

    #[test]
    fn test_no_conflict_without_reading() {
        assert!(!detect_conflict("cold draft, high temperature", NOT_AVAILABLE));
        assert!(detect_conflict("cold draft", "HIGH"));
        assert!(!detect_conflict("warm", "high"));
    }

    #[test]
    fn test_empty_inputs() {
        let outcome = merge_observations(&[], &[]);
        assert!(outcome.observations.is_empty());
        assert_eq!(outcome.conflicts, 0);
    }
}
