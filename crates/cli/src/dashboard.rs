//! Terminal rendition of the triage results dashboard.
//!
//! Reads the result mapping the same way a UI would: classification and
//! resolution are parsed as JSON objects with missing fields shown as `N/A`,
//! and the explanation is shown as-is.

use std::fmt;

use triage::{ClassificationResult, ResolutionResult, TaskName, TriageResults};

const CONFIDENCE_BAR_WIDTH: usize = 20;
const NO_EXPLANATION: &str = "No explanation available.";

/// Parsed, display-ready view of one set of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    classification: Result<ClassificationResult, String>,
    resolution: Result<ResolutionResult, String>,
    explanation: String,
}

impl Dashboard {
    pub fn from_results(results: &TriageResults) -> Self {
        // An absent entry reads as an empty object, so every field shows N/A.
        let classification = results.get(TaskName::Classification).unwrap_or("{}");
        let classification = ClassificationResult::from_json_lenient(classification)
            .map_err(|_| "Unable to process classification".to_string());
        let resolution = results.get(TaskName::Resolution).unwrap_or("{}");
        let resolution = ResolutionResult::from_json_lenient(resolution)
            .map_err(|_| "Unable to process resolution suggestion".to_string());
        let explanation = results
            .get(TaskName::Explanation)
            .unwrap_or(NO_EXPLANATION)
            .to_string();

        Self {
            classification,
            resolution,
            explanation,
        }
    }
}

fn confidence_bar(fraction: f64) -> String {
    let filled = (fraction * CONFIDENCE_BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(CONFIDENCE_BAR_WIDTH);
    format!(
        "[{}{}]",
        "#".repeat(filled),
        ".".repeat(CONFIDENCE_BAR_WIDTH - filled)
    )
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Classification ===")?;
        match &self.classification {
            Ok(c) => {
                writeln!(f, "Type:        {}", c.kind)?;
                writeln!(f, "Priority:    {}", c.priority)?;
                writeln!(f, "Complexity:  {}", c.complexity)?;
            }
            Err(message) => writeln!(f, "{message}")?,
        }

        writeln!(f)?;
        writeln!(f, "=== Resolution ===")?;
        match &self.resolution {
            Ok(r) => {
                writeln!(f, "Suggestion:  {}", r.suggestion)?;
                match r.confidence_fraction() {
                    Some(fraction) => {
                        writeln!(f, "Confidence:  {}  {}", r.confidence, confidence_bar(fraction))?
                    }
                    None => writeln!(f, "Confidence:  {}", r.confidence)?,
                }
                writeln!(f, "Rationale:   {}", r.rationale)?;
            }
            Err(message) => writeln!(f, "{message}")?,
        }

        writeln!(f)?;
        writeln!(f, "=== Explanation ===")?;
        writeln!(f, "{}", self.explanation)
    }
}
