//! Prediction payload and its display formatting.
//!
//! The formatter is a pure function from a [`PredictionResult`] to the lines
//! shown in an assistant message. It has no side effects, which is what makes
//! it the natural unit for property-style testing.

use serde::{Deserialize, Serialize};

/// Placeholder shown when a prediction carries no usable precautions.
pub const NO_PRECAUTIONS_PLACEHOLDER: &str = "No specific precautions available";

/// The backend's structured disease inference for a symptom description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// The free-text input the prediction was made for, when echoed back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_input: Option<String>,
    /// The predicted disease label.
    pub predicted_disease: String,
    /// Model confidence in `[0, 1]`, absent when the model cannot provide one.
    pub probability: Option<f64>,
    /// Symptoms from the input that matched the model's vocabulary.
    #[serde(default)]
    pub matched_symptoms: Vec<String>,
    /// Recommended precautions, filled in from the disease-details lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precautions: Option<Vec<String>>,
}

/// Display fragment for a prediction, one field per rendered line.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionDisplay {
    /// Headline naming the predicted disease.
    pub headline: String,
    /// Confidence line, absent when the payload has no probability.
    pub confidence: Option<String>,
    /// Comma-joined matched symptoms, absent when none matched.
    pub matched_symptoms: Option<String>,
    /// Precaution lines with blank entries dropped; never empty (a single
    /// placeholder line substitutes when nothing usable remains).
    pub precautions: Vec<String>,
}

impl PredictionDisplay {
    /// Flattens the fragment into the text body of an assistant message.
    pub fn to_text(&self) -> String {
        let mut lines = vec![self.headline.clone()];
        if let Some(confidence) = &self.confidence {
            lines.push(confidence.clone());
        }
        if let Some(matched) = &self.matched_symptoms {
            lines.push(matched.clone());
        }
        lines.push("Precautions:".to_string());
        for precaution in &self.precautions {
            lines.push(format!("- {}", precaution));
        }
        lines.join("\n")
    }
}

/// Formats a prediction for display.
///
/// - probability is rendered as a percentage with one decimal place,
/// - matched symptoms are comma-joined,
/// - blank or whitespace-only precautions are dropped; when the remaining
///   list is empty, a single placeholder line is substituted.
pub fn format_prediction(prediction: &PredictionResult) -> PredictionDisplay {
    let headline = format!(
        "Based on your symptoms, I predict: {}",
        prediction.predicted_disease
    );

    let confidence = prediction
        .probability
        .map(|p| format!("Confidence: {:.1}%", p * 100.0));

    let matched_symptoms = if prediction.matched_symptoms.is_empty() {
        None
    } else {
        Some(format!(
            "Matched symptoms: {}",
            prediction.matched_symptoms.join(", ")
        ))
    };

    let mut precautions: Vec<String> = prediction
        .precautions
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .filter(|p| !p.trim().is_empty())
        .map(|p| p.trim().to_string())
        .collect();
    if precautions.is_empty() {
        precautions.push(NO_PRECAUTIONS_PLACEHOLDER.to_string());
    }

    PredictionDisplay {
        headline,
        confidence,
        matched_symptoms,
        precautions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(probability: Option<f64>) -> PredictionResult {
        PredictionResult {
            user_input: Some("I have fever, cough, and headache".to_string()),
            predicted_disease: "Flu".to_string(),
            probability,
            matched_symptoms: vec![
                "fever".to_string(),
                "cough".to_string(),
                "headache".to_string(),
            ],
            precautions: Some(vec![
                "rest".to_string(),
                "hydrate".to_string(),
                "".to_string(),
            ]),
        }
    }

    #[test]
    fn test_full_prediction_rendering() {
        let display = format_prediction(&prediction(Some(0.87)));

        assert_eq!(display.headline, "Based on your symptoms, I predict: Flu");
        assert_eq!(display.confidence.as_deref(), Some("Confidence: 87.0%"));
        assert_eq!(
            display.matched_symptoms.as_deref(),
            Some("Matched symptoms: fever, cough, headache")
        );
        assert_eq!(display.precautions, vec!["rest", "hydrate"]);
    }

    #[test]
    fn test_confidence_rounds_to_one_decimal() {
        let display = format_prediction(&prediction(Some(0.8765)));
        assert_eq!(display.confidence.as_deref(), Some("Confidence: 87.7%"));

        let display = format_prediction(&prediction(Some(1.0)));
        assert_eq!(display.confidence.as_deref(), Some("Confidence: 100.0%"));
    }

    #[test]
    fn test_missing_probability_omits_confidence() {
        let display = format_prediction(&prediction(None));
        assert!(display.confidence.is_none());
    }

    #[test]
    fn test_no_matched_symptoms_omits_line() {
        let mut p = prediction(Some(0.5));
        p.matched_symptoms.clear();
        let display = format_prediction(&p);
        assert!(display.matched_symptoms.is_none());
    }

    #[test]
    fn test_blank_precautions_are_dropped() {
        let mut p = prediction(None);
        p.precautions = Some(vec![
            "  rest  ".to_string(),
            "   ".to_string(),
            "\t".to_string(),
        ]);
        let display = format_prediction(&p);
        assert_eq!(display.precautions, vec!["rest"]);
    }

    #[test]
    fn test_all_blank_precautions_yield_placeholder() {
        let mut p = prediction(None);
        p.precautions = Some(vec!["".to_string(), "   ".to_string()]);
        let display = format_prediction(&p);
        assert_eq!(display.precautions, vec![NO_PRECAUTIONS_PLACEHOLDER]);
    }

    #[test]
    fn test_absent_precautions_yield_placeholder() {
        let mut p = prediction(None);
        p.precautions = None;
        let display = format_prediction(&p);
        assert_eq!(display.precautions, vec![NO_PRECAUTIONS_PLACEHOLDER]);
    }

    #[test]
    fn test_to_text_contains_all_lines() {
        let text = format_prediction(&prediction(Some(0.87))).to_text();
        assert!(text.contains("Flu"));
        assert!(text.contains("87.0%"));
        assert!(text.contains("fever, cough, headache"));
        assert!(text.contains("- rest"));
        assert!(text.contains("- hydrate"));
    }

    #[test]
    fn test_wire_roundtrip_preserves_optional_fields() {
        let p = prediction(Some(0.87));
        let json = serde_json::to_string(&p).unwrap();
        let back: PredictionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);

        // A payload straight from the predict endpoint has no precautions.
        let wire = r#"{"user_input":"x","predicted_disease":"Flu","probability":null,"matched_symptoms":[]}"#;
        let parsed: PredictionResult = serde_json::from_str(wire).unwrap();
        assert!(parsed.precautions.is_none());
        assert!(parsed.probability.is_none());
    }
}
