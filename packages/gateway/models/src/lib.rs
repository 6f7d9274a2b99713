#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! JSON wire types for the road-risk prediction API.
//!
//! These mirror the snake_case payloads the API emits. They are kept
//! separate from the domain types in [`road_risk_models`] so the wire
//! contract can drift (extra fields, aliases, missing optionals) without
//! leaking into the map controller. Conversions validate ranges and
//! report what was wrong as a [`PayloadError`].

use road_risk_models::{Explanation, HeatmapPoint, PredictionResult, Recommendation, RiskLevel};
use serde::{Deserialize, Deserializer, Serialize};

/// One element of `GET /risk_heatmap_clustered`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHeatmapPoint {
    /// Cluster centre latitude.
    pub lat: f64,
    /// Cluster centre longitude.
    pub lon: f64,
    /// Risk intensity, expected in `[0, 1]`.
    pub intensity: f64,
    /// Accident records in the cluster.
    #[serde(default)]
    pub accident_count: u64,
    /// Casualties across the cluster.
    #[serde(default)]
    pub total_casualties: u64,
    /// Severity label. Older servers only send `risk_level`.
    #[serde(default, alias = "risk_level")]
    pub severity_label: String,
}

impl TryFrom<ApiHeatmapPoint> for HeatmapPoint {
    type Error = PayloadError;

    fn try_from(point: ApiHeatmapPoint) -> Result<Self, Self::Error> {
        if !point.lat.is_finite() || !(-90.0..=90.0).contains(&point.lat) {
            return Err(PayloadError::new(format!("latitude {} out of range", point.lat)));
        }
        if !point.lon.is_finite() || !(-180.0..=180.0).contains(&point.lon) {
            return Err(PayloadError::new(format!("longitude {} out of range", point.lon)));
        }
        if !unit_interval(point.intensity) {
            return Err(PayloadError::new(format!(
                "intensity {} outside [0, 1]",
                point.intensity
            )));
        }

        Ok(Self {
            latitude: point.lat,
            longitude: point.lon,
            intensity: point.intensity,
            accident_count: point.accident_count,
            total_casualties: point.total_casualties,
            severity_label: point.severity_label,
        })
    }
}

/// Response body of `POST /predict_location`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiPrediction {
    /// `"Low"`, `"Medium"`, or `"High"`.
    pub risk_level: RiskLevel,
    /// Model confidence, expected in `[0, 1]`.
    pub risk_score: f64,
    /// Optional narrative explanation.
    #[serde(default)]
    pub explanation: Option<ApiExplanation>,
    /// Optional recommended actions.
    #[serde(default)]
    pub recommendation: Option<ApiRecommendation>,
}

/// `explanation` object of a prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiExplanation {
    /// Narrative summary. The API sends `[]` or a list of sentences when
    /// the explanation agent produced no single string.
    #[serde(default, deserialize_with = "lenient_text")]
    pub risk_summary: Option<String>,
    /// Contributing factors.
    #[serde(default)]
    pub primary_drivers: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrList {
    Text(String),
    List(Vec<String>),
}

/// Accepts a string, a list of strings (joined with a space), or null.
/// Blank results become `None`.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Option::<TextOrList>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(TextOrList::Text(text)) => text,
        Some(TextOrList::List(parts)) => parts.join(" "),
    };
    let text = text.trim();

    Ok((!text.is_empty()).then(|| text.to_string()))
}

/// `recommendation` object of a prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRecommendation {
    /// Suggested actions.
    #[serde(default)]
    pub recommended_actions: Vec<String>,
}

impl TryFrom<ApiPrediction> for PredictionResult {
    type Error = PayloadError;

    fn try_from(prediction: ApiPrediction) -> Result<Self, Self::Error> {
        if !unit_interval(prediction.risk_score) {
            return Err(PayloadError::new(format!(
                "risk_score {} outside [0, 1]",
                prediction.risk_score
            )));
        }

        Ok(Self {
            risk_level: prediction.risk_level,
            risk_score: prediction.risk_score,
            explanation: prediction.explanation.map(|e| Explanation {
                risk_summary: e.risk_summary,
                primary_drivers: e.primary_drivers,
            }),
            recommendation: prediction.recommendation.map(|r| Recommendation {
                recommended_actions: r.recommended_actions,
            }),
        })
    }
}

/// Response body of `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiStatus {
    /// Human-readable service banner.
    pub message: String,
}

/// A payload that parsed as JSON but violates the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadError {
    /// What was wrong.
    pub message: String,
}

impl PayloadError {
    fn new(message: String) -> Self {
        Self { message }
    }
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid payload: {}", self.message)
    }
}

impl std::error::Error for PayloadError {}

fn unit_interval(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}
