#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Accident-risk domain types shared by the gateway client and the map
//! controller.
//!
//! Everything here is plain data: coordinates captured from map clicks,
//! spatially-clustered heatmap points, the severity buckets used to filter
//! them, and the prediction returned for a single location.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Intensity above which a heatmap point is considered high risk.
pub const HIGH_INTENSITY_THRESHOLD: f64 = 0.7;

/// Intensity above which a heatmap point is considered medium risk.
pub const MEDIUM_INTENSITY_THRESHOLD: f64 = 0.4;

/// A WGS84 location captured from a map click.
///
/// Immutable once constructed; use [`Coordinate::new`] to validate input
/// coming from outside the core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate, checking that both axes are finite and in
    /// range (latitude `[-90, 90]`, longitude `[-180, 180]`).
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCoordinateError`] if either value is out of range
    /// or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidCoordinateError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidCoordinateError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for Coordinate {
    /// Formats as `"lat, lon"` with four decimal places.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Error returned when a [`Coordinate`] is built from out-of-range values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvalidCoordinateError {
    /// Latitude outside `[-90, 90]` or not finite.
    Latitude(f64),
    /// Longitude outside `[-180, 180]` or not finite.
    Longitude(f64),
}

impl std::fmt::Display for InvalidCoordinateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latitude(value) => {
                write!(f, "invalid latitude {value}: expected -90 to 90")
            }
            Self::Longitude(value) => {
                write!(f, "invalid longitude {value}: expected -180 to 180")
            }
        }
    }
}

impl std::error::Error for InvalidCoordinateError {}

/// Spatial aggregation granularity (in degrees) for the clustered heatmap.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct GridSize(f64);

impl GridSize {
    /// Grid size used by the map view when none is configured.
    pub const DEFAULT: Self = Self(0.1);

    /// Creates a grid size.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidGridSizeError`] unless `degrees` is finite and
    /// strictly positive.
    pub fn new(degrees: f64) -> Result<Self, InvalidGridSizeError> {
        if degrees.is_finite() && degrees > 0.0 {
            Ok(Self(degrees))
        } else {
            Err(InvalidGridSizeError { value: degrees })
        }
    }

    /// Grid cell size in degrees.
    #[must_use]
    pub const fn degrees(self) -> f64 {
        self.0
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for GridSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a [`GridSize`] is not a positive finite number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidGridSizeError {
    /// The rejected value.
    pub value: f64,
}

impl std::fmt::Display for InvalidGridSizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid grid size {}: expected a positive number", self.value)
    }
}

impl std::error::Error for InvalidGridSizeError {}

/// A spatially-aggregated cluster of accident records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapPoint {
    /// Cluster centre latitude.
    pub latitude: f64,
    /// Cluster centre longitude.
    pub longitude: f64,
    /// Risk intensity in `[0, 1]`.
    pub intensity: f64,
    /// Number of accident records in the cluster.
    pub accident_count: u64,
    /// Total casualties across the cluster.
    pub total_casualties: u64,
    /// Server-assigned severity label (e.g. `"High"`).
    pub severity_label: String,
}

impl HeatmapPoint {
    /// The severity bucket this point falls in.
    #[must_use]
    pub fn bucket(&self) -> SeverityBucket {
        SeverityBucket::classify(self.intensity)
    }
}

/// A user-selected intensity range used to filter heatmap points.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SeverityBucket {
    /// No filtering.
    #[default]
    All,
    /// Intensity `<= 0.4`.
    Low,
    /// Intensity in `(0.4, 0.7]`.
    Medium,
    /// Intensity `> 0.7`.
    High,
}

impl SeverityBucket {
    /// Classifies an intensity into `Low`, `Medium`, or `High`.
    ///
    /// Boundaries belong to the lower bucket: `0.4` is `Low` and `0.7` is
    /// `Medium`.
    #[must_use]
    pub fn classify(intensity: f64) -> Self {
        if intensity > HIGH_INTENSITY_THRESHOLD {
            Self::High
        } else if intensity > MEDIUM_INTENSITY_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Whether a point with the given intensity is selected by this bucket.
    #[must_use]
    pub fn includes(self, intensity: f64) -> bool {
        self == Self::All || Self::classify(intensity) == self
    }

    /// Buttons in the order the filter panel shows them.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::All, Self::High, Self::Medium, Self::Low]
    }

    /// Button label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

/// Qualitative risk level of a prediction.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum RiskLevel {
    /// Low risk.
    Low,
    /// Medium risk.
    Medium,
    /// High risk.
    High,
}

impl RiskLevel {
    /// Colour used to style this level in reports.
    #[must_use]
    pub const fn color(self) -> RiskColor {
        match self {
            Self::Low => RiskColor::Green,
            Self::Medium => RiskColor::Amber,
            Self::High => RiskColor::Red,
        }
    }
}

/// The three-step palette shared by the legend, heatmap markers, and
/// reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskColor {
    /// `#10b981`
    Green,
    /// `#f59e0b`
    Amber,
    /// `#ef4444`
    Red,
}

impl RiskColor {
    /// Colour for a heatmap intensity, using the same thresholds as
    /// [`SeverityBucket::classify`].
    #[must_use]
    pub fn for_intensity(intensity: f64) -> Self {
        match SeverityBucket::classify(intensity) {
            SeverityBucket::High => Self::Red,
            SeverityBucket::Medium => Self::Amber,
            SeverityBucket::Low | SeverityBucket::All => Self::Green,
        }
    }

    /// CSS hex string.
    #[must_use]
    pub const fn hex(self) -> &'static str {
        match self {
            Self::Green => "#10b981",
            Self::Amber => "#f59e0b",
            Self::Red => "#ef4444",
        }
    }
}

/// Why the model assigned its risk level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    /// One-paragraph narrative summary, when the service produced one.
    pub risk_summary: Option<String>,
    /// Contributing factors, most important first.
    pub primary_drivers: Vec<String>,
}

/// Suggested mitigations for a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Actions in priority order.
    pub recommended_actions: Vec<String>,
}

/// A server-computed risk assessment for a single coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    /// Qualitative level.
    pub risk_level: RiskLevel,
    /// Model confidence in `[0, 1]`.
    pub risk_score: f64,
    /// Optional explanation.
    pub explanation: Option<Explanation>,
    /// Optional recommendations.
    pub recommendation: Option<Recommendation>,
}

impl PredictionResult {
    /// Confidence as a percentage with one decimal, e.g. `"82.0%"`.
    #[must_use]
    pub fn confidence_text(&self) -> String {
        format!("{:.1}%", self.risk_score * 100.0)
    }
}

/// Turns a model feature name such as `"Speed_limit"` into display text
/// (`"Speed limit"`).
#[must_use]
pub fn driver_label(driver: &str) -> String {
    driver.replace('_', " ")
}
