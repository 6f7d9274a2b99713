//! Map render model.
//!
//! [`MapSurface`] turns the heatmap point set, the active filter, and the
//! selection state into a [`Scene`]: one circle marker per visible point
//! and a pin for the selected coordinate. Marker icons are resolved once
//! when the surface is created. Clicks on the map enter through
//! [`MapSurface::on_click`].

use road_risk_models::{
    Coordinate, HeatmapPoint, InvalidCoordinateError, RiskColor, SeverityBucket,
};

use crate::MapConfig;
use crate::filter;
use crate::machine::SelectionState;

const ICON_BASE_URL: &str = "https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.7.1/images";

/// Smallest heatmap marker radius in pixels.
pub const MIN_MARKER_RADIUS: f64 = 5.0;
/// Radius multiplier applied to intensity.
pub const MARKER_RADIUS_SCALE: f64 = 15.0;

/// Image URLs for the selected-location pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerIcons {
    /// Standard resolution icon.
    pub icon_url: String,
    /// High-DPI icon.
    pub icon_retina_url: String,
    /// Drop shadow.
    pub shadow_url: String,
}

impl MarkerIcons {
    fn resolve() -> Self {
        Self {
            icon_url: format!("{ICON_BASE_URL}/marker-icon.png"),
            icon_retina_url: format!("{ICON_BASE_URL}/marker-icon-2x.png"),
            shadow_url: format!("{ICON_BASE_URL}/marker-shadow.png"),
        }
    }
}

/// Base tile layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayer {
    /// `{s}`/`{z}`/`{x}`/`{y}`/`{r}` URL template.
    pub url_template: String,
    /// Attribution HTML.
    pub attribution: String,
}

/// A heatmap cluster marker.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleMarker {
    /// Centre latitude.
    pub latitude: f64,
    /// Centre longitude.
    pub longitude: f64,
    /// Radius in pixels.
    pub radius: f64,
    /// Fill and stroke colour.
    pub color: RiskColor,
    /// Fill opacity.
    pub fill_opacity: f64,
    /// Stroke opacity.
    pub opacity: f64,
    /// Stroke weight in pixels.
    pub weight: u8,
    /// Popup content.
    pub popup: ClusterPopup,
}

/// Popup shown when a cluster marker is clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterPopup {
    /// Popup heading.
    pub title: &'static str,
    /// Accidents in the cluster.
    pub accident_count: u64,
    /// Casualties in the cluster.
    pub total_casualties: u64,
    /// Server severity label.
    pub severity_label: String,
}

/// The selected-location pin.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionMarker {
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Icon set.
    pub icons: MarkerIcons,
    /// Popup heading.
    pub popup_title: &'static str,
    /// Popup body.
    pub popup_body: String,
}

/// One frame of map content.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Visible heatmap markers, in point order.
    pub heatmap: Vec<CircleMarker>,
    /// Pin for the current selection.
    pub selection: Option<SelectionMarker>,
    /// Whether the map sits behind an expanded report.
    pub dimmed: bool,
}

/// Marker radius for an intensity: `max(5, intensity * 15)`.
#[must_use]
pub fn marker_radius(intensity: f64) -> f64 {
    (intensity * MARKER_RADIUS_SCALE).max(MIN_MARKER_RADIUS)
}

/// Static map configuration plus resolved icons.
#[derive(Debug, Clone)]
pub struct MapSurface {
    center: (f64, f64),
    zoom: u8,
    tiles: TileLayer,
    icons: MarkerIcons,
}

impl MapSurface {
    /// Sets up the surface from `config`, resolving marker icons.
    #[must_use]
    pub fn new(config: &MapConfig) -> Self {
        Self {
            center: config.center,
            zoom: config.zoom,
            tiles: TileLayer {
                url_template: config.tile_url.clone(),
                attribution: config.tile_attribution.clone(),
            },
            icons: MarkerIcons::resolve(),
        }
    }

    /// Initial `(latitude, longitude)` view centre.
    #[must_use]
    pub const fn center(&self) -> (f64, f64) {
        self.center
    }

    /// Initial zoom level.
    #[must_use]
    pub const fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Base tiles.
    #[must_use]
    pub const fn tiles(&self) -> &TileLayer {
        &self.tiles
    }

    /// Captures a click at `(latitude, longitude)` as the coordinate to
    /// analyse.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCoordinateError`] if the click lies outside the
    /// valid latitude/longitude range.
    pub fn on_click(latitude: f64, longitude: f64) -> Result<Coordinate, InvalidCoordinateError> {
        let coordinate = Coordinate::new(latitude, longitude)?;
        log::debug!("Map clicked at {coordinate}");
        Ok(coordinate)
    }

    /// Builds the scene for the current data and selection.
    #[must_use]
    pub fn render(
        &self,
        points: &[HeatmapPoint],
        bucket: SeverityBucket,
        show_heatmap: bool,
        state: &SelectionState,
    ) -> Scene {
        let heatmap = if show_heatmap {
            filter::visible(points, bucket).map(circle_marker).collect()
        } else {
            Vec::new()
        };

        Scene {
            heatmap,
            selection: self.selection_marker(state),
            dimmed: matches!(
                state,
                SelectionState::Resolved {
                    minimized: false,
                    ..
                }
            ),
        }
    }

    fn selection_marker(&self, state: &SelectionState) -> Option<SelectionMarker> {
        let coordinate = state.coordinate()?;
        let popup_body = match state {
            SelectionState::Resolved { prediction, .. } => format!(
                "{} risk ({})",
                prediction.risk_level,
                prediction.confidence_text()
            ),
            SelectionState::Failed { .. } => "Prediction unavailable".to_string(),
            SelectionState::Selecting { .. } | SelectionState::Idle => {
                "Analyzing risk...".to_string()
            }
        };

        Some(SelectionMarker {
            latitude: coordinate.latitude(),
            longitude: coordinate.longitude(),
            icons: self.icons.clone(),
            popup_title: "Selected Location",
            popup_body,
        })
    }
}

fn circle_marker(point: &HeatmapPoint) -> CircleMarker {
    CircleMarker {
        latitude: point.latitude,
        longitude: point.longitude,
        radius: marker_radius(point.intensity),
        color: RiskColor::for_intensity(point.intensity),
        fill_opacity: 0.6,
        opacity: 0.8,
        weight: 1,
        popup: ClusterPopup {
            title: "Accident Cluster",
            accident_count: point.accident_count,
            total_casualties: point.total_casualties,
            severity_label: if point.severity_label.is_empty() {
                point.bucket().label().to_string()
            } else {
                point.severity_label.clone()
            },
        },
    }
}
