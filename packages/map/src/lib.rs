#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Interactive accident-risk map controller.
//!
//! The crate is split so that everything except [`session`] is pure and
//! synchronous:
//!
//! - [`machine`]: selection lifecycle with request-token gating
//! - [`filter`]: severity bucket filtering of heatmap points
//! - [`view`]: panel layout derived from the selection state
//! - [`surface`]: markers and popups for the map itself
//! - [`notify`]: bounded toast queue
//! - [`session`]: [`RiskMap`], which owns all of the above and drives
//!   gateway calls on the Tokio runtime

pub mod filter;
pub mod machine;
pub mod notify;
pub mod session;
pub mod surface;
pub mod view;

use road_risk_models::GridSize;

pub use machine::{Failure, Phase, RequestToken, SelectionState, StaleResult};
pub use session::{MapEvent, RiskMap};

/// Initial view centre `(latitude, longitude)`.
pub const DEFAULT_CENTER: (f64, f64) = (20.5937, 78.9629);
/// Initial zoom level.
pub const DEFAULT_ZOOM: u8 = 5;
/// Dark base map tiles.
pub const DEFAULT_TILE_URL: &str = "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png";
/// Attribution for [`DEFAULT_TILE_URL`].
pub const DEFAULT_TILE_ATTRIBUTION: &str = "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors &copy; <a href=\"https://carto.com/attributions\">CARTO</a>";

/// What happens to an in-flight request when a newer one supersedes it.
///
/// The observable state is identical either way; the superseded reply is
/// discarded by token gating regardless.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CancelPolicy {
    /// Abort the superseded task.
    #[default]
    AbortSuperseded,
    /// Let it finish and discard its reply.
    LetRun,
}

/// Map controller configuration.
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Initial view centre `(latitude, longitude)`.
    pub center: (f64, f64),
    /// Initial zoom level.
    pub zoom: u8,
    /// Clustering cell size for heatmap loads.
    pub grid_size: GridSize,
    /// Base tile URL template.
    pub tile_url: String,
    /// Base tile attribution.
    pub tile_attribution: String,
    /// Handling of superseded requests.
    pub cancel_policy: CancelPolicy,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            grid_size: GridSize::DEFAULT,
            tile_url: DEFAULT_TILE_URL.to_string(),
            tile_attribution: DEFAULT_TILE_ATTRIBUTION.to_string(),
            cancel_policy: CancelPolicy::default(),
        }
    }
}

impl MapConfig {
    /// Reads overrides from `ROAD_RISK_GRID_SIZE` and
    /// `ROAD_RISK_CANCEL_SUPERSEDED`. Invalid values are logged and the
    /// default is used.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            grid_size: parse_grid_size(std::env::var("ROAD_RISK_GRID_SIZE").ok().as_deref()),
            cancel_policy: parse_cancel_policy(
                std::env::var("ROAD_RISK_CANCEL_SUPERSEDED").ok().as_deref(),
            ),
            ..Self::default()
        }
    }
}

fn parse_grid_size(value: Option<&str>) -> GridSize {
    let Some(value) = value else {
        return GridSize::DEFAULT;
    };

    match value.trim().parse::<f64>() {
        Ok(degrees) => GridSize::new(degrees).unwrap_or_else(|e| {
            log::warn!("Ignoring ROAD_RISK_GRID_SIZE: {e}");
            GridSize::DEFAULT
        }),
        Err(_) => {
            log::warn!("Ignoring ROAD_RISK_GRID_SIZE: '{value}' is not a number");
            GridSize::DEFAULT
        }
    }
}

fn parse_cancel_policy(value: Option<&str>) -> CancelPolicy {
    match value.map(|v| v.trim().to_lowercase()).as_deref() {
        None | Some("1" | "true" | "yes") => CancelPolicy::AbortSuperseded,
        Some("0" | "false" | "no") => CancelPolicy::LetRun,
        Some(other) => {
            log::warn!("Ignoring ROAD_RISK_CANCEL_SUPERSEDED: '{other}' is not a boolean");
            CancelPolicy::default()
        }
    }
}
