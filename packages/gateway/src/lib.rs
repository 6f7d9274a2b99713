#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Typed client for the road-risk prediction API.
//!
//! The map controller talks to the API only through the [`RiskGateway`]
//! trait: one call for the clustered heatmap, one for a point prediction,
//! and a status check. [`http::HttpGateway`] is the production
//! implementation. Calls never retry; retry policy belongs to the caller.

pub mod http;

use async_trait::async_trait;
use road_risk_models::{Coordinate, GridSize, HeatmapPoint, PredictionResult};
use thiserror::Error;

pub use http::HttpGateway;

/// Default API location when `ROAD_RISK_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Errors returned by gateway calls.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The API could not be reached (connection refused, DNS, timeout,
    /// body transfer interrupted).
    #[error("Network error: {message}")]
    Network {
        /// Transport error description.
        message: String,
    },

    /// The API answered, but with a non-success status or a body that
    /// does not match the contract.
    #[error("Response error: {message}")]
    Response {
        /// HTTP status, when one was received.
        status: Option<u16>,
        /// Description of what was wrong.
        message: String,
    },
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network {
            message: e.to_string(),
        }
    }
}

/// The two failure classes the map controller distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayErrorKind {
    /// See [`GatewayError::Network`].
    Network,
    /// See [`GatewayError::Response`].
    Response,
}

impl GatewayError {
    /// Which class of failure this is.
    #[must_use]
    pub const fn kind(&self) -> GatewayErrorKind {
        match self {
            Self::Network { .. } => GatewayErrorKind::Network,
            Self::Response { .. } => GatewayErrorKind::Response,
        }
    }

    /// A sentence suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network { message } => {
                format!("Could not reach the risk prediction service ({message})")
            }
            Self::Response {
                status: Some(status),
                message,
            } => format!("The risk prediction service failed with HTTP {status} ({message})"),
            Self::Response {
                status: None,
                message,
            } => format!("The risk prediction service sent an invalid response ({message})"),
        }
    }
}

/// Network boundary used by the map controller.
#[async_trait]
pub trait RiskGateway: Send + Sync {
    /// Fetches server-side clustered heatmap points.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the request fails or the body is not a
    /// JSON array of heatmap points.
    async fn fetch_clustered_heatmap(
        &self,
        grid_size: GridSize,
    ) -> Result<Vec<HeatmapPoint>, GatewayError>;

    /// Requests a risk prediction for a single coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Network`] if the API is unreachable and
    /// [`GatewayError::Response`] for error statuses or malformed bodies.
    async fn fetch_prediction(
        &self,
        coordinate: Coordinate,
    ) -> Result<PredictionResult, GatewayError>;

    /// Returns the service banner from the API root.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the request fails.
    async fn status(&self) -> Result<String, GatewayError>;
}

/// Where the gateway sends requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
}

impl GatewayConfig {
    /// Creates a config for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Reads `ROAD_RISK_API_URL`, falling back to [`DEFAULT_API_URL`].
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("ROAD_RISK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(base_url)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_trims_trailing_slash() {
        assert_eq!(
            GatewayConfig::new("http://api.local:8000/").base_url,
            "http://api.local:8000"
        );
    }

    #[test]
    fn error_kinds() {
        let network = GatewayError::Network {
            message: "connection refused".to_string(),
        };
        let response = GatewayError::Response {
            status: Some(500),
            message: "boom".to_string(),
        };
        assert_eq!(network.kind(), GatewayErrorKind::Network);
        assert_eq!(response.kind(), GatewayErrorKind::Response);
        assert!(network.user_message().contains("Could not reach"));
        assert!(response.user_message().contains("HTTP 500"));
    }
}
