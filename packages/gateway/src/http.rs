//! `reqwest`-backed [`RiskGateway`] implementation.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use road_risk_gateway_models::{ApiHeatmapPoint, ApiPrediction, ApiStatus};
use road_risk_models::{Coordinate, GridSize, HeatmapPoint, PredictionResult};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::{GatewayConfig, GatewayError, RiskGateway};

/// Maximum length of the response body preview included in errors.
const BODY_PREVIEW_LEN: usize = 200;

/// HTTP client for the prediction API.
pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGateway {
    /// Creates a gateway for the configured base URL.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            base_url: config.base_url,
            client: reqwest::Client::new(),
        }
    }

    /// The base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
    }

    /// Sends a request and decodes a JSON body, classifying failures into
    /// network and response errors.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let resp = request.send().await?;

        let url = resp.url().to_string();
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let detail = error_detail(&body).unwrap_or_else(|| preview(&body));
            log::warn!("{url} returned HTTP {status}: {detail}");
            return Err(GatewayError::Response {
                status: Some(status.as_u16()),
                message: detail,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            log::warn!(
                "Malformed JSON from {url}: {e}\n  body preview: {}",
                preview(&body)
            );
            GatewayError::Response {
                status: None,
                message: format!("malformed JSON: {e}"),
            }
        })
    }
}

#[async_trait]
impl RiskGateway for HttpGateway {
    async fn fetch_clustered_heatmap(
        &self,
        grid_size: GridSize,
    ) -> Result<Vec<HeatmapPoint>, GatewayError> {
        let request = self
            .request(reqwest::Method::GET, "/risk_heatmap_clustered")
            .query(&[("grid_size", grid_size.degrees())]);

        let raw: Vec<ApiHeatmapPoint> = self.send_json(request).await?;
        let total = raw.len();

        let points: Vec<HeatmapPoint> = raw
            .into_iter()
            .filter_map(|point| match HeatmapPoint::try_from(point) {
                Ok(point) => Some(point),
                Err(e) => {
                    log::warn!("Skipping heatmap point: {e}");
                    None
                }
            })
            .collect();

        log::debug!(
            "Fetched {} heatmap points ({} skipped) at grid size {grid_size}",
            points.len(),
            total - points.len()
        );

        Ok(points)
    }

    async fn fetch_prediction(
        &self,
        coordinate: Coordinate,
    ) -> Result<PredictionResult, GatewayError> {
        let request = self
            .request(reqwest::Method::POST, "/predict_location")
            .query(&[
                ("lat", coordinate.latitude()),
                ("lon", coordinate.longitude()),
            ]);

        let raw: ApiPrediction = self.send_json(request).await?;

        PredictionResult::try_from(raw).map_err(|e| GatewayError::Response {
            status: None,
            message: e.to_string(),
        })
    }

    async fn status(&self) -> Result<String, GatewayError> {
        let status: ApiStatus = self
            .send_json(self.request(reqwest::Method::GET, "/"))
            .await?;
        Ok(status.message)
    }
}

/// FastAPI-style error body: `{"detail": ...}`.
#[derive(Deserialize)]
struct ApiErrorBody {
    detail: serde_json::Value,
}

fn error_detail(body: &str) -> Option<String> {
    let parsed: ApiErrorBody = serde_json::from_str(body).ok()?;
    Some(match parsed.detail {
        serde_json::Value::String(detail) => detail,
        other => other.to_string(),
    })
}

fn preview(body: &str) -> String {
    if body.chars().count() > BODY_PREVIEW_LEN {
        format!("{}...", body.chars().take(BODY_PREVIEW_LEN).collect::<String>())
    } else {
        body.to_string()
    }
}
