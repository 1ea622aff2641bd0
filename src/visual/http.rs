//! Visual model served over HTTP.
//!
//! `POST {url}` with the raw image as `application/octet-stream`; the endpoint answers
//! `{"predictions": [{"latitude": .., "longitude": .., "confidence": ..}]}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{VisualModel, VisualModelError, VisualPrediction};

#[derive(Debug, Deserialize)]
struct InferenceResponse {
    #[serde(default)]
    predictions: Vec<WirePrediction>,
}

#[derive(Debug, Deserialize)]
struct WirePrediction {
    latitude: f64,
    longitude: f64,
    confidence: f64,
}

/// HTTP client for a remote visual geolocation model.
#[derive(Debug, Clone)]
pub struct HttpVisualModel {
    client: Client,
    url: String,
}

impl HttpVisualModel {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, VisualModelError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VisualModelError::Unavailable {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Parses an inference response body.
pub fn parse_response(body: &[u8]) -> Result<Vec<VisualPrediction>, VisualModelError> {
    let response: InferenceResponse =
        serde_json::from_slice(body).map_err(|e| VisualModelError::MalformedResponse {
            message: e.to_string(),
        })?;

    Ok(response
        .predictions
        .into_iter()
        .map(|p| VisualPrediction::new(p.latitude, p.longitude, p.confidence))
        .collect())
}

#[async_trait]
impl VisualModel for HttpVisualModel {
    #[instrument(level = "debug", skip(self, image), fields(url = %self.url, bytes = image.len()))]
    async fn infer(&self, image: &[u8]) -> Result<Vec<VisualPrediction>, VisualModelError> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| VisualModelError::Unavailable {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(VisualModelError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| VisualModelError::MalformedResponse {
                message: e.to_string(),
            })?;

        let predictions = parse_response(&body)?;
        debug!(count = predictions.len(), "Visual model responded");
        Ok(predictions)
    }
}
