//! OpenStreetMap Nominatim reverse geocoding.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{GeocodeError, ReverseGeocoder};

/// Zoom 14 resolves to suburb/town level, which is what a place label needs.
const REVERSE_ZOOM: u8 = 14;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: Option<Address>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    hamlet: Option<String>,
    municipality: Option<String>,
    suburb: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl Address {
    fn locality(&self) -> Option<&str> {
        [
            &self.city,
            &self.town,
            &self.village,
            &self.hamlet,
            &self.municipality,
            &self.suburb,
            &self.county,
            &self.state,
        ]
        .into_iter()
        .find_map(|part| part.as_deref().filter(|s| !s.trim().is_empty()))
    }
}

/// Reverse geocoder backed by a Nominatim instance.
///
/// The public instance requires an identifying `User-Agent` and allows about one request
/// per second; the caching and breaker in [`super::GeocoderClient`] keep traffic low.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| GeocodeError::Transport {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// "Locality, Country" from the address breakdown, else the full display name.
pub(crate) fn format_place(response: &ReverseResponse) -> Option<String> {
    if response.error.is_some() {
        return None;
    }

    let address = response.address.as_ref();
    let locality = address.and_then(Address::locality);
    let country = address
        .and_then(|a| a.country.as_deref())
        .filter(|s| !s.trim().is_empty());

    match (locality, country) {
        (Some(locality), Some(country)) => Some(format!("{locality}, {country}")),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => response
            .display_name
            .clone()
            .filter(|s| !s.trim().is_empty()),
    }
}

pub(crate) fn parse_response(body: &[u8]) -> Result<Option<String>, GeocodeError> {
    let response: ReverseResponse =
        serde_json::from_slice(body).map_err(|e| GeocodeError::MalformedResponse {
            message: e.to_string(),
        })?;
    Ok(format_place(&response))
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    #[instrument(level = "debug", skip(self))]
    async fn lookup(&self, latitude: f64, longitude: f64) -> Result<Option<String>, GeocodeError> {
        let url = format!("{}/reverse", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("zoom", REVERSE_ZOOM.to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .header(reqwest::header::ACCEPT_LANGUAGE, "en")
            .send()
            .await
            .map_err(|e| GeocodeError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| GeocodeError::Transport {
                message: e.to_string(),
            })?;

        let place = parse_response(&body)?;
        debug!(place = ?place, "Nominatim responded");
        Ok(place)
    }
}
