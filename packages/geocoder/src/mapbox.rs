//! Mapbox forward geocoding client.
//!
//! Queries are sent to `{base_url}/{query}.json` with the access token,
//! result cap, and country filter as query parameters. Only `id`, `text`,
//! `place_name`, and `center` of each returned feature are used.
//!
//! See <https://docs.mapbox.com/api/search/geocoding-v5/>

use crate::service_registry::GeocodingService;
use crate::{GeocodeError, Geocoder, SearchResult};
use geofence_geometry_models::Coordinate;

/// Geocoder backed by the Mapbox places endpoint.
#[derive(Debug, Clone)]
pub struct MapboxGeocoder {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    limit: u32,
    country: String,
}

impl MapboxGeocoder {
    /// Creates a geocoder for `service` authenticated with `access_token`.
    #[must_use]
    pub fn new(client: reqwest::Client, service: &GeocodingService, access_token: String) -> Self {
        Self {
            client,
            base_url: service.base_url.clone(),
            access_token,
            limit: service.limit,
            country: service.country.clone(),
        }
    }
}

#[async_trait::async_trait]
impl Geocoder for MapboxGeocoder {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, GeocodeError> {
        let url = build_url(&self.base_url, query)?;
        let limit = self.limit.to_string();

        let resp = self
            .client
            .get(url)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("limit", limit.as_str()),
                ("country", self.country.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(GeocodeError::Status {
                status: resp.status().as_u16(),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

/// Appends the percent-encoded `{query}.json` segment to the endpoint.
fn build_url(base_url: &str, query: &str) -> Result<reqwest::Url, GeocodeError> {
    let mut url = reqwest::Url::parse(base_url).map_err(|e| GeocodeError::Parse {
        message: format!("Invalid base URL {base_url}: {e}"),
    })?;
    url.path_segments_mut()
        .map_err(|()| GeocodeError::Parse {
            message: format!("Base URL {base_url} cannot have path segments"),
        })?
        .push(&format!("{query}.json"));
    Ok(url)
}

/// Parses a Mapbox `FeatureCollection` response.
///
/// A missing `features` array yields no results. Features without a
/// usable `center` are skipped.
fn parse_response(body: &serde_json::Value) -> Result<Vec<SearchResult>, GeocodeError> {
    if !body.is_object() {
        return Err(GeocodeError::Parse {
            message: "Mapbox response is not an object".to_string(),
        });
    }

    let Some(features) = body.get("features").and_then(serde_json::Value::as_array) else {
        return Ok(Vec::new());
    };

    Ok(features.iter().filter_map(parse_feature).collect())
}

fn parse_feature(feature: &serde_json::Value) -> Option<SearchResult> {
    let center = feature.get("center").and_then(serde_json::Value::as_array)?;
    let (Some(lng), Some(lat)) = (
        center.first().and_then(serde_json::Value::as_f64),
        center.get(1).and_then(serde_json::Value::as_f64),
    ) else {
        log::warn!("Skipping geocoding result with malformed center: {center:?}");
        return None;
    };

    let field = |name: &str| {
        feature
            .get(name)
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Some(SearchResult {
        id: field("id"),
        text: field("text"),
        place_name: field("place_name"),
        center: Coordinate::new(lng, lat),
    })
}
