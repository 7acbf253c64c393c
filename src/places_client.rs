use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::configuration::PlacesSettings;
use crate::error::{AppError, UpstreamError};

const SERVICE: &str = "Places";

/// Client for the Google Places Nearby Search web service
#[derive(Clone)]
pub struct PlacesClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    radius_meters: u32,
}

/// A place as returned to our clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub name: String,
    pub address: Option<String>,
    pub rating: Option<f64>,
    pub lat: f64,
    pub lng: f64,
    pub place_id: Option<String>,
}

#[derive(Deserialize)]
struct NearbyResponse {
    status: String,
    #[serde(default)]
    results: Vec<NearbyResult>,
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct NearbyResult {
    name: String,
    vicinity: Option<String>,
    rating: Option<f64>,
    place_id: Option<String>,
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl From<NearbyResult> for Place {
    fn from(result: NearbyResult) -> Self {
        Self {
            name: result.name,
            address: result.vicinity,
            rating: result.rating,
            lat: result.geometry.location.lat,
            lng: result.geometry.location.lng,
            place_id: result.place_id,
        }
    }
}

/// Search keyword for a client-side place type: `food` means restaurants,
/// everything else means hotels.
pub fn keyword_for(kind: &str) -> &'static str {
    if kind == "food" {
        "restaurant"
    } else {
        "hotel"
    }
}

impl PlacesClient {
    pub fn new(settings: &PlacesSettings) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build places HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            radius_meters: settings.radius_meters,
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.is_empty()
    }

    pub async fn search(&self, lat: f64, lng: f64, keyword: &str) -> Result<Vec<Place>, AppError> {
        if !self.is_configured() {
            return Err(UpstreamError::NotConfigured(SERVICE).into());
        }

        let url = format!("{}/nearbysearch/json", self.base_url);
        let location = format!("{},{}", lat, lng);
        let radius = self.radius_meters.to_string();

        let response: NearbyResponse = self
            .http_client
            .get(&url)
            .query(&[
                ("location", location.as_str()),
                ("radius", radius.as_str()),
                ("keyword", keyword),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                // The URL carries the API key
                let e = e.without_url();
                tracing::error!("Failed to reach places service: {}", e);
                UpstreamError::Request(e.to_string())
            })?
            .error_for_status()
            .map_err(|e| {
                let e = e.without_url();
                tracing::error!("Places service returned error: {}", e);
                UpstreamError::Request(e.to_string())
            })?
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(e.without_url().to_string()))?;

        match response.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(response.results.into_iter().map(Place::from).collect()),
            status => {
                let detail = response.error_message.unwrap_or_default();
                tracing::error!(status = status, detail = %detail, "Places search rejected");
                Err(UpstreamError::InvalidResponse(format!("status {}", status)).into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: &str) -> PlacesSettings {
        PlacesSettings {
            base_url: base_url.to_string(),
            api_key: "places-key".to_string(),
            radius_meters: 1500,
            timeout_seconds: 5,
        }
    }

    #[test]
    fn test_keyword_mapping() {
        assert_eq!(keyword_for("food"), "restaurant");
        assert_eq!(keyword_for("stay"), "hotel");
        assert_eq!(keyword_for(""), "hotel");
    }

    #[tokio::test]
    async fn test_search_maps_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/nearbysearch/json"))
            .and(query_param("keyword", "restaurant"))
            .and(query_param("radius", "1500"))
            .and(query_param("key", "places-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "results": [{
                    "name": "Vaishali",
                    "vicinity": "FC Road",
                    "rating": 4.5,
                    "place_id": "abc",
                    "geometry": { "location": { "lat": 18.52, "lng": 73.84 } }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = PlacesClient::new(&settings(&server.uri())).unwrap();
        let places = client.search(18.52, 73.84, "restaurant").await.unwrap();

        assert_eq!(places.len(), 1);
        assert_eq!(places[0].name, "Vaishali");
        assert_eq!(places[0].address.as_deref(), Some("FC Road"));
        assert_eq!(places[0].lat, 18.52);
    }

    #[tokio::test]
    async fn test_zero_results_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ZERO_RESULTS", "results": [] })))
            .mount(&server)
            .await;

        let client = PlacesClient::new(&settings(&server.uri())).unwrap();
        assert!(client.search(0.0, 0.0, "hotel").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_denied_request_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "REQUEST_DENIED",
                "error_message": "The provided API key is invalid."
            })))
            .mount(&server)
            .await;

        let client = PlacesClient::new(&settings(&server.uri())).unwrap();
        let err = client.search(0.0, 0.0, "hotel").await.unwrap_err();

        assert!(matches!(err, AppError::Upstream(UpstreamError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let mut settings = settings("http://127.0.0.1:9");
        settings.api_key = String::new();

        let err = PlacesClient::new(&settings).unwrap().search(0.0, 0.0, "hotel").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(UpstreamError::NotConfigured(_))));
    }
}
