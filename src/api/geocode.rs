// ============================================================================
// API Client : Reverse geocoding (BigDataCloud)
// ============================================================================
// Convertit des coordonnées (latitude, longitude) en ville + pays
//
// CONCEPTS RUST :
// 1. async/await : requête HTTP non-bloquante
// 2. Serde : désérialisation JSON avec champs optionnels
// 3. Trait ReverseGeocoder : permet de substituer un faux geocoder en test
// ============================================================================

use std::future::Future;

use serde::Deserialize;
use tracing::{debug, error, info, instrument};

use crate::config::{Coordinates, DEFAULT_GEOCODER_URL};
use crate::error::FetchError;

// ============================================================================
// Structure pour parser la réponse JSON
// ============================================================================
// Seuls les champs utiles sont déclarés, serde ignore le reste
// ============================================================================

/// Réponse du service (champs utiles seulement)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResponse {
    pub country_name: Option<String>,
    pub city: Option<String>,
    pub locality: Option<String>,
}

impl GeocodeResponse {
    /// Ville : "city", sinon "locality" (les chaînes vides ne comptent pas)
    pub fn city_or_locality(&self) -> Option<&str> {
        non_empty(self.city.as_deref()).or_else(|| non_empty(self.locality.as_deref()))
    }

    pub fn country(&self) -> Option<&str> {
        non_empty(self.country_name.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Service de reverse geocoding
pub trait ReverseGeocoder: Send + Sync {
    fn reverse(
        &self,
        coordinates: Coordinates,
    ) -> impl Future<Output = Result<GeocodeResponse, FetchError>> + Send;
}

/// Client HTTP du service BigDataCloud
pub struct BigDataCloudGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl BigDataCloudGeocoder {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("stockflow/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

/// Construit l'URL de la requête
///
/// Format : <base>?latitude=..&longitude=..&localityLanguage=en
pub fn build_geocode_url(base_url: &str, coordinates: Coordinates) -> String {
    format!(
        "{}?latitude={}&longitude={}&localityLanguage=en",
        base_url, coordinates.latitude, coordinates.longitude
    )
}

impl ReverseGeocoder for BigDataCloudGeocoder {
    /// CONCEPT RUST : #[instrument]
    /// - Tous les logs de la requête portent latitude/longitude
    #[instrument(skip(self), fields(lat = coordinates.latitude, lon = coordinates.longitude))]
    async fn reverse(&self, coordinates: Coordinates) -> Result<GeocodeResponse, FetchError> {
        let url = build_geocode_url(&self.base_url, coordinates);
        debug!(url = %url, "Sending reverse geocoding request");

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        // Vérifie que la réponse est un succès HTTP (200-299)
        if !status.is_success() {
            error!(status = %status, "Geocoder returned error status");
            return Err(FetchError::InvalidResponse(format!("HTTP {}", status)));
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        info!(country = ?body.country_name, city = ?body.city_or_locality(), "Location resolved");
        Ok(body)
    }
}

impl Default for BigDataCloudGeocoder {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_GEOCODER_URL.to_string(),
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_geocode_url() {
        let url = build_geocode_url(
            DEFAULT_GEOCODER_URL,
            Coordinates { latitude: 48.85, longitude: 2.35 },
        );
        assert!(url.starts_with("https://api.bigdatacloud.net/"));
        assert!(url.contains("latitude=48.85"));
        assert!(url.contains("longitude=2.35"));
        assert!(url.ends_with("localityLanguage=en"));
    }

    #[test]
    fn test_parse_response_prefers_city() {
        let body: GeocodeResponse = serde_json::from_str(
            r#"{ "countryName": "France", "city": "Paris", "locality": "1er Arrondissement", "extra": 1 }"#,
        )
        .unwrap();
        assert_eq!(body.country(), Some("France"));
        assert_eq!(body.city_or_locality(), Some("Paris"));
    }

    #[test]
    fn test_parse_response_falls_back_to_locality() {
        let body: GeocodeResponse =
            serde_json::from_str(r#"{ "countryName": "Japan", "city": "", "locality": "Shibuya" }"#)
                .unwrap();
        assert_eq!(body.city_or_locality(), Some("Shibuya"));
    }

    // Test avec un vrai appel réseau (peut échouer sans connexion)
    #[tokio::test]
    async fn test_reverse_live() {
        let geocoder = BigDataCloudGeocoder::default();
        let result = geocoder
            .reverse(Coordinates { latitude: 40.71, longitude: -74.0 })
            .await;

        match result {
            Ok(body) => println!("✓ Résolu : {:?}", body),
            Err(e) => println!("⚠ Test skippé (pas de connexion?) : {}", e),
        }
    }
}
