// ============================================================================
// Géolocalisation
// ============================================================================
// Position de l'appareil → reverse geocoding → ville + pays
//
// Toute erreur (permission refusée, délai dépassé, réseau, réponse invalide)
// aboutit à la position par défaut (New York) accompagnée d'un message :
// la résolution ne retourne jamais d'erreur.
//
// CONCEPTS RUST :
// 1. Deux traits (DeviceLocator, ReverseGeocoder) substituables en test
// 2. tokio::time::timeout pour borner l'attente
// ============================================================================

use std::future::Future;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::api::ReverseGeocoder;
use crate::config::{Config, Coordinates};
use crate::error::FetchError;

pub const DEFAULT_CITY: &str = "New York";
pub const DEFAULT_COUNTRY: &str = "United States";
pub const DEFAULT_TIMEZONE: &str = "America/New_York";
pub const FALLBACK_ADVISORY: &str = "Unable to detect location. Using default location.";

/// Position résolue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub city: String,
    pub country: String,
    pub timezone: String,
    /// Présent quand la position par défaut a été utilisée
    pub advisory: Option<String>,
}

impl Location {
    /// Position par défaut
    pub fn fallback() -> Self {
        Self {
            city: DEFAULT_CITY.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            advisory: Some(FALLBACK_ADVISORY.to_string()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.advisory.is_some()
    }

    /// "New York, United States"
    pub fn label(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }
}

/// Capacité "position de l'appareil"
pub trait DeviceLocator: Send + Sync {
    fn current_position(
        &self,
        high_accuracy: bool,
    ) -> impl Future<Output = Result<Coordinates, FetchError>> + Send;
}

/// Position fixe (fichier de configuration)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedLocator(pub Coordinates);

impl DeviceLocator for FixedLocator {
    async fn current_position(&self, _high_accuracy: bool) -> Result<Coordinates, FetchError> {
        Ok(self.0)
    }
}

/// Pas de capteur : la position est toujours indisponible
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoLocator;

impl DeviceLocator for NoLocator {
    async fn current_position(&self, _high_accuracy: bool) -> Result<Coordinates, FetchError> {
        Err(FetchError::PositionUnavailable)
    }
}

/// Locator choisi selon la configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfiguredLocator {
    Fixed(FixedLocator),
    Unavailable(NoLocator),
}

impl ConfiguredLocator {
    pub fn from_config(config: &Config) -> Self {
        match config.coordinates {
            Some(coordinates) => ConfiguredLocator::Fixed(FixedLocator(coordinates)),
            None => ConfiguredLocator::Unavailable(NoLocator),
        }
    }
}

impl DeviceLocator for ConfiguredLocator {
    async fn current_position(&self, high_accuracy: bool) -> Result<Coordinates, FetchError> {
        match self {
            ConfiguredLocator::Fixed(locator) => locator.current_position(high_accuracy).await,
            ConfiguredLocator::Unavailable(locator) => locator.current_position(high_accuracy).await,
        }
    }
}

/// Fuseau horaire local (variable TZ), "UTC" sinon
fn local_timezone() -> String {
    std::env::var("TZ")
        .ok()
        .filter(|tz| !tz.trim().is_empty())
        .unwrap_or_else(|| "UTC".to_string())
}

/// Résout la position courante
///
/// Chaque étape est bornée par `timeout`. Les champs absents de la réponse
/// sont remplacés individuellement par les valeurs par défaut.
#[instrument(skip(locator, geocoder))]
pub async fn resolve_location<L, G>(locator: &L, geocoder: &G, timeout: Duration) -> Location
where
    L: DeviceLocator,
    G: ReverseGeocoder,
{
    match try_resolve(locator, geocoder, timeout).await {
        Ok(location) => {
            info!(city = %location.city, country = %location.country, "Location detected");
            location
        }
        Err(err) => {
            warn!(kind = err.kind(), error = %err, "Location detection failed, using default");
            Location::fallback()
        }
    }
}

async fn try_resolve<L, G>(locator: &L, geocoder: &G, timeout: Duration) -> Result<Location, FetchError>
where
    L: DeviceLocator,
    G: ReverseGeocoder,
{
    let coordinates = tokio::time::timeout(timeout, locator.current_position(true))
        .await
        .map_err(|_| FetchError::Timeout(timeout))??;

    let response = tokio::time::timeout(timeout, geocoder.reverse(coordinates))
        .await
        .map_err(|_| FetchError::Timeout(timeout))??;

    Ok(Location {
        city: response.city_or_locality().unwrap_or(DEFAULT_CITY).to_string(),
        country: response.country().unwrap_or(DEFAULT_COUNTRY).to_string(),
        timezone: local_timezone(),
        advisory: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::geocode::GeocodeResponse;

    const TIMEOUT: Duration = Duration::from_secs(10);
    const PARIS: Coordinates = Coordinates {
        latitude: 48.85,
        longitude: 2.35,
    };

    struct DeniedLocator;

    impl DeviceLocator for DeniedLocator {
        async fn current_position(&self, _high_accuracy: bool) -> Result<Coordinates, FetchError> {
            Err(FetchError::PermissionDenied)
        }
    }

    struct SlowLocator;

    impl DeviceLocator for SlowLocator {
        async fn current_position(&self, _high_accuracy: bool) -> Result<Coordinates, FetchError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(PARIS)
        }
    }

    struct FakeGeocoder(Result<GeocodeResponse, FetchError>);

    impl ReverseGeocoder for FakeGeocoder {
        async fn reverse(&self, _coordinates: Coordinates) -> Result<GeocodeResponse, FetchError> {
            self.0.clone()
        }
    }

    fn paris() -> FakeGeocoder {
        FakeGeocoder(Ok(GeocodeResponse {
            country_name: Some("France".into()),
            city: Some("Paris".into()),
            locality: None,
        }))
    }

    #[tokio::test]
    async fn test_resolved_location() {
        let location = resolve_location(&FixedLocator(PARIS), &paris(), TIMEOUT).await;
        assert_eq!(location.city, "Paris");
        assert_eq!(location.country, "France");
        assert!(!location.is_fallback());
        assert!(!location.timezone.is_empty());
    }

    #[tokio::test]
    async fn test_permission_denied_falls_back() {
        let location = resolve_location(&DeniedLocator, &paris(), TIMEOUT).await;
        assert_eq!(location, Location::fallback());
        assert_eq!(location.label(), "New York, United States");
        assert_eq!(location.advisory.as_deref(), Some(FALLBACK_ADVISORY));
    }

    #[tokio::test]
    async fn test_no_locator_falls_back() {
        let location = resolve_location(&NoLocator, &paris(), TIMEOUT).await;
        assert!(location.is_fallback());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let location = resolve_location(&SlowLocator, &paris(), TIMEOUT).await;
        assert_eq!(location, Location::fallback());
    }

    #[tokio::test]
    async fn test_geocoder_failure_falls_back() {
        let geocoder = FakeGeocoder(Err(FetchError::InvalidResponse("HTTP 500".into())));
        let location = resolve_location(&FixedLocator(PARIS), &geocoder, TIMEOUT).await;
        assert_eq!(location, Location::fallback());
    }

    #[tokio::test]
    async fn test_missing_fields_default_individually() {
        let geocoder = FakeGeocoder(Ok(GeocodeResponse {
            country_name: None,
            city: None,
            locality: Some("Shibuya".into()),
        }));
        let location = resolve_location(&FixedLocator(PARIS), &geocoder, TIMEOUT).await;
        assert_eq!(location.city, "Shibuya");
        assert_eq!(location.country, "United States");
        assert!(location.advisory.is_none());
    }

    #[test]
    fn test_configured_locator() {
        let mut config = Config::default();
        assert_eq!(
            ConfiguredLocator::from_config(&config),
            ConfiguredLocator::Unavailable(NoLocator)
        );
        config.coordinates = Some(PARIS);
        assert_eq!(
            ConfiguredLocator::from_config(&config),
            ConfiguredLocator::Fixed(FixedLocator(PARIS))
        );
    }
}
