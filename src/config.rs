// ============================================================================
// Configuration
// ============================================================================
// Réglages des tâches de rafraîchissement et de la géolocalisation
//
// Chargés depuis ~/.config/stockflow/config.json (Linux) si le fichier existe,
// sinon valeurs par défaut. Tous les champs sont facultatifs dans le JSON.
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// URL du service de reverse geocoding
pub const DEFAULT_GEOCODER_URL: &str =
    "https://api.bigdatacloud.net/data/reverse-geocode-client";

/// Coordonnées fixes (pas de GPS dans un terminal)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Configuration de l'application
///
/// Les durées sont exprimées en millisecondes dans le JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Période de polling des cotations (1 minute)
    pub market_poll_ms: u64,
    /// Période de polling des news (5 minutes)
    pub news_poll_ms: u64,
    /// Fenêtre de debounce de la recherche
    pub search_debounce_ms: u64,
    /// Latences simulées de la source de données
    pub market_delay_ms: u64,
    pub detail_delay_ms: u64,
    pub search_delay_ms: u64,
    pub news_delay_ms: u64,
    pub auth_delay_ms: u64,
    /// Timeout de la requête de position
    pub location_timeout_ms: u64,
    pub geocoder_url: String,
    /// Position de l'appareil, si connue
    pub coordinates: Option<Coordinates>,
    /// Graine du générateur (données reproductibles)
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            market_poll_ms: 60_000,
            news_poll_ms: 5 * 60_000,
            search_debounce_ms: 300,
            market_delay_ms: 0,
            detail_delay_ms: 1_000,
            search_delay_ms: 500,
            news_delay_ms: 800,
            auth_delay_ms: 1_000,
            location_timeout_ms: 10_000,
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            coordinates: None,
            seed: None,
        }
    }
}

impl Config {
    /// Emplacement du fichier de config
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("stockflow").join("config.json"))
    }

    /// Charge la config depuis le fichier par défaut, ou les valeurs par défaut
    pub fn load() -> Result<Self> {
        match Self::path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Charge la config depuis un fichier JSON
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Échec de la lecture de {}", path.display()))?;
        let config = Self::from_json(&raw)
            .with_context(|| format!("Config invalide dans {}", path.display()))?;
        info!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Échec du parsing JSON de la config")
    }

    pub fn market_poll(&self) -> Duration {
        Duration::from_millis(self.market_poll_ms)
    }

    pub fn news_poll(&self) -> Duration {
        Duration::from_millis(self.news_poll_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn auth_delay(&self) -> Duration {
        Duration::from_millis(self.auth_delay_ms)
    }

    pub fn location_timeout(&self) -> Duration {
        Duration::from_millis(self.location_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.market_poll(), Duration::from_secs(60));
        assert_eq!(config.news_poll(), Duration::from_secs(300));
        assert_eq!(config.search_debounce(), Duration::from_millis(300));
        assert_eq!(config.location_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{ "searchDebounceMs": 150, "seed": 7 }"#).unwrap();
        assert_eq!(config.search_debounce_ms, 150);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.market_poll_ms, 60_000);
        assert_eq!(config.geocoder_url, DEFAULT_GEOCODER_URL);
    }

    #[test]
    fn test_invalid_json() {
        assert!(Config::from_json("{ not json").is_err());
    }
}
