// ============================================================================
// Module : api
// ============================================================================
// Sources de données : interface MarketDataSource, source simulée,
// catalogue statique et client de reverse geocoding
//
// CONCEPT RUST : Trait comme point d'extension
// - Les tâches de rafraîchissement ne connaissent que le trait
// - Une vraie source de cotations peut remplacer MockMarketSource
//   sans toucher à la logique de rafraîchissement
// ============================================================================

pub mod catalog; // Actions, secteurs, pays
pub mod geocode; // Client BigDataCloud (reverse geocoding)
pub mod mock;    // Source simulée (générateurs aléatoires)

use std::future::Future;

use chrono::Duration;

use crate::error::FetchError;
use crate::models::{ChartPoint, Currency, NewsItem, Stock, TimeRange};

pub use geocode::{BigDataCloudGeocoder, ReverseGeocoder};
pub use mock::MockMarketSource;

/// Demande d'historique de prix
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRequest {
    /// None : historique de l'indice affiché sur l'accueil
    pub symbol: Option<String>,
    /// Nombre de pas (le résultat contient steps + 1 points)
    pub steps: u32,
    pub step: Duration,
    pub volatility: f64,
    pub currency: Currency,
}

impl HistoryRequest {
    /// Historique journalier sur `days` jours
    pub fn daily(symbol: Option<String>, days: u32, currency: Currency) -> Self {
        Self {
            symbol,
            steps: days,
            step: Duration::days(1),
            volatility: 10.0,
            currency,
        }
    }

    /// Historique correspondant à une période de la vue détail
    pub fn for_range(symbol: &str, range: TimeRange, currency: Currency) -> Self {
        Self {
            symbol: Some(symbol.to_string()),
            steps: range.steps(),
            step: range.step(),
            volatility: range.volatility(),
            currency,
        }
    }
}

/// Critères de recherche
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    pub query: String,
    pub country: String,
    /// None ou "All Sectors" : pas de filtre
    pub sector: Option<String>,
    /// Devise des cotations retournées
    pub currency: Currency,
}

impl SearchQuery {
    pub fn new(query: &str, country: &str, sector: Option<&str>) -> Self {
        Self {
            query: query.to_string(),
            country: country.to_string(),
            sector: sector.map(str::to_string),
            currency: Currency::default(),
        }
    }

    /// Même recherche, cotations dans une autre devise
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Filtre secteur effectif ("All Sectors" et "" valent "pas de filtre")
    pub fn sector_filter(&self) -> Option<&str> {
        self.sector
            .as_deref()
            .filter(|s| !s.is_empty() && *s != catalog::ALL_SECTORS)
    }

    /// Requête vide et aucun secteur : rien à chercher
    pub fn is_blank(&self) -> bool {
        self.query.trim().is_empty() && self.sector_filter().is_none()
    }
}

/// Source de données de marché
///
/// CONCEPT RUST : `impl Future + Send` dans un trait
/// - Les futures retournées sont exécutées dans des tâches tokio
/// - + Send : elles peuvent changer de thread worker
pub trait MarketDataSource: Send + Sync + 'static {
    /// Cotations des symboles demandés, dans la devise demandée
    fn fetch_stocks(
        &self,
        symbols: Vec<String>,
        currency: Currency,
    ) -> impl Future<Output = Result<Vec<Stock>, FetchError>> + Send;

    /// Historique de prix (steps + 1 points, ordre chronologique)
    fn fetch_history(
        &self,
        request: HistoryRequest,
    ) -> impl Future<Output = Result<Vec<ChartPoint>, FetchError>> + Send;

    /// Cotation détaillée (secteur, pays, description)
    fn fetch_profile(
        &self,
        symbol: String,
        currency: Currency,
    ) -> impl Future<Output = Result<Stock, FetchError>> + Send;

    /// Recherche par symbole/nom et secteur
    fn search(
        &self,
        query: SearchQuery,
    ) -> impl Future<Output = Result<Vec<Stock>, FetchError>> + Send;

    /// Dernières actualités
    fn fetch_news(&self) -> impl Future<Output = Result<Vec<NewsItem>, FetchError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_blank() {
        assert!(SearchQuery::new("  ", "United States", None).is_blank());
        assert!(SearchQuery::new("", "United States", Some("All Sectors")).is_blank());
        assert!(SearchQuery::new("", "United States", Some("")).is_blank());
        assert!(!SearchQuery::new("", "United States", Some("Energy")).is_blank());
        assert!(!SearchQuery::new("app", "United States", None).is_blank());
    }

    #[test]
    fn test_history_request_for_range() {
        let req = HistoryRequest::for_range("AAPL", TimeRange::OneDay, Currency::Usd);
        assert_eq!(req.steps, 24);
        assert_eq!(req.step, Duration::hours(1));
        assert_eq!(req.symbol.as_deref(), Some("AAPL"));
    }
}
