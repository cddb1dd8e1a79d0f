// ============================================================================
// Structures : Stock, ChartPoint, MarketData
// ============================================================================
// Cotation d'une action, point d'historique et snapshot de marché
//
// CONCEPTS RUST :
// 1. #[serde(rename_all = "camelCase")] : mêmes noms de champs que le JSON
// 2. Option<T> pour les champs facultatifs (marketCap, sector, ...)
// 3. Méthodes "consommantes" (self) pour les conversions de devise
// ============================================================================

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Currency;

/// Cotation complète d'une action
///
/// Invariant : change_percent ≈ change / (price - change) × 100
/// (variation relative à la clôture précédente)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub market_cap: Option<u64>,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub previous_close: f64,
    pub country: Option<String>,
    pub sector: Option<String>,
    pub description: Option<String>,
}

impl Stock {
    /// Retourne true si l'action est en hausse sur la séance
    pub fn is_positive(&self) -> bool {
        self.change >= 0.0
    }

    /// Convertit tous les montants (USD) dans la devise demandée
    ///
    /// CONCEPT RUST : self par valeur
    /// - Consomme la cotation USD et retourne la version convertie
    /// - change_percent et volume ne dépendent pas de la devise
    pub fn converted(mut self, currency: Currency) -> Self {
        if currency == Currency::Usd {
            return self;
        }

        let convert = |v: f64| round2(currency.convert_from_usd(v));
        self.price = convert(self.price);
        self.change = convert(self.change);
        self.high = convert(self.high);
        self.low = convert(self.low);
        self.open = convert(self.open);
        self.previous_close = convert(self.previous_close);
        self.market_cap = self
            .market_cap
            .map(|cap| currency.convert_from_usd(cap as f64).round() as u64);
        self
    }

    /// Vérifie l'ordre naturel low ≤ price/open ≤ high
    pub fn has_consistent_range(&self) -> bool {
        self.low <= self.price.min(self.open) && self.high >= self.price.max(self.open)
    }

    /// Ligne formatée pour les listes
    ///
    /// Format : "AAPL    Apple Inc.            $271.49  ▲ +2.11%"
    pub fn display(&self, currency: Currency) -> String {
        let arrow = if self.is_positive() { "▲" } else { "▼" };
        let name = truncate(&self.name, 22);
        format!(
            "{:<7} {:<22} {:>12}  {} {:+.2}%",
            self.symbol,
            name,
            currency.format(self.price),
            arrow,
            self.change_percent
        )
    }
}

/// Point d'historique (graphique)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub time: DateTime<Utc>,
    pub price: f64,
    pub volume: u64,
}

impl ChartPoint {
    /// Label d'axe : "2024-01-15" ou "2024-01-15 14:00" en intraday
    pub fn label(&self, intraday: bool) -> String {
        if intraday {
            self.time.format("%Y-%m-%d %H:00").to_string()
        } else {
            self.time.format("%Y-%m-%d").to_string()
        }
    }
}

/// État du marché, dérivé de l'heure locale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarketStatus {
    Open,
    Closed,
    PreMarket,
    AfterHours,
}

impl MarketStatus {
    /// 9h-16h ouvert, 4h-9h pré-marché, 16h-20h after-hours, sinon fermé
    pub fn at_hour(hour: u32) -> Self {
        match hour {
            9..=15 => MarketStatus::Open,
            4..=8 => MarketStatus::PreMarket,
            16..=19 => MarketStatus::AfterHours,
            _ => MarketStatus::Closed,
        }
    }

    /// État courant selon l'horloge locale
    pub fn now() -> Self {
        Self::at_hour(chrono::Local::now().hour())
    }

    pub fn label(&self) -> &'static str {
        match self {
            MarketStatus::Open => "Market Open",
            MarketStatus::Closed => "Market Closed",
            MarketStatus::PreMarket => "Pre-Market",
            MarketStatus::AfterHours => "After Hours",
        }
    }
}

/// Snapshot complet produit par un cycle de rafraîchissement
///
/// Toujours remplacé en bloc, jamais patché
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    pub stocks: Vec<Stock>,
    pub last_updated: DateTime<Utc>,
    pub market_status: MarketStatus,
}

impl MarketData {
    /// Agrégats affichés dans le bandeau "Market Overview"
    pub fn overview(&self) -> MarketOverview {
        MarketOverview::of(&self.stocks)
    }
}

/// Agrégats d'une liste de cotations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketOverview {
    pub total_market_cap: u64,
    pub gainers: usize,
    pub losers: usize,
    pub average_change_percent: f64,
}

impl MarketOverview {
    pub fn of(stocks: &[Stock]) -> Self {
        let total_market_cap = stocks.iter().filter_map(|s| s.market_cap).sum();
        let gainers = stocks.iter().filter(|s| s.change > 0.0).count();
        let losers = stocks.iter().filter(|s| s.change < 0.0).count();
        let average_change_percent = if stocks.is_empty() {
            0.0
        } else {
            stocks.iter().map(|s| s.change_percent).sum::<f64>() / stocks.len() as f64
        };

        Self {
            total_market_cap,
            gainers,
            losers,
            average_change_percent,
        }
    }
}

/// Arrondi au centime
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Formate un grand nombre : 1.23T, 456.7B, 12.3M
pub fn format_large_number(value: f64) -> String {
    if value >= 1e12 {
        format!("{:.2}T", value / 1e12)
    } else if value >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else {
        format!("{:.0}", value)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max - 1).collect();
        format!("{}…", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Stock {
        Stock {
            symbol: "AAPL".to_string(),
            name: "Apple Inc.".to_string(),
            price: 200.0,
            change: 4.0,
            change_percent: 2.04,
            volume: 1_000_000,
            market_cap: Some(3_000_000_000_000),
            high: 205.0,
            low: 195.0,
            open: 198.0,
            previous_close: 196.0,
            country: None,
            sector: Some("Technology".to_string()),
            description: None,
        }
    }

    #[test]
    fn test_converted_usd_is_identity() {
        assert_eq!(sample().converted(Currency::Usd), sample());
    }

    #[test]
    fn test_converted_eur() {
        let eur = sample().converted(Currency::Eur);
        assert_eq!(eur.price, 170.0);
        assert_eq!(eur.previous_close, 166.6);
        assert_eq!(eur.change_percent, 2.04);
        assert_eq!(eur.volume, 1_000_000);
    }

    #[test]
    fn test_market_status_hours() {
        assert_eq!(MarketStatus::at_hour(3), MarketStatus::Closed);
        assert_eq!(MarketStatus::at_hour(4), MarketStatus::PreMarket);
        assert_eq!(MarketStatus::at_hour(9), MarketStatus::Open);
        assert_eq!(MarketStatus::at_hour(15), MarketStatus::Open);
        assert_eq!(MarketStatus::at_hour(16), MarketStatus::AfterHours);
        assert_eq!(MarketStatus::at_hour(20), MarketStatus::Closed);
    }

    #[test]
    fn test_market_status_serde() {
        let json = serde_json::to_string(&MarketStatus::PreMarket).unwrap();
        assert_eq!(json, "\"pre-market\"");
    }

    #[test]
    fn test_overview() {
        let mut loser = sample();
        loser.change = -1.0;
        loser.change_percent = -0.5;
        let overview = MarketOverview::of(&[sample(), loser]);
        assert_eq!(overview.gainers, 1);
        assert_eq!(overview.losers, 1);
        assert_eq!(overview.total_market_cap, 6_000_000_000_000);
        assert!((overview.average_change_percent - 0.77).abs() < 1e-9);
    }

    #[test]
    fn test_format_large_number() {
        assert_eq!(format_large_number(2.5e12), "2.50T");
        assert_eq!(format_large_number(3.1e9), "3.10B");
        assert_eq!(format_large_number(4.0e6), "4.00M");
    }
}
