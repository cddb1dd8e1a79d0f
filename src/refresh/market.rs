// ============================================================================
// Flux : données de marché (accueil)
// ============================================================================
// Cotations des 8 valeurs du tableau de bord + historique de l'indice,
// rafraîchis toutes les 60 secondes (configurable)
// ============================================================================

use std::sync::Arc;

use chrono::Utc;

use crate::api::catalog::MARKET_SYMBOLS;
use crate::api::{HistoryRequest, MarketDataSource};
use crate::config::Config;
use crate::error::FetchError;
use crate::models::{ChartPoint, Currency, MarketData, MarketStatus};
use crate::refresh::{RefreshHandle, RefreshPolicy, Refresher};

/// Période de l'historique par défaut (jours)
pub const DEFAULT_PERIOD_DAYS: u32 = 30;

/// Périodes proposées sur l'accueil
pub const PERIODS: [u32; 4] = [7, 30, 90, 365];

#[derive(Debug, Clone, PartialEq)]
pub struct MarketParams {
    pub country: String,
    pub currency: Currency,
    pub period_days: u32,
}

impl MarketParams {
    pub fn new(country: &str, currency: Currency) -> Self {
        Self {
            country: country.to_string(),
            currency,
            period_days: DEFAULT_PERIOD_DAYS,
        }
    }

    /// Période suivante dans PERIODS (cyclique)
    pub fn next_period(&self) -> u32 {
        let index = PERIODS
            .iter()
            .position(|p| *p == self.period_days)
            .map_or(0, |i| (i + 1) % PERIODS.len());
        PERIODS[index]
    }
}

/// Résultat d'un cycle : snapshot + historique de l'indice
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub market: MarketData,
    pub chart: Vec<ChartPoint>,
}

pub struct MarketRefresher<S> {
    source: Arc<S>,
}

impl<S: MarketDataSource> MarketRefresher<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }
}

impl<S: MarketDataSource> Refresher for MarketRefresher<S> {
    type Params = MarketParams;
    type Output = MarketSnapshot;

    fn name(&self) -> &'static str {
        "market"
    }

    async fn fetch(&self, params: MarketParams) -> Result<MarketSnapshot, FetchError> {
        let symbols = MARKET_SYMBOLS.iter().map(|s| s.to_string()).collect();
        let mut stocks = self.source.fetch_stocks(symbols, params.currency).await?;
        for stock in &mut stocks {
            stock.country = Some(params.country.clone());
        }

        let chart = self
            .source
            .fetch_history(HistoryRequest::daily(None, params.period_days, params.currency))
            .await?;

        Ok(MarketSnapshot {
            market: MarketData {
                stocks,
                last_updated: Utc::now(),
                market_status: MarketStatus::now(),
            },
            chart,
        })
    }
}

pub type MarketFeed<S> = RefreshHandle<MarketRefresher<S>>;

/// Démarre le flux de marché (polling)
pub fn spawn_market_feed<S: MarketDataSource>(
    source: Arc<S>,
    config: &Config,
    params: MarketParams,
) -> MarketFeed<S> {
    RefreshHandle::spawn(
        MarketRefresher::new(source),
        RefreshPolicy::polling(config.market_poll()),
        params,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockMarketSource;

    #[test]
    fn test_next_period_cycles() {
        let mut params = MarketParams::new("United States", Currency::Usd);
        assert_eq!(params.period_days, 30);
        params.period_days = params.next_period();
        assert_eq!(params.period_days, 90);
        params.period_days = 365;
        assert_eq!(params.next_period(), 7);
    }

    #[tokio::test]
    async fn test_snapshot_contents() {
        let refresher = MarketRefresher::new(Arc::new(MockMarketSource::seeded(11)));
        let snapshot = refresher
            .fetch(MarketParams::new("Japan", Currency::Jpy))
            .await
            .unwrap();

        assert_eq!(snapshot.market.stocks.len(), 8);
        assert_eq!(snapshot.chart.len(), 31);
        assert!(snapshot
            .market
            .stocks
            .iter()
            .all(|s| s.country.as_deref() == Some("Japan")));
        assert!(snapshot.market.stocks.iter().all(|s| s.has_consistent_range()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_publishes_and_follows_currency() {
        let config = Config::default();
        let mut feed = spawn_market_feed(
            Arc::new(MockMarketSource::seeded(12)),
            &config,
            MarketParams::new("United States", Currency::Usd),
        );

        while feed.state().data.is_none() {
            assert!(feed.changed().await);
        }

        let mut params = feed.params().clone();
        params.currency = Currency::Eur;
        params.period_days = 7;
        feed.set_params(params);

        loop {
            let state = feed.state();
            if let Some(snapshot) = state.data.as_ref().filter(|_| state.sequence == 2) {
                assert_eq!(snapshot.chart.len(), 8);
                break;
            }
            assert!(feed.changed().await);
        }
    }
}
