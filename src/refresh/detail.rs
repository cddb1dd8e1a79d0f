// ============================================================================
// Flux : détail d'une action
// ============================================================================
// Cotation détaillée + historique sur la période choisie.
// Un fetch par changement de symbole, de période ou de devise.
// ============================================================================

use std::sync::Arc;

use crate::api::{HistoryRequest, MarketDataSource};
use crate::error::FetchError;
use crate::models::{ChartPoint, Currency, Stock, TimeRange};
use crate::refresh::{RefreshHandle, RefreshPolicy, Refresher};

#[derive(Debug, Clone, PartialEq)]
pub struct DetailParams {
    pub symbol: String,
    pub range: TimeRange,
    pub currency: Currency,
}

impl DetailParams {
    pub fn new(symbol: &str, currency: Currency) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            range: TimeRange::default(),
            currency,
        }
    }
}

/// Résultat : cotation + historique
#[derive(Debug, Clone, PartialEq)]
pub struct StockDetail {
    pub stock: Stock,
    pub chart: Vec<ChartPoint>,
    pub range: TimeRange,
}

impl StockDetail {
    /// (min, max) des prix du graphique
    pub fn price_bounds(&self) -> Option<(f64, f64)> {
        self.chart.iter().map(|p| p.price).fold(None, |acc, price| match acc {
            None => Some((price, price)),
            Some((lo, hi)) => Some((lo.min(price), hi.max(price))),
        })
    }
}

pub struct DetailRefresher<S> {
    source: Arc<S>,
}

impl<S: MarketDataSource> DetailRefresher<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }
}

impl<S: MarketDataSource> Refresher for DetailRefresher<S> {
    type Params = DetailParams;
    type Output = StockDetail;

    fn name(&self) -> &'static str {
        "detail"
    }

    async fn fetch(&self, params: DetailParams) -> Result<StockDetail, FetchError> {
        let symbol = params.symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(FetchError::ValidationFailed("No symbol selected".to_string()));
        }

        let stock = self
            .source
            .fetch_profile(symbol.clone(), params.currency)
            .await?;
        let chart = self
            .source
            .fetch_history(HistoryRequest::for_range(&symbol, params.range, params.currency))
            .await?;

        Ok(StockDetail {
            stock,
            chart,
            range: params.range,
        })
    }
}

pub type DetailFeed<S> = RefreshHandle<DetailRefresher<S>>;

/// Démarre le flux de détail pour un symbole
pub fn spawn_detail_feed<S: MarketDataSource>(source: Arc<S>, params: DetailParams) -> DetailFeed<S> {
    RefreshHandle::spawn(DetailRefresher::new(source), RefreshPolicy::once(), params)
}
