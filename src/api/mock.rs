// ============================================================================
// Source simulée : MockMarketSource
// ============================================================================
// Génère des cotations, historiques et news aléatoires après une latence
// simulée. Implémente MarketDataSource comme le ferait une vraie API.
//
// CONCEPTS RUST :
// 1. Mutex<StdRng> : générateur partagé, reproductible avec une graine
// 2. Les verrous ne sont jamais tenus pendant un .await
// 3. Générateurs purs (fn + &mut impl Rng) testables sans runtime
// ============================================================================

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument, warn};

use crate::api::catalog::{self, CATALOG};
use crate::api::{HistoryRequest, MarketDataSource, SearchQuery};
use crate::config::Config;
use crate::error::FetchError;
use crate::models::stock::round2;
use crate::models::{ChartPoint, Currency, NewsItem, Stock};

/// Latences simulées par type de requête
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockDelays {
    pub market: Duration,
    pub detail: Duration,
    pub search: Duration,
    pub news: Duration,
}

impl MockDelays {
    pub fn from_config(config: &Config) -> Self {
        Self {
            market: Duration::from_millis(config.market_delay_ms),
            detail: Duration::from_millis(config.detail_delay_ms),
            search: Duration::from_millis(config.search_delay_ms),
            news: Duration::from_millis(config.news_delay_ms),
        }
    }
}

/// Source de données aléatoire
pub struct MockMarketSource {
    rng: Mutex<StdRng>,
    delays: MockDelays,
    /// Panne simulée : toutes les requêtes échouent tant qu'elle est posée
    failure: Mutex<Option<FetchError>>,
}

impl MockMarketSource {
    /// Source non reproductible, sans latence
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Source reproductible (même graine → mêmes données)
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Source configurée (graine et latences)
    pub fn from_config(config: &Config) -> Self {
        let source = match config.seed {
            Some(seed) => Self::seeded(seed),
            None => Self::new(),
        };
        source.with_delays(MockDelays::from_config(config))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            delays: MockDelays::default(),
            failure: Mutex::new(None),
        }
    }

    pub fn with_delays(mut self, delays: MockDelays) -> Self {
        self.delays = delays;
        self
    }

    /// Pose ou retire une panne simulée
    pub fn set_failure(&self, failure: Option<FetchError>) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = failure;
    }

    /// Latence simulée puis vérification de la panne
    async fn simulate(&self, delay: Duration) -> Result<(), FetchError> {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let failure = self
            .failure
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        match failure {
            Some(err) => {
                warn!(kind = err.kind(), "Simulated source failure");
                Err(err)
            }
            None => Ok(()),
        }
    }

    /// CONCEPT RUST : closure avec &mut
    /// - Verrouille le générateur le temps de la closure seulement
    fn with_generator<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut rng)
    }
}

impl Default for MockMarketSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketDataSource for MockMarketSource {
    #[instrument(skip(self), fields(count = symbols.len()))]
    async fn fetch_stocks(
        &self,
        symbols: Vec<String>,
        currency: Currency,
    ) -> Result<Vec<Stock>, FetchError> {
        self.simulate(self.delays.market).await?;

        let stocks = self.with_generator(|rng| {
            symbols
                .iter()
                .map(|symbol| {
                    generate_quote(rng, symbol, &catalog::company_name(symbol)).converted(currency)
                })
                .collect::<Vec<_>>()
        });

        debug!(stocks = stocks.len(), "Generated quotes");
        Ok(stocks)
    }

    #[instrument(skip(self, request), fields(symbol = ?request.symbol, steps = request.steps))]
    async fn fetch_history(&self, request: HistoryRequest) -> Result<Vec<ChartPoint>, FetchError> {
        self.simulate(self.delays.market).await?;

        let now = Utc::now();
        Ok(self.with_generator(|rng| generate_history(rng, &request, now)))
    }

    #[instrument(skip(self))]
    async fn fetch_profile(&self, symbol: String, currency: Currency) -> Result<Stock, FetchError> {
        self.simulate(self.delays.detail).await?;

        let symbol = symbol.to_uppercase();
        let mut stock = self.with_generator(|rng| {
            generate_quote(rng, &symbol, &catalog::company_name(&symbol))
        });
        stock.country = Some("United States".to_string());
        stock.sector = Some(catalog::sector(&symbol).to_string());
        stock.description = Some(catalog::description(&symbol));
        Ok(stock.converted(currency))
    }

    #[instrument(skip(self))]
    async fn search(&self, query: SearchQuery) -> Result<Vec<Stock>, FetchError> {
        self.simulate(self.delays.search).await?;

        let term = query.query.trim().to_lowercase();
        let sector = query.sector_filter();

        let results = self.with_generator(|rng| {
            CATALOG
                .iter()
                .filter(|entry| {
                    term.is_empty()
                        || entry.symbol.to_lowercase().contains(&term)
                        || entry.name.to_lowercase().contains(&term)
                })
                .filter(|entry| sector.map_or(true, |s| entry.sector == s))
                .map(|entry| {
                    let mut stock = generate_quote(rng, entry.symbol, entry.name);
                    stock.country = Some(query.country.clone());
                    stock.sector = Some(entry.sector.to_string());
                    stock.converted(query.currency)
                })
                .collect::<Vec<_>>()
        });

        debug!(results = results.len(), "Search completed");
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn fetch_news(&self) -> Result<Vec<NewsItem>, FetchError> {
        self.simulate(self.delays.news).await?;
        Ok(generate_news(Utc::now()))
    }
}

// ============================================================================
// Générateurs
// ============================================================================

/// Génère une cotation USD cohérente
///
/// - price ∈ [50, 550[, change ∈ [-10, 10[
/// - previous_close = price - change
/// - low ≤ min(price, open), high ≥ max(price, open)
pub fn generate_quote(rng: &mut impl Rng, symbol: &str, name: &str) -> Stock {
    let price = round2(rng.gen_range(50.0..550.0));
    let change = round2(rng.gen_range(-10.0..10.0));
    let previous_close = round2(price - change);
    let change_percent = round2(change / previous_close * 100.0);
    let open = round2(price + rng.gen_range(-2.5..2.5));
    let high = round2(price.max(open) + rng.gen_range(0.0..10.0));
    let low = round2(price.min(open) - rng.gen_range(0.0..10.0));

    Stock {
        symbol: symbol.to_string(),
        name: name.to_string(),
        price,
        change,
        change_percent,
        volume: rng.gen_range(1_000_000..11_000_000),
        market_cap: Some(rng.gen_range(10_000_000_000..1_010_000_000_000)),
        high,
        low,
        open,
        previous_close,
        country: None,
        sector: None,
        description: None,
    }
}

/// Marche aléatoire de `steps + 1` points se terminant à `now`
pub fn generate_history(
    rng: &mut impl Rng,
    request: &HistoryRequest,
    now: DateTime<Utc>,
) -> Vec<ChartPoint> {
    let mut price: f64 = 150.0 + rng.gen_range(0.0..100.0);

    (0..=request.steps)
        .rev()
        .map(|i| {
            price = (price + rng.gen_range(-0.5..0.5) * request.volatility).max(1.0);
            ChartPoint {
                time: now - request.step * i as i32,
                price: round2(request.currency.convert_from_usd(price)),
                volume: rng.gen_range(1_000_000..6_000_000),
            }
        })
        .collect()
}

/// Liste fixe de news, datées relativement à `now`
pub fn generate_news(now: DateTime<Utc>) -> Vec<NewsItem> {
    let items: [(&str, &str, &str, i64, &str, &str, &[&str]); 5] = [
        (
            "1",
            "Tech Stocks Rally as AI Investment Surge Continues",
            "Major technology companies see significant gains as artificial intelligence investments drive market optimism. Analysts predict continued growth in the sector.",
            2,
            "Market Watch",
            "https://images.pexels.com/photos/159888/pexels-photo-159888.jpeg?auto=compress&cs=tinysrgb&w=400",
            &["AAPL", "GOOGL", "MSFT"],
        ),
        (
            "2",
            "Federal Reserve Signals Potential Rate Changes",
            "The Federal Reserve hints at possible interest rate adjustments in response to current economic indicators, affecting market sentiment across sectors.",
            4,
            "Financial Times",
            "https://images.pexels.com/photos/259027/pexels-photo-259027.jpeg?auto=compress&cs=tinysrgb&w=400",
            &["SPY", "QQQ"],
        ),
        (
            "3",
            "Electric Vehicle Market Shows Strong Q4 Performance",
            "Electric vehicle manufacturers report robust quarterly results, with Tesla leading the charge in both sales and innovation metrics.",
            6,
            "Reuters",
            "https://images.pexels.com/photos/110844/pexels-photo-110844.jpeg?auto=compress&cs=tinysrgb&w=400",
            &["TSLA"],
        ),
        (
            "4",
            "Healthcare Sector Gains Momentum with New Drug Approvals",
            "Several pharmaceutical companies receive FDA approvals for breakthrough treatments, boosting investor confidence in the healthcare sector.",
            8,
            "Bloomberg",
            "https://images.pexels.com/photos/356040/pexels-photo-356040.jpeg?auto=compress&cs=tinysrgb&w=400",
            &["JNJ", "PFE"],
        ),
        (
            "5",
            "Streaming Wars Heat Up as Competition Intensifies",
            "Major streaming platforms announce new content strategies and pricing models as they compete for market share in the evolving entertainment landscape.",
            12,
            "CNBC",
            "https://images.pexels.com/photos/265685/pexels-photo-265685.jpeg?auto=compress&cs=tinysrgb&w=400",
            &["NFLX", "DIS"],
        ),
    ];

    items
        .iter()
        .map(|&(id, title, summary, hours_ago, source, image, symbols)| NewsItem {
            id: id.to_string(),
            title: title.to_string(),
            summary: summary.to_string(),
            url: format!("https://example.com/news/{}", id),
            published_at: now - chrono::Duration::hours(hours_ago),
            source: source.to_string(),
            image_url: Some(image.to_string()),
            related_symbols: symbols.iter().map(|s| s.to_string()).collect(),
        })
        .collect()
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::catalog::MARKET_SYMBOLS;
    use crate::models::TimeRange;

    fn market_symbols() -> Vec<String> {
        MARKET_SYMBOLS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_generate_quote_invariants() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..500 {
            let stock = generate_quote(&mut rng, "AAPL", "Apple Inc.");
            assert!(stock.has_consistent_range(), "{stock:?}");
            assert!((stock.previous_close - (stock.price - stock.change)).abs() < 0.011);
            let expected = stock.change / stock.previous_close * 100.0;
            assert!((stock.change_percent - expected).abs() <= 0.006);
            assert!(stock.price >= 50.0 && stock.price <= 550.0);
        }
    }

    #[test]
    fn test_history_length_and_order() {
        let mut rng = StdRng::seed_from_u64(2);
        let now = Utc::now();
        for range in TimeRange::all() {
            let request = HistoryRequest::for_range("MSFT", range, Currency::Usd);
            let points = generate_history(&mut rng, &request, now);
            assert_eq!(points.len(), range.steps() as usize + 1);
            assert!(points.windows(2).all(|w| w[0].time < w[1].time));
            assert_eq!(points.last().map(|p| p.time), Some(now));
        }
    }

    #[test]
    fn test_news_is_stable() {
        let now = Utc::now();
        let first = generate_news(now);
        assert_eq!(first.len(), 5);
        assert_eq!(first, generate_news(now));
        assert!(first[2].mentions("TSLA"));
    }

    #[tokio::test]
    async fn test_fetch_stocks_returns_market_symbols() {
        let source = MockMarketSource::seeded(3);
        let stocks = source
            .fetch_stocks(market_symbols(), Currency::Usd)
            .await
            .unwrap();

        let symbols: Vec<&str> = stocks.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(symbols, MARKET_SYMBOLS.to_vec());
    }

    #[tokio::test]
    async fn test_currency_conversion_matches_rate() {
        for currency in Currency::all() {
            let usd = MockMarketSource::seeded(42)
                .fetch_stocks(market_symbols(), Currency::Usd)
                .await
                .unwrap();
            let converted = MockMarketSource::seeded(42)
                .fetch_stocks(market_symbols(), currency)
                .await
                .unwrap();

            for (a, b) in usd.iter().zip(&converted) {
                assert!((a.price * currency.rate() - b.price).abs() < 0.0051);
            }
        }
    }

    #[tokio::test]
    async fn test_search_results_follow_currency() {
        let query = SearchQuery::new("apple", "United States", None);
        let usd = MockMarketSource::seeded(42).search(query.clone()).await.unwrap();
        let yen = MockMarketSource::seeded(42)
            .search(query.with_currency(Currency::Jpy))
            .await
            .unwrap();

        assert_eq!(usd.len(), 1);
        assert_eq!(yen.len(), 1);
        assert!((usd[0].price * Currency::Jpy.rate() - yen[0].price).abs() < 0.0051);
        assert!(yen[0].has_consistent_range());
    }

    #[tokio::test]
    async fn test_search_filters() {
        let source = MockMarketSource::seeded(4);

        let tech = source
            .search(SearchQuery::new("", "Germany", Some("Technology")))
            .await
            .unwrap();
        assert_eq!(tech.len(), 3);
        assert!(tech.iter().all(|s| s.sector.as_deref() == Some("Technology")));
        assert!(tech.iter().all(|s| s.country.as_deref() == Some("Germany")));

        let by_name = source
            .search(SearchQuery::new("apple", "United States", None))
            .await
            .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].symbol, "AAPL");
    }

    #[tokio::test]
    async fn test_profile_of_unknown_symbol() {
        let source = MockMarketSource::seeded(5);
        let stock = source.fetch_profile("zzz".to_string(), Currency::Usd).await.unwrap();
        assert_eq!(stock.symbol, "ZZZ");
        assert_eq!(stock.name, "ZZZ Corporation");
        assert_eq!(stock.sector.as_deref(), Some("Technology"));
        assert_eq!(stock.country.as_deref(), Some("United States"));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let source = MockMarketSource::seeded(6);
        source.set_failure(Some(FetchError::NetworkUnavailable("offline".into())));
        assert!(matches!(
            source.fetch_news().await,
            Err(FetchError::NetworkUnavailable(_))
        ));

        source.set_failure(None);
        assert!(source.fetch_news().await.is_ok());
    }
}
