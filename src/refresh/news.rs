// ============================================================================
// Flux : actualités
// ============================================================================
// Liste des news, rafraîchie toutes les 5 minutes (configurable)
// ============================================================================

use std::sync::Arc;

use crate::api::MarketDataSource;
use crate::config::Config;
use crate::error::FetchError;
use crate::models::NewsItem;
use crate::refresh::{RefreshHandle, RefreshPolicy, Refresher};

pub struct NewsRefresher<S> {
    source: Arc<S>,
}

impl<S: MarketDataSource> NewsRefresher<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }
}

impl<S: MarketDataSource> Refresher for NewsRefresher<S> {
    type Params = ();
    type Output = Vec<NewsItem>;

    fn name(&self) -> &'static str {
        "news"
    }

    async fn fetch(&self, _params: ()) -> Result<Vec<NewsItem>, FetchError> {
        self.source.fetch_news().await
    }
}

pub type NewsFeed<S> = RefreshHandle<NewsRefresher<S>>;

pub fn spawn_news_feed<S: MarketDataSource>(source: Arc<S>, config: &Config) -> NewsFeed<S> {
    RefreshHandle::spawn(
        NewsRefresher::new(source),
        RefreshPolicy::polling(config.news_poll()),
        (),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockMarketSource;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_news_feed_polls_and_recovers() {
        let source = Arc::new(MockMarketSource::seeded(41));
        let mut feed = spawn_news_feed(Arc::clone(&source), &Config::default());

        while feed.state().data.is_none() {
            assert!(feed.changed().await);
        }
        assert_eq!(feed.state().data.map(|n| n.len()), Some(5));

        // Panne au prochain cycle : les news restent affichées
        source.set_failure(Some(FetchError::NetworkUnavailable("offline".into())));
        tokio::time::sleep(Duration::from_secs(301)).await;
        let state = feed.state();
        assert_eq!(state.sequence, 2);
        assert!(state.has_error());
        assert_eq!(state.data.map(|n| n.len()), Some(5));

        source.set_failure(None);
        feed.retry();
        while feed.state().sequence < 3 || feed.state().loading {
            assert!(feed.changed().await);
        }
        assert!(feed.state().error.is_none());
    }
}
