// ============================================================================
// Flux : recherche
// ============================================================================
// Recherche par symbole/nom et secteur, avec debounce (300 ms par défaut) :
// seule la dernière saisie d'une rafale déclenche une requête.
// Une requête vide sans secteur rend une liste vide sans appel à la source.
// ============================================================================

use std::sync::Arc;

use crate::api::{MarketDataSource, SearchQuery};
use crate::config::Config;
use crate::error::FetchError;
use crate::models::Stock;
use crate::refresh::{RefreshHandle, RefreshPolicy, Refresher};

pub struct SearchRefresher<S> {
    source: Arc<S>,
}

impl<S: MarketDataSource> SearchRefresher<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }
}

impl<S: MarketDataSource> Refresher for SearchRefresher<S> {
    type Params = SearchQuery;
    type Output = Vec<Stock>;

    fn name(&self) -> &'static str {
        "search"
    }

    fn immediate(&self, query: &SearchQuery) -> Option<Vec<Stock>> {
        query.is_blank().then(Vec::new)
    }

    async fn fetch(&self, query: SearchQuery) -> Result<Vec<Stock>, FetchError> {
        self.source.search(query).await
    }
}

pub type SearchFeed<S> = RefreshHandle<SearchRefresher<S>>;

/// Démarre le flux de recherche (debounce)
pub fn spawn_search_feed<S: MarketDataSource>(
    source: Arc<S>,
    config: &Config,
    query: SearchQuery,
) -> SearchFeed<S> {
    RefreshHandle::spawn(
        SearchRefresher::new(source),
        RefreshPolicy::debounced(config.search_debounce()),
        query,
    )
}
