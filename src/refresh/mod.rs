// ============================================================================
// Module : refresh
// ============================================================================
// Tâches de rafraîchissement en arrière-plan
//
// - handle : moteur générique (polling, debounce, séquences, retry)
// - state  : état publié vers l'interface
// - market / detail / search / news : un fournisseur par flux de données
// ============================================================================

pub mod detail;
pub mod handle;
pub mod market;
pub mod news;
pub mod search;
pub mod state;

pub use detail::{DetailFeed, DetailParams, DetailRefresher, StockDetail};
pub use handle::{RefreshHandle, RefreshPolicy, Refresher};
pub use market::{MarketFeed, MarketParams, MarketRefresher, MarketSnapshot};
pub use news::{NewsFeed, NewsRefresher};
pub use search::{SearchFeed, SearchRefresher};
pub use state::RefreshState;
