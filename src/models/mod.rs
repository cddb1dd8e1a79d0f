// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
// ============================================================================

pub mod currency;   // Devises et taux de conversion
pub mod news;       // Articles d'actualité
pub mod stock;      // Cotations, historiques, snapshots de marché
pub mod time_range; // Périodes de la vue détail
pub mod user;       // Utilisateur et portefeuille

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use stockflow::models::stock::Stock;
// On peut faire : use stockflow::models::Stock;
pub use currency::Currency;
pub use news::NewsItem;
pub use stock::{ChartPoint, MarketData, MarketOverview, MarketStatus, Stock};
pub use time_range::TimeRange;
pub use user::{PortfolioItem, User};
