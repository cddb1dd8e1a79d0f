// ============================================================================
// Structure : NewsItem
// ============================================================================
// Article de la page News
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Article d'actualité
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub source: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub related_symbols: Vec<String>,
}

impl NewsItem {
    /// Âge lisible : "2h ago", "3d ago"
    pub fn age(&self, now: DateTime<Utc>) -> String {
        let minutes = (now - self.published_at).num_minutes().max(0);
        if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 24 * 60 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / (24 * 60))
        }
    }

    /// Vérifie si l'article concerne un symbole donné
    pub fn mentions(&self, symbol: &str) -> bool {
        self.related_symbols
            .iter()
            .any(|s| s.eq_ignore_ascii_case(symbol))
    }

    /// Article lié à une action : symbole cité, ou nom de la société
    /// dans le titre (insensible à la casse)
    pub fn relates_to(&self, symbol: &str, company: &str) -> bool {
        let company = company.trim().to_lowercase();
        self.mentions(symbol)
            || (!company.is_empty() && self.title.to_lowercase().contains(&company))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_age_and_mentions() {
        let now = Utc::now();
        let item = NewsItem {
            id: "1".to_string(),
            title: "t".to_string(),
            summary: "s".to_string(),
            url: "https://example.com/news/1".to_string(),
            published_at: now - Duration::hours(4),
            source: "Reuters".to_string(),
            image_url: None,
            related_symbols: vec!["TSLA".to_string()],
        };

        assert_eq!(item.age(now), "4h ago");
        assert!(item.mentions("tsla"));
        assert!(!item.mentions("AAPL"));
    }

    #[test]
    fn test_relates_to_symbol_or_company_name() {
        let item = NewsItem {
            id: "2".to_string(),
            title: "Apple Inc. unveils a new chip".to_string(),
            summary: "s".to_string(),
            url: "https://example.com/news/2".to_string(),
            published_at: Utc::now(),
            source: "Bloomberg".to_string(),
            image_url: None,
            related_symbols: vec!["NVDA".to_string()],
        };

        assert!(item.relates_to("NVDA", "NVIDIA Corporation"));
        assert!(item.relates_to("AAPL", "apple inc."));
        assert!(!item.relates_to("MSFT", "Microsoft Corporation"));
        assert!(!item.relates_to("MSFT", "  "));
    }
}
