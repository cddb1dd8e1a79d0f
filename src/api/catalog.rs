// ============================================================================
// Catalogue statique
// ============================================================================
// Actions connues, secteurs, descriptions et pays proposés par les sélecteurs
// ============================================================================

/// Entrée du catalogue de recherche
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub symbol: &'static str,
    pub name: &'static str,
    pub sector: &'static str,
}

/// Les 16 actions recherchables
pub const CATALOG: [CatalogEntry; 16] = [
    CatalogEntry { symbol: "AAPL", name: "Apple Inc.", sector: "Technology" },
    CatalogEntry { symbol: "GOOGL", name: "Alphabet Inc.", sector: "Communication Services" },
    CatalogEntry { symbol: "MSFT", name: "Microsoft Corporation", sector: "Technology" },
    CatalogEntry { symbol: "AMZN", name: "Amazon.com Inc.", sector: "Consumer Cyclical" },
    CatalogEntry { symbol: "TSLA", name: "Tesla Inc.", sector: "Consumer Cyclical" },
    CatalogEntry { symbol: "META", name: "Meta Platforms Inc.", sector: "Communication Services" },
    CatalogEntry { symbol: "NVDA", name: "NVIDIA Corporation", sector: "Technology" },
    CatalogEntry { symbol: "NFLX", name: "Netflix Inc.", sector: "Communication Services" },
    CatalogEntry { symbol: "JNJ", name: "Johnson & Johnson", sector: "Healthcare" },
    CatalogEntry { symbol: "PFE", name: "Pfizer Inc.", sector: "Healthcare" },
    CatalogEntry { symbol: "JPM", name: "JPMorgan Chase & Co.", sector: "Financial Services" },
    CatalogEntry { symbol: "BAC", name: "Bank of America Corp.", sector: "Financial Services" },
    CatalogEntry { symbol: "XOM", name: "Exxon Mobil Corporation", sector: "Energy" },
    CatalogEntry { symbol: "CVX", name: "Chevron Corporation", sector: "Energy" },
    CatalogEntry { symbol: "WMT", name: "Walmart Inc.", sector: "Consumer Defensive" },
    CatalogEntry { symbol: "PG", name: "Procter & Gamble Co.", sector: "Consumer Defensive" },
];

/// Symboles du tableau de bord (les 8 premières entrées du catalogue)
pub const MARKET_SYMBOLS: [&str; 8] = ["AAPL", "GOOGL", "MSFT", "AMZN", "TSLA", "META", "NVDA", "NFLX"];

/// Valeur "pas de filtre" du sélecteur de secteur
pub const ALL_SECTORS: &str = "All Sectors";

/// Secteurs proposés par la recherche
pub const SECTORS: [&str; 12] = [
    ALL_SECTORS,
    "Technology",
    "Healthcare",
    "Financial Services",
    "Consumer Cyclical",
    "Communication Services",
    "Industrials",
    "Consumer Defensive",
    "Energy",
    "Utilities",
    "Real Estate",
    "Materials",
];

/// Pays proposés par le sélecteur de pays
pub const COUNTRIES: [&str; 10] = [
    "United States",
    "United Kingdom",
    "Germany",
    "France",
    "Japan",
    "Canada",
    "Australia",
    "India",
    "China",
    "Brazil",
];

/// Raccourcis du formulaire d'ajout au portefeuille
pub const POPULAR_STOCKS: [(&str, &str); 6] = [
    ("AAPL", "Apple Inc."),
    ("GOOGL", "Alphabet Inc."),
    ("MSFT", "Microsoft Corporation"),
    ("AMZN", "Amazon.com Inc."),
    ("TSLA", "Tesla Inc."),
    ("META", "Meta Platforms Inc."),
];

/// Cherche un symbole dans le catalogue (insensible à la casse)
pub fn lookup(symbol: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|e| e.symbol.eq_ignore_ascii_case(symbol))
}

/// Nom d'affichage, "<SYMBOL> Corporation" pour un symbole inconnu
pub fn company_name(symbol: &str) -> String {
    lookup(symbol)
        .map(|e| e.name.to_string())
        .unwrap_or_else(|| format!("{} Corporation", symbol))
}

/// Secteur, "Technology" par défaut
pub fn sector(symbol: &str) -> &'static str {
    lookup(symbol).map(|e| e.sector).unwrap_or("Technology")
}

/// Description longue de la société
pub fn description(symbol: &str) -> String {
    let text = match symbol.to_uppercase().as_str() {
        "AAPL" => "Apple Inc. designs, manufactures, and markets smartphones, personal computers, tablets, wearables, and accessories worldwide. The company serves consumers, and small and mid-sized businesses; and the education, enterprise, and government markets.",
        "GOOGL" => "Alphabet Inc. provides various products and platforms in the United States, Europe, the Middle East, Africa, the Asia-Pacific, Canada, and Latin America. It operates through Google Services, Google Cloud, and Other Bets segments.",
        "MSFT" => "Microsoft Corporation develops, licenses, and supports software, services, devices, and solutions worldwide. The company operates in three segments: Productivity and Business Processes, Intelligent Cloud, and More Personal Computing.",
        "AMZN" => "Amazon.com, Inc. engages in the retail sale of consumer products and subscriptions in North America and internationally. The company operates through three segments: North America, International, and Amazon Web Services (AWS).",
        "TSLA" => "Tesla, Inc. designs, develops, manufactures, leases, and sells electric vehicles, and energy generation and storage systems in the United States, China, and internationally.",
        "META" => "Meta Platforms, Inc. develops products that enable people to connect and share with friends and family through mobile devices, personal computers, virtual reality headsets, wearables, and in-home devices worldwide.",
        "NVDA" => "NVIDIA Corporation provides graphics, and compute and networking solutions in the United States, Taiwan, China, and internationally. The company operates in two segments, Graphics and Compute & Networking.",
        "NFLX" => "Netflix, Inc. provides entertainment services. It offers TV series, documentaries, feature films, and mobile games across a wide variety of genres and languages to members in over 190 countries.",
        _ => {
            return format!(
                "{} is a leading company in its sector with a strong market presence and innovative products and services.",
                company_name(symbol)
            )
        }
    };
    text.to_string()
}

/// Vérifie qu'un pays fait partie des choix proposés
pub fn is_known_country(country: &str) -> bool {
    COUNTRIES.contains(&country)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_symbols_are_in_catalog() {
        for symbol in MARKET_SYMBOLS {
            assert!(lookup(symbol).is_some(), "{symbol} missing");
        }
    }

    #[test]
    fn test_unknown_symbol_defaults() {
        assert_eq!(company_name("ZZZ"), "ZZZ Corporation");
        assert_eq!(sector("ZZZ"), "Technology");
        assert!(description("ZZZ").starts_with("ZZZ Corporation is a leading company"));
    }

    #[test]
    fn test_lookup_case_insensitive() {
        assert_eq!(lookup("nflx").map(|e| e.name), Some("Netflix Inc."));
    }
}
