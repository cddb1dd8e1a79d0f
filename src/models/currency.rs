// ============================================================================
// Enum : Currency
// ============================================================================
// Devises d'affichage proposées par le sélecteur de devise
//
// Les prix sont générés en USD puis convertis avec un taux fixe :
// prix(C) = prix(USD) × taux(C)
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Devise d'affichage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Dollar américain (devise de référence)
    #[default]
    Usd,
    /// Euro
    Eur,
    /// Livre sterling
    Gbp,
    /// Yen japonais
    Jpy,
}

impl Currency {
    /// Taux de conversion depuis l'USD
    pub fn rate(&self) -> f64 {
        match self {
            Currency::Usd => 1.0,
            Currency::Eur => 0.85,
            Currency::Gbp => 0.73,
            Currency::Jpy => 110.0,
        }
    }

    /// Convertit un montant USD dans cette devise
    pub fn convert_from_usd(&self, amount: f64) -> f64 {
        amount * self.rate()
    }

    /// Code ISO (ex: "EUR")
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
        }
    }

    /// Symbole affiché devant les prix
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Jpy => "¥",
        }
    }

    /// Libellé long pour le sélecteur
    pub fn label(&self) -> &'static str {
        match self {
            Currency::Usd => "US Dollar",
            Currency::Eur => "Euro",
            Currency::Gbp => "British Pound",
            Currency::Jpy => "Japanese Yen",
        }
    }

    /// Toutes les devises, dans l'ordre du sélecteur
    pub fn all() -> [Currency; 4] {
        [Currency::Usd, Currency::Eur, Currency::Gbp, Currency::Jpy]
    }

    /// Devise suivante (cycle USD → EUR → GBP → JPY → USD)
    pub fn next(&self) -> Currency {
        match self {
            Currency::Usd => Currency::Eur,
            Currency::Eur => Currency::Gbp,
            Currency::Gbp => Currency::Jpy,
            Currency::Jpy => Currency::Usd,
        }
    }

    /// Formate un montant avec le symbole de la devise
    pub fn format(&self, amount: f64) -> String {
        format!("{}{:.2}", self.symbol(), amount)
    }

    /// Convertit un montant USD puis le formate dans cette devise
    pub fn format_usd(&self, usd: f64) -> String {
        self.format(self.convert_from_usd(usd))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// CONCEPT RUST : FromStr
/// - Permet "EUR".parse::<Currency>()
/// - Les codes inconnus sont refusés au lieu d'être stockés tels quels
impl FromStr for Currency {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "JPY" => Ok(Currency::Jpy),
            other => Err(FetchError::ValidationFailed(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        assert_eq!(Currency::Usd.rate(), 1.0);
        assert_eq!(Currency::Eur.rate(), 0.85);
        assert_eq!(Currency::Gbp.rate(), 0.73);
        assert_eq!(Currency::Jpy.rate(), 110.0);
    }

    #[test]
    fn test_convert_from_usd() {
        assert!((Currency::Eur.convert_from_usd(100.0) - 85.0).abs() < 1e-9);
        assert!((Currency::Jpy.convert_from_usd(2.0) - 220.0).abs() < 1e-9);
    }

    #[test]
    fn test_format_usd_converts_before_formatting() {
        assert_eq!(Currency::Usd.format_usd(150.0), "$150.00");
        assert_eq!(Currency::Eur.format_usd(150.0), "€127.50");
        assert_eq!(Currency::Jpy.format_usd(2.5), "¥275.00");
    }

    #[test]
    fn test_parse() {
        assert_eq!("eur".parse::<Currency>().unwrap(), Currency::Eur);
        assert!(matches!(
            "CHF".parse::<Currency>(),
            Err(FetchError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_next_cycles() {
        let mut c = Currency::Usd;
        for _ in 0..4 {
            c = c.next();
        }
        assert_eq!(c, Currency::Usd);
    }
}
