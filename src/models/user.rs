// ============================================================================
// Structures : User, PortfolioItem
// ============================================================================
// Utilisateur de la session et lignes de son portefeuille simulé
//
// Vit uniquement en mémoire : créé à la connexion, détruit à la déconnexion
// ou à la fermeture de l'application
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Utilisateur connecté
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub is_pro: bool,
    pub portfolio: Vec<PortfolioItem>,
}

impl User {
    pub fn new(id: String, email: String, name: String) -> Self {
        Self {
            id,
            email,
            name,
            is_pro: false,
            portfolio: Vec::new(),
        }
    }

    pub fn membership_label(&self) -> &'static str {
        if self.is_pro {
            "Pro Member"
        } else {
            "Free Member"
        }
    }
}

/// Ligne (lot) du portefeuille
///
/// Un même symbole peut apparaître plusieurs fois (achats successifs)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    pub symbol: String,
    pub name: String,
    pub shares: f64,
    pub purchase_price: f64,
    pub current_price: f64,
    pub purchase_date: DateTime<Utc>,
}

impl PortfolioItem {
    /// Valeur actuelle de la ligne
    pub fn value(&self) -> f64 {
        self.current_price * self.shares
    }

    /// Plus/moins-value latente
    pub fn gain_loss(&self) -> f64 {
        (self.current_price - self.purchase_price) * self.shares
    }

    /// Plus/moins-value en pourcentage du prix d'achat
    pub fn gain_loss_percent(&self) -> f64 {
        if self.purchase_price == 0.0 {
            return 0.0;
        }
        (self.current_price - self.purchase_price) / self.purchase_price * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_gain_loss() {
        let item = PortfolioItem {
            symbol: "AAPL".to_string(),
            name: "Apple Inc.".to_string(),
            shares: 10.0,
            purchase_price: 150.0,
            current_price: 165.0,
            purchase_date: Utc::now(),
        };

        assert_eq!(item.value(), 1650.0);
        assert_eq!(item.gain_loss(), 150.0);
        assert!((item.gain_loss_percent() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_new_user_is_free() {
        let user = User::new("abc".into(), "a@b.c".into(), "a".into());
        assert!(!user.is_pro);
        assert!(user.portfolio.is_empty());
        assert_eq!(user.membership_label(), "Free Member");
    }
}
