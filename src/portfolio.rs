// ============================================================================
// Portefeuille simulé
// ============================================================================
// Ajout / suppression de lignes et totaux
//
// Le prix actuel d'une ligne est simulé : prix d'achat ± 10 %.
// Les mutations reconstruisent l'utilisateur et le repassent au contexte.
// ============================================================================

use chrono::Utc;
use rand::Rng;
use tracing::{info, warn};

use crate::context::AppContext;
use crate::error::FetchError;
use crate::models::stock::round2;
use crate::models::{PortfolioItem, User};

pub use crate::api::catalog::POPULAR_STOCKS;

/// Saisie du formulaire d'ajout (texte brut, comme tapé)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoldingForm {
    pub symbol: String,
    pub name: String,
    pub shares: String,
    pub purchase_price: String,
}

/// Saisie validée
#[derive(Debug, Clone, PartialEq)]
pub struct ValidHolding {
    pub symbol: String,
    pub name: String,
    pub shares: f64,
    pub purchase_price: f64,
}

impl HoldingForm {
    pub fn new(symbol: &str, name: &str, shares: &str, purchase_price: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            shares: shares.to_string(),
            purchase_price: purchase_price.to_string(),
        }
    }

    /// Pré-remplit symbole et nom depuis un raccourci
    pub fn pick(&mut self, symbol: &str, name: &str) {
        self.symbol = symbol.to_string();
        self.name = name.to_string();
    }

    pub fn validate(&self) -> Result<ValidHolding, FetchError> {
        let symbol = self.symbol.trim();
        let name = self.name.trim();
        let shares = self.shares.trim();
        let price = self.purchase_price.trim();

        if symbol.is_empty() || name.is_empty() || shares.is_empty() || price.is_empty() {
            return Err(FetchError::ValidationFailed(
                "Please fill in all fields".to_string(),
            ));
        }

        let shares: f64 = shares.parse().map_err(|_| {
            FetchError::ValidationFailed("Shares must be a number".to_string())
        })?;
        let purchase_price: f64 = price.parse().map_err(|_| {
            FetchError::ValidationFailed("Purchase price must be a number".to_string())
        })?;

        if !(shares > 0.0 && purchase_price > 0.0) || !shares.is_finite() || !purchase_price.is_finite() {
            return Err(FetchError::ValidationFailed(
                "Shares and purchase price must be positive numbers".to_string(),
            ));
        }

        Ok(ValidHolding {
            symbol: symbol.to_uppercase(),
            name: name.to_string(),
            shares,
            purchase_price,
        })
    }
}

/// Utilisateur connecté, ou erreur
fn signed_in_user(ctx: &AppContext) -> Result<User, FetchError> {
    ctx.user()
        .cloned()
        .ok_or_else(|| FetchError::ValidationFailed("Sign in to manage your portfolio".to_string()))
}

/// Ajoute une ligne au portefeuille de l'utilisateur connecté
pub fn add_holding(ctx: &mut AppContext, form: &HoldingForm) -> Result<PortfolioItem, FetchError> {
    add_holding_with(ctx, form, &mut rand::thread_rng())
}

/// Comme add_holding, avec un générateur fourni
pub fn add_holding_with(
    ctx: &mut AppContext,
    form: &HoldingForm,
    rng: &mut impl Rng,
) -> Result<PortfolioItem, FetchError> {
    let holding = form.validate().map_err(|e| {
        warn!(error = %e, "Holding rejected");
        e
    })?;
    let mut user = signed_in_user(ctx)?;

    let drift = rng.gen_range(-0.10..=0.10);
    let item = PortfolioItem {
        symbol: holding.symbol,
        name: holding.name,
        shares: holding.shares,
        purchase_price: holding.purchase_price,
        current_price: round2(holding.purchase_price * (1.0 + drift)),
        purchase_date: Utc::now(),
    };

    info!(symbol = %item.symbol, shares = item.shares, price = item.purchase_price, "Holding added");

    user.portfolio.push(item.clone());
    ctx.set_user(Some(user));
    Ok(item)
}

/// Retire toutes les lignes d'un symbole, retourne le nombre de lignes retirées
pub fn remove_holding(ctx: &mut AppContext, symbol: &str) -> Result<usize, FetchError> {
    let mut user = signed_in_user(ctx)?;

    let before = user.portfolio.len();
    user.portfolio.retain(|item| !item.symbol.eq_ignore_ascii_case(symbol));
    let removed = before - user.portfolio.len();

    info!(symbol, removed, "Holdings removed");

    ctx.set_user(Some(user));
    Ok(removed)
}

/// Totaux du portefeuille
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub total_cost: f64,
    pub total_gain_loss: f64,
    pub total_gain_loss_percent: f64,
    pub holdings: usize,
}

impl PortfolioSummary {
    pub fn of(items: &[PortfolioItem]) -> Self {
        let total_value: f64 = items.iter().map(PortfolioItem::value).sum();
        let total_cost: f64 = items.iter().map(|i| i.purchase_price * i.shares).sum();
        let total_gain_loss = total_value - total_cost;
        let total_gain_loss_percent = if total_cost > 0.0 {
            total_gain_loss / total_cost * 100.0
        } else {
            0.0
        };

        Self {
            total_value,
            total_cost,
            total_gain_loss,
            total_gain_loss_percent,
            holdings: items.len(),
        }
    }

    pub fn is_positive(&self) -> bool {
        self.total_gain_loss >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn signed_in() -> AppContext {
        let mut ctx = AppContext::new();
        ctx.set_user(Some(User::new(
            "k3j5h2l9q".into(),
            "sam@example.com".into(),
            "sam".into(),
        )));
        ctx
    }

    #[test]
    fn test_add_holding_appends_one_entry() {
        let mut ctx = signed_in();
        let form = HoldingForm::new("aapl", "Apple Inc.", "10", "150");

        let item = add_holding(&mut ctx, &form).unwrap();

        let portfolio = &ctx.user().unwrap().portfolio;
        assert_eq!(portfolio.len(), 1);
        assert_eq!(portfolio[0], item);
        assert_eq!(item.symbol, "AAPL");
        assert_eq!(item.shares, 10.0);
        assert!(item.current_price >= 120.0 && item.current_price <= 180.0);
    }

    #[test]
    fn test_drift_stays_within_ten_percent() {
        let mut ctx = signed_in();
        let mut rng = StdRng::seed_from_u64(7);
        let form = HoldingForm::new("MSFT", "Microsoft Corporation", "1", "100");
        for _ in 0..200 {
            let item = add_holding_with(&mut ctx, &form, &mut rng).unwrap();
            assert!(item.current_price >= 90.0 && item.current_price <= 110.0);
        }
    }

    #[test]
    fn test_validation_errors() {
        let missing = HoldingForm::new("AAPL", "", "10", "150");
        assert_eq!(
            missing.validate(),
            Err(FetchError::ValidationFailed("Please fill in all fields".into()))
        );

        let negative = HoldingForm::new("AAPL", "Apple Inc.", "-1", "150");
        assert_eq!(
            negative.validate(),
            Err(FetchError::ValidationFailed(
                "Shares and purchase price must be positive numbers".into()
            ))
        );

        let garbage = HoldingForm::new("AAPL", "Apple Inc.", "ten", "150");
        assert!(garbage.validate().is_err());
    }

    #[test]
    fn test_rejected_form_leaves_portfolio_untouched() {
        let mut ctx = signed_in();
        let form = HoldingForm::new("AAPL", "Apple Inc.", "0", "150");
        assert!(add_holding(&mut ctx, &form).is_err());
        assert!(ctx.user().unwrap().portfolio.is_empty());
    }

    #[test]
    fn test_add_requires_user() {
        let mut ctx = AppContext::new();
        let form = HoldingForm::new("AAPL", "Apple Inc.", "10", "150");
        assert!(add_holding(&mut ctx, &form).is_err());
    }

    #[test]
    fn test_remove_all_lots_of_symbol() {
        let mut ctx = signed_in();
        add_holding(&mut ctx, &HoldingForm::new("AAPL", "Apple Inc.", "10", "150")).unwrap();
        add_holding(&mut ctx, &HoldingForm::new("TSLA", "Tesla Inc.", "2", "200")).unwrap();
        add_holding(&mut ctx, &HoldingForm::new("AAPL", "Apple Inc.", "5", "160")).unwrap();

        assert_eq!(remove_holding(&mut ctx, "aapl").unwrap(), 2);
        let portfolio = &ctx.user().unwrap().portfolio;
        assert_eq!(portfolio.len(), 1);
        assert_eq!(portfolio[0].symbol, "TSLA");

        assert_eq!(remove_holding(&mut ctx, "NFLX").unwrap(), 0);
    }

    #[test]
    fn test_summary() {
        let now = Utc::now();
        let items = vec![
            PortfolioItem {
                symbol: "AAPL".into(),
                name: "Apple Inc.".into(),
                shares: 10.0,
                purchase_price: 100.0,
                current_price: 110.0,
                purchase_date: now,
            },
            PortfolioItem {
                symbol: "TSLA".into(),
                name: "Tesla Inc.".into(),
                shares: 1.0,
                purchase_price: 200.0,
                current_price: 150.0,
                purchase_date: now,
            },
        ];

        let summary = PortfolioSummary::of(&items);
        assert_eq!(summary.holdings, 2);
        assert_eq!(summary.total_value, 1250.0);
        assert_eq!(summary.total_cost, 1200.0);
        assert_eq!(summary.total_gain_loss, 50.0);
        assert!((summary.total_gain_loss_percent - 50.0 / 12.0).abs() < 1e-9);
        assert!(summary.is_positive());

        assert_eq!(PortfolioSummary::of(&[]).total_gain_loss_percent, 0.0);
    }
}
