// ============================================================================
// Contexte de session : AppContext
// ============================================================================
// Valeurs partagées par tous les écrans :
// - utilisateur connecté (ou aucun)
// - devise d'affichage
// - pays sélectionné
//
// Possédé par App, passé en &mut aux opérations qui le modifient.
// Rien n'est persisté : le contexte meurt avec le processus.
// ============================================================================

use tracing::info;

use crate::api::catalog;
use crate::error::FetchError;
use crate::models::{Currency, User};

/// Pays par défaut
pub const DEFAULT_COUNTRY: &str = "United States";

#[derive(Debug, Clone, PartialEq)]
pub struct AppContext {
    user: Option<User>,
    currency: Currency,
    selected_country: String,
}

impl AppContext {
    pub fn new() -> Self {
        Self {
            user: None,
            currency: Currency::Usd,
            selected_country: DEFAULT_COUNTRY.to_string(),
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_pro(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_pro)
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn selected_country(&self) -> &str {
        &self.selected_country
    }

    /// Remplace l'utilisateur en bloc (None : déconnexion)
    pub fn set_user(&mut self, user: Option<User>) {
        match &user {
            Some(u) => info!(user_id = %u.id, pro = u.is_pro, "User set"),
            None => info!("User cleared"),
        }
        self.user = user;
    }

    pub fn set_currency(&mut self, currency: Currency) {
        info!(currency = %currency, "Currency changed");
        self.currency = currency;
    }

    /// Change la devise à partir de son code ("EUR", "jpy", ...)
    pub fn set_currency_code(&mut self, code: &str) -> Result<(), FetchError> {
        let currency = code.parse::<Currency>()?;
        self.set_currency(currency);
        Ok(())
    }

    /// Change le pays (uniquement parmi les pays proposés)
    pub fn set_selected_country(&mut self, country: &str) -> Result<(), FetchError> {
        if !catalog::is_known_country(country) {
            return Err(FetchError::ValidationFailed(format!(
                "Unknown country: {}",
                country
            )));
        }
        info!(country, "Country changed");
        self.selected_country = country.to_string();
        Ok(())
    }

    /// Passe l'utilisateur connecté en Pro
    pub fn upgrade_to_pro(&mut self) -> Result<(), FetchError> {
        let mut user = self
            .user
            .clone()
            .ok_or_else(|| FetchError::ValidationFailed("Sign in to upgrade to Pro".to_string()))?;
        user.is_pro = true;
        self.set_user(Some(user));
        Ok(())
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new("abc123xyz".into(), "jane@example.com".into(), "jane".into())
    }

    #[test]
    fn test_defaults() {
        let ctx = AppContext::default();
        assert_eq!(ctx.currency(), Currency::Usd);
        assert_eq!(ctx.selected_country(), "United States");
        assert!(ctx.user().is_none());
        assert!(!ctx.is_pro());
    }

    #[test]
    fn test_set_currency_code() {
        let mut ctx = AppContext::new();
        ctx.set_currency_code("gbp").unwrap();
        assert_eq!(ctx.currency(), Currency::Gbp);

        assert!(matches!(
            ctx.set_currency_code("CHF"),
            Err(FetchError::ValidationFailed(_))
        ));
        assert_eq!(ctx.currency(), Currency::Gbp);
    }

    #[test]
    fn test_country_must_be_offered() {
        let mut ctx = AppContext::new();
        ctx.set_selected_country("Japan").unwrap();
        assert_eq!(ctx.selected_country(), "Japan");

        assert!(ctx.set_selected_country("Atlantis").is_err());
        assert_eq!(ctx.selected_country(), "Japan");
    }

    #[test]
    fn test_upgrade_requires_user() {
        let mut ctx = AppContext::new();
        assert!(ctx.upgrade_to_pro().is_err());

        ctx.set_user(Some(user()));
        ctx.upgrade_to_pro().unwrap();
        assert!(ctx.is_pro());
        assert_eq!(ctx.user().map(|u| u.email.as_str()), Some("jane@example.com"));
    }

    #[test]
    fn test_set_user_none_signs_out() {
        let mut ctx = AppContext::new();
        ctx.set_user(Some(user()));
        assert!(ctx.is_signed_in());
        ctx.set_user(None);
        assert!(!ctx.is_signed_in());
    }
}
