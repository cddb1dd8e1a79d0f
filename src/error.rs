// ============================================================================
// Erreurs de fetch
// ============================================================================
// Taxonomie fermée des échecs observables par les tâches de rafraîchissement,
// la géolocalisation, l'authentification et le portefeuille
//
// CONCEPT RUST : thiserror
// - #[derive(Error)] génère Display + std::error::Error
// - Les tests comparent le *type* d'erreur, pas le texte
//
// Le code applicatif (terminal, logs, config) reste en anyhow::Result
// ============================================================================

use std::time::Duration;

use thiserror::Error;

/// Échec d'un cycle de fetch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Source de données injoignable
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// Délai dépassé
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Réponse reçue mais inexploitable (statut HTTP, JSON invalide, ...)
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Saisie refusée avant toute mutation
    #[error("{0}")]
    ValidationFailed(String),

    /// Accès à la position refusé par l'utilisateur
    #[error("location permission denied")]
    PermissionDenied,

    /// Position indisponible sur cet appareil
    #[error("position unavailable")]
    PositionUnavailable,
}

impl FetchError {
    /// Catégorie courte, utilisée dans les logs
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::NetworkUnavailable(_) => "network_unavailable",
            FetchError::Timeout(_) => "timeout",
            FetchError::InvalidResponse(_) => "invalid_response",
            FetchError::ValidationFailed(_) => "validation_failed",
            FetchError::PermissionDenied => "permission_denied",
            FetchError::PositionUnavailable => "position_unavailable",
        }
    }
}

/// CONCEPT RUST : From pour l'opérateur ?
/// - Les erreurs reqwest sont classées selon leur nature
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(Duration::ZERO)
        } else if err.is_decode() || err.is_status() {
            FetchError::InvalidResponse(err.to_string())
        } else {
            FetchError::NetworkUnavailable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = FetchError::ValidationFailed("Passwords do not match".to_string());
        assert_eq!(err.to_string(), "Passwords do not match");
        assert_eq!(err.kind(), "validation_failed");
        assert_eq!(
            FetchError::Timeout(Duration::from_secs(10)).to_string(),
            "request timed out after 10s"
        );
    }
}
