// ============================================================================
// Structure : RefreshState
// ============================================================================
// Ce que voit l'interface d'une tâche de rafraîchissement : dernier résultat,
// indicateur de chargement, dernière erreur
//
// Politique "stale-while-error" :
// - un succès remplace les données et efface l'erreur
// - un échec pose l'erreur mais GARDE les données précédentes
// ============================================================================

use chrono::{DateTime, Utc};

use crate::error::FetchError;

/// État publié par une tâche de rafraîchissement
#[derive(Debug, Clone)]
pub struct RefreshState<T> {
    /// Dernier résultat réussi (None tant qu'aucun fetch n'a abouti)
    pub data: Option<T>,

    /// Un fetch est en cours
    pub loading: bool,

    /// Erreur du dernier cycle terminé
    pub error: Option<FetchError>,

    /// Numéro de séquence du dernier résultat appliqué (0 : aucun)
    pub sequence: u64,

    /// Horodatage du dernier résultat appliqué
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> RefreshState<T> {
    /// Début d'un cycle : chargement, erreur effacée
    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Fin d'un cycle avec son résultat
    pub fn finish(&mut self, sequence: u64, result: Result<T, FetchError>) {
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
            }
            Err(err) => {
                self.error = Some(err);
            }
        }
        self.loading = false;
        self.sequence = sequence;
        self.updated_at = Some(Utc::now());
    }

    /// Résultat fourni sans fetch (court-circuit)
    pub fn settle(&mut self, data: T) {
        self.data = Some(data);
        self.error = None;
        self.loading = false;
        self.updated_at = Some(Utc::now());
    }

    /// Premier chargement : rien à afficher encore
    pub fn is_initial_load(&self) -> bool {
        self.loading && self.data.is_none()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

impl<T> Default for RefreshState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            sequence: 0,
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_keeps_previous_data() {
        let mut state = RefreshState::default();
        state.begin();
        state.finish(1, Ok(10));
        assert_eq!(state.data, Some(10));

        state.begin();
        assert!(state.loading);
        state.finish(2, Err(FetchError::Timeout(std::time::Duration::from_secs(1))));

        assert_eq!(state.data, Some(10));
        assert!(state.has_error());
        assert!(!state.loading);
        assert_eq!(state.sequence, 2);
    }

    #[test]
    fn test_begin_clears_error() {
        let mut state: RefreshState<u32> = RefreshState::default();
        state.finish(1, Err(FetchError::PositionUnavailable));
        state.begin();
        assert!(state.error.is_none());
        assert!(state.is_initial_load());
    }
}
