// ============================================================================
// Gestion des événements
// ============================================================================
// Gère les événements clavier et les ticks de l'application
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. Pattern matching sur KeyCode et KeyModifiers
// 3. Error handling avec Result
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Délai d'attente d'un événement avant de produire un Tick
const POLL_TIMEOUT: Duration = Duration::from_millis(250);

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Tick régulier : la boucle redessine avec le dernier état publié
    Tick,

    /// Erreur survenue
    Error,
}

/// Gestionnaire d'événements
pub struct EventHandler {
    timeout: Duration,
}

impl EventHandler {
    pub fn new() -> Self {
        Self {
            timeout: POLL_TIMEOUT,
        }
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// CONCEPT : Non-blocking I/O avec timeout
    /// - poll(timeout) attend au plus 250ms
    /// - Si pas d'événement, retourne Ok(Event::Tick)
    /// - Les fetchs continuent dans leurs tâches pendant l'attente
    pub fn next(&self) -> Result<Event> {
        if !event::poll(self.timeout)? {
            return Ok(Event::Tick);
        }

        match event::read()? {
            // Sur certains OS, on reçoit Press ET Release
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
            // Resize : le prochain draw recalcule le layout
            _ => Ok(Event::Tick),
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helpers : Convertir KeyEvent en action
// ============================================================================

fn key_code(event: &Event) -> Option<KeyCode> {
    match event {
        Event::Key(key) => Some(key.code),
        Event::Tick | Event::Error => None,
    }
}

fn is_char(event: &Event, c: char) -> bool {
    key_code(event) == Some(KeyCode::Char(c))
}

/// 'q' : quitter (avec confirmation)
pub fn is_quit_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('q') | KeyCode::Char('Q')))
}

/// Ctrl+C : quitter sans confirmation
pub fn is_force_quit_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
    } else {
        false
    }
}

pub fn is_escape_event(event: &Event) -> bool {
    key_code(event) == Some(KeyCode::Esc)
}

pub fn is_enter_event(event: &Event) -> bool {
    key_code(event) == Some(KeyCode::Enter)
}

/// Flèche vers le haut ou 'k' (vim)
pub fn is_up_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Up | KeyCode::Char('k')))
}

/// Flèche vers le bas ou 'j' (vim)
pub fn is_down_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Down | KeyCode::Char('j')))
}

/// Tab : onglet suivant / champ suivant
pub fn is_tab_event(event: &Event) -> bool {
    key_code(event) == Some(KeyCode::Tab)
}

/// Shift+Tab
pub fn is_backtab_event(event: &Event) -> bool {
    key_code(event) == Some(KeyCode::BackTab)
}

/// 'l' ou flèche droite : période suivante du graphique
pub fn is_next_range_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Right | KeyCode::Char('l')))
}

/// 'h' ou flèche gauche : période précédente
pub fn is_previous_range_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Left | KeyCode::Char('h')))
}

pub fn is_retry_event(event: &Event) -> bool {
    is_char(event, 'r')
}

pub fn is_currency_event(event: &Event) -> bool {
    is_char(event, 'c')
}

/// 'o' : pays suivant
pub fn is_country_event(event: &Event) -> bool {
    is_char(event, 'o')
}

/// 'p' : période de l'historique de l'accueil
pub fn is_period_event(event: &Event) -> bool {
    is_char(event, 'p')
}

/// '/' : saisie de la recherche
pub fn is_search_event(event: &Event) -> bool {
    is_char(event, '/')
}

/// 's' : secteur suivant
pub fn is_sector_event(event: &Event) -> bool {
    is_char(event, 's')
}

/// 'a' : ajout au portefeuille
pub fn is_add_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('a') | KeyCode::Char('A')))
}

/// 'd' : suppression (avec confirmation)
pub fn is_delete_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('d') | KeyCode::Char('D')))
}

pub fn is_sign_in_event(event: &Event) -> bool {
    is_char(event, 'i')
}

pub fn is_sign_up_event(event: &Event) -> bool {
    is_char(event, 'n')
}

pub fn is_sign_out_event(event: &Event) -> bool {
    is_char(event, 'x')
}

/// 'u' : passage en Pro
pub fn is_upgrade_event(event: &Event) -> bool {
    is_char(event, 'u')
}

pub fn is_backspace_event(event: &Event) -> bool {
    key_code(event) == Some(KeyCode::Backspace)
}

/// '1' à '6' : raccourci d'action populaire, retourne l'index
pub fn popular_index_from_event(event: &Event) -> Option<usize> {
    match key_code(event) {
        Some(KeyCode::Char(c @ '1'..='6')) => c.to_digit(10).map(|d| d as usize - 1),
        _ => None,
    }
}

/// Extrait le caractère imprimable d'un événement clavier
///
/// Les combinaisons Ctrl/Alt ne produisent pas de caractère.
pub fn get_char_from_event(event: &Event) -> Option<char> {
    if let Event::Key(key) = event {
        if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return None;
        }
        if let KeyCode::Char(c) = key.code {
            return Some(c);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    #[test]
    fn test_is_quit_event() {
        assert!(is_quit_event(&key(KeyCode::Char('q'))));
        assert!(!is_quit_event(&key(KeyCode::Char('a'))));
        assert!(!is_quit_event(&Event::Tick));
    }

    #[test]
    fn test_force_quit_needs_control() {
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(is_force_quit_event(&ctrl_c));
        assert!(!is_force_quit_event(&key(KeyCode::Char('c'))));
        assert_eq!(get_char_from_event(&ctrl_c), None);
    }

    #[test]
    fn test_popular_index() {
        assert_eq!(popular_index_from_event(&key(KeyCode::Char('1'))), Some(0));
        assert_eq!(popular_index_from_event(&key(KeyCode::Char('6'))), Some(5));
        assert_eq!(popular_index_from_event(&key(KeyCode::Char('7'))), None);
    }

    #[test]
    fn test_range_keys() {
        assert!(is_next_range_event(&key(KeyCode::Right)));
        assert!(is_previous_range_event(&key(KeyCode::Char('h'))));
        assert!(!is_next_range_event(&key(KeyCode::Char('h'))));
    }
}
