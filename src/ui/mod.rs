// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod account;   // Compte et page Pro
pub mod chart;     // Graphique ligne + écran de détail
pub mod dashboard; // Routeur, éléments communs, accueil
pub mod events;    // Gestion des événements clavier
pub mod news;      // Actualités
pub mod portfolio; // Portefeuille
pub mod search;    // Recherche

// Re-exports pour simplifier les imports
pub use dashboard::render;
pub use events::{Event, EventHandler};
