// ============================================================================
// StockFlow - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;       // Sources de données (mock, geocoder)
pub mod app;       // État de l'application
pub mod auth;      // Authentification simulée
pub mod config;    // Configuration (fichier JSON optionnel)
pub mod context;   // Contexte de session (utilisateur, devise, pays)
pub mod error;     // Taxonomie des erreurs de fetch
pub mod location;  // Géolocalisation + reverse geocoding
pub mod models;    // Structures de données
pub mod portfolio; // Portefeuille simulé
pub mod refresh;   // Tâches de rafraîchissement (polling, debounce)
pub mod ui;        // Interface utilisateur
