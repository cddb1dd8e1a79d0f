// ============================================================================
// StockFlow - Tableau de bord boursier en terminal
// ============================================================================
// Programme TUI : marché, actualités, détail d'une action, recherche,
// portefeuille et compte, alimentés par des données simulées
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle infinie qui gère événements et rendering
// 3. Runtime tokio multi-thread : les flux de données vivent dans des tâches
// 4. Worker thread + channels : commandes ponctuelles (auth, géolocalisation)
// ============================================================================

use std::io;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use stockflow::api::{BigDataCloudGeocoder, MockMarketSource};
use stockflow::app::{App, InputMode, Screen};
use stockflow::auth::{self, AuthRequest};
use stockflow::config::Config;
use stockflow::error::FetchError;
use stockflow::location::{resolve_location, ConfiguredLocator, Location};
use stockflow::models::User;
use stockflow::ui::events::{Event, EventHandler};
use stockflow::ui::render;

// ============================================================================
// AppCommand / AppResult : échanges avec le worker thread
// ============================================================================
// CONCEPT RUST : Command pattern avec channels
// - L'event loop envoie des commandes au worker thread
// - Le worker exécute la tâche async et renvoie un AppResult
// - Les flux de rafraîchissement, eux, tournent dans leurs propres tâches
// ============================================================================

/// Commandes envoyées au worker thread
#[derive(Debug, Clone)]
enum AppCommand {
    /// Connexion ou inscription (délai simulé)
    Authenticate(AuthRequest),

    /// Position + reverse geocoding
    DetectLocation,
}

impl AppCommand {
    /// Nom pour les logs (la demande d'auth contient un mot de passe)
    fn name(&self) -> &'static str {
        match self {
            AppCommand::Authenticate(_) => "authenticate",
            AppCommand::DetectLocation => "detect_location",
        }
    }
}

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
enum AppResult {
    Authenticated(Result<User, FetchError>),
    LocationResolved(Location),
}

// ============================================================================
// Logging
// ============================================================================

/// Répertoire des logs : <data local>/stockflow/logs, sinon ./logs
fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("stockflow").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Initialise le système de logging avec tracing
///
/// CONCEPT : Les logs vont dans un fichier, pas sur stdout
/// - stdout appartient au TUI
/// - Rotation quotidienne (stockflow.log.YYYY-MM-DD)
/// - Niveau réglable avec RUST_LOG
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "stockflow.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockflow=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée
// ============================================================================

fn main() -> Result<()> {
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!("StockFlow starting up");

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = ?e, "Invalid configuration, using defaults");
        Config::default()
    });
    debug!(?config, "Configuration loaded");

    // CONCEPT : Runtime "entered"
    // - Le thread principal n'exécute pas de future
    // - mais tokio::spawn (appelé par App) trouve le runtime via le guard
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("stockflow-refresh")
        .build()
        .context("Échec de la création du runtime tokio")?;
    let guard = runtime.enter();

    install_panic_hook();

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let source = Arc::new(MockMarketSource::from_config(&config));
    let app = Arc::new(Mutex::new(App::new(source, config.clone())));

    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    let worker =
        spawn_background_worker(runtime.handle().clone(), config, command_rx, result_tx, Arc::clone(&app));

    // La détection de position démarre avec l'application
    if command_tx.send(AppCommand::DetectLocation).is_err() {
        warn!("Worker unavailable, using default location");
        lock(&app).set_location(Location::fallback());
    }

    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, Arc::clone(&app), &events, command_tx, result_rx);

    debug!("Restoring terminal");
    let restored = restore_terminal(&mut terminal);

    // run a consommé command_tx : le worker termine sa commande en cours
    // (block_on sur le runtime encore vivant) puis sort de sa boucle
    if worker.join().is_err() {
        error!("Worker thread panicked");
    }

    // Arrête les tâches de rafraîchissement avant le runtime
    drop(app);
    drop(guard);
    runtime.shutdown_timeout(Duration::from_millis(500));
    restored?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

/// Verrou tolérant : un panic dans un autre thread ne bloque pas l'UI
fn lock(app: &Mutex<App>) -> MutexGuard<'_, App> {
    app.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// Worker thread
// ============================================================================
// CONCEPT : Handle::block_on depuis un thread std
// - Le worker partage le runtime du programme
// - Il n'exécute qu'une commande à la fois, dans l'ordre d'arrivée
// ============================================================================

fn spawn_background_worker(
    runtime: tokio::runtime::Handle,
    config: Config,
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
    app: Arc<Mutex<App>>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let locator = ConfiguredLocator::from_config(&config);
        let geocoder = match BigDataCloudGeocoder::new(config.geocoder_url.clone()) {
            Ok(geocoder) => Some(geocoder),
            Err(e) => {
                error!(error = %e, "Failed to build geocoder client");
                None
            }
        };

        while let Ok(command) = command_rx.recv() {
            info!(command = command.name(), "Worker received command");

            let result = match command {
                AppCommand::Authenticate(request) => {
                    AppResult::Authenticated(runtime.block_on(auth::authenticate(request, config.auth_delay())))
                }
                AppCommand::DetectLocation => {
                    // None : le header affiche "Detecting location..."
                    lock(&app).location = None;

                    let location = match &geocoder {
                        Some(geocoder) => runtime.block_on(resolve_location(
                            &locator,
                            geocoder,
                            config.location_timeout(),
                        )),
                        None => Location::fallback(),
                    };
                    AppResult::LocationResolved(location)
                }
            };

            if result_tx.send(result).is_err() {
                break;
            }
        }

        info!("Worker thread exiting (channel closed)");
    })
}

// ============================================================================
// Event loop
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: Arc<Mutex<App>>,
    events: &EventHandler,
    command_tx: mpsc::Sender<AppCommand>,
    result_rx: mpsc::Receiver<AppResult>,
) -> Result<()> {
    let mut worker_alive = true;

    loop {
        if !lock(&app).is_running() {
            break;
        }

        // Résultats du worker (non bloquant)
        while worker_alive {
            match result_rx.try_recv() {
                Ok(AppResult::Authenticated(result)) => {
                    info!(success = result.is_ok(), "Authentication finished");
                    lock(&app).complete_auth(result);
                }
                Ok(AppResult::LocationResolved(location)) => {
                    info!(city = %location.city, fallback = location.is_fallback(), "Location resolved");
                    lock(&app).set_location(location);
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    error!("Worker thread disconnected!");
                    worker_alive = false;
                }
            }
        }

        terminal.draw(|frame| {
            let app = lock(&app);
            render(frame, &*app);
        })?;

        match events.next() {
            Ok(event) => handle_event(&mut lock(&app), event, &command_tx),
            Err(e) => warn!(error = ?e, "Failed to read terminal event"),
        }

        lock(&app).tick();
    }

    Ok(())
}

/// Gère un événement clavier
///
/// CONCEPT : Priorités
/// 1. Confirmations en attente (toute autre touche annule)
/// 2. Mode saisie
/// 3. Raccourcis globaux puis raccourcis de l'écran courant
fn handle_event(app: &mut App, event: Event, command_tx: &mpsc::Sender<AppCommand>) {
    use stockflow::ui::events::{
        is_backtab_event, is_country_event, is_currency_event, is_delete_event, is_down_event,
        is_enter_event, is_escape_event, is_force_quit_event, is_quit_event, is_retry_event,
        is_tab_event, is_up_event,
    };

    if !matches!(event, Event::Key(_)) {
        return;
    }

    if is_force_quit_event(&event) {
        info!("User forced quit");
        app.quit();
        return;
    }

    if app.is_awaiting_quit_confirmation() {
        if is_quit_event(&event) {
            info!("User confirmed quit");
            app.quit();
        } else {
            debug!("Quit cancelled");
            app.cancel_quit();
        }
        return;
    }

    if app.is_awaiting_delete_confirmation() {
        if is_delete_event(&event) {
            app.delete_selected_holding();
        } else {
            debug!("Delete cancelled");
            app.cancel_delete();
        }
        return;
    }

    if app.is_in_input_mode() {
        handle_input_event(app, &event, command_tx);
        return;
    }

    match event {
        Event::Key(_) if is_quit_event(&event) => {
            info!("User requested quit (awaiting confirmation)");
            app.request_quit();
        }
        Event::Key(_) if is_tab_event(&event) => app.next_tab(),
        Event::Key(_) if is_backtab_event(&event) => app.previous_tab(),
        Event::Key(_) if is_escape_event(&event) => app.back(),
        Event::Key(_) if is_up_event(&event) => app.navigate_up(),
        Event::Key(_) if is_down_event(&event) => app.navigate_down(),
        Event::Key(_) if is_enter_event(&event) => app.open_selected(),
        Event::Key(_) if is_currency_event(&event) => app.cycle_currency(),
        Event::Key(_) if is_country_event(&event) => app.cycle_country(),
        Event::Key(_) if is_retry_event(&event) => app.retry(),
        _ => handle_screen_event(app, &event),
    }
}

/// Raccourcis propres à chaque écran
fn handle_screen_event(app: &mut App, event: &Event) {
    use stockflow::ui::events::{
        is_add_event, is_delete_event, is_next_range_event, is_period_event,
        is_previous_range_event, is_search_event, is_sector_event, is_sign_in_event,
        is_sign_out_event, is_sign_up_event, is_upgrade_event, popular_index_from_event,
    };

    let signed_in = app.context.is_signed_in();

    match app.current_screen {
        Screen::Home if is_period_event(event) => app.cycle_period(),
        Screen::Detail if is_next_range_event(event) => app.next_range(),
        Screen::Detail if is_previous_range_event(event) => app.previous_range(),
        Screen::Search if is_search_event(event) => app.start_search_input(),
        Screen::Search if is_sector_event(event) => app.cycle_sector(),
        Screen::Portfolio if is_add_event(event) => app.start_add_holding(None),
        Screen::Portfolio if is_delete_event(event) => {
            if app.list_len() > 0 {
                app.request_delete();
            }
        }
        Screen::Portfolio => {
            if let Some(index) = popular_index_from_event(event) {
                app.start_add_holding(Some(index));
            }
        }
        Screen::Account if is_sign_in_event(event) && !signed_in => app.start_sign_in(),
        Screen::Account if is_sign_up_event(event) && !signed_in => app.start_sign_up(),
        Screen::Account if is_sign_out_event(event) && signed_in => app.sign_out(),
        Screen::Pro if is_upgrade_event(event) => app.upgrade_to_pro(),
        _ => {}
    }
}

/// Mode saisie : recherche ou formulaire
fn handle_input_event(app: &mut App, event: &Event, command_tx: &mpsc::Sender<AppCommand>) {
    use stockflow::ui::events::{
        get_char_from_event, is_backspace_event, is_backtab_event, is_enter_event,
        is_escape_event, is_tab_event,
    };

    // Formulaire figé pendant l'authentification
    if app.auth.is_busy() {
        return;
    }

    if is_escape_event(event) {
        app.cancel_input();
    } else if is_enter_event(event) {
        if app.input == InputMode::Search {
            app.cancel_input();
        } else if let Some(request) = app.submit_input() {
            if command_tx.send(AppCommand::Authenticate(request)).is_err() {
                error!("Worker unavailable, authentication aborted");
                app.complete_auth(Err(FetchError::NetworkUnavailable(
                    "background worker stopped".to_string(),
                )));
            }
        }
    } else if is_tab_event(event) {
        app.next_field();
    } else if is_backtab_event(event) {
        app.previous_field();
    } else if is_backspace_event(event) {
        app.backspace();
    } else if let Some(c) = get_char_from_event(event) {
        app.append_char(c);
    }
}

// ============================================================================
// Terminal setup / restore
// ============================================================================

/// Restaure le terminal même en cas de panic
fn install_panic_hook() {
    let original = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        error!(%info, "Application panicked");
        original(info);
    }));
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Échec de l'activation du raw mode")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Échec de l'entrée en alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("Échec de la création du terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("Échec de la désactivation du raw mode")?;

    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)
        .context("Échec de la sortie de l'alternate screen")?;

    terminal.show_cursor().context("Échec de l'affichage du curseur")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockflow::auth::SignInForm;

    #[test]
    fn test_worker_finishes_pending_command_then_exits() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        let _guard = runtime.enter();

        let config = Config {
            auth_delay_ms: 0,
            ..Config::default()
        };
        let app = Arc::new(Mutex::new(App::new(
            Arc::new(MockMarketSource::seeded(8)),
            config.clone(),
        )));

        let (command_tx, command_rx) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::channel();
        let worker = spawn_background_worker(
            runtime.handle().clone(),
            config,
            command_rx,
            result_tx,
            Arc::clone(&app),
        );

        command_tx
            .send(AppCommand::Authenticate(AuthRequest::SignIn(SignInForm {
                email: "mo@example.com".into(),
                password: "pw".into(),
            })))
            .unwrap();
        drop(command_tx);

        // Le worker rend son Arc<App> avant que le runtime ne s'arrête
        worker.join().unwrap();
        assert_eq!(Arc::strong_count(&app), 1);
        assert!(matches!(result_rx.try_recv(), Ok(AppResult::Authenticated(Ok(_)))));
    }
}
