// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Paramètre de type par défaut : App = App<MockMarketSource>
// 3. RAII : détruire un handle de rafraîchissement arrête sa tâche
//
// PATTERN : "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// - Les flux de données (marché, news, détail, recherche) vivent dans
//   des tâches tokio ; App ne garde que leurs handles
// ============================================================================

use std::sync::Arc;

use tracing::{debug, info};

use crate::api::catalog::{self, COUNTRIES, POPULAR_STOCKS, SECTORS};
use crate::api::{MarketDataSource, MockMarketSource, SearchQuery};
use crate::auth::{AuthFlow, AuthRequest, AuthState, SignInForm, SignUpForm};
use crate::config::Config;
use crate::context::AppContext;
use crate::error::FetchError;
use crate::location::Location;
use crate::models::{NewsItem, User};
use crate::portfolio::{self, HoldingForm};
use crate::refresh::detail::spawn_detail_feed;
use crate::refresh::market::spawn_market_feed;
use crate::refresh::news::spawn_news_feed;
use crate::refresh::search::spawn_search_feed;
use crate::refresh::{DetailFeed, DetailParams, MarketFeed, MarketParams, NewsFeed, SearchFeed};

// ============================================================================
// Enum : Screen
// ============================================================================
// Un écran par route :
// /, /news, /stock/:symbol, /search, /portfolio, /auth, /pro
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Accueil : vue d'ensemble du marché
    Home,
    News,
    /// Détail d'une action (graphique + statistiques)
    Detail,
    Search,
    Portfolio,
    /// Connexion / inscription / compte
    Account,
    Pro,
}

/// Nombre d'actualités liées affichées sur le détail
pub const RELATED_NEWS_LIMIT: usize = 3;

/// Onglets affichés dans la barre de navigation (Detail n'en est pas un)
pub const TABS: [Screen; 6] = [
    Screen::Home,
    Screen::News,
    Screen::Search,
    Screen::Portfolio,
    Screen::Account,
    Screen::Pro,
];

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Home => "Home",
            Screen::News => "News",
            Screen::Detail => "Stock",
            Screen::Search => "Search",
            Screen::Portfolio => "Portfolio",
            Screen::Account => "Account",
            Screen::Pro => "Pro",
        }
    }

    /// Route affichée dans la barre d'onglets
    pub fn route(&self) -> &'static str {
        match self {
            Screen::Home => "/",
            Screen::News => "/news",
            Screen::Detail => "/stock/:symbol",
            Screen::Search => "/search",
            Screen::Portfolio => "/portfolio",
            Screen::Account => "/auth",
            Screen::Pro => "/pro",
        }
    }
}

// ============================================================================
// Formulaires
// ============================================================================
// CONCEPT : Modal input (Vim-like), généralisé à plusieurs champs
// - Tab passe au champ suivant
// - Enter valide, ESC annule
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
    /// Masqué à l'affichage (mot de passe)
    pub secret: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub fields: Vec<Field>,
    pub focus: usize,
}

impl Form {
    fn new(fields: &[(&'static str, bool)]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|&(label, secret)| Field {
                    label,
                    value: String::new(),
                    secret,
                })
                .collect(),
            focus: 0,
        }
    }

    pub fn holding() -> Self {
        Self::new(&[
            ("Symbol", false),
            ("Company name", false),
            ("Shares", false),
            ("Purchase price (USD)", false),
        ])
    }

    pub fn sign_in() -> Self {
        Self::new(&[("Email", false), ("Password", true)])
    }

    pub fn sign_up() -> Self {
        Self::new(&[
            ("Full name", false),
            ("Email", false),
            ("Password", true),
            ("Confirm password", true),
        ])
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len().max(1);
    }

    pub fn previous_field(&mut self) {
        let len = self.fields.len().max(1);
        self.focus = (self.focus + len - 1) % len;
    }

    pub fn push(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.push(c);
        }
    }

    pub fn pop(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.pop();
        }
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map_or("", |f| f.value.as_str())
    }

    pub fn set(&mut self, index: usize, value: &str) {
        if let Some(field) = self.fields.get_mut(index) {
            field.value = value.to_string();
        }
    }
}

/// Mode de saisie courant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Frappe dans la barre de recherche
    Search,
    AddHolding(Form),
    SignIn(Form),
    SignUp(Form),
}

impl InputMode {
    pub fn form(&self) -> Option<&Form> {
        match self {
            InputMode::AddHolding(form) | InputMode::SignIn(form) | InputMode::SignUp(form) => {
                Some(form)
            }
            InputMode::Normal | InputMode::Search => None,
        }
    }

    fn form_mut(&mut self) -> Option<&mut Form> {
        match self {
            InputMode::AddHolding(form) | InputMode::SignIn(form) | InputMode::SignUp(form) => {
                Some(form)
            }
            InputMode::Normal | InputMode::Search => None,
        }
    }
}

// ============================================================================
// Structure App
// ============================================================================

/// État principal de l'application
///
/// CONCEPT RUST : paramètre de type par défaut
/// - `App` tout court désigne App<MockMarketSource>
/// - Une autre source de données peut être branchée sans toucher à l'UI
pub struct App<S: MarketDataSource = MockMarketSource> {
    running: bool,

    /// Two-step quit : première pression de 'q' → confirmation
    confirm_quit: bool,

    /// Two-step delete : première pression de 'd' → confirmation
    confirm_delete: bool,

    pub current_screen: Screen,

    /// Écran où revenir en quittant le détail
    pub return_screen: Screen,

    /// Index sélectionné dans la liste de l'écran courant
    pub selected_index: usize,

    pub input: InputMode,

    /// Message affiché dans le footer (confirmation, erreur de saisie)
    pub status: Option<String>,

    pub context: AppContext,
    pub auth: AuthFlow,

    /// None tant que la détection de position est en cours
    pub location: Option<Location>,

    pub market: MarketFeed<S>,
    pub news: NewsFeed<S>,
    /// Présent seulement sur l'écran de détail
    pub detail: Option<DetailFeed<S>>,
    /// Présent seulement sur l'écran de recherche
    pub search: Option<SearchFeed<S>>,

    pub search_query: String,
    /// Index dans SECTORS
    pub search_sector: usize,

    source: Arc<S>,
    config: Config,
}

impl<S: MarketDataSource> App<S> {
    /// Crée l'application et démarre les flux marché + news
    ///
    /// Doit être appelé dans le contexte d'un runtime tokio.
    pub fn new(source: Arc<S>, config: Config) -> Self {
        let context = AppContext::new();
        let market = spawn_market_feed(
            Arc::clone(&source),
            &config,
            MarketParams::new(context.selected_country(), context.currency()),
        );
        let news = spawn_news_feed(Arc::clone(&source), &config);

        Self {
            running: true,
            confirm_quit: false,
            confirm_delete: false,
            current_screen: Screen::Home,
            return_screen: Screen::Home,
            selected_index: 0,
            input: InputMode::Normal,
            status: None,
            context,
            auth: AuthFlow::new(),
            location: None,
            market,
            news,
            detail: None,
            search: None,
            search_query: String::new(),
            search_sector: 0,
            source,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ========================================================================
    // Cycle de vie
    // ========================================================================

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    /// Tick : appelé à chaque itération de la boucle
    ///
    /// Les listes peuvent rétrécir entre deux frames (nouveau snapshot,
    /// suppression) : on garde la sélection dans les bornes.
    pub fn tick(&mut self) {
        let max_index = self.list_len().saturating_sub(1);
        if self.selected_index > max_index {
            self.selected_index = max_index;
        }
    }

    // ========================================================================
    // Navigation entre écrans
    // ========================================================================

    /// Affiche un écran
    ///
    /// Quitter Detail ou Search détruit le flux correspondant,
    /// entrer dans Search en démarre un.
    pub fn show(&mut self, screen: Screen) {
        if screen == self.current_screen {
            return;
        }
        debug!(from = ?self.current_screen, to = ?screen, "Screen change");

        self.leave_current();
        if screen == Screen::Search {
            self.search = Some(spawn_search_feed(
                Arc::clone(&self.source),
                &self.config,
                self.search_params(),
            ));
        }

        self.current_screen = screen;
        self.selected_index = 0;
        self.confirm_delete = false;
        self.input = InputMode::Normal;
        self.status = None;
    }

    fn leave_current(&mut self) {
        match self.current_screen {
            Screen::Detail => self.detail = None,
            Screen::Search => self.search = None,
            _ => {}
        }
    }

    /// Ouvre le détail d'une action
    pub fn open_detail(&mut self, symbol: &str) {
        info!(symbol, "Opening stock detail");
        let params = DetailParams::new(symbol, self.context.currency());

        if self.current_screen != Screen::Detail {
            self.return_screen = self.current_screen;
            self.leave_current();
        }
        self.detail = Some(spawn_detail_feed(Arc::clone(&self.source), params));
        self.current_screen = Screen::Detail;
        self.input = InputMode::Normal;
        self.status = None;
    }

    /// Ouvre le détail de la ligne sélectionnée
    pub fn open_selected(&mut self) {
        if let Some(symbol) = self.selected_symbol() {
            self.open_detail(&symbol);
        }
    }

    /// ESC : détail → écran d'origine, sinon → accueil
    pub fn back(&mut self) {
        match self.current_screen {
            Screen::Detail => {
                let target = self.return_screen;
                if target == Screen::Detail {
                    self.show(Screen::Home);
                } else {
                    self.show(target);
                }
            }
            Screen::Home => {}
            _ => self.show(Screen::Home),
        }
    }

    fn tab_index(&self) -> usize {
        let screen = if self.current_screen == Screen::Detail {
            self.return_screen
        } else {
            self.current_screen
        };
        TABS.iter().position(|s| *s == screen).unwrap_or(0)
    }

    pub fn next_tab(&mut self) {
        self.show(TABS[(self.tab_index() + 1) % TABS.len()]);
    }

    pub fn previous_tab(&mut self) {
        self.show(TABS[(self.tab_index() + TABS.len() - 1) % TABS.len()]);
    }

    /// Onglet à surligner dans la barre de navigation
    pub fn selected_tab(&self) -> usize {
        self.tab_index()
    }

    // ========================================================================
    // Sélection dans les listes
    // ========================================================================

    /// Longueur de la liste de l'écran courant
    pub fn list_len(&self) -> usize {
        match self.current_screen {
            Screen::Home => self
                .market
                .state()
                .data
                .map_or(0, |snapshot| snapshot.market.stocks.len()),
            Screen::News => self.news.state().data.map_or(0, |items| items.len()),
            Screen::Search => self
                .search
                .as_ref()
                .and_then(|feed| feed.state().data)
                .map_or(0, |results| results.len()),
            Screen::Portfolio => self.context.user().map_or(0, |u| u.portfolio.len()),
            Screen::Detail | Screen::Account | Screen::Pro => 0,
        }
    }

    pub fn navigate_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn navigate_down(&mut self) {
        let max_index = self.list_len().saturating_sub(1);
        self.selected_index = (self.selected_index + 1).min(max_index);
    }

    /// Symbole de la ligne sélectionnée (news : premier symbole lié)
    pub fn selected_symbol(&self) -> Option<String> {
        let index = self.selected_index;
        match self.current_screen {
            Screen::Home => self
                .market
                .state()
                .data
                .and_then(|snapshot| snapshot.market.stocks.get(index).map(|s| s.symbol.clone())),
            Screen::News => self
                .news
                .state()
                .data
                .and_then(|items| items.get(index).and_then(|n| n.related_symbols.first().cloned())),
            Screen::Search => self
                .search
                .as_ref()
                .and_then(|feed| feed.state().data)
                .and_then(|results| results.get(index).map(|s| s.symbol.clone())),
            Screen::Portfolio => self
                .context
                .user()
                .and_then(|u| u.portfolio.get(index))
                .map(|item| item.symbol.clone()),
            Screen::Detail | Screen::Account | Screen::Pro => None,
        }
    }

    /// Actualités liées à l'action affichée (au plus RELATED_NEWS_LIMIT)
    pub fn related_news(&self) -> Vec<NewsItem> {
        let Some(feed) = &self.detail else {
            return Vec::new();
        };
        let symbol = &feed.params().symbol;
        let company = feed
            .state()
            .data
            .map(|detail| detail.stock.name)
            .unwrap_or_else(|| catalog::company_name(symbol));

        self.news
            .state()
            .data
            .unwrap_or_default()
            .into_iter()
            .filter(|item| item.relates_to(symbol, &company))
            .take(RELATED_NEWS_LIMIT)
            .collect()
    }

    // ========================================================================
    // Contexte : devise, pays, période
    // ========================================================================

    pub fn cycle_currency(&mut self) {
        let currency = self.context.currency().next();
        self.context.set_currency(currency);
        self.sync_feeds();
    }

    pub fn cycle_country(&mut self) {
        let current = COUNTRIES
            .iter()
            .position(|c| *c == self.context.selected_country())
            .unwrap_or(0);
        let next = COUNTRIES[(current + 1) % COUNTRIES.len()];
        if let Err(err) = self.context.set_selected_country(next) {
            self.status = Some(err.to_string());
            return;
        }
        self.sync_feeds();
    }

    /// Période suivante de l'historique de l'accueil
    pub fn cycle_period(&mut self) {
        let mut params = self.market.params().clone();
        params.period_days = params.next_period();
        self.market.set_params(params);
    }

    /// Pousse devise et pays du contexte dans les paramètres des flux
    fn sync_feeds(&mut self) {
        let currency = self.context.currency();

        let mut market = self.market.params().clone();
        market.currency = currency;
        market.country = self.context.selected_country().to_string();
        self.market.set_params(market);

        if let Some(detail) = self.detail.as_mut() {
            let mut params = detail.params().clone();
            params.currency = currency;
            detail.set_params(params);
        }

        let query = self.search_params();
        if let Some(search) = self.search.as_mut() {
            search.set_params(query);
        }
    }

    // ========================================================================
    // Détail : période du graphique
    // ========================================================================

    pub fn next_range(&mut self) {
        if let Some(detail) = self.detail.as_mut() {
            let mut params = detail.params().clone();
            params.range = params.range.next();
            detail.set_params(params);
        }
    }

    pub fn previous_range(&mut self) {
        if let Some(detail) = self.detail.as_mut() {
            let mut params = detail.params().clone();
            params.range = params.range.previous();
            detail.set_params(params);
        }
    }

    // ========================================================================
    // Recherche
    // ========================================================================

    pub fn search_params(&self) -> SearchQuery {
        SearchQuery::new(
            &self.search_query,
            self.context.selected_country(),
            SECTORS.get(self.search_sector).copied(),
        )
        .with_currency(self.context.currency())
    }

    pub fn sector_label(&self) -> &'static str {
        SECTORS.get(self.search_sector).copied().unwrap_or(SECTORS[0])
    }

    pub fn start_search_input(&mut self) {
        self.input = InputMode::Search;
    }

    pub fn cycle_sector(&mut self) {
        self.search_sector = (self.search_sector + 1) % SECTORS.len();
        self.update_search();
    }

    fn update_search(&mut self) {
        let query = self.search_params();
        self.selected_index = 0;
        if let Some(search) = self.search.as_mut() {
            search.set_params(query);
        }
    }

    // ========================================================================
    // Retry
    // ========================================================================

    /// Relance le flux de l'écran courant
    pub fn retry(&mut self) {
        info!(screen = ?self.current_screen, "Retry requested");
        match self.current_screen {
            Screen::Home => self.market.retry(),
            Screen::News => self.news.retry(),
            Screen::Detail => {
                if let Some(detail) = &self.detail {
                    detail.retry();
                }
            }
            Screen::Search => {
                if let Some(search) = &self.search {
                    search.retry();
                }
            }
            Screen::Portfolio | Screen::Account | Screen::Pro => {}
        }
    }

    // ========================================================================
    // Input Mode Management
    // ========================================================================

    pub fn is_in_input_mode(&self) -> bool {
        self.input != InputMode::Normal
    }

    /// Ouvre le formulaire d'ajout au portefeuille
    ///
    /// `popular` pré-remplit symbole et nom depuis POPULAR_STOCKS.
    pub fn start_add_holding(&mut self, popular: Option<usize>) {
        if !self.context.is_signed_in() {
            self.status = Some("Sign in to manage your portfolio".to_string());
            return;
        }
        let mut form = Form::holding();
        if let Some((symbol, name)) = popular.and_then(|i| POPULAR_STOCKS.get(i)) {
            form.set(0, symbol);
            form.set(1, name);
            form.focus = 2;
        }
        self.input = InputMode::AddHolding(form);
    }

    pub fn start_sign_in(&mut self) {
        self.auth.clear_error();
        self.input = InputMode::SignIn(Form::sign_in());
    }

    pub fn start_sign_up(&mut self) {
        self.auth.clear_error();
        self.input = InputMode::SignUp(Form::sign_up());
    }

    pub fn cancel_input(&mut self) {
        self.input = InputMode::Normal;
    }

    pub fn append_char(&mut self, c: char) {
        if self.input == InputMode::Search {
            self.search_query.push(c);
            self.update_search();
        } else if let Some(form) = self.input.form_mut() {
            form.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.input == InputMode::Search {
            self.search_query.pop();
            self.update_search();
        } else if let Some(form) = self.input.form_mut() {
            form.pop();
        }
    }

    pub fn next_field(&mut self) {
        if let Some(form) = self.input.form_mut() {
            form.next_field();
        }
    }

    pub fn previous_field(&mut self) {
        if let Some(form) = self.input.form_mut() {
            form.previous_field();
        }
    }

    /// Valide le formulaire courant
    ///
    /// Retourne la demande d'authentification à confier au worker,
    /// le portefeuille est modifié directement.
    pub fn submit_input(&mut self) -> Option<AuthRequest> {
        match std::mem::replace(&mut self.input, InputMode::Normal) {
            InputMode::Normal | InputMode::Search => None,

            InputMode::AddHolding(form) => {
                let holding = HoldingForm::new(
                    form.value(0),
                    form.value(1),
                    form.value(2),
                    form.value(3),
                );
                match portfolio::add_holding(&mut self.context, &holding) {
                    Ok(item) => {
                        self.status = Some(format!("Added {} × {}", item.shares, item.symbol));
                    }
                    Err(err) => {
                        // Le formulaire reste ouvert avec le message
                        self.status = Some(err.to_string());
                        self.input = InputMode::AddHolding(form);
                    }
                }
                None
            }

            InputMode::SignIn(form) => {
                let request = AuthRequest::SignIn(SignInForm {
                    email: form.value(0).to_string(),
                    password: form.value(1).to_string(),
                });
                self.input = InputMode::SignIn(form);
                self.begin_auth(request)
            }

            InputMode::SignUp(form) => {
                let request = AuthRequest::SignUp(SignUpForm {
                    name: form.value(0).to_string(),
                    email: form.value(1).to_string(),
                    password: form.value(2).to_string(),
                    confirm_password: form.value(3).to_string(),
                });
                self.input = InputMode::SignUp(form);
                self.begin_auth(request)
            }
        }
    }

    fn begin_auth(&mut self, request: AuthRequest) -> Option<AuthRequest> {
        if self.auth.begin() {
            Some(request)
        } else {
            None
        }
    }

    // ========================================================================
    // Compte et portefeuille
    // ========================================================================

    /// Applique le résultat d'une authentification
    pub fn complete_auth(&mut self, result: Result<User, FetchError>) {
        self.auth.complete(&mut self.context, result);
        if self.auth.state() == AuthState::Authenticated {
            self.input = InputMode::Normal;
            self.status = self.context.user().map(|u| format!("Welcome, {}", u.name));
        }
    }

    pub fn sign_out(&mut self) {
        self.auth.sign_out(&mut self.context);
        self.status = Some("Signed out".to_string());
        self.tick();
    }

    pub fn upgrade_to_pro(&mut self) {
        self.status = Some(match self.context.upgrade_to_pro() {
            Ok(()) => "Welcome to StockFlow Pro!".to_string(),
            Err(err) => err.to_string(),
        });
    }

    pub fn request_delete(&mut self) {
        self.confirm_delete = true;
    }

    pub fn cancel_delete(&mut self) {
        self.confirm_delete = false;
    }

    pub fn is_awaiting_delete_confirmation(&self) -> bool {
        self.confirm_delete
    }

    /// Retire toutes les lignes du symbole sélectionné
    pub fn delete_selected_holding(&mut self) {
        self.confirm_delete = false;
        let Some(symbol) = self.selected_symbol() else {
            return;
        };

        self.status = Some(match portfolio::remove_holding(&mut self.context, &symbol) {
            Ok(removed) => format!("Removed {} lot(s) of {}", removed, symbol),
            Err(err) => err.to_string(),
        });
        self.tick();
    }

    pub fn set_location(&mut self, location: Location) {
        self.location = Some(location);
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
