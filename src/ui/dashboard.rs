// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Routeur des écrans + éléments communs (header, onglets, footer, formulaires)
// + écran d'accueil (vue d'ensemble du marché)
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Layout : découpage de l'espace en zones
// 3. Clear : effacer une zone avant d'y dessiner une popup
//
// L'état est lu depuis les canaux watch à chaque frame : le rendu ne bloque
// jamais sur un fetch.
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::api::MarketDataSource;
use crate::app::{App, Form, InputMode, Screen, TABS};
use crate::error::FetchError;
use crate::models::stock::format_large_number;
use crate::models::{Currency, Stock};
use crate::refresh::{MarketSnapshot, RefreshState};
use crate::ui::{account, chart, news, portfolio, search};

/// Dessine l'interface complète
///
/// CONCEPT RUST : Routing avec match sur enum
/// - Le compilateur force à gérer tous les écrans
pub fn render<S: MarketDataSource>(frame: &mut Frame, app: &App<S>) {
    let chunks = create_layout(frame.size());

    render_header(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);

    match app.current_screen {
        Screen::Home => render_home(frame, app, chunks[2]),
        Screen::News => news::render_news(frame, app, chunks[2]),
        Screen::Detail => chart::render_detail(frame, app, chunks[2]),
        Screen::Search => search::render_search(frame, app, chunks[2]),
        Screen::Portfolio => portfolio::render_portfolio(frame, app, chunks[2]),
        Screen::Account => account::render_account(frame, app, chunks[2]),
        Screen::Pro => account::render_pro(frame, app, chunks[2]),
    }

    // Popup de formulaire par-dessus le contenu
    if let Some(form) = app.input.form() {
        render_form(frame, app, form, chunks[2]);
    }

    render_footer(frame, app, chunks[3]);
}

/// Header, onglets, contenu, footer
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Onglets
            Constraint::Min(0),    // Contenu
            Constraint::Length(3), // Footer
        ])
        .split(area)
        .to_vec()
}

// ============================================================================
// Helpers partagés par les écrans
// ============================================================================

pub(super) fn bordered(title: impl Into<String>) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title.into())
}

/// Couleur d'une variation
pub(super) fn trend_color(positive: bool) -> Color {
    if positive {
        Color::Green
    } else {
        Color::Red
    }
}

/// Panneau "chargement" (premier fetch, pas encore de données)
pub(super) fn render_loading(frame: &mut Frame, area: Rect, title: &str, message: &str) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("⟳ {}", message),
            Style::default().fg(Color::Gray),
        )),
    ];

    let paragraph = Paragraph::new(text)
        .block(bordered(title.to_string()))
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Erreur plein écran avec [r] Retry
pub(super) fn render_error(frame: &mut Frame, area: Rect, title: &str, error: &FetchError) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(format!(" ⚠ {} ", title.trim()));

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Something went wrong",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(error.to_string(), Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(vec![key("[r]"), Span::raw(" Retry")]),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

/// Lignes de liste pour des cotations
///
/// La ligne sélectionnée est inversée.
pub(super) fn stock_items(stocks: &[Stock], selected: usize, currency: Currency) -> Vec<ListItem<'static>> {
    stocks
        .iter()
        .enumerate()
        .map(|(index, stock)| {
            let style = Style::default().fg(trend_color(stock.is_positive()));
            let style = if index == selected {
                style.add_modifier(Modifier::BOLD).add_modifier(Modifier::REVERSED)
            } else {
                style
            };
            ListItem::new(format!(" {}", stock.display(currency))).style(style)
        })
        .collect()
}

fn key(label: &'static str) -> Span<'static> {
    Span::styled(label, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
}

fn shortcuts(pairs: &[(&'static str, &'static str)]) -> Line<'static> {
    let mut spans = Vec::with_capacity(pairs.len() * 2);
    for &(label, action) in pairs {
        spans.push(key(label));
        spans.push(Span::raw(format!(" {}  ", action)));
    }
    Line::from(spans)
}

/// Rectangle centré de `width` % de large et `height` lignes
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let height = height.min(area.height);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width) / 2),
            Constraint::Percentage(width),
            Constraint::Percentage((100 - width) / 2),
        ])
        .split(vertical[1])[1]
}

// ============================================================================
// Header et onglets
// ============================================================================

fn render_header<S: MarketDataSource>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" StockFlow ")
        .title_alignment(Alignment::Center);

    let location = match &app.location {
        Some(location) if location.is_fallback() => format!("📍 {} (default)", location.label()),
        Some(location) => format!("📍 {}", location.label()),
        None => "📍 Detecting location...".to_string(),
    };

    let user = match app.context.user() {
        Some(user) => format!("👤 {} · {}", user.name, user.membership_label()),
        None => "👤 Guest".to_string(),
    };

    let separator = Span::styled("  │  ", Style::default().fg(Color::DarkGray));
    let line = Line::from(vec![
        Span::raw(location),
        separator.clone(),
        Span::styled(
            format!("🌐 {}", app.context.selected_country()),
            Style::default().fg(Color::White),
        ),
        separator.clone(),
        Span::styled(
            format!("{} {}", app.context.currency().symbol(), app.context.currency().code()),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        separator,
        Span::raw(user),
    ]);

    let paragraph = Paragraph::new(line).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn render_tabs<S: MarketDataSource>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let titles: Vec<String> = TABS
        .iter()
        .map(|screen| format!(" {} ", screen.title()))
        .collect();

    let title = if app.current_screen == Screen::Detail {
        let symbol = app
            .detail
            .as_ref()
            .map(|feed| feed.params().symbol.clone())
            .unwrap_or_default();
        format!(" /stock/{} ", symbol)
    } else {
        format!(" {} ", app.current_screen.route())
    };

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title),
        )
        .select(app.selected_tab())
        .style(Style::default().fg(Color::Gray))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .divider("│");

    frame.render_widget(tabs, area);
}

// ============================================================================
// Footer : raccourcis, confirmations, messages
// ============================================================================

fn render_footer<S: MarketDataSource>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if let Some(status) = &app.status {
        block = block.title(Span::styled(
            format!(" {} ", status),
            Style::default().fg(Color::Yellow),
        ));
    }

    let warning = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let blinking = Style::default()
        .fg(Color::Red)
        .add_modifier(Modifier::BOLD)
        .add_modifier(Modifier::SLOW_BLINK);

    let line = if app.is_awaiting_delete_confirmation() {
        let symbol = app.selected_symbol().unwrap_or_else(|| "?".to_string());
        Line::from(vec![
            Span::styled("⚠  Press ", warning),
            Span::styled("[d]", blinking),
            Span::styled(format!(" again to remove {} or any other key to cancel ⚠", symbol), warning),
        ])
    } else if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled("⚠  Press ", warning),
            Span::styled("[q]", blinking),
            Span::styled(" again to quit, or any other key to cancel ⚠", warning),
        ])
    } else {
        footer_shortcuts(app)
    };

    let paragraph = Paragraph::new(line).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn footer_shortcuts<S: MarketDataSource>(app: &App<S>) -> Line<'static> {
    match &app.input {
        InputMode::Search => {
            return shortcuts(&[("[type]", "Query"), ("[Backspace]", "Erase"), ("[Enter/ESC]", "Done")]);
        }
        InputMode::AddHolding(_) | InputMode::SignIn(_) | InputMode::SignUp(_) => {
            return shortcuts(&[("[Tab]", "Next field"), ("[Enter]", "Submit"), ("[ESC]", "Cancel")]);
        }
        InputMode::Normal => {}
    }

    match app.current_screen {
        Screen::Home => shortcuts(&[
            ("[q]", "Quit"),
            ("[Tab]", "Screens"),
            ("[↑↓]", "Navigate"),
            ("[Enter]", "Detail"),
            ("[p]", "Period"),
            ("[c]", "Currency"),
            ("[o]", "Country"),
            ("[r]", "Refresh"),
        ]),
        Screen::News => shortcuts(&[
            ("[q]", "Quit"),
            ("[Tab]", "Screens"),
            ("[↑↓]", "Navigate"),
            ("[Enter]", "Related stock"),
            ("[r]", "Refresh"),
        ]),
        Screen::Detail => shortcuts(&[
            ("[ESC]", "Back"),
            ("[h/l]", "Range"),
            ("[c]", "Currency"),
            ("[r]", "Retry"),
            ("[q]", "Quit"),
        ]),
        Screen::Search => shortcuts(&[
            ("[/]", "Type"),
            ("[s]", "Sector"),
            ("[o]", "Country"),
            ("[↑↓]", "Navigate"),
            ("[Enter]", "Detail"),
            ("[q]", "Quit"),
        ]),
        Screen::Portfolio => shortcuts(&[
            ("[a]", "Add"),
            ("[1-6]", "Quick add"),
            ("[d]", "Remove"),
            ("[Enter]", "Detail"),
            ("[Tab]", "Screens"),
            ("[q]", "Quit"),
        ]),
        Screen::Account => {
            if app.context.is_signed_in() {
                shortcuts(&[("[x]", "Sign out"), ("[Tab]", "Screens"), ("[q]", "Quit")])
            } else {
                shortcuts(&[("[i]", "Sign in"), ("[n]", "Sign up"), ("[Tab]", "Screens"), ("[q]", "Quit")])
            }
        }
        Screen::Pro => shortcuts(&[("[u]", "Upgrade"), ("[Tab]", "Screens"), ("[q]", "Quit")]),
    }
}

// ============================================================================
// Formulaires (popup)
// ============================================================================

fn render_form<S: MarketDataSource>(frame: &mut Frame, app: &App<S>, form: &Form, area: Rect) {
    let (title, error) = match &app.input {
        InputMode::AddHolding(_) => (" Add to Portfolio ", app.status.clone()),
        InputMode::SignIn(_) => (" Sign In ", app.auth.error().map(|e| e.to_string())),
        InputMode::SignUp(_) => (" Create Account ", app.auth.error().map(|e| e.to_string())),
        InputMode::Normal | InputMode::Search => return,
    };

    let mut lines: Vec<Line> = vec![Line::from("")];
    for (index, field) in form.fields.iter().enumerate() {
        let focused = index == form.focus;
        let value = if field.secret {
            "•".repeat(field.value.chars().count())
        } else {
            field.value.clone()
        };

        let label_style = if focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };

        let mut spans = vec![
            Span::styled(format!(" {:<17}", field.label), label_style),
            Span::styled(value, Style::default().fg(Color::White)),
        ];
        if focused {
            spans.push(Span::styled(
                "█",
                Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
            ));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    if app.auth.is_busy() {
        lines.push(Line::from(Span::styled(
            " ⟳ Please wait...",
            Style::default().fg(Color::Yellow),
        )));
    } else if let Some(error) = error {
        lines.push(Line::from(Span::styled(
            format!(" ⚠ {}", error),
            Style::default().fg(Color::Red),
        )));
    }

    let height = lines.len() as u16 + 2;
    let popup = centered_rect(60, height, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(title);

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

// ============================================================================
// Accueil
// ============================================================================

fn render_home<S: MarketDataSource>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let state = app.market.state();

    let Some(snapshot) = &state.data else {
        match &state.error {
            Some(error) => render_error(frame, area, "Market", error),
            None => render_loading(frame, area, " Market ", "Loading market data..."),
        }
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    render_overview(frame, app, &state, snapshot, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    let currency = app.context.currency();
    let list = List::new(stock_items(&snapshot.market.stocks, app.selected_index, currency))
        .block(bordered(" 📊 Top Stocks "));
    frame.render_widget(list, body[0]);

    let period = app.market.params().period_days;
    chart::render_line_chart(
        frame,
        body[1],
        &format!(" Market Index · {} days ", period),
        &snapshot.chart,
        currency,
        false,
    );
}

fn render_overview<S: MarketDataSource>(
    frame: &mut Frame,
    app: &App<S>,
    state: &RefreshState<MarketSnapshot>,
    snapshot: &MarketSnapshot,
    area: Rect,
) {
    let overview = snapshot.market.overview();
    let currency = app.context.currency();
    let average = overview.average_change_percent;

    let figures = Line::from(vec![
        Span::raw("Market cap "),
        Span::styled(
            format!("{}{}", currency.symbol(), format_large_number(overview.total_market_cap as f64)),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::raw("   Gainers "),
        Span::styled(overview.gainers.to_string(), Style::default().fg(Color::Green)),
        Span::raw("   Losers "),
        Span::styled(overview.losers.to_string(), Style::default().fg(Color::Red)),
        Span::raw("   Avg change "),
        Span::styled(
            format!("{:+.2}%", average),
            Style::default().fg(trend_color(average >= 0.0)),
        ),
    ]);

    let mut status = vec![
        Span::styled(
            snapshot.market.market_status.label(),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(format!(
            "   Updated {}",
            snapshot.market.last_updated.format("%H:%M:%S")
        )),
    ];
    if state.loading {
        status.push(Span::styled("   ⟳ Refreshing...", Style::default().fg(Color::Yellow)));
    }
    if let Some(error) = &state.error {
        // Les dernières données restent affichées
        status.push(Span::styled(
            format!("   ⚠ {} · [r] Retry", error),
            Style::default().fg(Color::Red),
        ));
    }

    let paragraph = Paragraph::new(vec![figures, Line::from(status)])
        .block(bordered(format!(" Market Overview · {} ", snapshot_country(snapshot, app))));

    frame.render_widget(paragraph, area);
}

/// Pays affiché : celui des cotations, sinon celui du contexte
fn snapshot_country<S: MarketDataSource>(snapshot: &MarketSnapshot, app: &App<S>) -> String {
    snapshot
        .market
        .stocks
        .first()
        .and_then(|stock| stock.country.clone())
        .unwrap_or_else(|| app.context.selected_country().to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ratatui::{backend::TestBackend, Terminal};

    use super::*;
    use crate::api::MockMarketSource;
    use crate::config::Config;

    fn app() -> App {
        App::new(Arc::new(MockMarketSource::seeded(5)), Config::default())
    }

    /// Dessine l'application dans un terminal virtuel et retourne le texte
    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 45)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_home_renders_market() {
        let app = app();
        let mut rx = app.market.subscribe();
        rx.wait_for(|state| state.data.is_some()).await.unwrap();

        let screen = draw(&app);
        assert!(screen.contains("StockFlow"));
        assert!(screen.contains("Market Overview"));
        assert!(screen.contains("AAPL"));
        assert!(screen.contains("NFLX"));
    }

    #[tokio::test]
    async fn test_every_screen_renders() {
        let mut app = app();
        for screen in TABS {
            app.show(screen);
            let text = draw(&app);
            assert!(text.contains(screen.title()));
        }

        app.open_detail("MSFT");
        assert!(draw(&app).contains("/stock/MSFT"));
    }

    #[tokio::test]
    async fn test_detail_shows_related_news() {
        let mut app = app();
        app.open_detail("TSLA");
        let mut news = app.news.subscribe();
        news.wait_for(|state| state.data.is_some()).await.unwrap();
        if let Some(detail) = &app.detail {
            let mut rx = detail.subscribe();
            rx.wait_for(|state| state.data.is_some()).await.unwrap();
        }

        let text = draw(&app);
        assert!(text.contains("Related News"));
        assert!(text.contains("Electric Vehicle"));
    }

    #[tokio::test]
    async fn test_portfolio_amounts_follow_currency() {
        let mut app = app();
        app.context.set_user(Some(crate::models::User::new(
            "z9y8x7w6v".into(),
            "ana@example.com".into(),
            "ana".into(),
        )));
        app.show(Screen::Portfolio);
        app.start_add_holding(Some(0));
        for c in "10".chars() {
            app.append_char(c);
        }
        app.next_field();
        for c in "150".chars() {
            app.append_char(c);
        }
        app.submit_input();
        assert!(draw(&app).contains("$150.00"));

        app.cycle_currency();
        let text = draw(&app);
        assert!(text.contains("€127.50"));
        assert!(!text.contains("€150.00"));
    }

    #[tokio::test]
    async fn test_sign_in_popup() {
        let mut app = app();
        app.show(Screen::Account);
        app.start_sign_in();
        app.append_char('a');
        app.next_field();
        app.append_char('x');

        let text = draw(&app);
        assert!(text.contains("Sign In"));
        // Le mot de passe est masqué
        assert!(text.contains("•"));
    }
}
