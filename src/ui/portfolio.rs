// ============================================================================
// Portfolio - Lignes détenues et totaux
// ============================================================================
// CONCEPT RATATUI : Table + TableState
// - Colonnes alignées, ligne sélectionnée surlignée
//
// Les montants sont saisis et conservés en USD, puis convertis dans la
// devise sélectionnée à l'affichage
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Row, Table, TableState},
    Frame,
};

use crate::api::MarketDataSource;
use crate::app::App;
use crate::models::{Currency, PortfolioItem};
use crate::portfolio::{PortfolioSummary, POPULAR_STOCKS};
use crate::ui::dashboard::{bordered, trend_color};

pub fn render_portfolio<S: MarketDataSource>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let Some(user) = app.context.user() else {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Sign in to track your portfolio",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Open the Account tab and press [i] to sign in or [n] to sign up",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(text)
            .block(bordered(" 💼 Portfolio "))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Totaux
            Constraint::Min(0),    // Lignes
            Constraint::Length(3), // Raccourcis
        ])
        .split(area);

    let currency = app.context.currency();
    render_summary(frame, &PortfolioSummary::of(&user.portfolio), currency, chunks[0]);
    render_holdings(frame, &user.portfolio, app.selected_index, currency, chunks[1]);
    render_popular(frame, chunks[2]);
}

fn render_summary(frame: &mut Frame, summary: &PortfolioSummary, currency: Currency, area: Rect) {
    let color = trend_color(summary.is_positive());

    let lines = vec![
        Line::from(vec![
            Span::raw("Total value "),
            Span::styled(
                currency.format_usd(summary.total_value),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::raw("   Cost "),
            Span::raw(currency.format_usd(summary.total_cost)),
            Span::raw(format!("   Holdings {}", summary.holdings)),
        ]),
        Line::from(vec![
            Span::raw("Gain/Loss "),
            Span::styled(
                format!(
                    "{} ({:+.2}%)",
                    currency.format_usd(summary.total_gain_loss),
                    summary.total_gain_loss_percent
                ),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(bordered(" 💼 Portfolio Summary ")), area);
}

fn render_holdings(
    frame: &mut Frame,
    items: &[PortfolioItem],
    selected: usize,
    currency: Currency,
    area: Rect,
) {
    if items.is_empty() {
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "No holdings yet. Press [a] to add a stock.",
                Style::default().fg(Color::Gray),
            )),
        ])
        .block(bordered(" Holdings "))
        .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(vec!["Symbol", "Name", "Shares", "Cost", "Price", "Value", "Gain/Loss"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = items
        .iter()
        .map(|item| {
            let gain = item.gain_loss();
            Row::new(vec![
                item.symbol.clone(),
                item.name.clone(),
                format!("{}", item.shares),
                currency.format_usd(item.purchase_price),
                currency.format_usd(item.current_price),
                currency.format_usd(item.value()),
                format!(
                    "{:+.2} ({:+.2}%)",
                    currency.convert_from_usd(gain),
                    item.gain_loss_percent()
                ),
            ])
            .style(Style::default().fg(trend_color(gain >= 0.0)))
        })
        .collect();

    let widths = [
        Constraint::Length(7),
        Constraint::Min(16),
        Constraint::Length(8),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(12),
        Constraint::Length(20),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(bordered(" Holdings "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = TableState::default();
    state.select(Some(selected.min(items.len() - 1)));

    frame.render_stateful_widget(table, area, &mut state);
}

/// Raccourcis d'ajout rapide
fn render_popular(frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled("Quick add: ", Style::default().fg(Color::Gray))];
    for (index, (symbol, _name)) in POPULAR_STOCKS.iter().enumerate() {
        spans.push(Span::styled(
            format!("[{}]", index + 1),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(" {}  ", symbol)));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(bordered(" Popular Stocks "))
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}
