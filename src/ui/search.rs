// ============================================================================
// Search - Recherche d'actions
// ============================================================================
// Barre de saisie + filtre secteur + résultats
//
// Les résultats arrivent après le debounce : pendant la frappe, la liste
// précédente reste affichée avec un indicateur de chargement.
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, Paragraph},
    Frame,
};

use crate::api::MarketDataSource;
use crate::app::{App, InputMode};
use crate::ui::dashboard::{bordered, stock_items};

pub fn render_search<S: MarketDataSource>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    render_query(frame, app, chunks[0]);
    render_results(frame, app, chunks[1]);
}

fn render_query<S: MarketDataSource>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let typing = app.input == InputMode::Search;
    let border = if typing { Color::Green } else { Color::Cyan };

    let mut spans = vec![
        Span::styled("🔍 ", Style::default().fg(Color::Cyan)),
        Span::styled(app.search_query.clone(), Style::default().fg(Color::White)),
    ];
    if typing {
        spans.push(Span::styled(
            "█",
            Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
        ));
    } else if app.search_query.is_empty() {
        spans.push(Span::styled(
            "Search by symbol or company name ([/] to type)",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(format!(
            " Search · {} · {} ",
            app.sector_label(),
            app.context.selected_country()
        ));

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_results<S: MarketDataSource>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let Some(feed) = &app.search else {
        return;
    };
    let state = feed.state();

    let mut title = " Results ".to_string();
    if state.loading {
        title = " Results ⟳ Searching... ".to_string();
    }

    if let Some(error) = &state.error {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(format!("⚠ {}", error), Style::default().fg(Color::Red))),
            Line::from(Span::styled("[r] Retry", Style::default().fg(Color::Gray))),
        ];
        let paragraph = Paragraph::new(text)
            .block(bordered(title))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    let results = state.data.as_deref().unwrap_or_default();
    if results.is_empty() {
        let message = if feed.params().is_blank() {
            "Type a symbol or company name, or pick a sector with [s]"
        } else if state.loading {
            "Searching..."
        } else {
            "No stocks found"
        };

        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(message, Style::default().fg(Color::Gray))),
        ])
        .block(bordered(title))
        .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    let title = format!("{}({}) ", title, results.len());
    let list = List::new(stock_items(results, app.selected_index, app.context.currency()))
        .block(bordered(title));
    frame.render_widget(list, area);
}
