// ============================================================================
// Chart - Graphique ligne et écran de détail
// ============================================================================
// Graphique des prix (indice du marché, historique d'une action) et
// page /stock/:symbol : en-tête, sélecteur de période, statistiques,
// actualités liées
//
// CONCEPTS RATATUI :
// 1. Chart widget : graphique ligne
// 2. Dataset : série de données à afficher
// 3. Axis : configuration des axes X et Y
// ============================================================================

use chrono::Utc;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap},
    Frame,
};

use crate::api::MarketDataSource;
use crate::app::App;
use crate::models::stock::format_large_number;
use crate::models::{ChartPoint, Currency, NewsItem, TimeRange};
use crate::refresh::StockDetail;
use crate::ui::dashboard::{bordered, render_error, render_loading, trend_color};

/// Dessine un historique de prix en ligne
///
/// CONCEPT RUST : Iterator avec fold
/// - min/max calculés en un seul passage
pub fn render_line_chart(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    history: &[ChartPoint],
    currency: Currency,
    intraday: bool,
) {
    let points: Vec<(f64, f64)> = history
        .iter()
        .enumerate()
        .map(|(i, point)| (i as f64, point.price))
        .collect();

    let (Some(first), Some(last)) = (history.first(), history.last()) else {
        render_no_data(frame, area, "No data to display");
        return;
    };

    let (min_price, max_price) = points
        .iter()
        .fold((f64::MAX, f64::MIN), |(min, max), &(_x, y)| (min.min(y), max.max(y)));

    // Marge de 5 % pour que le graphique respire
    let margin = ((max_price - min_price) * 0.05).max(0.01);
    let y_min = (min_price - margin).max(0.0);
    let y_max = max_price + margin;

    let datasets = vec![Dataset::default()
        .marker(symbols::Marker::Dot)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(trend_color(last.price >= first.price)))
        .data(&points)];

    let middle = &history[history.len() / 2];
    let x_axis = Axis::default()
        .style(Style::default().fg(Color::Gray))
        .bounds([0.0, (points.len().max(2) - 1) as f64])
        .labels(vec![
            Span::raw(first.label(intraday)),
            Span::raw(middle.label(intraday)),
            Span::raw(last.label(intraday)),
        ]);

    let symbol = currency.symbol();
    let y_axis = Axis::default()
        .title(format!("Price ({})", currency.code()))
        .style(Style::default().fg(Color::Gray))
        .bounds([y_min, y_max])
        .labels(vec![
            Span::raw(format!("{}{:.0}", symbol, y_min)),
            Span::raw(format!("{}{:.0}", symbol, (y_min + y_max) / 2.0)),
            Span::raw(format!("{}{:.0}", symbol, y_max)),
        ]);

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title.to_string()),
        )
        .x_axis(x_axis)
        .y_axis(y_axis);

    frame.render_widget(chart, area);
}

// ============================================================================
// Écran de détail
// ============================================================================

pub fn render_detail<S: MarketDataSource>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let Some(feed) = &app.detail else {
        render_no_data(frame, area, "No stock selected");
        return;
    };

    let requested = feed.params().range;
    let state = feed.state();

    let Some(detail) = &state.data else {
        match &state.error {
            Some(error) => render_error(frame, area, &feed.params().symbol, error),
            None => render_loading(frame, area, " Stock ", "Loading stock data..."),
        }
        return;
    };

    let related = app.related_news();
    // Deux lignes par article + bordures, rien si aucun article lié
    let news_height = if related.is_empty() { 0 } else { related.len() as u16 * 2 + 2 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),           // En-tête + périodes
            Constraint::Min(8),              // Graphique
            Constraint::Length(9),           // Statistiques
            Constraint::Length(news_height), // Actualités liées
        ])
        .split(area);

    let currency = app.context.currency();
    render_detail_header(frame, detail, requested, state.loading, currency, chunks[0]);

    let title = format!(" {} · {} ", detail.stock.symbol, detail.range.long_label());
    render_line_chart(
        frame,
        chunks[1],
        &title,
        &detail.chart,
        currency,
        detail.range.is_intraday(),
    );

    let stats = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);

    render_statistics(frame, detail, currency, stats[0]);
    render_about(frame, app, detail, currency, stats[1]);

    if !related.is_empty() {
        render_related_news(frame, &related, chunks[3]);
    }

    if let Some(error) = &state.error {
        // Données précédentes conservées, erreur en surimpression du titre
        let line = Paragraph::new(Line::from(Span::styled(
            format!(" ⚠ {} · [r] Retry ", error),
            Style::default().fg(Color::Red),
        )))
        .alignment(Alignment::Right);
        frame.render_widget(line, Rect { height: 1, ..chunks[0] });
    }
}

fn render_detail_header(
    frame: &mut Frame,
    detail: &StockDetail,
    requested: TimeRange,
    loading: bool,
    currency: Currency,
    area: Rect,
) {
    let stock = &detail.stock;
    let color = trend_color(stock.is_positive());
    let arrow = if stock.is_positive() { "▲" } else { "▼" };

    let price = Line::from(vec![
        Span::styled(
            currency.format(stock.price),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{} {:+.2} ({:+.2}%)", arrow, stock.change, stock.change_percent),
            Style::default().fg(color),
        ),
    ]);

    let mut ranges = Vec::new();
    for range in TimeRange::all() {
        let style = if range == requested {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(Color::Gray)
        };
        ranges.push(Span::styled(format!(" {} ", range.label()), style));
        ranges.push(Span::raw(" "));
    }
    if loading {
        ranges.push(Span::styled(" ⟳ Loading...", Style::default().fg(Color::Yellow)));
    }

    let paragraph = Paragraph::new(vec![price, Line::from(ranges)])
        .block(bordered(format!(" 📈 {} · {} ", stock.symbol, stock.name)))
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

fn stat_line(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<14}", label), Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(Color::White)),
    ])
}

fn render_statistics(frame: &mut Frame, detail: &StockDetail, currency: Currency, area: Rect) {
    let stock = &detail.stock;
    let market_cap = stock
        .market_cap
        .map(|cap| format!("{}{}", currency.symbol(), format_large_number(cap as f64)))
        .unwrap_or_else(|| "N/A".to_string());

    let lines = vec![
        stat_line("Open", currency.format(stock.open)),
        stat_line("High", currency.format(stock.high)),
        stat_line("Low", currency.format(stock.low)),
        stat_line("Prev. close", currency.format(stock.previous_close)),
        stat_line("Volume", format_large_number(stock.volume as f64)),
        stat_line("Market cap", market_cap),
    ];

    frame.render_widget(Paragraph::new(lines).block(bordered(" Statistics ")), area);
}

/// Description, secteur, et analyse réservée aux membres Pro
fn render_about<S: MarketDataSource>(
    frame: &mut Frame,
    app: &App<S>,
    detail: &StockDetail,
    currency: Currency,
    area: Rect,
) {
    let stock = &detail.stock;
    let mut lines = vec![
        stat_line("Sector", stock.sector.clone().unwrap_or_else(|| "N/A".to_string())),
        stat_line("Country", stock.country.clone().unwrap_or_else(|| "N/A".to_string())),
    ];

    if app.context.is_pro() {
        if let Some((low, high)) = detail.price_bounds() {
            lines.push(stat_line(
                "Period range",
                format!("{} – {}", currency.format(low), currency.format(high)),
            ));
        }
    } else {
        lines.push(Line::from(Span::styled(
            "🔒 Period analytics with Pro",
            Style::default().fg(Color::Yellow),
        )));
    }

    if let Some(description) = &stock.description {
        lines.push(Line::from(""));
        lines.push(Line::from(description.clone()));
    }

    let paragraph = Paragraph::new(lines)
        .block(bordered(" About "))
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn render_related_news(frame: &mut Frame, items: &[NewsItem], area: Rect) {
    let now = Utc::now();
    let mut lines = Vec::new();
    for item in items {
        lines.push(Line::from(Span::styled(
            item.title.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            format!("{} · {}", item.source, item.age(now)),
            Style::default().fg(Color::Cyan),
        )));
    }

    frame.render_widget(Paragraph::new(lines).block(bordered(" Related News ")), area);
}

/// Message quand il n'y a rien à afficher
fn render_no_data(frame: &mut Frame, area: Rect, message: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(Color::Gray))),
        Line::from(""),
        Line::from(Span::styled("[ESC] Back", Style::default().fg(Color::Gray))),
    ];

    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}
