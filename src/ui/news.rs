// ============================================================================
// News - Liste des actualités
// ============================================================================

use chrono::Utc;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState},
    Frame,
};

use crate::api::MarketDataSource;
use crate::app::App;
use crate::models::NewsItem;
use crate::ui::dashboard::{bordered, render_error, render_loading};

pub fn render_news<S: MarketDataSource>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let state = app.news.state();

    let Some(items) = &state.data else {
        match &state.error {
            Some(error) => render_error(frame, area, "News", error),
            None => render_loading(frame, area, " 📰 Market News ", "Loading news..."),
        }
        return;
    };

    let mut title = format!(" 📰 Market News ({}) ", items.len());
    if state.loading {
        title.push_str("⟳ ");
    }
    if let Some(error) = &state.error {
        title.push_str(&format!("⚠ {} ", error));
    }

    let now = Utc::now();
    let list_items: Vec<ListItem> = items.iter().map(|item| news_item(item, now)).collect();

    // CONCEPT RATATUI : ListState
    // - Le widget fait défiler la liste pour garder la sélection visible
    let mut list_state = ListState::default();
    list_state.select(Some(app.selected_index.min(items.len().saturating_sub(1))));

    let list = List::new(list_items)
        .block(bordered(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(list, area, &mut list_state);
}

/// Titre, méta-données et résumé sur trois lignes
fn news_item(item: &NewsItem, now: chrono::DateTime<Utc>) -> ListItem<'static> {
    let symbols = if item.related_symbols.is_empty() {
        String::new()
    } else {
        format!(" · {}", item.related_symbols.join(", "))
    };

    ListItem::new(vec![
        Line::from(Span::styled(
            item.title.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("{} · {}{}", item.source, item.age(now), symbols),
            Style::default().fg(Color::Cyan),
        )),
        Line::from(Span::styled(item.summary.clone(), Style::default().fg(Color::Gray))),
        Line::from(""),
    ])
}
