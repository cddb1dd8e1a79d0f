// ============================================================================
// Account / Pro - Compte utilisateur et offre Pro
// ============================================================================
// Les formulaires de connexion / inscription sont des popups dessinées par
// le dashboard ; cet écran montre l'état du compte.
// ============================================================================

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::api::MarketDataSource;
use crate::app::App;
use crate::auth::AuthState;
use crate::ui::dashboard::bordered;

/// Avantages listés sur la page Pro
const PRO_FEATURES: [&str; 4] = [
    "Period analytics on every stock page",
    "Real-time alerts on price moves",
    "Advanced portfolio insights",
    "Priority support",
];

fn key_line(key: &'static str, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(key, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::raw(format!(" {}", action)),
    ])
}

pub fn render_account<S: MarketDataSource>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let mut lines = vec![Line::from("")];

    match app.context.user() {
        Some(user) => {
            lines.push(Line::from(Span::styled(
                format!("Welcome back, {}", user.name),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(""));
            lines.push(Line::from(format!("Email       {}", user.email)));
            lines.push(Line::from(format!("User ID     {}", user.id)));
            lines.push(Line::from(format!("Membership  {}", user.membership_label())));
            lines.push(Line::from(format!("Holdings    {}", user.portfolio.len())));
            lines.push(Line::from(""));
            lines.push(key_line("[x]", "Sign out"));
        }
        None => {
            lines.push(Line::from(Span::styled(
                "Welcome to StockFlow",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                "Sign in to manage your portfolio and unlock Pro",
                Style::default().fg(Color::Gray),
            )));
            lines.push(Line::from(""));
            lines.push(key_line("[i]", "Sign in"));
            lines.push(key_line("[n]", "Create an account"));
        }
    }

    if app.auth.state() == AuthState::Authenticating {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "⟳ Signing in...",
            Style::default().fg(Color::Yellow),
        )));
    } else if let Some(error) = app.auth.error() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("⚠ {}", error),
            Style::default().fg(Color::Red),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(bordered(" 👤 Account "))
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

pub fn render_pro<S: MarketDataSource>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "StockFlow Pro",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for feature in PRO_FEATURES {
        lines.push(Line::from(format!("✔ {}", feature)));
    }
    lines.push(Line::from(""));

    if app.context.is_pro() {
        lines.push(Line::from(Span::styled(
            "You're a Pro member. Enjoy!",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
    } else if app.context.is_signed_in() {
        lines.push(key_line("[u]", "Upgrade to Pro"));
    } else {
        lines.push(Line::from(Span::styled(
            "Sign in from the Account tab to upgrade",
            Style::default().fg(Color::Gray),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(bordered(" ⭐ Pro "))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}
