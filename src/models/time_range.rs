// ============================================================================
// Enum : TimeRange
// ============================================================================
// Période affichée sur la page de détail d'une action
//
// CONCEPT : Range vs pas
// - 1D : 24 pas d'une heure
// - 1M / 3M / 1Y : 30 / 90 / 365 pas d'un jour
// - Un historique contient toujours (pas + 1) points, jour 0 inclus
// ============================================================================

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Période d'historique pour la vue détail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TimeRange {
    /// Période ouverte par défaut sur le détail
    #[default]
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "1Y")]
    OneYear,
}

impl TimeRange {
    /// Label court (ex: "3M")
    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::OneDay => "1D",
            TimeRange::OneMonth => "1M",
            TimeRange::ThreeMonths => "3M",
            TimeRange::OneYear => "1Y",
        }
    }

    /// Label long pour le sélecteur
    pub fn long_label(&self) -> &'static str {
        match self {
            TimeRange::OneDay => "1 Day",
            TimeRange::OneMonth => "1 Month",
            TimeRange::ThreeMonths => "3 Months",
            TimeRange::OneYear => "1 Year",
        }
    }

    /// Nombre de pas couverts par la période
    pub fn steps(&self) -> u32 {
        match self {
            TimeRange::OneDay => 24,
            TimeRange::OneMonth => 30,
            TimeRange::ThreeMonths => 90,
            TimeRange::OneYear => 365,
        }
    }

    /// Durée d'un pas
    pub fn step(&self) -> Duration {
        match self {
            TimeRange::OneDay => Duration::hours(1),
            _ => Duration::days(1),
        }
    }

    /// Amplitude du bruit de la marche aléatoire
    pub fn volatility(&self) -> f64 {
        match self {
            TimeRange::OneYear => 20.0,
            _ => 10.0,
        }
    }

    pub fn is_intraday(&self) -> bool {
        matches!(self, TimeRange::OneDay)
    }

    pub fn all() -> [TimeRange; 4] {
        [
            TimeRange::OneDay,
            TimeRange::OneMonth,
            TimeRange::ThreeMonths,
            TimeRange::OneYear,
        ]
    }

    /// Période suivante (touche 'l' sur la vue détail)
    pub fn next(&self) -> TimeRange {
        match self {
            TimeRange::OneDay => TimeRange::OneMonth,
            TimeRange::OneMonth => TimeRange::ThreeMonths,
            TimeRange::ThreeMonths => TimeRange::OneYear,
            TimeRange::OneYear => TimeRange::OneDay,
        }
    }

    /// Période précédente (touche 'h')
    pub fn previous(&self) -> TimeRange {
        match self {
            TimeRange::OneDay => TimeRange::OneYear,
            TimeRange::OneMonth => TimeRange::OneDay,
            TimeRange::ThreeMonths => TimeRange::OneMonth,
            TimeRange::OneYear => TimeRange::ThreeMonths,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps() {
        assert_eq!(TimeRange::OneDay.steps(), 24);
        assert_eq!(TimeRange::OneYear.steps(), 365);
        assert_eq!(TimeRange::OneDay.step(), Duration::hours(1));
        assert_eq!(TimeRange::ThreeMonths.step(), Duration::days(1));
        assert_eq!(TimeRange::default(), TimeRange::OneDay);
    }

    #[test]
    fn test_next_previous_are_inverse() {
        for range in TimeRange::all() {
            assert_eq!(range.next().previous(), range);
        }
    }

    #[test]
    fn test_serde_label() {
        let json = serde_json::to_string(&TimeRange::ThreeMonths).unwrap();
        assert_eq!(json, "\"3M\"");
    }
}
