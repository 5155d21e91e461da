//! Categorical colors handed to the painter.
//!
//! Unknown values never fail; they fall back to [`NEUTRAL_COLOR`].

use super::graph::{Criticality, IntegrationPattern, NodeLevel};

pub const NEUTRAL_COLOR: &str = "#9e9e9e";
pub const PINNED_COLOR: &str = "#1565c0";
pub const MIDDLEWARE_COLOR: &str = "#6a1b9a";

pub fn level_color(level: &NodeLevel) -> &'static str {
    match level {
        NodeLevel::Root => "#37474f",
        NodeLevel::L1 => "#1e88e5",
        NodeLevel::L2 => "#43a047",
        NodeLevel::L3 => "#fb8c00",
        NodeLevel::System => "#8e24aa",
        NodeLevel::Other(_) => NEUTRAL_COLOR,
    }
}

pub fn criticality_color(criticality: Option<&Criticality>) -> &'static str {
    match criticality {
        Some(Criticality::Major) => "#d32f2f",
        Some(Criticality::Standard(tier)) => match tier.as_str() {
            "1" | "High" => "#f57c00",
            "2" | "Medium" => "#fbc02d",
            "3" | "Low" => "#388e3c",
            _ => "#0288d1",
        },
        Some(Criticality::Unknown(_)) | None => NEUTRAL_COLOR,
    }
}

pub fn pattern_color(pattern: &IntegrationPattern) -> &'static str {
    match pattern {
        IntegrationPattern::Api => "#42a5f5",
        IntegrationPattern::Batch => "#ffa726",
        IntegrationPattern::File => "#8d6e63",
        IntegrationPattern::WebService => "#26a69a",
        IntegrationPattern::Messaging => "#ab47bc",
        IntegrationPattern::Other(_) => NEUTRAL_COLOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_values_are_neutral() {
        assert_eq!(level_color(&NodeLevel::Other("X".into())), NEUTRAL_COLOR);
        assert_eq!(criticality_color(Some(&Criticality::Unknown("?".into()))), NEUTRAL_COLOR);
        assert_eq!(criticality_color(None), NEUTRAL_COLOR);
        assert_eq!(pattern_color(&IntegrationPattern::Other("FTP-ish".into())), NEUTRAL_COLOR);
    }

    #[test]
    fn test_known_values_are_distinct_from_neutral() {
        assert_ne!(criticality_color(Some(&Criticality::Major)), NEUTRAL_COLOR);
        assert_ne!(criticality_color(Some(&Criticality::Standard("9".into()))), NEUTRAL_COLOR);
        assert_ne!(pattern_color(&IntegrationPattern::Api), NEUTRAL_COLOR);
    }
}
