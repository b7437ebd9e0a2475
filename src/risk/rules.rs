//! Static scoring tables for the flood risk policy.
//!
//! This is the single source of truth for the 0–15 additive scoring scheme —
//! all other modules should reference rules from here rather than hardcoding
//! thresholds. Each factor is an ordered rule list evaluated top to bottom,
//! first match wins, so the policy stays auditable and testable on its own.
//!
//! Factor caps: 24h rainfall 4, 72h rainfall 4, elevation 3, flood history 2,
//! season 2 — maximum possible total 15.

use crate::model::RiskLevel;

// ---------------------------------------------------------------------------
// Rule types
// ---------------------------------------------------------------------------

/// Rainfall scoring bracket: matches when the windowed sum is at least
/// `min_mm` (inclusive lower bound).
pub struct RainfallRule {
    pub min_mm: f64,
    pub score: u8,
    pub label: &'static str,
}

/// Elevation scoring bracket: matches when elevation is strictly below
/// `below_m`.
pub struct ElevationRule {
    pub below_m: f64,
    pub score: u8,
    pub label: &'static str,
}

/// Flood history bracket: matches when the trailing-5-year flood count is at
/// least `min_floods`.
pub struct FloodHistoryRule {
    pub min_floods: u32,
    pub score: u8,
    pub label: &'static str,
}

/// Seasonal bracket: matches when the current calendar month is listed.
pub struct SeasonRule {
    pub months: &'static [u32],
    pub score: u8,
    pub label: &'static str,
}

/// Risk level bracket: matches when the total score is at least `min_score`.
/// The color and advisory action are fixed per level and looked up here, not
/// recomputed.
pub struct RiskLevelRule {
    pub min_score: u8,
    pub level: RiskLevel,
    /// Display color for dashboards, as a hex string.
    pub color: &'static str,
    /// Advisory action shown to subscribers at this level.
    pub action: &'static str,
}

// ---------------------------------------------------------------------------
// Factor tables (descending threshold order — first match wins)
// ---------------------------------------------------------------------------

pub static RAINFALL_24H_RULES: &[RainfallRule] = &[
    RainfallRule { min_mm: 200.0, score: 4, label: "Extreme 24h rainfall" },
    RainfallRule { min_mm: 150.0, score: 3, label: "Very heavy 24h rainfall" },
    RainfallRule { min_mm: 100.0, score: 2, label: "Heavy 24h rainfall" },
    RainfallRule { min_mm: 50.0, score: 1, label: "Moderate 24h rainfall" },
];

pub static RAINFALL_72H_RULES: &[RainfallRule] = &[
    RainfallRule { min_mm: 400.0, score: 4, label: "Extreme 72h rainfall" },
    RainfallRule { min_mm: 300.0, score: 3, label: "Very heavy 72h rainfall" },
    RainfallRule { min_mm: 200.0, score: 2, label: "Heavy 72h rainfall" },
    RainfallRule { min_mm: 100.0, score: 1, label: "Moderate 72h rainfall" },
];

/// Ascending ceilings: the lowest bracket a location fits is the one that
/// applies, so order is lowest ceiling first.
pub static ELEVATION_RULES: &[ElevationRule] = &[
    ElevationRule { below_m: 5.0, score: 3, label: "Extremely low elevation" },
    ElevationRule { below_m: 10.0, score: 2, label: "Very low elevation" },
    ElevationRule { below_m: 25.0, score: 1, label: "Low elevation" },
];

pub static FLOOD_HISTORY_RULES: &[FloodHistoryRule] = &[
    FloodHistoryRule { min_floods: 3, score: 2, label: "Frequently flooded area" },
    FloodHistoryRule { min_floods: 1, score: 1, label: "Previously flooded area" },
];

/// Sri Lanka monsoon calendar. Both monsoons carry the same weight; the
/// March–April inter-monsoon brings convective rain at reduced weight.
pub static SEASON_RULES: &[SeasonRule] = &[
    SeasonRule { months: &[5, 6, 7, 8, 9], score: 2, label: "SW Monsoon season" },
    SeasonRule { months: &[10, 11, 12, 1], score: 2, label: "NE Monsoon season" },
    SeasonRule { months: &[3, 4], score: 1, label: "Inter-Monsoon period" },
];

// ---------------------------------------------------------------------------
// Risk level table (descending min score — first match wins)
// ---------------------------------------------------------------------------

/// Maximum total score the factor tables can produce; totals are clamped
/// to this bound.
pub const MAX_SCORE: u8 = 15;

pub static RISK_LEVEL_RULES: &[RiskLevelRule] = &[
    RiskLevelRule {
        min_score: 9,
        level: RiskLevel::Critical,
        color: "#DC2626",
        action: "Evacuate immediately to higher ground",
    },
    RiskLevelRule {
        min_score: 6,
        level: RiskLevel::High,
        color: "#F97316",
        action: "Prepare to evacuate - secure property and gather emergency supplies",
    },
    RiskLevelRule {
        min_score: 3,
        level: RiskLevel::Moderate,
        color: "#EAB308",
        action: "Stay alert - monitor updates and review evacuation plan",
    },
    RiskLevelRule {
        min_score: 0,
        level: RiskLevel::Low,
        color: "#22C55E",
        action: "Normal conditions - maintain general awareness",
    },
];

/// Looks up the fixed display/advisory profile for a level.
pub fn level_rule(level: RiskLevel) -> &'static RiskLevelRule {
    RISK_LEVEL_RULES
        .iter()
        .find(|r| r.level == level)
        .unwrap_or(&RISK_LEVEL_RULES[RISK_LEVEL_RULES.len() - 1])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
