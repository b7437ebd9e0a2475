//! Pure flood risk scoring and classification.
//!
//! Everything in this module is a deterministic, side-effect-free function of
//! its inputs. Rolling rainfall comes from the aggregator, elevation and
//! flood history are static location attributes, and the calendar month is
//! passed in by the caller (clock injection keeps scoring testable without
//! time manipulation).
//!
//! Scoring is additive across five independent capped factors; within a
//! factor only the highest matched bracket applies. The total is clamped to
//! `0..=MAX_SCORE` and classified by descending minimum score, first match
//! wins.

use crate::model::RiskLevel;
use crate::risk::rules::{
    ELEVATION_RULES, FLOOD_HISTORY_RULES, MAX_SCORE, RAINFALL_24H_RULES, RAINFALL_72H_RULES,
    RISK_LEVEL_RULES, SEASON_RULES,
};

// ---------------------------------------------------------------------------
// Inputs and output
// ---------------------------------------------------------------------------

/// Everything the scoring engine needs for one location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskInputs {
    /// Rolling 24-hour rainfall sum, in millimeters.
    pub rainfall_24h_mm: f64,
    /// Rolling 72-hour rainfall sum, in millimeters.
    pub rainfall_72h_mm: f64,
    /// Location elevation above sea level, in meters.
    pub elevation_m: f64,
    /// Floods recorded at this location in the trailing five years.
    pub historical_flood_count: u32,
    /// Calendar month 1–12, for season weighting.
    pub month: u32,
}

/// The scored and classified result for one location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskScore {
    pub score: u8,
    pub level: RiskLevel,
}

// ---------------------------------------------------------------------------
// Factor scoring (one bracket per factor — highest threshold met wins)
// ---------------------------------------------------------------------------

fn rainfall_factor(total_mm: f64, table: &[crate::risk::rules::RainfallRule]) -> u8 {
    table
        .iter()
        .find(|rule| total_mm >= rule.min_mm)
        .map(|rule| rule.score)
        .unwrap_or(0)
}

fn elevation_factor(elevation_m: f64) -> u8 {
    ELEVATION_RULES
        .iter()
        .find(|rule| elevation_m < rule.below_m)
        .map(|rule| rule.score)
        .unwrap_or(0)
}

fn flood_history_factor(flood_count: u32) -> u8 {
    FLOOD_HISTORY_RULES
        .iter()
        .find(|rule| flood_count >= rule.min_floods)
        .map(|rule| rule.score)
        .unwrap_or(0)
}

fn season_factor(month: u32) -> u8 {
    SEASON_RULES
        .iter()
        .find(|rule| rule.months.contains(&month))
        .map(|rule| rule.score)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Scoring and classification
// ---------------------------------------------------------------------------

/// Computes the additive risk score, clamped to `0..=MAX_SCORE`.
pub fn compute_score(inputs: &RiskInputs) -> u8 {
    let total = rainfall_factor(inputs.rainfall_24h_mm, RAINFALL_24H_RULES)
        + rainfall_factor(inputs.rainfall_72h_mm, RAINFALL_72H_RULES)
        + elevation_factor(inputs.elevation_m)
        + flood_history_factor(inputs.historical_flood_count)
        + season_factor(inputs.month);
    total.min(MAX_SCORE)
}

/// Maps a score to its risk level. Total order over `0..=MAX_SCORE` with no
/// gaps: the table's terminal bracket has `min_score: 0`.
pub fn classify(score: u8) -> RiskLevel {
    RISK_LEVEL_RULES
        .iter()
        .find(|rule| score >= rule.min_score)
        .map(|rule| rule.level)
        .unwrap_or(RiskLevel::Low)
}

/// Scores and classifies in one step.
pub fn assess(inputs: &RiskInputs) -> RiskScore {
    let score = compute_score(inputs);
    RiskScore {
        score,
        level: classify(score),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
