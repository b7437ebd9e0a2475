//! Flood risk scoring policy.
//!
//! Submodules:
//! - `rules` — static config-as-code scoring tables and the risk level table.
//! - `engine` — pure scoring and classification over those tables.

pub mod engine;
pub mod rules;
