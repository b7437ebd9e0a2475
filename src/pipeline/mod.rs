//! The scheduled flood alert pipeline.
//!
//! One cycle runs collect → aggregate → score → dispatch across all tracked
//! locations, with per-location failures isolated at the location boundary.
//!
//! Submodules:
//! - `collector` — concurrent weather fetch fan-out and observation storage.
//! - `aggregator` — rolling 24h/72h rainfall sums on the latest observation.
//! - `dispatcher` — subscriber matching, notification, alert logging.
//! - `scheduler` — the fixed-interval orchestrator and cycle summary.

pub mod aggregator;
pub mod collector;
pub mod dispatcher;
pub mod scheduler;
