//! FloodSense core service.
//!
//! Ingests periodic weather observations for a set of fixed locations,
//! derives rolling 24h/72h rainfall aggregates, scores flood risk per
//! location on a 0–15 additive scale, classifies the score into one of four
//! ordered levels, and notifies subscribers whose threshold is met.
//!
//! The HTTP layer, auth, schema migrations, and transport internals live in
//! the surrounding application; this crate owns only the scheduled pipeline
//! and talks to everything else through the trait seams in [`store`],
//! [`ingest`], and [`notify`].

pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod risk;
pub mod store;
