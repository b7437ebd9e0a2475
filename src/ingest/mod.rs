//! Weather ingestion.
//!
//! The [`WeatherProvider`] trait is the seam between the pipeline and the
//! external weather API. Production uses [`openweather::OpenWeatherClient`];
//! tests substitute an in-memory fake.

pub mod openweather;

use crate::model::{ProviderError, ProviderReading};

/// One current-conditions fetch per call. Implementations must apply their
/// own bounded per-call timeout — a hung fetch must not stall the rest of
/// the location set indefinitely.
///
/// `Sync` because the collector fans fetches out across scoped worker
/// threads sharing one provider handle.
pub trait WeatherProvider: Sync {
    fn fetch_current(&self, latitude: f64, longitude: f64)
    -> Result<ProviderReading, ProviderError>;
}
