//! TripMate search crate - provider adapters and the per-session result cache.
//!
//! Provides the [`SearchProvider`] seam, SerpAPI-backed flight, hotel,
//! attraction and train adapters that normalize heterogeneous payloads into fixed
//! record shapes, and a fingerprint-keyed [`ResultCache`] with an exact
//! lookup path and a partial-match reuse path.

pub mod cache;
pub mod error;
pub mod format;
pub mod provider;
pub mod records;
pub mod serp;

pub use cache::{CacheEntry, ResultCache};
pub use error::SearchError;
pub use provider::{search_with_cache, SearchProvider};
pub use records::{AttractionRecord, FlightRecord, HotelRecord, SearchKind, TrainRecord};
pub use serp::{
    SerpAttractionProvider, SerpClient, SerpFlightProvider, SerpHotelProvider, SerpTrainProvider,
};
