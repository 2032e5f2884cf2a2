//! Trip sessions.
//!
//! A [`TripSession`] owns everything a conversation accumulates: the travel
//! memory and one result cache per search type. Nothing here is shared
//! between sessions.

use std::collections::HashSet;

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use tripmate_core::config::CacheConfig;
use tripmate_core::TravelMemory;
use tripmate_search::{
    AttractionRecord, FlightRecord, HotelRecord, ResultCache, SearchKind, TrainRecord,
};
use uuid::Uuid;

// =============================================================================
// TripSession
// =============================================================================

/// State of one conversation.
#[derive(Debug, Clone)]
pub struct TripSession {
    pub id: Uuid,
    pub memory: TravelMemory,
    pub(crate) hotel_cache: ResultCache<HotelRecord>,
    pub(crate) flight_cache: ResultCache<FlightRecord>,
    pub(crate) attraction_cache: ResultCache<AttractionRecord>,
    pub(crate) train_cache: ResultCache<TrainRecord>,
    /// Search types that have run at least once since the last reset.
    pub(crate) searched: HashSet<SearchKind>,
    /// Completed turns since the last reset.
    pub turns: u64,
    /// Epoch seconds.
    pub started_at: i64,
    /// Epoch seconds.
    pub last_message_at: i64,
    cache_config: CacheConfig,
}

impl TripSession {
    pub fn new(cache_config: &CacheConfig) -> Self {
        let now = Local::now().timestamp();
        Self {
            id: Uuid::new_v4(),
            memory: TravelMemory::default(),
            hotel_cache: ResultCache::from_config(cache_config),
            flight_cache: ResultCache::from_config(cache_config),
            attraction_cache: ResultCache::from_config(cache_config),
            train_cache: ResultCache::from_config(cache_config),
            searched: HashSet::new(),
            turns: 0,
            started_at: now,
            last_message_at: now,
            cache_config: cache_config.clone(),
        }
    }

    /// Forget the trip: fresh memory, empty caches, turn count back to zero.
    /// The session id is kept.
    pub fn reset(&mut self) {
        self.memory = TravelMemory::default();
        self.hotel_cache = ResultCache::from_config(&self.cache_config);
        self.flight_cache = ResultCache::from_config(&self.cache_config);
        self.attraction_cache = ResultCache::from_config(&self.cache_config);
        self.train_cache = ResultCache::from_config(&self.cache_config);
        self.searched.clear();
        self.turns = 0;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.last_message_at = Local::now().timestamp();
    }

    pub fn has_searched(&self, kind: SearchKind) -> bool {
        self.searched.contains(&kind)
    }

    pub fn hotel_cache(&self) -> &ResultCache<HotelRecord> {
        &self.hotel_cache
    }

    pub fn flight_cache(&self) -> &ResultCache<FlightRecord> {
        &self.flight_cache
    }

    pub fn attraction_cache(&self) -> &ResultCache<AttractionRecord> {
        &self.attraction_cache
    }

    pub fn train_cache(&self) -> &ResultCache<TrainRecord> {
        &self.train_cache
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            started_at: format_epoch(self.started_at),
            last_message_at: format_epoch(self.last_message_at),
            turn_count: self.turns,
            destination: self.memory.destination.clone(),
        }
    }
}

/// Listing view of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub started_at: String,
    pub last_message_at: String,
    pub turn_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

// =============================================================================
// SessionManager
// =============================================================================

/// Creates sessions and decides when an idle one has expired.
#[derive(Debug, Clone)]
pub struct SessionManager {
    /// Session timeout in minutes.
    pub session_timeout_minutes: u32,
    cache_config: CacheConfig,
}

impl SessionManager {
    pub fn new(session_timeout_minutes: u32, cache_config: CacheConfig) -> Self {
        Self {
            session_timeout_minutes,
            cache_config,
        }
    }

    pub fn create_session(&self) -> TripSession {
        TripSession::new(&self.cache_config)
    }

    /// Check whether a session has been idle past the configured timeout.
    pub fn is_expired(&self, session: &TripSession) -> bool {
        let now = Local::now().timestamp();
        let timeout_secs = i64::from(self.session_timeout_minutes) * 60;
        now - session.last_message_at > timeout_secs
    }
}

/// Format epoch seconds as ISO 8601 string.
fn format_epoch(epoch: i64) -> String {
    Local
        .timestamp_opt(epoch, 0)
        .single()
        .map(|dt: DateTime<Local>| dt.to_rfc3339())
        .unwrap_or_else(|| epoch.to_string())
}
