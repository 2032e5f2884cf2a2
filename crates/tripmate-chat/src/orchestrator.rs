//! Per-turn search orchestration.
//!
//! Each turn runs extraction, merge and gap-filling, then decides for every
//! applicable search type whether to reuse cached results or go back to the
//! provider. The outcome is an [`EvidenceBundle`] for response generation.
//! A turn always completes: extraction and provider failures degrade to
//! "no new facts" and "no results" respectively.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tripmate_core::config::SearchConfig;
use tripmate_core::{resolve_airport_code, ChangeDetector, SearchParams, TravelMemory};
use tripmate_search::{
    search_with_cache, AttractionRecord, FlightRecord, HotelRecord, ResultCache, SearchError,
    SearchKind, SearchProvider, TrainRecord,
};

use crate::extractor::InfoExtractor;
use crate::session::TripSession;

// =============================================================================
// EvidenceBundle
// =============================================================================

/// Everything response generation gets to see for one turn.
///
/// A result list is present when that search type was applicable this turn,
/// even if it came back empty.
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceBundle {
    pub prompt: String,
    pub trip_info: TravelMemory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotels: Option<Vec<HotelRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flights: Option<Vec<FlightRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attractions: Option<Vec<AttractionRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trains: Option<Vec<TrainRecord>>,
}

impl EvidenceBundle {
    pub fn counts(&self) -> EvidenceCounts {
        EvidenceCounts {
            hotels: self.hotels.as_ref().map(Vec::len),
            flights: self.flights.as_ref().map(Vec::len),
            attractions: self.attractions.as_ref().map(Vec::len),
            trains: self.trains.as_ref().map(Vec::len),
        }
    }
}

/// Result counts per search type; `None` when the type did not run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvidenceCounts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotels: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flights: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attractions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trains: Option<usize>,
}

// =============================================================================
// Parameter sets
// =============================================================================

/// Hotel search parameters. Needs destination and both dates.
pub fn hotel_params(memory: &TravelMemory) -> Option<SearchParams> {
    let location = memory.destination.as_deref()?;
    let check_in = memory.check_in_date.as_deref()?;
    let check_out = memory.check_out_date.as_deref()?;
    Some(
        SearchParams::new()
            .with("location", location)
            .with("check_in_date", check_in)
            .with("check_out_date", check_out)
            .with("adults", memory.num_adults)
            .with("hotel_class", memory.hotel_class()),
    )
}

/// Flight search parameters.
///
/// Needs a flight origin (first transit city, else origin), destination and
/// check-in, and flights must be among the wanted transport modes.
pub fn flight_params(memory: &TravelMemory) -> Option<SearchParams> {
    if !memory.wants_flights() {
        return None;
    }
    let origin = resolve_airport_code(memory.flight_origin())?;
    let destination = resolve_airport_code(memory.destination.as_deref())?;
    let departure = memory.check_in_date.as_deref()?;
    Some(
        SearchParams::new()
            .with("origin", origin)
            .with("destination", destination)
            .with("departure_date", departure)
            .with("return_date", memory.check_out_date.clone())
            .with("adults", memory.num_adults),
    )
}

/// Attraction search parameters. Needs destination.
pub fn attraction_params(memory: &TravelMemory) -> Option<SearchParams> {
    let location = memory.destination.as_deref()?;
    Some(SearchParams::new().with("location", location))
}

/// Train search parameters.
///
/// Needs origin and check-in. The leg ends at the first transit city, else
/// the destination.
pub fn train_params(memory: &TravelMemory) -> Option<SearchParams> {
    if !memory.wants_trains() {
        return None;
    }
    let origin = memory.origin.as_deref()?;
    let destination = memory.train_destination()?;
    let departure = memory.check_in_date.as_deref()?;
    Some(
        SearchParams::new()
            .with("origin", origin)
            .with("destination", destination)
            .with("departure_date", departure),
    )
}

// =============================================================================
// SearchOrchestrator
// =============================================================================

/// Provider set used by the orchestrator.
#[derive(Clone)]
pub struct SearchProviders {
    pub hotels: Arc<dyn SearchProvider<Record = HotelRecord>>,
    pub flights: Arc<dyn SearchProvider<Record = FlightRecord>>,
    /// `None` disables attraction searches.
    pub attractions: Option<Arc<dyn SearchProvider<Record = AttractionRecord>>>,
    /// `None` disables train searches.
    pub trains: Option<Arc<dyn SearchProvider<Record = TrainRecord>>>,
}

/// Runs one turn against a session.
pub struct SearchOrchestrator {
    extractor: InfoExtractor,
    providers: SearchProviders,
    detector: ChangeDetector,
    search_timeout: Duration,
    fixed_date: Option<NaiveDate>,
}

impl SearchOrchestrator {
    pub fn new(extractor: InfoExtractor, providers: SearchProviders, config: &SearchConfig) -> Self {
        let SearchProviders {
            hotels,
            flights,
            attractions,
            trains,
        } = providers;
        let providers = SearchProviders {
            hotels,
            flights,
            attractions: attractions.filter(|_| config.attractions_enabled),
            trains: trains.filter(|_| config.trains_enabled),
        };
        Self {
            extractor,
            providers,
            detector: ChangeDetector,
            search_timeout: Duration::from_secs(config.timeout_secs.max(1)),
            fixed_date: None,
        }
    }

    /// Pin "today" for gap-filling and extraction prompts.
    pub fn with_fixed_date(mut self, date: NaiveDate) -> Self {
        self.fixed_date = Some(date);
        self
    }

    /// Override the per-provider-call timeout.
    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.fixed_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// Run one turn: extract, merge, fill gaps, search, bundle.
    pub async fn run_turn(&self, session: &mut TripSession, message: &str) -> EvidenceBundle {
        let today = self.today();
        let before = session.memory.clone();

        let patch = self.extractor.extract(message, &before, today).await;
        let mut after = before.merged(&patch);
        after.assume_defaults(today);
        session.memory = after.clone();

        let first_turn = session.turns == 0;
        let refresh = |kind: SearchKind| {
            let first_search = first_turn || !session.searched.contains(&kind);
            let decision = self
                .detector
                .should_refresh(&before, &after, message, first_search);
            tracing::debug!(%kind, first_search, refresh = decision, "Refresh decision");
            decision
        };

        let hotel_plan = hotel_params(&after).map(|p| (refresh(SearchKind::Hotels), p));
        let flight_plan = flight_params(&after).map(|p| (refresh(SearchKind::Flights), p));
        let attraction_plan = self
            .providers
            .attractions
            .as_ref()
            .and_then(|provider| {
                attraction_params(&after).map(|p| (&**provider, refresh(SearchKind::Attractions), p))
            });
        let train_plan = self.providers.trains.as_ref().and_then(|provider| {
            train_params(&after).map(|p| (&**provider, refresh(SearchKind::Trains), p))
        });

        let TripSession {
            hotel_cache,
            flight_cache,
            attraction_cache,
            train_cache,
            ..
        } = &mut *session;

        let timeout = self.search_timeout;
        let hotels = async {
            match &hotel_plan {
                Some((force, params)) => Some(
                    lookup(&*self.providers.hotels, hotel_cache, params, *force, timeout).await,
                ),
                None => None,
            }
        };
        let flights = async {
            match &flight_plan {
                Some((force, params)) => Some(
                    lookup(&*self.providers.flights, flight_cache, params, *force, timeout).await,
                ),
                None => None,
            }
        };
        let attractions = async {
            match &attraction_plan {
                Some((provider, force, params)) => Some(
                    lookup(*provider, attraction_cache, params, *force, timeout).await,
                ),
                None => None,
            }
        };

        let trains = async {
            match &train_plan {
                Some((provider, force, params)) => {
                    Some(lookup(*provider, train_cache, params, *force, timeout).await)
                }
                None => None,
            }
        };

        let (hotels, flights, attractions, trains) =
            tokio::join!(hotels, flights, attractions, trains);

        if hotels.is_some() {
            session.searched.insert(SearchKind::Hotels);
        }
        if flights.is_some() {
            session.searched.insert(SearchKind::Flights);
        }
        if attractions.is_some() {
            session.searched.insert(SearchKind::Attractions);
        }
        if trains.is_some() {
            session.searched.insert(SearchKind::Trains);
        }
        session.turns += 1;

        EvidenceBundle {
            prompt: message.to_string(),
            trip_info: after,
            hotels,
            flights,
            attractions,
            trains,
        }
    }
}

/// Reuse or fetch results for one search type. Never fails.
///
/// Without `force_refresh`, the partial-match reuse path is tried first and
/// a miss falls through to a fresh provider call. Provider errors and
/// timeouts yield an empty list.
async fn lookup<R>(
    provider: &dyn SearchProvider<Record = R>,
    cache: &mut ResultCache<R>,
    params: &SearchParams,
    force_refresh: bool,
    timeout: Duration,
) -> Vec<R>
where
    R: Clone + Send + Sync + Serialize + 'static,
{
    let kind = provider.kind();

    if !force_refresh {
        if let Some(results) = cache.find_by_params(params) {
            tracing::info!(%kind, count = results.len(), "Reusing cached results");
            return results.to_vec();
        }
        tracing::debug!(%kind, "No reusable cache entry, fetching fresh results");
    }

    let outcome = tokio::time::timeout(timeout, search_with_cache(provider, cache, params, true))
        .await
        .unwrap_or_else(|_| Err(SearchError::Timeout(timeout)));
    match outcome {
        Ok(results) => results,
        Err(e) => {
            tracing::warn!(%kind, error = %e, "Search failed, continuing without results");
            Vec::new()
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
