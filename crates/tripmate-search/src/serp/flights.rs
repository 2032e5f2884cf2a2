use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tripmate_core::SearchParams;

use super::{required_text, SerpClient};
use crate::error::SearchError;
use crate::format::{format_duration, format_price, format_stops, minutes, scalar_text};
use crate::provider::SearchProvider;
use crate::records::{FlightRecord, SearchKind, UNKNOWN};

const BEST_FLIGHT: &str = "Best Flight";
const ALTERNATIVE_FLIGHT: &str = "Alternative Flight";

/// SerpAPI `type` for a round trip.
const ROUND_TRIP: &str = "1";
/// SerpAPI `type` for a one-way trip.
const ONE_WAY: &str = "2";

/// Flight search over the `google_flights` engine.
#[derive(Debug, Clone)]
pub struct SerpFlightProvider {
    client: SerpClient,
    max_best: usize,
    max_other: usize,
}

impl SerpFlightProvider {
    pub fn new(client: SerpClient, max_best: usize, max_other: usize) -> Self {
        Self {
            client,
            max_best,
            max_other,
        }
    }
}

#[async_trait]
impl SearchProvider for SerpFlightProvider {
    type Record = FlightRecord;

    fn kind(&self) -> SearchKind {
        SearchKind::Flights
    }

    async fn fetch(&self, params: &SearchParams) -> Result<Vec<FlightRecord>, SearchError> {
        let origin = required_text(params, "origin")?;
        let destination = required_text(params, "destination")?;
        let departure = required_text(params, "departure_date")?;
        let return_date = params.text("return_date").filter(|d| !d.is_empty());
        let adults = params.int("adults").unwrap_or(1);

        let mut query = vec![
            ("engine", "google_flights".to_string()),
            ("departure_id", origin.to_string()),
            ("arrival_id", destination.to_string()),
            ("outbound_date", departure.to_string()),
            ("adults", adults.to_string()),
            ("currency", self.client.currency().to_string()),
            ("hl", self.client.language().to_string()),
        ];
        match return_date {
            Some(date) => {
                query.push(("return_date", date.to_string()));
                query.push(("type", ROUND_TRIP.to_string()));
            }
            None => query.push(("type", ONE_WAY.to_string())),
        }

        let payload = self.client.get_json(&query).await?;
        let flights = normalize_flights(
            &payload,
            self.max_best,
            self.max_other,
            self.client.currency(),
        )?;
        tracing::info!(origin, destination, count = flights.len(), "Flight search complete");
        Ok(flights)
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Field table for one itinerary. Every field is optional and untyped so a
/// single odd value never costs the whole itinerary.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawItinerary {
    flights: Option<Value>,
    layovers: Option<Value>,
    total_duration: Option<Value>,
    price: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSegment {
    airline: Option<Value>,
    departure_airport: Option<Value>,
    arrival_airport: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLayover {
    name: Option<Value>,
    duration: Option<Value>,
}

/// Entries of an optional array, each read leniently. Entries that are not
/// objects still count, as empty tables.
fn entries<T: DeserializeOwned + Default>(value: Option<&Value>) -> Vec<T> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| T::deserialize(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    }
}

/// Normalize a `google_flights` payload.
///
/// Takes up to `max_best` entries of `best_flights` followed by up to
/// `max_other` entries of `other_flights`. Missing groups contribute nothing.
pub fn normalize_flights(
    payload: &Value,
    max_best: usize,
    max_other: usize,
    currency: &str,
) -> Result<Vec<FlightRecord>, SearchError> {
    let mut flights = group(payload, "best_flights", max_best, BEST_FLIGHT, currency)?;
    flights.extend(group(
        payload,
        "other_flights",
        max_other,
        ALTERNATIVE_FLIGHT,
        currency,
    )?);
    Ok(flights)
}

fn group(
    payload: &Value,
    key: &str,
    max: usize,
    label: &str,
    currency: &str,
) -> Result<Vec<FlightRecord>, SearchError> {
    let items = match payload.get(key) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(SearchError::Payload(format!("`{}` is not an array", key))),
    };

    Ok(items
        .iter()
        .filter_map(|item| match RawItinerary::deserialize(item) {
            Ok(raw) => Some(flight_from_raw(raw, label, currency)),
            Err(e) => {
                tracing::warn!(group = key, error = %e, "Skipping malformed flight entry");
                None
            }
        })
        .take(max)
        .collect())
}

fn flight_from_raw(raw: RawItinerary, label: &str, currency: &str) -> FlightRecord {
    let segments: Vec<RawSegment> = entries(raw.flights.as_ref());
    let layovers: Vec<RawLayover> = entries(raw.layovers.as_ref());

    let stop_count = if !layovers.is_empty() {
        layovers.len()
    } else {
        segments.len().saturating_sub(1)
    };

    let airport_time = |airport: Option<&Value>| {
        airport
            .and_then(|a| scalar_text(a.get("time")))
            .unwrap_or_else(|| UNKNOWN.to_string())
    };

    FlightRecord {
        kind: label.to_string(),
        airline: segments
            .first()
            .and_then(|s| scalar_text(s.airline.as_ref()))
            .unwrap_or_else(|| UNKNOWN.to_string()),
        price: format_price(raw.price.as_ref(), currency),
        duration: format_duration(minutes(raw.total_duration.as_ref())),
        stops: format_stops(stop_count),
        departure_time: airport_time(segments.first().and_then(|s| s.departure_airport.as_ref())),
        arrival_time: airport_time(segments.last().and_then(|s| s.arrival_airport.as_ref())),
        layovers: layovers.iter().map(layover_text).collect(),
    }
}

fn layover_text(layover: &RawLayover) -> String {
    let name = scalar_text(layover.name.as_ref()).unwrap_or_else(|| "Unknown Airport".to_string());
    let mins = minutes(layover.duration.as_ref()).unwrap_or(0);
    format!("{} ({}h {}m)", name, mins / 60, mins % 60)
}
