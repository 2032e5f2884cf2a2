//! Normalized search result records.
//!
//! Provider payloads are partial and inconsistent; every record field here
//! has a defined fallback so renderers never branch on a missing key.

use serde::{Deserialize, Serialize};

/// Placeholder for a required field the provider did not supply.
pub const UNKNOWN: &str = "Unknown";

/// The kinds of search a session can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    Flights,
    Hotels,
    Attractions,
    Trains,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Flights => "flights",
            SearchKind::Hotels => "hotels",
            SearchKind::Attractions => "attractions",
            SearchKind::Trains => "trains",
        }
    }
}

impl std::fmt::Display for SearchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One hotel offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelRecord {
    pub name: String,
    /// Total price for the stay.
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_night: Option<String>,
    /// `"4.5/5.0"` or `"No rating"`.
    pub rating: String,
    /// `"1,234 reviews"` or `"No reviews"`.
    pub reviews: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<String>,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub amenities: Vec<String>,
}

/// One flight itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    /// `"Best Flight"` or `"Alternative Flight"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub airline: String,
    pub price: String,
    pub duration: String,
    pub stops: String,
    pub departure_time: String,
    pub arrival_time: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layovers: Vec<String>,
}

/// One point of interest at the destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttractionRecord {
    pub title: String,
    pub snippet: String,
}

/// One rail connection hint from a web search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainRecord {
    pub title: String,
    pub snippet: String,
}
