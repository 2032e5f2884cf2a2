//! Session travel memory.
//!
//! [`TravelMemory`] accumulates the trip facts extracted over a conversation.
//! New facts arrive as a [`MemoryPatch`] and are merged non-destructively:
//! scalars follow last-non-null-wins, lists only ever grow. After merging,
//! [`TravelMemory::assume_defaults`] fills the gaps that are still unknown.

use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// ISO-8601 calendar date format used for every date field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Days from today assumed for check-in when only a destination is known.
const DEFAULT_LEAD_DAYS: i64 = 14;

/// Length of stay assumed when only a check-in date is known.
const DEFAULT_STAY_DAYS: i64 = 7;

const DEFAULT_HOTEL_PREFERENCE: &str = "3-star";
const DEFAULT_TRANSPORTATION: &str = "flight";

// =============================================================================
// TravelMemory
// =============================================================================

/// Accumulated trip facts for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TravelMemory {
    pub origin: Option<String>,
    pub destination: Option<String>,
    /// Ordered, deduplicated, append-only.
    pub transit_cities: Vec<String>,
    pub check_in_date: Option<String>,
    pub check_out_date: Option<String>,
    pub budget: Option<f64>,
    /// Free-form tier hint such as "hostel" or "5-star".
    pub hotel_preference: Option<String>,
    pub num_adults: u32,
    /// Ordered, deduplicated, append-only.
    pub transportation: Vec<String>,
}

impl Default for TravelMemory {
    fn default() -> Self {
        Self {
            origin: None,
            destination: None,
            transit_cities: Vec::new(),
            check_in_date: None,
            check_out_date: None,
            budget: None,
            hotel_preference: None,
            num_adults: 1,
            transportation: Vec::new(),
        }
    }
}

impl TravelMemory {
    /// Merge newly extracted facts into this memory.
    ///
    /// A scalar is overwritten only when the patch carries a value that
    /// differs from the current one; a `None` in the patch never erases a
    /// known fact. List fields receive every patch element not already
    /// present, keeping existing order.
    pub fn merge(&mut self, patch: &MemoryPatch) {
        overwrite(&mut self.origin, &patch.origin);
        overwrite(&mut self.destination, &patch.destination);
        overwrite(&mut self.check_in_date, &patch.check_in_date);
        overwrite(&mut self.check_out_date, &patch.check_out_date);
        overwrite(&mut self.hotel_preference, &patch.hotel_preference);

        if let Some(budget) = patch.budget {
            if self.budget != Some(budget) {
                self.budget = Some(budget);
            }
        }

        if let Some(adults) = patch.num_adults {
            if adults > 0 && self.num_adults != adults {
                self.num_adults = adults;
            }
        }

        if let Some(ref cities) = patch.transit_cities {
            append_unique(&mut self.transit_cities, cities);
        }
        if let Some(ref modes) = patch.transportation {
            append_unique(&mut self.transportation, modes);
        }
    }

    /// Pure form of [`merge`](Self::merge).
    pub fn merged(&self, patch: &MemoryPatch) -> TravelMemory {
        let mut next = self.clone();
        next.merge(patch);
        next
    }

    /// Fill fields that are still unknown with reasonable assumptions.
    ///
    /// Only ever fills, never overwrites, so applying it twice is the same
    /// as applying it once. A check-in date that is not a valid ISO date
    /// leaves the check-out date untouched.
    pub fn assume_defaults(&mut self, today: NaiveDate) {
        if self.destination.is_some() && self.check_in_date.is_none() {
            let check_in = today + Duration::days(DEFAULT_LEAD_DAYS);
            self.check_in_date = Some(check_in.format(DATE_FORMAT).to_string());
        }

        if self.check_out_date.is_none() {
            if let Some(check_in) = self.check_in_date.as_deref().and_then(parse_date) {
                let check_out = check_in + Duration::days(DEFAULT_STAY_DAYS);
                self.check_out_date = Some(check_out.format(DATE_FORMAT).to_string());
            } else if let Some(ref raw) = self.check_in_date {
                tracing::debug!(check_in = %raw, "Check-in date is not ISO formatted, leaving check-out unset");
            }
        }

        if self.destination.is_some() && self.hotel_preference.is_none() {
            self.hotel_preference = Some(DEFAULT_HOTEL_PREFERENCE.to_string());
        }

        if self.origin.is_some() && self.destination.is_some() && self.transportation.is_empty() {
            self.transportation = vec![DEFAULT_TRANSPORTATION.to_string()];
        }
    }

    /// The city flights depart from: the first transit city when one is
    /// known, the origin otherwise.
    pub fn flight_origin(&self) -> Option<&str> {
        self.transit_cities
            .first()
            .map(String::as_str)
            .or(self.origin.as_deref())
    }

    /// Whether flights are a wanted transport mode. An empty mode list does
    /// not rule flights out.
    pub fn wants_flights(&self) -> bool {
        self.transportation.is_empty()
            || self
                .transportation
                .iter()
                .any(|m| m.to_lowercase().contains("flight"))
    }

    /// Rail options are looked up when trains are asked for, or when the
    /// trip starts with a hop through a transit city.
    pub fn wants_trains(&self) -> bool {
        self.transportation
            .iter()
            .any(|m| m.to_lowercase().contains("train"))
            || (self.origin.is_some() && !self.transit_cities.is_empty())
    }

    /// First rail leg: towards the first transit city, else the destination.
    pub fn train_destination(&self) -> Option<&str> {
        self.transit_cities
            .first()
            .map(String::as_str)
            .or(self.destination.as_deref())
    }

    /// Hotel star class derived from the free-form preference.
    pub fn hotel_class(&self) -> u8 {
        let Some(ref preference) = self.hotel_preference else {
            return 3;
        };
        let preference = preference.to_lowercase();
        if preference.contains("hostel") || preference.contains("budget") {
            2
        } else if preference.contains("luxury") || preference.contains("5-star") {
            5
        } else if preference.contains("4-star") {
            4
        } else {
            3
        }
    }

    /// True when nothing has been learned yet.
    pub fn is_empty(&self) -> bool {
        *self == TravelMemory::default()
    }
}

fn overwrite(current: &mut Option<String>, incoming: &Option<String>) {
    if let Some(value) = incoming {
        if current.as_ref() != Some(value) {
            *current = Some(value.clone());
        }
    }
}

fn append_unique(list: &mut Vec<String>, incoming: &[String]) {
    for item in incoming {
        if !item.is_empty() && !list.contains(item) {
            list.push(item.clone());
        }
    }
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

// =============================================================================
// MemoryPatch
// =============================================================================

/// Partial fact update produced by one extraction.
///
/// Every field is optional; `None` means "no new information". The
/// deserializer is lenient about scalar shapes a language model commonly
/// produces (numeric strings, a bare string where a list is expected, the
/// literal string "null"), but rejects anything else so a malformed patch
/// is never applied halfway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryPatch {
    #[serde(deserialize_with = "de_text")]
    pub origin: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub destination: Option<String>,
    #[serde(deserialize_with = "de_list")]
    pub transit_cities: Option<Vec<String>>,
    #[serde(deserialize_with = "de_text")]
    pub check_in_date: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub check_out_date: Option<String>,
    #[serde(deserialize_with = "de_budget")]
    pub budget: Option<f64>,
    #[serde(deserialize_with = "de_text")]
    pub hotel_preference: Option<String>,
    #[serde(deserialize_with = "de_adults")]
    pub num_adults: Option<u32>,
    #[serde(deserialize_with = "de_list")]
    pub transportation: Option<Vec<String>>,
}

impl MemoryPatch {
    /// True when the patch carries no information at all.
    pub fn is_empty(&self) -> bool {
        *self == MemoryPatch::default()
    }
}

fn clean_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") || trimmed.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn de_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(clean_text(&s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!("expected a string, got {}", other))),
    }
}

fn de_list<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<String>>, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(clean_text(&s).map(|s| vec![s])),
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => out.extend(clean_text(&s)),
                    Value::Null => {}
                    other => {
                        return Err(de::Error::custom(format!(
                            "expected a list of strings, found {}",
                            other
                        )))
                    }
                }
            }
            Ok(if out.is_empty() { None } else { Some(out) })
        }
        Some(other) => Err(de::Error::custom(format!("expected a list, got {}", other))),
    }
}

/// Bare numbers inside a budget string once thousands separators are gone.
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("Invalid number regex"));

/// Read a budget from free text. Exactly one number must be present, so
/// ranges such as "1000-2000" yield `None` rather than a guess.
fn parse_budget(raw: &str) -> Option<f64> {
    let compact = raw.replace(',', "");
    let mut numbers = NUMBER_RE.find_iter(&compact);
    let first = numbers.next()?;
    if numbers.next().is_some() {
        return None;
    }
    first.as_str().parse::<f64>().ok()
}

fn de_budget<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => Ok(parse_budget(&s)),
        Some(other) => Err(de::Error::custom(format!("expected a number, got {}", other))),
    }
}

fn de_adults<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_u64().and_then(|v| u32::try_from(v).ok())),
        Some(Value::String(s)) => Ok(s.trim().parse::<u32>().ok()),
        Some(other) => Err(de::Error::custom(format!(
            "expected a traveller count, got {}",
            other
        ))),
    }
}

// =============================================================================
// Tests
// =============================================================================
