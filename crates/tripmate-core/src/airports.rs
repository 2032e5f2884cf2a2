//! City name to airport code lookup.

/// Airport codes for common cities, keyed by lowercase city name.
static AIRPORT_CODES: &[(&str, &str)] = &[
    ("delhi", "DEL"),
    ("mumbai", "BOM"),
    ("chennai", "MAA"),
    ("kolkata", "CCU"),
    ("bengaluru", "BLR"),
    ("bangalore", "BLR"),
    ("hyderabad", "HYD"),
    ("bali", "DPS"),
    ("denpasar", "DPS"),
    ("bangkok", "BKK"),
    ("new york", "JFK"),
    ("london", "LHR"),
    ("paris", "CDG"),
    ("dubai", "DXB"),
    ("singapore", "SIN"),
    ("tokyo", "HND"),
    ("sydney", "SYD"),
];

/// Resolve a city name to its airport code.
///
/// Matching is case-insensitive. Unknown cities pass through lowercased so
/// the provider can still attempt a free-text lookup. `None` stays `None`.
pub fn resolve_airport_code(city: Option<&str>) -> Option<String> {
    let city = city?;
    let lower = city.to_lowercase();
    let code = AIRPORT_CODES
        .iter()
        .find(|(name, _)| *name == lower.as_str())
        .map(|(_, code)| (*code).to_string());
    Some(code.unwrap_or(lower))
}
