use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tripmate_core::SearchParams;

use super::{required_text, SerpClient};
use crate::error::SearchError;
use crate::format::{format_rating, format_reviews, scalar_text};
use crate::provider::SearchProvider;
use crate::records::{HotelRecord, SearchKind, UNKNOWN};

/// Hotel search over the `google_hotels` engine.
#[derive(Debug, Clone)]
pub struct SerpHotelProvider {
    client: SerpClient,
    max_results: usize,
}

impl SerpHotelProvider {
    pub fn new(client: SerpClient, max_results: usize) -> Self {
        Self {
            client,
            max_results,
        }
    }
}

#[async_trait]
impl SearchProvider for SerpHotelProvider {
    type Record = HotelRecord;

    fn kind(&self) -> SearchKind {
        SearchKind::Hotels
    }

    async fn fetch(&self, params: &SearchParams) -> Result<Vec<HotelRecord>, SearchError> {
        let location = required_text(params, "location")?;
        let check_in = required_text(params, "check_in_date")?;
        let check_out = required_text(params, "check_out_date")?;
        let adults = params.int("adults").unwrap_or(1);

        let mut query = vec![
            ("engine", "google_hotels".to_string()),
            ("q", format!("{} Hotels", location)),
            ("check_in_date", check_in.to_string()),
            ("check_out_date", check_out.to_string()),
            ("adults", adults.to_string()),
            ("currency", self.client.currency().to_string()),
            ("gl", self.client.country().to_string()),
            ("hl", self.client.language().to_string()),
        ];
        if let Some(class) = params.int("hotel_class") {
            query.push(("hotel_class", class.to_string()));
        }

        let payload = self.client.get_json(&query).await?;
        let hotels = normalize_hotels(&payload, self.max_results)?;
        tracing::info!(location, count = hotels.len(), "Hotel search complete");
        Ok(hotels)
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Field table for one entry of `properties`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawProperty {
    name: Option<Value>,
    price: Option<Value>,
    total_rate: Option<Value>,
    rate_per_night: Option<Value>,
    price_description: Option<Value>,
    overall_rating: Option<Value>,
    rating: Option<Value>,
    reviews: Option<Value>,
    hotel_class: Option<Value>,
    extracted_hotel_class: Option<Value>,
    address: Option<Value>,
    link: Option<Value>,
    thumbnail: Option<Value>,
    images: Option<Value>,
    #[serde(rename = "type")]
    kind: Option<Value>,
    highlight: Option<Value>,
    amenities: Option<Value>,
}

/// Normalize a `google_hotels` payload into at most `max` records.
///
/// A payload without `properties` yields no records. Entries that are not
/// objects are skipped.
pub fn normalize_hotels(payload: &Value, max: usize) -> Result<Vec<HotelRecord>, SearchError> {
    let properties = match payload.get("properties") {
        None | Some(Value::Null) => {
            tracing::debug!("No properties in hotel payload");
            return Ok(Vec::new());
        }
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(SearchError::Payload(
                "`properties` is not an array".to_string(),
            ))
        }
    };

    let hotels = properties
        .iter()
        .filter_map(|item| match RawProperty::deserialize(item) {
            Ok(raw) => Some(hotel_from_raw(raw)),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed hotel entry");
                None
            }
        })
        .take(max)
        .collect();
    Ok(hotels)
}

fn hotel_from_raw(raw: RawProperty) -> HotelRecord {
    let price = raw
        .total_rate
        .as_ref()
        .and_then(rate_text)
        .or_else(|| scalar_text(raw.price.as_ref()))
        .unwrap_or_else(|| UNKNOWN.to_string());

    let price_per_night = raw
        .rate_per_night
        .as_ref()
        .and_then(rate_text)
        .or_else(|| {
            scalar_text(raw.price_description.as_ref())
                .filter(|d| d.to_lowercase().contains("per night"))
        });

    let rating = raw.overall_rating.as_ref().or(raw.rating.as_ref());

    let thumbnail = scalar_text(raw.thumbnail.as_ref())
        .or_else(|| raw.images.as_ref().and_then(first_image));

    let description_parts: Vec<String> = [raw.kind.as_ref(), raw.highlight.as_ref()]
        .into_iter()
        .filter_map(scalar_text)
        .collect();

    HotelRecord {
        name: scalar_text(raw.name.as_ref()).unwrap_or_else(|| UNKNOWN.to_string()),
        price,
        price_per_night,
        rating: format_rating(rating),
        reviews: format_reviews(raw.reviews.as_ref()),
        stars: scalar_text(raw.hotel_class.as_ref())
            .or_else(|| scalar_text(raw.extracted_hotel_class.as_ref())),
        location: scalar_text(raw.address.as_ref()).unwrap_or_else(|| UNKNOWN.to_string()),
        link: scalar_text(raw.link.as_ref()),
        thumbnail,
        description: (!description_parts.is_empty()).then(|| description_parts.join(", ")),
        amenities: match raw.amenities {
            Some(Value::Array(items)) => items.iter().filter_map(|a| scalar_text(Some(a))).collect(),
            other => scalar_text(other.as_ref()).into_iter().collect(),
        },
    }
}

/// `{"lowest": ...}` rate objects, or a bare scalar rate.
fn rate_text(rate: &Value) -> Option<String> {
    match rate {
        Value::Object(_) => scalar_text(rate.get("lowest")),
        other => scalar_text(Some(other)),
    }
}

/// Thumbnail URL of the first image. Accepts a list of image objects, a
/// list of URLs or a single URL.
fn first_image(images: &Value) -> Option<String> {
    let image = match images {
        Value::Array(items) => items.first()?,
        other => other,
    };
    match image {
        Value::Object(_) => scalar_text(image.get("thumbnail")),
        other => scalar_text(Some(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_property() -> Value {
        json!({
            "type": "hotel",
            "name": "Ayana Resort",
            "link": "https://example.com/ayana",
            "highlight": "Cliffside infinity pool",
            "rate_per_night": {"lowest": "$210", "extracted_lowest": 210},
            "total_rate": {"lowest": "$1,470", "extracted_lowest": 1470},
            "hotel_class": "5-star hotel",
            "extracted_hotel_class": 5,
            "overall_rating": 4.6,
            "reviews": 5321,
            "address": "Jimbaran, Bali",
            "images": [{"thumbnail": "https://img.example.com/1.jpg"}],
            "amenities": ["Free Wi-Fi", "Pool", "Spa"]
        })
    }

    #[test]
    fn test_full_property_maps_every_field() {
        let payload = json!({"properties": [full_property()]});
        let hotels = normalize_hotels(&payload, 5).unwrap();
        assert_eq!(hotels.len(), 1);

        let h = &hotels[0];
        assert_eq!(h.name, "Ayana Resort");
        assert_eq!(h.price, "$1,470");
        assert_eq!(h.price_per_night.as_deref(), Some("$210"));
        assert_eq!(h.rating, "4.6/5.0");
        assert_eq!(h.reviews, "5,321 reviews");
        assert_eq!(h.stars.as_deref(), Some("5-star hotel"));
        assert_eq!(h.location, "Jimbaran, Bali");
        assert_eq!(h.link.as_deref(), Some("https://example.com/ayana"));
        assert_eq!(h.thumbnail.as_deref(), Some("https://img.example.com/1.jpg"));
        assert_eq!(h.description.as_deref(), Some("hotel, Cliffside infinity pool"));
        assert_eq!(h.amenities, vec!["Free Wi-Fi", "Pool", "Spa"]);
    }

    #[test]
    fn test_sparse_property_uses_fallbacks() {
        let payload = json!({"properties": [{}]});
        let hotels = normalize_hotels(&payload, 5).unwrap();

        let h = &hotels[0];
        assert_eq!(h.name, "Unknown");
        assert_eq!(h.price, "Unknown");
        assert_eq!(h.price_per_night, None);
        assert_eq!(h.rating, "No rating");
        assert_eq!(h.reviews, "No reviews");
        assert_eq!(h.stars, None);
        assert_eq!(h.location, "Unknown");
        assert_eq!(h.description, None);
        assert!(h.amenities.is_empty());
    }

    #[test]
    fn test_price_fallbacks() {
        let payload = json!({"properties": [{
            "name": "Budget Inn",
            "price": "$45",
            "price_description": "$45 per night, taxes included",
            "extracted_hotel_class": 2
        }]});
        let h = &normalize_hotels(&payload, 5).unwrap()[0];
        assert_eq!(h.price, "$45");
        assert_eq!(h.price_per_night.as_deref(), Some("$45 per night, taxes included"));
        assert_eq!(h.stars.as_deref(), Some("2"));
    }

    #[test]
    fn test_price_description_without_per_night_is_ignored() {
        let payload = json!({"properties": [{"price_description": "Total for stay"}]});
        let h = &normalize_hotels(&payload, 5).unwrap()[0];
        assert_eq!(h.price_per_night, None);
    }

    #[test]
    fn test_caps_at_max() {
        let properties: Vec<Value> = (0..9).map(|i| json!({"name": format!("H{}", i)})).collect();
        let hotels = normalize_hotels(&json!({ "properties": properties }), 5).unwrap();
        assert_eq!(hotels.len(), 5);
        assert_eq!(hotels[4].name, "H4");
    }

    #[test]
    fn test_missing_properties_is_empty() {
        assert!(normalize_hotels(&json!({"search_metadata": {}}), 5)
            .unwrap()
            .is_empty());
        assert!(normalize_hotels(&json!({"properties": null}), 5)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_non_array_properties_is_payload_error() {
        let err = normalize_hotels(&json!({"properties": "oops"}), 5).unwrap_err();
        assert!(matches!(err, SearchError::Payload(_)));
    }

    #[test]
    fn test_odd_field_types_keep_the_hotel() {
        let payload = json!({"properties": [{
            "name": "Kuta Beach Inn",
            "images": "https://img.example.com/kuta.jpg",
            "total_rate": "$300",
            "rate_per_night": {"lowest": 43},
            "amenities": "Pool"
        }]});
        let hotels = normalize_hotels(&payload, 5).unwrap();
        assert_eq!(hotels.len(), 1);

        let h = &hotels[0];
        assert_eq!(h.name, "Kuta Beach Inn");
        assert_eq!(h.thumbnail.as_deref(), Some("https://img.example.com/kuta.jpg"));
        assert_eq!(h.price, "$300");
        assert_eq!(h.price_per_night.as_deref(), Some("43"));
        assert_eq!(h.amenities, vec!["Pool"]);
    }

    #[test]
    fn test_image_list_of_urls() {
        let payload = json!({"properties": [{"images": ["https://img.example.com/a.jpg"]}]});
        let h = &normalize_hotels(&payload, 5).unwrap()[0];
        assert_eq!(h.thumbnail.as_deref(), Some("https://img.example.com/a.jpg"));
    }

    #[test]
    fn test_non_object_entry_skipped() {
        let payload = json!({"properties": [42, {"name": "Real Hotel"}]});
        let hotels = normalize_hotels(&payload, 5).unwrap();
        assert_eq!(hotels.len(), 1);
        assert_eq!(hotels[0].name, "Real Hotel");
    }
}
