use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tripmate_core::SearchParams;

use super::{required_text, SerpClient};
use crate::error::SearchError;
use crate::format::scalar_text;
use crate::provider::SearchProvider;
use crate::records::{AttractionRecord, SearchKind, UNKNOWN};

const NO_DESCRIPTION: &str = "No description available";

/// Points of interest via a plain `google` web search.
#[derive(Debug, Clone)]
pub struct SerpAttractionProvider {
    client: SerpClient,
    max_results: usize,
}

impl SerpAttractionProvider {
    pub fn new(client: SerpClient, max_results: usize) -> Self {
        Self {
            client,
            max_results,
        }
    }
}

#[async_trait]
impl SearchProvider for SerpAttractionProvider {
    type Record = AttractionRecord;

    fn kind(&self) -> SearchKind {
        SearchKind::Attractions
    }

    async fn fetch(&self, params: &SearchParams) -> Result<Vec<AttractionRecord>, SearchError> {
        let location = required_text(params, "location")?;
        let query = [
            ("engine", "google".to_string()),
            ("q", format!("top attractions in {}", location)),
            ("gl", self.client.country().to_string()),
            ("hl", self.client.language().to_string()),
        ];

        let payload = self.client.get_json(&query).await?;
        let attractions = normalize_attractions(&payload, self.max_results)?;
        tracing::info!(location, count = attractions.len(), "Attraction search complete");
        Ok(attractions)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOrganic {
    title: Option<Value>,
    snippet: Option<Value>,
}

/// Normalize up to `max` entries of `organic_results`.
pub fn normalize_attractions(
    payload: &Value,
    max: usize,
) -> Result<Vec<AttractionRecord>, SearchError> {
    let results = match payload.get("organic_results") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(SearchError::Payload(
                "`organic_results` is not an array".to_string(),
            ))
        }
    };

    Ok(results
        .iter()
        .filter_map(|item| RawOrganic::deserialize(item).ok())
        .take(max)
        .map(|raw| AttractionRecord {
            title: scalar_text(raw.title.as_ref()).unwrap_or_else(|| UNKNOWN.to_string()),
            snippet: scalar_text(raw.snippet.as_ref())
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        })
        .collect())
}
