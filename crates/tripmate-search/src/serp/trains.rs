use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tripmate_core::SearchParams;

use super::{required_text, SerpClient};
use crate::error::SearchError;
use crate::format::scalar_text;
use crate::provider::SearchProvider;
use crate::records::{SearchKind, TrainRecord};

const NO_DETAILS: &str = "No details available";

/// Title words that mark a result as rail related.
const RAIL_KEYWORDS: &[&str] = &["train", "rail", "irctc"];

/// Rail connections via a plain `google` web search.
///
/// There is no structured train engine, so results are web hits whose
/// title looks rail related.
#[derive(Debug, Clone)]
pub struct SerpTrainProvider {
    client: SerpClient,
    max_results: usize,
}

impl SerpTrainProvider {
    pub fn new(client: SerpClient, max_results: usize) -> Self {
        Self {
            client,
            max_results,
        }
    }
}

#[async_trait]
impl SearchProvider for SerpTrainProvider {
    type Record = TrainRecord;

    fn kind(&self) -> SearchKind {
        SearchKind::Trains
    }

    async fn fetch(&self, params: &SearchParams) -> Result<Vec<TrainRecord>, SearchError> {
        let origin = required_text(params, "origin")?;
        let destination = required_text(params, "destination")?;
        let date = required_text(params, "departure_date")?;
        let query = [
            ("engine", "google".to_string()),
            ("q", format!("trains from {} to {} on {}", origin, destination, date)),
            ("gl", self.client.country().to_string()),
            ("hl", self.client.language().to_string()),
        ];

        let payload = self.client.get_json(&query).await?;
        let trains = normalize_trains(&payload, self.max_results)?;
        tracing::info!(origin, destination, count = trains.len(), "Train search complete");
        Ok(trains)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOrganic {
    title: Option<Value>,
    snippet: Option<Value>,
}

fn is_rail_title(title: &str) -> bool {
    let lower = title.to_lowercase();
    RAIL_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Keep the rail-related hits among the first `max` `organic_results`.
pub fn normalize_trains(payload: &Value, max: usize) -> Result<Vec<TrainRecord>, SearchError> {
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
        .take(max)
        .filter_map(|item| RawOrganic::deserialize(item).ok())
        .filter_map(|raw| {
            let title = scalar_text(raw.title.as_ref())?;
            is_rail_title(&title).then(|| TrainRecord {
                title,
                snippet: scalar_text(raw.snippet.as_ref())
                    .unwrap_or_else(|| NO_DETAILS.to_string()),
            })
        })
        .collect())
}
