//! SerpAPI-backed search adapters.
//!
//! One [`SerpClient`] holds the HTTP client, key and locale settings. Each
//! adapter builds its engine-specific query and hands the raw payload to a
//! pure `normalize_*` function.

mod attractions;
mod flights;
mod hotels;
mod trains;

pub use attractions::{normalize_attractions, SerpAttractionProvider};
pub use flights::{normalize_flights, SerpFlightProvider};
pub use hotels::{normalize_hotels, SerpHotelProvider};
pub use trains::{normalize_trains, SerpTrainProvider};

use std::time::Duration;

use serde_json::Value;
use tripmate_core::config::SearchConfig;

use crate::error::SearchError;

/// Longest provider error body carried into an error value.
const MAX_ERROR_BODY: usize = 512;

/// Shared SerpAPI HTTP client.
#[derive(Clone)]
pub struct SerpClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    currency: String,
    language: String,
    country: String,
}

impl std::fmt::Debug for SerpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerpClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("currency", &self.currency)
            .field("language", &self.language)
            .field("country", &self.country)
            .finish()
    }
}

impl SerpClient {
    /// Build a client from the search config. Fails when no API key is set.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(SearchError::MissingApiKey)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("tripmate/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key,
            currency: config.currency.clone(),
            language: config.language.clone(),
            country: config.country.clone(),
        })
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    /// Run one query and return the JSON payload.
    ///
    /// The `api_key` pair is appended here so it never shows up in the
    /// caller's logged query.
    pub async fn get_json(&self, query: &[(&str, String)]) -> Result<Value, SearchError> {
        tracing::info!(
            url = %self.base_url,
            query = %describe_query(query),
            "Calling SerpAPI"
        );

        let response = self
            .http
            .get(&self.base_url)
            .query(query)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(status = status.as_u16(), bytes = body.len(), "SerpAPI response received");

        let parsed: Result<Value, _> = serde_json::from_str(&body);

        if !status.is_success() {
            if let Some(message) = parsed.as_ref().ok().and_then(api_error) {
                return Err(SearchError::Api(message));
            }
            return Err(SearchError::Status {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        let payload = parsed.map_err(|e| SearchError::Payload(e.to_string()))?;
        if let Some(message) = api_error(&payload) {
            return Err(SearchError::Api(message));
        }
        Ok(payload)
    }
}

/// The provider-reported `"error"` string, if any.
fn api_error(payload: &Value) -> Option<String> {
    payload
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn describe_query(query: &[(&str, String)]) -> String {
    query
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Required text parameter, or `MissingParam`.
fn required_text<'a>(
    params: &'a tripmate_core::SearchParams,
    key: &'static str,
) -> Result<&'a str, SearchError> {
    params
        .text(key)
        .filter(|v| !v.is_empty())
        .ok_or(SearchError::MissingParam(key))
}
