//! Trip fact extraction.
//!
//! Asks the language model for a JSON object of the nine memory fields and
//! turns the answer into a [`MemoryPatch`]. Extraction never fails from the
//! caller's point of view: an unavailable model or an unusable answer both
//! yield an empty patch, which the merge treats as "nothing new".

use std::sync::Arc;

use chrono::NaiveDate;
use tripmate_core::{MemoryPatch, TravelMemory};

use crate::error::ChatError;
use crate::llm::LlmClient;

/// Turns free text plus current memory into a partial fact update.
#[derive(Clone)]
pub struct InfoExtractor {
    llm: Arc<dyn LlmClient>,
}

impl InfoExtractor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Extract new trip facts from `user_text`.
    pub async fn extract(
        &self,
        user_text: &str,
        memory: &TravelMemory,
        today: NaiveDate,
    ) -> MemoryPatch {
        let prompt = build_prompt(user_text, memory, today);

        let raw = match self.llm.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Extraction call failed, treating as no new information");
                return MemoryPatch::default();
            }
        };

        match parse_patch(&raw) {
            Ok(patch) => {
                tracing::debug!(?patch, "Extracted trip facts");
                patch
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding malformed extraction");
                MemoryPatch::default()
            }
        }
    }
}

fn build_prompt(user_text: &str, memory: &TravelMemory, today: NaiveDate) -> String {
    let known = serde_json::to_string_pretty(memory).unwrap_or_else(|_| "{}".to_string());
    format!(
        r#"Extract travel details from the user's message and answer with a single JSON object holding these fields:
- origin: city the traveller starts from
- destination: city or place the trip is to
- transit_cities: list of cities the traveller passes through or departs from when that differs from origin
- check_in_date: arrival date as YYYY-MM-DD
- check_out_date: departure date as YYYY-MM-DD
- budget: budget as a plain number without currency
- hotel_preference: accommodation preference such as "hostel", "budget", "4-star", "luxury"
- num_adults: number of adult travellers
- transportation: list of transport modes mentioned, such as "flight" or "train"

Use null for anything the message does not mention. Convert relative or natural-language dates to YYYY-MM-DD using today's date, {today}. Only report information that is new or different from what is already known.

Already known:
{known}

User message: {user_text}

JSON:"#,
        today = today.format(tripmate_core::memory::DATE_FORMAT),
        known = known,
        user_text = user_text,
    )
}

/// Parse a model answer into a patch.
///
/// Accepts Markdown code fences and surrounding prose; the outermost
/// `{...}` span is taken as the object.
pub fn parse_patch(raw: &str) -> Result<MemoryPatch, ChatError> {
    let body = strip_code_fences(raw);
    let start = body
        .find('{')
        .ok_or_else(|| ChatError::Extraction("no JSON object in model output".to_string()))?;
    let end = body
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| ChatError::Extraction("unterminated JSON object in model output".to_string()))?;

    serde_json::from_str(&body[start..=end]).map_err(|e| ChatError::Extraction(e.to_string()))
}

fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}
