//! Reply generation.
//!
//! Hands the turn's evidence to the language model together with the
//! assistant persona and returns the model's reply verbatim.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::ChatError;
use crate::llm::LlmClient;
use crate::orchestrator::EvidenceBundle;

/// Reply used when a turn cannot produce one.
pub const FALLBACK_REPLY: &str = "Ugh, something went wrong. Even AI has bad days! Please try again.";

/// Built-in persona.
pub const DEFAULT_PERSONA: &str = "\
You are TripMate, a sassy but genuinely helpful travel assistant.
- Be witty and a little sarcastic, but always useful.
- Tease unrealistic expectations, like a hostel budget for a luxury island.
- Lay the options out clearly and focus on the best three to five per category.
- Quote concrete prices, ratings, times and other practical details from the data.
- When a category is missing or empty, say so with attitude instead of inventing results.
- If you need more details to help, ask for them plainly.
- Keep it concise.";

/// Produces the assistant reply for one turn.
#[derive(Clone)]
pub struct ResponseGenerator {
    llm: Arc<dyn LlmClient>,
    persona: String,
}

impl ResponseGenerator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            persona: DEFAULT_PERSONA.to_string(),
        }
    }

    /// Replace the persona text.
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    pub async fn generate(
        &self,
        bundle: &EvidenceBundle,
        today: NaiveDate,
    ) -> Result<String, ChatError> {
        let prompt = self.build_prompt(bundle, today)?;
        let reply = self.llm.generate(&prompt).await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(ChatError::Llm("model returned an empty reply".to_string()));
        }
        Ok(reply.to_string())
    }

    fn build_prompt(&self, bundle: &EvidenceBundle, today: NaiveDate) -> Result<String, ChatError> {
        let evidence = serde_json::to_string_pretty(bundle)
            .map_err(|e| ChatError::Llm(format!("failed to encode evidence: {}", e)))?;
        Ok(format!(
            "{persona}\n\nThe user said: \"{message}\"\n\nHere is what I know about their trip and what the searches found:\n{evidence}\n\nToday's date is {today}.",
            persona = self.persona,
            message = bundle.prompt,
            evidence = evidence,
            today = today.format(tripmate_core::memory::DATE_FORMAT),
        ))
    }
}
