//! Conversational trip planning for TripMate.
//!
//! Extracts travel facts from free text, keeps them as per-session memory,
//! decides per search type whether cached results can be reused, and asks
//! the language model for the final reply.

pub mod error;
pub mod extractor;
pub mod llm;
pub mod orchestrator;
pub mod planner;
pub mod response;
pub mod session;

#[cfg(test)]
mod testing;

pub use error::ChatError;
pub use extractor::{parse_patch, InfoExtractor};
pub use llm::{GeminiClient, LlmClient};
pub use orchestrator::{EvidenceBundle, EvidenceCounts, SearchOrchestrator, SearchProviders};
pub use planner::{ChatReply, TripPlanner};
pub use response::{ResponseGenerator, FALLBACK_REPLY};
pub use session::{SessionManager, SessionSummary, TripSession};
