//! Session registry and the conversational entry point.
//!
//! [`TripPlanner`] validates each message, resolves the caller's session,
//! runs one orchestrated turn and produces the reply. Turn-level failures
//! become a single generic reply; only input validation reaches the caller
//! as an error.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

use regex::Regex;
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;
use tripmate_core::config::{CacheConfig, ChatConfig};
use tripmate_core::TravelMemory;
use uuid::Uuid;

use crate::error::ChatError;
use crate::orchestrator::{EvidenceCounts, SearchOrchestrator};
use crate::response::{ResponseGenerator, FALLBACK_REPLY};
use crate::session::{SessionManager, SessionSummary, TripSession};

/// Whole-message phrases that start the trip over.
static RESET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:reset|start\s+over|new\s+trip|clear\s+memory)\s*[.!]*\s*$")
        .expect("Invalid reset regex")
});

const RESET_REPLY: &str =
    "Fine, clean slate. I've forgotten everything about that trip. Where are we going now?";

type SessionHandle = Arc<AsyncMutex<TripSession>>;

/// Outcome of one handled message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub reply: String,
    /// Memory snapshot after the turn.
    pub trip_info: TravelMemory,
    pub evidence: EvidenceCounts,
}

/// Owns all sessions and routes messages to them.
pub struct TripPlanner {
    orchestrator: SearchOrchestrator,
    responder: ResponseGenerator,
    session_manager: SessionManager,
    sessions: Mutex<HashMap<Uuid, SessionHandle>>,
    config: ChatConfig,
}

impl TripPlanner {
    pub fn new(
        orchestrator: SearchOrchestrator,
        responder: ResponseGenerator,
        config: ChatConfig,
        cache_config: CacheConfig,
    ) -> Self {
        let responder = match config.persona.as_deref() {
            Some(persona) if !persona.trim().is_empty() => responder.with_persona(persona),
            _ => responder,
        };
        Self {
            orchestrator,
            responder,
            session_manager: SessionManager::new(config.session_timeout_minutes, cache_config),
            sessions: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Handle an incoming chat message.
    ///
    /// Returns the reply and the session ID (new or existing).
    pub async fn handle_message(
        &self,
        message: &str,
        session_id: Option<Uuid>,
    ) -> Result<(ChatReply, Uuid), ChatError> {
        if !self.config.enabled {
            return Err(ChatError::Disabled);
        }

        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if message.chars().count() > self.config.max_message_length {
            return Err(ChatError::MessageTooLong(self.config.max_message_length));
        }

        let (sid, handle) = self.resolve_session(session_id)?;
        let mut session = handle.lock().await;

        if is_reset_intent(message) {
            session.reset();
            tracing::info!(session_id = %sid, "Session reset");
            return Ok((
                ChatReply {
                    reply: RESET_REPLY.to_string(),
                    trip_info: session.memory.clone(),
                    evidence: EvidenceCounts::default(),
                },
                sid,
            ));
        }

        let bundle = self.orchestrator.run_turn(&mut session, message).await;
        session.touch();

        let reply = match self
            .responder
            .generate(&bundle, self.orchestrator.today())
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(session_id = %sid, error = %e, "Reply generation failed");
                FALLBACK_REPLY.to_string()
            }
        };

        tracing::info!(
            session_id = %sid,
            turn = session.turns,
            hotels = ?bundle.hotels.as_ref().map(Vec::len),
            flights = ?bundle.flights.as_ref().map(Vec::len),
            "Turn complete"
        );

        Ok((
            ChatReply {
                reply,
                evidence: bundle.counts(),
                trip_info: bundle.trip_info,
            },
            sid,
        ))
    }

    /// Memory snapshot of a session.
    pub async fn get_memory(&self, session_id: Uuid) -> Result<TravelMemory, ChatError> {
        let handle = self.session_handle(session_id)?;
        let session = handle.lock().await;
        Ok(session.memory.clone())
    }

    /// Start a session's trip over. Returns the fresh memory.
    pub async fn reset_session(&self, session_id: Uuid) -> Result<TravelMemory, ChatError> {
        let handle = self.session_handle(session_id)?;
        let mut session = handle.lock().await;
        session.reset();
        tracing::info!(session_id = %session_id, "Session reset");
        Ok(session.memory.clone())
    }

    /// Delete a session by ID.
    pub fn delete_session(&self, session_id: Uuid) -> Result<(), ChatError> {
        let mut sessions = self.lock_sessions()?;
        if sessions.remove(&session_id).is_some() {
            Ok(())
        } else {
            Err(ChatError::SessionNotFound(session_id))
        }
    }

    /// List all sessions as summaries, oldest first.
    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        let handles: Vec<SessionHandle> = match self.sessions.lock() {
            Ok(sessions) => sessions.values().cloned().collect(),
            Err(_) => return vec![],
        };

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            summaries.push(handle.lock().await.summary());
        }
        summaries.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        summaries
    }

    // -- Private helpers --

    fn lock_sessions(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, SessionHandle>>, ChatError> {
        self.sessions
            .lock()
            .map_err(|e| ChatError::Config(format!("session lock poisoned: {}", e)))
    }

    fn session_handle(&self, session_id: Uuid) -> Result<SessionHandle, ChatError> {
        self.lock_sessions()?
            .get(&session_id)
            .cloned()
            .ok_or(ChatError::SessionNotFound(session_id))
    }

    /// Resolve or create a session.
    ///
    /// Expired sessions are dropped first, so unknown and expired IDs both
    /// get a fresh session under a new ID. A session that is busy with
    /// another turn is never treated as expired.
    fn resolve_session(&self, requested: Option<Uuid>) -> Result<(Uuid, SessionHandle), ChatError> {
        let mut sessions = self.lock_sessions()?;

        let before = sessions.len();
        sessions.retain(|_, handle| {
            handle
                .try_lock()
                .map(|s| !self.session_manager.is_expired(&s))
                .unwrap_or(true)
        });
        let swept = before - sessions.len();
        if swept > 0 {
            tracing::info!(swept, remaining = sessions.len(), "Expired sessions removed");
        }

        if let Some(sid) = requested {
            if let Some(handle) = sessions.get(&sid) {
                return Ok((sid, handle.clone()));
            }
            tracing::info!(session_id = %sid, "Unknown or expired session, starting a new one");
        }

        let session = self.session_manager.create_session();
        let sid = session.id;
        let handle = Arc::new(AsyncMutex::new(session));
        sessions.insert(sid, handle.clone());
        Ok((sid, handle))
    }
}

fn is_reset_intent(message: &str) -> bool {
    RESET_RE.is_match(message)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::InfoExtractor;
    use crate::orchestrator::SearchProviders;
    use crate::testing::{
        attraction, flight, hotel, train, MockProvider, ScriptedLlm, DEFAULT_REPLY,
    };
    use chrono::NaiveDate;
    use tripmate_core::config::SearchConfig;
    use tripmate_search::{AttractionRecord, FlightRecord, HotelRecord, SearchKind, TrainRecord};

    const DELHI_TO_BALI: &str =
        r#"{"origin": "Delhi", "destination": "Bali", "check_in_date": "2025-06-01", "transportation": ["flight"]}"#;

    struct Fixture {
        llm: Arc<ScriptedLlm>,
        hotels: Arc<MockProvider<HotelRecord>>,
        flights: Arc<MockProvider<FlightRecord>>,
        planner: TripPlanner,
    }

    fn fixture_with(config: ChatConfig) -> Fixture {
        let llm = Arc::new(ScriptedLlm::new());
        let hotels = Arc::new(MockProvider::new(SearchKind::Hotels, vec![hotel("Hotel Kuta")]));
        let flights = Arc::new(MockProvider::new(SearchKind::Flights, vec![flight("Garuda")]));
        let attractions: Arc<MockProvider<AttractionRecord>> = Arc::new(MockProvider::new(
            SearchKind::Attractions,
            vec![attraction("Uluwatu Temple")],
        ));
        let trains: Arc<MockProvider<TrainRecord>> = Arc::new(MockProvider::new(
            SearchKind::Trains,
            vec![train("Mandovi Express | Konkan Railway")],
        ));
        let orchestrator = SearchOrchestrator::new(
            InfoExtractor::new(llm.clone()),
            SearchProviders {
                hotels: hotels.clone(),
                flights: flights.clone(),
                attractions: Some(attractions),
                trains: Some(trains),
            },
            &SearchConfig::default(),
        )
        .with_fixed_date(NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());
        let planner = TripPlanner::new(
            orchestrator,
            ResponseGenerator::new(llm.clone()),
            config,
            CacheConfig::default(),
        );
        Fixture {
            llm,
            hotels,
            flights,
            planner,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(ChatConfig::default())
    }

    // ---- Validation ----

    #[tokio::test]
    async fn test_disabled_returns_error() {
        let f = fixture_with(ChatConfig {
            enabled: false,
            ..ChatConfig::default()
        });
        let result = f.planner.handle_message("hello", None).await;
        assert!(matches!(result, Err(ChatError::Disabled)));
    }

    #[tokio::test]
    async fn test_empty_message_returns_error() {
        let f = fixture();
        assert!(matches!(
            f.planner.handle_message("", None).await,
            Err(ChatError::EmptyMessage)
        ));
        assert!(matches!(
            f.planner.handle_message("   \n", None).await,
            Err(ChatError::EmptyMessage)
        ));
        assert!(f.planner.list_sessions().await.is_empty());
    }

    #[tokio::test]
    async fn test_message_too_long_returns_error() {
        let f = fixture_with(ChatConfig {
            max_message_length: 10,
            ..ChatConfig::default()
        });
        let result = f.planner.handle_message(&"a".repeat(11), None).await;
        assert!(matches!(result, Err(ChatError::MessageTooLong(10))));
    }

    #[tokio::test]
    async fn test_message_at_max_length_ok() {
        let f = fixture_with(ChatConfig {
            max_message_length: 10,
            ..ChatConfig::default()
        });
        assert!(f.planner.handle_message(&"a".repeat(10), None).await.is_ok());
    }

    // ---- Sessions ----

    #[tokio::test]
    async fn test_handle_message_creates_session() {
        let f = fixture();
        let (reply, sid) = f.planner.handle_message("hello", None).await.unwrap();
        assert_eq!(reply.reply, DEFAULT_REPLY);
        assert_ne!(sid, Uuid::nil());
        assert_eq!(f.planner.list_sessions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_same_session_id_reuses_session() {
        let f = fixture();
        let (_, sid1) = f.planner.handle_message("first", None).await.unwrap();
        let (_, sid2) = f.planner.handle_message("second", Some(sid1)).await.unwrap();
        assert_eq!(sid1, sid2);
        let sessions = f.planner.list_sessions().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].turn_count, 2);
    }

    #[tokio::test]
    async fn test_unknown_session_id_creates_new() {
        let f = fixture();
        let fake = Uuid::new_v4();
        let (_, sid) = f.planner.handle_message("hello", Some(fake)).await.unwrap();
        assert_ne!(sid, fake);
    }

    #[tokio::test]
    async fn test_expired_session_is_replaced() {
        let f = fixture();
        let (_, sid) = f.planner.handle_message("hello", None).await.unwrap();
        {
            let handle = f.planner.session_handle(sid).unwrap();
            handle.lock().await.last_message_at -= 2 * 60 * 60;
        }
        let (_, new_sid) = f.planner.handle_message("hello again", Some(sid)).await.unwrap();
        assert_ne!(new_sid, sid);
        assert!(matches!(
            f.planner.get_memory(sid).await,
            Err(ChatError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_sessions_are_swept_on_any_message() {
        let f = fixture();
        let (_, stale) = f.planner.handle_message("hello", None).await.unwrap();
        let (_, live) = f.planner.handle_message("hi", None).await.unwrap();
        {
            let handle = f.planner.session_handle(stale).unwrap();
            handle.lock().await.last_message_at -= 2 * 60 * 60;
        }

        f.planner.handle_message("hi again", Some(live)).await.unwrap();

        let ids: Vec<Uuid> = f.planner.list_sessions().await.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![live]);
        assert!(matches!(
            f.planner.get_memory(stale).await,
            Err(ChatError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_busy_session_survives_sweep() {
        let f = fixture();
        let (_, busy) = f.planner.handle_message("hello", None).await.unwrap();
        let handle = f.planner.session_handle(busy).unwrap();
        let mut guard = handle.lock().await;
        guard.last_message_at -= 2 * 60 * 60;

        f.planner.handle_message("hi", None).await.unwrap();
        drop(guard);

        assert!(f.planner.session_handle(busy).is_ok());
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let f = fixture();
        f.llm.push_ok(DELHI_TO_BALI);
        let (_, a) = f.planner.handle_message("Delhi to Bali on 2025-06-01", None).await.unwrap();
        f.llm.push_ok(r#"{"destination": "Goa"}"#);
        f.llm.push_ok("Goa it is.");
        let (_, b) = f.planner.handle_message("Goa", None).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(
            f.planner.get_memory(a).await.unwrap().destination.as_deref(),
            Some("Bali")
        );
        assert_eq!(
            f.planner.get_memory(b).await.unwrap().destination.as_deref(),
            Some("Goa")
        );
    }

    #[tokio::test]
    async fn test_delete_session() {
        let f = fixture();
        let (_, sid) = f.planner.handle_message("hello", None).await.unwrap();
        assert!(f.planner.delete_session(sid).is_ok());
        assert!(f.planner.list_sessions().await.is_empty());
        assert!(matches!(
            f.planner.delete_session(sid),
            Err(ChatError::SessionNotFound(_))
        ));
    }

    // ---- Turns ----

    #[tokio::test]
    async fn test_turn_reply_and_memory() {
        let f = fixture();
        f.llm.push_ok(DELHI_TO_BALI);
        f.llm.push_ok("Bali in June? Sunscreen, darling.");

        let (reply, _) = f
            .planner
            .handle_message("I want to fly from Delhi to Bali on 2025-06-01", None)
            .await
            .unwrap();

        assert_eq!(reply.reply, "Bali in June? Sunscreen, darling.");
        assert_eq!(reply.trip_info.check_out_date.as_deref(), Some("2025-06-08"));
        assert_eq!(reply.evidence.flights, Some(1));
        assert_eq!(reply.evidence.hotels, Some(1));
        assert_eq!(f.flights.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_reuse_across_turns() {
        let f = fixture();
        f.llm.push_ok(DELHI_TO_BALI);
        f.llm.push_ok("Turn one.");
        f.llm.push_ok("{}");
        f.llm.push_ok("Turn two.");

        let (_, sid) = f
            .planner
            .handle_message("I want to fly from Delhi to Bali on 2025-06-01", None)
            .await
            .unwrap();
        let (reply, _) = f.planner.handle_message("what about hotels", Some(sid)).await.unwrap();

        assert_eq!(reply.reply, "Turn two.");
        assert_eq!(reply.evidence.hotels, Some(1));
        assert_eq!(f.hotels.calls(), 1);
        assert_eq!(f.flights.calls(), 1);
    }

    #[tokio::test]
    async fn test_reply_failure_becomes_generic_reply_and_keeps_state() {
        let f = fixture();
        f.llm.push_ok(DELHI_TO_BALI);
        f.llm.push_err("model overloaded");

        let (reply, sid) = f
            .planner
            .handle_message("I want to fly from Delhi to Bali on 2025-06-01", None)
            .await
            .unwrap();

        assert_eq!(reply.reply, FALLBACK_REPLY);
        let memory = f.planner.get_memory(sid).await.unwrap();
        assert_eq!(memory.destination.as_deref(), Some("Bali"));

        // The session keeps working afterwards.
        let (next, same) = f.planner.handle_message("thanks", Some(sid)).await.unwrap();
        assert_eq!(same, sid);
        assert_eq!(next.reply, DEFAULT_REPLY);
    }

    #[tokio::test]
    async fn test_provider_failure_still_replies() {
        let f = fixture();
        f.hotels.fail_with("invalid payload");
        f.flights.fail_with("invalid payload");
        f.llm.push_ok(DELHI_TO_BALI);
        f.llm.push_ok("No hotels, no flights. Swim?");

        let (reply, _) = f
            .planner
            .handle_message("I want to fly from Delhi to Bali on 2025-06-01", None)
            .await
            .unwrap();
        assert_eq!(reply.reply, "No hotels, no flights. Swim?");
        assert_eq!(reply.evidence.hotels, Some(0));
        assert_eq!(reply.evidence.flights, Some(0));
    }

    // ---- Reset ----

    #[test]
    fn test_reset_intent_detection() {
        assert!(is_reset_intent("reset"));
        assert!(is_reset_intent("  Start Over! "));
        assert!(is_reset_intent("new trip"));
        assert!(is_reset_intent("clear memory."));
        assert!(!is_reset_intent("how do I reset my password"));
        assert!(!is_reset_intent("plan a new trip to Goa"));
    }

    #[tokio::test]
    async fn test_reset_message_clears_memory_without_llm_call() {
        let f = fixture();
        f.llm.push_ok(DELHI_TO_BALI);
        let (_, sid) = f
            .planner
            .handle_message("I want to fly from Delhi to Bali on 2025-06-01", None)
            .await
            .unwrap();
        let prompts_before = f.llm.prompts().len();

        let (reply, same) = f.planner.handle_message("start over", Some(sid)).await.unwrap();
        assert_eq!(same, sid);
        assert_eq!(reply.reply, RESET_REPLY);
        assert!(reply.trip_info.is_empty());
        assert_eq!(f.llm.prompts().len(), prompts_before);

        // Next turn is a first turn again, so searches are fresh.
        f.llm.push_ok(DELHI_TO_BALI);
        f.planner
            .handle_message("I want to fly from Delhi to Bali on 2025-06-01", Some(sid))
            .await
            .unwrap();
        assert_eq!(f.flights.calls(), 2);
    }

    #[tokio::test]
    async fn test_reset_session_api() {
        let f = fixture();
        f.llm.push_ok(DELHI_TO_BALI);
        let (_, sid) = f.planner.handle_message("Delhi to Bali", None).await.unwrap();

        let memory = f.planner.reset_session(sid).await.unwrap();
        assert!(memory.is_empty());
        assert!(f.planner.get_memory(sid).await.unwrap().is_empty());
        assert!(matches!(
            f.planner.reset_session(Uuid::new_v4()).await,
            Err(ChatError::SessionNotFound(_))
        ));
    }
}
