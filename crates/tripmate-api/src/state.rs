//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use tripmate_chat::TripPlanner;

/// Shared application state, cloned into every handler task.
#[derive(Clone)]
pub struct AppState {
    /// Owns every chat session.
    pub planner: Arc<TripPlanner>,
    /// Port the server listens on, used for the CORS allow list.
    pub port: u16,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(planner: TripPlanner, port: u16) -> Self {
        Self {
            planner: Arc::new(planner),
            port,
            start_time: Instant::now(),
        }
    }
}
