//! Refresh-or-reuse decisions.
//!
//! Compares memory snapshots taken before and after a turn's merge, and
//! scans the user's message for phrases that ask for fresh data.

use std::sync::LazyLock;

use regex::Regex;

use crate::memory::TravelMemory;

/// Phrases that signal the user wants fresh results.
///
/// Matched as case-insensitive substrings of the whole message, so "now"
/// also fires inside "know". That is the accepted cost of a simple rule.
pub const REFRESH_KEYWORDS: &[&str] = &[
    "search again",
    "check again",
    "refresh",
    "update",
    "new search",
    "latest",
    "current",
    "fresh",
    "now",
    "today",
    "find me",
    "get me",
];

static REFRESH_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alts: Vec<String> = REFRESH_KEYWORDS.iter().map(|k| regex::escape(k)).collect();
    Regex::new(&format!(r"(?i)(?:{})", alts.join("|"))).expect("Invalid refresh keyword regex")
});

/// Detects refresh-triggering differences between two memory snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector;

impl ChangeDetector {
    /// Check-in or check-out differ.
    pub fn dates_changed(&self, before: &TravelMemory, after: &TravelMemory) -> bool {
        before.check_in_date != after.check_in_date || before.check_out_date != after.check_out_date
    }

    /// Origin or destination differ.
    pub fn locations_changed(&self, before: &TravelMemory, after: &TravelMemory) -> bool {
        before.origin != after.origin || before.destination != after.destination
    }

    /// The message explicitly asks for fresh data.
    pub fn wants_refresh(&self, user_text: &str) -> bool {
        REFRESH_RE.is_match(user_text)
    }

    /// Combined decision for one search type.
    pub fn should_refresh(
        &self,
        before: &TravelMemory,
        after: &TravelMemory,
        user_text: &str,
        first_search: bool,
    ) -> bool {
        first_search
            || self.wants_refresh(user_text)
            || self.dates_changed(before, after)
            || self.locations_changed(before, after)
    }
}
