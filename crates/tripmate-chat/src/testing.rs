//! Test doubles for the model and the search providers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tripmate_core::SearchParams;
use tripmate_search::{
    AttractionRecord, FlightRecord, HotelRecord, SearchError, SearchKind, SearchProvider,
    TrainRecord,
};

use crate::error::ChatError;
use crate::llm::LlmClient;

/// Answer given once the script runs out.
pub const DEFAULT_REPLY: &str = "Here is your trip plan.";

/// Language model that plays back queued answers in order.
#[derive(Default)]
pub struct ScriptedLlm {
    script: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, answer: &str) {
        self.script.lock().unwrap().push_back(Ok(answer.to_string()));
    }

    pub fn push_err(&self, message: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(answer)) => Ok(answer),
            Some(Err(message)) => Err(ChatError::Llm(message)),
            None => Ok(DEFAULT_REPLY.to_string()),
        }
    }
}

/// Provider returning fixed results, with a call counter, optional failure
/// and optional delay.
pub struct MockProvider<R> {
    kind: SearchKind,
    results: Vec<R>,
    calls: AtomicUsize,
    last_params: Mutex<Option<SearchParams>>,
    failure: Mutex<Option<String>>,
    delay: Mutex<Option<Duration>>,
}

impl<R> MockProvider<R> {
    pub fn new(kind: SearchKind, results: Vec<R>) -> Self {
        Self {
            kind,
            results,
            calls: AtomicUsize::new(0),
            last_params: Mutex::new(None),
            failure: Mutex::new(None),
            delay: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_params(&self) -> Option<SearchParams> {
        self.last_params.lock().unwrap().clone()
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl<R> SearchProvider for MockProvider<R>
where
    R: Clone + Send + Sync + Serialize + 'static,
{
    type Record = R;

    fn kind(&self) -> SearchKind {
        self.kind
    }

    async fn fetch(&self, params: &SearchParams) -> Result<Vec<R>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_params.lock().unwrap() = Some(params.clone());

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failure.lock().unwrap().clone();
        match failure {
            Some(message) => Err(SearchError::Http(message)),
            None => Ok(self.results.clone()),
        }
    }
}

pub fn hotel(name: &str) -> HotelRecord {
    HotelRecord {
        name: name.to_string(),
        price: "$120".to_string(),
        price_per_night: Some("$40".to_string()),
        rating: "4.2/5.0".to_string(),
        reviews: "1,024 reviews".to_string(),
        stars: Some("3-star hotel".to_string()),
        location: "Kuta, Bali".to_string(),
        link: None,
        thumbnail: None,
        description: None,
        amenities: vec!["Pool".to_string()],
    }
}

pub fn flight(airline: &str) -> FlightRecord {
    FlightRecord {
        kind: "Best Flight".to_string(),
        airline: airline.to_string(),
        price: "512 USD".to_string(),
        duration: "9h 5m".to_string(),
        stops: "Direct".to_string(),
        departure_time: "2025-06-01 08:00".to_string(),
        arrival_time: "2025-06-01 17:05".to_string(),
        layovers: vec![],
    }
}

pub fn attraction(title: &str) -> AttractionRecord {
    AttractionRecord {
        title: title.to_string(),
        snippet: "Worth a visit".to_string(),
    }
}

pub fn train(title: &str) -> TrainRecord {
    TrainRecord {
        title: title.to_string(),
        snippet: "Several departures daily".to_string(),
    }
}
