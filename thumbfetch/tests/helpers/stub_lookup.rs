//! In-memory stand-in for the GraphQL client

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use thumbfetch::services::{normalize_shortcode, DisplayUrlLookup, LookupError};

#[derive(Debug, Clone)]
enum Response {
    Url(String),
    Missing,
    Panic,
}

/// Scripted lookup: per-shortcode responses, call counting
///
/// Unscripted shortcodes succeed with `https://img/<shortcode>.jpg` unless
/// [`StubLookup::failing_by_default`] was used.
pub struct StubLookup {
    responses: Mutex<HashMap<String, Response>>,
    succeed_unscripted: bool,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl StubLookup {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            succeed_unscripted: true,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_by_default() -> Self {
        Self {
            succeed_unscripted: false,
            ..Self::new()
        }
    }

    pub fn succeed(self, shortcode: &str, url: &str) -> Self {
        self.set_url(shortcode, url);
        self
    }

    pub fn fail(self, shortcode: &str) -> Self {
        self.set_missing(shortcode);
        self
    }

    pub fn panic_on(self, shortcode: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(shortcode.to_string(), Response::Panic);
        self
    }

    /// Change a response between runs
    pub fn set_url(&self, shortcode: &str, url: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(shortcode.to_string(), Response::Url(url.to_string()));
    }

    pub fn set_missing(&self, shortcode: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(shortcode.to_string(), Response::Missing);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Shortcodes looked up so far, in call order
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl DisplayUrlLookup for StubLookup {
    async fn display_url(&self, post: &str) -> Result<String, LookupError> {
        let shortcode = normalize_shortcode(post);
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(shortcode.clone());

        let response = self.responses.lock().unwrap().get(&shortcode).cloned();
        match response {
            Some(Response::Url(url)) => Ok(url),
            Some(Response::Missing) => Err(LookupError::MissingDisplayUrl),
            Some(Response::Panic) => panic!("stub lookup panicked for {}", shortcode),
            None if self.succeed_unscripted => Ok(format!("https://img/{}.jpg", shortcode)),
            None => Err(LookupError::Status(404)),
        }
    }
}
