use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::ai::Translate;
use crate::error::{AppError, Result};

/// Deterministic stand-in for the chat API: `"[es] Hello"` for `("Hello", "es")`.
///
/// Each call yields once before answering so overlapping calls show up in
/// `peak_in_flight`.
#[derive(Default)]
pub(crate) struct FakeTranslator {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    started: Mutex<Vec<Instant>>,
    fail_on: Mutex<Vec<String>>,
}

impl FakeTranslator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_on(texts: &[&str]) -> Self {
        let fake = Self::default();
        if let Ok(mut fail_on) = fake.fail_on.lock() {
            fail_on.extend(texts.iter().map(|t| t.to_string()));
        }
        fake
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// When each call started, in call order.
    pub(crate) fn call_starts(&self) -> Vec<Instant> {
        self.started
            .lock()
            .map(|started| started.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Translate for FakeTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut started) = self.started.lock() {
            started.push(Instant::now());
        }
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        tokio::task::yield_now().await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let should_fail = self
            .fail_on
            .lock()
            .map(|fail_on| fail_on.iter().any(|t| t == text))
            .unwrap_or(false);
        if should_fail {
            return Err(AppError::TranslationApi(
                "503 Service Unavailable: upstream overloaded".to_string(),
            ));
        }
        Ok(format!("[{}] {}", target_language, text))
    }
}
