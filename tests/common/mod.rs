//! Shared test utilities

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use findora::voice::SpeechEngine;
use findora::{Completion, Error, Result};

/// Completion backend with a canned reply
pub struct FakeCompletion {
    reply: Option<String>,
    questions: Mutex<Vec<String>>,
}

impl FakeCompletion {
    /// Always answer with `reply`
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            questions: Mutex::new(Vec::new()),
        }
    }

    /// Always fail as if the service were down
    pub fn failing() -> Self {
        Self {
            reply: None,
            questions: Mutex::new(Vec::new()),
        }
    }

    /// Questions received so far
    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Completion for FakeCompletion {
    async fn complete(&self, question: &str) -> Result<String> {
        self.questions.lock().unwrap().push(question.to_string());
        self.reply
            .clone()
            .ok_or_else(|| Error::RemoteCall("service unavailable".to_string()))
    }
}

/// Speech engine that records segments instead of playing them
pub struct RecordingEngine {
    started: Mutex<Vec<String>>,
    hold: Duration,
    ignore_stop: bool,
    fail_on: Option<usize>,
    halted: AtomicBool,
    stops: AtomicUsize,
}

impl RecordingEngine {
    /// Each segment "plays" for `hold` unless stopped
    pub fn new(hold: Duration) -> Self {
        Self {
            started: Mutex::new(Vec::new()),
            hold,
            ignore_stop: false,
            fail_on: None,
            halted: AtomicBool::new(false),
            stops: AtomicUsize::new(0),
        }
    }

    /// Segments always play to the end, even after `stop`
    pub fn ignoring_stop(mut self) -> Self {
        self.ignore_stop = true;
        self
    }

    /// Fail the segment with this start index
    pub fn failing_on(mut self, index: usize) -> Self {
        self.fail_on = Some(index);
        self
    }

    /// Segments in the order they began
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    /// How many times `stop` reached the engine
    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechEngine for RecordingEngine {
    async fn say(&self, segment: &str) -> Result<()> {
        let index = {
            let mut started = self.started.lock().unwrap();
            started.push(segment.to_string());
            started.len() - 1
        };

        if self.fail_on == Some(index) {
            return Err(Error::Tts("synthesis failed".to_string()));
        }

        let begun = Instant::now();
        while begun.elapsed() < self.hold {
            if !self.ignore_stop && self.halted.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.halted.store(true, Ordering::SeqCst);
    }

    fn reset(&self) {
        self.halted.store(false, Ordering::SeqCst);
    }
}
