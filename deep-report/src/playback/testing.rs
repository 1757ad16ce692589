//! Recording speech engine for playback tests.

use super::engine::{SpeechEngine, Utterance, UtteranceId};
use tokio::sync::mpsc;

/// A call received by the recording engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Speak(String),
    Pause,
    Resume,
    CancelAll,
}

/// Engine double that records calls and tracks what is in flight.
#[derive(Debug)]
pub struct RecordingEngine {
    pub calls: Vec<EngineCall>,
    /// Utterance currently being "spoken"
    pub active: Option<Utterance>,
    pub paused: bool,
    /// Number of times speak() was called while another utterance was active
    pub overlaps: usize,
    pub available: bool,
    last_spoken: Option<UtteranceId>,
    /// When set, every utterance finishes as soon as it is spoken
    auto_finish: Option<mpsc::UnboundedSender<UtteranceId>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            active: None,
            paused: false,
            overlaps: 0,
            available: true,
            last_spoken: None,
            auto_finish: None,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn auto_finishing(events: mpsc::UnboundedSender<UtteranceId>) -> Self {
        Self {
            auto_finish: Some(events),
            ..Self::new()
        }
    }

    /// Simulate natural completion of the active utterance.
    pub fn finish_active(&mut self) -> Option<UtteranceId> {
        self.active.take().map(|u| u.id)
    }

    /// Texts passed to speak(), in order.
    pub fn spoken(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                EngineCall::Speak(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl SpeechEngine for RecordingEngine {
    fn speak(&mut self, utterance: Utterance) {
        if self.active.is_some() {
            self.overlaps += 1;
        }
        self.calls.push(EngineCall::Speak(utterance.text.clone()));
        self.last_spoken = Some(utterance.id);
        match &self.auto_finish {
            Some(events) => {
                let _ = events.send(utterance.id);
            }
            None => self.active = Some(utterance),
        }
    }

    fn pause(&mut self) {
        self.calls.push(EngineCall::Pause);
        self.paused = true;
    }

    fn resume(&mut self) {
        self.calls.push(EngineCall::Resume);
        self.paused = false;
    }

    fn cancel_all(&mut self) {
        self.calls.push(EngineCall::CancelAll);
        self.active = None;
        self.paused = false;
    }

    fn last_spoken(&self) -> Option<UtteranceId> {
        self.last_spoken
    }

    fn is_available(&self) -> bool {
        self.available
    }
}
