//! Speech engine contract.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_UTTERANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique identifier of one submitted utterance.
///
/// Completion signals carry this id back to the queue, which ignores ids it
/// is not currently waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceId(u64);

impl UtteranceId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        Self(NEXT_UTTERANCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One text unit handed to a speech engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
    /// BCP 47 language tag, e.g. `it-IT`
    pub language: String,
}

impl Utterance {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            id: UtteranceId::next(),
            text: text.into(),
            language: language.into(),
        }
    }
}

/// Host speech capability.
///
/// The engine speaks one utterance at a time and reports natural completion
/// by delivering the utterance id to whoever drives the queue. It reports
/// each id at most once and never reports a cancelled utterance.
pub trait SpeechEngine {
    /// Start speaking an utterance.
    fn speak(&mut self, utterance: Utterance);

    /// Pause the current utterance.
    fn pause(&mut self);

    /// Resume a paused utterance.
    fn resume(&mut self);

    /// Stop speaking immediately and drop anything pending.
    fn cancel_all(&mut self);

    /// The most recent utterance passed to `speak`, even once it has finished
    /// or been cancelled.
    ///
    /// Sessions sharing an engine compare this with what they submitted to
    /// tell whether another session has taken the engine over.
    fn last_spoken(&self) -> Option<UtteranceId>;

    /// Whether the engine can currently speak at all.
    fn is_available(&self) -> bool {
        true
    }
}

/// A single engine shared by several playback sessions on one thread.
impl<E: SpeechEngine> SpeechEngine for Rc<RefCell<E>> {
    fn speak(&mut self, utterance: Utterance) {
        self.borrow_mut().speak(utterance);
    }

    fn pause(&mut self) {
        self.borrow_mut().pause();
    }

    fn resume(&mut self) {
        self.borrow_mut().resume();
    }

    fn cancel_all(&mut self) {
        self.borrow_mut().cancel_all();
    }

    fn last_spoken(&self) -> Option<UtteranceId> {
        self.borrow().last_spoken()
    }

    fn is_available(&self) -> bool {
        self.borrow().is_available()
    }
}
