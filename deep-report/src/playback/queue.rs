//! Sequential playback of chunks through a speech engine.
//!
//! The queue submits one chunk at a time, in index order, and advances when
//! the engine reports that the chunk in flight finished. Starting playback
//! always cancels whatever the engine is doing first, so two playback streams
//! never overlap on a shared engine.

use super::engine::{SpeechEngine, Utterance, UtteranceId};
use crate::text::{Chunk, chunk, clean_for_speech};

/// Playback state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// Never started, or stopped explicitly
    Idle,
    Playing,
    Paused,
    /// Ran off the end of the chunk list
    Completed,
}

impl PlaybackStatus {
    /// Whether this session is currently driving the engine.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

/// One playback session over a fixed chunk sequence.
pub struct PlaybackQueue<E: SpeechEngine> {
    engine: E,
    chunks: Vec<Chunk>,
    language: String,
    cursor: usize,
    status: PlaybackStatus,
    /// Utterance whose completion advances the cursor
    in_flight: Option<UtteranceId>,
    /// Last utterance this session handed to the engine, kept after it finishes
    submitted: Option<UtteranceId>,
    /// The chunk in flight finished naturally while paused
    finished_while_paused: bool,
}

impl<E: SpeechEngine> PlaybackQueue<E> {
    /// Create a session over already chunked text.
    pub fn new(engine: E, chunks: Vec<Chunk>, language: impl Into<String>) -> Self {
        Self {
            engine,
            chunks,
            language: language.into(),
            cursor: 0,
            status: PlaybackStatus::Idle,
            in_flight: None,
            submitted: None,
            finished_while_paused: false,
        }
    }

    /// Create a session by cleaning plain text for speech and chunking it.
    pub fn from_text(
        engine: E,
        text: &str,
        max_chunk_length: usize,
        language: impl Into<String>,
    ) -> Self {
        let mut queue = Self::new(engine, Vec::new(), language);
        queue.replace_text(text, max_chunk_length);
        queue
    }

    /// Current status. A session whose engine was taken over by another
    /// session reports `Idle`.
    pub fn status(&self) -> PlaybackStatus {
        if self.status.is_active() && self.superseded() {
            PlaybackStatus::Idle
        } else {
            self.status
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Chunk at the cursor, if any.
    pub fn current_chunk(&self) -> Option<&Chunk> {
        self.chunks.get(self.cursor)
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Start, restart, or resume playback.
    ///
    /// From `Paused` this resumes in place. From any other state the engine is
    /// cancelled and playback starts again at chunk 0. With an empty chunk list
    /// nothing is spoken but the session still reports `Playing`.
    pub fn play(&mut self) {
        if !self.engine.is_available() {
            log::warn!("Speech engine unavailable, ignoring play");
            return;
        }
        self.release_if_superseded();

        if self.status == PlaybackStatus::Paused {
            self.status = PlaybackStatus::Playing;
            self.engine.resume();
            if std::mem::take(&mut self.finished_while_paused) {
                self.advance();
            }
            return;
        }

        self.engine.cancel_all();
        self.in_flight = None;
        self.finished_while_paused = false;
        self.cursor = 0;
        self.status = PlaybackStatus::Playing;

        if self.chunks.is_empty() {
            log::debug!("Nothing to play");
            return;
        }
        self.speak_current();
    }

    /// Pause playback. Ignored unless playing.
    pub fn pause(&mut self) {
        self.release_if_superseded();
        if self.status != PlaybackStatus::Playing {
            return;
        }
        self.engine.pause();
        self.status = PlaybackStatus::Paused;
    }

    /// Stop playback and rewind to the first chunk.
    ///
    /// The engine is cancelled unless another session is using it.
    pub fn stop(&mut self) {
        if !self.superseded() {
            self.engine.cancel_all();
        }
        self.reset(PlaybackStatus::Idle);
    }

    /// Handle a completion signal from the engine.
    ///
    /// Returns `false` for stale ids: utterances that were cancelled, replaced,
    /// or belong to another session.
    pub fn on_utterance_finished(&mut self, id: UtteranceId) -> bool {
        if self.in_flight != Some(id) {
            log::debug!("Ignoring completion of stale utterance {}", id);
            return false;
        }

        match self.status {
            PlaybackStatus::Playing => {
                self.in_flight = None;
                self.advance();
                true
            }
            PlaybackStatus::Paused => {
                // Applied on resume so the next chunk is neither skipped nor replayed
                self.in_flight = None;
                self.finished_while_paused = true;
                true
            }
            PlaybackStatus::Idle | PlaybackStatus::Completed => false,
        }
    }

    /// Swap in new chunks, tearing the current session down first.
    pub fn replace_chunks(&mut self, chunks: Vec<Chunk>) {
        self.teardown();
        self.chunks = chunks;
    }

    /// Swap in new source text, tearing the current session down first.
    pub fn replace_text(&mut self, text: &str, max_chunk_length: usize) {
        self.replace_chunks(chunk(&clean_for_speech(text), max_chunk_length));
    }

    /// Silence this session if it is driving the engine and return to idle.
    ///
    /// Sessions that are idle, finished, or were taken over by another
    /// session leave the engine alone.
    pub fn teardown(&mut self) {
        self.release_if_superseded();
        if self.status.is_active() {
            self.engine.cancel_all();
        }
        self.reset(PlaybackStatus::Idle);
    }

    /// Whether another session has spoken through the engine since this one did.
    fn superseded(&self) -> bool {
        self.engine.last_spoken() != self.submitted
    }

    /// Drop to `Idle` without touching the engine if another session owns it.
    fn release_if_superseded(&mut self) {
        if self.status.is_active() && self.superseded() {
            log::debug!("Playback session was taken over, releasing");
            self.reset(PlaybackStatus::Idle);
        }
    }

    fn advance(&mut self) {
        if self.cursor + 1 < self.chunks.len() {
            self.cursor += 1;
            self.speak_current();
        } else {
            self.reset(PlaybackStatus::Completed);
        }
    }

    fn speak_current(&mut self) {
        let Some(text) = self.current_chunk().map(|c| c.content.clone()) else {
            return;
        };
        let utterance = Utterance::new(text, self.language.clone());
        log::debug!(
            "Speaking chunk {}/{} as {}",
            self.cursor + 1,
            self.chunks.len(),
            utterance.id
        );
        self.in_flight = Some(utterance.id);
        self.submitted = Some(utterance.id);
        self.engine.speak(utterance);
    }

    fn reset(&mut self, status: PlaybackStatus) {
        self.cursor = 0;
        self.status = status;
        self.in_flight = None;
        self.finished_while_paused = false;
    }
}

impl<E: SpeechEngine> Drop for PlaybackQueue<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}
