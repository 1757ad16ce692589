//! Podcast mode: sequential speech playback of a report.

pub mod command;
pub mod engine;
pub mod player;
pub mod queue;
#[cfg(test)]
pub mod testing;

pub use command::{CommandSpeechEngine, SpeechProgram};
pub use player::run_player;
pub use queue::PlaybackQueue;
