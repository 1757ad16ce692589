//! Interactive player loop: engine events, keyboard commands, and Ctrl-C.

use super::engine::{SpeechEngine, UtteranceId};
use super::queue::{PlaybackQueue, PlaybackStatus};
use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

/// A command typed by the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Play when idle, pause when playing, resume when paused
    Toggle,
    Stop,
    /// Start over from the first chunk
    Restart,
    Quit,
}

impl PlayerCommand {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "" | "p" | "play" | "pause" => Some(Self::Toggle),
            "s" | "stop" => Some(Self::Stop),
            "r" | "restart" => Some(Self::Restart),
            "q" | "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Apply a command to the queue. Returns `false` when the player should exit.
pub fn apply_command<E: SpeechEngine>(queue: &mut PlaybackQueue<E>, command: PlayerCommand) -> bool {
    match command {
        PlayerCommand::Toggle => {
            if queue.status() == PlaybackStatus::Playing {
                queue.pause();
            } else {
                queue.play();
            }
        }
        PlayerCommand::Stop => queue.stop(),
        PlayerCommand::Restart => {
            queue.stop();
            queue.play();
        }
        PlayerCommand::Quit => return false,
    }
    true
}

fn describe<E: SpeechEngine>(queue: &PlaybackQueue<E>) -> String {
    match queue.status() {
        PlaybackStatus::Playing => format!("Playing [{}/{}]", queue.cursor() + 1, queue.len()),
        PlaybackStatus::Paused => format!("Paused [{}/{}]", queue.cursor() + 1, queue.len()),
        PlaybackStatus::Idle => "Stopped".to_string(),
        PlaybackStatus::Completed => "Finished".to_string(),
    }
}

/// Play a queue until it finishes, the listener quits, or Ctrl-C.
///
/// The session is torn down on every exit path so no speech outlives the player.
pub async fn run_player<E, R>(
    queue: &mut PlaybackQueue<E>,
    events: &mut mpsc::UnboundedReceiver<UtteranceId>,
    input: R,
) -> Result<()>
where
    E: SpeechEngine,
    R: AsyncBufRead + Unpin,
{
    if queue.is_empty() {
        eprintln!("Nothing to read aloud.");
        return Ok(());
    }

    eprintln!("Controls: [Enter]/p play-pause, s stop, r restart, q quit");
    let mut lines = input.lines();
    let mut input_open = true;

    queue.play();
    eprintln!("{}", describe(queue));

    loop {
        if !queue.engine().is_available() {
            log::warn!("Speech engine became unavailable, stopping playback");
            eprintln!("Speech is not available on this system.");
            break;
        }
        // Stopped with no way to start again
        if !input_open && !queue.status().is_active() {
            break;
        }

        tokio::select! {
            Some(id) = events.recv() => {
                if queue.on_utterance_finished(id) {
                    if queue.status() == PlaybackStatus::Completed {
                        eprintln!("{}", describe(queue));
                        break;
                    }
                    log::info!("{}", describe(queue));
                }
            }
            line = lines.next_line(), if input_open => {
                match line {
                    Ok(Some(line)) => match PlayerCommand::parse(&line) {
                        Some(command) => {
                            if !apply_command(queue, command) {
                                break;
                            }
                            eprintln!("{}", describe(queue));
                        }
                        None => eprintln!("Unknown command: {}", line.trim()),
                    },
                    // No more input: keep playing to the end
                    Ok(None) => input_open = false,
                    Err(e) => {
                        log::warn!("Failed to read player input: {}", e);
                        input_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!();
                break;
            }
        }
    }

    queue.teardown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::testing::{EngineCall, RecordingEngine};
    use std::time::Duration;
    use tokio::io::BufReader;
    use tokio::time::timeout;

    #[test]
    fn test_parse_commands() {
        assert_eq!(PlayerCommand::parse(""), Some(PlayerCommand::Toggle));
        assert_eq!(PlayerCommand::parse(" P \n"), Some(PlayerCommand::Toggle));
        assert_eq!(PlayerCommand::parse("stop"), Some(PlayerCommand::Stop));
        assert_eq!(PlayerCommand::parse("r"), Some(PlayerCommand::Restart));
        assert_eq!(PlayerCommand::parse("Q"), Some(PlayerCommand::Quit));
        assert_eq!(PlayerCommand::parse("louder"), None);
    }

    #[test]
    fn test_toggle_cycles_play_pause_resume() {
        let mut queue =
            PlaybackQueue::from_text(RecordingEngine::new(), "One. Two.", 3, "it-IT");

        assert!(apply_command(&mut queue, PlayerCommand::Toggle));
        assert_eq!(queue.status(), PlaybackStatus::Playing);
        apply_command(&mut queue, PlayerCommand::Toggle);
        assert_eq!(queue.status(), PlaybackStatus::Paused);
        apply_command(&mut queue, PlayerCommand::Toggle);
        assert_eq!(queue.status(), PlaybackStatus::Playing);
        assert_eq!(queue.engine().calls.last(), Some(&EngineCall::Resume));
    }

    #[test]
    fn test_restart_and_quit() {
        let mut queue =
            PlaybackQueue::from_text(RecordingEngine::new(), "One. Two.", 3, "it-IT");
        apply_command(&mut queue, PlayerCommand::Toggle);
        apply_command(&mut queue, PlayerCommand::Restart);
        assert_eq!(queue.status(), PlaybackStatus::Playing);
        assert_eq!(queue.engine().spoken(), vec!["One.", "One."]);

        assert!(!apply_command(&mut queue, PlayerCommand::Quit));
    }

    #[tokio::test]
    async fn test_player_runs_to_completion() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut queue = PlaybackQueue::from_text(
            RecordingEngine::auto_finishing(tx),
            "One. Two. Three.",
            4,
            "it-IT",
        );

        timeout(Duration::from_secs(5), run_player(&mut queue, &mut rx, tokio::io::empty()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(queue.status(), PlaybackStatus::Idle);
        assert_eq!(queue.engine().spoken(), vec!["One.", "Two.", "Three."]);
    }

    #[tokio::test]
    async fn test_player_quit_cancels_speech() {
        let (_tx, mut rx) = mpsc::unbounded_channel();
        let mut queue =
            PlaybackQueue::from_text(RecordingEngine::new(), "One. Two.", 4, "it-IT");

        let input = BufReader::new(&b"q\n"[..]);
        timeout(Duration::from_secs(5), run_player(&mut queue, &mut rx, input))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(queue.status(), PlaybackStatus::Idle);
        assert!(queue.engine().active.is_none());
        assert_eq!(queue.engine().calls.last(), Some(&EngineCall::CancelAll));
    }

    #[tokio::test]
    async fn test_player_exits_when_stopped_and_input_ends() {
        let (_tx, mut rx) = mpsc::unbounded_channel();
        let mut queue =
            PlaybackQueue::from_text(RecordingEngine::new(), "One. Two.", 4, "it-IT");

        let input = BufReader::new(&b"s\n"[..]);
        timeout(Duration::from_secs(5), run_player(&mut queue, &mut rx, input))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(queue.status(), PlaybackStatus::Idle);
        assert_eq!(queue.engine().spoken(), vec!["One."]);
    }

    #[tokio::test]
    async fn test_player_with_empty_queue_returns() {
        let (_tx, mut rx) = mpsc::unbounded_channel();
        let mut queue = PlaybackQueue::from_text(RecordingEngine::new(), "", 200, "it-IT");

        run_player(&mut queue, &mut rx, tokio::io::empty()).await.unwrap();
        assert!(queue.engine().calls.is_empty());
    }
}
