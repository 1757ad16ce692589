//! Speech through a system speech program, one process per utterance.

use super::engine::{SpeechEngine, Utterance, UtteranceId};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};

/// Programs tried, in order, when none is configured.
const CANDIDATES: &[&str] = &["espeak-ng", "espeak", "spd-say", "say"];

/// How to pass language and text to a speech program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProgramKind {
    Espeak,
    SpdSay,
    Say,
    Other,
}

impl ProgramKind {
    /// `spd-say -w` only waits on speech-dispatcher, so stopping it does not
    /// stop the audio.
    fn can_suspend(self) -> bool {
        !matches!(self, Self::SpdSay)
    }

    fn from_path(path: &Path) -> Self {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match name.as_str() {
            "espeak-ng" | "espeak" => Self::Espeak,
            "spd-say" => Self::SpdSay,
            "say" => Self::Say,
            _ => Self::Other,
        }
    }
}

/// A speech program and the arguments it needs.
#[derive(Debug, Clone)]
pub struct SpeechProgram {
    path: PathBuf,
    kind: ProgramKind,
    extra_args: Vec<String>,
}

impl SpeechProgram {
    /// Use a specific program. Extra arguments go before the text.
    pub fn new(path: impl Into<PathBuf>, extra_args: Vec<String>) -> Self {
        let path = path.into();
        let kind = ProgramKind::from_path(&path);
        Self {
            path,
            kind,
            extra_args,
        }
    }

    /// Find the first known speech program on PATH.
    pub fn detect() -> Option<Self> {
        CANDIDATES
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(|path| Self::new(path, Vec::new()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn command(&self, utterance: &Utterance) -> Command {
        let mut cmd = Command::new(&self.path);
        let language = primary_language(&utterance.language);

        match self.kind {
            ProgramKind::Espeak if !language.is_empty() => {
                cmd.args(["-v", language]);
            }
            ProgramKind::SpdSay => {
                // -w blocks until the message is spoken
                cmd.arg("-w");
                if !language.is_empty() {
                    cmd.args(["-l", language]);
                }
            }
            _ => {}
        }

        cmd.args(&self.extra_args)
            .arg(&utterance.text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

/// Primary language subtag of a BCP 47 tag: `it-IT` -> `it`.
fn primary_language(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or("").trim()
}

/// The utterance currently being spoken.
struct Running {
    utterance: Utterance,
    stop: oneshot::Sender<()>,
    pid: Option<u32>,
    /// Process is stopped with SIGSTOP
    suspended: bool,
}

/// Speech engine backed by a system program.
///
/// Natural completion of each utterance is reported on `events`. On unix,
/// `pause` suspends the speech process and `resume` continues it in place.
/// Where that is not possible `pause` ends the process and `resume` speaks
/// the same utterance again from its start.
pub struct CommandSpeechEngine {
    program: SpeechProgram,
    events: mpsc::UnboundedSender<UtteranceId>,
    current: Option<Running>,
    paused: Option<Utterance>,
    last_spoken: Option<UtteranceId>,
    available: bool,
}

impl CommandSpeechEngine {
    /// Must be used from within a tokio runtime.
    pub fn new(program: SpeechProgram, events: mpsc::UnboundedSender<UtteranceId>) -> Self {
        Self {
            program,
            events,
            current: None,
            paused: None,
            last_spoken: None,
            available: true,
        }
    }

    fn spawn(&mut self, utterance: Utterance) {
        let mut command = self.program.command(&utterance);
        match command.spawn() {
            Ok(child) => {
                let pid = child.id();
                let (stop, stop_rx) = oneshot::channel();
                tokio::spawn(wait_for_utterance(
                    child,
                    utterance.id,
                    stop_rx,
                    self.events.clone(),
                ));
                self.current = Some(Running {
                    utterance,
                    stop,
                    pid,
                    suspended: false,
                });
            }
            Err(e) => {
                log::warn!(
                    "Failed to start speech program {}: {}",
                    self.program.path.display(),
                    e
                );
                self.available = false;
            }
        }
    }

    /// Ask the running process to stop. Returns the utterance if it was still running.
    fn stop_current(&mut self) -> Option<Utterance> {
        let running = self.current.take()?;
        // The receiver is gone once the process has exited on its own
        running.stop.send(()).ok().map(|_| running.utterance)
    }

    /// Suspend the running process in place. Returns `false` when that is not possible.
    fn suspend_current(&mut self) -> bool {
        if !self.program.kind.can_suspend() {
            return false;
        }
        let Some(running) = self.current.as_mut() else {
            return false;
        };
        if running.suspended {
            return true;
        }
        // Exited already: its pid may belong to something else by now
        if running.stop.is_closed() {
            return false;
        }
        let Some(pid) = running.pid else {
            return false;
        };
        running.suspended = signal_process(pid, true);
        running.suspended
    }
}

#[cfg(unix)]
fn signal_process(pid: u32, suspend: bool) -> bool {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let signal = if suspend {
        Signal::SIGSTOP
    } else {
        Signal::SIGCONT
    };
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    match kill(Pid::from_raw(raw), signal) {
        Ok(()) => true,
        Err(e) => {
            log::debug!("Failed to send {:?} to speech program {}: {}", signal, pid, e);
            false
        }
    }
}

#[cfg(not(unix))]
fn signal_process(_pid: u32, _suspend: bool) -> bool {
    false
}

async fn wait_for_utterance(
    mut child: Child,
    id: UtteranceId,
    stop: oneshot::Receiver<()>,
    events: mpsc::UnboundedSender<UtteranceId>,
) {
    tokio::select! {
        status = child.wait() => {
            match status {
                Ok(status) if !status.success() => {
                    log::debug!("Speech program exited with {} for {}", status, id);
                }
                Err(e) => log::warn!("Failed to wait for speech program: {}", e),
                Ok(_) => {}
            }
            let _ = events.send(id);
        }
        _ = stop => {
            if let Err(e) = child.kill().await {
                log::debug!("Failed to kill speech program for {}: {}", id, e);
            }
        }
    }
}

impl SpeechEngine for CommandSpeechEngine {
    fn speak(&mut self, utterance: Utterance) {
        self.stop_current();
        self.paused = None;
        self.last_spoken = Some(utterance.id);
        self.spawn(utterance);
    }

    fn pause(&mut self) {
        if !self.suspend_current() {
            self.paused = self.stop_current();
        }
    }

    fn resume(&mut self) {
        if let Some(running) = self.current.as_mut().filter(|r| r.suspended) {
            running.suspended = false;
            if let Some(pid) = running.pid {
                signal_process(pid, false);
            }
            return;
        }
        if let Some(utterance) = self.paused.take() {
            self.spawn(utterance);
        }
    }

    fn cancel_all(&mut self) {
        // SIGKILL ends a suspended process too
        self.stop_current();
        self.paused = None;
    }

    fn last_spoken(&self) -> Option<UtteranceId> {
        self.last_spoken
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[test]
    fn test_primary_language() {
        assert_eq!(primary_language("it-IT"), "it");
        assert_eq!(primary_language("en_US"), "en");
        assert_eq!(primary_language("de"), "de");
        assert_eq!(primary_language(""), "");
    }

    #[test]
    fn test_program_kind_from_path() {
        assert_eq!(ProgramKind::from_path(Path::new("/usr/bin/espeak-ng")), ProgramKind::Espeak);
        assert_eq!(ProgramKind::from_path(Path::new("spd-say")), ProgramKind::SpdSay);
        assert_eq!(ProgramKind::from_path(Path::new("/usr/bin/say")), ProgramKind::Say);
        assert_eq!(ProgramKind::from_path(Path::new("piper-speak")), ProgramKind::Other);
    }

    #[test]
    fn test_espeak_arguments() {
        let program = SpeechProgram::new("espeak-ng", vec!["-s".into(), "150".into()]);
        let utterance = Utterance::new("Ciao a tutti.", "it-IT");
        let cmd = program.command(&utterance);
        let args: Vec<_> = cmd.as_std().get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["-v", "it", "-s", "150", "Ciao a tutti."]);
    }

    #[test]
    fn test_spd_say_arguments() {
        let program = SpeechProgram::new("/usr/bin/spd-say", Vec::new());
        let utterance = Utterance::new("Hello.", "en-GB");
        let cmd = program.command(&utterance);
        let args: Vec<_> = cmd.as_std().get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["-w", "-l", "en", "Hello."]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_natural_exit_reports_completion() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut engine = CommandSpeechEngine::new(SpeechProgram::new("true", Vec::new()), tx);

        let utterance = Utterance::new("done quickly", "it-IT");
        let id = utterance.id;
        engine.speak(utterance);

        let finished = timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert_eq!(finished, Some(id));
        assert!(engine.is_available());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_suppresses_completion() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let program = SpeechProgram::new("sh", vec!["-c".into(), "sleep 5".into()]);
        let mut engine = CommandSpeechEngine::new(program, tx);

        engine.speak(Utterance::new("long", "it-IT"));
        engine.cancel_all();

        assert!(timeout(Duration::from_millis(300), rx.recv()).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pause_suspends_and_resume_continues_in_place() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let program = SpeechProgram::new("sh", vec!["-c".into(), "sleep 0.3".into()]);
        let mut engine = CommandSpeechEngine::new(program, tx);

        let utterance = Utterance::new("short", "it-IT");
        let id = utterance.id;
        engine.speak(utterance);
        engine.pause();

        assert!(engine.current.as_ref().is_some_and(|r| r.suspended));
        assert!(engine.paused.is_none());
        // Suspended well past its natural length
        assert!(timeout(Duration::from_millis(700), rx.recv()).await.is_err());

        engine.resume();
        assert!(engine.current.as_ref().is_some_and(|r| !r.suspended));
        let finished = timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert_eq!(finished, Some(id));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_while_suspended_suppresses_completion() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let program = SpeechProgram::new("sh", vec!["-c".into(), "sleep 5".into()]);
        let mut engine = CommandSpeechEngine::new(program, tx);

        engine.speak(Utterance::new("long", "it-IT"));
        engine.pause();
        engine.cancel_all();

        assert!(engine.current.is_none());
        assert!(timeout(Duration::from_millis(300), rx.recv()).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spd_say_pause_restarts_utterance_on_resume() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("spd-say");
        std::fs::write(&script, "#!/bin/sh\nsleep 5\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let (tx, _rx) = mpsc::unbounded_channel();
        let mut engine = CommandSpeechEngine::new(SpeechProgram::new(script.clone(), Vec::new()), tx);

        engine.speak(Utterance::new("long", "it-IT"));
        engine.pause();
        assert!(engine.current.is_none());
        assert_eq!(engine.paused.as_ref().map(|u| u.text.as_str()), Some("long"));

        engine.resume();
        assert!(engine.paused.is_none());
        assert!(engine.current.is_some());
        engine.cancel_all();
    }

    #[test]
    fn test_last_spoken_survives_cancel() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let program = SpeechProgram::new("/nonexistent/speech-program", Vec::new());
        let mut engine = CommandSpeechEngine::new(program, tx);
        assert_eq!(engine.last_spoken(), None);

        let utterance = Utterance::new("hello", "it-IT");
        let id = utterance.id;
        engine.speak(utterance);
        engine.cancel_all();
        assert_eq!(engine.last_spoken(), Some(id));
    }

    #[tokio::test]
    async fn test_missing_program_marks_engine_unavailable() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let program = SpeechProgram::new("/nonexistent/speech-program", Vec::new());
        let mut engine = CommandSpeechEngine::new(program, tx);

        engine.speak(Utterance::new("hello", "it-IT"));
        assert!(!engine.is_available());
    }
}
