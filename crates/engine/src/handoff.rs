//! Foreground handoff: surrender audio and display ownership, run an
//! interactive external program to completion, then take ownership back.

use crate::traits::{AudioControl, DisplayControl};
use crate::types::HandoffOutcome;
use std::process::Command;

/// Exit code by which a foreground program requests a system reboot.
pub const EXIT_CODE_REBOOT: i32 = 10;
/// Exit code by which a foreground program requests a system shutdown.
pub const EXIT_CODE_SHUTDOWN: i32 = 11;

/// Runs interactive full-screen programs while the application steps aside.
///
/// A single foreground slot is assumed; callers must serialize invocations.
pub struct HandoffController<'a> {
    audio: &'a dyn AudioControl,
    display: &'a dyn DisplayControl,
}

impl<'a> HandoffController<'a> {
    pub fn new(audio: &'a dyn AudioControl, display: &'a dyn DisplayControl) -> Self {
        Self { audio, display }
    }

    /// Run `command_line` in the foreground, blocking until it exits, and
    /// map its exit code to a tagged outcome. Ownership is restored even
    /// when the program could not be started.
    pub fn run(&self, command_line: &str) -> HandoffOutcome {
        tracing::debug!(command = command_line, "foreground handoff");

        self.audio.suspend();
        self.display.release();

        let exit_code = run_foreground(command_line);

        self.display.acquire();
        self.audio.resume();
        self.audio.play_ambient();

        match exit_code {
            EXIT_CODE_REBOOT => HandoffOutcome::RebootRequested,
            EXIT_CODE_SHUTDOWN => HandoffOutcome::ShutdownRequested,
            code => HandoffOutcome::Completed { exit_code: code },
        }
    }
}

fn run_foreground(command_line: &str) -> i32 {
    #[cfg(unix)]
    let mut cmd = {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command_line);
        cmd
    };
    #[cfg(windows)]
    let mut cmd = {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command_line);
        cmd
    };

    match cmd.status() {
        Ok(status) => {
            #[cfg(unix)]
            {
                use std::os::unix::process::ExitStatusExt;
                status
                    .code()
                    .unwrap_or_else(|| 128 + status.signal().unwrap_or(0))
            }
            #[cfg(not(unix))]
            {
                status.code().unwrap_or(-1)
            }
        }
        Err(err) => {
            tracing::error!(command = command_line, %err, "cannot start foreground program");
            -1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records the order of ownership transitions.
    #[derive(Default)]
    struct Recorder(Mutex<Vec<&'static str>>);

    impl Recorder {
        fn push(&self, ev: &'static str) {
            self.0.lock().unwrap().push(ev);
        }
        fn events(&self) -> Vec<&'static str> {
            self.0.lock().unwrap().clone()
        }
    }

    struct RecordingAudio<'a>(&'a Recorder);

    impl AudioControl for RecordingAudio<'_> {
        fn suspend(&self) {
            self.0.push("audio.suspend");
        }
        fn resume(&self) {
            self.0.push("audio.resume");
        }
        fn play_ambient(&self) {
            self.0.push("audio.play_ambient");
        }
    }

    struct RecordingDisplay<'a>(&'a Recorder);

    impl DisplayControl for RecordingDisplay<'_> {
        fn release(&self) {
            self.0.push("display.release");
        }
        fn acquire(&self) {
            self.0.push("display.acquire");
        }
    }

    fn run_with_recorder(command: &str) -> (HandoffOutcome, Vec<&'static str>) {
        let rec = Recorder::default();
        let audio = RecordingAudio(&rec);
        let display = RecordingDisplay(&rec);
        let outcome = HandoffController::new(&audio, &display).run(command);
        (outcome, rec.events())
    }

    #[test]
    fn ownership_transitions_bracket_the_run() {
        let (outcome, events) = run_with_recorder("true");
        assert_eq!(outcome, HandoffOutcome::Completed { exit_code: 0 });
        assert_eq!(
            events,
            vec![
                "audio.suspend",
                "display.release",
                "display.acquire",
                "audio.resume",
                "audio.play_ambient",
            ]
        );
    }

    #[test]
    fn reserved_exit_codes_are_mapped() {
        let (outcome, _) = run_with_recorder("exit 10");
        assert_eq!(outcome, HandoffOutcome::RebootRequested);

        let (outcome, _) = run_with_recorder("exit 11");
        assert_eq!(outcome, HandoffOutcome::ShutdownRequested);

        let (outcome, _) = run_with_recorder("exit 3");
        assert_eq!(outcome, HandoffOutcome::Completed { exit_code: 3 });
        assert!(!outcome.succeeded());
    }

    #[test]
    fn ownership_is_restored_on_launch_failure() {
        let rec = Recorder::default();
        let audio = RecordingAudio(&rec);
        let display = RecordingDisplay(&rec);
        let controller = HandoffController::new(&audio, &display);

        let outcome = controller.run("/nonexistent-foreground-program 2>/dev/null");
        // sh itself starts, the program fails inside it; either way ownership
        // must come back.
        assert!(matches!(outcome, HandoffOutcome::Completed { .. }));
        assert!(rec.events().contains(&"audio.resume"));
        assert!(rec.events().contains(&"display.acquire"));
    }
}
