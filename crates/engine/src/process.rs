//! Helper-process execution: streamed, enumerating, and fire-and-forget
//! variants over one shared spawn/read discipline.

use crate::types::CommandOutcome;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Command, Stdio};

/// Caller-supplied sink for helper output, invoked synchronously once per
/// line, in emission order, never after the run returns.
pub type OutputObserver<'a> = &'a mut dyn FnMut(&str);

fn shell_command(command_line: &str) -> Command {
    #[cfg(unix)]
    {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command_line);
        cmd
    }
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command_line);
        cmd
    }
}

/// Normalize an exit status to a plain integer code. A signal death on unix
/// maps to the conventional `128 + signal`.
fn exit_code(status: std::process::ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status.code().unwrap_or_else(|| 128 + status.signal().unwrap_or(0))
    }
    #[cfg(not(unix))]
    {
        status.code().unwrap_or(-1)
    }
}

/// Run a helper, capturing stdout line-by-line.
///
/// Each line is newline-stripped, then appended to `log_path` (flushed per
/// line, so a crash mid-run leaves a truncated-but-readable log) and handed
/// to `observer`. When a log path was given, the normalized exit code is
/// appended as the final log line.
pub fn run_streamed(
    command_line: &str,
    log_path: Option<&Path>,
    mut observer: Option<OutputObserver<'_>>,
) -> CommandOutcome {
    tracing::debug!(command = command_line, "run_streamed");

    let mut child = match shell_command(command_line)
        .stdout(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            tracing::warn!(command = command_line, %err, "cannot start helper");
            return CommandOutcome::launch_failure(format!("Cannot run '{}'", command_line));
        }
    };

    let mut log = log_path.and_then(|p| match std::fs::File::create(p) {
        Ok(f) => Some(f),
        Err(err) => {
            tracing::warn!(path = %p.display(), %err, "cannot open helper log");
            None
        }
    });

    let mut last_line = String::new();
    if let Some(stdout) = child.stdout.take() {
        for line in BufReader::new(stdout).lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };

            if let Some(f) = log.as_mut() {
                let _ = writeln!(f, "{}", line);
                let _ = f.flush();
            }
            if let Some(func) = observer.as_mut() {
                func(&line);
            }
            last_line = line;
        }
    }

    let code = match child.wait() {
        Ok(status) => exit_code(status),
        Err(_) => -1,
    };

    if let Some(f) = log.as_mut() {
        let _ = writeln!(f, "Exit code : {}", code);
    }

    CommandOutcome {
        last_line,
        exit_code: code,
    }
}

/// Run an enumeration helper and collect every output line, newline
/// stripped, in order. A helper that cannot start and a helper that prints
/// nothing both yield an empty list — callers treat them identically.
pub fn run_enumeration(command_line: &str) -> Vec<String> {
    tracing::debug!(command = command_line, "run_enumeration");

    let mut lines = Vec::new();
    run_streamed(command_line, None, Some(&mut |line: &str| {
        lines.push(line.to_string())
    }));
    lines
}

/// Run a helper for its exit status only.
pub fn run_script(command_line: &str) -> bool {
    tracing::info!(command = command_line, "run_script");

    match shell_command(command_line).status() {
        Ok(status) if status.success() => true,
        Ok(_) | Err(_) => {
            tracing::error!(command = command_line, "helper failed");
            false
        }
    }
}

/// Run a helper and keep only the first line it prints.
pub fn run_single_line(command_line: &str) -> Option<String> {
    run_enumeration(command_line).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observer_sees_lines_stripped_and_in_order() {
        let mut seen = Vec::new();
        let outcome = run_streamed(
            "printf 'one\\ntwo\\nthree\\n'",
            None,
            Some(&mut |line: &str| seen.push(line.to_string())),
        );
        assert_eq!(seen, vec!["one", "two", "three"]);
        assert_eq!(outcome.last_line, "three");
        assert_eq!(outcome.exit_code, 0);
    }

    #[test]
    fn empty_output_yields_empty_last_line() {
        let outcome = run_streamed("true", None, None);
        assert_eq!(outcome.last_line, "");
        assert_eq!(outcome.exit_code, 0);
    }

    #[test]
    fn nonzero_exit_code_is_reported() {
        let outcome = run_streamed("exit 7", None, None);
        assert_eq!(outcome.exit_code, 7);
    }

    #[test]
    fn log_file_gets_lines_and_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("helper.log");
        run_streamed("printf 'alpha\\nbeta\\n'", Some(&log), None);

        let contents = std::fs::read_to_string(&log).unwrap();
        assert_eq!(contents, "alpha\nbeta\nExit code : 0\n");
    }

    #[test]
    fn enumeration_collects_all_lines() {
        let lines = run_enumeration("printf 'a\\nb\\n'");
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn enumeration_collapses_failure_to_empty() {
        // A command that cannot start is indistinguishable from one that
        // printed nothing.
        assert!(run_enumeration("/nonexistent-helper-for-tests 2>/dev/null").is_empty());
        assert!(run_enumeration("true").is_empty());
    }

    #[test]
    fn script_success_follows_exit_status() {
        assert!(run_script("true"));
        assert!(!run_script("false"));
    }

    #[test]
    fn single_line_takes_first() {
        assert_eq!(run_single_line("printf 'x\\ny\\n'").as_deref(), Some("x"));
        assert_eq!(run_single_line("true"), None);
    }
}
