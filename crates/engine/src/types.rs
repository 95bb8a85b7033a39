use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Command execution results
// ---------------------------------------------------------------------------

/// Outcome of one streamed helper invocation: the last line the helper
/// printed (empty if it printed nothing) and its normalized exit code.
///
/// A helper that could not be started at all is reported as a short
/// human-readable reason with exit code `-1` — a normal value, never an
/// error path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub last_line: String,
    pub exit_code: i32,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Distinguished "could not start the helper" outcome.
    pub fn launch_failure(reason: impl Into<String>) -> Self {
        Self {
            last_line: reason.into(),
            exit_code: -1,
        }
    }
}

// ---------------------------------------------------------------------------
// Firmware report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirmwareFile {
    pub status: String,
    pub checksum: String,
    pub path: String,
}

/// One "system" group of a firmware scan report, named by the header line
/// that opened it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirmwareReport {
    pub system: String,
    pub files: Vec<FirmwareFile>,
}

// ---------------------------------------------------------------------------
// Achievement profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AchievementGame {
    pub name: String,
    pub achievements: String,
    pub points: String,
    pub last_played: String,
    /// Local path of the cached badge image, if it could be fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

/// A player profile as reported by the achievements helper.
///
/// Either an error profile (`error` set, everything else unpopulated) or a
/// data profile (`error` unset) — never both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AchievementProfile {
    pub username: String,
    pub total_points: String,
    pub rank: String,
    pub registered: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub games: Vec<AchievementGame>,
}

impl AchievementProfile {
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

// ---------------------------------------------------------------------------
// Foreground handoff
// ---------------------------------------------------------------------------

/// Tagged result of a foreground handoff. Reboot/shutdown requests are
/// signaled back to the caller, never performed by this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffOutcome {
    Completed { exit_code: i32 },
    RebootRequested,
    ShutdownRequested,
}

impl HandoffOutcome {
    /// A handoff counts as successful when the program exited cleanly or
    /// asked for a reboot/shutdown (both are deliberate user actions).
    pub fn succeeded(&self) -> bool {
        !matches!(self, HandoffOutcome::Completed { exit_code } if *exit_code != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_failure_is_minus_one() {
        let o = CommandOutcome::launch_failure("Cannot start helper");
        assert_eq!(o.exit_code, -1);
        assert!(!o.success());
    }

    #[test]
    fn error_profile_is_exclusive() {
        let p = AchievementProfile::from_error("no network");
        assert!(p.is_error());
        assert!(p.games.is_empty());
        assert!(p.username.is_empty());
    }

    #[test]
    fn handoff_success_mapping() {
        assert!(HandoffOutcome::Completed { exit_code: 0 }.succeeded());
        assert!(!HandoffOutcome::Completed { exit_code: 3 }.succeeded());
        assert!(HandoffOutcome::RebootRequested.succeeded());
        assert!(HandoffOutcome::ShutdownRequested.succeeded());
    }
}
