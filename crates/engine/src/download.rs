//! Download monitor: cooperative polling over an in-flight transfer.

use crate::process::OutputObserver;
use crate::traits::{Downloader, Transfer, TransferStatus};
use std::path::Path;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Block until `transfer` reaches a terminal status.
pub fn wait(transfer: &dyn Transfer) -> bool {
    while transfer.status() == TransferStatus::InProgress {
        std::thread::sleep(POLL_INTERVAL);
    }
    transfer.status() == TransferStatus::Success
}

/// Poll `transfer` until it terminates, relaying a formatted percentage
/// message to `observer` on each pass. Success only on a `Success` terminal
/// status.
pub fn monitor(
    transfer: &dyn Transfer,
    label: &str,
    mut observer: Option<OutputObserver<'_>>,
) -> bool {
    if let Some(func) = observer.as_mut() {
        func(&format!("Downloading {}", label));
    }

    while transfer.status() == TransferStatus::InProgress {
        if let Some(func) = observer.as_mut() {
            func(&format!("Downloading {} >>> {} %", label, transfer.percent()));
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    transfer.status() == TransferStatus::Success
}

/// Start a transfer and monitor it to completion.
pub fn download_file(
    downloader: &dyn Downloader,
    url: &str,
    dest: &Path,
    label: &str,
    observer: Option<OutputObserver<'_>>,
) -> bool {
    match downloader.begin(url, dest) {
        Ok(transfer) => monitor(transfer.as_ref(), label, observer),
        Err(err) => {
            tracing::warn!(url, %err, "could not start download");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fake transfer that walks through a fixed progression of states.
    struct ScriptedTransfer {
        polls: AtomicU32,
        finish_after: u32,
        outcome: TransferStatus,
    }

    impl ScriptedTransfer {
        fn new(finish_after: u32, outcome: TransferStatus) -> Self {
            Self {
                polls: AtomicU32::new(0),
                finish_after,
                outcome,
            }
        }
    }

    impl Transfer for ScriptedTransfer {
        fn status(&self) -> TransferStatus {
            if self.polls.fetch_add(1, Ordering::SeqCst) >= self.finish_after {
                self.outcome
            } else {
                TransferStatus::InProgress
            }
        }

        fn percent(&self) -> u8 {
            (self.polls.load(Ordering::SeqCst).min(10) * 10) as u8
        }
    }

    #[test]
    fn monitor_emits_progress_then_succeeds() {
        let transfer = ScriptedTransfer::new(4, TransferStatus::Success);
        let mut messages = Vec::new();
        let ok = monitor(
            &transfer,
            "theme pack",
            Some(&mut |line: &str| messages.push(line.to_string())),
        );
        assert!(ok);
        assert_eq!(messages[0], "Downloading theme pack");
        assert!(messages[1].starts_with("Downloading theme pack >>> "));
        assert!(messages[1].ends_with(" %"));
    }

    #[test]
    fn monitor_reports_failure() {
        let transfer = ScriptedTransfer::new(1, TransferStatus::Failed);
        assert!(!monitor(&transfer, "x", None));
    }

    #[test]
    fn wait_blocks_until_terminal() {
        let transfer = ScriptedTransfer::new(3, TransferStatus::Success);
        assert!(wait(&transfer));
        let transfer = ScriptedTransfer::new(0, TransferStatus::Failed);
        assert!(!wait(&transfer));
    }
}
