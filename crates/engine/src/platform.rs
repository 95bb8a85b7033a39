//! Platform implementations of the capability traits.
//!
//! - [`StdFilesystem`]: real std::fs operations
//! - [`HttpDownloader`]: HTTP transfers via reqwest on a worker thread,
//!   observed through the polled [`Transfer`] handle
//! - [`NullAudio`] / [`NullDisplay`]: no-op ownership controls for headless
//!   embeddings and tests

use crate::traits::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

// ===========================================================================
// Filesystem – wraps std::fs
// ===========================================================================

pub struct StdFilesystem;

impl FilesystemOps for StdFilesystem {
    fn read_file(&self, path: &Path) -> CapResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => {
                CapError::PermissionDenied(format!("cannot read {}: {}", path.display(), e))
            }
            _ => CapError::Io(e),
        })
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> CapResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, data).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => {
                CapError::PermissionDenied(format!("cannot write {}: {}", path.display(), e))
            }
            _ => CapError::Io(e),
        })
    }

    fn remove_file(&self, path: &Path) -> CapResult<()> {
        std::fs::remove_file(path).map_err(CapError::Io)
    }

    fn create_dir_all(&self, path: &Path) -> CapResult<()> {
        std::fs::create_dir_all(path).map_err(CapError::Io)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

// ===========================================================================
// Downloader – reqwest on a worker thread
// ===========================================================================

struct TransferState {
    status: Mutex<TransferStatus>,
    percent: AtomicU8,
}

impl TransferState {
    fn new() -> Self {
        Self {
            status: Mutex::new(TransferStatus::InProgress),
            percent: AtomicU8::new(0),
        }
    }

    fn finish(&self, ok: bool) {
        let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
        *status = if ok {
            TransferStatus::Success
        } else {
            TransferStatus::Failed
        };
        if ok {
            self.percent.store(100, Ordering::SeqCst);
        }
    }
}

struct HttpTransfer {
    state: Arc<TransferState>,
}

impl Transfer for HttpTransfer {
    fn status(&self) -> TransferStatus {
        *self.state.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn percent(&self) -> u8 {
        self.state.percent.load(Ordering::SeqCst)
    }
}

/// Real HTTP downloader. Each transfer runs on its own thread and keeps
/// running whether or not anybody polls the handle.
pub struct HttpDownloader;

impl HttpDownloader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Downloader for HttpDownloader {
    fn begin(&self, url: &str, dest: &Path) -> CapResult<Box<dyn Transfer>> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            // Downloads can be arbitrarily large; no overall deadline.
            .timeout(None)
            .build()
            .map_err(|e| CapError::Network(format!("cannot build HTTP client: {}", e)))?;

        let state = Arc::new(TransferState::new());
        let worker_state = Arc::clone(&state);
        let url = url.to_string();
        let dest: PathBuf = dest.to_path_buf();

        std::thread::spawn(move || {
            let ok = match fetch_to_file(&client, &url, &dest, &worker_state) {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(url = %url, %err, "download failed");
                    // Do not leave a truncated file behind.
                    let _ = std::fs::remove_file(&dest);
                    false
                }
            };
            worker_state.finish(ok);
        });

        Ok(Box::new(HttpTransfer { state }))
    }
}

fn fetch_to_file(
    client: &reqwest::blocking::Client,
    url: &str,
    dest: &Path,
    state: &TransferState,
) -> Result<(), String> {
    let mut resp = client
        .get(url)
        .send()
        .map_err(|e| format!("GET {}: {}", url, e))?;

    if !resp.status().is_success() {
        return Err(format!("GET {}: HTTP {}", url, resp.status()));
    }

    let total = resp.content_length().unwrap_or(0);
    let mut file =
        std::fs::File::create(dest).map_err(|e| format!("create {}: {}", dest.display(), e))?;

    let mut buf = [0u8; 16 * 1024];
    let mut done: u64 = 0;
    loop {
        let n = resp.read(&mut buf).map_err(|e| format!("read body: {}", e))?;
        if n == 0 {
            break;
        }
        std::io::Write::write_all(&mut file, &buf[..n])
            .map_err(|e| format!("write {}: {}", dest.display(), e))?;
        done += n as u64;
        if total > 0 {
            state
                .percent
                .store(((done * 100) / total).min(100) as u8, Ordering::SeqCst);
        }
    }

    Ok(())
}

// ===========================================================================
// Audio / display – no-op ownership controls
// ===========================================================================

/// Audio control for embeddings without a mixer (CLI, tests). Never panics.
pub struct NullAudio;

impl AudioControl for NullAudio {
    fn suspend(&self) {}
    fn resume(&self) {}
    fn play_ambient(&self) {}
}

/// Display control for headless embeddings.
pub struct NullDisplay;

impl DisplayControl for NullDisplay {
    fn release(&self) {}
    fn acquire(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_filesystem_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let fs = StdFilesystem;
        let file = dir.path().join("nested/dir/file.txt");

        fs.write_file(&file, b"payload").unwrap();
        assert!(fs.exists(&file));
        assert_eq!(fs.read_file(&file).unwrap(), b"payload");

        fs.remove_file(&file).unwrap();
        assert!(!fs.exists(&file));
    }

    #[test]
    fn transfer_state_transitions() {
        let state = TransferState::new();
        assert_eq!(
            *state.status.lock().unwrap(),
            TransferStatus::InProgress
        );
        state.finish(true);
        assert_eq!(*state.status.lock().unwrap(), TransferStatus::Success);
        assert_eq!(state.percent.load(Ordering::SeqCst), 100);

        let state = TransferState::new();
        state.finish(false);
        assert_eq!(*state.status.lock().unwrap(), TransferStatus::Failed);
    }
}
