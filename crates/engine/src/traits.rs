use std::path::Path;

/// Result type for trait operations that may be unsupported.
pub type CapResult<T> = Result<T, CapError>;

#[derive(Debug, thiserror::Error)]
pub enum CapError {
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("dependency missing: {0}")]
    DependencyMissing(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    Other(String),
}

// ---------------------------------------------------------------------------
// Filesystem operations
// ---------------------------------------------------------------------------

pub trait FilesystemOps: Send + Sync {
    fn read_file(&self, path: &Path) -> CapResult<Vec<u8>>;
    fn write_file(&self, path: &Path, data: &[u8]) -> CapResult<()>;
    fn remove_file(&self, path: &Path) -> CapResult<()>;
    fn create_dir_all(&self, path: &Path) -> CapResult<()>;
    fn exists(&self, path: &Path) -> bool;
}

// ---------------------------------------------------------------------------
// Download operations
// ---------------------------------------------------------------------------

/// Terminal and non-terminal states of an in-flight transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    InProgress,
    Success,
    Failed,
}

/// Handle onto an in-flight transfer. The worker runs on its own thread;
/// callers observe it exclusively through polling.
pub trait Transfer: Send + Sync {
    fn status(&self) -> TransferStatus;
    fn percent(&self) -> u8;
}

pub trait Downloader: Send + Sync {
    /// Start fetching `url` into `dest`. The transfer keeps running whether
    /// or not the returned handle is polled.
    fn begin(&self, url: &str, dest: &Path) -> CapResult<Box<dyn Transfer>>;
}

// ---------------------------------------------------------------------------
// Audio / display ownership
// ---------------------------------------------------------------------------

/// Control over the application's audio playback and volume ownership,
/// surrendered around foreground-stealing external programs.
pub trait AudioControl: Send + Sync {
    fn suspend(&self);
    fn resume(&self);
    /// Kick off a fresh ambient playback selection after a handoff.
    fn play_ambient(&self);
}

/// Control over the application's display and input ownership.
pub trait DisplayControl: Send + Sync {
    fn release(&self);
    fn acquire(&self);
}
