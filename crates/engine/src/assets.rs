//! Local cache of remote images referenced by structured reports, keyed by
//! the remote file name.

use crate::download;
use crate::traits::{Downloader, FilesystemOps};
use std::path::PathBuf;

pub struct AssetCache<'a> {
    dir: PathBuf,
    fs: &'a dyn FilesystemOps,
    downloader: &'a dyn Downloader,
}

impl<'a> AssetCache<'a> {
    pub fn new(dir: impl Into<PathBuf>, fs: &'a dyn FilesystemOps, downloader: &'a dyn Downloader) -> Self {
        Self {
            dir: dir.into(),
            fs,
            downloader,
        }
    }

    /// Make sure the asset behind `remote_url` exists locally and return its
    /// path. An already-present file is returned as-is without any freshness
    /// check; a fetch failure yields `None`, never an error.
    pub fn ensure_local(&self, remote_url: &str) -> Option<PathBuf> {
        let name = remote_file_name(remote_url)?;

        if !self.fs.exists(&self.dir) {
            if let Err(err) = self.fs.create_dir_all(&self.dir) {
                tracing::warn!(dir = %self.dir.display(), %err, "cannot create asset cache dir");
                return None;
            }
        }

        let local = self.dir.join(name);
        if self.fs.exists(&local) {
            return Some(local);
        }

        match self.downloader.begin(remote_url, &local) {
            Ok(transfer) => {
                if !download::wait(transfer.as_ref()) {
                    tracing::warn!(url = remote_url, "asset download failed");
                    return None;
                }
            }
            Err(err) => {
                tracing::warn!(url = remote_url, %err, "asset download could not start");
                return None;
            }
        }

        // Success alone is not enough; only trust what landed on disk.
        self.fs.exists(&local).then_some(local)
    }
}

/// Final path segment of a URL, ignoring any query string.
fn remote_file_name(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next().unwrap_or("");
    (!name.is_empty() && !name.contains(':')).then_some(name)
}
