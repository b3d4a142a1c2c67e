//! Naming, placement, and retention of generated profile files.
//!
//! Generated profiles live in a per-user cache directory and are owned
//! by the filesystem: nothing is tracked in memory across calls. Each
//! apply gets a fresh timestamped filename so the display pipeline can
//! never serve a cached profile for the display, and old files are
//! pruned opportunistically once superseded.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::fs;

/// Filename prefix of every generated profile.
pub const PROFILE_PREFIX: &str = "vibrance_";

/// Filename extension of every generated profile.
pub const PROFILE_EXTENSION: &str = "icc";

/// Generated profiles kept by [ProfileStore::prune] by default.
pub const DEFAULT_KEEP: usize = 2;

/// The directory of generated profiles for one user.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
    keep: usize,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>, keep: usize) -> ProfileStore {
        ProfileStore {
            dir: dir.into(),
            keep,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Allocates a fresh output path and its uniqueness token
    /// (the current time at millisecond resolution).
    pub fn next_path(&self) -> (PathBuf, i64) {
        let token = chrono::Utc::now().timestamp_millis();
        let path = self
            .dir
            .join(format!("{PROFILE_PREFIX}{token}.{PROFILE_EXTENSION}"));
        (path, token)
    }

    /// Deletes all but the newest `keep` generated profiles.
    ///
    /// Best-effort: per-file failures are logged and skipped, and a
    /// deletion lost to a concurrent reader is fine. Never surfaces an
    /// error; callers run this only after a successful apply.
    pub async fn prune(&self) {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("could not list {}: {}", self.dir.display(), e);
                return;
            }
        };

        let mut generated: Vec<(PathBuf, SystemTime)> = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("could not list {}: {}", self.dir.display(), e);
                    return;
                }
            };

            let name = entry.file_name();
            if !is_generated(&name.to_string_lossy()) {
                continue;
            }

            match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => generated.push((entry.path(), modified)),
                Err(e) => {
                    tracing::warn!("could not stat {}: {}", entry.path().display(), e);
                }
            }
        }

        if generated.len() <= self.keep {
            return;
        }

        // Oldest first; everything before the retained tail goes.
        generated.sort_by_key(|(_, modified)| *modified);
        let stale = generated.len() - self.keep;
        for (path, _) in &generated[..stale] {
            match fs::remove_file(path).await {
                Ok(()) => tracing::debug!("pruned {}", path.display()),
                Err(e) => tracing::warn!("could not prune {}: {}", path.display(), e),
            }
        }
    }
}

/// Returns true for filenames produced by [ProfileStore::next_path].
fn is_generated(name: &str) -> bool {
    name.strip_prefix(PROFILE_PREFIX)
        .and_then(|rest| rest.strip_suffix(&format!(".{PROFILE_EXTENSION}")))
        .is_some_and(|token| !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()))
}

/// Default per-user cache directory for generated profiles.
pub fn default_cache_dir() -> PathBuf {
    std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join("vibrance")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str, keep: usize) -> ProfileStore {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        ProfileStore::new(dir, keep)
    }

    fn write_generated(store: &ProfileStore, token: u64) -> PathBuf {
        let path = store
            .dir()
            .join(format!("{PROFILE_PREFIX}{token}.{PROFILE_EXTENSION}"));
        std::fs::write(&path, b"profile").unwrap();
        // Distinct modification times, oldest first.
        std::thread::sleep(std::time::Duration::from_millis(5));
        path
    }

    #[test]
    fn recognizes_generated_filenames() {
        assert!(is_generated("vibrance_1700000000000.icc"));
        assert!(!is_generated("vibrance_.icc"));
        assert!(!is_generated("vibrance_backup.icc"));
        assert!(!is_generated("other_1700000000000.icc"));
        assert!(!is_generated("vibrance_1700000000000.icm"));
    }

    #[test]
    fn next_path_embeds_a_millisecond_token() {
        let store = ProfileStore::new("/tmp", DEFAULT_KEEP);
        let (path, token) = store.next_path();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();

        assert!(is_generated(&name));
        assert!(name.contains(&token.to_string()));
    }

    #[tokio::test]
    async fn prune_keeps_the_two_newest() {
        let store = temp_store("vibrance_store_prune", 2);
        let mut paths = Vec::new();
        for token in 1..=5u64 {
            paths.push(write_generated(&store, token));
        }

        store.prune().await;

        assert!(!paths[0].exists());
        assert!(!paths[1].exists());
        assert!(!paths[2].exists());
        assert!(paths[3].exists());
        assert!(paths[4].exists());

        let _ = std::fs::remove_dir_all(store.dir());
    }

    #[tokio::test]
    async fn prune_leaves_a_single_file_untouched() {
        let store = temp_store("vibrance_store_single", 2);
        let path = write_generated(&store, 1);

        store.prune().await;
        assert!(path.exists());

        let _ = std::fs::remove_dir_all(store.dir());
    }

    #[tokio::test]
    async fn prune_ignores_foreign_files() {
        let store = temp_store("vibrance_store_foreign", 0);
        let foreign = store.dir().join("calibration-notes.txt");
        std::fs::write(&foreign, b"keep me").unwrap();
        write_generated(&store, 1);

        store.prune().await;
        assert!(foreign.exists());

        let _ = std::fs::remove_dir_all(store.dir());
    }

    #[tokio::test]
    async fn prune_tolerates_a_missing_directory() {
        let store = ProfileStore::new("/nonexistent/vibrance", 2);
        // Must not panic or error.
        store.prune().await;
    }
}
