//! File-backed session persistence for the terminal client.
//!
//! SYSTEM CONTEXT
//! ==============
//! The browser keeps `token` and `user` in `localStorage`; here the same two
//! string entries live in one JSON object on disk so a login survives
//! between invocations. The file is re-read on every access and removed once
//! it holds no entries.

#[cfg(test)]
#[path = "session_file_test.rs"]
mod session_file_test;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use client::config::LOGIN_PATH;
use client::state::session::{Navigator, SessionStore};

/// `SessionStore` over a JSON file.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> BTreeMap<String, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "session file unreadable");
                return BTreeMap::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "session file is not a JSON object");
            BTreeMap::new()
        })
    }

    fn save(&self, entries: &BTreeMap<String, String>) {
        let result = if entries.is_empty() {
            match fs::remove_file(&self.path) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                other => other,
            }
        } else {
            serde_json::to_string_pretty(entries)
                .map_err(io::Error::other)
                .and_then(|raw| fs::write(&self.path, raw))
        };
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), error = %e, "session file not written");
        }
    }
}

impl SessionStore for FileStore {
    fn read(&self, key: &str) -> Option<String> {
        self.load().remove(key)
    }

    fn write(&mut self, key: &str, value: &str) {
        let mut entries = self.load();
        entries.insert(key.to_owned(), value.to_owned());
        self.save(&entries);
    }

    fn remove(&mut self, key: &str) {
        let mut entries = self.load();
        if entries.remove(key).is_some() {
            self.save(&entries);
        }
    }
}

/// Terminal stand-in for the browser's hard redirect: report the ended
/// session on stderr. Each invocation is a fresh process, so there is no
/// in-memory state left to discard.
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn current_path(&self) -> String {
        "cli".to_owned()
    }

    fn notify(&self, notice: &str) {
        eprintln!("{notice}");
    }

    fn hard_redirect(&self, path: &str) {
        if path == LOGIN_PATH {
            tracing::info!("session cleared; run `blog-cli login` to sign in again");
        } else {
            tracing::info!(path, "session ended");
        }
    }
}
