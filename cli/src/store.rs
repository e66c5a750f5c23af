//! Token-file credential storage for the CLI.
//!
//! The CLI's durable storage is a single file holding the bearer token.
//! Read failures mean "no credential"; write failures are logged and the
//! credential stays usable for the current command.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use client::net::types::Credential;
use client::state::session::SessionStore;

/// Default token file name, placed under the user's config directory.
const TOKEN_FILE_NAME: &str = "token";

/// `SessionStore` backed by one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, credential: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;
        file.write_all(credential.as_bytes())
    }
}

/// `$XDG_CONFIG_HOME/blessed-belly/token`, falling back to `~/.config`, then
/// to a file in the working directory.
#[must_use]
pub fn default_token_path() -> PathBuf {
    token_path_from(|name| std::env::var_os(name).map(PathBuf::from))
}

pub(crate) fn token_path_from(lookup: impl Fn(&str) -> Option<PathBuf>) -> PathBuf {
    let config_dir = lookup("XDG_CONFIG_HOME")
        .filter(|dir| !dir.as_os_str().is_empty())
        .or_else(|| lookup("HOME").map(|home| home.join(".config")));
    match config_dir {
        Some(dir) => dir.join("blessed-belly").join(TOKEN_FILE_NAME),
        None => PathBuf::from(".bb-token"),
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<Credential> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                (!token.is_empty()).then(|| token.to_owned())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "token file unreadable");
                None
            }
        }
    }

    fn save(&self, credential: &str) {
        if let Err(err) = self.write(credential) {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to persist credential");
        }
    }

    fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => tracing::warn!(path = %self.path.display(), error = %err, "failed to remove token file"),
        }
    }
}
