//! Repository hooks (`.wt`) and the trust-on-first-use store guarding them.
//!
//! A repository may ship a `.wt` file in its main worktree listing commands to run in every
//! newly created worktree. Because the file comes from whoever controls the repository, its
//! content hash must be trusted before anything in it runs. Trusted hashes are stored per
//! absolute file path in `trusted.json` under the user's data directory.

use crate::error::AppError;

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const HOOKS_FILENAME: &str = ".wt";

/// How `.wt` commands are gated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustMode {
    /// Prompt when the file is new or changed.
    #[default]
    Tofu,
    Never,
    Always,
}

impl TrustMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tofu" => Some(TrustMode::Tofu),
            "never" => Some(TrustMode::Never),
            "always" => Some(TrustMode::Always),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct RawHooks {
    #[serde(default)]
    init_commands: Vec<String>,
}

/// Parsed `.wt` file with the hash of its exact bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoHooks {
    pub path: PathBuf,
    pub init_commands: Vec<String>,
    pub hash: String,
}

impl RepoHooks {
    /// Loads `<main_worktree>/.wt`. `Ok(None)` when there is no such file.
    pub fn load(main_worktree: &Path) -> Result<Option<Self>, AppError> {
        let path = main_worktree.join(HOOKS_FILENAME);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let text = String::from_utf8_lossy(&bytes);
        let raw: RawHooks = toml::from_str(&text)
            .map_err(|e| AppError::Parse(format!("{}: {e}", path.display())))?;
        let path = fs::canonicalize(&path).unwrap_or(path);
        Ok(Some(Self {
            path,
            init_commands: raw.init_commands,
            hash: content_hash(&bytes),
        }))
    }

    pub fn is_empty(&self) -> bool {
        self.init_commands.is_empty()
    }
}

pub fn content_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustStatus {
    Trusted,
    /// New or changed since it was last trusted.
    Untrusted,
}

/// Map of absolute `.wt` path to the hash that was trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustStore {
    path: PathBuf,
    hashes: HashMap<String, String>,
}

impl TrustStore {
    /// `$XDG_DATA_HOME/lazyworktree/trusted.json`, falling back to `~/.local/share`.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(xdg) = std::env::var_os("XDG_DATA_HOME")
            && !xdg.is_empty()
        {
            return Some(PathBuf::from(xdg).join("lazyworktree").join("trusted.json"));
        }
        dirs::home_dir().map(|h| {
            h.join(".local")
                .join("share")
                .join("lazyworktree")
                .join("trusted.json")
        })
    }

    /// Loads the store. A missing or corrupt file starts empty, so nothing is trusted.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let hashes = fs::read_to_string(&path)
            .ok()
            .and_then(|s| match serde_json::from_str(&s) {
                Ok(map) => Some(map),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "corrupt trust store");
                    None
                }
            })
            .unwrap_or_default();
        Self { path, hashes }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn check(&self, hooks: &RepoHooks) -> TrustStatus {
        match self.hashes.get(&hooks.path.to_string_lossy().into_owned()) {
            Some(h) if *h == hooks.hash => TrustStatus::Trusted,
            _ => TrustStatus::Untrusted,
        }
    }

    /// Records the current hash in memory. Call [TrustStore::save] to persist.
    pub fn trust(&mut self, hooks: &RepoHooks) {
        self.hashes
            .insert(hooks.path.to_string_lossy().into_owned(), hooks.hash.clone());
    }

    pub fn save(&self) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(&self.hashes)?;
        fs::write(&self.path, body)?;
        Ok(())
    }
}
