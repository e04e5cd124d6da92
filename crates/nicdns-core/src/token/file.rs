// # File Token Store
//
// Persists the most recent token to a JSON file so a restarted process can
// resume with the refresh token instead of the password grant.
//
// ## Crash Recovery
//
// - Atomic writes: the token is written to `<file>.tmp`, then renamed
// - Backup: the previous file is copied to `<file>.backup` before each write
// - Recovery: a file that fails to parse is replaced by its backup
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "saved_at": "2025-01-09T12:00:00Z",
//   "token": {
//     "access_token": "...",
//     "token_type": "Bearer",
//     "refresh_token": "...",
//     "expires_in": 14400,
//     "expires_at": "2025-01-09T16:00:00Z"
//   }
// }
// ```
//
// The file holds live credentials; keep it readable by the owning user only.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Token, TokenUpdater};
use crate::error::{Error, Result};

/// Token file format version
const TOKEN_FILE_VERSION: &str = "1.0";

#[derive(Debug, Serialize, Deserialize)]
struct TokenFileFormat {
    version: String,
    saved_at: DateTime<Utc>,
    token: Token,
}

/// File-based token updater
///
/// # Example
///
/// ```rust,no_run
/// use nicdns_core::token::FileTokenStore;
///
/// # fn main() -> nicdns_core::Result<()> {
/// let store = FileTokenStore::new("/var/lib/nicdns/token.json")?;
///
/// // Token from a previous run, if any
/// let token = store.load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store at `path`, creating parent directories if needed
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::config(format!(
                        "Failed to create token directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted token
    ///
    /// Returns `None` when no token was saved yet. A corrupted file is
    /// recovered from its backup; when the backup is unusable too the store
    /// behaves as empty.
    pub fn load(&self) -> Result<Option<Token>> {
        match Self::read_file(&self.path) {
            Ok(token) => {
                tracing::debug!("Loaded token from {}", self.path.display());
                Ok(token)
            }
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "Token file {} appears corrupted: {}. Attempting recovery from backup.",
                    self.path.display(),
                    e
                );
                self.recover()
            }
            Err(e) => Err(e),
        }
    }

    /// Persist `token` atomically, keeping the previous file as backup
    pub fn save(&self, token: &Token) -> Result<()> {
        let contents = TokenFileFormat {
            version: TOKEN_FILE_VERSION.to_string(),
            saved_at: Utc::now(),
            token: token.clone(),
        };
        let json = serde_json::to_string_pretty(&contents)?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }

        if self.path.exists() {
            if let Err(e) = fs::copy(&self.path, self.backup_path()) {
                tracing::warn!("Failed to create token backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path)?;

        tracing::trace!("Token written to {}", self.path.display());
        Ok(())
    }

    fn recover(&self) -> Result<Option<Token>> {
        let backup_path = self.backup_path();
        if !backup_path.exists() {
            tracing::warn!("No token backup found. Starting without a token.");
            return Ok(None);
        }

        match Self::read_file(&backup_path) {
            Ok(token) => {
                tracing::info!("Recovered token from backup");
                if let Err(e) = fs::copy(&backup_path, &self.path) {
                    tracing::error!("Failed to restore token file from backup: {}", e);
                }
                Ok(token)
            }
            Err(e) => {
                tracing::error!("Token backup also unusable: {}. Starting without a token.", e);
                Ok(None)
            }
        }
    }

    fn read_file(path: &Path) -> Result<Option<Token>> {
        if !path.exists() {
            tracing::debug!("Token file does not exist: {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        let file: TokenFileFormat = serde_json::from_str(&content)?;

        if file.version != TOKEN_FILE_VERSION {
            tracing::warn!(
                "Token file version mismatch: expected {}, got {}. Attempting to load anyway.",
                TOKEN_FILE_VERSION,
                file.version
            );
        }

        Ok(Some(file.token))
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }

    fn backup_path(&self) -> PathBuf {
        self.path.with_extension("backup")
    }
}

impl TokenUpdater for FileTokenStore {
    fn token_updated(&self, token: &Token) {
        if let Err(e) = self.save(token) {
            tracing::warn!("Failed to persist token to {}: {}", self.path.display(), e);
        }
    }
}
