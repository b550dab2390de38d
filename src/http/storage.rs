// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Cookie jar persistence
//!
//! A cookie session id selects one jar. [`FileCookieStorage`] keeps each jar
//! in `<dir>/ck_<session>.txt` (Netscape format, `cookies/` by default);
//! [`MemoryCookieStorage`] keeps the same text in memory for tests.
//!
//! Calls sharing a session id concurrently are not coordinated: the last
//! call to finish wins and cookies set by the other call may be lost.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::cookie::CookieJar;
use crate::error::{Result, ValidationError};

/// Default directory for cookie jar files, relative to the working directory
pub const DEFAULT_COOKIE_DIR: &str = "cookies";

/// Read/write access to cookie jars keyed by session id
#[async_trait]
pub trait CookieStorage: Send + Sync {
    /// Make the storage ready for `session` (e.g. create the directory)
    async fn prepare(&self, session: &str) -> Result<()>;

    /// Load the jar for `session`; a missing jar is an empty jar
    async fn load(&self, session: &str) -> Result<CookieJar>;

    /// Persist the jar for `session`
    async fn save(&self, session: &str, jar: &CookieJar) -> Result<()>;
}

/// Reject session ids that would escape the cookie directory
pub fn validate_session_id(session: &str) -> std::result::Result<(), ValidationError> {
    if session.contains(['/', '\\', '\0']) || session.contains("..") {
        return Err(ValidationError::InvalidCookieSession(session.to_string()));
    }
    Ok(())
}

/// Jar files on disk
#[derive(Debug, Clone)]
pub struct FileCookieStorage {
    dir: PathBuf,
}

impl Default for FileCookieStorage {
    fn default() -> Self {
        Self::new(DEFAULT_COOKIE_DIR)
    }
}

impl FileCookieStorage {
    /// Create a storage rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the jar files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Jar file path for a session
    pub fn path_for(&self, session: &str) -> PathBuf {
        self.dir.join(format!("ck_{}.txt", session))
    }
}

#[async_trait]
impl CookieStorage for FileCookieStorage {
    async fn prepare(&self, _session: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    async fn load(&self, session: &str) -> Result<CookieJar> {
        let path = self.path_for(session);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(CookieJar::from_netscape(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CookieJar::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, session: &str, jar: &CookieJar) -> Result<()> {
        tokio::fs::write(self.path_for(session), jar.to_netscape()).await?;
        Ok(())
    }
}

/// In-memory jar texts
#[derive(Debug, Default)]
pub struct MemoryCookieStorage {
    jars: Mutex<HashMap<String, String>>,
}

impl MemoryCookieStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw jar text for a session, if saved
    pub fn raw(&self, session: &str) -> Option<String> {
        self.jars.lock().get(session).cloned()
    }

    /// Number of saved jars
    pub fn len(&self) -> usize {
        self.jars.lock().len()
    }

    /// Check if nothing was saved
    pub fn is_empty(&self) -> bool {
        self.jars.lock().is_empty()
    }
}

#[async_trait]
impl CookieStorage for MemoryCookieStorage {
    async fn prepare(&self, _session: &str) -> Result<()> {
        Ok(())
    }

    async fn load(&self, session: &str) -> Result<CookieJar> {
        Ok(self
            .raw(session)
            .map(|text| CookieJar::from_netscape(&text))
            .unwrap_or_default())
    }

    async fn save(&self, session: &str, jar: &CookieJar) -> Result<()> {
        self.jars.lock().insert(session.to_string(), jar.to_netscape());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Cookie;

    #[test]
    fn test_session_id_validation() {
        assert!(validate_session_id("s1").is_ok());
        assert!(validate_session_id("user-42_a").is_ok());
        assert!(validate_session_id("../etc").is_err());
        assert!(validate_session_id("a/b").is_err());
        assert!(validate_session_id("a\\b").is_err());
    }

    #[test]
    fn test_default_path() {
        let storage = FileCookieStorage::default();
        assert_eq!(storage.path_for("s1"), PathBuf::from("cookies/ck_s1.txt"));
    }

    #[tokio::test]
    async fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileCookieStorage::new(dir.path().join("cookies"));

        storage.prepare("s1").await.unwrap();
        assert!(storage.dir().is_dir());

        let jar = storage.load("s1").await.unwrap();
        assert!(jar.is_empty());

        jar.add(Cookie::new("sid", "abc").domain("example.com"));
        storage.save("s1", &jar).await.unwrap();
        assert!(storage.path_for("s1").is_file());

        let loaded = storage.load("s1").await.unwrap();
        assert_eq!(loaded.all(), jar.all());
    }

    #[tokio::test]
    async fn test_memory_storage_round_trip() {
        let storage = MemoryCookieStorage::new();
        let jar = CookieJar::new();
        jar.add(Cookie::new("a", "1").domain("example.com"));
        storage.save("s1", &jar).await.unwrap();

        assert_eq!(storage.len(), 1);
        assert!(storage.raw("s1").unwrap().contains("\ta\t1"));
        assert_eq!(storage.load("s1").await.unwrap().len(), 1);
        assert!(storage.load("other").await.unwrap().is_empty());
    }
}
