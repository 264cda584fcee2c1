//! Credential storage.
//!
//! Access token, refresh token and the cached user live behind the
//! [`CredentialStore`] trait so the HTTP client never touches ambient global
//! state. Every read-modify-write happens under the store's own lock.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{ClientError, Result};
use crate::models::User;

/// How long a persisted refresh token and cached user stay readable.
pub const REFRESH_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<User>,
}

impl Credentials {
    pub fn new(access_token: String, refresh_token: String, user: User) -> Self {
        Self {
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
            user: Some(user),
        }
    }

    /// A non-empty access token is present.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Credentials>;

    fn save(&self, credentials: &Credentials) -> Result<()>;

    /// Replace the access token, keeping everything else.
    fn set_access_token(&self, token: &str) -> Result<()>;

    /// Replace the cached user, keeping the tokens.
    fn set_user(&self, user: &User) -> Result<()>;

    fn clear(&self) -> Result<()>;

    fn access_token(&self) -> Result<Option<String>> {
        Ok(self.load()?.access_token.filter(|t| !t.is_empty()))
    }

    fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self.load()?.refresh_token.filter(|t| !t.is_empty()))
    }
}

fn poisoned<T>(_: T) -> ClientError {
    ClientError::Storage("credential store lock poisoned".into())
}

// =============================================================================
// In-memory store
// =============================================================================

/// Lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<Credentials>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            inner: Mutex::new(credentials),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Credentials> {
        Ok(self.inner.lock().map_err(poisoned)?.clone())
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        *self.inner.lock().map_err(poisoned)? = credentials.clone();
        Ok(())
    }

    fn set_access_token(&self, token: &str) -> Result<()> {
        self.inner.lock().map_err(poisoned)?.access_token = Some(token.to_string());
        Ok(())
    }

    fn set_user(&self, user: &User) -> Result<()> {
        self.inner.lock().map_err(poisoned)?.user = Some(user.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.inner.lock().map_err(poisoned)? = Credentials::default();
        Ok(())
    }
}

// =============================================================================
// File-backed store
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Expiring<T> {
    value: T,
    expires_at: DateTime<Utc>,
}

impl<T: Clone> Expiring<T> {
    fn new(value: T, now: DateTime<Utc>) -> Self {
        Self {
            value,
            expires_at: now + Duration::days(REFRESH_TTL_DAYS),
        }
    }

    fn live(&self, now: DateTime<Utc>) -> Option<T> {
        (now < self.expires_at).then(|| self.value.clone())
    }
}

/// On-disk layout. The access token has no expiry of its own; the refresh
/// token and the cached user expire after [`REFRESH_TTL_DAYS`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Persisted {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<Expiring<String>>,
    #[serde(default)]
    user: Option<Expiring<User>>,
}

impl Persisted {
    fn from_credentials(credentials: &Credentials, now: DateTime<Utc>) -> Self {
        Self {
            access_token: credentials.access_token.clone(),
            refresh_token: credentials
                .refresh_token
                .clone()
                .map(|t| Expiring::new(t, now)),
            user: credentials.user.clone().map(|u| Expiring::new(u, now)),
        }
    }

    fn to_credentials(&self, now: DateTime<Utc>) -> Credentials {
        Credentials {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.as_ref().and_then(|e| e.live(now)),
            user: self.user.as_ref().and_then(|e| e.live(now)),
        }
    }
}

/// JSON file with an in-memory cache in front of it.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    cache: Mutex<Option<Persisted>>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Result<Persisted> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(persisted) => Ok(persisted),
                Err(error) => {
                    tracing::warn!(path = %self.path.display(), %error, "Discarding corrupt credentials file");
                    Ok(Persisted::default())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Persisted::default()),
            Err(e) => Err(ClientError::Storage(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn write_file(&self, persisted: &Persisted) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::Storage(format!("failed to create {}: {}", parent.display(), e)))?;
        }

        let contents = serde_json::to_vec_pretty(persisted)
            .map_err(|e| ClientError::Storage(e.to_string()))?;

        write_private(&self.path, &contents)
            .map_err(|e| ClientError::Storage(format!("failed to write {}: {}", self.path.display(), e)))
    }

    /// Run `f` against the current state under the lock, persisting the result.
    /// The cache only takes the new state once it is on disk.
    fn update(&self, f: impl FnOnce(&mut Persisted)) -> Result<()> {
        let mut cache = self.cache.lock().map_err(poisoned)?;
        let mut persisted = match cache.as_ref() {
            Some(p) => p.clone(),
            None => self.read_file()?,
        };
        f(&mut persisted);
        self.write_file(&persisted)?;
        *cache = Some(persisted);
        Ok(())
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Credentials> {
        let mut cache = self.cache.lock().map_err(poisoned)?;
        if cache.is_none() {
            *cache = Some(self.read_file()?);
        }
        Ok(cache
            .as_ref()
            .map(|p| p.to_credentials(Utc::now()))
            .unwrap_or_default())
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        let fresh = Persisted::from_credentials(credentials, Utc::now());
        self.update(|p| *p = fresh)
    }

    fn set_access_token(&self, token: &str) -> Result<()> {
        self.update(|p| p.access_token = Some(token.to_string()))
    }

    fn set_user(&self, user: &User) -> Result<()> {
        let now = Utc::now();
        self.update(|p| p.user = Some(Expiring::new(user.clone(), now)))
    }

    fn clear(&self) -> Result<()> {
        let mut cache = self.cache.lock().map_err(poisoned)?;
        *cache = Some(Persisted::default());
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Storage(format!(
                "failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn test_user() -> User {
        serde_json::from_value(serde_json::json!({
            "id": 1, "email": "ada@example.org", "role": "student"
        }))
        .unwrap()
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryCredentialStore::new();
        assert!(!store.load().unwrap().is_authenticated());

        store
            .save(&Credentials::new("a1".into(), "r1".into(), test_user()))
            .unwrap();
        store.set_access_token("a2").unwrap();

        let creds = store.load().unwrap();
        assert_eq!(creds.access_token.as_deref(), Some("a2"));
        assert_eq!(creds.refresh_token.as_deref(), Some("r1"));
        assert_eq!(creds.user.unwrap().role, UserRole::Student);

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), Credentials::default());
    }

    #[test]
    fn test_empty_token_is_not_authenticated() {
        let store = MemoryCredentialStore::with_credentials(Credentials {
            access_token: Some(String::new()),
            ..Default::default()
        });
        assert!(!store.load().unwrap().is_authenticated());
        assert_eq!(store.access_token().unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.json");

        let store = FileCredentialStore::new(&path);
        store
            .save(&Credentials::new("a1".into(), "r1".into(), test_user()))
            .unwrap();
        store.set_access_token("a2").unwrap();

        let reopened = FileCredentialStore::new(&path);
        let creds = reopened.load().unwrap();
        assert_eq!(creds.access_token.as_deref(), Some("a2"));
        assert_eq!(creds.refresh_token.as_deref(), Some("r1"));

        reopened.clear().unwrap();
        assert!(!path.exists());
        assert!(!FileCredentialStore::new(&path).load().unwrap().is_authenticated());
    }

    #[test]
    fn test_failed_write_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let store = FileCredentialStore::new(&path);
        store
            .save(&Credentials::new("a1".into(), "r1".into(), test_user()))
            .unwrap();

        // A directory in place of the file makes every write fail.
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(matches!(store.set_access_token("a2"), Err(ClientError::Storage(_))));
        assert_eq!(store.access_token().unwrap().as_deref(), Some("a1"));
    }

    #[test]
    fn test_file_store_drops_expired_refresh_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let stale = Utc::now() - Duration::days(REFRESH_TTL_DAYS + 1);

        let persisted = Persisted::from_credentials(
            &Credentials::new("a1".into(), "r1".into(), test_user()),
            stale,
        );
        std::fs::write(&path, serde_json::to_vec(&persisted).unwrap()).unwrap();

        let creds = FileCredentialStore::new(&path).load().unwrap();
        assert_eq!(creds.access_token.as_deref(), Some("a1"));
        assert_eq!(creds.refresh_token, None);
        assert_eq!(creds.user, None);
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "{not json").unwrap();

        let creds = FileCredentialStore::new(&path).load().unwrap();
        assert_eq!(creds, Credentials::default());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        FileCredentialStore::new(&path)
            .save(&Credentials::new("a".into(), "r".into(), test_user()))
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
