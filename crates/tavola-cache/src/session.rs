//! Session storage on top of the key-value cache.
//!
//! Each session value is stored under `<namespace>:<session id>` wrapped in a
//! [`SessionData`] envelope carrying a write version and timestamps.

use crate::{Cache, CacheError};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;

/// Namespace used when none is given.
pub const DEFAULT_NAMESPACE: &str = "session";

/// A unique session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new session ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random session ID.
    pub fn generate() -> Self {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        use rand::Rng;

        let bytes: [u8; 18] = rand::thread_rng().gen();
        Self(format!("sess_{}", URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Get the session ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Session data stored in the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData<T> {
    /// The session ID.
    pub id: SessionId,
    /// User-defined session data.
    pub data: T,
    /// Incremented on every write.
    pub version: u64,
    /// When the session was first written (Unix timestamp).
    pub created_at: u64,
    /// When the session was last written (Unix timestamp).
    pub last_accessed: u64,
}

/// Typed session storage.
///
/// # Example
///
/// ```rust
/// use tavola_cache::{Cache, Session, SessionId};
///
/// let session = Session::<Vec<String>>::with_namespace(Cache::open_default().unwrap(), "tokens");
/// let id = SessionId::from("abc123");
/// session.set(&id, &vec!["t1".to_string()]).unwrap();
/// assert_eq!(session.get(&id).unwrap(), Some(vec!["t1".to_string()]));
/// ```
#[derive(Debug, Clone)]
pub struct Session<T> {
    cache: Cache,
    namespace: String,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Session<T>
where
    T: Serialize + DeserializeOwned + Default + Clone,
{
    /// Create a session manager over a fresh in-memory store.
    pub fn new() -> Result<Self, CacheError> {
        Ok(Self::with_namespace(Cache::open_default()?, DEFAULT_NAMESPACE))
    }

    /// Create a session manager over an existing cache.
    pub fn with_namespace(cache: Cache, namespace: impl Into<String>) -> Self {
        Self {
            cache,
            namespace: namespace.into(),
            _phantom: std::marker::PhantomData,
        }
    }

    /// The key prefix this session writes under.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Get session data, or create a new session if it doesn't exist.
    pub fn get_or_create(&self, id: &SessionId) -> Result<T, CacheError> {
        match self.get_versioned(id)? {
            Some(session_data) => Ok(session_data.data),
            None => {
                let data = T::default();
                self.set(id, &data)?;
                Ok(data)
            }
        }
    }

    /// Get session data if it exists.
    pub fn get(&self, id: &SessionId) -> Result<Option<T>, CacheError> {
        Ok(self.get_versioned(id)?.map(|s| s.data))
    }

    /// Get full session data including version.
    pub fn get_versioned(&self, id: &SessionId) -> Result<Option<SessionData<T>>, CacheError> {
        self.cache.get::<SessionData<T>>(&self.session_key(id))
    }

    /// Write session data, bumping the version.
    ///
    /// A stored value that no longer decodes is overwritten and the version
    /// starts again at 1.
    pub fn set(&self, id: &SessionId, data: &T) -> Result<u64, CacheError> {
        let key = self.session_key(id);
        let now = current_timestamp();
        let previous = match self.cache.get::<SessionData<T>>(&key) {
            Ok(previous) => previous,
            Err(CacheError::SerializeError(e)) => {
                warn!(key = %key, error = %e, "overwriting undecodable session");
                None
            }
            Err(e) => return Err(e),
        };
        let (version, created_at) = previous
            .map(|s| (s.version + 1, s.created_at))
            .unwrap_or((1, now));

        let session_data = SessionData {
            id: id.clone(),
            data: data.clone(),
            version,
            created_at,
            last_accessed: now,
        };
        self.cache.set(&key, &session_data)?;
        Ok(version)
    }

    /// Delete a session.
    pub fn delete(&self, id: &SessionId) -> Result<(), CacheError> {
        self.cache.delete(&self.session_key(id))
    }

    /// Check if a session exists.
    pub fn exists(&self, id: &SessionId) -> Result<bool, CacheError> {
        self.cache.exists(&self.session_key(id))
    }

    fn session_key(&self, id: &SessionId) -> String {
        crate::cache_key!(self.namespace.as_str(), id)
    }
}

fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
