//! Type-safe key-value cache and session storage for Tavola.
//!
//! Values are stored as JSON in an embedded redb database, either in memory or
//! in a file, so a client can keep its cart across restarts.
//!
//! # Example
//!
//! ```rust
//! use tavola_cache::{Cache, Session, SessionId};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, Default, Clone)]
//! struct Prefs {
//!     lang: String,
//! }
//!
//! let cache = Cache::open_default().unwrap();
//! let prefs = Session::<Prefs>::with_namespace(cache, "prefs");
//!
//! let id = SessionId::generate();
//! prefs.set(&id, &Prefs { lang: "fr".into() }).unwrap();
//! assert_eq!(prefs.get(&id).unwrap().unwrap().lang, "fr");
//! ```

mod error;
mod kv;
mod session;

pub use error::CacheError;
pub use kv::{Cache, CACHE_FILE};
pub use session::{Session, SessionData, SessionId, DEFAULT_NAMESPACE};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Cache, CacheError, Session, SessionId};
}
