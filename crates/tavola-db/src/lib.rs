//! Document store for Tavola.
//!
//! The order backend's document database on top of [redb]: named collections
//! of JSON documents, looked up by id or by field filters. [`Db::open`] keeps
//! them in a file, [`Db::open_default`] in memory.
//!
//! # Example
//!
//! ```rust
//! use tavola_db::{Db, Filter};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Command {
//!     code: u32,
//!     confirmed: bool,
//! }
//!
//! let db = Db::open_default().unwrap();
//! db.insert("commands", "c1", &Command { code: 123456, confirmed: false }).unwrap();
//!
//! let found: Command = db.find_one("commands", &Filter::eq("code", 123456)).unwrap();
//! assert!(!found.confirmed);
//! ```

mod db;
mod error;
mod types;

pub use db::Db;
pub use error::DbError;
pub use types::{Document, Documents, Filter};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Db, DbError, Document, Documents, Filter};
}
