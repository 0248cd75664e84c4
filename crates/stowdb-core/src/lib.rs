//! # StowDB
//!
//! A small typed persistence layer over SQLite.
//!
//! Record types are declared with the [`record!`] macro. StowDB derives a
//! table schema from each declaration, flattening embedded records into
//! prefixed columns, and maps attribute filters, upserts and nested
//! transaction scopes onto SQL.
//!
//! ## Quick Start
//!
//! ```
//! use stowdb_core::api::{Database, Filters};
//! use stowdb_core::record;
//!
//! record! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct Resist {
//!         pub fire: f64,
//!         pub ice: f64,
//!     }
//! }
//!
//! record! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct Hat [primary_key = url] {
//!         pub name: String,
//!         pub url: String,
//!         pub resist: Resist,
//!     }
//! }
//!
//! let db = Database::open_in_memory().unwrap();
//! db.register::<Hat>().index("name").execute().unwrap();
//!
//! let hat = Hat {
//!     name: "Crown".into(),
//!     url: "/hat/crown".into(),
//!     resist: Resist { fire: 5.0, ice: 0.0 },
//! };
//! db.transact(|s| s.save(&hat)).unwrap();
//!
//! let session = db.session().unwrap();
//! let found: Hat = session
//!     .find(Filters::new().with("resist_fire", 5.0))
//!     .unwrap();
//! assert_eq!(found, hat);
//! ```

mod macros;

pub mod api;
pub mod catalog;
pub mod config;
pub mod encoding;
pub mod error;
pub mod record;
pub mod types;

pub use api::{Database, Filters, Patch, ScopeOptions, Session};
pub use error::{Error, Result};
pub use record::{Field, Record};
