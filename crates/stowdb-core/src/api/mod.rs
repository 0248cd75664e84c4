//! Public API: database handle, sessions and scopes, query builders, and partial updates.

pub mod builders;
pub mod database;
pub mod filter;
pub mod transaction;
pub mod update;

pub use builders::{QueryBuilder, RegisterBuilder};
pub use database::Database;
pub use filter::{FilterValue, Filters, Order};
pub use transaction::{ScopeOptions, Session};
pub use update::Patch;
