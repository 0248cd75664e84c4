//! Record types and bootstrap for the central item database.
//!
//! The central database caches pages fetched from the item wiki
//! ([`RawSiteData`]) and the items, pet abilities and jewels parsed out of
//! them. [`bootstrap`] creates every table and index in one transaction.

pub mod constants;
pub mod ingest;
pub mod records;
pub mod tables;

pub use constants::normalize_category;
pub use ingest::{PageTriple, ingest_pages, pending_wearables};
pub use records::{Jewel, PetAbility, RawSiteData, SchoolBasedStat, Stats, WearableItem};
pub use tables::KnownTable;

use stowdb_core::Database;
use stowdb_core::error::Error;
use tracing::info;

/// Create every known table and its indexes, committing once.
///
/// Safe to run against an existing database; nothing that already exists is
/// touched.
pub fn bootstrap(db: &Database) -> Result<(), Error> {
    db.transact(|session| {
        for table in KnownTable::ALL {
            table.create(session)?;
        }
        Ok(())
    })?;
    info!(tables = KnownTable::ALL.len(), "central schema ready");
    Ok(())
}
