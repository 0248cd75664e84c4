//! The tables of the central database and their secondary indexes.

use std::fmt;
use std::sync::Arc;

use stowdb_core::Session;
use stowdb_core::catalog::{Schema, ddl};
use stowdb_core::error::{Error, SchemaError};
use stowdb_core::record::Record;

use crate::records::{Jewel, PetAbility, RawSiteData, WearableItem};

/// A table of the central database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownTable {
    RawSiteData,
    WearableItem,
    PetAbility,
    Jewel,
}

impl KnownTable {
    pub const ALL: [KnownTable; 4] = [
        KnownTable::RawSiteData,
        KnownTable::WearableItem,
        KnownTable::PetAbility,
        KnownTable::Jewel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            KnownTable::RawSiteData => "raw_site_data",
            KnownTable::WearableItem => "wearable_item",
            KnownTable::PetAbility => "pet_ability",
            KnownTable::Jewel => "jewel",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|table| table.name() == name)
    }

    /// Columns with a secondary index.
    pub fn indexes(self) -> &'static [&'static str] {
        match self {
            KnownTable::RawSiteData => &["category"],
            KnownTable::WearableItem => &["category", "name"],
            KnownTable::PetAbility => &["name"],
            KnownTable::Jewel => &["name", "shape", "pet_ability_page_url"],
        }
    }

    pub fn schema(self) -> Result<Arc<Schema>, SchemaError> {
        match self {
            KnownTable::RawSiteData => RawSiteData::schema(),
            KnownTable::WearableItem => WearableItem::schema(),
            KnownTable::PetAbility => PetAbility::schema(),
            KnownTable::Jewel => Jewel::schema(),
        }
    }

    /// The CREATE TABLE and CREATE INDEX statements for this table.
    pub fn ddl(self) -> Result<Vec<String>, SchemaError> {
        let schema = self.schema()?;
        ddl::table_script(&schema, self.indexes())
    }

    /// Create the table and its indexes if they do not exist.
    pub fn create(self, session: &Session<'_>) -> Result<(), Error> {
        match self {
            KnownTable::RawSiteData => session.create_table::<RawSiteData>(self.indexes()),
            KnownTable::WearableItem => session.create_table::<WearableItem>(self.indexes()),
            KnownTable::PetAbility => session.create_table::<PetAbility>(self.indexes()),
            KnownTable::Jewel => session.create_table::<Jewel>(self.indexes()),
        }
    }
}

impl fmt::Display for KnownTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_match_derived_schemas() {
        for table in KnownTable::ALL {
            assert_eq!(table.schema().unwrap().table_name(), table.name());
            assert_eq!(KnownTable::from_name(table.name()), Some(table));
        }
        assert_eq!(KnownTable::from_name("talent"), None);
    }

    #[test]
    fn test_jewel_ddl() {
        let statements = KnownTable::Jewel.ddl().unwrap();
        assert_eq!(statements.len(), 4);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS jewel (\n    page_url TEXT PRIMARY KEY NOT NULL,"));
        assert!(statements[0].contains("pet_ability_page_url TEXT DEFAULT NULL"));
        assert!(statements[0].ends_with(") WITHOUT ROWID"));
        assert_eq!(
            statements[3],
            "CREATE INDEX IF NOT EXISTS jewel_pet_ability_page_url_index ON jewel (pet_ability_page_url)"
        );
    }
}
