use std::io;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;
use stowdb_central::{
    Jewel, KnownTable, PetAbility, RawSiteData, WearableItem, bootstrap, ingest_pages,
};
use stowdb_core::error::SchemaError;
use stowdb_core::record::Record;
use stowdb_core::{Database, Filters, Session};
use thiserror::Error;
use tracing::debug;

use crate::commands::Command;
use crate::parser;

/// Errors surfaced by console commands.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Database(#[from] stowdb_core::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("unknown table '{0}'; known tables: {known}", known = known_tables())]
    UnknownTable(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("cannot read {shown}: {source}", shown = path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot render record: {0}")]
    Json(#[from] serde_json::Error),
}

fn known_tables() -> String {
    KnownTable::ALL
        .iter()
        .map(|t| t.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Summary of one known table.
#[derive(Debug, Serialize)]
pub struct TableInfo {
    pub name: &'static str,
    pub columns: usize,
    pub indexes: &'static [&'static str],
}

/// Structured result from executing a command.
#[derive(Debug)]
pub enum CommandResult {
    /// Mutation succeeded (INIT, IMPORT, DELETE).
    Ok(String),
    /// Known tables (TABLES).
    TableList(Vec<TableInfo>),
    /// CREATE statements (DESCRIBE).
    Ddl(Vec<String>),
    /// Selected records as JSON objects (QUERY).
    Records(Vec<Value>),
}

/// Execute a parsed command against the database.
pub fn execute(db: &Database, cmd: Command) -> Result<CommandResult, ConsoleError> {
    match cmd {
        Command::Init => exec_init(db),
        Command::Tables => exec_tables(),
        Command::Describe { table } => exec_describe(&table),
        Command::Query {
            table,
            filters,
            limit,
            offset,
        } => exec_query(db, &table, &filters, limit, offset),
        Command::Import {
            url,
            category,
            file,
        } => exec_import(db, url, category, file),
        Command::Delete { table, key } => exec_delete(db, &table, &key),
    }
}

fn known_table(name: &str) -> Result<KnownTable, ConsoleError> {
    KnownTable::from_name(name).ok_or_else(|| ConsoleError::UnknownTable(name.to_string()))
}

fn exec_init(db: &Database) -> Result<CommandResult, ConsoleError> {
    bootstrap(db)?;
    Ok(CommandResult::Ok(format!(
        "Created {} tables.",
        KnownTable::ALL.len()
    )))
}

fn exec_tables() -> Result<CommandResult, ConsoleError> {
    let tables = KnownTable::ALL
        .into_iter()
        .map(|table| {
            Ok(TableInfo {
                name: table.name(),
                columns: table.schema()?.len(),
                indexes: table.indexes(),
            })
        })
        .collect::<Result<Vec<_>, SchemaError>>()?;
    Ok(CommandResult::TableList(tables))
}

fn exec_describe(table: &str) -> Result<CommandResult, ConsoleError> {
    Ok(CommandResult::Ddl(known_table(table)?.ddl()?))
}

fn exec_query(
    db: &Database,
    table: &str,
    filters: &[String],
    limit: Option<u64>,
    offset: Option<u64>,
) -> Result<CommandResult, ConsoleError> {
    let table = known_table(table)?;
    let filters = parser::parse_filters(filters).map_err(ConsoleError::InvalidFilter)?;
    let session = db.session()?;
    let records = match table {
        KnownTable::RawSiteData => {
            select_json::<RawSiteData>(&session, filters, limit, offset)?
        }
        KnownTable::WearableItem => {
            select_json::<WearableItem>(&session, filters, limit, offset)?
        }
        KnownTable::PetAbility => select_json::<PetAbility>(&session, filters, limit, offset)?,
        KnownTable::Jewel => select_json::<Jewel>(&session, filters, limit, offset)?,
    };
    Ok(CommandResult::Records(records))
}

fn select_json<T: Record + Serialize>(
    session: &Session<'_>,
    filters: Filters,
    limit: Option<u64>,
    offset: Option<u64>,
) -> Result<Vec<Value>, ConsoleError> {
    let mut query = session.select::<T>().filters(filters);
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    if let Some(offset) = offset {
        query = query.offset(offset);
    }
    let (sql, _) = query.to_sql()?;
    debug!(%sql, "running query");

    query
        .execute()?
        .iter()
        .map(|record| serde_json::to_value(record).map_err(ConsoleError::from))
        .collect()
}

fn exec_import(
    db: &Database,
    url: String,
    category: String,
    file: PathBuf,
) -> Result<CommandResult, ConsoleError> {
    let source = std::fs::read_to_string(&file).map_err(|source| ConsoleError::Read {
        path: file.clone(),
        source,
    })?;
    let bytes = source.len();
    db.transact(|s| ingest_pages(s, [(url.clone(), category, source)]))?;
    Ok(CommandResult::Ok(format!("Stored {url} ({bytes} bytes).")))
}

fn exec_delete(db: &Database, table: &str, key: &str) -> Result<CommandResult, ConsoleError> {
    let table = known_table(table)?;
    let removed = db.transact(|s| match table {
        KnownTable::RawSiteData => delete_by_key::<RawSiteData>(s, key),
        KnownTable::WearableItem => delete_by_key::<WearableItem>(s, key),
        KnownTable::PetAbility => delete_by_key::<PetAbility>(s, key),
        KnownTable::Jewel => delete_by_key::<Jewel>(s, key),
    })?;
    Ok(CommandResult::Ok(format!("Deleted {removed} record(s).")))
}

fn delete_by_key<T: Record>(session: &Session<'_>, key: &str) -> Result<usize, stowdb_core::Error> {
    match session.get::<T>(key)? {
        Some(record) => session.delete(&record),
        None => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("central.sqlite")).unwrap();
        (db, dir)
    }

    fn records(result: CommandResult) -> Vec<Value> {
        match result {
            CommandResult::Records(records) => records,
            _ => panic!("expected records"),
        }
    }

    #[test]
    fn test_import_query_delete() {
        let (db, dir) = create_test_db();
        execute(&db, Command::Init).unwrap();

        let page = dir.path().join("crown.html");
        std::fs::write(&page, "<html>crown</html>").unwrap();
        execute(
            &db,
            Command::Import {
                url: "/wiki/Item:Crown".into(),
                category: "hat".into(),
                file: page,
            },
        )
        .unwrap();

        let found = records(
            execute(
                &db,
                Command::Query {
                    table: "raw_site_data".into(),
                    filters: vec!["category__in=hats,robes".into()],
                    limit: Some(10),
                    offset: None,
                },
            )
            .unwrap(),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["page_url"], "/wiki/Item:Crown");
        assert_eq!(found[0]["category"], "hats");

        execute(
            &db,
            Command::Delete {
                table: "raw_site_data".into(),
                key: "/wiki/Item:Crown".into(),
            },
        )
        .unwrap();
        let found = records(
            execute(
                &db,
                Command::Query {
                    table: "raw_site_data".into(),
                    filters: Vec::new(),
                    limit: None,
                    offset: None,
                },
            )
            .unwrap(),
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_unknown_table_and_bad_filter() {
        let (db, _dir) = create_test_db();
        let err = execute(&db, Command::Describe { table: "pets".into() }).unwrap_err();
        assert!(matches!(err, ConsoleError::UnknownTable(_)));
        assert_eq!(
            err.to_string(),
            "unknown table 'pets'; known tables: raw_site_data, wearable_item, pet_ability, jewel"
        );
        assert!(matches!(
            execute(
                &db,
                Command::Query {
                    table: "jewel".into(),
                    filters: vec!["shape".into()],
                    limit: None,
                    offset: None,
                },
            ),
            Err(ConsoleError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_tables_report_column_counts() {
        let CommandResult::TableList(tables) = exec_tables().unwrap() else {
            panic!("expected table list");
        };
        let wearable = tables.iter().find(|t| t.name == "wearable_item").unwrap();
        assert_eq!(wearable.columns, 95);
        assert_eq!(wearable.indexes, &["category", "name"]);
    }

    #[test]
    fn test_import_missing_file() {
        let (db, dir) = create_test_db();
        let err = execute(
            &db,
            Command::Import {
                url: "/x".into(),
                category: "hats".into(),
                file: dir.path().join("missing.html"),
            },
        );
        assert!(matches!(err, Err(ConsoleError::Read { .. })));
    }
}
