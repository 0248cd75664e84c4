//! DDL generation: CREATE TABLE and CREATE INDEX statements for a schema.

use crate::error::SchemaError;

use super::Schema;

/// Emit the `CREATE TABLE IF NOT EXISTS` statement for `schema`.
///
/// Every table has exactly one explicit primary key, so tables are created
/// `WITHOUT ROWID` and clustered on that key.
pub fn create_table_sql(schema: &Schema) -> Result<String, SchemaError> {
    let key = schema.key_column()?;

    let definitions: Vec<String> = schema
        .columns()
        .iter()
        .map(|column| {
            let mut definition = format!("{} {}", column.name, column.kind.sql_name());
            if column.name == key.name {
                definition.push_str(" PRIMARY KEY");
            }
            definition.push_str(if column.nullable {
                " DEFAULT NULL"
            } else {
                " NOT NULL"
            });
            definition
        })
        .collect();

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n) WITHOUT ROWID",
        schema.table_name(),
        definitions.join(",\n    ")
    ))
}

/// Name of the secondary index on `column`.
pub fn index_name(schema: &Schema, column: &str) -> String {
    format!("{}_{column}_index", schema.table_name())
}

/// Emit the `CREATE INDEX IF NOT EXISTS` statement for one column.
pub fn create_index_sql(schema: &Schema, column: &str) -> Result<String, SchemaError> {
    if schema.column(column).is_none() {
        return Err(SchemaError::UnknownIndexColumn {
            table: schema.table_name().to_string(),
            column: column.to_string(),
        });
    }
    Ok(format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} ({column})",
        index_name(schema, column),
        schema.table_name()
    ))
}

/// The full DDL script for a table and its indexes, one statement per entry.
pub fn table_script(schema: &Schema, indexes: &[&str]) -> Result<Vec<String>, SchemaError> {
    let mut statements = Vec::with_capacity(indexes.len() + 1);
    statements.push(create_table_sql(schema)?);
    for column in indexes {
        statements.push(create_index_sql(schema, column)?);
    }
    Ok(statements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::reflect;
    use crate::types::{DeclaredType, RecordDescriptor};
    use std::sync::Arc;

    struct Page;
    struct Value;
    struct Wrapper;

    fn page_schema() -> Schema {
        let descriptor = RecordDescriptor::new::<Page>("RawPage")
            .field("page_url", DeclaredType::scalar::<String>())
            .field("category", DeclaredType::scalar::<String>())
            .field("page_source", DeclaredType::scalar::<String>().nullable());
        reflect::reflect(&descriptor, &mut |_| unreachable!()).unwrap()
    }

    #[test]
    fn test_create_table_sql() {
        let sql = create_table_sql(&page_schema()).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS raw_page (\n    \
             page_url TEXT PRIMARY KEY NOT NULL,\n    \
             category TEXT NOT NULL,\n    \
             page_source TEXT DEFAULT NULL\n\
             ) WITHOUT ROWID"
        );
    }

    #[test]
    fn test_create_index_sql() {
        let schema = page_schema();
        assert_eq!(
            create_index_sql(&schema, "category").unwrap(),
            "CREATE INDEX IF NOT EXISTS raw_page_category_index ON raw_page (category)"
        );
        assert!(matches!(
            create_index_sql(&schema, "missing"),
            Err(SchemaError::UnknownIndexColumn { .. })
        ));
    }

    #[test]
    fn test_table_script_executes_against_sqlite() {
        let schema = page_schema();
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        for statement in table_script(&schema, &["category"]).unwrap() {
            conn.execute_batch(&statement).unwrap();
        }
        // Idempotent.
        for statement in table_script(&schema, &["category"]).unwrap() {
            conn.execute_batch(&statement).unwrap();
        }
        let indexes: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'raw_page_category_index'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(indexes, 1);
    }

    #[test]
    fn test_embedded_key_cannot_be_a_table() {
        fn value() -> RecordDescriptor {
            RecordDescriptor::new::<Value>("Value").field("n", DeclaredType::scalar::<i64>())
        }
        let descriptor = RecordDescriptor::new::<Wrapper>("Wrapper")
            .field("inner", DeclaredType::Record(value))
            .field("label", DeclaredType::scalar::<String>());
        let schema = reflect::reflect(&descriptor, &mut |d| {
            reflect::reflect(d, &mut |_| unreachable!()).map(Arc::new)
        })
        .unwrap();

        assert!(matches!(
            create_table_sql(&schema),
            Err(SchemaError::PrimaryKeyNotScalar { .. })
        ));
    }
}
