use serde_json::{Value, json};

use crate::executor::{CommandResult, TableInfo};

/// Output mode for rendering command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable pretty-printed output.
    Pretty,
    /// Machine-parseable JSON (one JSON object per result on stdout).
    Json,
}

impl OutputMode {
    pub fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Pretty }
    }
}

/// Render a command result to stdout in the given mode.
pub fn render(result: &CommandResult, mode: OutputMode) {
    match mode {
        OutputMode::Pretty => render_pretty(result),
        OutputMode::Json => println!("{}", to_json(result)),
    }
}

fn render_pretty(result: &CommandResult) {
    match result {
        CommandResult::Ok(msg) => print_ok(msg),
        CommandResult::TableList(tables) => print_table_list(tables),
        CommandResult::Ddl(statements) => {
            for statement in statements {
                println!("{statement};");
            }
        }
        CommandResult::Records(records) => print_records(records),
    }
}

/// The JSON object emitted for a result in [`OutputMode::Json`].
pub fn to_json(result: &CommandResult) -> Value {
    match result {
        CommandResult::Ok(msg) => json!({"ok": true, "message": msg}),
        CommandResult::TableList(tables) => json!({"tables": tables}),
        CommandResult::Ddl(statements) => json!({"statements": statements}),
        CommandResult::Records(records) => json!({
            "records": records,
            "count": records.len(),
        }),
    }
}

/// Render an error in the given mode (always to stderr).
pub fn render_error(err: &dyn std::fmt::Display, mode: OutputMode) {
    match mode {
        OutputMode::Pretty => eprintln!("Error: {err}"),
        OutputMode::Json => eprintln!("{}", json!({"error": err.to_string()})),
    }
}

/// Pretty-print a single record with 2-space indentation.
pub fn print_record(record: &Value) {
    match serde_json::to_string_pretty(record) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Error formatting record: {e}"),
    }
}

fn print_records(records: &[Value]) {
    for record in records {
        print_record(record);
    }
    println!("Returned {} record(s).", records.len());
}

fn print_table_list(tables: &[TableInfo]) {
    for table in tables {
        let indexes = if table.indexes.is_empty() {
            "(none)".to_string()
        } else {
            table.indexes.join(", ")
        };
        println!(
            "  {:<14} {:>3} columns, indexed on {indexes}",
            table.name, table.columns
        );
    }
    println!("({} table(s))", tables.len());
}

fn print_ok(msg: &str) {
    println!("{msg}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_json_carries_count() {
        let result = CommandResult::Records(vec![json!({"page_url": "/a"}), json!({"page_url": "/b"})]);
        let out = to_json(&result);
        assert_eq!(out["count"], 2);
        assert_eq!(out["records"][1]["page_url"], "/b");
    }

    #[test]
    fn test_table_list_json() {
        let result = CommandResult::TableList(vec![TableInfo {
            name: "jewel",
            columns: 96,
            indexes: &["name", "shape"],
        }]);
        assert_eq!(
            to_json(&result),
            json!({"tables": [{"name": "jewel", "columns": 96, "indexes": ["name", "shape"]}]})
        );
    }

    #[test]
    fn test_output_mode_from_flag() {
        assert_eq!(OutputMode::from_flag(true), OutputMode::Json);
        assert_eq!(OutputMode::from_flag(false), OutputMode::Pretty);
    }
}
