use std::path::PathBuf;

use clap::Subcommand;

/// A console command.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create every known table and index.
    Init,
    /// List known tables with their column counts.
    Tables,
    /// Print the CREATE statements of a known table.
    Describe {
        table: String,
    },
    /// Select records from a known table.
    Query {
        table: String,
        /// Filter as `attribute=value`; repeatable. `attr__in=a,b` takes a
        /// comma-separated list and `NULL` is SQL NULL.
        #[arg(short = 'w', long = "where", value_name = "FILTER")]
        filters: Vec<String>,
        #[arg(short, long)]
        limit: Option<u64>,
        #[arg(short, long)]
        offset: Option<u64>,
    },
    /// Store a fetched page source as raw site data.
    Import {
        url: String,
        category: String,
        /// File holding the page's HTML source.
        file: PathBuf,
    },
    /// Delete one record by primary key.
    Delete {
        table: String,
        key: String,
    },
}
