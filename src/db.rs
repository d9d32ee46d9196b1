//! SQLite access through Diesel
//!
//! The loaded table's schema is only known at runtime, so everything here is
//! raw SQL with bound parameters rather than `table!` definitions.

use crate::error::LoadError;
use crate::loader::{Cell, Table};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sql_types::{BigInt, Double, Nullable, Text};
use diesel::sqlite::{Sqlite, SqliteConnection};
use std::path::Path;

type DbPool = Pool<ConnectionManager<SqliteConnection>>;
type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

pub type Result<T> = std::result::Result<T, LoadError>;

/// Columns per `json_array` call; SQLite caps function arguments at 127
const PREVIEW_CHUNK: usize = 100;

/// Database connection wrapper with connection pool
pub struct Database {
    pool: DbPool,
}

#[derive(QueryableByName)]
struct CountResult {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

#[derive(QueryableByName)]
struct JsonRow {
    #[diesel(sql_type = Text)]
    json_row: String,
}

/// Quote an identifier for SQLite (`my "col"` → `"my ""col"""`)
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl Database {
    /// Open (creating if absent) the database at `path`
    ///
    /// Missing parent directories are created.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| LoadError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let path_str = path.to_string_lossy().to_string();
        let manager = ConnectionManager::<SqliteConnection>::new(&path_str);
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| LoadError::Connection(e.to_string()))?;

        tracing::debug!(path = %path.display(), "opened database");
        Ok(Self { pool })
    }

    fn get_conn(&self) -> Result<DbConn> {
        self.pool.get().map_err(|e| LoadError::Connection(e.to_string()))
    }

    /// Drop `name` and write `data` in its place
    ///
    /// Drop, create and every insert share one transaction. If anything
    /// fails, SQLite rolls back and the previous table is untouched.
    /// `on_row` is called after each inserted row.
    pub fn replace_table<F: FnMut(usize)>(&self, name: &str, data: &Table, mut on_row: F) -> Result<usize> {
        let mut conn = self.get_conn()?;
        let ident = quote_ident(name);

        let columns = data
            .columns()
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.kind.sql_type()))
            .collect::<Vec<_>>()
            .join(", ");

        let placeholders = vec!["?"; data.columns().len()].join(", ");
        let insert = format!("INSERT INTO {} VALUES ({})", ident, placeholders);

        conn.transaction::<_, LoadError, _>(|conn| {
            diesel::sql_query(format!("DROP TABLE IF EXISTS {}", ident)).execute(conn)?;
            diesel::sql_query(format!("CREATE TABLE {} ({})", ident, columns)).execute(conn)?;

            for (i, row) in data.rows().iter().enumerate() {
                let mut query = diesel::sql_query(insert.as_str()).into_boxed::<Sqlite>();
                for cell in row {
                    query = match cell {
                        Cell::Null => query.bind::<Nullable<Text>, _>(None::<String>),
                        Cell::Integer(v) => query.bind::<BigInt, _>(*v),
                        Cell::Real(v) => query.bind::<Double, _>(*v),
                        Cell::Text(v) => query.bind::<Text, _>(v.clone()),
                    };
                }
                query.execute(conn)?;
                on_row(i + 1);
            }
            Ok(())
        })?;

        tracing::info!(table = name, rows = data.rows().len(), "replaced table");
        Ok(data.rows().len())
    }

    /// Whether a table called `name` exists
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let mut conn = self.get_conn()?;
        let result = diesel::sql_query(
            "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind::<Text, _>(name)
        .get_result::<CountResult>(&mut conn)?;
        Ok(result.count > 0)
    }

    pub fn row_count(&self, name: &str) -> Result<i64> {
        let mut conn = self.get_conn()?;
        let result = diesel::sql_query(format!("SELECT COUNT(*) AS count FROM {}", quote_ident(name)))
            .get_result::<CountResult>(&mut conn)?;
        Ok(result.count)
    }

    /// First `limit` rows of `name`, each as a JSON array in column order
    pub fn preview(&self, name: &str, column_names: &[String], limit: usize) -> Result<Vec<Vec<serde_json::Value>>> {
        if column_names.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.get_conn()?;
        let mut rows: Vec<Vec<serde_json::Value>> = Vec::new();

        // Wide tables are read a slice of columns at a time and stitched
        // back together per row
        for (n, chunk) in column_names.chunks(PREVIEW_CHUNK).enumerate() {
            let cols = chunk.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ");
            let sql = format!(
                "SELECT json_array({}) AS json_row FROM {} ORDER BY rowid LIMIT {}",
                cols,
                quote_ident(name),
                limit
            );

            let part = diesel::sql_query(sql).load::<JsonRow>(&mut conn)?;
            if n == 0 {
                rows = vec![Vec::with_capacity(column_names.len()); part.len()];
            }
            for (row, r) in rows.iter_mut().zip(part) {
                let values = serde_json::from_str::<Vec<serde_json::Value>>(&r.json_row)
                    .map_err(|e| LoadError::Connection(format!("bad preview row: {}", e)))?;
                row.extend(values);
            }
        }

        Ok(rows)
    }
}
