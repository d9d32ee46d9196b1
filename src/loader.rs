//! CSV → SQLite bulk loader
//!
//! One-shot replace-load of a CSV file into a single table:
//!
//! 1. read the whole CSV into a [`Table`], inferring a type per column
//! 2. drop and recreate the destination table in one transaction
//! 3. read a few rows back so the operator can eyeball the result
//!
//! # Type Inference
//!
//! Types are decided per column over every row, the same way a dataframe
//! library would:
//!
//! | Non-missing values            | Missing values? | SQL type |
//! |-------------------------------|-----------------|----------|
//! | all integers                  | no              | INTEGER  |
//! | all integers                  | yes             | REAL     |
//! | all numbers                   | either          | REAL     |
//! | all `True`/`False`            | no              | INTEGER  |
//! | none at all                   | -               | REAL     |
//! | anything else                 | either          | TEXT     |
//!
//! Missing means an empty cell or one of the usual NA spellings (`NA`,
//! `NaN`, `null`, ...). Missing cells are stored as NULL.

use crate::db::Database;
use crate::error::LoadError;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Cell spellings treated as missing
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing(value: &str) -> bool {
    NA_VALUES.contains(&value)
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Real,
    Boolean,
    Text,
}

impl ColumnType {
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer | ColumnType::Boolean => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }

    fn infer<'a>(values: impl Iterator<Item = &'a str>) -> Self {
        let mut seen_any = false;
        let mut missing = false;
        let mut all_int = true;
        let mut all_float = true;
        let mut all_bool = true;

        for v in values {
            if is_missing(v) {
                missing = true;
                continue;
            }
            seen_any = true;
            all_int &= v.parse::<i64>().is_ok();
            all_float &= v.parse::<f64>().is_ok();
            all_bool &= parse_bool(v).is_some();
        }

        match (seen_any, missing) {
            (false, _) => ColumnType::Real,
            (true, false) if all_bool => ColumnType::Boolean,
            (true, false) if all_int => ColumnType::Integer,
            (true, _) if all_int || all_float => ColumnType::Real,
            _ => ColumnType::Text,
        }
    }

    fn cell(&self, value: &str) -> Cell {
        if is_missing(value) {
            return Cell::Null;
        }
        match self {
            ColumnType::Integer => value.parse().map(Cell::Integer).unwrap_or(Cell::Null),
            ColumnType::Real => value.parse().map(Cell::Real).unwrap_or(Cell::Null),
            ColumnType::Boolean => match parse_bool(value) {
                Some(b) => Cell::Integer(i64::from(b)),
                None => Cell::Null,
            },
            ColumnType::Text => Cell::Text(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

/// A fully-read CSV with typed columns
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Read a CSV file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let io_err = |source: std::io::Error| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut bytes = Vec::new();
        File::open(path)
            .and_then(|mut f| f.read_to_end(&mut bytes))
            .map_err(io_err)?;

        Self::from_reader(bytes.as_slice())
    }

    /// Parse CSV text (header row required)
    pub fn from_csv_str(content: &str) -> Result<Self, LoadError> {
        Self::from_reader(content.as_bytes())
    }

    fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .flexible(false)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(LoadError::EmptyHeader);
        }
        let names = column_names(&headers);

        let records = reader.records().collect::<Result<Vec<StringRecord>, _>>()?;

        let columns: Vec<Column> = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Column {
                name,
                kind: ColumnType::infer(records.iter().map(|r| r.get(i).unwrap_or(""))),
            })
            .collect();

        let rows = records
            .iter()
            .map(|r| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(i, c)| c.kind.cell(r.get(i).unwrap_or("")))
                    .collect()
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Header names with blanks filled in and duplicates suffixed (`a`, `a.1`)
fn column_names(headers: &StringRecord) -> Vec<String> {
    let mut used = HashSet::new();
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let base = if h.is_empty() {
                format!("Unnamed: {}", i)
            } else {
                h.to_string()
            };
            let mut name = base.clone();
            let mut n = 1;
            while !used.insert(name.clone()) {
                name = format!("{}.{}", base, n);
                n += 1;
            }
            name
        })
        .collect()
}

/// What a load wrote
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub table: String,
    pub rows_written: usize,
    pub columns: Vec<Column>,
    pub preview: Vec<Vec<serde_json::Value>>,
}

/// Replace-load `csv_path` into `table` of the database at `db_path`
pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(csv_path: P, db_path: Q, table: &str) -> Result<LoadReport, LoadError> {
    load_with_progress(csv_path, db_path, table, crate::config::DEFAULT_PREVIEW_ROWS, |_, _| {})
}

/// [`load`] with a preview size and a progress callback `(rows_done, rows_total)`
pub fn load_with_progress<P, Q, F>(
    csv_path: P,
    db_path: Q,
    table: &str,
    preview_rows: usize,
    mut progress: F,
) -> Result<LoadReport, LoadError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    F: FnMut(usize, usize),
{
    let csv_path = csv_path.as_ref();
    let data = Table::from_path(csv_path)?;
    tracing::info!(
        path = %csv_path.display(),
        rows = data.rows().len(),
        columns = data.columns().len(),
        "read CSV"
    );

    // Open only after the CSV parsed, so a bad file never touches the store
    let db = Database::open_at(db_path)?;
    let total = data.rows().len();
    let rows_written = db.replace_table(table, &data, |done| progress(done, total))?;

    // The table is already committed; a failed read-back only costs the preview
    let names = data.column_names();
    let preview = match db.preview(table, &names, preview_rows) {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(table, error = %e, "read-back failed");
            Vec::new()
        }
    };

    Ok(LoadReport {
        table: table.to_string(),
        rows_written,
        columns: data.columns().to_vec(),
        preview,
    })
}

/// Rows currently in `table`
pub fn row_count<P: AsRef<Path>>(db_path: P, table: &str) -> Result<i64, LoadError> {
    Database::open_at(db_path)?.row_count(table)
}
