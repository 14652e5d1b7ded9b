// SQLite repository implementation
use crate::application::fatality_repository::FatalityRepository;
use crate::domain::record::{RawCell, RawFatalityRow};
use crate::error::{Error, Result};
use crate::infrastructure::config::ColumnMapping;
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SqliteRepository {
    path: PathBuf,
    table: String,
    columns: ColumnMapping,
}

/// Position of each mapped column in the `SELECT *` result.
struct ColumnIndex {
    year: usize,
    age: usize,
    cause: Option<usize>,
    classification: Option<usize>,
    rank: Option<usize>,
    service: Option<usize>,
    location_type: Option<usize>,
    nature: Option<usize>,
}

impl SqliteRepository {
    /// Table and column names must already be validated identifiers.
    pub fn new(path: PathBuf, table: String, columns: ColumnMapping) -> Self {
        Self {
            path,
            table,
            columns,
        }
    }

    fn open(path: &Path) -> Result<Connection> {
        if !path.exists() {
            return Err(Error::DatabaseMissing {
                path: path.to_path_buf(),
            });
        }
        Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(|source| {
            Error::DatabaseOpen {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    fn read_all(&self) -> Result<Vec<RawFatalityRow>> {
        let conn = Self::open(&self.path)?;

        let exists = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1 COLLATE NOCASE",
                [&self.table],
                |_| Ok(()),
            )
            .optional()?;
        if exists.is_none() {
            return Err(Error::TableMissing {
                path: self.path.clone(),
                table: self.table.clone(),
            });
        }

        let mut stmt = conn.prepare(&format!("SELECT * FROM \"{}\"", self.table))?;
        let names: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let index = self.index_columns(&names)?;

        let rows = stmt
            .query_map([], |row| read_row(row, &index))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        tracing::debug!("Read {} rows from {}", rows.len(), self.table);
        Ok(rows)
    }

    fn index_columns(&self, names: &[String]) -> Result<ColumnIndex> {
        let find = |column: &str| names.iter().position(|n| n == column);
        let required = |column: &str| {
            find(column).ok_or_else(|| Error::ColumnMissing {
                table: self.table.clone(),
                column: column.to_string(),
            })
        };
        let optional = |column: &str| {
            let idx = find(column);
            if idx.is_none() {
                tracing::warn!(
                    "Column '{}' missing from '{}'; every row gets the placeholder value",
                    column,
                    self.table
                );
            }
            idx
        };

        let c = &self.columns;
        Ok(ColumnIndex {
            year: required(&c.year)?,
            age: required(&c.age)?,
            cause: optional(&c.cause),
            classification: optional(&c.classification),
            rank: optional(&c.rank),
            service: optional(&c.service),
            location_type: optional(&c.location_type),
            nature: optional(&c.nature),
        })
    }
}

fn read_row(row: &Row<'_>, index: &ColumnIndex) -> rusqlite::Result<RawFatalityRow> {
    let text = |idx: Option<usize>| -> rusqlite::Result<Option<String>> {
        match idx {
            Some(i) => Ok(text_cell(row.get_ref(i)?)),
            None => Ok(None),
        }
    };

    Ok(RawFatalityRow {
        year: raw_cell(row.get_ref(index.year)?),
        age: raw_cell(row.get_ref(index.age)?),
        cause: text(index.cause)?,
        classification: text(index.classification)?,
        rank: text(index.rank)?,
        service: text(index.service)?,
        location_type: text(index.location_type)?,
        nature: text(index.nature)?,
    })
}

fn raw_cell(value: ValueRef<'_>) -> RawCell {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => RawCell::Null,
        ValueRef::Integer(i) => RawCell::Integer(i),
        ValueRef::Real(f) => RawCell::Real(f),
        ValueRef::Text(t) => RawCell::Text(String::from_utf8_lossy(t).into_owned()),
    }
}

fn text_cell(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) | ValueRef::Blob(t) => Some(String::from_utf8_lossy(t).into_owned()),
    }
}

#[async_trait]
impl FatalityRepository for SqliteRepository {
    fn source_location(&self) -> String {
        self.path.display().to_string()
    }

    fn table_name(&self) -> String {
        self.table.clone()
    }

    async fn fetch_all(&self) -> Result<Vec<RawFatalityRow>> {
        let repo = self.clone();
        tokio::task::spawn_blocking(move || repo.read_all()).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::Dataset;
    use chrono::Utc;
    use tempfile::TempDir;

    const SCHEMA: &str = r"
        CREATE TABLE mortes (
            ano_mor INTEGER,
            causa TEXT,
            classificacao TEXT,
            idade TEXT,
            patente TEXT,
            servico TEXT,
            tipo_local TEXT,
            natu TEXT
        );
        INSERT INTO mortes VALUES (2019, 'Fall', 'Career', '41', 'Captain', 'Municipal', 'Urban', 'Trauma');
        INSERT INTO mortes VALUES (2020, NULL, 'Volunteer', '29.0', 'Firefighter', 'Wildland', NULL, 'Burns');
        INSERT INTO mortes VALUES (2020, 'Stress', 'Career', 'unknown', 'Chief', 'Municipal', 'Rural', 'Cardiac');
        INSERT INTO mortes VALUES (NULL, 'Stress', 'Career', '50', 'Chief', 'Municipal', 'Rural', 'Cardiac');
    ";

    fn create_db(sql: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("teste.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(sql).unwrap();
        (dir, path)
    }

    fn repo(path: PathBuf) -> SqliteRepository {
        SqliteRepository::new(path, "mortes".to_string(), ColumnMapping::default())
    }

    #[tokio::test]
    async fn test_fetch_all_and_sanitize() {
        let (_dir, path) = create_db(SCHEMA);
        let rows = repo(path).fetch_all().await.unwrap();
        assert_eq!(rows.len(), 4);

        let (dataset, dropped) = Dataset::from_raw_rows(rows, "Unknown", 1, Utc::now());
        assert_eq!(dropped, 2);
        assert_eq!(dataset.len(), 2);

        let second = &dataset.records()[1];
        assert_eq!(second.cause, "Unknown");
        assert_eq!(second.location_type, "Unknown");
        assert_eq!(second.age, 29.0);
        assert_eq!(dataset.records()[0].rank, "Captain");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = repo(dir.path().join("absent.db")).fetch_all().await.unwrap_err();
        assert!(matches!(err, Error::DatabaseMissing { .. }));
        assert!(!dir.path().join("absent.db").exists());
    }

    #[tokio::test]
    async fn test_missing_table() {
        let (_dir, path) = create_db("CREATE TABLE other (x INTEGER);");
        let err = repo(path).fetch_all().await.unwrap_err();
        match err {
            Error::TableMissing { table, .. } => assert_eq!(table, "mortes"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_table_name_is_case_insensitive() {
        let (_dir, path) = create_db(SCHEMA);
        let repo = SqliteRepository::new(path, "MORTES".to_string(), ColumnMapping::default());
        assert_eq!(repo.fetch_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_missing_essential_column() {
        let (_dir, path) = create_db("CREATE TABLE mortes (ano_mor INTEGER, causa TEXT);");
        let err = repo(path).fetch_all().await.unwrap_err();
        assert!(matches!(err, Error::ColumnMissing { ref column, .. } if column == "idade"));
    }

    #[tokio::test]
    async fn test_missing_text_column_is_all_missing() {
        let (_dir, path) = create_db(
            "CREATE TABLE mortes (ano_mor REAL, idade INTEGER, causa TEXT);
             INSERT INTO mortes VALUES (2018.0, 33, 'Fall');",
        );
        let rows = repo(path).fetch_all().await.unwrap();
        let (dataset, _) = Dataset::from_raw_rows(rows, "Unknown", 1, Utc::now());

        let record = &dataset.records()[0];
        assert_eq!(record.year, 2018);
        assert_eq!(record.cause, "Fall");
        assert_eq!(record.service, "Unknown");
        assert_eq!(record.nature, "Unknown");
    }

    #[tokio::test]
    async fn test_numeric_text_columns_are_stringified() {
        let (_dir, path) = create_db(
            "CREATE TABLE mortes (ano_mor INTEGER, idade INTEGER, servico);
             INSERT INTO mortes VALUES (2018, 33, 7);",
        );
        let rows = repo(path).fetch_all().await.unwrap();
        assert_eq!(rows[0].service.as_deref(), Some("7"));
    }
}
