//! Reads the `archive` table of a weather station SQLite database into a
//! [`RawSeriesStore`].

pub mod error;

use crate::archive::error::ArchiveError;
use crate::schema::{UnitRegistry, ARCHIVE_FIELDS};
use crate::store::error::StoreError;
use crate::store::raw_store::RawSeriesStore;
use log::{debug, info, warn};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub const ARCHIVE_TABLE: &str = "archive";
/// Column the archive rows are ordered by.
pub const ARCHIVE_ORDER_COLUMN: &str = "dateTime";

/// Read-only handle on an archive database file.
#[derive(Debug)]
pub struct ArchiveReader {
    path: PathBuf,
    conn: Connection,
}

impl ArchiveReader {
    /// Opens `path` read-only. A missing file is an error; it is never created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| ArchiveError::Open(path.clone(), e))?;
        Ok(Self { path, conn })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every row of the archive table in time order.
    ///
    /// Columns are mapped by position onto the 52-field archive layout; SQL `NULL`
    /// becomes `NaN`.
    ///
    /// # Errors
    ///
    /// * [`ArchiveError::SchemaMismatch`] if the table does not have 52 columns.
    /// * [`ArchiveError::Store`] wrapping [`StoreError::EmptyInput`] if it has no rows.
    /// * [`ArchiveError::Query`] if the table is missing or a value is not numeric.
    pub fn read(&self) -> Result<RawSeriesStore, ArchiveError> {
        let started = Instant::now();
        let query_error = |source| ArchiveError::Query {
            path: self.path.clone(),
            table: ARCHIVE_TABLE.to_string(),
            source,
        };

        let sql = format!("SELECT * FROM {ARCHIVE_TABLE} ORDER BY {ARCHIVE_ORDER_COLUMN}");
        let mut stmt = self.conn.prepare(&sql).map_err(query_error)?;

        let found = stmt.column_count();
        if found != ARCHIVE_FIELDS.len() {
            warn!(
                "Archive table of {:?} has columns {:?}",
                self.path,
                stmt.column_names()
            );
            return Err(ArchiveError::SchemaMismatch {
                path: self.path.clone(),
                table: ARCHIVE_TABLE.to_string(),
                expected: ARCHIVE_FIELDS.len(),
                found,
            });
        }

        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); ARCHIVE_FIELDS.len()];
        let mut rows = stmt.query([]).map_err(query_error)?;
        while let Some(row) = rows.next().map_err(query_error)? {
            for (index, column) in columns.iter_mut().enumerate() {
                let value: Option<f64> = row.get(index).map_err(query_error)?;
                column.push(value.unwrap_or(f64::NAN));
            }
        }

        let row_count = columns[0].len();
        if row_count == 0 {
            warn!("Archive table of {:?} has no rows", self.path);
            return Err(StoreError::EmptyInput.into());
        }
        info!(
            "Read {} archive rows from {:?} in {:?}",
            row_count,
            self.path,
            started.elapsed()
        );

        let named = ARCHIVE_FIELDS
            .iter()
            .zip(columns)
            .map(|((name, _), values)| (name.to_string(), values))
            .collect();
        let store = RawSeriesStore::from_columns(named, &UnitRegistry::archive())?;
        debug!("Built raw store with {} fields", store.field_names().count());
        Ok(store)
    }
}

/// Opens `path` and reads its archive table.
pub fn read_archive(path: impl AsRef<Path>) -> Result<RawSeriesStore, ArchiveError> {
    ArchiveReader::open(path)?.read()
}
