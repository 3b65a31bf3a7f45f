use std::path::Path;

use crate::error::FlushError;
use crate::tables::{CdfTable, EntityTableRow};

fn csv_err(path: &Path) -> impl Fn(::csv::Error) -> FlushError + '_ {
    move |source| FlushError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Write a view as CSV. The header row comes from the view's column list, so
/// an empty view still produces a header.
pub fn write_csv<T: CdfTable>(table: &T, path: &Path) -> Result<(), FlushError> {
    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_err(path))?;
    writer
        .write_record(T::COLUMNS.iter().map(|(name, _)| *name))
        .map_err(csv_err(path))?;
    for row in table.rows() {
        writer.serialize(row).map_err(csv_err(path))?;
    }
    writer.flush().map_err(|source| FlushError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read entity table rows back from a CSV file written by [`write_csv`].
pub fn read_entity_table(path: &Path) -> Result<Vec<EntityTableRow>, FlushError> {
    let mut reader = ::csv::Reader::from_path(path).map_err(csv_err(path))?;
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<EntityTableRow>, _>>()
        .map_err(csv_err(path))?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "read entity table");
    Ok(rows)
}
