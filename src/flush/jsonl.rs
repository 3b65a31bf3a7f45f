use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::FlushError;
use crate::tables::CdfTable;

/// Write an iterator of serializable items to a JSONL file (one JSON object per line).
pub(crate) fn write_jsonl<T: Serialize>(
    path: &Path,
    items: impl Iterator<Item = T>,
) -> Result<(), FlushError> {
    let io_err = |source| FlushError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    for item in items {
        serde_json::to_writer(&mut writer, &item).map_err(|source| FlushError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        writer.write_all(b"\n").map_err(io_err)?;
    }
    writer.flush().map_err(io_err)
}

/// Write every row of a view as one JSON object per line, keys in column order.
pub fn write_table_jsonl<T: CdfTable>(table: &T, path: &Path) -> Result<(), FlushError> {
    write_jsonl(path, table.rows().iter())
}
