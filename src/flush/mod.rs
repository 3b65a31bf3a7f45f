//! Writing views, metadata, and saved state to disk.

mod csv;
mod jsonl;

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use self::csv::{read_entity_table, write_csv};
pub use self::jsonl::write_table_jsonl;

use crate::dataset::{Dataset, DatasetState};
use crate::error::FlushError;
use crate::tables::CdfTable;

/// Write the metadata and every view of `dataset` into its configured output
/// location, finalizing first if the current views are stale.
///
/// Views are written as CSV and/or JSONL according to the config; metadata is
/// always written as pretty JSON. Returns the paths written.
pub fn export_views(dataset: &mut Dataset) -> Result<Vec<PathBuf>, FlushError> {
    if dataset.report().is_none() {
        dataset.finalize();
    }
    let config = dataset.config();
    let dir = config.output_location.as_path();
    fs::create_dir_all(dir).map_err(|source| FlushError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let stem = config.output_stem();

    let mut written = Vec::new();
    let metadata_path = dir.join(format!("CDF_Metadata_{stem}.json"));
    write_json_pretty(&metadata_path, dataset.metadata())?;
    written.push(metadata_path);

    let Some(report) = dataset.report() else {
        return Ok(written);
    };
    for extension in [
        config.output_csv.then_some("csv"),
        config.output_jsonl.then_some("jsonl"),
    ]
    .into_iter()
    .flatten()
    {
        written.push(write_view(&report.entity_table, dir, &stem, extension)?);
        written.push(write_view(&report.event_log, dir, &stem, extension)?);
        written.push(write_view(&report.combat_power, dir, &stem, extension)?);
    }

    for path in &written {
        tracing::info!(path = %path.display(), "exported");
    }
    Ok(written)
}

fn write_view<T: CdfTable>(
    table: &T,
    dir: &Path,
    stem: &str,
    extension: &str,
) -> Result<PathBuf, FlushError> {
    let path = dir.join(format!("CDF_{}_{stem}.{extension}", T::NAME));
    if extension == "csv" {
        write_csv(table, &path)?;
    } else {
        write_table_jsonl(table, &path)?;
    }
    Ok(path)
}

/// Save the dataset's store and metadata as JSON. Views are not saved.
pub fn save_state(dataset: &Dataset, path: &Path) -> Result<(), FlushError> {
    write_json_pretty(path, &dataset.export_state())?;
    tracing::info!(path = %path.display(), entities = dataset.store().len(), "saved dataset state");
    Ok(())
}

/// Load a dataset saved by [`save_state`].
pub fn load_state(path: &Path) -> Result<Dataset, FlushError> {
    let state: DatasetState = read_json(path)?;
    tracing::info!(path = %path.display(), "loading dataset state");
    Ok(Dataset::import_state(state))
}

fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), FlushError> {
    let io_err = |source| FlushError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| FlushError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(io_err)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, FlushError> {
    let file = File::open(path).map_err(|source| FlushError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| FlushError::Json {
        path: path.to_path_buf(),
        source,
    })
}
