//! Tabular (CSV) input and output.
//!
//! Both tables are UTF-8 with a header row and minimal quoting. Column names
//! come from the serde renames on the record types in [`crate::models`].

use crate::errors::StageError;
use crate::models::ArticleRecord;
use crate::utils::ensure_parent_dir;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Serialize `records` to `path`, creating parent directories as needed.
///
/// # Arguments
///
/// * `path` - Destination CSV file, overwritten if present
/// * `records` - Rows; their serde field names become the header
///
/// # Returns
///
/// `Ok(())` once the whole table is on disk.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), StageError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| StageError::Io(e.into_error()))?;

    ensure_parent_dir(path).await?;
    fs::write(path, bytes).await?;
    info!("Wrote table");
    Ok(())
}

/// Read a table written by the `producer` stage.
///
/// # Arguments
///
/// * `path` - CSV file to read
/// * `producer` - Subcommand that writes this file, named in the error
///
/// # Returns
///
/// Every row, in file order. A missing file is [`StageError::InputMissing`].
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_records<T: DeserializeOwned>(
    path: &Path,
    producer: &'static str,
) -> Result<Vec<T>, StageError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StageError::InputMissing {
                path: path.to_path_buf(),
                producer,
            });
        }
        Err(e) => return Err(e.into()),
    };

    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let records = reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()?;
    info!(count = records.len(), "Read table");
    Ok(records)
}

/// Read the harvest table, recovering each record's fetch error.
pub async fn read_articles(path: &Path) -> Result<Vec<ArticleRecord>, StageError> {
    let records: Vec<ArticleRecord> = read_records(path, "scrape").await?;
    Ok(records
        .into_iter()
        .map(ArticleRecord::with_recovered_error)
        .collect())
}

/// Accept `true`/`false` in any case, which also covers tables written by
/// pandas (`True`/`False`).
pub fn flexible_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!("not a boolean: {other:?}"))),
    }
}
