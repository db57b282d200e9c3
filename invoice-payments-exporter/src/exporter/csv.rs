//! CSV rendering of row streams.

use super::{ExportError, RowStream};
use futures::TryStreamExt;

/// A rendered export, ready to be served as a download.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub data: Vec<u8>,
}

impl ExportFile {
    pub fn csv(basename: &str, data: Vec<u8>) -> Self {
        Self {
            filename: format!("{}.csv", basename),
            content_type: "text/csv; charset=utf-8",
            data,
        }
    }
}

/// Drain the stream into CSV bytes. Stops at the first failing row.
pub async fn render_csv(mut rows: RowStream) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    while let Some(row) = rows.try_next().await? {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }

    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}
