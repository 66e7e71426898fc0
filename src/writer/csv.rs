use csv::Writer;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::ConvertError;
use crate::parser::TaggedRow;
use crate::schema::header_names;
use crate::ui::Ui;

/// Rows between progress updates while writing
const PROGRESS_INTERVAL: usize = 1000;

/// Writes flattened rows as CSV in declared column order
pub struct CsvWriter<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> CsvWriter<W> {
    pub fn from_writer(inner: W) -> Self {
        Self {
            writer: Writer::from_writer(inner),
        }
    }

    pub fn write_header(&mut self) -> csv::Result<()> {
        self.writer.write_record(header_names())
    }

    pub fn write_row(&mut self, row: &TaggedRow) -> csv::Result<()> {
        let fields = row
            .row
            .ordered_values()
            .map(|v| v.to_string())
            .chain(std::iter::once(row.source_file.clone()));
        self.writer.write_record(fields)
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> csv::Result<W> {
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
    }
}

/// Write all rows to `path`, replacing any existing file.
///
/// Rows go to a temporary file in the same directory that is renamed over
/// `path` once complete. On failure `path` is left as it was.
pub fn write_rows(path: &Path, rows: &[TaggedRow], ui: &mut impl Ui) -> Result<u64, ConvertError> {
    let wrap = |source: csv::Error| ConvertError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staging = NamedTempFile::new_in(dir).map_err(|e| wrap(e.into()))?;
    debug!("Staging CSV at {:?}", staging.path());

    let mut writer = CsvWriter::from_writer(staging);
    writer.write_header().map_err(wrap)?;

    let total = rows.len() as u64;
    for (i, row) in rows.iter().enumerate() {
        writer.write_row(row).map_err(wrap)?;
        if (i + 1) % PROGRESS_INTERVAL == 0 {
            ui.set_progress(i as u64 + 1, total, "Writing rows");
        }
    }
    ui.set_progress(total, total, "Writing rows");

    let staging = writer.finish().map_err(wrap)?;
    staging.persist(path).map_err(|e| wrap(e.error.into()))?;
    debug!("Wrote {} rows to {:?}", total, path);

    Ok(total)
}
