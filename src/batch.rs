//! Batch conversion: enumerate records, flatten them in parallel, write CSV

use rayon::prelude::*;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::ConvertError;
use crate::lookup::Lookups;
use crate::parser::{flatten_killmail, CellValue, TaggedRow};
use crate::source::RecordSource;
use crate::ui::{Phase, Tally, Ui};
use crate::writer::write_rows;

/// Records read and flattened per chunk
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Failure messages shown in a summary report
pub const FAILURE_SAMPLE: usize = 10;

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub batch_size: usize,
    /// Worker threads for flattening; `None` uses rayon's global pool
    pub threads: Option<usize>,
    /// Coerce every cell to its column's declared type before writing
    pub narrow_types: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            threads: None,
            narrow_types: true,
        }
    }
}

/// A record that could not be turned into a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    pub source: String,
    pub message: String,
}

impl fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.message)
    }
}

/// Rows in enumeration order plus the records that failed
#[derive(Debug, Clone, Default)]
pub struct FlattenOutcome {
    pub records: usize,
    pub rows: Vec<TaggedRow>,
    pub failures: Vec<RecordFailure>,
}

/// How many ids in the output found a name in their catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    pub victim_ship_ids: usize,
    pub victim_ships_matched: usize,
    pub attacker_ship_ids: usize,
    pub attacker_ships_matched: usize,
    pub weapon_ids: usize,
    pub weapons_matched: usize,
    pub system_ids: usize,
    pub systems_matched: usize,
}

impl MatchStats {
    pub fn from_rows(rows: &[TaggedRow]) -> Self {
        let count = |column: &str| rows.iter().filter(|r| has_value(r, column)).count();

        Self {
            victim_ship_ids: count("victim_ship_type_id"),
            victim_ships_matched: count("victim_ship_name"),
            attacker_ship_ids: count("attacker_ship_type_id"),
            attacker_ships_matched: count("attacker_ship_name"),
            weapon_ids: count("attacker_weapon_type_id"),
            weapons_matched: count("attacker_weapon_type_name"),
            system_ids: count("solar_system_id"),
            systems_matched: count("solar_system_name"),
        }
    }
}

/// Result of a completed run, for the caller to render
#[derive(Debug, Clone)]
pub struct ConversionSummary {
    pub output: PathBuf,
    pub records: usize,
    pub rows_written: u64,
    pub failures: Vec<RecordFailure>,
    pub matches: MatchStats,
    pub elapsed: Duration,
}

impl ConversionSummary {
    /// The first `n` failures
    pub fn sample_failures(&self, n: usize) -> &[RecordFailure] {
        &self.failures[..n.min(self.failures.len())]
    }

    /// Human-readable report: totals, lookup match rates, sampled failures
    pub fn report_lines(&self) -> Vec<String> {
        let m = &self.matches;
        let mut lines = vec![
            format!(
                "Converted {} of {} records to {:?} in {:.1}s",
                self.rows_written,
                self.records,
                self.output,
                self.elapsed.as_secs_f64()
            ),
            format!(
                "Ship name matches: {}/{} victims, {}/{} attackers",
                m.victim_ships_matched, m.victim_ship_ids, m.attacker_ships_matched, m.attacker_ship_ids
            ),
            format!("Weapon type matches: {}/{}", m.weapons_matched, m.weapon_ids),
            format!("Solar system matches: {}/{}", m.systems_matched, m.system_ids),
        ];

        lines.extend(failure_lines(&self.failures));
        lines
    }
}

/// Failure count plus the first `FAILURE_SAMPLE` messages; empty when
/// nothing failed
pub fn failure_lines(failures: &[RecordFailure]) -> Vec<String> {
    if failures.is_empty() {
        return Vec::new();
    }

    let mut lines = vec![format!("Failed records: {}", failures.len())];
    for failure in failures.iter().take(FAILURE_SAMPLE) {
        lines.push(format!("  - {}", failure));
    }
    if failures.len() > FAILURE_SAMPLE {
        lines.push(format!("  ... and {} more", failures.len() - FAILURE_SAMPLE));
    }
    lines
}

/// Flatten every record of a source.
///
/// Records are read chunk by chunk; each chunk is parsed and flattened in
/// parallel. Output order is the source's identifier order whatever the
/// chunk size or thread count.
pub fn flatten_source(
    source: &mut dyn RecordSource,
    lookups: &Lookups,
    options: &ConvertOptions,
    ui: &mut impl Ui,
) -> Result<FlattenOutcome, ConvertError> {
    let ids = source.identifiers().map_err(|e| ConvertError::Source {
        description: source.describe(),
        source: e,
    })?;

    info!("Found {} killmail records in {}", ids.len(), source.describe());
    ui.set_info(format!("{} records in {}", ids.len(), source.describe()));

    let pool = build_pool(options.threads);
    let batch_size = options.batch_size.max(1);
    let total = ids.len() as u64;

    let mut outcome = FlattenOutcome {
        records: ids.len(),
        ..Default::default()
    };

    for (chunk_idx, chunk) in ids.chunks(batch_size).enumerate() {
        debug!("Processing chunk {} ({} records)", chunk_idx + 1, chunk.len());

        // Reads stay sequential: sources such as zip archives need `&mut`
        ui.set_phase(Phase::Reading);
        let raw: Vec<(&str, anyhow::Result<Vec<u8>>)> = chunk
            .iter()
            .map(|id| (id.as_str(), source.read_record(id)))
            .collect();

        ui.set_phase(Phase::Flattening);

        let narrow = options.narrow_types;
        let flatten_chunk = || -> Vec<Result<TaggedRow, RecordFailure>> {
            // Indexed parallel collect keeps input order
            raw.into_par_iter()
                .map(|(id, bytes)| parse_killmail(id, bytes, lookups, narrow))
                .collect()
        };
        let results = match &pool {
            Some(pool) => pool.install(flatten_chunk),
            None => flatten_chunk(),
        };

        for result in results {
            match result {
                Ok(row) => outcome.rows.push(row),
                Err(failure) => {
                    debug!("Skipping {}", failure);
                    outcome.failures.push(failure);
                }
            }
        }

        let done = (chunk_idx * batch_size + chunk.len()) as u64;
        ui.set_progress(done, total, "Flattening killmails");
        ui.set_tally(Tally {
            converted: outcome.rows.len() as u64,
            failed: outcome.failures.len() as u64,
        });
    }

    if !outcome.failures.is_empty() {
        warn!("{} records could not be converted", outcome.failures.len());
    }

    Ok(outcome)
}

/// Flatten every record of `source` and write the rows to `output`.
///
/// Fails only when the source can't be enumerated, when no record could be
/// converted (no file is created then) or when the CSV can't be written.
pub fn convert_killmails(
    source: &mut dyn RecordSource,
    lookups: &Lookups,
    output: &Path,
    options: &ConvertOptions,
    ui: &mut impl Ui,
) -> Result<ConversionSummary, ConvertError> {
    let start = Instant::now();

    let outcome = flatten_source(source, lookups, options, ui)?;

    if outcome.rows.is_empty() {
        return Err(ConvertError::NoData {
            records: outcome.records,
            failures: outcome.failures,
        });
    }

    ui.set_phase(Phase::Writing);
    info!("Writing {} rows to {:?}", outcome.rows.len(), output);
    let rows_written = write_rows(output, &outcome.rows, ui)?;
    ui.clear_progress();

    Ok(ConversionSummary {
        output: output.to_path_buf(),
        records: outcome.records,
        rows_written,
        matches: MatchStats::from_rows(&outcome.rows),
        failures: outcome.failures,
        elapsed: start.elapsed(),
    })
}

/// Parse, flatten and tag one raw record
fn parse_killmail(
    id: &str,
    bytes: anyhow::Result<Vec<u8>>,
    lookups: &Lookups,
    narrow: bool,
) -> Result<TaggedRow, RecordFailure> {
    let fail = |message: String| RecordFailure {
        source: id.to_string(),
        message,
    };

    let bytes = bytes.map_err(|e| fail(format!("{:#}", e)))?;
    let record: Value =
        serde_json::from_slice(&bytes).map_err(|e| fail(format!("JSON decode error: {}", e)))?;

    if !record.is_object() {
        return Err(fail(format!(
            "expected a JSON object, found {}",
            json_kind(&record)
        )));
    }

    let mut row = flatten_killmail(&record, lookups);
    if narrow {
        row.narrow();
    }

    Ok(TaggedRow {
        source_file: id.to_string(),
        row,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn build_pool(threads: Option<usize>) -> Option<rayon::ThreadPool> {
    let threads = threads?;
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => Some(pool),
        Err(e) => {
            warn!("Could not start {} worker threads, using default pool: {}", threads, e);
            None
        }
    }
}

/// Whether a row carries a value in `column`
pub fn has_value(row: &TaggedRow, column: &str) -> bool {
    !matches!(row.row.get(column), None | Some(CellValue::Null))
}
