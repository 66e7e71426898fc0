use anyhow::{Context, Result};
use csv::StringRecord;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, trace, warn};

use super::resolve::{resolve_columns, CatalogLayout, ResolvedColumns, SYSTEM_LAYOUT, TYPE_LAYOUT};
use super::ShipInfo;

/// Number of leading columns the ship catalog must carry (id, name, type)
const SHIP_COLUMNS: usize = 3;

/// An id -> name catalog together with the columns it was read from
#[derive(Debug, Clone)]
pub struct NameCatalog {
    pub names: HashMap<i64, String>,
    pub columns: ResolvedColumns,
}

/// Read the ship catalog: headerless `id,name,type` rows.
///
/// A header row, if present, is dropped along with any other row whose
/// first field is not an integer. A catalog where no row reaches the
/// `id,name,type` width is an error.
pub fn read_ship_catalog<R: Read>(reader: R) -> Result<HashMap<i64, ShipInfo>> {
    let mut rdr = csv_reader(reader);
    let mut ships = HashMap::new();
    let mut widest = None;

    for (row_num, result) in rdr.records().enumerate() {
        let Some(record) = next_record(result, row_num)? else {
            continue;
        };
        widest = widest.max(Some(record.len()));
        if record.len() < SHIP_COLUMNS {
            trace!(row = row_num, "ship row has too few columns");
            continue;
        }
        let Some(id) = parse_id(&record[0]) else {
            trace!(row = row_num, "ship row has no integer id");
            continue;
        };

        ships.insert(
            id,
            ShipInfo {
                name: record[1].trim().to_string(),
                ship_type: record[2].trim().to_string(),
            },
        );
    }

    if let Some(width) = widest.filter(|&w| w < SHIP_COLUMNS) {
        anyhow::bail!(
            "ship catalog has {} columns, need at least {}",
            width,
            SHIP_COLUMNS
        );
    }

    Ok(ships)
}

/// Read the type catalog (weapons, items) as `type id -> type name`
pub fn read_type_catalog<R: Read>(reader: R) -> Result<Option<NameCatalog>> {
    read_name_catalog(reader, &TYPE_LAYOUT)
}

/// Read the solar system catalog as `solar system id -> name`
pub fn read_system_catalog<R: Read>(reader: R) -> Result<Option<NameCatalog>> {
    read_name_catalog(reader, &SYSTEM_LAYOUT)
}

/// Read a headed id/name catalog. Returns `None` for a source without a
/// header row.
fn read_name_catalog<R: Read>(reader: R, layout: &CatalogLayout) -> Result<Option<NameCatalog>> {
    let mut rdr = csv_reader(reader);
    let mut records = rdr.records();

    let header = match records.next() {
        Some(result) => result.context("Failed to read header row")?,
        None => return Ok(None),
    };

    let columns = resolve_columns(header.iter(), layout);
    if header.len() < columns.min_width() {
        anyhow::bail!(
            "{} catalog has {} columns, need at least {}",
            layout.label,
            header.len(),
            columns.min_width()
        );
    }

    let mut names = HashMap::new();

    // Row numbers are 1-based and the header is row 1
    for (idx, result) in records.enumerate() {
        let row_num = idx + 2;
        let Some(record) = next_record(result, row_num)? else {
            continue;
        };
        if record.len() < columns.min_width() {
            trace!(row = row_num, "{} row has too few columns", layout.label);
            continue;
        }
        let Some(id) = parse_id(&record[columns.id]) else {
            trace!(row = row_num, "{} row has no integer id", layout.label);
            continue;
        };

        names.insert(id, record[columns.name].trim().to_string());
    }

    Ok(Some(NameCatalog { names, columns }))
}

// =============================================================================
// Path-based loaders. These never fail: a broken catalog is an empty one.
// =============================================================================

/// Load the ship catalog, or an empty map if it can't be read
pub fn load_ship_catalog(path: Option<&Path>) -> HashMap<i64, ShipInfo> {
    let Some(path) = path else {
        return HashMap::new();
    };

    match open(path).and_then(read_ship_catalog) {
        Ok(ships) => {
            info!("Loaded {} ships from {:?}", ships.len(), path);
            ships
        }
        Err(e) => {
            warn!("Could not load ship data from {:?}: {:#}", path, e);
            warn!("Ship names and types will be empty");
            HashMap::new()
        }
    }
}

/// Load the type catalog, or an empty map if it can't be read
pub fn load_type_catalog(path: Option<&Path>) -> HashMap<i64, String> {
    load_name_catalog(path, &TYPE_LAYOUT, read_type_catalog)
}

/// Load the solar system catalog, or an empty map if it can't be read
pub fn load_system_catalog(path: Option<&Path>) -> HashMap<i64, String> {
    load_name_catalog(path, &SYSTEM_LAYOUT, read_system_catalog)
}

fn load_name_catalog(
    path: Option<&Path>,
    layout: &CatalogLayout,
    read: fn(File) -> Result<Option<NameCatalog>>,
) -> HashMap<i64, String> {
    let Some(path) = path else {
        return HashMap::new();
    };

    match open(path).and_then(read) {
        Ok(Some(catalog)) => {
            info!(
                "Loaded {} {} names from {:?} (id column {}, name column {}, by {})",
                catalog.names.len(),
                layout.label,
                path,
                catalog.columns.id,
                catalog.columns.name,
                catalog.columns.resolution
            );
            catalog.names
        }
        Ok(None) => {
            warn!("{} catalog {:?} is empty", layout.label, path);
            HashMap::new()
        }
        Err(e) => {
            warn!("Could not load {} data from {:?}: {:#}", layout.label, path, e);
            warn!("{} names will be empty", layout.label);
            HashMap::new()
        }
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open: {:?}", path))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader)
}

/// I/O errors abort the whole catalog; anything else only loses the row
fn next_record(
    result: csv::Result<StringRecord>,
    row_num: usize,
) -> Result<Option<StringRecord>> {
    match result {
        Ok(record) => Ok(Some(record)),
        Err(e) if e.is_io_error() => Err(e).context("Failed to read catalog"),
        Err(e) => {
            trace!(row = row_num, "skipping malformed row: {}", e);
            Ok(None)
        }
    }
}

fn parse_id(field: &str) -> Option<i64> {
    field.trim().parse().ok()
}
