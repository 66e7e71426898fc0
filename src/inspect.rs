use std::fs::File;
use std::path::Path;

use crate::lookup::{read_ship_catalog, read_system_catalog, read_type_catalog, CatalogPaths, NameCatalog};
use crate::schema::{KILLMAIL_COLUMNS, SOURCE_FILE_COLUMN};

/// Entries shown per catalog
const SAMPLE_ENTRIES: usize = 5;

/// Describe each configured catalog: entry count, columns used, a few
/// sample entries
pub fn describe_catalogs(paths: &CatalogPaths) -> Vec<String> {
    let mut lines = Vec::new();

    match paths.ships.as_deref() {
        Some(path) => match File::open(path).map_err(anyhow::Error::from).and_then(read_ship_catalog) {
            Ok(ships) => {
                lines.push(format!("Ships: {} entries from {:?}", ships.len(), path));
                let mut ids: Vec<_> = ships.keys().copied().collect();
                ids.sort_unstable();
                for id in ids.into_iter().take(SAMPLE_ENTRIES) {
                    let ship = &ships[&id];
                    lines.push(format!("  {}: {} ({})", id, ship.name, ship.ship_type));
                }
            }
            Err(e) => lines.push(format!("Ships: unreadable {:?}: {:#}", path, e)),
        },
        None => lines.push("Ships: not configured".to_string()),
    }

    describe_names(&mut lines, "Types", paths.types.as_deref(), read_type_catalog);
    describe_names(&mut lines, "Solar systems", paths.systems.as_deref(), read_system_catalog);

    lines
}

fn describe_names(
    lines: &mut Vec<String>,
    label: &str,
    path: Option<&Path>,
    read: fn(File) -> anyhow::Result<Option<NameCatalog>>,
) {
    let Some(path) = path else {
        lines.push(format!("{}: not configured", label));
        return;
    };

    match File::open(path).map_err(anyhow::Error::from).and_then(read) {
        Ok(Some(catalog)) => {
            lines.push(format!(
                "{}: {} entries from {:?} (id column {}, name column {}, by {})",
                label,
                catalog.names.len(),
                path,
                catalog.columns.id,
                catalog.columns.name,
                catalog.columns.resolution
            ));
            let mut ids: Vec<_> = catalog.names.keys().copied().collect();
            ids.sort_unstable();
            for id in ids.into_iter().take(SAMPLE_ENTRIES) {
                lines.push(format!("  {}: {}", id, catalog.names[&id]));
            }
        }
        Ok(None) => lines.push(format!("{}: {:?} is empty", label, path)),
        Err(e) => lines.push(format!("{}: unreadable {:?}: {:#}", label, path, e)),
    }
}

/// One line per output column: position, name, type
pub fn describe_columns() -> Vec<String> {
    KILLMAIL_COLUMNS
        .iter()
        .map(|col| (col.name, col.col_type.to_string()))
        .chain(std::iter::once((SOURCE_FILE_COLUMN, "text".to_string())))
        .enumerate()
        .map(|(i, (name, col_type))| format!("{:>3}  {:<28} {}", i + 1, name, col_type))
        .collect()
}
