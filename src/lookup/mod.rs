//! Catalog lookups joined into flattened killmails by id

pub mod catalog;
pub mod resolve;

pub use catalog::*;
pub use resolve::*;

use std::collections::HashMap;
use std::path::PathBuf;

/// Ship catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipInfo {
    pub name: String,
    pub ship_type: String,
}

/// Locations of the three catalog CSV files. Any of them may be absent.
#[derive(Debug, Clone, Default)]
pub struct CatalogPaths {
    pub ships: Option<PathBuf>,
    pub types: Option<PathBuf>,
    pub systems: Option<PathBuf>,
}

/// The three catalogs, built once before any record is flattened and only
/// read afterwards.
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    pub ships: HashMap<i64, ShipInfo>,
    pub types: HashMap<i64, String>,
    pub systems: HashMap<i64, String>,
}

impl Lookups {
    /// Load all catalogs. Unreadable catalogs come back empty.
    pub fn load(paths: &CatalogPaths) -> Self {
        Self {
            ships: load_ship_catalog(paths.ships.as_deref()),
            types: load_type_catalog(paths.types.as_deref()),
            systems: load_system_catalog(paths.systems.as_deref()),
        }
    }

    pub fn ship(&self, id: i64) -> Option<&ShipInfo> {
        self.ships.get(&id)
    }

    pub fn type_name(&self, id: i64) -> Option<&str> {
        self.types.get(&id).map(String::as_str)
    }

    pub fn system_name(&self, id: i64) -> Option<&str> {
        self.systems.get(&id).map(String::as_str)
    }
}
