//! Two-stage column resolution for catalog CSV files.
//!
//! Catalog exports are not consistent about header names, so the id and name
//! columns are first searched for by alias. When either alias search comes
//! up empty, the known fixed layout of that catalog is used instead.

use std::fmt;

/// Where a catalog keeps its id and name columns
#[derive(Debug, Clone)]
pub struct CatalogLayout {
    pub label: &'static str,
    /// Lower-case header names accepted for the id column
    pub id_aliases: &'static [&'static str],
    /// Lower-case header names accepted for the name column
    pub name_aliases: &'static [&'static str],
    /// Positions used when the header doesn't name both columns
    pub fallback_id: usize,
    pub fallback_name: usize,
}

pub static TYPE_LAYOUT: CatalogLayout = CatalogLayout {
    label: "type",
    id_aliases: &["typeid", "type_id", "id"],
    name_aliases: &["typename", "type_name", "name"],
    fallback_id: 0,
    fallback_name: 1,
};

pub static SYSTEM_LAYOUT: CatalogLayout = CatalogLayout {
    label: "solar system",
    id_aliases: &["solarsystemid", "solar_system_id", "systemid", "system_id"],
    name_aliases: &[
        "solarsystemname",
        "solar_system_name",
        "systemname",
        "system_name",
    ],
    fallback_id: 2,
    fallback_name: 3,
};

/// Which stage produced the column positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Header,
    Positional,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Header => write!(f, "header aliases"),
            Resolution::Positional => write!(f, "fixed positions"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub id: usize,
    pub name: usize,
    pub resolution: Resolution,
}

impl ResolvedColumns {
    /// Minimum number of fields a row needs to carry both columns
    pub fn min_width(&self) -> usize {
        self.id.max(self.name) + 1
    }
}

/// Resolve id/name column positions from a header row.
///
/// A header field is matched against the id aliases first; only fields that
/// are not an id alias are tried as a name alias. If several fields match,
/// the last one wins.
pub fn resolve_columns<'a, I>(header: I, layout: &CatalogLayout) -> ResolvedColumns
where
    I: IntoIterator<Item = &'a str>,
{
    let mut id = None;
    let mut name = None;

    for (i, field) in header.into_iter().enumerate() {
        let normalized = normalize_header(field);
        if layout.id_aliases.contains(&normalized.as_str()) {
            id = Some(i);
        } else if layout.name_aliases.contains(&normalized.as_str()) {
            name = Some(i);
        }
    }

    match (id, name) {
        (Some(id), Some(name)) => ResolvedColumns {
            id,
            name,
            resolution: Resolution::Header,
        },
        _ => ResolvedColumns {
            id: layout.fallback_id,
            name: layout.fallback_name,
            resolution: Resolution::Positional,
        },
    }
}

fn normalize_header(field: &str) -> String {
    field.trim_start_matches('\u{feff}').trim().to_lowercase()
}
