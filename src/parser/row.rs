use std::collections::HashMap;

use super::value::CellValue;
use crate::schema::{get_column, KILLMAIL_COLUMNS};

static NULL_CELL: CellValue = CellValue::Null;

/// One flattened killmail.
///
/// Always holds exactly the columns in [`KILLMAIL_COLUMNS`]; fields missing
/// from the source record are explicit nulls.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRow {
    values: HashMap<&'static str, CellValue>,
}

impl FlatRow {
    /// A row with every column at its default: counts are 0, the rest null
    pub fn empty() -> Self {
        let values = KILLMAIL_COLUMNS
            .iter()
            .map(|col| {
                let value = if col.col_type.defaults_to_zero() {
                    CellValue::Integer(0)
                } else {
                    CellValue::Null
                };
                (col.name, value)
            })
            .collect();

        Self { values }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.values.get(column)
    }

    /// Overwrite a declared column. Unknown names are ignored so the column
    /// set never changes.
    pub(crate) fn set(&mut self, column: &str, value: CellValue) {
        debug_assert!(get_column(column).is_some(), "undeclared column {}", column);
        if let Some(slot) = self.values.get_mut(column) {
            *slot = value;
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column names present in this row, in no particular order
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().copied()
    }

    /// Cell values in declared column order
    pub fn ordered_values(&self) -> impl Iterator<Item = &CellValue> + '_ {
        KILLMAIL_COLUMNS
            .iter()
            .map(|col| self.values.get(col.name).unwrap_or(&NULL_CELL))
    }

    /// Coerce every cell to its column's declared type
    pub fn narrow(&mut self) {
        for col in KILLMAIL_COLUMNS {
            if let Some(slot) = self.values.get_mut(col.name) {
                let value = std::mem::replace(slot, CellValue::Null);
                *slot = value.coerce(col.col_type);
            }
        }
    }
}

impl Default for FlatRow {
    fn default() -> Self {
        Self::empty()
    }
}

/// A flattened row tagged with the record it came from
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedRow {
    pub source_file: String,
    pub row: FlatRow,
}
