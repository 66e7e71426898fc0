//! Output column layout for flattened killmails

use super::types::*;

/// Column holding the identifier of the record a row came from.
/// Appended by the writer after the flattened columns.
pub const SOURCE_FILE_COLUMN: &str = "source_file";

// =============================================================================
// Flattened killmail columns, in output order
// =============================================================================

pub static KILLMAIL_COLUMNS: &[Column] = &[
    // Killmail
    Column::new("killmail_id", ColumnType::Integer),
    Column::new("killmail_time", ColumnType::Text),
    Column::new("solar_system_id", ColumnType::Integer),
    Column::new("killmail_hash", ColumnType::Text),
    Column::new("http_last_modified", ColumnType::Text),
    Column::new("solar_system_name", ColumnType::Text),
    // Victim
    Column::new("victim_alliance_id", ColumnType::Integer),
    Column::new("victim_character_id", ColumnType::Integer),
    Column::new("victim_corporation_id", ColumnType::Integer),
    Column::new("victim_damage_taken", ColumnType::Integer),
    Column::new("victim_ship_type_id", ColumnType::Integer),
    Column::new("victim_ship_name", ColumnType::Text),
    Column::new("victim_ship_type", ColumnType::Text),
    Column::new("victim_position_x", ColumnType::Real),
    Column::new("victim_position_y", ColumnType::Real),
    Column::new("victim_position_z", ColumnType::Real),
    // Selected attacker
    Column::new("attacker_alliance_id", ColumnType::Integer),
    Column::new("attacker_character_id", ColumnType::Integer),
    Column::new("attacker_corporation_id", ColumnType::Integer),
    Column::new("attacker_damage_done", ColumnType::Integer),
    Column::new("attacker_final_blow", ColumnType::Boolean),
    Column::new("attacker_security_status", ColumnType::Real),
    Column::new("attacker_ship_type_id", ColumnType::Integer),
    Column::new("attacker_ship_name", ColumnType::Text),
    Column::new("attacker_ship_type", ColumnType::Text),
    Column::new("attacker_weapon_type_id", ColumnType::Integer),
    Column::new("attacker_weapon_type_name", ColumnType::Text),
    // Counts
    Column::new("total_attackers", ColumnType::Count),
    Column::new("total_items", ColumnType::Count),
    Column::new("items_destroyed", ColumnType::Count),
    Column::new("items_dropped", ColumnType::Count),
];

/// Look up a column definition by name
pub fn get_column(name: &str) -> Option<&'static Column> {
    KILLMAIL_COLUMNS.iter().find(|c| c.name == name)
}

/// Flattened column names in output order
pub fn column_names() -> impl Iterator<Item = &'static str> {
    KILLMAIL_COLUMNS.iter().map(|c| c.name)
}

/// Full CSV header: flattened columns followed by the source column
pub fn header_names() -> Vec<&'static str> {
    column_names()
        .chain(std::iter::once(SOURCE_FILE_COLUMN))
        .collect()
}
