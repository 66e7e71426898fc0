use serde_json::Value;

use super::row::FlatRow;
use super::value::CellValue;
use crate::lookup::Lookups;

static NULL: Value = Value::Null;

/// Top-level killmail fields copied unchanged
const KILLMAIL_FIELDS: &[&str] = &[
    "killmail_id",
    "killmail_time",
    "solar_system_id",
    "killmail_hash",
    "http_last_modified",
];

/// (column, victim field)
const VICTIM_FIELDS: &[(&str, &str)] = &[
    ("victim_alliance_id", "alliance_id"),
    ("victim_character_id", "character_id"),
    ("victim_corporation_id", "corporation_id"),
    ("victim_damage_taken", "damage_taken"),
    ("victim_ship_type_id", "ship_type_id"),
];

/// (column, position field)
const POSITION_FIELDS: &[(&str, &str)] = &[
    ("victim_position_x", "x"),
    ("victim_position_y", "y"),
    ("victim_position_z", "z"),
];

/// (column, attacker field)
const ATTACKER_FIELDS: &[(&str, &str)] = &[
    ("attacker_alliance_id", "alliance_id"),
    ("attacker_character_id", "character_id"),
    ("attacker_corporation_id", "corporation_id"),
    ("attacker_damage_done", "damage_done"),
    ("attacker_final_blow", "final_blow"),
    ("attacker_security_status", "security_status"),
    ("attacker_ship_type_id", "ship_type_id"),
    ("attacker_weapon_type_id", "weapon_type_id"),
];

/// Flatten one killmail into a row, joining ship, type and solar system
/// names from the lookups.
///
/// Missing or mistyped nested objects and lists count as empty and missing
/// scalars as null, so this never fails. Only one attacker is kept: see
/// [`select_attacker`].
pub fn flatten_killmail(record: &Value, lookups: &Lookups) -> FlatRow {
    let mut row = FlatRow::empty();

    for field in KILLMAIL_FIELDS {
        row.set(field, CellValue::from_json(record.get(*field)));
    }

    let system_name = lookup_key(record.get("solar_system_id"))
        .and_then(|id| lookups.system_name(id));
    row.set("solar_system_name", text(system_name));

    // Victim. `Value::get` yields None on anything but an object.
    let victim = record.get("victim").unwrap_or(&NULL);
    copy_fields(&mut row, victim, VICTIM_FIELDS);
    set_ship(
        &mut row,
        lookups,
        victim.get("ship_type_id"),
        "victim_ship_name",
        "victim_ship_type",
    );

    let position = victim.get("position").unwrap_or(&NULL);
    copy_fields(&mut row, position, POSITION_FIELDS);

    // Selected attacker
    let attackers = array(record.get("attackers"));
    if let Some(attacker) = select_attacker(attackers).map(|idx| &attackers[idx]) {
        copy_fields(&mut row, attacker, ATTACKER_FIELDS);
        set_ship(
            &mut row,
            lookups,
            attacker.get("ship_type_id"),
            "attacker_ship_name",
            "attacker_ship_type",
        );

        let weapon_name = lookup_key(attacker.get("weapon_type_id"))
            .and_then(|id| lookups.type_name(id));
        row.set("attacker_weapon_type_name", text(weapon_name));
    }

    row.set("total_attackers", count(attackers.len()));

    // Items. An item may carry both quantities and then counts for both.
    let items = array(victim.get("items"));
    let destroyed = items
        .iter()
        .filter(|item| item.get("quantity_destroyed").is_some())
        .count();
    let dropped = items
        .iter()
        .filter(|item| item.get("quantity_dropped").is_some())
        .count();

    row.set("total_items", count(items.len()));
    row.set("items_destroyed", count(destroyed));
    row.set("items_dropped", count(dropped));

    row
}

/// Pick the attacker that represents a killmail: the first one with
/// `final_blow: true`, or the first in the list when nobody has it.
/// Returns `None` for an empty list.
pub fn select_attacker(attackers: &[Value]) -> Option<usize> {
    attackers
        .iter()
        .position(|a| a.get("final_blow").and_then(Value::as_bool) == Some(true))
        .or_else(|| (!attackers.is_empty()).then_some(0))
}

fn copy_fields(row: &mut FlatRow, source: &Value, fields: &[(&str, &str)]) {
    for (column, field) in fields {
        row.set(column, CellValue::from_json(source.get(*field)));
    }
}

/// Ship name and type are set together or not at all
fn set_ship(
    row: &mut FlatRow,
    lookups: &Lookups,
    ship_type_id: Option<&Value>,
    name_column: &str,
    type_column: &str,
) {
    if let Some(ship) = lookup_key(ship_type_id).and_then(|id| lookups.ship(id)) {
        row.set(name_column, CellValue::Text(ship.name.clone()));
        row.set(type_column, CellValue::Text(ship.ship_type.clone()));
    }
}

/// Catalog key for an id field: integers, or numbers and strings that read
/// as one. Booleans never match.
fn lookup_key(value: Option<&Value>) -> Option<i64> {
    match CellValue::from_json(value) {
        CellValue::Boolean(_) => None,
        cell => cell.as_i64(),
    }
}

fn array(value: Option<&Value>) -> &[Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn text(value: Option<&str>) -> CellValue {
    value
        .map(|s| CellValue::Text(s.to_string()))
        .unwrap_or(CellValue::Null)
}

fn count(n: usize) -> CellValue {
    CellValue::Integer(n as i64)
}
