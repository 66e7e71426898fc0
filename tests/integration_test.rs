//! End-to-end tests: killmail files and catalog CSVs on disk, through the
//! batch driver, to a CSV file read back with the `csv` crate.

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use eve_killmail_to_csv::lookup::{load_type_catalog, CatalogPaths, Lookups};
use eve_killmail_to_csv::schema::{header_names, KILLMAIL_COLUMNS};
use eve_killmail_to_csv::source::{open_source, DirectorySource};
use eve_killmail_to_csv::{
    convert_killmails, flatten_killmail, select_attacker, CellValue, ConvertError,
    ConvertOptions, SilentUi,
};

// =============================================================================
// Test Configuration
// =============================================================================

/// Random seed for reproducible attacker shuffles
const RANDOM_SEED: u64 = 42;

/// Shuffles tried per tie-break test
const SHUFFLE_ROUNDS: usize = 20;

// =============================================================================
// Shared Fixtures
// =============================================================================

/// Catalog files written once and loaded through the real loaders
struct CatalogFixture {
    _dir: TempDir,
    paths: CatalogPaths,
}

impl CatalogFixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");

        let ships = dir.path().join("shiplist.csv");
        fs::write(
            &ships,
            "587,Rifter,Frigate\n24690,Drake,Battlecruiser\n17738,Machariel,Battleship\n",
        )
        .unwrap();

        let types = dir.path().join("typeid.csv");
        fs::write(
            &types,
            "typeID,groupID,typeName\n2873,74,125mm Gatling AutoCannon II\n24475,771,Scourge Heavy Missile\n",
        )
        .unwrap();

        let systems = dir.path().join("mapSolarSystems.csv");
        fs::write(
            &systems,
            "regionID,constellationID,solarSystemID,solarSystemName,security\n\
             10000002,20000020,30000142,Jita,0.9459\n\
             10000043,20000322,30002187,Amarr,1.0\n",
        )
        .unwrap();

        Self {
            paths: CatalogPaths {
                ships: Some(ships),
                types: Some(types),
                systems: Some(systems),
            },
            _dir: dir,
        }
    }
}

static CATALOGS: Lazy<CatalogFixture> = Lazy::new(CatalogFixture::new);

static LOOKUPS: Lazy<Lookups> = Lazy::new(|| Lookups::load(&CATALOGS.paths));

fn killmail(id: i64, final_blow_idx: Option<usize>, attackers: usize) -> Value {
    let attackers: Vec<Value> = (0..attackers)
        .map(|i| {
            let final_blow = Some(i) == final_blow_idx;
            json!({
                "character_id": 1000 + i,
                "corporation_id": 98000000 + i,
                "damage_done": 100 * (i + 1),
                "final_blow": final_blow,
                "security_status": -1.5,
                "ship_type_id": 24690,
                "weapon_type_id": 24475
            })
        })
        .collect();

    json!({
        "killmail_id": id,
        "killmail_time": "2025-07-07T12:00:00Z",
        "solar_system_id": 30000142,
        "killmail_hash": format!("hash{}", id),
        "http_last_modified": "Mon, 07 Jul 2025 12:05:00 GMT",
        "victim": {
            "character_id": 2000,
            "corporation_id": 98000100,
            "damage_taken": 5000,
            "ship_type_id": 587,
            "position": {"x": 1.0, "y": 2.5, "z": -3.0},
            "items": [{"item_type_id": 2873, "quantity_destroyed": 1}]
        },
        "attackers": attackers
    })
}

fn write_killmail_dir(dir: &Path, files: &[(&str, String)]) {
    fs::create_dir_all(dir).unwrap();
    for (name, body) in files {
        fs::write(dir.join(name), body).unwrap();
    }
}

/// Read a CSV file into header + rows keyed by column name
fn read_csv(path: &Path) -> (Vec<String>, Vec<HashMap<String, String>>) {
    let mut rdr = csv::Reader::from_path(path).expect("Failed to open output CSV");
    let header: Vec<String> = rdr.headers().unwrap().iter().map(str::to_string).collect();
    let rows = rdr
        .records()
        .map(|r| {
            let record = r.unwrap();
            header
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect()
        })
        .collect();
    (header, rows)
}

fn convert_dir(input: &Path, output: &Path) -> Result<eve_killmail_to_csv::ConversionSummary, ConvertError> {
    let mut source = DirectorySource::new(input);
    convert_killmails(
        &mut source,
        &LOOKUPS,
        output,
        &ConvertOptions::default(),
        &mut SilentUi::new(),
    )
}

// =============================================================================
// Batch Scenarios
// =============================================================================

#[test]
fn test_three_valid_one_malformed() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("killmails");
    let output = tmp.path().join("killmails.csv");

    write_killmail_dir(
        &input,
        &[
            ("c.json", killmail(3, Some(0), 1).to_string()),
            ("a.json", killmail(1, Some(1), 3).to_string()),
            ("broken.json", "{\"killmail_id\": 4,".to_string()),
            ("b.json", killmail(2, None, 2).to_string()),
            ("notes.txt", "ignored".to_string()),
        ],
    );

    let summary = convert_dir(&input, &output).unwrap();
    assert_eq!(summary.records, 4);
    assert_eq!(summary.rows_written, 3);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].source, "broken.json");
    assert!(summary.failures[0].message.starts_with("JSON decode error"));

    let (header, rows) = read_csv(&output);
    assert_eq!(header, header_names());
    assert_eq!(rows.len(), 3);

    // Lexicographic source order
    let sources: Vec<_> = rows.iter().map(|r| r["source_file"].as_str()).collect();
    assert_eq!(sources, vec!["a.json", "b.json", "c.json"]);

    let a = &rows[0];
    assert_eq!(a["killmail_id"], "1");
    assert_eq!(a["solar_system_name"], "Jita");
    assert_eq!(a["victim_ship_name"], "Rifter");
    assert_eq!(a["victim_ship_type"], "Frigate");
    assert_eq!(a["victim_position_x"], "1.0");
    assert_eq!(a["victim_position_y"], "2.5");
    assert_eq!(a["attacker_character_id"], "1001");
    assert_eq!(a["attacker_final_blow"], "True");
    assert_eq!(a["attacker_security_status"], "-1.5");
    assert_eq!(a["attacker_ship_name"], "Drake");
    assert_eq!(a["attacker_weapon_type_name"], "Scourge Heavy Missile");
    assert_eq!(a["total_attackers"], "3");
    assert_eq!(a["total_items"], "1");
    assert_eq!(a["items_destroyed"], "1");
    assert_eq!(a["items_dropped"], "0");

    // No final blow: first attacker, flag written as False
    let b = &rows[1];
    assert_eq!(b["attacker_character_id"], "1000");
    assert_eq!(b["attacker_final_blow"], "False");

    assert_eq!(summary.matches.systems_matched, 3);
    assert_eq!(summary.matches.weapons_matched, 3);
}

#[test]
fn test_zero_valid_records_writes_no_file() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("killmails");
    let output = tmp.path().join("killmails.csv");

    write_killmail_dir(
        &input,
        &[
            ("1.json", "not json".to_string()),
            ("2.json", "[]".to_string()),
        ],
    );

    let err = convert_dir(&input, &output).unwrap_err();
    match &err {
        ConvertError::NoData { records, failures } => {
            assert_eq!(*records, 2);
            let sources: Vec<_> = failures.iter().map(|f| f.source.as_str()).collect();
            assert_eq!(sources, vec!["1.json", "2.json"]);
            assert!(failures[1].message.contains("JSON object"));
        }
        other => panic!("expected NoData, got {:?}", other),
    }
    assert!(!output.exists());
}

#[test]
fn test_empty_directory_writes_no_file() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("killmails");
    fs::create_dir_all(&input).unwrap();
    let output = tmp.path().join("killmails.csv");

    let err = convert_dir(&input, &output).unwrap_err();
    assert!(matches!(err, ConvertError::NoData { records: 0, .. }));
    assert!(!output.exists());
}

#[test]
fn test_missing_input_directory_is_source_error() {
    let tmp = TempDir::new().unwrap();
    let err = convert_dir(&tmp.path().join("nope"), &tmp.path().join("out.csv")).unwrap_err();
    assert!(matches!(err, ConvertError::Source { .. }));
}

#[test]
fn test_zip_and_directory_agree() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("killmails");
    let files: Vec<(String, String)> = (1..=5)
        .map(|i| (format!("{}.json", i), killmail(i, Some(0), 2).to_string()))
        .collect();
    let refs: Vec<(&str, String)> = files.iter().map(|(n, b)| (n.as_str(), b.clone())).collect();
    write_killmail_dir(&input, &refs);

    let zip_path = tmp.path().join("killmails.zip");
    {
        let mut zip = zip::ZipWriter::new(fs::File::create(&zip_path).unwrap());
        let options = zip::write::SimpleFileOptions::default();
        // Written out of order on purpose
        for (name, body) in files.iter().rev() {
            zip.start_file(name.as_str(), options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    let dir_out = tmp.path().join("dir.csv");
    let zip_out = tmp.path().join("zip.csv");
    let options = ConvertOptions::default();

    let mut dir_source = open_source(&input).unwrap();
    convert_killmails(dir_source.as_mut(), &LOOKUPS, &dir_out, &options, &mut SilentUi::new())
        .unwrap();
    let mut zip_source = open_source(&zip_path).unwrap();
    convert_killmails(zip_source.as_mut(), &LOOKUPS, &zip_out, &options, &mut SilentUi::new())
        .unwrap();

    assert_eq!(
        fs::read_to_string(&dir_out).unwrap(),
        fs::read_to_string(&zip_out).unwrap()
    );
}

#[test]
fn test_unwritable_output_is_write_error() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("killmails");
    write_killmail_dir(&input, &[("1.json", killmail(1, Some(0), 1).to_string())]);

    let output: PathBuf = tmp.path().join("no_such_dir").join("out.csv");
    let err = convert_dir(&input, &output).unwrap_err();
    assert!(matches!(err, ConvertError::Write { .. }));
}

// =============================================================================
// Flattener Properties
// =============================================================================

#[test]
fn test_column_set_is_fixed() {
    let records = [
        killmail(1, Some(0), 4),
        json!({}),
        json!({"victim": null, "attackers": [{}]}),
        json!({"killmail_id": 9, "extra": {"nested": [1, 2, 3]}}),
    ];

    for record in &records {
        let row = flatten_killmail(record, &LOOKUPS);
        let mut names: Vec<_> = row.column_names().collect();
        names.sort_unstable();
        let mut expected: Vec<_> = KILLMAIL_COLUMNS.iter().map(|c| c.name).collect();
        expected.sort_unstable();
        assert_eq!(names, expected);
    }
}

#[test]
fn test_flatten_twice_is_identical() {
    let record = killmail(7, Some(2), 5);
    let first = flatten_killmail(&record, &LOOKUPS);
    let second = flatten_killmail(&record, &LOOKUPS);
    assert_eq!(first, second);

    let render = |row: &eve_killmail_to_csv::FlatRow| {
        row.ordered_values()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    };
    assert_eq!(render(&first), render(&second));
}

#[test]
fn test_final_blow_attacker_selected_under_shuffles() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(RANDOM_SEED);

    for _ in 0..SHUFFLE_ROUNDS {
        let mut attackers: Vec<Value> = (0..6)
            .map(|i| json!({"character_id": i, "final_blow": false}))
            .collect();
        attackers.shuffle(&mut rng);
        attackers[2] = json!({"character_id": 99, "final_blow": true});
        // Some attackers carry no flag at all
        if let Some(obj) = attackers[4].as_object_mut() {
            obj.remove("final_blow");
        }

        assert_eq!(select_attacker(&attackers), Some(2));

        let row = flatten_killmail(&json!({"attackers": attackers}), &LOOKUPS);
        assert_eq!(row.get("attacker_character_id"), Some(&CellValue::Integer(99)));
        assert_eq!(row.get("attacker_final_blow"), Some(&CellValue::Boolean(true)));
    }
}

#[test]
fn test_first_attacker_selected_without_final_blow() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(RANDOM_SEED);

    for _ in 0..SHUFFLE_ROUNDS {
        let mut attackers: Vec<Value> = (0..5)
            .map(|i| json!({"character_id": i, "final_blow": false}))
            .collect();
        attackers.shuffle(&mut rng);
        let first_id = attackers[0]["character_id"].as_i64().unwrap();

        assert_eq!(select_attacker(&attackers), Some(0));

        let row = flatten_killmail(&json!({"attackers": attackers}), &LOOKUPS);
        assert_eq!(
            row.get("attacker_character_id"),
            Some(&CellValue::Integer(first_id))
        );
        assert_eq!(row.get("attacker_final_blow"), Some(&CellValue::Boolean(false)));
    }
}

#[test]
fn test_empty_attackers_leave_attacker_columns_null() {
    for record in [json!({"attackers": []}), json!({})] {
        let row = flatten_killmail(&record, &LOOKUPS);
        assert_eq!(row.get("total_attackers"), Some(&CellValue::Integer(0)));
        for col in KILLMAIL_COLUMNS.iter().filter(|c| c.name.starts_with("attacker_")) {
            assert_eq!(row.get(col.name), Some(&CellValue::Null), "{}", col.name);
        }
    }
}

#[test]
fn test_lookup_misses_resolve_to_null() {
    let record = json!({
        "solar_system_id": 31000005,
        "victim": {"ship_type_id": 670},
        "attackers": [{"final_blow": true, "ship_type_id": 33328, "weapon_type_id": 3244}]
    });
    let row = flatten_killmail(&record, &LOOKUPS);
    for column in [
        "solar_system_name",
        "victim_ship_name",
        "victim_ship_type",
        "attacker_ship_name",
        "attacker_ship_type",
        "attacker_weapon_type_name",
    ] {
        assert_eq!(row.get(column), Some(&CellValue::Null), "{}", column);
    }
    assert_eq!(row.get("attacker_weapon_type_id"), Some(&CellValue::Integer(3244)));
}

#[test]
fn test_item_counts() {
    let record = json!({
        "victim": {
            "items": [
                {"quantity_destroyed": 3},
                {"quantity_dropped": 1},
                {"quantity_destroyed": 2, "quantity_dropped": 1}
            ]
        }
    });
    let row = flatten_killmail(&record, &LOOKUPS);
    assert_eq!(row.get("total_items"), Some(&CellValue::Integer(3)));
    assert_eq!(row.get("items_destroyed"), Some(&CellValue::Integer(2)));
    assert_eq!(row.get("items_dropped"), Some(&CellValue::Integer(2)));
}

// =============================================================================
// Catalog Loading
// =============================================================================

#[test]
fn test_fixture_catalogs_loaded() {
    assert_eq!(LOOKUPS.ships.len(), 3);
    assert_eq!(LOOKUPS.type_name(2873), Some("125mm Gatling AutoCannon II"));
    assert_eq!(LOOKUPS.system_name(30002187), Some("Amarr"));
}

#[test]
fn test_type_catalog_without_aliases_uses_first_columns() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("types.csv");
    fs::write(&path, "key,label,volume\n2873,125mm Gatling AutoCannon II,5\n").unwrap();

    let types = load_type_catalog(Some(&path));
    assert_eq!(types.len(), 1);
    assert_eq!(types[&2873], "125mm Gatling AutoCannon II");
}

#[test]
fn test_unreadable_catalogs_give_empty_lookups() {
    let paths = CatalogPaths {
        ships: Some(PathBuf::from("/no/such/shiplist.csv")),
        types: Some(PathBuf::from("/no/such/typeid.csv")),
        systems: None,
    };
    let lookups = Lookups::load(&paths);
    assert!(lookups.ships.is_empty());
    assert!(lookups.types.is_empty());
    assert!(lookups.systems.is_empty());
}
