mod common;

use cdf_processor::flush::{export_views, read_entity_table};
use cdf_processor::tables::CdfTable;
use cdf_processor::{Dataset, DatasetConfig};
use common::{build_test_dataset_with, read_lines};

fn config_in(dir: &std::path::Path, jsonl: bool) -> DatasetConfig {
    DatasetConfig {
        output_location: dir.to_path_buf(),
        output_jsonl: jsonl,
        case: "base case".to_string(),
        replication: "2".to_string(),
        serial: "7".to_string(),
        ..DatasetConfig::default()
    }
}

#[test]
fn export_writes_metadata_and_csv_views() {
    let dir = tempfile::tempdir().unwrap();
    let mut dataset = build_test_dataset_with(config_in(dir.path(), false));

    let written = export_views(&mut dataset).unwrap();
    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "CDF_Metadata_base_case-2_S7.json",
            "CDF_EntityTable_base_case-2_S7.csv",
            "CDF_Events_base_case-2_S7.csv",
            "CDF_Cbt_Pwr_base_case-2_S7.csv",
        ]
    );

    let entity_lines = read_lines(&written[1]);
    assert_eq!(entity_lines.len(), 5, "header plus 4 entities");
    assert!(entity_lines[0].starts_with("case,rep,id,name,type,commander_id"));

    let event_lines = read_lines(&written[2]);
    assert_eq!(event_lines.len(), 12, "header plus 11 events");
    assert!(event_lines[1].contains("location update"));

    let ledger_lines = read_lines(&written[3]);
    assert_eq!(ledger_lines.len(), 7, "header plus 4 seeds and 2 decrements");
    assert_eq!(ledger_lines[0], "case,rep,time,item,components,combat_power,event_id");

    let metadata: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&written[0]).unwrap()).unwrap();
    assert_eq!(metadata["case"], "base case");
    assert_eq!(metadata["total_entities"], 4);
    assert_eq!(metadata["total_events"], 11);
}

#[test]
fn export_writes_jsonl_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path(), true);
    config.output_csv = false;
    let mut dataset = build_test_dataset_with(config);

    let written = export_views(&mut dataset).unwrap();
    assert_eq!(written.len(), 4);

    let events = read_lines(&written[2]);
    assert_eq!(events.len(), 11);
    let first: serde_json::Value = serde_json::from_str(&events[0]).unwrap();
    assert_eq!(first["event_id"], "loc-1");
    assert_eq!(first["event_type"], "location update");
    assert_eq!(first["primary_x"], 10.0);

    let ledger = read_lines(&written[3]);
    assert_eq!(ledger.len(), 6);
}

#[test]
fn empty_dataset_still_gets_headers() {
    let dir = tempfile::tempdir().unwrap();
    let mut dataset = Dataset::new(config_in(dir.path(), false));
    let written = export_views(&mut dataset).unwrap();
    for path in &written[1..] {
        assert_eq!(read_lines(path).len(), 1, "{} should hold only a header", path.display());
    }
}

#[test]
fn exported_entity_table_seeds_a_new_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut dataset = build_test_dataset_with(config_in(dir.path(), false));
    let written = export_views(&mut dataset).unwrap();
    let expected = dataset.report().unwrap().entity_table.clone();

    let rows = read_entity_table(&written[1]).unwrap();
    assert_eq!(rows.len(), 4);

    let mut reseeded = Dataset::new(config_in(dir.path(), false));
    assert_eq!(reseeded.store_mut().entities_from_table(&rows), 4);
    assert_eq!(reseeded.store_mut().entities_from_table(&rows[..1]), 0);

    let rebuilt = &reseeded.finalize().entity_table;
    for (a, b) in rebuilt.rows().iter().zip(expected.rows()) {
        assert_eq!(
            (&a.id, &a.name, &a.commander_name, a.level, &a.force, a.init_cbt_pwr),
            (&b.id, &b.name, &b.commander_name, b.level, &b.force, b.init_cbt_pwr)
        );
        assert_eq!(a.total_events, 0);
    }
}
