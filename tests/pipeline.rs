mod common;

use cdf_processor::model::detail::NO_DETAIL;
use cdf_processor::tables::{CdfTable, SEED_EVENT};
use cdf_processor::{DiagnosticKind, EventType};
use common::build_test_dataset;
use serde_json::json;

#[test]
fn finalize_is_clean_for_consistent_input() {
    let mut dataset = build_test_dataset();
    let report = dataset.finalize();
    assert!(
        report.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        report.diagnostics
    );
    assert!(dataset.store().diagnostics().is_empty());
}

#[test]
fn entity_table_resolves_levels_and_counts_events() {
    let mut dataset = build_test_dataset();
    let table = &dataset.finalize().entity_table;

    let ids: Vec<&str> = table.rows().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["bhq", "b1", "rhq", "r1"]);

    let b1 = table.get("b1").unwrap();
    assert_eq!(b1.level, 2);
    assert_eq!(b1.commander_name, "Blue HQ");
    assert_eq!(b1.init_cbt_pwr, 6.0);
    assert_eq!(b1.total_events, 4);
    assert_eq!((b1.location_events, b1.spot_events, b1.shot_events, b1.kill_events), (1, 1, 1, 1));

    let r1 = table.get("r1").unwrap();
    assert_eq!(r1.force, "red - Force");
    assert_eq!(r1.total_events, 5);
    assert_eq!((r1.location_events, r1.loss_events, r1.status_events), (2, 1, 1));
    assert_eq!(table.get("rhq").unwrap().level, 1);
}

#[test]
fn event_log_is_sorted_by_time_then_type() {
    let mut dataset = build_test_dataset();
    let log = &dataset.finalize().event_log;
    let ids: Vec<&str> = log.rows().iter().map(|r| r.event_id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "loc-1", "loc-2", "status-1", "status-2", "spot-1", "seen-1", "shot-1", "kill-1",
            "loss-1", "loc-3", "status-3",
        ]
    );
}

#[test]
fn event_log_positions_and_enrichment() {
    let mut dataset = build_test_dataset();
    let log = &dataset.finalize().event_log;

    let spot = log.get("spot-1").unwrap();
    assert_eq!((spot.primary_x, spot.primary_y), (Some(10.0), Some(10.0)));
    assert_eq!((spot.secondary_x, spot.secondary_y), (Some(50.0), Some(50.0)));
    assert_eq!(spot.secondary_entity_name, "Red 1");
    assert_eq!(spot.secondary_entity_level, Some(2));
    assert_eq!(spot.event_type.label(), "spotted secondary");

    let loss = log.get("loss-1").unwrap();
    assert_eq!(loss.primary_entity_affiliation, "red");
    assert_eq!(loss.secondary_entity_id, "b1");
    assert_eq!((loss.secondary_x, loss.secondary_y), (Some(10.0), Some(10.0)));

    let status = log.get("status-3").unwrap();
    assert_eq!((status.primary_x, status.primary_y), (Some(55.0), Some(45.0)));
    assert_eq!(status.event_detail, r#"{"state":"damaged"}"#);

    let hq = log.get("status-1").unwrap();
    assert_eq!((hq.primary_x, hq.primary_y), (None, None));
    assert_eq!(hq.secondary_entity_id, "");
    assert_eq!(hq.secondary_entity_level, None);
}

#[test]
fn ledger_seeds_and_attributes_losses() {
    let mut dataset = build_test_dataset();
    let report = dataset.finalize();
    let ledger = &report.combat_power;
    assert_eq!(ledger.items(), vec!["blue", "coalition", "red", "red - Force"]);

    let red: Vec<(f64, i64, f64, &str)> = ledger
        .series("red")
        .map(|r| (r.time, r.components, r.combat_power, r.event_id.as_str()))
        .collect();
    assert_eq!(red, vec![(0.0, 4, 16.0, SEED_EVENT), (6.0, 3, 11.0, "loss-1")]);

    let blue: Vec<i64> = ledger.series("coalition").map(|r| r.components).collect();
    assert_eq!(blue, vec![5]);

    assert_eq!(report.summary.total_forces_and_affiliations, 4);
    assert_eq!(report.summary.total_events, 11);
    assert_eq!(report.summary.first_event, "0.0 not defined");
    assert_eq!(report.summary.last_event, "9.0 not defined");
}

#[test]
fn repeated_finalize_gives_identical_views() {
    let mut dataset = build_test_dataset();
    let first = dataset.finalize().clone();
    let second = dataset.finalize().clone();
    assert_eq!(first, second);
    assert_eq!(dataset.store().entity("r1").unwrap().level, None);
    assert_eq!(dataset.store().entity("r1").unwrap().force, None);
}

#[test]
fn dropped_types_still_feed_positions() {
    let mut dataset = build_test_dataset();
    dataset.update_config("drop_location_events", json!(true)).unwrap();
    dataset.update_config("drop_spot_events", json!(true)).unwrap();
    let report = dataset.finalize();

    assert_eq!(report.dropped_events, 4);
    assert_eq!(report.event_log.len(), 7);
    assert_eq!(report.event_log.of_type(EventType::Location).count(), 0);
    let kill = report.event_log.get("kill-1").unwrap();
    assert_eq!((kill.primary_x, kill.secondary_x), (Some(10.0), Some(50.0)));
    assert_eq!(report.summary.total_events, 11);
}

#[test]
fn removing_an_event_leaves_others_intact() {
    let mut dataset = build_test_dataset();
    let store = dataset.store_mut();
    store.add_location("r1", 12.0, 60.0, 40.0, NO_DETAIL, NO_DETAIL).unwrap(); // loc-4
    store.remove_event("loc-3").unwrap();

    let loc4 = store.get_event_data("loc-4").unwrap();
    assert_eq!((loc4.time, loc4.x, loc4.y), (12.0, Some(60.0), Some(40.0)));
    assert!(store.get_event_data("loc-3").is_err());

    let report = dataset.finalize();
    let status = report.event_log.get("status-3").unwrap();
    assert_eq!((status.primary_x, status.primary_y), (Some(50.0), Some(50.0)));
    assert!(report.diagnostics.is_empty());
}

#[test]
fn removing_an_event_drops_exactly_its_row() {
    let mut dataset = build_test_dataset();
    let before = dataset.finalize().event_log.clone();

    dataset.store_mut().remove_event("shot-1").unwrap();
    let after = &dataset.finalize().event_log;

    assert_eq!(
        after.of_type(EventType::Shot).count(),
        before.of_type(EventType::Shot).count() - 1
    );
    let expected: Vec<_> = before
        .rows()
        .iter()
        .filter(|row| row.event_id != "shot-1")
        .cloned()
        .collect();
    assert_eq!(after.rows(), expected.as_slice());
}

#[test]
fn maximal_preset_level_does_not_abort_finalize() {
    let mut dataset = build_test_dataset();
    let store = dataset.store_mut();
    store.add("deep").unwrap().name("Deep HQ").level(u32::MAX).affiliation("blue").force("coalition");
    store.add("leaf").unwrap().name("Leaf").commander("deep").affiliation("blue").force("coalition");
    store.add_shot("deep", 1.0, NO_DETAIL, NO_DETAIL).unwrap();
    store.add_shot("leaf", 1.0, NO_DETAIL, NO_DETAIL).unwrap();

    let report = dataset.finalize();
    assert_eq!(report.entity_table.get("deep").unwrap().level, u32::MAX);
    assert_eq!(report.entity_table.get("leaf").unwrap().level, 1);
    assert_eq!(report.diagnostics.count(DiagnosticKind::UnresolvedLevel), 1);
    assert_eq!(report.diagnostics.count(DiagnosticKind::UnresolvedCommander), 0);
}

#[test]
fn removing_an_entity_purges_its_events() {
    let mut dataset = build_test_dataset();
    let store = dataset.store_mut();
    store.remove_entity("r1").unwrap();
    assert!(store.get_event_data("loss-1").is_err());
    assert_eq!(store.event_ids().len(), 6);

    let report = dataset.finalize();
    assert_eq!(report.entity_table.len(), 3);
    assert_eq!(report.event_log.len(), 6);
    // b1's spot and kill now name an entity that no longer exists
    assert_eq!(report.diagnostics.count(DiagnosticKind::UnknownSecondaryEntity), 2);
    let kill = report.event_log.get("kill-1").unwrap();
    assert_eq!(kill.secondary_entity_id, "");
}

#[test]
fn missing_commander_is_reported_and_defaulted() {
    let mut dataset = build_test_dataset();
    dataset
        .store_mut()
        .add("b2")
        .unwrap()
        .name("Blue 2")
        .commander("ghost")
        .affiliation("blue")
        .force("coalition");
    dataset.store_mut().add_shot("b2", 3.0, NO_DETAIL, NO_DETAIL).unwrap();

    let report = dataset.finalize();
    let b2 = report.entity_table.get("b2").unwrap();
    assert_eq!(b2.level, 1);
    assert_eq!(b2.commander_name, "");
    assert_eq!(report.diagnostics.count(DiagnosticKind::UnresolvedCommander), 1);
    assert_eq!(report.diagnostics.count(DiagnosticKind::UnresolvedLevel), 1);
}
