#![allow(dead_code)]

use cdf_processor::model::detail::NO_DETAIL;
use cdf_processor::{Dataset, DatasetConfig};

/// A small two-sided engagement: one blue and one red headquarters, each
/// commanding one unit, and a single kill of the red unit by the blue one.
pub fn build_test_dataset() -> Dataset {
    build_test_dataset_with(DatasetConfig::default())
}

pub fn build_test_dataset_with(config: DatasetConfig) -> Dataset {
    let mut dataset = Dataset::new(config);
    let store = dataset.store_mut();

    // 4 entities: 2 headquarters, 2 subordinates
    store
        .add("bhq")
        .unwrap()
        .name("Blue HQ")
        .unit_type("headquarters")
        .commander("bhq")
        .affiliation("blue")
        .force("coalition")
        .init_comps(1)
        .cbt_per_comp(2.0);
    store
        .add("b1")
        .unwrap()
        .name("Blue 1")
        .unit_type("infantry")
        .commander("bhq")
        .affiliation("blue")
        .force("coalition")
        .init_comps(4)
        .cbt_per_comp(1.5);
    store
        .add("rhq")
        .unwrap()
        .name("Red HQ")
        .unit_type("headquarters")
        .commander("rhq")
        .affiliation("red")
        .init_comps(1);
    store
        .add("r1")
        .unwrap()
        .name("Red 1")
        .unit_type("tank")
        .commander("rhq")
        .affiliation("red")
        .init_comps(3)
        .cbt_per_comp(5.0);

    // 11 events
    store.add_status("bhq", 0.0, &["state"], &["ready"]).unwrap(); // status-1
    store.add_status("rhq", 0.0, &["state"], &["ready"]).unwrap(); // status-2
    store.add_location("b1", 0.0, 10.0, 10.0, NO_DETAIL, NO_DETAIL).unwrap(); // loc-1
    store.add_location("r1", 0.0, 50.0, 50.0, NO_DETAIL, NO_DETAIL).unwrap(); // loc-2
    store.add_spot("b1", 5.0, "r1", NO_DETAIL, NO_DETAIL).unwrap(); // spot-1
    store.add_seen("r1", 5.0, "b1", NO_DETAIL, NO_DETAIL).unwrap(); // seen-1
    store.add_shot("b1", 6.0, &["weapon"], &["rifle"]).unwrap(); // shot-1
    store.add_kill("b1", 6.0, "r1", NO_DETAIL, NO_DETAIL).unwrap(); // kill-1
    store.add_loss("r1", 6.0, "b1", NO_DETAIL, NO_DETAIL).unwrap(); // loss-1
    store.add_location("r1", 8.0, 55.0, 45.0, NO_DETAIL, NO_DETAIL).unwrap(); // loc-3
    store.add_status("r1", 9.0, &["state"], &["damaged"]).unwrap(); // status-3

    dataset
}

pub fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}
