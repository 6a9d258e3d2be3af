#![allow(dead_code)]

use std::path::PathBuf;

use shopsched::dag::OperationId;
use shopsched::engine::ShopSchedule;

pub use shopsched_test_utils::init_tracing;

/// Path of a sample instance under `demos/`.
pub fn demo_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

pub fn ids(raw: &[&str]) -> Vec<OperationId> {
    raw.iter().map(|s| OperationId::from(*s)).collect()
}

/// Every machine runs one operation at a time in its committed order.
pub fn assert_no_machine_overlap(schedule: &ShopSchedule) {
    for (machine, sequence) in &schedule.sequences {
        for pair in sequence.windows(2) {
            let prev = schedule.timing(&pair[0]).expect("timing for sequenced op");
            let next = schedule.timing(&pair[1]).expect("timing for sequenced op");
            assert!(
                prev.early_finish <= next.early_start,
                "{machine}: {} ends at {} but {} starts at {}",
                pair[0],
                prev.early_finish,
                pair[1],
                next.early_start
            );
        }
    }
}
