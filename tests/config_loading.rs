mod common;

use std::io::Write;

use tempfile::NamedTempFile;

use shopsched::config::{load_and_validate, load_from_path, parse_and_validate};
use shopsched::dag::calculate_early_late;
use shopsched::errors::ShopError;
use shopsched::types::{ClockStart, DispatchRule};
use shopsched_test_utils::builders::{ActivityBuilder, ItemBuilder, ShopFileBuilder, op};

use common::{demo_path, ids};

fn write_instance(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn full_instance_loads_every_section() {
    let file = write_instance(
        r#"
[config]
rule = "critical_ratio"
clock_start = "zero"
parallel = true

[job.J1]
routing = [ { machine = "M1", duration = 3 }, { machine = "M2", duration = 2 } ]

[job.J2]
routing = [ { machine = "M2", duration = 4 } ]

[activity.A]
duration = 5

[activity.B]
duration = 3
after = ["A"]

[item.X]
duration = 3
due = 5

[item.Y]
duration = 2
release = 1
due = 8
weight = 4
"#,
    );

    let cfg = load_and_validate(file.path()).expect("valid instance");

    assert_eq!(cfg.config.rule, DispatchRule::CriticalRatio);
    assert_eq!(cfg.config.clock_start, ClockStart::Zero);
    assert!(cfg.engine_options().parallel);

    let routings = cfg.routings();
    assert_eq!(routings.len(), 2);
    assert_eq!(routings[0].job.as_str(), "J1");
    assert_eq!(routings[0].steps.len(), 2);
    assert_eq!(routings[0].steps[1].machine.as_str(), "M2");

    let graph = cfg.project_graph().unwrap();
    assert_eq!(graph.predecessors_of(&op("B")), vec![&op("A")]);
    assert_eq!(calculate_early_late(&graph).unwrap().project_duration(), 8);

    let pool = cfg.dispatch_pool();
    assert_eq!(pool.len(), 2);
    assert_eq!((pool[0].release_time, pool[0].weight), (0, 1));
    assert_eq!((pool[1].release_time, pool[1].weight), (1, 4));
}

#[test]
fn defaults_apply_without_config_section() {
    let cfg = parse_and_validate("[item.A]\nduration = 1\ndue = 2\n").unwrap();
    assert_eq!(cfg.config.rule, DispatchRule::Edd);
    assert_eq!(cfg.config.clock_start, ClockStart::MinRelease);
    assert!(!cfg.config.parallel);
}

#[test]
fn activity_cycle_returns_structured_error() {
    let file = write_instance(
        r#"
[activity.A]
duration = 1
after = ["B"]

[activity.B]
duration = 1
after = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(ShopError::CycleDetected { operation, .. }) => {
            assert!(operation == op("A") || operation == op("B"));
        }
        Err(e) => panic!("Expected CycleDetected error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unknown_dependency_returns_config_error() {
    let file = write_instance(
        r#"
[activity.A]
duration = 1
after = ["NonExistent"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(ShopError::ConfigError(msg)) => {
            assert!(msg.contains("unknown dependency"));
            assert!(msg.contains("NonExistent"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn self_dependency_returns_config_error() {
    let raw = ShopFileBuilder::new()
        .with_activity("A", ActivityBuilder::new(2).after("A").build())
        .build_raw();

    match shopsched::config::ShopFile::try_from(raw) {
        Err(ShopError::ConfigError(msg)) => assert!(msg.contains("itself")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn empty_instance_is_rejected() {
    let file = write_instance("[config]\nrule = \"spt\"\n");

    match load_and_validate(file.path()) {
        Err(ShopError::ConfigError(msg)) => assert!(msg.contains("at least one")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn job_routing_errors() {
    let cases = [
        ("[job.J1]\nrouting = []\n", "non-empty"),
        (
            "[job.J1]\nrouting = [ { machine = \"M1\", duration = 1 }, { machine = \"M1\", duration = 2 } ]\n",
            "more than once",
        ),
        ("[job.J1]\nrouting = [ { machine = \"M1\", duration = -3 } ]\n", "negative duration"),
        ("[job.J1]\nrouting = [ { machine = \"  \", duration = 1 } ]\n", "empty machine"),
        ("[job.J1]\nrouting = [ { machine = \"A,B\", duration = 1 } ]\n", "contains ','"),
        ("[job.\"B,C\"]\nrouting = [ { machine = \"A\", duration = 1 } ]\n", "must not contain ','"),
    ];

    for (contents, needle) in cases {
        match parse_and_validate(contents) {
            Err(ShopError::ConfigError(msg)) => assert!(msg.contains(needle), "{msg}"),
            other => panic!("Expected ConfigError containing {needle:?}, got: {:?}", other),
        }
    }
}

#[test]
fn item_window_errors() {
    let raw = ShopFileBuilder::new()
        .with_item("late", ItemBuilder::new(1, 5, 3).build())
        .build_raw();
    match shopsched::config::ShopFile::try_from(raw) {
        Err(ShopError::ConfigError(msg)) => assert!(msg.contains("before its release")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }

    let raw = ShopFileBuilder::new()
        .with_item("heavy", ItemBuilder::new(1, 0, 3).weight(-1).build())
        .build_raw();
    assert!(matches!(
        shopsched::config::ShopFile::try_from(raw),
        Err(ShopError::ConfigError(_))
    ));
}

#[test]
fn unknown_rule_is_a_toml_error() {
    let file = write_instance("[config]\nrule = \"fifo\"\n\n[item.A]\nduration = 1\ndue = 2\n");
    assert!(matches!(load_from_path(file.path()), Err(ShopError::TomlError(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(matches!(load_and_validate(&missing), Err(ShopError::IoError(_))));
}

#[test]
fn demo_instances_validate() {
    for name in ["two_by_two.toml", "four_machines.toml", "project.toml", "dispatch.toml"] {
        let path = demo_path(name);
        load_and_validate(&path).unwrap_or_else(|e| panic!("{}: {e:?}", path.display()));
    }

    let cfg = load_and_validate(demo_path("project.toml")).unwrap();
    let snapshot = calculate_early_late(&cfg.project_graph().unwrap()).unwrap();
    assert_eq!(snapshot.critical_path(), ids(&["A", "B", "C"]));
}
