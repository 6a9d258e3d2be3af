mod common;

use shopsched::dag::{MachineId, OperationTiming, PrecedenceGraph, ScheduleSnapshot};
use shopsched::dispatch::{Dispatcher, EarliestDueDate};
use shopsched::engine::{
    Candidate, EngineOptions, MachineState, ShiftingBottleneck, evaluate_machines,
    rank_evaluations, select_bottleneck,
};
use shopsched::errors::ShopError;
use shopsched_test_utils::builders::{JobBuilder, ShopFileBuilder, op, routing};

use common::{assert_no_machine_overlap, ids, init_tracing};

fn two_by_two() -> ShiftingBottleneck {
    ShiftingBottleneck::from_routings(
        &[
            routing("J1", &[("M1", 3), ("M2", 2)]),
            routing("J2", &[("M1", 2), ("M2", 4)]),
        ],
        EngineOptions::default(),
    )
    .unwrap()
}

fn m(id: &str) -> MachineId {
    MachineId::from(id)
}

#[test]
fn two_job_two_machine_instance_converges() {
    init_tracing();

    let schedule = two_by_two().run().expect("instance schedules");

    assert_eq!(schedule.bottleneck_order(), vec![&m("M2"), &m("M1")]);

    let first = &schedule.iterations[0];
    assert_eq!(first.makespan_before, 6);
    assert_eq!(
        first.candidates,
        vec![
            Candidate {
                machine: m("M1"),
                max_lateness: Some(1),
                sequence: ids(&["M1,J2", "M1,J1"]),
            },
            Candidate {
                machine: m("M2"),
                max_lateness: Some(2),
                sequence: ids(&["M2,J2", "M2,J1"]),
            },
        ]
    );
    assert_eq!(first.max_lateness, Some(2));
    assert_eq!(first.chain_edges, 1);

    let second = &schedule.iterations[1];
    assert_eq!(second.bottleneck, m("M1"));
    assert_eq!(second.max_lateness, Some(0));
    assert_eq!(second.sequence, ids(&["M1,J2", "M1,J1"]));

    assert_eq!(schedule.sequence_of(&m("M1")).unwrap(), ids(&["M1,J2", "M1,J1"]).as_slice());
    assert_eq!(schedule.sequence_of(&m("M2")).unwrap(), ids(&["M2,J2", "M2,J1"]).as_slice());

    let expected = [("M1,J2", 0, 2), ("M1,J1", 2, 5), ("M2,J2", 2, 6), ("M2,J1", 6, 8)];
    for (id, es, ef) in expected {
        let t = schedule.timing(&op(id)).unwrap();
        assert_eq!((t.early_start, t.early_finish), (es, ef), "{id}");
    }

    assert_eq!(schedule.makespan, 8);
    assert_eq!(schedule.critical_path, ids(&["M1,J2", "M2,J1", "M2,J2"]));
    assert!(schedule.graph.is_acyclic());
    assert_no_machine_overlap(&schedule);
}

#[test]
fn graph_stays_acyclic_after_every_step() {
    let mut engine = two_by_two();
    assert_eq!(engine.machines().unscheduled(), vec![m("M1"), m("M2")]);

    let mut steps = 0;
    while let Some(report) = engine.step().unwrap() {
        steps += 1;
        assert_eq!(report.iteration, steps);
        assert!(engine.graph().is_acyclic());
        assert!(engine.machines().state(&report.bottleneck).unwrap().is_scheduled());
    }

    assert_eq!(steps, 2);
    assert!(engine.is_complete());
    assert!(engine.machines().unscheduled().is_empty());
    assert!(engine.step().unwrap().is_none());
    assert_eq!(engine.iterations().len(), 2);
}

#[test]
fn equal_lmax_picks_lowest_machine_id() {
    let build = || {
        ShiftingBottleneck::from_routings(
            &[
                routing("J1", &[("M1", 3)]),
                routing("J2", &[("M1", 3)]),
                routing("J3", &[("M2", 3)]),
                routing("J4", &[("M2", 3)]),
            ],
            EngineOptions::default(),
        )
        .unwrap()
    };

    for _ in 0..5 {
        let schedule = build().run().unwrap();
        let first = &schedule.iterations[0];

        let lmax: Vec<Option<i64>> = first.candidates.iter().map(|c| c.max_lateness).collect();
        assert_eq!(lmax, vec![Some(3), Some(3)]);
        assert_eq!(first.bottleneck, m("M1"));

        assert_eq!(schedule.iterations[1].bottleneck, m("M2"));
        assert_eq!(schedule.iterations[1].max_lateness, Some(0));
        assert_eq!(schedule.makespan, 6);
    }
}

#[test]
fn parallel_evaluation_matches_sequential() {
    let routings = [
        routing("J1", &[("M1", 3), ("M2", 2), ("M3", 2)]),
        routing("J2", &[("M1", 1), ("M3", 5), ("M2", 3)]),
        routing("J3", &[("M2", 3), ("M1", 4), ("M3", 1)]),
        routing("J4", &[("M2", 4), ("M3", 3)]),
    ];

    let sequential = ShiftingBottleneck::from_routings(&routings, EngineOptions::default())
        .unwrap()
        .run()
        .unwrap();
    let parallel = ShiftingBottleneck::from_routings(
        &routings,
        EngineOptions {
            parallel: true,
            ..EngineOptions::default()
        },
    )
    .unwrap()
    .run()
    .unwrap();

    assert_eq!(sequential.iterations, parallel.iterations);
    assert_eq!(sequential.sequences, parallel.sequences);
    assert_eq!(sequential.snapshot, parallel.snapshot);
    assert_no_machine_overlap(&parallel);
}

#[test]
fn committed_sequences_match_final_snapshot_order() {
    let schedule = ShiftingBottleneck::from_routings(
        &[
            routing("J1", &[("M1", 2), ("M2", 5)]),
            routing("J2", &[("M2", 3), ("M1", 4)]),
            routing("J3", &[("M1", 1), ("M2", 1)]),
        ],
        EngineOptions::default(),
    )
    .unwrap()
    .run()
    .unwrap();

    for (machine, sequence) in &schedule.sequences {
        assert_eq!(&schedule.snapshot.sequence_on(&schedule.graph, machine), sequence);
    }
    assert_eq!(schedule.makespan, schedule.snapshot.project_duration());
    assert_no_machine_overlap(&schedule);
}

#[test]
fn cycle_closing_commit_is_an_invariant_violation() {
    // J2 visits M2 before M1, so fixing M1 as [J2, J1] and then M2 as
    // [J1, J2] would close M2,J2 -> M1,J2 -> M1,J1 -> M2,J1 -> M2,J2.
    let mut engine = ShiftingBottleneck::from_routings(
        &[
            routing("J1", &[("M1", 2), ("M2", 2)]),
            routing("J2", &[("M2", 2), ("M1", 2)]),
        ],
        EngineOptions::default(),
    )
    .unwrap();

    engine
        .commit_sequence(&m("M1"), &ids(&["M1,J2", "M1,J1"]))
        .unwrap();
    let edges = engine.graph().edge_count();

    match engine.commit_sequence(&m("M2"), &ids(&["M2,J1", "M2,J2"])) {
        Err(ShopError::InvariantViolation {
            bottleneck,
            sequence,
            edge,
        }) => {
            assert_eq!(bottleneck, m("M2"));
            assert_eq!(sequence, ids(&["M2,J1", "M2,J2"]));
            assert_eq!(edge, (op("M2,J1"), op("M2,J2")));
        }
        other => panic!("Expected InvariantViolation, got: {:?}", other),
    }

    assert_eq!(engine.graph().edge_count(), edges);
    assert!(engine.graph().is_acyclic());
    assert_eq!(engine.machines().state(&m("M2")), Some(&MachineState::Unscheduled));
}

#[test]
fn commit_rejects_foreign_operations_and_reopening() {
    let mut engine = two_by_two();

    match engine.commit_sequence(&m("M1"), &ids(&["M1,J1", "M2,J2"])) {
        Err(ShopError::InvalidOperation { operation, .. }) => assert_eq!(operation, op("M2,J2")),
        other => panic!("Expected InvalidOperation, got: {:?}", other),
    }

    engine
        .commit_sequence(&m("M1"), &ids(&["M1,J1", "M1,J2"]))
        .unwrap();
    assert!(engine.commit_sequence(&m("M1"), &ids(&["M1,J2", "M1,J1"])).is_err());
    assert!(engine.commit_sequence(&m("M9"), &[]).is_err());
}

#[test]
fn bottleneck_selection_ranks_empty_machines_last() {
    let candidates = vec![
        Candidate {
            machine: m("A"),
            max_lateness: None,
            sequence: vec![],
        },
        Candidate {
            machine: m("C"),
            max_lateness: Some(-4),
            sequence: ids(&["x"]),
        },
        Candidate {
            machine: m("B"),
            max_lateness: Some(-4),
            sequence: ids(&["y"]),
        },
    ];

    assert_eq!(select_bottleneck(&candidates).unwrap().machine, m("B"));
    assert!(select_bottleneck(&[]).is_none());
}

#[test]
fn empty_shop_finishes_immediately() {
    let schedule = ShiftingBottleneck::new(PrecedenceGraph::new(), EngineOptions::default())
        .run()
        .unwrap();
    assert!(schedule.iterations.is_empty());
    assert!(schedule.sequences.is_empty());
    assert_eq!(schedule.makespan, 0);
}

#[test]
fn shop_file_routings_drive_the_orchestrator() {
    let cfg = ShopFileBuilder::new()
        .with_job("J1", JobBuilder::new().visit("M1", 3).visit("M2", 2).build())
        .with_job("J2", JobBuilder::new().visit("M1", 2).visit("M2", 4).build())
        .parallel(true)
        .build();

    let options = cfg.engine_options();
    assert!(options.parallel);

    let schedule = ShiftingBottleneck::from_routings(&cfg.routings(), options)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(schedule.makespan, 8);
}

#[test]
fn zero_duration_ties_follow_existing_paths() {
    init_tracing();

    // After M0 is fixed as [M0,J2, M0,J0] the path M2,J2 -> M0,J2 -> M0,J0
    // -> M2,J0 exists while both M2 operations share release and due date.
    let schedule = ShiftingBottleneck::from_routings(
        &[
            routing("J0", &[("M0", 0), ("M2", 0), ("M1", 0)]),
            routing("J1", &[("M1", 0)]),
            routing("J2", &[("M2", 0), ("M0", 0), ("M1", 2)]),
        ],
        EngineOptions::default(),
    )
    .expect("valid routing table")
    .run()
    .expect("zero-length operations schedule");

    assert_eq!(schedule.bottleneck_order(), vec![&m("M0"), &m("M1"), &m("M2")]);
    assert_eq!(schedule.sequence_of(&m("M0")).unwrap(), ids(&["M0,J2", "M0,J0"]).as_slice());
    assert_eq!(schedule.sequence_of(&m("M2")).unwrap(), ids(&["M2,J2", "M2,J0"]).as_slice());
    assert_eq!(schedule.makespan, 2);
    assert!(schedule.graph.is_acyclic());
    assert_no_machine_overlap(&schedule);
}

fn timing(early_start: i64, duration: i64, late_finish: i64) -> OperationTiming {
    OperationTiming {
        duration,
        early_start,
        early_finish: early_start + duration,
        late_start: late_finish - duration,
        late_finish,
    }
}

#[test]
fn invalid_subproblem_skips_only_that_machine() {
    let graph = PrecedenceGraph::from_routings(&[
        routing("J1", &[("M1", 3)]),
        routing("J2", &[("M2", 2)]),
    ])
    .unwrap();

    // M1,J1 must finish by 3 but cannot start before 5.
    let snapshot = ScheduleSnapshot::from_timings([
        (op("M1,J1"), timing(5, 3, 3)),
        (op("M2,J2"), timing(0, 2, 2)),
    ]);
    let dispatcher = Dispatcher::new(&EarliestDueDate);

    let evaluations = evaluate_machines(&graph, &snapshot, &[m("M1"), m("M2")], &dispatcher, false);
    assert!(matches!(evaluations[0].result, Err(ShopError::InvalidSubproblem { .. })));
    assert!(evaluations[1].result.is_ok());

    let ranking = rank_evaluations(evaluations).unwrap();
    assert_eq!(ranking.winner.machine, m("M2"));
    assert_eq!(ranking.winner.sequence, ids(&["M2,J2"]));
    assert_eq!(ranking.candidates.len(), 1);
    assert_eq!(ranking.skipped.len(), 1);
    assert_eq!(ranking.skipped[0].machine, m("M1"));
    assert!(ranking.skipped[0].reason.contains("M1,J1"), "{}", ranking.skipped[0].reason);
}

#[test]
fn iteration_with_every_machine_skipped_stalls() {
    let graph = PrecedenceGraph::from_routings(&[
        routing("J1", &[("M1", 3)]),
        routing("J2", &[("M2", 2)]),
    ])
    .unwrap();
    let snapshot = ScheduleSnapshot::from_timings([
        (op("M1,J1"), timing(5, 3, 3)),
        (op("M2,J2"), timing(4, 2, 1)),
    ]);
    let dispatcher = Dispatcher::new(&EarliestDueDate);

    let evaluations = evaluate_machines(&graph, &snapshot, &[m("M1"), m("M2")], &dispatcher, true);
    match rank_evaluations(evaluations) {
        Err(ShopError::Stalled(machines)) => assert_eq!(machines, vec![m("M1"), m("M2")]),
        other => panic!("Expected Stalled, got: {:?}", other),
    }
}
