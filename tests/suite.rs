use std::path::PathBuf;

use itertools::Itertools;
use porter::{Porter, Schedule, decode};
use rstest::rstest;

/// Every robot's actions must decode to unit steps, all strings must agree
/// on length, and no two robots may ever claim the same cell at the same
/// tick or one tick apart.
fn validate(porter: &Porter, schedule: &Schedule) {
    let tracks = porter
        .instance()
        .robots
        .iter()
        .map(|&(id, home)| {
            let moves = schedule
                .moves_of(id)
                .expect("every robot owns a move string");
            assert_eq!(moves.len(), schedule.duration());
            decode(home, moves)
        })
        .collect::<Vec<_>>();

    for (a, b) in tracks.iter().tuple_combinations() {
        for t in 0..a.len() {
            assert_ne!(a[t], b[t], "two robots share a cell at tick {t}");
            if t + 1 < a.len() {
                assert_ne!(a[t + 1], b[t], "trailing collision at tick {t}");
                assert_ne!(a[t], b[t + 1], "trailing collision at tick {t}");
            }
        }
    }
}

#[rstest]
fn regression(#[files("maps/*.txt")] file: PathBuf) {
    let porter = Porter::parse(&file).unwrap();
    let schedule = porter.solve(7, 20).unwrap();
    validate(&porter, &schedule);
}

#[rstest]
#[case::no_chargers("maps/impossible/no-chargers.txt", "No solution")]
#[case::drained("maps/impossible/drained.txt", "No solution")]
#[case::ragged("maps/impossible/ragged.txt", "the grid demands")]
#[case::unknown_shelf("maps/impossible/unknown-shelf.txt", "No shelf named")]
fn impossible(#[case] file: &str, #[case] expectation: &str) {
    let msg = match Porter::parse(file) {
        Err(e) => format!("{e:#}"),
        Ok(porter) => match porter.solve(7, 20) {
            Err(e) => e.to_string(),
            Ok(_) => panic!("expected a failure containing '{expectation}'"),
        },
    };
    assert!(
        msg.contains(expectation),
        "Expected that '{expectation}' would be part of the error but it wasn't: {msg}"
    );
}

#[rstest]
fn markers_frame_the_recharge_dwells() {
    let porter = Porter::parse("maps/single.txt").unwrap();
    let schedule = porter.solve(0, 20).unwrap();
    let moves = schedule.moves_of(0).unwrap();

    let (load, unload): (usize, usize) = moves
        .match_indices('p')
        .map(|(i, _)| i)
        .collect_tuple()
        .expect("exactly one load and one unload marker");
    assert!(moves[load + 1..unload].contains("SSSSSSS"));
    assert!(moves[unload + 1..].ends_with("SSSSSSSSSS"));
}

#[rstest]
fn spare_robots_only_idle() {
    let porter = Porter::parse("maps/fleet.txt").unwrap();
    let schedule = porter.solve(7, 20).unwrap();

    let idle = schedule.moves_of(1).unwrap();
    assert!(!idle.contains('p'));
    assert_eq!(idle.len(), schedule.moves_of(0).unwrap().len());
}

#[rstest]
fn deterministic_given_a_seed() {
    let porter = Porter::parse("maps/fleet.txt").unwrap();
    let a = porter.solve(42, 20).unwrap();
    let b = porter.solve(42, 20).unwrap();
    assert_eq!(a.to_string(), b.to_string());
}

#[rstest]
fn output_rows_hold_one_action_per_robot() {
    let porter = Porter::parse("maps/pair.txt").unwrap();
    let schedule = porter.solve(7, 20).unwrap();
    let output = schedule.to_string();
    let rows = output.lines().collect::<Vec<_>>();

    assert_eq!(rows.len(), schedule.duration());
    assert!(rows.iter().all(|row| row.chars().count() == 2));

    // Column r is robot r's move string
    let column0 = rows
        .iter()
        .map(|row| row.as_bytes()[0] as char)
        .collect::<String>();
    assert_eq!(column0, schedule.moves_of(0).unwrap());
}
