//! Low level space-time path planning for a single robot
use std::collections::BinaryHeap;

use itertools::Itertools;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{
    grid::{SpacePoint, SpaceTimePoint, manhattan},
    reservations::Reservations,
};

/// Where a robot at `p` can be one tick later: the same cell plus the four
/// cardinal neighbours inside the grid, minus everything the reservation
/// table rules out.
pub(crate) fn neighbours(
    p: SpaceTimePoint,
    width: i32,
    height: i32,
    reservations: &Reservations,
) -> Vec<SpaceTimePoint> {
    let mut candidates = vec![SpaceTimePoint::new(p.x, p.y, p.t + 1)];
    if p.x > 0 {
        candidates.push(SpaceTimePoint::new(p.x - 1, p.y, p.t + 1));
    }
    if p.x < width - 1 {
        candidates.push(SpaceTimePoint::new(p.x + 1, p.y, p.t + 1));
    }
    if p.y > 0 {
        candidates.push(SpaceTimePoint::new(p.x, p.y - 1, p.t + 1));
    }
    if p.y < height - 1 {
        candidates.push(SpaceTimePoint::new(p.x, p.y + 1, p.t + 1));
    }
    candidates.retain(|n| reservations.available(*n));
    candidates
}

fn reconstruct(
    came_from: &FxHashMap<SpaceTimePoint, SpaceTimePoint>,
    goal: SpaceTimePoint,
) -> Vec<SpaceTimePoint> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&previous) = came_from.get(&current) {
        path.push(previous);
        current = previous;
    }
    path.reverse();
    path
}

/// Plan the shortest path from `start` to `goal` through the space-time
/// lattice, leaving reserved cells alone.
///
/// `rest_after` is how many ticks the goal cell must stay free beyond the
/// arrival, e.g. for loading, unloading or charging. `charge` bounds the
/// number of moving steps; resting is free. An empty result means no path
/// was found.
pub fn a_star(
    start: SpaceTimePoint,
    goal: SpacePoint,
    rest_after: i32,
    charge: i32,
    width: i32,
    height: i32,
    detour_factor: i32,
    reservations: &Reservations,
) -> Vec<SpaceTimePoint> {
    if charge < 0 {
        return Vec::new();
    }

    // Once a branch has burnt this much time it is circling the start or
    // dwelling in a pocket the reservations carved out. Give up on the whole
    // search rather than flooding the lattice.
    let bound = detour_factor * manhattan(start, goal);

    let mut open = BinaryHeap::new();
    let mut came_from: FxHashMap<SpaceTimePoint, SpaceTimePoint> = FxHashMap::default();
    open.push(Item {
        cost: start.t + manhattan(start, goal),
        point: start,
        charge,
    });

    while let Some(Item { point, charge, .. }) = open.pop() {
        if point.space() == goal {
            return reconstruct(&came_from, point);
        }

        for n in neighbours(point, width, height, reservations) {
            // All edges cost one tick, so the first touch of a node is also
            // the earliest. The predecessor map doubles as the seen set.
            let remaining = if n.space() == point.space() {
                charge
            } else {
                charge - 1
            };
            if remaining < 0 {
                continue;
            }

            if n.t - start.t >= bound {
                debug!(%start, %goal, bound, "giving up, detour bound exceeded");
                return Vec::new();
            }

            if came_from.contains_key(&n) {
                continue;
            }

            if n.space() == goal
                && (0..=rest_after + 1)
                    .any(|i| came_from.contains_key(&SpaceTimePoint::new(n.x, n.y, n.t + i)))
            {
                // The goal only counts if the robot can sit out its dwell
                // there afterwards
                continue;
            }

            came_from.insert(n, point);
            open.push(Item {
                cost: n.t + manhattan(n, goal),
                point: n,
                charge: remaining,
            });
        }
    }

    Vec::new()
}

/// Number of moving steps along a path; resting is free
pub fn used_charge(path: &[SpaceTimePoint]) -> i32 {
    path.iter()
        .tuple_windows()
        .filter(|(a, b)| a.space() != b.space())
        .count() as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Item {
    cost: i32,
    point: SpaceTimePoint,
    charge: i32,
}

impl Ord for Item {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .cost
            .cmp(&self.cost) // reverse for min heap
            .then_with(|| other.point.x.cmp(&self.point.x)) // equal costs prefer smaller x
    }
}

impl PartialOrd for Item {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Move;

    fn moves(path: &[SpaceTimePoint]) -> Vec<Move> {
        path.iter()
            .tuple_windows()
            .map(|(a, b)| b.space() - a.space())
            .collect()
    }

    #[test]
    fn finds_a_time_optimal_path_on_an_open_grid() {
        let path = a_star(
            SpaceTimePoint::new(0, 0, 0),
            SpacePoint::new(4, 5),
            1,
            100,
            10,
            10,
            20,
            &Reservations::default(),
        );

        assert_eq!(path.len(), 10);
        assert_eq!(path.first(), Some(&SpaceTimePoint::new(0, 0, 0)));
        assert_eq!(path.last(), Some(&SpaceTimePoint::new(4, 5, 9)));
        assert!(
            moves(&path)
                .iter()
                .all(|m| matches!(m, Move::Right | Move::Down))
        );
    }

    #[test]
    fn trivial_when_start_is_already_the_goal() {
        let path = a_star(
            SpaceTimePoint::new(2, 3, 5),
            SpacePoint::new(2, 3),
            1,
            100,
            10,
            10,
            20,
            &Reservations::default(),
        );

        assert_eq!(path, vec![SpaceTimePoint::new(2, 3, 5)]);
    }

    #[test]
    fn keeps_clear_of_a_committed_path() {
        let mut reservations = Reservations::default();
        let first = a_star(
            SpaceTimePoint::new(0, 0, 0),
            SpacePoint::new(4, 5),
            1,
            100,
            10,
            10,
            20,
            &Reservations::default(),
        );
        reservations.commit(&first);

        let second = a_star(
            SpaceTimePoint::new(5, 0, 0),
            SpacePoint::new(2, 0),
            1,
            100,
            10,
            10,
            20,
            &reservations,
        );

        assert!(!second.is_empty());
        assert_eq!(second.last().map(|p| p.space()), Some(SpacePoint::new(2, 0)));
        for p in &second {
            for dt in -1..=1 {
                assert!(
                    !first.contains(&SpaceTimePoint::new(p.x, p.y, p.t + dt)),
                    "{p} is within one tick of the committed path"
                );
            }
        }
    }

    #[test]
    fn detours_around_a_single_reserved_cell() {
        let mut reservations = Reservations::default();
        reservations.insert(SpaceTimePoint::new(2, 0, 3));

        let path = a_star(
            SpaceTimePoint::new(0, 0, 0),
            SpacePoint::new(4, 0),
            1,
            100,
            10,
            10,
            20,
            &reservations,
        );

        assert!(!path.is_empty());
        for t in 2..=4 {
            assert!(!path.contains(&SpaceTimePoint::new(2, 0, t)));
        }
    }

    #[test]
    fn negative_charge_means_no_path() {
        let path = a_star(
            SpaceTimePoint::new(0, 0, 0),
            SpacePoint::new(4, 5),
            1,
            -1,
            10,
            10,
            20,
            &Reservations::default(),
        );
        assert!(path.is_empty());
    }

    #[test]
    fn insufficient_charge_means_no_path() {
        // 9 moves needed, 8 allowed: the search ends up resting until the
        // detour bound fires
        let path = a_star(
            SpaceTimePoint::new(0, 0, 0),
            SpacePoint::new(4, 5),
            1,
            8,
            10,
            10,
            20,
            &Reservations::default(),
        );
        assert!(path.is_empty());
    }

    #[test]
    fn gives_up_once_the_detour_bound_is_hit() {
        // The goal next door is fenced off for a long time, so every branch
        // is doomed to circle until the bound fires
        let mut reservations = Reservations::default();
        for t in 0..100 {
            reservations.insert(SpaceTimePoint::new(1, 0, t));
        }

        let path = a_star(
            SpaceTimePoint::new(0, 0, 0),
            SpacePoint::new(1, 0),
            1,
            100,
            10,
            10,
            20,
            &reservations,
        );
        assert!(path.is_empty());
    }

    #[test]
    fn counts_only_moving_steps_as_charge() {
        let path = [
            SpaceTimePoint::new(0, 0, 0),
            SpaceTimePoint::new(1, 0, 1),
            SpaceTimePoint::new(1, 0, 2),
            SpaceTimePoint::new(1, 1, 3),
        ];
        assert_eq!(used_charge(&path), 2);
        assert_eq!(used_charge(&[]), 0);
    }
}
