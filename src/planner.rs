//! Sequential delivery scheduling and the trailing idle walk.
//!
//! Deliveries are planned one after the other in input order. Each one is a
//! chain of four searches (home to shelf, shelf to charger, charger to
//! dropoff, dropoff back to a charger) interleaved with loading, unloading
//! and recharge dwells. All four legs plan against the reservation table as
//! it stood before the delivery; only a fully successful chain commits. A
//! committed claim is never rescinded, so an early delivery can wedge a
//! later one. That trade is deliberate.
use itertools::Itertools;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use tracing::{debug, info};

use crate::{
    astar::{a_star, neighbours, used_charge},
    error::PlanError,
    grid::{SpacePoint, SpaceTimePoint, manhattan},
    instance::{Delivery, Instance},
    reservations::Reservations,
    schedule::{Schedule, encode},
};

/// One robot's mutable planning state
#[derive(Debug, Clone)]
struct Courier {
    id: u8,
    charge: i32,
    last_known: SpaceTimePoint,
    moves: String,
}

/// A fully planned but not yet committed delivery for one courier
struct Trip {
    cells: Vec<SpaceTimePoint>,
    moves: String,
    charge: i32,
    last_known: SpaceTimePoint,
}

pub struct Planner<'a> {
    instance: &'a Instance,
    detour_factor: i32,
    reservations: Reservations,
    fleet: Vec<Courier>,
}

impl<'a> Planner<'a> {
    pub fn new(instance: &'a Instance, detour_factor: i32) -> Self {
        let fleet = instance
            .robots
            .iter()
            .map(|&(id, home)| Courier {
                id,
                charge: instance.charge,
                last_known: home.at(0),
                moves: String::new(),
            })
            .collect();

        Self {
            instance,
            detour_factor,
            reservations: Reservations::default(),
            fleet,
        }
    }

    pub fn solve(mut self, seed: u64) -> Result<Schedule, PlanError> {
        for delivery in &self.instance.deliveries {
            self.deliver(delivery)?;
        }
        self.level_out(&mut StdRng::seed_from_u64(seed))?;

        Ok(Schedule::new(
            self.fleet.into_iter().map(|c| (c.id, c.moves)).collect(),
        ))
    }

    fn deliver(&mut self, delivery: &Delivery) -> Result<(), PlanError> {
        let pickup = self
            .instance
            .shelf(delivery.pickup)
            .ok_or(PlanError::NoSolution)?;
        let dropoff = self
            .instance
            .shelf(delivery.dropoff)
            .ok_or(PlanError::NoSolution)?;

        // Earliest-free couriers get the first shot
        let candidates = (0..self.fleet.len())
            .sorted_by_key(|&i| self.fleet[i].last_known.t)
            .collect::<Vec<_>>();

        for i in candidates {
            if let Some(trip) = self.attempt(&self.fleet[i], delivery, pickup, dropoff) {
                self.reservations.commit(&trip.cells);
                let courier = &mut self.fleet[i];
                courier.charge = trip.charge;
                courier.last_known = trip.last_known;
                courier.moves.push_str(&trip.moves);
                info!(
                    delivery = %delivery.id,
                    robot = courier.id,
                    until = courier.last_known.t,
                    "delivery committed"
                );
                return Ok(());
            }
        }

        info!(delivery = %delivery.id, "no robot can serve this delivery");
        Err(PlanError::NoSolution)
    }

    /// Plan all four legs for one courier against the current table. Nothing
    /// is committed here; a `None` simply sends the next courier in.
    fn attempt(
        &self,
        courier: &Courier,
        delivery: &Delivery,
        pickup: SpacePoint,
        dropoff: SpacePoint,
    ) -> Option<Trip> {
        let (width, height) = (self.instance.width, self.instance.height);
        let full = self.instance.charge;
        let mut remaining = courier.charge;

        // Home to shelf, with one tick on the shelf to load
        let to_pickup = a_star(
            courier.last_known,
            pickup,
            1,
            remaining,
            width,
            height,
            self.detour_factor,
            &self.reservations,
        );
        remaining -= used_charge(&to_pickup);
        if remaining < 0 || to_pickup.is_empty() {
            return None;
        }
        let loaded_at = to_pickup.last()?.t + 1;

        // Loaded: head for the charger best placed between shelf and dropoff
        let charger = self
            .instance
            .chargers
            .iter()
            .copied()
            .sorted_by_key(|&c| manhattan(pickup, c) + manhattan(dropoff, c))
            .next()?;
        let to_charger = a_star(
            pickup.at(loaded_at),
            charger,
            full,
            remaining,
            width,
            height,
            self.detour_factor,
            &self.reservations,
        );
        remaining -= used_charge(&to_charger);
        if remaining < 0 || to_charger.is_empty() {
            return None;
        }

        let reached_charger = to_charger.last()?.t;
        let rest = full - remaining;
        let recharge = (1..=rest)
            .map(|i| charger.at(reached_charger + i))
            .collect::<Vec<_>>();
        remaining = full;

        // Freshly charged: deliver, with one tick on the shelf to unload
        let to_dropoff = a_star(
            charger.at(reached_charger + rest),
            dropoff,
            1,
            remaining,
            width,
            height,
            self.detour_factor,
            &self.reservations,
        );
        remaining -= used_charge(&to_dropoff);
        if remaining < 0 || to_dropoff.is_empty() {
            return None;
        }
        let unloaded_at = to_dropoff.last()?.t + 1;

        // Retreat to the charger closest to the dropoff. A courier that
        // cannot retreat stays on the shelf cell, uncharged.
        let retreat = self
            .instance
            .chargers
            .iter()
            .copied()
            .sorted_by_key(|&c| manhattan(dropoff, c))
            .next()?;
        let to_rest = a_star(
            dropoff.at(unloaded_at),
            retreat,
            full,
            remaining,
            width,
            height,
            self.detour_factor,
            &self.reservations,
        );

        let mut cells = to_pickup.clone();
        cells.extend(&to_charger);
        cells.extend(&recharge);
        cells.extend(&to_dropoff);
        cells.push(dropoff.at(unloaded_at));

        let mut moves = encode(&to_pickup);
        moves.push(delivery.id);
        moves.push_str(&encode(&to_charger));
        moves.push_str(&"S".repeat(rest as usize));
        moves.push_str(&encode(&to_dropoff));
        moves.push(delivery.id);

        let last_known = if to_rest.is_empty() {
            debug!(robot = courier.id, "no retreat from the dropoff, parking on the shelf");
            dropoff.at(unloaded_at)
        } else {
            remaining -= used_charge(&to_rest);
            let reached_retreat = to_rest.last()?.t;
            let rest = full - remaining;
            cells.extend(&to_rest);
            cells.extend((1..=rest).map(|i| retreat.at(reached_retreat + i)));
            moves.push_str(&encode(&to_rest));
            moves.push_str(&"S".repeat(rest as usize));
            remaining = full;
            retreat.at(reached_retreat + rest)
        };

        Some(Trip {
            cells,
            moves,
            charge: remaining,
            last_known,
        })
    }

    /// Stretch every short trajectory to the common horizon with a
    /// reservation-respecting random walk.
    fn level_out(&mut self, rng: &mut StdRng) -> Result<(), PlanError> {
        let horizon = self
            .fleet
            .iter()
            .map(|c| c.last_known.t)
            .max()
            .unwrap_or_default();

        for i in 0..self.fleet.len() {
            let courier = &self.fleet[i];
            let needed = horizon - courier.last_known.t;
            if needed == 0 {
                continue;
            }

            let mut tail = Vec::with_capacity(needed as usize);
            if !evade(
                courier.last_known,
                courier.charge,
                needed,
                self.instance.width,
                self.instance.height,
                &self.reservations,
                rng,
                &mut tail,
            ) {
                info!(robot = courier.id, needed, "robot cannot evade");
                return Err(PlanError::Evasion);
            }

            let mut path = vec![courier.last_known];
            path.extend(&tail);
            self.reservations.commit(&path);

            let courier = &mut self.fleet[i];
            courier.charge -= used_charge(&path);
            courier.moves.push_str(&encode(&path));
            courier.last_known = tail.last().copied().unwrap_or(courier.last_known);
        }

        Ok(())
    }
}

/// Depth-first randomized walk gathering exactly `needed` further cells into
/// `tail`. Backtracks when a branch dies; fails only when every branch does.
fn evade(
    from: SpaceTimePoint,
    charge: i32,
    needed: i32,
    width: i32,
    height: i32,
    reservations: &Reservations,
    rng: &mut StdRng,
    tail: &mut Vec<SpaceTimePoint>,
) -> bool {
    if needed == 0 {
        return true;
    }

    let mut candidates = neighbours(from, width, height, reservations);
    candidates.shuffle(rng);

    for n in candidates {
        let remaining = if n.space() == from.space() {
            charge
        } else {
            charge - 1
        };
        if remaining < 0 {
            continue;
        }

        tail.push(n);
        if evade(n, remaining, needed - 1, width, height, reservations, rng, tail) {
            return true;
        }
        tail.pop();
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    fn small_instance() -> Instance {
        // 8x3 floor: robot top left, shelf A, charger top right, shelf B below
        let mut shelves = FxHashMap::default();
        shelves.insert('A', SpacePoint::new(3, 0));
        shelves.insert('B', SpacePoint::new(4, 2));

        Instance {
            width: 8,
            height: 3,
            charge: 100,
            shelves,
            chargers: vec![SpacePoint::new(7, 0)],
            robots: vec![(0, SpacePoint::new(0, 0))],
            deliveries: vec![Delivery {
                id: 'p',
                pickup: 'A',
                dropoff: 'B',
            }],
        }
    }

    #[test]
    fn plans_a_single_delivery_end_to_end() {
        let instance = small_instance();
        let schedule = Planner::new(&instance, 20).solve(0).unwrap();
        let moves = schedule.moves_of(0).unwrap();

        // Straight to the shelf, load, straight to the charger, recharge the
        // seven moving steps spent so far, deliver, unload, retreat, recharge
        assert!(moves.starts_with("RRRpRRRRSSSSSSS"));
        assert_eq!(moves.matches('p').count(), 2);
        assert!(moves.ends_with("SSSSSSSSSS"));
        assert_eq!(moves.len(), 36);
    }

    #[test]
    fn refuses_a_delivery_when_chargers_are_walled_off() {
        let instance = small_instance();
        let mut planner = Planner::new(&instance, 20);
        for t in 0..200 {
            planner
                .reservations
                .insert(SpacePoint::new(7, 0).at(t));
        }

        assert_eq!(planner.solve(0), Err(PlanError::NoSolution));
    }

    #[test]
    fn refuses_a_delivery_without_any_charger() {
        let mut instance = small_instance();
        instance.chargers.clear();

        assert_eq!(Planner::new(&instance, 20).solve(0), Err(PlanError::NoSolution));
    }

    #[test]
    fn idle_walk_rests_in_place_when_out_of_charge() {
        let mut tail = Vec::new();
        let ok = evade(
            SpaceTimePoint::new(0, 0, 0),
            0,
            5,
            3,
            3,
            &Reservations::default(),
            &mut StdRng::seed_from_u64(0),
            &mut tail,
        );

        assert!(ok);
        assert_eq!(
            tail,
            (1..=5).map(|t| SpaceTimePoint::new(0, 0, t)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn idle_walk_fails_when_boxed_in() {
        // A one-cell floor whose only cell is claimed at the next tick
        let mut reservations = Reservations::default();
        reservations.insert(SpaceTimePoint::new(0, 0, 1));

        let mut tail = Vec::new();
        let ok = evade(
            SpaceTimePoint::new(0, 0, 0),
            100,
            3,
            1,
            1,
            &reservations,
            &mut StdRng::seed_from_u64(0),
            &mut tail,
        );

        assert!(!ok);
    }
}
