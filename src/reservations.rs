use rustc_hash::FxHashSet;

use crate::grid::SpaceTimePoint;

/// Space-time cells already claimed by committed trajectories.
///
/// Claims are written once and never rescinded; every planner call reads the
/// table as it was when the call started.
#[derive(Debug, Default)]
pub struct Reservations(FxHashSet<SpaceTimePoint>);

impl Reservations {
    pub fn insert(&mut self, p: SpaceTimePoint) {
        self.0.insert(p);
    }

    pub fn commit(&mut self, path: &[SpaceTimePoint]) {
        for p in path {
            self.insert(*p);
        }
    }

    /// Whether a robot may occupy `p`. The cell must be unclaimed at `t` and
    /// at the two adjacent ticks: a robot may neither trail right behind
    /// another through the same cell nor force the other to move out of its
    /// way. An empty table short-circuits to available.
    pub fn available(&self, p: SpaceTimePoint) -> bool {
        self.0.is_empty()
            || !(self.0.contains(&p)
                || self.0.contains(&SpaceTimePoint::new(p.x, p.y, p.t - 1))
                || self.0.contains(&SpaceTimePoint::new(p.x, p.y, p.t + 1)))
    }

}
