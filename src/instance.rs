use rustc_hash::FxHashMap;

use crate::grid::SpacePoint;

/// Everything the input file declares. Fixed for the whole run.
#[derive(Debug)]
pub struct Instance {
    pub width: i32,
    pub height: i32,
    /// Maximum (and initial) charge of every robot
    pub charge: i32,
    pub shelves: FxHashMap<char, SpacePoint>,
    pub chargers: Vec<SpacePoint>,
    /// Robots by ascending id
    pub robots: Vec<(u8, SpacePoint)>,
    /// Deliveries in the order they must be scheduled
    pub deliveries: Vec<Delivery>,
}

/// One pickup & drop job. The id doubles as the marker emitted into the move
/// string while loading and unloading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub id: char,
    pub pickup: char,
    pub dropoff: char,
}

impl Instance {
    pub fn shelf(&self, letter: char) -> Option<SpacePoint> {
        self.shelves.get(&letter).copied()
    }
}
