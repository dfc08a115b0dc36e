//! Per-robot action strings and their time-major output layout
use std::{fmt::Display, fs, io, path::Path};

use itertools::Itertools;

use crate::grid::{Move, SpacePoint, SpaceTimePoint};

/// Encode a path of consecutive space-time points as one action character
/// per tick
pub fn encode(path: &[SpaceTimePoint]) -> String {
    path.iter()
        .tuple_windows()
        .map(|(a, b)| (b.space() - a.space()).symbol())
        .collect()
}

/// Recover the visited cells from a start position and an action string.
/// Load and unload markers keep the robot in place, like an explicit stay.
pub fn decode(start: SpacePoint, moves: &str) -> Vec<SpacePoint> {
    let mut here = start;
    let mut positions = vec![here];
    for c in moves.chars() {
        here = here + Move::from_symbol(c).unwrap_or_default();
        positions.push(here);
    }
    positions
}

/// The complete joint plan: one action string per robot, all of equal
/// length, ordered by ascending robot id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    moves: Vec<(u8, String)>,
}

impl Schedule {
    pub(crate) fn new(moves: Vec<(u8, String)>) -> Self {
        Self { moves }
    }

    /// Number of ticks every robot is scheduled for
    pub fn duration(&self) -> usize {
        self.moves.first().map(|(_, m)| m.len()).unwrap_or_default()
    }

    pub fn moves_of(&self, id: u8) -> Option<&str> {
        self.moves
            .iter()
            .find(|(r, _)| *r == id)
            .map(|(_, m)| m.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &str)> {
        self.moves.iter().map(|(id, m)| (*id, m.as_str()))
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fs::write(path, self.to_string())
    }
}

impl Display for Schedule {
    /// Row `t` holds every robot's action at tick `t`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for t in 0..self.duration() {
            for (_, moves) in &self.moves {
                write!(f, "{}", moves.as_bytes()[t] as char)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
