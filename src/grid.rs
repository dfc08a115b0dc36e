use std::{
    fmt::Display,
    ops::{Add, Sub},
};

use crate::Time;

/// Position of a cell on the warehouse floor
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct SpacePoint {
    pub x: i32,
    pub y: i32,
}

/// Position of a robot at a specific point in time
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct SpaceTimePoint {
    pub x: i32,
    pub y: i32,
    pub t: Time,
}

impl SpacePoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Pin this cell to a point in time
    pub const fn at(self, t: Time) -> SpaceTimePoint {
        SpaceTimePoint::new(self.x, self.y, t)
    }
}

impl SpaceTimePoint {
    pub const fn new(x: i32, y: i32, t: Time) -> Self {
        Self { x, y, t }
    }

    /// Project away the time component
    pub const fn space(self) -> SpacePoint {
        SpacePoint::new(self.x, self.y)
    }
}

impl From<SpaceTimePoint> for SpacePoint {
    fn from(p: SpaceTimePoint) -> Self {
        p.space()
    }
}

impl Display for SpacePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.x, self.y)
    }
}

impl Display for SpaceTimePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}@{}", self.x, self.y, self.t)
    }
}

/// Grid distance between two cells, ignoring reservations
pub fn manhattan(a: impl Into<SpacePoint>, b: impl Into<SpacePoint>) -> i32 {
    let (a, b) = (a.into(), b.into());
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Possible action a robot can take within a single tick
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    #[default]
    Rest,
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    pub const ALL: [Self; 5] = [Self::Rest, Self::Left, Self::Right, Self::Up, Self::Down];

    pub fn delta(&self) -> SpacePoint {
        match self {
            Self::Rest => SpacePoint::new(0, 0),
            Self::Up => SpacePoint::new(0, -1),
            Self::Down => SpacePoint::new(0, 1),
            Self::Left => SpacePoint::new(-1, 0),
            Self::Right => SpacePoint::new(1, 0),
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Self::Rest => 'S',
            Self::Up => 'U',
            Self::Down => 'D',
            Self::Left => 'L',
            Self::Right => 'R',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.symbol() == c)
    }
}

impl Add<Move> for SpacePoint {
    type Output = Self;

    fn add(self, other: Move) -> Self::Output {
        let d = other.delta();
        Self::new(self.x + d.x, self.y + d.y)
    }
}

impl Sub for SpacePoint {
    type Output = Move;

    fn sub(self, other: Self) -> Self::Output {
        let d = Self::new(self.x - other.x, self.y - other.y);
        Move::ALL
            .iter()
            .copied()
            .find(|m| m.delta() == d)
            .unwrap_or_default()
    }
}
