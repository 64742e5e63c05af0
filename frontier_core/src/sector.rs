use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hash::LocationHash;

/// Integer grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub const ORIGIN: Coordinate = Coordinate { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.wrapping_add(dx), self.y.wrapping_add(dy))
    }

    pub fn distance_squared(self) -> i64 {
        let x = self.x as i64;
        let y = self.y as i64;
        x * x + y * y
    }

    /// The 3×3 block centred on this coordinate, itself included.
    pub fn neighbourhood(self) -> impl Iterator<Item = Coordinate> {
        (-1..=1).flat_map(move |dy| (-1..=1).map(move |dx| self.offset(dx, dy)))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Coordinate {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Environmental classification of a sector.
///
/// The integer values are stored in the sector history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionKind {
    Blank,
    Nebula,
    SafeSpace,
    DeepSpace,
    DarkSpace,
}

impl RegionKind {
    pub fn as_i32(self) -> i32 {
        match self {
            RegionKind::Blank => -1,
            RegionKind::Nebula => 0,
            RegionKind::SafeSpace => 1,
            RegionKind::DeepSpace => 2,
            RegionKind::DarkSpace => 3,
        }
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            -1 => Some(RegionKind::Blank),
            0 => Some(RegionKind::Nebula),
            1 => Some(RegionKind::SafeSpace),
            2 => Some(RegionKind::DeepSpace),
            3 => Some(RegionKind::DarkSpace),
            _ => None,
        }
    }
}

/// Lightweight reference from a sector to the planet stored in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlanetRef {
    pub id: LocationHash,
    pub tier: u8,
}

/// Resolved content of one grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sector {
    pub position: Coordinate,
    pub region: RegionKind,
    pub planet: Option<PlanetRef>,
    pub explored: bool,
}

impl Sector {
    pub fn explored(position: Coordinate, region: RegionKind, planet: Option<PlanetRef>) -> Self {
        Self {
            position,
            region,
            planet,
            explored: true,
        }
    }

    /// Placeholder returned for coordinates nobody has explored yet.
    pub fn unexplored(position: Coordinate) -> Self {
        Self {
            position,
            region: RegionKind::DarkSpace,
            planet: None,
            explored: false,
        }
    }

    pub fn has_planet(&self) -> bool {
        self.planet.is_some()
    }
}
