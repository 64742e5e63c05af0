use bevy::prelude::Resource;

use crate::cache::SectorCache;
use crate::sector::{Coordinate, Sector};

pub const MAX_PROBES_PER_STEP: usize = 4096;

/// Square spiral walker that explores outward from an origin.
///
/// Legs run right, down, left, up with lengths 1, 1, 2, 2, 3, 3, ...
#[derive(Resource, Debug, Clone)]
pub struct Explorer {
    origin: Coordinate,
    position: Coordinate,
    heading: (i32, i32),
    remaining_steps: u32,
    twice_side_length: u32,
}

impl Explorer {
    pub fn new(origin: Coordinate) -> Self {
        let mut explorer = Self {
            origin,
            position: origin,
            heading: (0, 0),
            remaining_steps: 1,
            twice_side_length: 1,
        };
        explorer.reset();
        explorer
    }

    pub fn reset(&mut self) {
        self.position = self.origin;
        self.heading = (0, 0);
        self.remaining_steps = 1;
        self.twice_side_length = 1;
    }

    /// Restarts the spiral around a new origin.
    pub fn relocate(&mut self, origin: Coordinate) {
        self.origin = origin;
        self.reset();
    }

    pub fn origin(&self) -> Coordinate {
        self.origin
    }

    pub fn position(&self) -> Coordinate {
        self.position
    }

    fn turn(&mut self) {
        self.heading = match self.heading {
            (0, 0) => (1, 0),
            (1, 0) => (0, -1),
            (0, -1) => (-1, 0),
            (-1, 0) => (0, 1),
            _ => (1, 0),
        };
    }

    fn advance(&mut self) {
        self.position = self.position.offset(self.heading.0, self.heading.1);
        self.remaining_steps -= 1;
        if self.remaining_steps == 0 {
            self.twice_side_length += 1;
            self.remaining_steps = self.twice_side_length >> 1;
            self.turn();
        }
    }

    /// Explores up to `max_sectors` new in-bounds sectors, probing at most
    /// [`MAX_PROBES_PER_STEP`] positions.
    pub fn step(&mut self, cache: &mut SectorCache, max_sectors: usize) -> Vec<Sector> {
        let mut explored = Vec::new();
        for _ in 0..MAX_PROBES_PER_STEP {
            if explored.len() >= max_sectors {
                break;
            }
            let here = self.position;
            if cache.is_valid_position(here) && !cache.is_explored(here) {
                explored.push(cache.explore(here));
            }
            self.advance();
        }
        explored
    }
}

impl Default for Explorer {
    fn default() -> Self {
        Self::new(Coordinate::ORIGIN)
    }
}
