//! Sparse, append-only store of explored sectors.
//!
//! The cache owns the planet arena (keyed by location hash), the region
//! quadtree and the adjacency set. Every write updates all of them together
//! and queues a notification for observers.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::SystemTime;

use bevy::prelude::Resource;

use crate::config::{ConfigError, WorldParameters};
use crate::hash::LocationHash;
use crate::mapper::UniverseMapper;
use crate::planet::{Planet, PlayerId};
use crate::quadtree::RegionQuadtree;
use crate::sector::{Coordinate, RegionKind, Sector};

/// Notification queued by cache mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectorEvent {
    /// A coordinate was mapped for the first time.
    Explored(Sector),
    /// A sector was written or one of its planet's fields changed.
    Changed(Sector),
}

/// Authoritative planet state coming from the network boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorityUpdate {
    pub planet: LocationHash,
    pub energy: f64,
    pub tick: u64,
    pub refill_start: SystemTime,
    pub owner: Option<PlayerId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    Stale,
    UnknownPlanet,
}

#[derive(Resource, Debug)]
pub struct SectorCache {
    mapper: UniverseMapper,
    sectors: HashMap<Coordinate, Sector>,
    planets: HashMap<LocationHash, Planet>,
    known_or_adjacent: HashSet<Coordinate>,
    matching_neighbours: HashSet<(Coordinate, RegionKind)>,
    quadtree: RegionQuadtree,
    events: Vec<SectorEvent>,
    explored: usize,
}

impl SectorCache {
    pub fn new(params: Arc<WorldParameters>) -> Result<Self, ConfigError> {
        let quadtree = RegionQuadtree::for_radius(params.world_radius);
        let mapper = UniverseMapper::new(params)?;
        Ok(Self::with_mapper(mapper, quadtree))
    }

    pub fn with_mapper(mapper: UniverseMapper, quadtree: RegionQuadtree) -> Self {
        Self {
            mapper,
            sectors: HashMap::new(),
            planets: HashMap::new(),
            known_or_adjacent: HashSet::new(),
            matching_neighbours: HashSet::new(),
            quadtree,
            events: Vec::new(),
            explored: 0,
        }
    }

    pub fn params(&self) -> &Arc<WorldParameters> {
        self.mapper.params()
    }

    pub fn mapper(&self) -> &UniverseMapper {
        &self.mapper
    }

    pub fn quadtree(&self) -> &RegionQuadtree {
        &self.quadtree
    }

    pub fn is_valid_position(&self, position: Coordinate) -> bool {
        self.params().is_valid_position(position.x, position.y)
    }

    /// Current knowledge about `position`. Does not explore, except that
    /// coordinates beyond the world radius are recorded as dark space.
    pub fn sector_at(&mut self, position: Coordinate) -> Sector {
        if let Some(sector) = self.sectors.get(&position) {
            return *sector;
        }
        if !self.is_valid_position(position) {
            let sector = Sector::explored(position, RegionKind::DarkSpace, None);
            self.write(sector, None);
            return sector;
        }
        Sector::unexplored(position)
    }

    pub fn peek(&self, position: Coordinate) -> Option<&Sector> {
        self.sectors.get(&position)
    }

    pub fn is_explored(&self, position: Coordinate) -> bool {
        self.sectors
            .get(&position)
            .map_or(false, |sector| sector.explored)
    }

    /// Stores a sector and reports whether it was accepted. The sector's
    /// planet reference is taken from `planet`, which enters the arena under
    /// its location hash; planet-bearing sectors also enter the quadtree.
    /// Explored sectors are never overwritten, and unexplored placeholders
    /// carry no planet.
    pub fn write(&mut self, sector: Sector, planet: Option<Planet>) -> bool {
        let position = sector.position;
        let previous = self.sectors.get(&position).copied();
        if previous.map_or(false, |old| old.explored) {
            tracing::debug!(
                target: "frontier::cache",
                x = position.x,
                y = position.y,
                "sector.write_ignored=explored"
            );
            return false;
        }
        if let Some(planet) = &planet {
            if !sector.explored || planet.position() != position {
                tracing::warn!(
                    target: "frontier::cache",
                    x = position.x,
                    y = position.y,
                    hash = %planet.id(),
                    "sector.write_rejected=planet"
                );
                return false;
            }
        }

        let sector = Sector {
            planet: planet.as_ref().map(Planet::planet_ref),
            ..sector
        };
        self.sectors.insert(position, sector);
        if previous.is_none() {
            self.known_or_adjacent.extend(position.neighbourhood());
        }
        if sector.explored {
            self.explored += 1;
        }
        if let Some(planet) = planet {
            self.planets.insert(planet.id(), planet);
        }
        if sector.has_planet() {
            self.quadtree.insert(&sector);
        }
        self.events.push(SectorEvent::Changed(sector));
        true
    }

    /// Maps and stores `position` unless it is already explored.
    pub fn explore(&mut self, position: Coordinate) -> Sector {
        let current = self.sector_at(position);
        if current.explored {
            return current;
        }

        let mapped = self.mapper.try_map(position);
        let sector = mapped.sector();
        if let Some(planet) = &mapped.planet {
            tracing::debug!(
                target: "frontier::cache",
                x = position.x,
                y = position.y,
                tier = planet.tier(),
                region = ?mapped.region,
                hash = %mapped.location_hash,
                "sector.explored=planet"
            );
        }
        self.write(sector, mapped.planet);
        self.events.push(SectorEvent::Explored(sector));
        sector
    }

    pub fn try_lookup_by_hash(&self, hash: &LocationHash) -> Option<&Planet> {
        self.planets.get(hash)
    }

    pub fn planet_mut(&mut self, hash: &LocationHash) -> Option<&mut Planet> {
        self.planets.get_mut(hash)
    }

    pub fn planet_at(&self, position: Coordinate) -> Option<&Planet> {
        let planet = self.sectors.get(&position)?.planet?;
        self.planets.get(&planet.id)
    }

    pub fn planets(&self) -> impl Iterator<Item = &Planet> {
        self.planets.values()
    }

    /// True once `position` or any cell next to it has been written.
    pub fn has_explored_neighbors(&self, position: Coordinate) -> bool {
        self.known_or_adjacent.contains(&position)
    }

    pub fn has_more_than_one_neighbor(&mut self, position: Coordinate, offsets: &[(i32, i32)]) -> bool {
        let mut count = 0;
        for &(dx, dy) in offsets {
            if self.sector_at(position.offset(dx, dy)).explored {
                count += 1;
                if count > 1 {
                    return true;
                }
            }
        }
        false
    }

    /// True when the whole 3×3 block around `position` is explored and in
    /// `region`. Positive answers are remembered since sectors never change
    /// region once explored.
    pub fn matches_all_neighbors(&mut self, position: Coordinate, region: RegionKind) -> bool {
        if self.matching_neighbours.contains(&(position, region)) {
            return true;
        }
        for cell in position.neighbourhood() {
            let sector = self.sector_at(cell);
            if !sector.explored || sector.region != region {
                return false;
            }
        }
        self.matching_neighbours.insert((position, region));
        true
    }

    /// Applies an authoritative planet update. Owner changes only land
    /// together with an accepted energy reading.
    pub fn apply_update(&mut self, update: &AuthorityUpdate) -> UpdateOutcome {
        let Some(planet) = self.planets.get_mut(&update.planet) else {
            tracing::debug!(
                target: "frontier::cache",
                hash = %update.planet,
                "authority_update.unknown_planet"
            );
            return UpdateOutcome::UnknownPlanet;
        };
        if !planet.try_set_energy(update.energy, update.tick, update.refill_start) {
            tracing::debug!(
                target: "frontier::cache",
                hash = %update.planet,
                tick = update.tick,
                last_tick = planet.last_tick(),
                "authority_update.stale"
            );
            return UpdateOutcome::Stale;
        }
        match update.owner {
            Some(owner) => planet.claim(owner),
            None => planet.disclaim(),
        }
        let position = planet.position();
        if let Some(sector) = self.sectors.get(&position) {
            self.events.push(SectorEvent::Changed(*sector));
        }
        UpdateOutcome::Applied
    }

    /// Takes every notification queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<SectorEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn explored_count(&self) -> usize {
        self.explored
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    /// Explored sectors, in no particular order.
    pub fn sectors(&self) -> impl Iterator<Item = &Sector> {
        self.sectors.values()
    }
}
