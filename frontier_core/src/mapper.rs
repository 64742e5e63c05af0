//! Coordinate to sector content mapping.

use std::sync::Arc;

use rayon::prelude::*;

use crate::config::{ConfigError, RegionConfig, WorldParameters};
use crate::hash::{LocationHash, PermutationHash};
use crate::noise::NoiseField;
use crate::planet::Planet;
use crate::sector::{Coordinate, RegionKind, Sector};

/// Everything derivable for one coordinate.
#[derive(Debug, Clone)]
pub struct MappedSector {
    pub position: Coordinate,
    pub location_hash: LocationHash,
    pub noise: i32,
    pub region: RegionKind,
    pub planet: Option<Planet>,
}

impl MappedSector {
    pub fn sector(&self) -> Sector {
        Sector::explored(
            self.position,
            self.region,
            self.planet.as_ref().map(Planet::planet_ref),
        )
    }
}

/// Spawn dice taken from the location hash: hex digits `[2..6]` scaled by
/// `0xFFFF` and `[6..8]` scaled by `0xFF`.
pub fn hash_fractions(hash: &LocationHash) -> (f32, f32) {
    let bytes = hash.as_bytes();
    let outer = u16::from_be_bytes([bytes[1], bytes[2]]) as f32 / u16::MAX as f32;
    let inner = bytes[3] as f32 / u8::MAX as f32;
    (outer, inner)
}

/// Owns the location hasher and the noise field. Cloning yields an
/// independent mapper with its own scratch state.
#[derive(Debug, Clone)]
pub struct UniverseMapper {
    params: Arc<WorldParameters>,
    location: PermutationHash,
    noise: NoiseField,
}

impl UniverseMapper {
    pub fn new(params: Arc<WorldParameters>) -> Result<Self, ConfigError> {
        params.validate()?;
        let location = PermutationHash::new(&params.location_seed, params.location_rounds)?;
        let noise = NoiseField::new(&params)?;
        Ok(Self {
            params,
            location,
            noise,
        })
    }

    pub fn params(&self) -> &Arc<WorldParameters> {
        &self.params
    }

    pub fn location_hash(&mut self, position: Coordinate) -> LocationHash {
        let digest = self
            .location
            .digest_i64(&[position.x as i64, position.y as i64]);
        LocationHash::from_field(&digest)
    }

    pub fn noise_value(&mut self, position: Coordinate) -> i32 {
        self.noise.quantized_value_at(position)
    }

    /// Region whose threshold the noise value is strictly below, else the
    /// last region.
    pub fn region_for_noise(&self, noise: i32) -> &RegionConfig {
        let index = self
            .params
            .region_thresholds
            .iter()
            .position(|&threshold| noise < threshold)
            .unwrap_or(self.params.region_thresholds.len());
        &self.params.regions[index]
    }

    pub fn try_map(&mut self, position: Coordinate) -> MappedSector {
        let location_hash = self.location_hash(position);
        let noise = self.noise_value(position);
        let region = self.region_for_noise(noise);
        let planet = spawn_planet(&self.params, region, position, location_hash, noise);
        MappedSector {
            position,
            location_hash,
            noise,
            region: region.kind,
            planet,
        }
    }

    /// Rebuilds the planet of a sector from its stored hash and noise value
    /// without re-running either hasher.
    pub fn rebuild_sector(
        &self,
        position: Coordinate,
        region: RegionKind,
        location_hash: LocationHash,
        noise: i32,
    ) -> Option<Planet> {
        let region = self.params.region_config(region)?;
        spawn_planet(&self.params, region, position, location_hash, noise)
    }
}

fn spawn_planet(
    params: &WorldParameters,
    region: &RegionConfig,
    position: Coordinate,
    location_hash: LocationHash,
    noise: i32,
) -> Option<Planet> {
    let (outer, inner) = hash_fractions(&location_hash);
    if outer > region.spawn_threshold {
        return None;
    }
    let tier_index = region
        .tier_thresholds
        .iter()
        .position(|&threshold| inner <= threshold)?;
    let tier = params.tiers.get(tier_index)?;
    Some(Planet::new(location_hash, position, noise, region, tier))
}

/// Maps coordinates in parallel; every rayon worker clones its own mapper.
/// Output order follows `positions`.
pub fn map_batch(
    params: Arc<WorldParameters>,
    positions: &[Coordinate],
) -> Result<Vec<MappedSector>, ConfigError> {
    let mapper = UniverseMapper::new(params)?;
    Ok(positions
        .par_iter()
        .map_init(|| mapper.clone(), |mapper, &position| mapper.try_map(position))
        .collect())
}
