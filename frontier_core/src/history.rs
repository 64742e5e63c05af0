//! Conversion between cache sectors and persisted history records, and
//! replay of a recorded history into a cache.

use std::sync::atomic::{AtomicBool, Ordering};

use frontier_proto::{PlanetRecord, SectorRecord};

use crate::cache::SectorCache;
use crate::hash::LocationHash;
use crate::sector::{Coordinate, RegionKind, Sector};

/// Records between cancellation checks and progress logs.
pub const REPLAY_CHUNK: usize = 500;

/// Builds the history record for an explored sector.
pub fn record_for(cache: &SectorCache, sector: &Sector) -> SectorRecord {
    let planet = sector
        .planet
        .and_then(|planet| cache.try_lookup_by_hash(&planet.id))
        .map(|planet| PlanetRecord {
            location_hash: planet.id().to_string(),
            noise: planet.noise(),
        });
    SectorRecord {
        x: sector.position.x,
        y: sector.position.y,
        region: sector.region.as_i32(),
        planet,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub applied: usize,
    pub skipped: usize,
    pub planets: usize,
    pub cancelled: bool,
}

/// Rebuilds cached sectors from history records.
///
/// Already explored coordinates and malformed records are skipped. The
/// `cancel` flag is checked every [`REPLAY_CHUNK`] records; sectors written
/// before cancellation stay in the cache.
pub fn replay_history<I>(cache: &mut SectorCache, records: I, cancel: &AtomicBool) -> ReplayReport
where
    I: IntoIterator<Item = SectorRecord>,
{
    let mut report = ReplayReport::default();
    for (index, record) in records.into_iter().enumerate() {
        if index > 0 && index % REPLAY_CHUNK == 0 {
            if cancel.load(Ordering::Relaxed) {
                report.cancelled = true;
                tracing::info!(
                    target: "frontier::history",
                    applied = report.applied,
                    "history.replay=cancelled"
                );
                return report;
            }
            tracing::debug!(
                target: "frontier::history",
                processed = index,
                "history.replay=progress"
            );
        }

        if replay_record(cache, &record) {
            report.applied += 1;
            report.planets += usize::from(record.has_planet());
        } else {
            report.skipped += 1;
        }
    }

    tracing::info!(
        target: "frontier::history",
        applied = report.applied,
        skipped = report.skipped,
        planets = report.planets,
        "history.replay=complete"
    );
    report
}

fn replay_record(cache: &mut SectorCache, record: &SectorRecord) -> bool {
    let position = Coordinate::new(record.x, record.y);
    if cache.is_explored(position) {
        return false;
    }
    let Some(region) = RegionKind::from_i32(record.region) else {
        tracing::warn!(
            target: "frontier::history",
            x = record.x,
            y = record.y,
            region = record.region,
            "history.record_rejected=region"
        );
        return false;
    };

    let planet = match &record.planet {
        None => None,
        Some(planet) => {
            let Some(hash) = LocationHash::from_hex(&planet.location_hash) else {
                tracing::warn!(
                    target: "frontier::history",
                    x = record.x,
                    y = record.y,
                    "history.record_rejected=hash"
                );
                return false;
            };
            cache
                .mapper()
                .rebuild_sector(position, region, hash, planet.noise)
        }
    };

    let sector = Sector::explored(position, region, planet.as_ref().map(|p| p.planet_ref()));
    cache.write(sector, planet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldParameters;
    use std::sync::Arc;

    fn cache() -> SectorCache {
        let mut params = WorldParameters::builtin().as_ref().clone();
        params.location_seed = "seed".to_string();
        params.noise_seed = "seed".to_string();
        params.noise_rounds = 110;
        params.scale = 4;
        params.world_radius = 100;
        SectorCache::new(Arc::new(params)).unwrap()
    }

    fn empty_record(x: i32, y: i32) -> SectorRecord {
        SectorRecord {
            x,
            y,
            region: 0,
            planet: None,
        }
    }

    #[test]
    fn records_rebuild_planets_without_hashing() {
        let mut source = cache();
        let sector = source.explore(Coordinate::new(8, 23));
        let record = record_for(&source, &sector);
        assert_eq!(record.region, 1);
        assert_eq!(record.planet.as_ref().unwrap().noise, 15);

        let mut target = cache();
        let report = replay_history(&mut target, vec![record], &AtomicBool::new(false));
        assert_eq!(report.applied, 1);
        assert_eq!(report.planets, 1);
        assert_eq!(target.peek(sector.position), Some(&sector));
        let planet = target.planet_at(sector.position).unwrap();
        assert_eq!(planet.tier(), 3);
    }

    #[test]
    fn explored_and_malformed_records_are_skipped() {
        let mut cache = cache();
        cache.explore(Coordinate::ORIGIN);
        let records = vec![
            empty_record(0, 0),
            SectorRecord {
                region: 9,
                ..empty_record(1, 1)
            },
            SectorRecord {
                planet: Some(PlanetRecord {
                    location_hash: "not hex".to_string(),
                    noise: 3,
                }),
                ..empty_record(2, 2)
            },
            empty_record(3, 3),
        ];
        let report = replay_history(&mut cache, records, &AtomicBool::new(false));
        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped, 3);
        assert!(!report.cancelled);
    }

    #[test]
    fn cancellation_keeps_written_sectors() {
        let mut cache = cache();
        let records: Vec<_> = (0..(REPLAY_CHUNK as i32 * 2))
            .map(|i| empty_record(i % 50, i / 50))
            .collect();
        let cancel = AtomicBool::new(true);
        let report = replay_history(&mut cache, records, &cancel);
        assert!(report.cancelled);
        assert_eq!(report.applied, REPLAY_CHUNK);
        assert_eq!(cache.explored_count(), REPLAY_CHUNK);
    }
}
