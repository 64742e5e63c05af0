//! Planet state: lazily evaluated energy, derived stats and transfer
//! bookkeeping.

use std::fmt;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::config::{RegionConfig, TierConfig};
use crate::hash::LocationHash;
use crate::sector::{Coordinate, PlanetRef, RegionKind};

pub const MAX_EXPORT_SHIPS: u8 = 6;
const PRECISION_SNAP: f64 = 0.001;

/// Opaque identity of a player; planets with no owner are unclaimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// An energy shipment in flight to or from a planet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnergyTransfer {
    pub id: u64,
    pub energy_on_embark: i32,
    pub ship_owner: Option<PlayerId>,
}

/// Stats derived from the tier and the region multipliers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanetStats {
    pub capacity: f64,
    pub refill_period: f64,
    pub full_range: f64,
    pub speed: f64,
    pub defense: f64,
}

impl PlanetStats {
    pub fn derive(tier: &TierConfig, region: &RegionConfig) -> Self {
        Self {
            capacity: tier.capacity * region.stat_buff,
            refill_period: tier.refill_period * region.stat_buff,
            full_range: make_precise(tier.range * region.stat_buff).trunc(),
            speed: tier.speed * region.stat_buff,
            defense: tier.defense * region.defense_debuff,
        }
    }
}

/// Rounds values within a thousandth of an integer onto that integer.
pub fn make_precise(x: f64) -> f64 {
    let fract = x - x.floor();
    if fract < PRECISION_SNAP || 1.0 - fract < PRECISION_SNAP {
        x.round()
    } else {
        x
    }
}

fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

fn inverse_smoothstep(t: f64) -> f64 {
    0.5 - ((1.0 - 2.0 * t).asin() / 3.0).sin()
}

/// Double smoothstep over the saturated input.
pub fn scurve(t: f64) -> f64 {
    smoothstep(smoothstep(t.clamp(0.0, 1.0)))
}

pub fn inverse_scurve(t: f64) -> f64 {
    inverse_smoothstep(inverse_smoothstep(t.clamp(0.0, 1.0)))
}

#[derive(Debug, Clone)]
pub struct Planet {
    id: LocationHash,
    position: Coordinate,
    noise: i32,
    region: RegionKind,
    tier: u8,
    stats: PlanetStats,
    owner: Option<PlayerId>,
    energy: f64,
    last_tick: u64,
    refill_start: SystemTime,
    refill_start_fraction: f64,
    export_ships_remaining: u8,
    inbound: Vec<EnergyTransfer>,
    outbound: Vec<EnergyTransfer>,
}

impl Planet {
    /// Creates an unclaimed planet holding the tier default energy at tick 0.
    pub fn new(
        id: LocationHash,
        position: Coordinate,
        noise: i32,
        region: &RegionConfig,
        tier: &TierConfig,
    ) -> Self {
        let stats = PlanetStats::derive(tier, region);
        let mut planet = Self {
            id,
            position,
            noise,
            region: region.kind,
            tier: tier.level,
            stats,
            owner: None,
            energy: 0.0,
            last_tick: 0,
            refill_start: SystemTime::UNIX_EPOCH,
            refill_start_fraction: 0.0,
            export_ships_remaining: MAX_EXPORT_SHIPS,
            inbound: Vec::new(),
            outbound: Vec::new(),
        };
        planet.apply_energy(tier.default_energy, 0, SystemTime::UNIX_EPOCH);
        planet
    }

    pub fn id(&self) -> LocationHash {
        self.id
    }

    pub fn position(&self) -> Coordinate {
        self.position
    }

    pub fn noise(&self) -> i32 {
        self.noise
    }

    pub fn region(&self) -> RegionKind {
        self.region
    }

    pub fn tier(&self) -> u8 {
        self.tier
    }

    pub fn stats(&self) -> &PlanetStats {
        &self.stats
    }

    pub fn capacity(&self) -> f64 {
        self.stats.capacity
    }

    pub fn refill_period(&self) -> f64 {
        self.stats.refill_period
    }

    pub fn speed(&self) -> f64 {
        self.stats.speed
    }

    pub fn defense(&self) -> f64 {
        self.stats.defense
    }

    pub fn full_range(&self) -> f64 {
        self.stats.full_range
    }

    pub fn planet_ref(&self) -> PlanetRef {
        PlanetRef {
            id: self.id,
            tier: self.tier,
        }
    }

    pub fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    pub fn is_claimed(&self) -> bool {
        self.owner.is_some()
    }

    pub fn claim(&mut self, owner: PlayerId) {
        self.owner = Some(owner);
    }

    pub fn disclaim(&mut self) {
        self.owner = None;
    }

    pub fn last_tick(&self) -> u64 {
        self.last_tick
    }

    /// Energy at `now`. Unclaimed planets do not refill.
    pub fn current_energy_at(&self, now: SystemTime) -> f64 {
        if !self.is_claimed() {
            return self.energy;
        }
        let elapsed = now
            .duration_since(self.refill_start)
            .unwrap_or(Duration::ZERO)
            .as_secs_f64();
        let t = inverse_scurve(self.refill_start_fraction) + elapsed / self.stats.refill_period;
        make_precise(scurve(t) * self.stats.capacity)
    }

    pub fn current_energy(&self) -> f64 {
        self.current_energy_at(SystemTime::now())
    }

    pub fn progress_at(&self, now: SystemTime) -> f64 {
        self.current_energy_at(now) / self.stats.capacity
    }

    /// Applies an authoritative energy reading. Ticks not newer than the last
    /// accepted one are ignored.
    pub fn try_set_energy(&mut self, amount: f64, tick: u64, refill_start: SystemTime) -> bool {
        if tick <= self.last_tick {
            return false;
        }
        self.apply_energy(amount, tick, refill_start);
        true
    }

    fn apply_energy(&mut self, amount: f64, tick: u64, refill_start: SystemTime) {
        self.last_tick = tick;
        self.energy = amount.clamp(0.0, self.stats.capacity);
        self.refill_start = refill_start;
        self.refill_start_fraction = self.energy / self.stats.capacity;
    }

    /// Whole sectors an energy shipment can travel when sending
    /// `energy_scale` of the current energy.
    pub fn current_range_at(&self, energy_scale: f64, now: SystemTime) -> f64 {
        let energy = (self.current_energy_at(now) * energy_scale).max(0.0);
        let capacity = self.stats.capacity;
        let cost_per_unit = capacity * 0.95 / self.stats.full_range;
        make_precise((energy - capacity * 0.05) / cost_per_unit).floor()
    }

    /// Deterministic display name of the form `XXX-###`.
    pub fn name(&self) -> String {
        planet_name(&self.id)
    }

    pub fn export_ships_remaining(&self) -> u8 {
        self.export_ships_remaining
    }

    pub fn inbound_transfers(&self) -> &[EnergyTransfer] {
        &self.inbound
    }

    pub fn outbound_transfers(&self) -> &[EnergyTransfer] {
        &self.outbound
    }

    pub fn add_outbound_transfer(&mut self, transfer: EnergyTransfer) {
        self.export_ships_remaining = self.export_ships_remaining.saturating_sub(1);
        insert_by_energy(&mut self.outbound, transfer);
    }

    pub fn add_inbound_transfer(&mut self, transfer: EnergyTransfer) {
        insert_by_energy(&mut self.inbound, transfer);
    }

    pub fn remove_outbound_transfer(&mut self, id: u64) -> Option<EnergyTransfer> {
        let index = self.outbound.iter().position(|transfer| transfer.id == id)?;
        self.export_ships_remaining = (self.export_ships_remaining + 1).min(MAX_EXPORT_SHIPS);
        Some(self.outbound.remove(index))
    }

    pub fn remove_inbound_transfer(&mut self, id: u64) -> Option<EnergyTransfer> {
        let index = self.inbound.iter().position(|transfer| transfer.id == id)?;
        Some(self.inbound.remove(index))
    }

    pub fn biggest_export(&self) -> Option<i32> {
        self.outbound.first().map(|transfer| transfer.energy_on_embark)
    }

    pub fn biggest_friendly_inbound(&self) -> Option<i32> {
        self.inbound
            .iter()
            .find(|transfer| transfer.ship_owner == self.owner)
            .map(|transfer| transfer.energy_on_embark)
    }

    pub fn biggest_hostile_inbound(&self) -> Option<i32> {
        self.inbound
            .iter()
            .find(|transfer| transfer.ship_owner != self.owner)
            .map(|transfer| transfer.energy_on_embark)
    }
}

/// Keeps the list sorted by embarked energy, largest first. Equal entries
/// are placed ahead of existing ones.
fn insert_by_energy(list: &mut Vec<EnergyTransfer>, transfer: EnergyTransfer) {
    let index = list.partition_point(|existing| existing.energy_on_embark > transfer.energy_on_embark);
    list.insert(index, transfer);
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    bytes.iter().fold(OFFSET_BASIS, |state, &byte| {
        (state ^ byte as u64).wrapping_mul(PRIME)
    })
}

pub fn planet_name(id: &LocationHash) -> String {
    let hex = id.to_string();
    let mut name = String::with_capacity(7);
    for i in 0..3 {
        let slice = &hex[5 + i..10 + i * 5];
        name.push(char::from(b'A' + (fnv1a(slice.as_bytes()) % 26) as u8));
    }
    name.push('-');
    for i in 0..3 {
        let slice = &hex[10 + i..15 + i * 5];
        name.push(char::from(b'0' + (fnv1a(slice.as_bytes()) % 10) as u8));
    }
    name
}
