//! World generation parameters.
//!
//! Loaded once at startup from `world_parameters.json`, with an environment
//! variable override and a compiled-in fallback.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use bevy::prelude::Resource;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sector::RegionKind;

pub const BUILTIN_WORLD_PARAMETERS: &str = include_str!("data/world_parameters.json");
pub const WORLD_PARAMETERS_ENV: &str = "WORLD_PARAMETERS_PATH";

const MAX_WORLD_RADIUS: i32 = 1 << 30;

bitflags! {
    /// Axes folded onto their absolute value before noise sampling.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct MirrorAxes: u8 {
        const X = 0b01;
        const Y = 0b10;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub kind: RegionKind,
    /// Planets spawn where the outer hash fraction does not exceed this.
    pub spawn_threshold: f32,
    /// Indexed by tier; the first entry the inner hash fraction does not
    /// exceed picks the tier. Negative entries never match.
    pub tier_thresholds: Vec<f32>,
    pub stat_buff: f64,
    pub defense_debuff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    pub level: u8,
    pub default_energy: f64,
    pub capacity: f64,
    /// Seconds to refill from empty.
    pub refill_period: f64,
    pub range: f64,
    pub speed: f64,
    pub defense: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldParameters {
    pub location_seed: String,
    pub location_rounds: u32,
    pub noise_seed: String,
    pub noise_rounds: u32,
    pub scale: i32,
    #[serde(default)]
    pub mirror: MirrorAxes,
    pub world_radius: i32,
    pub region_thresholds: Vec<i32>,
    pub regions: Vec<RegionConfig>,
    pub tiers: Vec<TierConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse world parameters: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read world parameters from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid world parameters: {0}")]
    Invalid(String),
}

impl WorldParameters {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_WORLD_PARAMETERS)
                .expect("builtin world parameters should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let params: WorldParameters = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        WorldParameters::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid(message));

        if self.location_rounds == 0 || self.noise_rounds == 0 {
            return invalid("hash rounds must be positive".to_string());
        }
        if self.scale <= 0 {
            return invalid(format!("scale must be positive, got {}", self.scale));
        }
        if !(1..=MAX_WORLD_RADIUS).contains(&self.world_radius) {
            return invalid(format!(
                "world radius {} outside 1..={MAX_WORLD_RADIUS}",
                self.world_radius
            ));
        }
        if self.regions.len() != self.region_thresholds.len() + 1 {
            return invalid(format!(
                "{} region thresholds need {} regions, got {}",
                self.region_thresholds.len(),
                self.region_thresholds.len() + 1,
                self.regions.len()
            ));
        }
        if self.region_thresholds.windows(2).any(|pair| pair[0] >= pair[1]) {
            return invalid("region thresholds must be strictly ascending".to_string());
        }
        if self.tiers.is_empty() {
            return invalid("at least one planet tier is required".to_string());
        }
        if self.tiers.len() > u8::MAX as usize {
            return invalid(format!("too many planet tiers ({})", self.tiers.len()));
        }
        for region in &self.regions {
            if matches!(region.kind, RegionKind::Blank | RegionKind::DarkSpace) {
                return invalid(format!("{:?} cannot be a generated region", region.kind));
            }
            if region.tier_thresholds.len() > self.tiers.len() {
                return invalid(format!(
                    "{:?} lists {} tier thresholds for {} tiers",
                    region.kind,
                    region.tier_thresholds.len(),
                    self.tiers.len()
                ));
            }
            if region.stat_buff <= 0.0 || region.defense_debuff <= 0.0 {
                return invalid(format!("{:?} multipliers must be positive", region.kind));
            }
        }
        for (index, tier) in self.tiers.iter().enumerate() {
            if tier.level as usize != index {
                return invalid(format!(
                    "tier at position {index} is numbered {}",
                    tier.level
                ));
            }
            if tier.capacity <= 0.0 || tier.refill_period <= 0.0 {
                return invalid(format!(
                    "tier {} needs positive capacity and refill period",
                    tier.level
                ));
            }
            if tier.default_energy < 0.0 || tier.default_energy > tier.capacity {
                return invalid(format!(
                    "tier {} default energy {} outside [0, {}]",
                    tier.level, tier.default_energy, tier.capacity
                ));
            }
        }
        Ok(())
    }

    pub fn region_config(&self, kind: RegionKind) -> Option<&RegionConfig> {
        self.regions.iter().find(|region| region.kind == kind)
    }

    pub fn tier(&self, level: u8) -> Option<&TierConfig> {
        self.tiers.get(level as usize)
    }

    pub fn is_valid_position(&self, x: i32, y: i32) -> bool {
        let (x, y, r) = (x as i64, y as i64, self.world_radius as i64);
        x * x + y * y < r * r
    }
}

/// Handle for accessing the world parameters from systems.
#[derive(Resource, Debug, Clone)]
pub struct WorldParametersHandle(pub Arc<WorldParameters>);

impl WorldParametersHandle {
    pub fn new(params: Arc<WorldParameters>) -> Self {
        Self(params)
    }

    pub fn get(&self) -> Arc<WorldParameters> {
        Arc::clone(&self.0)
    }
}

/// Load world parameters from `WORLD_PARAMETERS_PATH` or the crate data file,
/// falling back to the builtin copy.
pub fn load_world_parameters_from_env() -> (Arc<WorldParameters>, Option<PathBuf>) {
    let override_path = env::var(WORLD_PARAMETERS_ENV).ok().map(PathBuf::from);
    let path = override_path.unwrap_or_else(|| {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src/data/world_parameters.json")
    });

    match WorldParameters::from_file(&path) {
        Ok(params) => {
            tracing::info!(
                target: "frontier::config",
                path = %path.display(),
                "world_parameters.loaded=file"
            );
            return (Arc::new(params), Some(path));
        }
        Err(err) => {
            tracing::warn!(
                target: "frontier::config",
                path = %path.display(),
                error = %err,
                "world_parameters.load_failed"
            );
        }
    }

    let params = WorldParameters::builtin();
    tracing::info!(target: "frontier::config", "world_parameters.loaded=builtin");
    (params, None)
}
