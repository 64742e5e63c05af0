//! Procedural frontier universe core.
//!
//! Every coordinate's content is derived deterministically from shared seed
//! parameters: a MiMC permutation hash picks planets, hash-driven gradient
//! noise picks regions, and explored sectors accumulate in a sparse cache
//! backed by a region quadtree.

pub mod app;
pub mod budget;
pub mod cache;
pub mod config;
pub mod explorer;
pub mod hash;
pub mod history;
pub mod mapper;
pub mod noise;
pub mod planet;
pub mod quadtree;
pub mod sector;

pub use app::{
    authority_channel, build_explorer_app, run_frame, AuthorityFeed, AuthorityInbox,
    ExploreBudget, PlanetUpdateRejected, SectorChanged, SectorExplored,
};
pub use budget::StepBudget;
pub use cache::{AuthorityUpdate, SectorCache, SectorEvent, UpdateOutcome};
pub use config::{
    load_world_parameters_from_env, ConfigError, MirrorAxes, RegionConfig, TierConfig,
    WorldParameters, WorldParametersHandle,
};
pub use explorer::Explorer;
pub use hash::{field_from_i64, FieldElement, LocationHash, PermutationHash, Step, SumTask};
pub use history::{record_for, replay_history, ReplayReport};
pub use mapper::{map_batch, MappedSector, UniverseMapper};
pub use noise::{NoiseField, NOISE_MAX};
pub use planet::{EnergyTransfer, Planet, PlayerId};
pub use quadtree::{Aabb, QuadtreeNode, RegionQuadtree};
pub use sector::{Coordinate, PlanetRef, RegionKind, Sector};
