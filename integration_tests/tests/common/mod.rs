#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use frontier_core::{Coordinate, RegionKind, WorldParameters};

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("fixture_world.json")
}

/// Seeds "seed" for both hashers, 110 rounds each, scale 4, radius 100.
pub fn fixture_params() -> Arc<WorldParameters> {
    let path = fixture_path();
    let params = WorldParameters::from_file(&path)
        .unwrap_or_else(|err| panic!("fixture world at {}: {err}", path.display()));
    Arc::new(params)
}

pub struct PlanetFixture {
    pub position: Coordinate,
    pub hash: &'static str,
    pub noise: i32,
    pub region: RegionKind,
    pub tier: u8,
}

const fn planet(
    x: i32,
    y: i32,
    hash: &'static str,
    noise: i32,
    region: RegionKind,
    tier: u8,
) -> PlanetFixture {
    PlanetFixture {
        position: Coordinate { x, y },
        hash,
        noise,
        region,
        tier,
    }
}

pub const PLANETS: &[PlanetFixture] = &[
    planet(-2, -12, "25004346c885a40208002bbc296e444bfa085a681a19de500adb376d20cb6dc8", 13, RegionKind::Nebula, 0),
    planet(-45, 18, "2b0010d83d68ca6f4e7b478438c99999748bea6527696f1f5f2e80b331f76668", 17, RegionKind::DeepSpace, 5),
    planet(8, 23, "280010ac59743fcd3f81c001e545582af93e3eb757063d38d6c50e591dcc9f93", 15, RegionKind::SafeSpace, 3),
    planet(75, 0, "1b00019e77a9026a35a593ec04c5771cf1240288bf9b8c6c970f356a76a80686", 12, RegionKind::Nebula, 1),
    planet(-41, -42, "28000491937b82c03aaf8bffdc14fda2230a528eb2289439ee1a6bc6600ab150", 14, RegionKind::Nebula, 1),
    planet(84, 23, "00001cefe76f33b57bbe15eb0d47b6c3db3e2c8242fd9547ee4b3eaebed882a9", 15, RegionKind::SafeSpace, 4),
    planet(1, -14, "11003e0cb57a1f762eee99ee41f6cd6c15874b2859252fe43bfd9c87cfb65d82", 14, RegionKind::Nebula, 0),
    planet(-3, 48, "210028dddad81326550a06268685d50e9f53541578d78da7f12cc3f81f1cb577", 15, RegionKind::SafeSpace, 4),
    planet(42, 79, "0d0030da65b00b32248d37f019732a7861296924f35a91f03d847f3764c04897", 18, RegionKind::DeepSpace, 5),
    planet(-71, 47, "01002c3f83a6bd6584c29ce331bea555a52674b78158c69da1c9d21315544fa5", 19, RegionKind::DeepSpace, 3),
];
