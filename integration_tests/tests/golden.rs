mod common;

use frontier_core::{
    field_from_i64, Coordinate, LocationHash, NoiseField, PermutationHash, RegionKind,
    UniverseMapper,
};

use common::{fixture_params, PLANETS};

fn hex(hasher: &mut PermutationHash, values: &[i64]) -> String {
    LocationHash::from_field(&hasher.digest_i64(values)).to_string()
}

#[test]
fn permutation_hash_matches_reference_digests() {
    let mut hasher = PermutationHash::new("seed", 110).unwrap();
    assert_eq!(
        hex(&mut hasher, &[0, 0]),
        "29a1ce46748dd1f268a52b64670d2dd170487b0eabfdf8e3280c52996af03561"
    );
    assert_eq!(
        hex(&mut hasher, &[1, 2]),
        "07f751d627280b8f73ebe288d68acd77dc2fd6962debda017df192e355065814"
    );
    assert_eq!(
        hex(&mut hasher, &[1, 2, 3]),
        "03868717a65a6849e28d9cf6fcc2340e9e00b8dee902ed252d8f4e986e2b8864"
    );
    assert_eq!(
        hex(&mut hasher, &[1764, -3132]),
        "05a680674f3282acc48ec33d6d335960765fa394730a1133e4e99cecdae0031f"
    );

    let mut short = PermutationHash::new("seed", 4).unwrap();
    assert_eq!(
        hex(&mut short, &[1, 2]),
        "2c25fcee4ede1c1444952a03c515b2a0fb1ddbfbaa5497df9390af9b7595d711"
    );
}

#[test]
fn digest_does_not_depend_on_previous_calls() {
    let mut fresh = PermutationHash::new("seed", 110).unwrap();
    let expected = fresh.digest(&[field_from_i64(7), field_from_i64(-9)]);

    let mut used = PermutationHash::new("seed", 110).unwrap();
    used.digest_i64(&[99, 0]);
    used.write(&[field_from_i64(5)]);
    used.reset();
    assert_eq!(used.digest_i64(&[7, -9]), expected);
    assert_eq!(
        LocationHash::from_field(&expected).to_string(),
        "1562a32059fd64f0373d3819d2869f772a9bf95cbafcc8eb14f4bbbda03db71f"
    );
}

#[test]
fn noise_field_matches_reference_values() {
    let params = fixture_params();
    let mut noise = NoiseField::new(&params).unwrap();
    let expected = [
        ((0, 0), 16),
        ((1, 2), 17),
        ((-3, 5), 17),
        ((7, -9), 15),
        ((13, 13), 12),
        ((-50, -60), 16),
        ((99, 0), 17),
    ];
    for ((x, y), value) in expected {
        assert_eq!(
            noise.quantized_value_at(Coordinate::new(x, y)),
            value,
            "noise at ({x}, {y})"
        );
    }
}

#[test]
fn location_hashes_match_reference_values() {
    let mut mapper = UniverseMapper::new(fixture_params()).unwrap();
    let expected = [
        ((-3, 5), "0b0867e442ffe86731146340acd9bdb7f4186cbb8e7743d2268ef7cf495e7482"),
        ((13, 13), "27951b701b83e6e58a9a7b11c2991f83ee32b50c2d764f2d4fa3427ac8bd0b6b"),
        ((-50, -60), "2c8138c6b6cb940ce1610c9b56978d9fc1307e2b38671e9b6ad12d61e251047b"),
        ((99, 0), "20c3d2f32af0d55ef5bdb723a3e2f16910af3b1e2f3bd0f923a48505462c5585"),
        ((10, 10), "26a9ac0723d9d3dfa655afe402becc418ff686c4b5d789fe4e42edd5c099298f"),
    ];
    for ((x, y), hash) in expected {
        assert_eq!(mapper.location_hash(Coordinate::new(x, y)).to_string(), hash);
    }
}

#[test]
fn origin_is_empty_safe_space() {
    let mut mapper = UniverseMapper::new(fixture_params()).unwrap();
    let mapped = mapper.try_map(Coordinate::ORIGIN);
    assert_eq!(
        mapped.location_hash.to_string(),
        "29a1ce46748dd1f268a52b64670d2dd170487b0eabfdf8e3280c52996af03561"
    );
    assert_eq!(mapped.noise, 16);
    assert_eq!(mapped.region, RegionKind::SafeSpace);
    assert!(mapped.planet.is_none());
}

#[test]
fn known_planets_map_with_reference_tiers() {
    let mut mapper = UniverseMapper::new(fixture_params()).unwrap();
    for fixture in PLANETS {
        let mapped = mapper.try_map(fixture.position);
        assert_eq!(mapped.location_hash.to_string(), fixture.hash);
        assert_eq!(mapped.noise, fixture.noise, "noise at {}", fixture.position);
        assert_eq!(mapped.region, fixture.region, "region at {}", fixture.position);

        let planet = mapped
            .planet
            .unwrap_or_else(|| panic!("planet expected at {}", fixture.position));
        assert_eq!(planet.tier(), fixture.tier, "tier at {}", fixture.position);
        assert_eq!(planet.position(), fixture.position);
        assert_eq!(planet.id(), mapped.location_hash);
        assert_eq!(planet.region(), fixture.region);
    }
}
