//! Persisted-schema migration round trips.

use filmic_core::{FilmicParams, FilmicParamsV1, NormMethod};

fn sample_v1() -> FilmicParamsV1 {
    FilmicParamsV1 {
        grey_point_source: 11.33,
        black_point_source: -9.125,
        white_point_source: 3.875,
        security_factor: 15.0,
        grey_point_target: 18.45,
        black_point_target: 0.25,
        white_point_target: 98.5,
        output_power: 4.97,
        latitude: 37.5,
        contrast: 1.42,
        saturation: -12.0,
        balance: 8.0,
        preserve_color: NormMethod::Luminance,
    }
}

#[test]
fn migrated_record_reserializes_shared_fields_bit_exact() {
    let old = sample_v1();
    let serialized_old = serde_json::to_string(&old).unwrap();

    let new = FilmicParams::from_v1(&old);

    // project the shared subset back into a v1 record
    let downgraded = FilmicParamsV1 {
        grey_point_source: new.grey_point_source,
        black_point_source: new.black_point_source,
        white_point_source: new.white_point_source,
        security_factor: new.security_factor,
        grey_point_target: new.grey_point_target,
        black_point_target: new.black_point_target,
        white_point_target: new.white_point_target,
        output_power: new.output_power,
        latitude: new.latitude,
        contrast: new.contrast,
        saturation: new.saturation,
        balance: new.balance,
        preserve_color: new.preserve_color,
    };
    let serialized_roundtrip = serde_json::to_string(&downgraded).unwrap();

    assert_eq!(serialized_old, serialized_roundtrip);
}

#[test]
fn current_schema_roundtrips_through_serde() {
    let params = FilmicParams {
        high_quality_reconstruction: true,
        reconstruct_threshold: -1.5,
        ..FilmicParams::default()
    };
    let json = serde_json::to_string(&params).unwrap();
    let back: FilmicParams = serde_json::from_str(&json).unwrap();
    assert_eq!(params, back);
}
