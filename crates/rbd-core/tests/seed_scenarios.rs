//! End-to-end coverage of the eight public operations against real process
//! boundaries: env-var config overrides, shape validation, and the
//! documented seed scenarios, exercised through the published API only.

use rbd_core::{
    bridge_generic, bridge_identical, koon_generic, koon_identical, parallel_generic,
    parallel_identical, series_generic, series_identical, EngineConfig, EngineError,
};

#[test]
fn seed_scenarios_match_documented_values() {
    let config = EngineConfig::default();

    let mut out = [0.0];
    series_identical(&[0.9], 3, 1, &mut out, &config).unwrap();
    assert!((out[0] - 0.729).abs() < 1e-9);

    let mut out = [0.0];
    parallel_identical(&[0.5], 3, 1, &mut out, &config).unwrap();
    assert!((out[0] - 0.875).abs() < 1e-9);

    let mut out = [0.0];
    koon_identical(&[0.9], 3, 2, 1, &mut out, &config).unwrap();
    assert!((out[0] - 0.972).abs() < 1e-9);

    let mut out = [0.0];
    bridge_identical(&[0.9], 1, &mut out, &config).unwrap();
    assert!((out[0] - 0.97848).abs() < 1e-9);

    let mut out = [0.0; 2];
    series_generic(&[1.0, 0.5, 1.0, 0.5], 2, 2, &mut out, &config).unwrap();
    assert_eq!(out, [1.0, 0.25]);

    let mut out = [0.0];
    koon_generic(&vec![0.9; 5], 5, 3, 1, &mut out, &config).unwrap();
    assert!((out[0] - 0.99144).abs() < 1e-9);
}

#[test]
fn bridge_closed_form_matches_the_textbook_formula() {
    let config = EngineConfig::default();
    let samples = [
        (0.9, 0.8, 0.95, 0.7, 0.6),
        (1.0, 1.0, 1.0, 1.0, 1.0),
        (0.0, 0.5, 0.5, 0.5, 0.5),
        (0.3, 0.9, 0.2, 0.6, 0.4),
    ];

    for (r1, r2, r3, r4, r5) in samples {
        let rel = [r1, r2, r3, r4, r5];
        let mut out = [0.0];
        bridge_generic(&rel, 1, &mut out, &config).unwrap();

        let (f1, f2, f3, f4, f5) = (1.0 - r1, 1.0 - r2, 1.0 - r3, 1.0 - r4, 1.0 - r5);
        let expected = r5 * (1.0 - f1 * f3) * (1.0 - f2 * f4) + f5 * (1.0 - (1.0 - r1 * r2) * (1.0 - r3 * r4));

        assert!((out[0] - expected).abs() < 8.0 * f64::EPSILON, "{out:?} vs {expected}");
    }
}

#[test]
fn koon_edge_cases_delegate_as_documented() {
    let config = EngineConfig::default();
    let n = 6;
    let t = 5;
    let rel: Vec<f64> = (0..n * t).map(|i| 0.2 + (i as f64 % 11.0) * 0.06).collect();

    let mut koon_k1 = vec![0.0; t];
    koon_generic(&rel, n, 1, t, &mut koon_k1, &config).unwrap();
    let mut parallel_out = vec![0.0; t];
    parallel_generic(&rel, n, t, &mut parallel_out, &config).unwrap();
    assert_eq!(koon_k1, parallel_out);

    let mut koon_kn = vec![0.0; t];
    koon_generic(&rel, n, n, t, &mut koon_kn, &config).unwrap();
    let mut series_out = vec![0.0; t];
    series_generic(&rel, n, t, &mut series_out, &config).unwrap();
    assert_eq!(koon_kn, series_out);

    let mut koon_k0 = vec![0.0; t];
    koon_generic(&rel, n, 0, t, &mut koon_k0, &config).unwrap();
    assert_eq!(koon_k0, vec![1.0; t]);

    let mut koon_over = vec![0.0; t];
    koon_generic(&rel, n, n + 1, t, &mut koon_over, &config).unwrap();
    assert_eq!(koon_over, vec![0.0; t]);
}

#[test]
fn mismatched_shapes_are_reported_not_panicked() {
    let config = EngineConfig::default();

    let mut out = [0.0; 3];
    let err = series_generic(&[0.5, 0.5], 2, 3, &mut out, &config).unwrap_err();
    assert!(matches!(err, EngineError::InvalidShape { .. }));

    let mut out = [0.0; 3];
    let err = bridge_generic(&[0.5; 4], 1, &mut out, &config).unwrap_err();
    assert!(matches!(err, EngineError::InvalidShape { .. }));

    let mut out = [0.0; 2];
    let err = series_identical(&[0.5, 0.5, 0.5], 2, 2, &mut out, &config).unwrap_err();
    assert!(matches!(err, EngineError::InvalidShape { .. }));
}

#[test]
fn forced_scalar_tier_env_override_is_bit_identical_to_default() {
    let n = 4;
    let t = 300;
    let rel: Vec<f64> = (0..n * t).map(|i| 0.2 + (i as f64 % 17.0) * 0.04).collect();

    let mut default_out = vec![0.0; t];
    series_generic(&rel, n, t, &mut default_out, &EngineConfig::default()).unwrap();

    std::env::set_var("RBD_FORCE_SIMD_TIER", "scalar");
    let forced_config = EngineConfig::from_env();
    std::env::remove_var("RBD_FORCE_SIMD_TIER");

    let mut forced_out = vec![0.0; t];
    series_generic(&rel, n, t, &mut forced_out, &forced_config).unwrap();

    assert_eq!(default_out, forced_out);
}

#[test]
fn max_threads_env_override_is_parsed_from_process_environment() {
    std::env::set_var("RBD_MAX_THREADS", "1");
    let config = EngineConfig::from_env();
    std::env::remove_var("RBD_MAX_THREADS");
    assert_eq!(config.max_threads(), Some(1));

    let n = 2;
    let t = 1_000_000;
    let rel: Vec<f64> = std::iter::repeat(0.8).take(n * t).collect();
    let mut out = vec![0.0; t];
    series_generic(&rel, n, t, &mut out, &config).unwrap();
    assert!((out[0] - 0.64).abs() < 1e-9);
}

#[test]
fn outputs_never_escape_zero_one_even_with_invalid_inputs() {
    let config = EngineConfig::default();
    let rel = [f64::NAN, 1.5, -0.3, 0.5, 2.0, f64::NAN];
    let mut out = [0.0; 6];
    parallel_identical(&rel, 4, 6, &mut out, &config).unwrap();
    for v in out {
        assert!((0.0..=1.0).contains(&v));
    }
}
