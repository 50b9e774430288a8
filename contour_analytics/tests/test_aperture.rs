use contour_analytics::{
    aperture::{
        Beam, ControlPoint, JawSource, LeafAxis, LeafBanks, ResolvedJaws, analyze_beam, aperture,
        complexity_score, plan_complexity,
    },
    assert_fuzzy_eq,
    config::MlcAnalyzerOptions,
    core::{math::Vector2, traits::FuzzyEq},
};

/// Ten 5 mm leaf pairs from y = -25 to y = 25.
fn boundaries() -> Vec<f64> {
    (0..=10).map(|i| -25.0 + 5.0 * f64::from(i)).collect()
}

fn control_point(weight: f64, bank_a: Vec<f64>, bank_b: Vec<f64>) -> ControlPoint {
    ControlPoint {
        cumulative_weight: weight,
        leaves: Some(LeafBanks { bank_a, bank_b }),
        ..ControlPoint::default()
    }
}

fn sliding_window_beam() -> Beam {
    let first = ControlPoint {
        jaw_x: Some((-30.0, 30.0)),
        jaw_y: Some((-25.0, 25.0)),
        gantry_angle: Some(0.0),
        ..control_point(0.0, vec![-20.0; 10], vec![-10.0; 10])
    };
    Beam {
        name: "Field 1".to_string(),
        monitor_units: 200.0,
        leaf_axis: LeafAxis::Mlcx,
        leaf_boundaries: boundaries(),
        control_points: vec![
            first,
            control_point(0.5, vec![-5.0; 10], vec![5.0; 10]),
            control_point(1.0, vec![10.0; 10], vec![20.0; 10]),
        ],
    }
}

#[test]
fn sliding_window_is_translation_invariant() {
    let metrics = analyze_beam(&sliding_window_beam(), &MlcAnalyzerOptions::default()).unwrap();
    assert_eq!(metrics.control_points.len(), 2);
    for cp in &metrics.control_points {
        // 10 x 50 mm window
        assert_fuzzy_eq!(cp.area, 5.0, 1e-6);
        assert_fuzzy_eq!(cp.x_perimeter, 2.0, 1e-6);
        assert_fuzzy_eq!(cp.y_perimeter, 10.0, 1e-6);
        assert_fuzzy_eq!(cp.mu, 100.0, 1e-9);
        assert_eq!(cp.jaws.x.source, if cp.index == 1 { JawSource::Explicit } else { JawSource::InheritedFromFirst });
        assert_eq!(cp.gantry_angle, Some(0.0));
    }
    // (20 + 100) * 100 / 500 per point, two points, over 200 MU
    assert_fuzzy_eq!(metrics.complexity, 0.24, 1e-6);
    let stats = metrics.statistics.unwrap();
    assert_fuzzy_eq!(stats.score.min, stats.score.max, 1e-6);
}

#[test]
fn interdigitated_leaves_make_separate_openings() {
    let point = ControlPoint {
        jaw_x: Some((-30.0, 30.0)),
        jaw_y: Some((-25.0, 25.0)),
        ..control_point(
            0.0,
            vec![-10.0, -10.0, 0.0, 0.0, 0.0, 0.0, 0.0, -10.0, -10.0, 0.0],
            vec![10.0, 10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 10.0, 10.0, 0.0],
        )
    };
    let jaws = ResolvedJaws::resolve(&point, &point, &MlcAnalyzerOptions::default());
    let region = aperture(&point, LeafAxis::Mlcx, &boundaries(), &jaws).unwrap();
    assert_eq!(region.components().len(), 2);
    assert_fuzzy_eq!(region.area(), 400.0, 1e-6);
    let paths = region.outer_path_lengths();
    assert_fuzzy_eq!(paths.x, 80.0, 1e-6);
    assert_fuzzy_eq!(paths.y, 40.0, 1e-6);
}

#[test]
fn zero_mu_scores_zero_and_score_is_linear() {
    let options = MlcAnalyzerOptions::default();
    for &path in &[10.0, 20.0, 40.0] {
        let paths = Vector2::new(path, path);
        assert_eq!(complexity_score(paths, 100.0, 0.0, &options), Some(0.0));
        let s = complexity_score(paths, 100.0, 5.0, &options).unwrap();
        assert_fuzzy_eq!(s, 2.0 * path * 5.0 / 100.0);
    }
}

#[test]
fn missing_jaws_use_max_field_size() {
    let beam = Beam {
        name: "No jaws".to_string(),
        monitor_units: 50.0,
        leaf_axis: LeafAxis::Mlcx,
        leaf_boundaries: Vec::new(),
        control_points: vec![
            ControlPoint::default(),
            ControlPoint {
                cumulative_weight: 1.0,
                ..ControlPoint::default()
            },
        ],
    };
    let options = MlcAnalyzerOptions {
        max_field_size_x: 100.0,
        max_field_size_y: 200.0,
        ..MlcAnalyzerOptions::default()
    };
    let metrics = analyze_beam(&beam, &options).unwrap();
    let cp = &metrics.control_points[0];
    assert_eq!(cp.jaws.x.source, JawSource::MaxFieldSize);
    assert_fuzzy_eq!(cp.jaws.x.min, -5.0);
    assert_fuzzy_eq!(cp.jaws.y.max, 10.0);
    assert_fuzzy_eq!(cp.area, 200.0, 1e-6);
}

#[test]
fn plan_complexity_over_beams() {
    let options = MlcAnalyzerOptions::default();
    let a = analyze_beam(&sliding_window_beam(), &options).unwrap();
    let mut beam = sliding_window_beam();
    beam.monitor_units = 600.0;
    let b = analyze_beam(&beam, &options).unwrap();
    // complexity does not depend on beam MU for the same delivery pattern
    assert_fuzzy_eq!(a.complexity, b.complexity, 1e-9);
    assert_fuzzy_eq!(plan_complexity([&a, &b]).unwrap(), a.complexity, 1e-9);
}
