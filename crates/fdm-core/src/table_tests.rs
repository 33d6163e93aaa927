use super::{TableBuilder, TableError};

fn approx(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "{a} !~= {b}");
}

#[test]
fn rank1_clamp_and_interpolate() {
    let table = TableBuilder::new("table")
        .build_rank1(vec![0.0, 10.0, 20.0, 30.0], vec![0.0, 0.20, 0.30, 0.35])
        .unwrap();

    approx(table.get_value_at(Some(-5.0), None, None), 0.0);
    approx(table.get_value_at(Some(0.0), None, None), 0.0);
    approx(table.get_value_at(Some(5.0), None, None), 0.10);
    approx(table.get_value_at(Some(15.0), None, None), 0.25);
    approx(table.get_value_at(Some(30.0), None, None), 0.35);
    approx(table.get_value_at(Some(50.0), None, None), 0.35);
}

#[test]
fn rank1_exact_breakpoints_reproduce_values() {
    let keys = vec![-1.0, 0.0, 2.5, 9.0];
    let values = vec![3.0, 1.0, -2.0, 7.0];
    let table = TableBuilder::new("table")
        .build_rank1(keys.clone(), values.clone())
        .unwrap();

    for (k, v) in keys.iter().zip(values.iter()) {
        approx(table.get_value_at(Some(*k), None, None), *v);
    }
}

#[test]
fn rank1_rejects_repeated_keys() {
    // Repeated adjacent keys would be a zero-span "plateau"; construction
    // enforces strictly increasing keys, so this is rejected here. The
    // zero-span branch inside locate() still exists to guard against
    // floating-point coincidence, not as a documented authoring feature.
    let err = TableBuilder::new("table")
        .build_rank1(vec![0.0, 0.0, 1.0], vec![1.0, 1.0, 2.0])
        .unwrap_err();
    assert!(matches!(err, TableError::NonMonotonic { axis: "row", .. }));
}

#[test]
fn rank1_rejects_non_monotonic_keys() {
    let err = TableBuilder::new("cl-alpha")
        .build_rank1(vec![0.0, 5.0, 3.0, 10.0], vec![0.0, 1.0, 2.0, 3.0])
        .unwrap_err();
    match err {
        TableError::NonMonotonic { axis, index, element } => {
            assert_eq!(axis, "row");
            assert_eq!(index, 2);
            assert_eq!(element, "cl-alpha");
        }
        other => panic!("expected NonMonotonic, got {other:?}"),
    }
}

#[test]
fn rank1_rejects_empty_data() {
    let err = TableBuilder::new("empty").build_rank1(vec![], vec![]).unwrap_err();
    assert!(matches!(err, TableError::EmptyData { .. }));
}

#[test]
fn rank2_bilinear_interpolation() {
    let table = TableBuilder::new("cl-beta")
        .build_rank2(
            vec![-0.0174533, 0.0],
            vec![0.0, 10.0],
            vec![
                vec![0.00201318, 0.0105059],
                vec![0.0051894, 0.0168137],
            ],
        )
        .unwrap();

    let v = table.get_value_at(Some(-0.00872665), Some(5.0), None);
    // Both axis factors land exactly on 0.5, so the result is the plain
    // average of all four corner values.
    approx(v, 0.0086305450);
}

#[test]
fn rank2_clamps_outside_both_axes() {
    let table = TableBuilder::new("cl-beta")
        .build_rank2(
            vec![0.0, 1.0],
            vec![0.0, 1.0],
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
        )
        .unwrap();

    approx(table.get_value_at(Some(-100.0), Some(-100.0), None), 1.0);
    approx(table.get_value_at(Some(100.0), Some(100.0), None), 4.0);
}

#[test]
fn rank2_rejects_column_count_mismatch() {
    let err = TableBuilder::new("bad")
        .build_rank2(vec![0.0, 1.0], vec![0.0, 1.0, 2.0], vec![vec![1.0, 2.0], vec![3.0, 4.0]])
        .unwrap_err();
    assert!(matches!(err, TableError::Malformed { .. }));
}

#[test]
fn rank3_blend_between_subtables() {
    let table = TableBuilder::new("cd-mach")
        .build_rank3(
            vec![-1.0, 0.0, 1.0],
            vec![
                (vec![0.0, 1.0], vec![0.0, 1.0], vec![vec![0.0, 0.0], vec![0.0, 0.0]]),
                (vec![0.0, 1.0], vec![0.0, 1.0], vec![vec![1.0, 2.0], vec![3.0, 4.0]]),
                (vec![0.0, 1.0], vec![0.0, 1.0], vec![vec![10.0, 20.0], vec![30.0, 40.0]]),
            ],
        )
        .unwrap();

    // tableKey = 0.5 sits midway between bp=0 and bp=1; row/col both at
    // their low breakpoint so each subtable lookup returns its [0][0] cell.
    let v = table.get_value_at(Some(0.0), Some(0.0), Some(0.5));
    approx(v, (1.0 + 10.0) / 2.0);
}

#[test]
fn rank3_clamps_to_boundary_subtable() {
    let table = TableBuilder::new("cd-mach")
        .build_rank3(
            vec![-1.0, 0.0, 1.0],
            vec![
                (vec![0.0, 1.0], vec![0.0, 1.0], vec![vec![0.0, 0.0], vec![0.0, 0.0]]),
                (vec![0.0, 1.0], vec![0.0, 1.0], vec![vec![1.0, 2.0], vec![3.0, 4.0]]),
                (vec![0.0, 1.0], vec![0.0, 1.0], vec![vec![10.0, 20.0], vec![30.0, 40.0]]),
            ],
        )
        .unwrap();

    approx(table.get_value_at(Some(0.0), Some(0.0), Some(-50.0)), 0.0);
    approx(table.get_value_at(Some(0.0), Some(0.0), Some(50.0)), 10.0);
}

#[test]
fn rank3_rejects_non_monotonic_breakpoints() {
    let err = TableBuilder::new("cd-mach")
        .build_rank3(
            vec![0.0, 0.0, 1.0],
            vec![
                (vec![0.0, 1.0], vec![0.0, 1.0], vec![vec![0.0, 0.0], vec![0.0, 0.0]]),
                (vec![0.0, 1.0], vec![0.0, 1.0], vec![vec![1.0, 2.0], vec![3.0, 4.0]]),
                (vec![0.0, 1.0], vec![0.0, 1.0], vec![vec![10.0, 20.0], vec![30.0, 40.0]]),
            ],
        )
        .unwrap_err();
    assert!(matches!(err, TableError::NonMonotonic { axis: "breakpoint", .. }));
}
