mod util;

use geo::{LineString, Polygon};
use mesh_regrid::prelude::*;
use util::{grid, rect, temp_path};

#[test]
fn disjoint_squares_produce_no_records() {
    let source = grid(3, 3, 0.0, 0.0, 1.0, 1.0);
    let target = grid(3, 3, 10.0, 10.0, 1.0, 1.0);
    let run = compute_mapping(&source, &target, &RegridConfig::default()).unwrap();
    assert!(run.mapping.is_empty());
    assert!(run.diagnostics.is_clean());
    assert!(apply_mapping(&run.mapping, &[1.0; 9]).is_empty());

    let direct = regrid_direct(&source, &[1.0; 9], &target, &RegridConfig::default()).unwrap();
    assert_eq!(direct.values, vec![0.0; 9]);
}

#[test]
fn nested_target_in_both_modes() {
    let source = Mesh::from_rects([rect(0.0, 0.0, 2.0, 2.0)]);
    let target = Mesh::from_rects([rect(0.5, 0.5, 1.0, 1.0)]);

    let mean = regrid_direct(&source, &[8.0], &target, &RegridConfig::default()).unwrap();
    assert!((mean.values[0] - 8.0).abs() < 1e-9);

    let sum_cfg = RegridConfig::default().with_mode(AggregationMode::Sum);
    let run = compute_mapping(&source, &target, &sum_cfg).unwrap();
    let fraction = run.mapping.get(0, 0).unwrap();
    assert!((fraction - 0.0625).abs() < 1e-9);
    assert!((apply_mapping(&run.mapping, &[8.0])[0] - 0.5).abs() < 1e-9);
}

#[test]
fn degenerate_source_cell_is_isolated() {
    let sliver = Polygon::new(
        LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, 0.0)]),
        vec![],
    );
    let source: Mesh = [
        Cell::new(rect(0.0, 0.0, 1.0, 1.0).to_polygon()),
        Cell::new(sliver),
        Cell::new(rect(1.0, 0.0, 2.0, 1.0).to_polygon()),
    ]
    .into_iter()
    .collect();
    let target = Mesh::from_rects([rect(0.0, 0.0, 2.0, 1.0)]);
    let cfg = RegridConfig::default().with_mode(AggregationMode::Sum);

    let run = compute_mapping(&source, &target, &cfg).unwrap();
    assert_eq!(run.mapping.len(), 2);
    assert_eq!(run.mapping.get(1, 0), None);
    assert_eq!(run.diagnostics.defects.len(), 1);
    let defect = &run.diagnostics.defects[0];
    assert_eq!((defect.side, defect.index), (MeshSide::Source, 1));

    // the defective cell keeps its slot in the value vector
    let direct = regrid_direct(&source, &[1.0, 1000.0, 2.0], &target, &cfg).unwrap();
    assert!((direct.values[0] - 3.0).abs() < 1e-9);
}

#[test]
fn degenerate_target_cell_stays_zero() {
    let source = grid(2, 2, 0.0, 0.0, 1.0, 1.0);
    let target = Mesh::from_rects([rect(0.0, 0.0, 1.0, 1.0), rect(0.5, 0.5, 0.5, 1.5)]);
    let run = regrid_direct(&source, &[1.0, 2.0, 3.0, 4.0], &target, &RegridConfig::default())
        .unwrap();
    assert_eq!(run.values.len(), 2);
    assert!((run.values[0] - 1.0).abs() < 1e-9);
    assert_eq!(run.values[1], 0.0);
    assert_eq!(run.diagnostics.defects.len(), 1);
    assert_eq!(run.diagnostics.defects[0].side, MeshSide::Target);
}

#[test]
fn overlapping_sources_are_reported_over_unity() {
    // two identical sources stacked on one target: mean fractions sum to 2
    let source = Mesh::from_rects([rect(0.0, 0.0, 1.0, 1.0), rect(0.0, 0.0, 1.0, 1.0)]);
    let target = Mesh::from_rects([rect(0.0, 0.0, 1.0, 1.0)]);
    let run = compute_mapping(&source, &target, &RegridConfig::default()).unwrap();
    assert_eq!(run.mapping.len(), 2);
    assert_eq!(run.diagnostics.over_unity_sums.len(), 1);
    assert_eq!(run.diagnostics.over_unity_sums[0].0, 0);
    assert!(run.diagnostics.out_of_range.is_empty());
}

#[test]
fn fraction_above_one_is_reported_not_clamped() {
    // self-crossing ring: lobes of 16/3 and 4/3 wound oppositely, shoelace area 4,
    // while the clipped overlap covers both lobes
    let bowtie = Polygon::new(
        LineString::from(vec![(0.0, 0.0), (4.0, 4.0), (4.0, 0.0), (0.0, 2.0), (0.0, 0.0)]),
        vec![],
    );
    let source = Mesh::from_rects([rect(-1.0, -1.0, 5.0, 5.0)]);
    let target: Mesh = [Cell::new(bowtie)].into_iter().collect();
    let cfg = RegridConfig::default();

    let run = compute_mapping(&source, &target, &cfg).unwrap();
    assert_eq!(run.mapping.len(), 1);
    let fraction = run.mapping.get(0, 0).unwrap();
    assert!(fraction > 1.0 + cfg.fraction_tolerance, "{fraction}");
    assert_eq!(run.diagnostics.out_of_range, run.mapping.records().to_vec());
    assert_eq!(run.diagnostics.over_unity_sums, vec![(0, fraction)]);

    let direct = regrid_direct(&source, &[2.0], &target, &cfg).unwrap();
    assert_eq!(direct.values, vec![2.0 * fraction]);
    assert_eq!(direct.diagnostics, run.diagnostics);
}

#[test]
fn empty_meshes() {
    let empty = Mesh::default();
    let some = grid(2, 1, 0.0, 0.0, 1.0, 1.0);
    let cfg = RegridConfig::default();
    assert!(compute_mapping(&empty, &some, &cfg).unwrap().mapping.is_empty());
    assert!(compute_mapping(&some, &empty, &cfg).unwrap().mapping.is_empty());
    assert_eq!(
        regrid_direct(&empty, &[], &some, &cfg).unwrap().values,
        vec![0.0, 0.0]
    );
}

#[test]
fn gridded_source_onto_polygons() {
    let lons: Vec<f64> = (0..4).map(|i| i as f64 + 0.5).collect();
    let lats: Vec<f64> = (0..2).map(|j| 41.0 - j as f64).collect();
    let source = rectilinear_grid(&lons, &lats).unwrap();
    assert_eq!(source.len(), 8);
    // west and east halves
    let target = Mesh::from_rects([rect(0.0, 39.5, 2.0, 41.5), rect(2.0, 39.5, 4.0, 41.5)]);
    let values = [1.0, 1.0, 5.0, 5.0, 1.0, 1.0, 5.0, 5.0];
    let cfg = RegridConfig::default().with_mode(AggregationMode::Sum);
    let run = regrid_direct(&source, &values, &target, &cfg).unwrap();
    assert!((run.values[0] - 4.0).abs() < 1e-6);
    assert!((run.values[1] - 20.0).abs() < 1e-6);
}

#[test]
fn config_file_drives_the_run() {
    let path = temp_path("config.json");
    std::fs::write(&path, r#"{ "mode": "sum", "max_concurrency": 2 }"#).unwrap();
    let cfg = RegridConfig::from_json_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(cfg.mode, AggregationMode::Sum);
    assert_eq!(cfg.max_concurrency, 2);

    let source = grid(2, 2, 0.0, 0.0, 1.0, 1.0);
    let target = Mesh::from_rects([rect(0.0, 0.0, 2.0, 2.0)]);
    let run = regrid_direct(&source, &[1.0, 2.0, 3.0, 4.0], &target, &cfg).unwrap();
    assert!((run.values[0] - 10.0).abs() < 1e-6);
}

#[test]
fn cancellation_aborts_without_partial_output() {
    let source = grid(4, 4, 0.0, 0.0, 1.0, 1.0);
    let token = CancelToken::new();
    token.cancel();
    let regridder: Regridder<'_> = Regridder::new(&source, &source, RegridConfig::default())
        .unwrap()
        .with_cancel_token(token);
    assert_eq!(regridder.regrid(&[0.0; 16]), Err(MeshRegridError::Cancelled));
}
