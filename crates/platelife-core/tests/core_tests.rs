//! Tests for platelife-core: grids, transitions, addressing, config, errors

use platelife_core::*;

// ===========================================================================
// Grid
// ===========================================================================

#[test]
fn grid_filled_has_requested_shape() {
    let grid = Grid::filled(Dimensions::plate_96(), 0.0);
    assert_eq!(grid.rows(), 8);
    assert_eq!(grid.columns(), 12);
    assert_eq!(grid.iter().count(), 96);
}

#[test]
fn grid_from_rows_is_row_major() {
    let grid = Grid::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap();
    assert_eq!(grid.dims(), Dimensions::new(2, 3));
    assert_eq!(grid[(0, 2)], 3);
    assert_eq!(grid[(1, 0)], 4);
    assert_eq!(grid.row(1), &[4, 5, 6]);
    assert_eq!(grid.to_rows(), vec![vec![1, 2, 3], vec![4, 5, 6]]);
}

#[test]
fn grid_from_rows_rejects_ragged_input() {
    let err = Grid::from_rows(vec![vec![1, 2], vec![3]]).unwrap_err();
    assert!(matches!(err, Error::InvalidPattern(_)));
}

#[test]
fn grid_from_rows_rejects_empty_input() {
    let err = Grid::<u8>::from_rows(vec![]).unwrap_err();
    assert!(matches!(err, Error::InvalidPattern(_)));
}

#[test]
fn grid_get_out_of_bounds_is_none() {
    let grid = Grid::filled(Dimensions::new(2, 2), 'x');
    assert_eq!(grid.get(1, 1), Some(&'x'));
    assert_eq!(grid.get(2, 0), None);
    assert_eq!(grid.get(0, 2), None);
}

#[test]
fn grid_set_and_iter_positions() {
    let mut grid = Grid::filled(Dimensions::new(2, 3), 0);
    grid.set(1, 2, 7);
    let hits: Vec<_> = grid.iter().filter(|(_, &v)| v == 7).map(|(p, _)| p).collect();
    assert_eq!(hits, vec![(1, 2)]);
}

#[test]
fn grid_map_preserves_shape() {
    let grid = Grid::from_rows(vec![vec![0.1, 0.5], vec![0.9, 0.2]]).unwrap();
    let mapped = grid.map(|&v| v > 0.3);
    assert_eq!(mapped.dims(), grid.dims());
    assert_eq!(mapped.to_pattern(), ".#\n#.");
}

// ===========================================================================
// LifeState patterns
// ===========================================================================

#[test]
fn pattern_parse_and_print() {
    let state = LifeState::from_pattern(&[".#.", "..#", "###"]).unwrap();
    assert_eq!(state.alive(), 5);
    assert!(state[(0, 1)]);
    assert!(!state[(0, 0)]);
    assert_eq!(state.to_pattern(), ".#.\n..#\n###");
}

#[test]
fn pattern_trims_whitespace() {
    let state = LifeState::from_pattern(&["  #. ", " .# "]).unwrap();
    assert_eq!(state.dims(), Dimensions::new(2, 2));
}

#[test]
fn pattern_rejects_unknown_characters() {
    let err = LifeState::from_pattern(&["#o#"]).unwrap_err();
    assert!(err.to_string().contains("unexpected character"));
}

// ===========================================================================
// Transition
// ===========================================================================

#[test]
fn transition_between_generations() {
    assert_eq!(Transition::between(false, true), Transition::Fill);
    assert_eq!(Transition::between(true, false), Transition::Empty);
    assert_eq!(Transition::between(true, true), Transition::Keep);
    assert_eq!(Transition::between(false, false), Transition::Keep);
}

#[test]
fn transition_signum_matches_next_minus_current() {
    for current in [false, true] {
        for next in [false, true] {
            let expected = next as i8 - current as i8;
            assert_eq!(Transition::between(current, next).signum(), expected);
        }
    }
}

#[test]
fn transition_default_is_keep() {
    assert_eq!(Transition::default(), Transition::Keep);
}

// ===========================================================================
// Channel / WellId
// ===========================================================================

#[test]
fn well_id_is_column_major_over_rows() {
    assert_eq!(WellId::at(0, 0, 8).index(), 0);
    assert_eq!(WellId::at(7, 0, 8).index(), 7);
    assert_eq!(WellId::at(0, 1, 8).index(), 8);
    assert_eq!(WellId::at(3, 11, 8).index(), 91);
}

#[test]
fn well_id_inverse() {
    let well = WellId::at(5, 9, 8);
    assert_eq!(well.row(8), 5);
    assert_eq!(well.column(8), 9);
}

#[test]
fn well_id_label() {
    assert_eq!(WellId::at(0, 0, 8).label(8), "A1");
    assert_eq!(WellId::at(7, 11, 8).label(8), "H12");
}

#[test]
fn channel_follows_row() {
    let ch = Channel::for_row(3);
    assert_eq!(ch.index(), 3);
    assert_eq!(ch.to_string(), "ch3");
}

// ===========================================================================
// RunConfig
// ===========================================================================

#[test]
fn config_defaults() {
    let config = RunConfig::default();
    assert_eq!(config.dims(), Dimensions::new(8, 12));
    assert_eq!(config.life.threshold, 0.3);
    assert_eq!(config.life.max_cycles, 100);
    assert_eq!(config.transfer.alive_volume, 100.0);
    assert_eq!(config.transfer.tip_column, 11);
    assert_eq!(config.reader.wavelength_nm, 580.0);
    assert_eq!(config.reader.load.get, GripDirection::Front);
    assert_eq!(config.reader.load.put, GripDirection::Left);
    assert_eq!(config.reader.unload.get, GripDirection::Left);
    assert_eq!(config.reader.unload.put, GripDirection::Front);
    assert!(config.validate().is_ok());
}

#[test]
fn config_toml_roundtrip() {
    let config = RunConfig::default();
    let text = config.to_toml();
    assert!(text.contains("[life]"));
    let back: RunConfig = toml::from_str(&text).unwrap();
    assert_eq!(back, config);
}

#[test]
fn config_partial_toml_keeps_defaults() {
    let config: RunConfig = toml::from_str("[life]\nmax_cycles = 5\n").unwrap();
    assert_eq!(config.life.max_cycles, 5);
    assert_eq!(config.life.threshold, 0.3);
    assert_eq!(config.plate.columns, 12);
}

#[test]
fn config_load_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, RunConfig::default());
}

#[test]
fn config_load_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.toml");
    std::fs::write(&path, "[transfer]\nalive_volume = 50.0\n[plate]\ncolumns = 6\n").unwrap();
    let config = RunConfig::load(&path).unwrap();
    assert_eq!(config.transfer.alive_volume, 50.0);
    assert_eq!(config.dims(), Dimensions::new(8, 6));
}

#[test]
fn config_load_malformed_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[life\nthreshold = ").unwrap();
    assert!(matches!(RunConfig::load(&path), Err(Error::Toml(_))));
}

#[test]
fn config_validate_rejects_too_many_rows() {
    let mut config = RunConfig::default();
    config.plate.rows = 9;
    assert!(matches!(config.validate(), Err(Error::Config(_))));
}

#[test]
fn config_validate_rejects_bad_volumes() {
    let mut config = RunConfig::default();
    config.transfer.alive_volume = 0.0;
    assert!(config.validate().is_err());

    let mut config = RunConfig::default();
    config.transfer.tip_capacity = 50.0;
    assert!(config.validate().is_err());
}

#[test]
fn config_validate_rejects_tip_column_outside_rack() {
    let mut config = RunConfig::default();
    config.transfer.tip_column = 12;
    assert!(config.validate().is_err());
}

// ===========================================================================
// Error
// ===========================================================================

#[test]
fn error_display() {
    let e = Error::shape_mismatch(Dimensions::new(8, 12), Dimensions::new(8, 6));
    assert_eq!(e.to_string(), "shape mismatch: expected 8x12, got 8x6");

    let e = Error::hardware("aspirate", "tip clogged");
    assert_eq!(e.to_string(), "hardware error: aspirate - tip clogged");
    assert!(e.is_hardware());

    let e = Error::config("bad");
    assert!(!e.is_hardware());
}
