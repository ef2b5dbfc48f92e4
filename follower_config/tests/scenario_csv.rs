use std::fs::File;
use std::io::Write;

use follower_config::load_scenario_csv;
use rstest::rstest;
use tempfile::tempdir;

#[rstest]
fn loads_rows_in_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("track.csv");

    let mut f = File::create(&path).unwrap();
    writeln!(f, "ir1,ir2,ir3,ir4,ir5,bump,proximity_cm").unwrap();
    writeln!(f, "100,200,900,200,100,0,250.0").unwrap();
    writeln!(f, "0,0,0,0,0,1,10.5").unwrap();

    let rows = load_scenario_csv(&path).expect("valid scenario");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].ir(), [100, 200, 900, 200, 100]);
    assert_eq!(rows[0].bump, 0);
    assert_eq!(rows[1].bump, 1);
    assert!((rows[1].proximity_cm - 10.5).abs() < f32::EPSILON);
}

#[rstest]
fn csv_with_wrong_headers_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad_headers.csv");

    let mut f = File::create(&path).unwrap();
    writeln!(f, "a,b,c,d,e,bump,proximity_cm").unwrap();
    writeln!(f, "1,2,3,4,5,0,100.0").unwrap();

    let err = load_scenario_csv(&path).expect_err("should error on bad headers");
    assert!(format!("{err}").contains("headers 'ir1,ir2,ir3,ir4,ir5,bump,proximity_cm'"));
}

#[rstest]
fn csv_with_non_numeric_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad_numeric.csv");

    let mut f = File::create(&path).unwrap();
    writeln!(f, "ir1,ir2,ir3,ir4,ir5,bump,proximity_cm").unwrap();
    writeln!(f, "abc,2,3,4,5,0,100.0").unwrap();

    let err = load_scenario_csv(&path).expect_err("should error on non-numeric");
    assert!(format!("{err}").contains("invalid CSV row"));
}

#[rstest]
fn empty_csv_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.csv");

    let mut f = File::create(&path).unwrap();
    writeln!(f, "ir1,ir2,ir3,ir4,ir5,bump,proximity_cm").unwrap();

    let err = load_scenario_csv(&path).expect_err("should error on no data rows");
    assert!(format!("{err}").contains("no data rows"));
}
