extern crate assert_cmd;
extern crate image;
extern crate predicates;
extern crate tempfile;

use assert_cmd::prelude::*;
use image::{GenericImageView, ImageFormat};
use predicates::prelude::*;
use std::fs;
use std::process::Command;

fn newton() -> Command {
    Command::cargo_bin("newton").unwrap()
}

#[test]
fn writes_both_images_into_the_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    newton()
        .args(&["-t2", "-l6", "-o"])
        .arg(dir.path())
        .arg("3")
        .assert()
        .success()
        .stderr(predicate::str::contains("Number of threads: 2"));

    for name in &["newton_attractors_x3.ppm", "newton_convergence_x3.ppm"] {
        let text = fs::read_to_string(dir.path().join(name)).unwrap();
        assert!(text.starts_with("P3\n6 6\n255\n"), "{}", name);
        let rows: Vec<&str> = text.lines().skip(3).collect();
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|row| row.len() == 6 * 12));
    }
}

#[test]
fn output_decodes_as_a_pixmap() {
    let dir = tempfile::tempdir().unwrap();
    newton()
        .args(&["--threads", "3", "--lines", "9", "--scale", "ceiling", "--output-dir"])
        .arg(dir.path())
        .arg("4")
        .assert()
        .success();

    let bytes = fs::read(dir.path().join("newton_attractors_x4.ppm")).unwrap();
    let img = image::load_from_memory_with_format(&bytes, ImageFormat::PNM).unwrap();
    assert_eq!(img.dimensions(), (9, 9));
}

#[test]
fn more_threads_than_rows_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    newton()
        .args(&["-t", "5", "-l", "4", "-o"])
        .arg(dir.path())
        .arg("2")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("more threads"));
    assert!(!dir.path().join("newton_attractors_x2.ppm").exists());
}

#[test]
fn degree_outside_the_root_table_is_refused() {
    newton().args(&["-l", "4", "12"]).assert().failure();
}

#[test]
fn degree_is_required() {
    newton().args(&["-l", "4"]).assert().failure();
}
