// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate env_logger;
extern crate log;
extern crate newton;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use log::info;
use newton::{render, Config, ConvergenceScale, Newton, NewtonError, PpmSink};
use std::path::Path;
use std::str::FromStr;

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const THREADS: &str = "threads";
const LINES: &str = "lines";
const OUTPUT: &str = "output";
const SCALE: &str = "scale";
const DEGREE: &str = "degree";

fn args<'a>() -> ArgMatches<'a> {
    App::new("newton")
        .version("0.1.0")
        .about("Newton fractal renderer")
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        1024,
                        "Could not parse thread count",
                        "Thread count must be between 1 and 1024",
                    )
                })
                .help("Number of worker threads (default: one per CPU, at most one per row)"),
        )
        .arg(
            Arg::with_name(LINES)
                .required(false)
                .long(LINES)
                .short("l")
                .takes_value(true)
                .default_value("1000")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        65_535,
                        "Could not parse image size",
                        "Image size must be between 1 and 65535",
                    )
                })
                .help("Rows and columns in the output images"),
        )
        .arg(
            Arg::with_name(OUTPUT)
                .required(false)
                .long("output-dir")
                .short("o")
                .takes_value(true)
                .default_value(".")
                .help("Directory the two images are written to"),
        )
        .arg(
            Arg::with_name(SCALE)
                .required(false)
                .long(SCALE)
                .takes_value(true)
                .possible_values(&["first-row", "ceiling"])
                .default_value("first-row")
                .help("Convergence palette scaling: from row 0, or from the iteration limit"),
        )
        .arg(
            Arg::with_name(DEGREE)
                .required(true)
                .index(1)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        9,
                        "Could not parse polynomial degree",
                        "Polynomial degree must be between 1 and 9",
                    )
                })
                .help("Degree d of the polynomial z^d - 1"),
        )
        .get_matches()
}

fn run(matches: &ArgMatches) -> Result<(), NewtonError> {
    // The validators above have already vetted every value.
    let lines = value_or(matches, LINES, 1000);
    let degree = value_or(matches, DEGREE, 1);
    let threads = value_or(matches, THREADS, num_cpus::get().min(lines));
    let scale = matches
        .value_of(SCALE)
        .and_then(|s| ConvergenceScale::from_str(s).ok())
        .unwrap_or_default();
    let output = Path::new(matches.value_of(OUTPUT).unwrap_or("."));

    let config = Config::new(lines, threads, degree)?;
    info!(
        "Number of threads: {}, number of rows and cols: {}, exponent of x^: {}",
        config.threads(),
        config.size(),
        config.degree().get()
    );

    let oracle = Newton::new(config.degree());
    let mut sink = PpmSink::create(output, &config, scale)?;
    render(&config, &oracle, &mut sink)?;
    Ok(())
}

fn value_or<T: FromStr>(matches: &ArgMatches, name: &str, default: T) -> T {
    matches
        .value_of(name)
        .and_then(|s| T::from_str(s).ok())
        .unwrap_or(default)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(if e.is_configuration() { 2 } else { 1 });
    }
}
