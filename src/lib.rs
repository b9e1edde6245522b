#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Newton fractal renderer
//!
//! Newton's method finds a root of a polynomial by starting somewhere
//! and repeatedly sliding down the tangent line.  For `z^d - 1` on the
//! complex plane there are `d` roots to slide towards, and which one a
//! starting point ends up at depends on where it started in a
//! wonderfully unstable way.  Coloring every starting point by the
//! root it reaches (its attractor), or by how long it took to get
//! there, produces the Newton fractal.
//!
//! Every pixel is independent, so rows are computed by a pool of
//! worker threads, each taking every `W`th row.  They finish in no
//! particular order, but the images are written as a stream, top row
//! first, by a single writer thread that only ever writes rows every
//! worker has certified complete.  See the `progress` module for how
//! that works.
//!
//! ```no_run
//! use newton::{render, Config, ConvergenceScale, Newton, PpmSink};
//! use std::path::Path;
//!
//! let config = Config::new(1000, 4, 5).unwrap();
//! let oracle = Newton::new(config.degree());
//! let mut sink = PpmSink::create(Path::new("."), &config, ConvergenceScale::default()).unwrap();
//! render(&config, &oracle, &mut sink).unwrap();
//! ```

extern crate crossbeam;
extern crate failure;
extern crate image;
extern crate itertools;
extern crate log;
extern crate num;

pub mod config;
pub mod errors;
pub mod newton;
pub mod palette;
pub mod planes;
pub mod ppm;
pub mod progress;
pub mod render;

pub use crate::config::Config;
pub use crate::errors::NewtonError;
pub use crate::newton::{Degree, Newton, Oracle, Sample, DIVERGED, MAX_ITERATIONS};
pub use crate::palette::ConvergenceScale;
pub use crate::planes::Grid;
pub use crate::ppm::{PpmSink, RowSink};
pub use crate::progress::{ProgressTracker, RowResult};
pub use crate::render::{render, render_serial, RenderSummary};
