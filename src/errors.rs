// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The one error type shared by the renderer, the row pipeline and
//! the output sinks.

use failure::Fail;
use std::io;

/// Everything that can go wrong between reading the configuration
/// and closing the last output file.
#[derive(Debug, Fail)]
pub enum NewtonError {
    /// The image has no rows.
    #[fail(display = "image size must be at least 1 row")]
    EmptyImage,

    /// There are no workers to compute rows.
    #[fail(display = "at least one worker thread is required")]
    NoWorkers,

    /// More workers than rows: some worker would own no row at all.
    #[fail(
        display = "you can't have more threads ({}) than the number of rows in the picture ({})",
        threads, rows
    )]
    TooManyThreads {
        /// Requested worker count.
        threads: usize,
        /// Image height in rows.
        rows: usize,
    },

    /// Only polynomials of degree 1 through 9 have a root table.
    #[fail(display = "polynomial degree must be between 1 and 9, got {}", _0)]
    BadDegree(u32),

    /// The operating system refused to start a thread.
    #[fail(display = "failed to create thread {}: {}", name, cause)]
    ThreadSpawn {
        /// Name the thread would have had.
        name: String,
        /// Underlying failure.
        #[cause]
        cause: io::Error,
    },

    /// A worker or the writer died before the image was complete.
    #[fail(display = "a render thread panicked before the image was complete")]
    WorkerPanicked,

    /// A worker stopped early, so the rows it owed will never arrive.
    #[fail(display = "a worker stopped before publishing all of its rows")]
    Abandoned,

    /// The frontier passed a row that is not in the table.
    #[fail(display = "row {} is below the frontier but missing from the table", _0)]
    MissingRow(usize),

    /// A row reached the progress table from the wrong worker, twice,
    /// or ahead of that worker's stride.
    #[fail(display = "worker {} published row {} out of turn", worker, row)]
    OutOfTurn {
        /// Worker that attempted the publish.
        worker: usize,
        /// Row index it tried to publish.
        row: usize,
    },

    /// Writing an output stream failed.
    #[fail(display = "output error: {}", _0)]
    Io(#[cause] io::Error),
}

impl NewtonError {
    /// True for errors detected before any thread starts.
    pub fn is_configuration(&self) -> bool {
        match self {
            NewtonError::EmptyImage
            | NewtonError::NoWorkers
            | NewtonError::TooManyThreads { .. }
            | NewtonError::BadDegree(_) => true,
            _ => false,
        }
    }
}

impl From<io::Error> for NewtonError {
    fn from(err: io::Error) -> Self {
        NewtonError::Io(err)
    }
}
