// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Run parameters, validated once and then handed by reference to
//! everything that needs them.

use crate::errors::NewtonError;
use crate::newton::Degree;

/// The shape of one render: an image `size` pixels square, computed by
/// `threads` workers, for the polynomial `z^degree - 1`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Config {
    size: usize,
    threads: usize,
    degree: Degree,
}

impl Config {
    /// Checks the parameters before anything is allocated or spawned.
    /// Every worker must own at least one row, so there can be no more
    /// threads than rows.
    pub fn new(size: usize, threads: usize, degree: u32) -> Result<Config, NewtonError> {
        let degree = Degree::new(degree)?;
        if size == 0 {
            return Err(NewtonError::EmptyImage);
        }
        if threads == 0 {
            return Err(NewtonError::NoWorkers);
        }
        if threads > size {
            return Err(NewtonError::TooManyThreads {
                threads,
                rows: size,
            });
        }
        Ok(Config {
            size,
            threads,
            degree,
        })
    }

    /// Rows, and columns, in the image.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Degree of the polynomial.
    pub fn degree(&self) -> Degree {
        self.degree
    }
}
