// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Newton's method on `z^d - 1`.
//!
//! Every point of the complex plane, fed repeatedly through Newton's
//! method for the polynomial `z^d - 1`, either wanders off or falls
//! into one of the `d` roots of unity.  Which root it falls into is
//! the point's *attractor*; how many steps it took to get close is its
//! *convergence*.  Coloring each pixel by attractor gives the familiar
//! Newton fractal, with its braided borders between the basins.
//!
//! The iteration here is a pure function of the starting point and the
//! degree, so any number of render threads may share one `Newton`
//! without locking.

use crate::errors::NewtonError;
use num::Complex;

/// Maximum number of Newton steps taken for a single point.
pub const MAX_ITERATIONS: u8 = 128;

/// Attractor id reported for points that never settled on a root.
pub const DIVERGED: u8 = 10;

// A point this far out is never coming back.
const UPPER_BOUND: f64 = 10_000_000_000.0;

// Too close to the origin, where the derivative vanishes.
const LOWER_BOUND_SQUARED: f64 = 0.000_001;

// Squared distance at which a point counts as having reached a root.
const CONVERGED_SQUARED: f64 = 0.000_001;

/// The roots of `z^d - 1` for d in 1..=9.  The position of a root in
/// its row is its attractor id minus one, so the order matters: it
/// decides which color each basin gets.
const ROOTS: [&[(f64, f64)]; 9] = [
    &[(1.0, 0.0)],
    &[(1.0, 0.0), (-1.0, 0.0)],
    &[(1.0, 0.0), (-0.5, 0.86603), (-0.5, -0.86603)],
    &[(1.0, 0.0), (-1.0, 0.0), (0.0, 1.0), (0.0, -1.0)],
    &[
        (1.0, 0.0),
        (0.30902, 0.95106),
        (0.30902, -0.95106),
        (-0.80902, 0.58779),
        (-0.80902, -0.58779),
    ],
    &[
        (1.0, 0.0),
        (-1.0, 0.0),
        (0.5, 0.86603),
        (-0.5, -0.86603),
        (-0.5, 0.86603),
        (0.5, -0.86603),
    ],
    &[
        (1.0, 0.0),
        (-0.90097, -0.43388),
        (-0.90097, 0.43388),
        (-0.22252, -0.97493),
        (-0.22252, 0.97493),
        (0.62349, -0.78183),
        (0.62349, 0.78183),
    ],
    &[
        (1.0, 0.0),
        (-1.0, 0.0),
        (0.0, 1.0),
        (0.0, -1.0),
        (0.70711, 0.70711),
        (-0.70711, -0.70711),
        (-0.70711, 0.70711),
        (0.70711, -0.70711),
    ],
    &[
        (1.0, 0.0),
        (-0.93969, -0.34202),
        (-0.93969, 0.34202),
        (0.76604, 0.64279),
        (0.76604, -0.64279),
        (-0.5, -0.86603),
        (-0.5, 0.86603),
        (0.17365, 0.98481),
        (0.17365, -0.98481),
    ],
];

/// The degree of the polynomial being solved.  Only 1 through 9 have
/// a root table, so that is all this type will hold.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Degree(u8);

impl Degree {
    /// Validates a raw degree.
    pub fn new(degree: u32) -> Result<Degree, NewtonError> {
        if (1..=ROOTS.len() as u32).contains(&degree) {
            Ok(Degree(degree as u8))
        } else {
            Err(NewtonError::BadDegree(degree))
        }
    }

    /// The degree as a plain number.
    pub fn get(self) -> u8 {
        self.0
    }

    /// The roots of `z^d - 1`, in attractor-id order.
    pub fn roots(self) -> Vec<Complex<f64>> {
        ROOTS[usize::from(self.0) - 1]
            .iter()
            .map(|&(re, im)| Complex::new(re, im))
            .collect()
    }
}

/// What the oracle says about one starting point.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    /// 1-based index of the root reached, or `DIVERGED`.
    pub attractor: u8,
    /// Newton steps taken before the verdict, 0..=`MAX_ITERATIONS`.
    pub iterations: u8,
}

/// Anything that can classify a point of the plane.  Render threads
/// call this concurrently and without coordination, so implementations
/// must not carry mutable state.
pub trait Oracle: Sync {
    /// Classify `point`.
    fn sample(&self, point: Complex<f64>) -> Sample;
}

/// The Newton iteration for a fixed degree.
#[derive(Clone, Debug)]
pub struct Newton {
    degree: Degree,
    roots: Vec<Complex<f64>>,
}

impl Newton {
    /// Builds the oracle for `degree`, loading its root table.
    pub fn new(degree: Degree) -> Newton {
        Newton {
            degree,
            roots: degree.roots(),
        }
    }

    /// The degree this oracle solves for.
    pub fn degree(&self) -> Degree {
        self.degree
    }

    /// One Newton step for `z^d - 1`: `z - (z^d - 1) / (d z^(d-1))`.
    #[inline]
    pub fn step(&self, z: Complex<f64>) -> Complex<f64> {
        let d = usize::from(self.degree.get());
        let lower = num::pow(z, d - 1);
        let numerator = lower * z - Complex::new(1.0, 0.0);
        let denominator = lower * Complex::new(d as f64, 0.0);
        z - numerator / denominator
    }

    fn root_near(&self, z: Complex<f64>) -> Option<u8> {
        self.roots
            .iter()
            .position(|&root| (z - root).norm_sqr() < CONVERGED_SQUARED)
            .map(|k| k as u8 + 1)
    }
}

impl Oracle for Newton {
    fn sample(&self, point: Complex<f64>) -> Sample {
        let mut z = point;
        let mut iterations = 0;
        loop {
            if iterations == MAX_ITERATIONS
                || z.re.abs() > UPPER_BOUND
                || z.im.abs() > UPPER_BOUND
                || z.norm_sqr() < LOWER_BOUND_SQUARED
            {
                return Sample {
                    attractor: DIVERGED,
                    iterations,
                };
            }
            if let Some(attractor) = self.root_near(z) {
                return Sample {
                    attractor,
                    iterations,
                };
            }
            z = self.step(z);
            iterations += 1;
        }
    }
}
