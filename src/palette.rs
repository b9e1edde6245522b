// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Colors for the two output images.
//!
//! The attractor image gets one flat color per root.  The convergence
//! image is a gray ramp indexed by how many Newton steps a pixel took,
//! scaled so that the slowest pixel is close to white.  *Which* pixel
//! counts as the slowest is the interesting part: the classic renderer
//! only looks at the first row, because that is the only row it has in
//! hand when it starts writing.  That under-estimates the maximum
//! whenever a later row converges more slowly, and those pixels then
//! point past the end of the ramp.  `ConvergenceScale::FirstRow` keeps
//! that behavior (clipping the runaway indices to white and counting
//! them); `ConvergenceScale::IterationCeiling` scales by the hard
//! iteration limit instead, which is always in range and still lets
//! rows be written as they arrive.

use crate::newton::{DIVERGED, MAX_ITERATIONS};
use crate::progress::RowResult;
use image::Rgb;
use std::str::FromStr;

/// Color for each attractor id.  Index 0 is never produced by the
/// oracle; `DIVERGED` is black.
pub const ATTRACTOR_COLORS: [Rgb<u8>; DIVERGED as usize + 1] = [
    Rgb([0, 0, 0]),
    Rgb([230, 25, 75]),
    Rgb([60, 180, 75]),
    Rgb([0, 130, 200]),
    Rgb([255, 225, 25]),
    Rgb([145, 30, 180]),
    Rgb([70, 240, 240]),
    Rgb([245, 130, 48]),
    Rgb([240, 50, 230]),
    Rgb([170, 110, 40]),
    Rgb([0, 0, 0]),
];

/// Highest index into the convergence ramp.
pub const RAMP_TOP: u32 = MAX_ITERATIONS as u32;

/// Color for attractor id `attractor`.
pub fn attractor_color(attractor: u8) -> Rgb<u8> {
    ATTRACTOR_COLORS
        .get(usize::from(attractor))
        .cloned()
        .unwrap_or(ATTRACTOR_COLORS[DIVERGED as usize])
}

/// Gray level for ramp position `index`, 0 (black) through
/// `RAMP_TOP` (white).
pub fn convergence_color(index: u32) -> Rgb<u8> {
    let level = (index.min(RAMP_TOP) * 255 / RAMP_TOP) as u8;
    Rgb([level, level, level])
}

/// How iteration counts are stretched over the convergence ramp.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConvergenceScale {
    /// Scale by the largest count in row 0, as the classic renderer
    /// does.  Later rows may run off the end of the ramp; those pixels
    /// are clipped to white.
    FirstRow,
    /// Scale by `MAX_ITERATIONS`, which no count can exceed.
    IterationCeiling,
}

impl Default for ConvergenceScale {
    fn default() -> Self {
        ConvergenceScale::FirstRow
    }
}

impl FromStr for ConvergenceScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first-row" => Ok(ConvergenceScale::FirstRow),
            "ceiling" => Ok(ConvergenceScale::IterationCeiling),
            _ => Err(format!("unknown convergence scale '{}'", s)),
        }
    }
}

/// Turns iteration counts into ramp positions, row by row.  Rows must
/// be observed in image order.
#[derive(Debug)]
pub struct Normalizer {
    scale: ConvergenceScale,
    step: u32,
    clipped: usize,
}

impl Normalizer {
    /// A normalizer that has not seen any rows yet.
    pub fn new(scale: ConvergenceScale) -> Normalizer {
        Normalizer {
            scale,
            step: 1,
            clipped: 0,
        }
    }

    /// Looks at a row before its pixels are colored.  Under
    /// `FirstRow`, row 0 fixes the step for the whole image.
    pub fn observe(&mut self, row: &RowResult) {
        if self.scale == ConvergenceScale::FirstRow && row.index() == 0 {
            // A top row that converged instantly everywhere would
            // divide by zero; treat it as a maximum of one step.
            let max = row.iterations().iter().cloned().max().unwrap_or(0).max(1);
            self.step = RAMP_TOP / u32::from(max);
        }
    }

    /// Ramp position for a pixel that took `iterations` steps.
    pub fn index(&mut self, iterations: u8) -> u32 {
        let index = self.step * u32::from(iterations);
        if index > RAMP_TOP {
            self.clipped += 1;
            RAMP_TOP
        } else {
            index
        }
    }

    /// Pixels so far whose position ran past the end of the ramp.
    pub fn clipped(&self) -> usize {
        self.clipped
    }

    /// The scale in use.
    pub fn scale(&self) -> ConvergenceScale {
        self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(index: usize, iterations: &[u8]) -> RowResult {
        let mut row = RowResult::with_capacity(index, iterations.len());
        for &i in iterations {
            row.push(1, i);
        }
        row
    }

    #[test]
    fn attractor_colors_are_distinct_for_real_roots() {
        for a in 1..=9u8 {
            for b in (a + 1)..=9 {
                assert_ne!(attractor_color(a), attractor_color(b));
            }
        }
        assert_eq!(attractor_color(DIVERGED), Rgb([0, 0, 0]));
        assert_eq!(attractor_color(200), Rgb([0, 0, 0]));
    }

    #[test]
    fn ramp_runs_black_to_white() {
        assert_eq!(convergence_color(0), Rgb([0, 0, 0]));
        assert_eq!(convergence_color(RAMP_TOP), Rgb([255, 255, 255]));
        assert_eq!(convergence_color(RAMP_TOP + 40), Rgb([255, 255, 255]));
    }

    #[test]
    fn scale_parses_from_the_command_line_names() {
        assert_eq!(
            "first-row".parse::<ConvergenceScale>(),
            Ok(ConvergenceScale::FirstRow)
        );
        assert_eq!(
            "ceiling".parse::<ConvergenceScale>(),
            Ok(ConvergenceScale::IterationCeiling)
        );
        assert!("global".parse::<ConvergenceScale>().is_err());
        assert_eq!(ConvergenceScale::default(), ConvergenceScale::FirstRow);
    }

    // Compatibility behavior: row 0 peaks at 12 steps, so the step is
    // 128 / 12 = 10, and a later pixel at 13 steps lands on 130.
    #[test]
    fn first_row_scale_clips_later_rows_that_run_longer() {
        let mut n = Normalizer::new(ConvergenceScale::FirstRow);
        n.observe(&row(0, &[3, 12, 7]));
        assert_eq!(n.index(12), 120);
        assert_eq!(n.index(3), 30);
        n.observe(&row(1, &[13, 40]));
        assert_eq!(n.index(13), RAMP_TOP);
        assert_eq!(n.index(40), RAMP_TOP);
        assert_eq!(n.clipped(), 2);
    }

    #[test]
    fn first_row_scale_survives_an_all_zero_top_row() {
        let mut n = Normalizer::new(ConvergenceScale::FirstRow);
        n.observe(&row(0, &[0, 0]));
        assert_eq!(n.index(0), 0);
        assert_eq!(n.index(1), RAMP_TOP);
        assert_eq!(n.index(2), RAMP_TOP);
        assert_eq!(n.clipped(), 1);
    }

    // Corrected behavior: the same rows stay inside the ramp.
    #[test]
    fn ceiling_scale_never_clips() {
        let mut n = Normalizer::new(ConvergenceScale::IterationCeiling);
        n.observe(&row(0, &[3, 12, 7]));
        n.observe(&row(1, &[13, 40]));
        assert_eq!(n.index(13), 13);
        assert_eq!(n.index(MAX_ITERATIONS), RAMP_TOP);
        assert_eq!(n.clipped(), 0);
        assert_eq!(n.scale(), ConvergenceScale::IterationCeiling);
    }
}
