// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Where finished rows go.  The writer hands each row, in image order,
//! to a `RowSink`.  `PpmSink` streams two plain-text PPM images, one
//! colored by attractor and one by convergence speed, without ever
//! holding more than a single line of either.

use crate::config::Config;
use crate::errors::NewtonError;
use crate::newton::Degree;
use crate::palette::{attractor_color, convergence_color, ConvergenceScale, Normalizer};
use crate::progress::RowResult;
use image::Rgb;
use log::warn;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Receives rows strictly in order, top to bottom, each exactly once.
pub trait RowSink {
    /// Writes one row.  The row is dropped by the caller afterwards.
    fn write_row(&mut self, row: &RowResult) -> Result<(), NewtonError>;

    /// Called once after the last row.
    fn finish(&mut self) -> Result<(), NewtonError> {
        Ok(())
    }
}

/// Keeps a copy of every row, mostly for tests and for callers that
/// want the raw numbers.
impl RowSink for Vec<RowResult> {
    fn write_row(&mut self, row: &RowResult) -> Result<(), NewtonError> {
        self.push(row.clone());
        Ok(())
    }
}

/// File name of the attractor image for `degree`.
pub fn attractor_file_name(degree: Degree) -> String {
    format!("newton_attractors_x{}.ppm", degree.get())
}

/// File name of the convergence image for `degree`.
pub fn convergence_file_name(degree: Degree) -> String {
    format!("newton_convergence_x{}.ppm", degree.get())
}

fn write_header<W: Write>(out: &mut W, size: usize) -> Result<(), NewtonError> {
    write!(out, "P3\n{} {}\n255\n", size, size)?;
    Ok(())
}

// Every pixel is exactly twelve bytes: "rrr ggg bbb ".
fn push_pixel(line: &mut Vec<u8>, color: Rgb<u8>) -> Result<(), NewtonError> {
    let Rgb([r, g, b]) = color;
    write!(line, "{:03} {:03} {:03} ", r, g, b)?;
    Ok(())
}

/// Streams the attractor and convergence images as ASCII PPM.
#[derive(Debug)]
pub struct PpmSink<W: Write> {
    attractors: W,
    convergence: W,
    normalizer: Normalizer,
    size: usize,
    line: Vec<u8>,
}

impl<W: Write> PpmSink<W> {
    /// Writes both headers for a `size` x `size` image and returns a
    /// sink ready for row 0.
    pub fn new(
        mut attractors: W,
        mut convergence: W,
        size: usize,
        scale: ConvergenceScale,
    ) -> Result<PpmSink<W>, NewtonError> {
        write_header(&mut attractors, size)?;
        write_header(&mut convergence, size)?;
        Ok(PpmSink {
            attractors,
            convergence,
            normalizer: Normalizer::new(scale),
            size,
            line: Vec::with_capacity(size * 12 + 1),
        })
    }

    /// Convergence pixels that ran past the end of the ramp so far.
    pub fn clipped(&self) -> usize {
        self.normalizer.clipped()
    }

    /// Gives back the two streams: attractors first.
    pub fn into_inner(self) -> (W, W) {
        (self.attractors, self.convergence)
    }
}

impl PpmSink<BufWriter<File>> {
    /// Creates both image files for `config` in `dir`, replacing any
    /// that are already there.
    pub fn create(
        dir: &Path,
        config: &Config,
        scale: ConvergenceScale,
    ) -> Result<PpmSink<BufWriter<File>>, NewtonError> {
        let attractors = File::create(dir.join(attractor_file_name(config.degree())))?;
        let convergence = File::create(dir.join(convergence_file_name(config.degree())))?;
        PpmSink::new(
            BufWriter::new(attractors),
            BufWriter::new(convergence),
            config.size(),
            scale,
        )
    }
}

impl<W: Write> RowSink for PpmSink<W> {
    fn write_row(&mut self, row: &RowResult) -> Result<(), NewtonError> {
        debug_assert_eq!(row.len(), self.size);
        self.normalizer.observe(row);

        self.line.clear();
        for &attractor in row.attractors() {
            push_pixel(&mut self.line, attractor_color(attractor))?;
        }
        self.line.push(b'\n');
        self.attractors.write_all(&self.line)?;

        self.line.clear();
        for &iterations in row.iterations() {
            let index = self.normalizer.index(iterations);
            push_pixel(&mut self.line, convergence_color(index))?;
        }
        self.line.push(b'\n');
        self.convergence.write_all(&self.line)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), NewtonError> {
        self.attractors.flush()?;
        self.convergence.flush()?;
        if self.normalizer.clipped() > 0 {
            warn!(
                "{} convergence pixels ran past the palette scaled from row 0 and were clipped; \
                 use the ceiling scale to avoid this",
                self.normalizer.clipped()
            );
        }
        Ok(())
    }
}
