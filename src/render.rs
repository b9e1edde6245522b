// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The renderers.  `render` runs one thread per worker plus a writer
//! thread; `render_serial` does the same work on the calling thread
//! and is the reference the threaded output must match.

use crate::config::Config;
use crate::errors::NewtonError;
use crate::newton::Oracle;
use crate::planes::Grid;
use crate::ppm::RowSink;
use crate::progress::{ProgressTracker, RowResult};
use log::{debug, info};
use num::Complex;

/// What a finished render reports back.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderSummary {
    /// Rows delivered to the sink.
    pub rows: usize,
    /// Worker threads used.
    pub threads: usize,
}

/// Classifies every point of one row.
pub fn compute_row<O: Oracle>(index: usize, points: &[Complex<f64>], oracle: &O) -> RowResult {
    let mut row = RowResult::with_capacity(index, points.len());
    for point in points {
        let sample = oracle.sample(*point);
        row.push(sample.attractor, sample.iterations);
    }
    row
}

/// The body of worker `worker`: computes rows `worker`,
/// `worker + W`, ... in order and publishes each as soon as it is
/// done.  Never waits on anything but the brief publish lock.
pub fn compute_rows<O: Oracle>(
    worker: usize,
    grid: &Grid,
    oracle: &O,
    tracker: &ProgressTracker,
) -> Result<usize, NewtonError> {
    // Any exit before `complete` abandons the run.
    let lease = tracker.lease();
    let mut computed = 0;
    for index in (worker..tracker.rows()).step_by(tracker.workers()) {
        let row = compute_row(index, grid.row(index), oracle);
        tracker.publish(worker, row)?;
        computed += 1;
    }
    lease.complete();
    Ok(computed)
}

/// The body of the writer: takes rows off the tracker strictly in
/// order, hands each to the sink and drops it.  Returns the number of
/// rows written, which on success is every row of the image.
pub fn flush_rows<S: RowSink>(tracker: &ProgressTracker, sink: &mut S) -> Result<usize, NewtonError> {
    let mut cursor = 0;
    while cursor < tracker.rows() {
        let ready = tracker.wait_ready(cursor)?;
        debug!("flushing rows {}..{}", cursor, cursor + ready.len());
        for row in ready {
            debug_assert_eq!(row.index(), cursor);
            sink.write_row(&row)?;
            cursor += 1;
        }
    }
    sink.finish()?;
    Ok(cursor)
}

/// Runs the workers and the writer against an existing grid and
/// tracker.  Returns once every thread has been joined.
pub fn run_pipeline<O, S>(
    grid: &Grid,
    tracker: &ProgressTracker,
    oracle: &O,
    sink: &mut S,
) -> Result<usize, NewtonError>
where
    O: Oracle,
    S: RowSink + Send,
{
    crossbeam::scope(|scope| -> Result<usize, NewtonError> {
        let mut workers = Vec::with_capacity(tracker.workers());
        for worker in 0..tracker.workers() {
            let name = format!("newton-worker-{}", worker);
            let handle = scope
                .builder()
                .name(name.clone())
                .spawn(move |_| compute_rows(worker, grid, oracle, tracker))
                .map_err(|cause| NewtonError::ThreadSpawn { name, cause })?;
            workers.push(handle);
        }

        let name = "newton-writer".to_string();
        let writer = scope
            .builder()
            .name(name.clone())
            .spawn(move |_| flush_rows(tracker, sink))
            .map_err(|cause| NewtonError::ThreadSpawn { name, cause })?;

        // The writer only returns once every worker has published its
        // last row or given up, so the joins below never block for long.
        // A worker's own error outranks the writer's `Abandoned`.
        let written = writer.join().map_err(|_| NewtonError::WorkerPanicked)?;
        for handle in workers {
            handle.join().map_err(|_| NewtonError::WorkerPanicked)??;
        }
        written
    })
    .map_err(|_| NewtonError::WorkerPanicked)?
}

/// Renders the image described by `config` with `config.threads()`
/// workers, delivering rows to `sink` top to bottom.
pub fn render<O, S>(config: &Config, oracle: &O, sink: &mut S) -> Result<RenderSummary, NewtonError>
where
    O: Oracle,
    S: RowSink + Send,
{
    info!(
        "rendering {0}x{0} for degree {1} with {2} threads",
        config.size(),
        config.degree().get(),
        config.threads()
    );
    let grid = Grid::new(config);
    let tracker = ProgressTracker::new(config.size(), config.threads());
    let rows = run_pipeline(&grid, &tracker, oracle, sink)?;
    info!("wrote {} rows", rows);
    Ok(RenderSummary {
        rows,
        threads: config.threads(),
    })
}

/// Renders on the calling thread, ignoring `config.threads()`.
pub fn render_serial<O, S>(
    config: &Config,
    oracle: &O,
    sink: &mut S,
) -> Result<RenderSummary, NewtonError>
where
    O: Oracle,
    S: RowSink,
{
    let grid = Grid::new(config);
    for index in 0..grid.size() {
        sink.write_row(&compute_row(index, grid.row(index), oracle))?;
    }
    sink.finish()?;
    Ok(RenderSummary {
        rows: grid.size(),
        threads: 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newton::{Degree, Newton, Sample, DIVERGED};
    use std::thread;
    use std::time::Duration;

    fn newton(degree: u32) -> Newton {
        Newton::new(Degree::new(degree).unwrap())
    }

    // Makes every point of the top row slow, so the worker that owns
    // row 0 falls behind everyone else.
    struct SlowTopRow(Newton);

    impl Oracle for SlowTopRow {
        fn sample(&self, point: Complex<f64>) -> Sample {
            if point.im == -2.0 {
                thread::sleep(Duration::from_millis(15));
            }
            self.0.sample(point)
        }
    }

    struct Panicky;

    impl Oracle for Panicky {
        fn sample(&self, point: Complex<f64>) -> Sample {
            if point.im > 0.0 {
                panic!("no samples above the real axis");
            }
            Sample {
                attractor: 1,
                iterations: 0,
            }
        }
    }

    // Checks each row against the tracker as it is written.
    struct FrontierCheck<'a> {
        tracker: &'a ProgressTracker,
        seen: Vec<usize>,
    }

    impl<'a> RowSink for FrontierCheck<'a> {
        fn write_row(&mut self, row: &RowResult) -> Result<(), NewtonError> {
            assert!(row.index() < self.tracker.frontier());
            self.seen.push(row.index());
            Ok(())
        }
    }

    #[test]
    fn single_pixel_image_holds_the_corner_sample() {
        let config = Config::new(1, 1, 3).unwrap();
        let oracle = newton(3);
        let mut rows: Vec<RowResult> = Vec::new();
        let summary = render(&config, &oracle, &mut rows).unwrap();
        assert_eq!(summary, RenderSummary { rows: 1, threads: 1 });
        assert_eq!(rows.len(), 1);
        let expected = oracle.sample(Complex::new(-2.0, -2.0));
        assert_eq!(rows[0].attractors(), &[expected.attractor]);
        assert_eq!(rows[0].iterations(), &[expected.iterations]);
    }

    #[test]
    fn slow_first_worker_does_not_let_row_one_jump_ahead() {
        let config = Config::new(4, 2, 2).unwrap();
        let oracle = SlowTopRow(newton(2));
        let mut rows: Vec<RowResult> = Vec::new();
        render(&config, &oracle, &mut rows).unwrap();
        let order: Vec<usize> = rows.iter().map(RowResult::index).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
        for row in &rows {
            assert_eq!(row.len(), 4);
            assert!(row
                .attractors()
                .iter()
                .all(|&a| a == 1 || a == 2 || a == DIVERGED));
        }
    }

    #[test]
    fn rows_are_only_written_below_the_frontier() {
        let config = Config::new(9, 3, 5).unwrap();
        let grid = Grid::new(&config);
        let tracker = ProgressTracker::new(config.size(), config.threads());
        let oracle = SlowTopRow(newton(5));
        let mut sink = FrontierCheck {
            tracker: &tracker,
            seen: Vec::new(),
        };
        let written = run_pipeline(&grid, &tracker, &oracle, &mut sink).unwrap();
        assert_eq!(written, 9);
        assert_eq!(sink.seen, (0..9).collect::<Vec<_>>());
        assert_eq!(tracker.pending(), 0);
        assert_eq!(tracker.frontier(), 9);
    }

    #[test]
    fn threaded_matches_serial() {
        let oracle = newton(4);
        let mut serial: Vec<RowResult> = Vec::new();
        render_serial(&Config::new(6, 1, 4).unwrap(), &oracle, &mut serial).unwrap();
        for threads in 1..=6 {
            let mut threaded: Vec<RowResult> = Vec::new();
            render(&Config::new(6, threads, 4).unwrap(), &oracle, &mut threaded).unwrap();
            assert_eq!(threaded, serial, "{} threads", threads);
        }
    }

    #[test]
    fn worker_panic_is_reported_instead_of_hanging() {
        let config = Config::new(4, 2, 2).unwrap();
        let mut rows: Vec<RowResult> = Vec::new();
        match render(&config, &Panicky, &mut rows) {
            Err(NewtonError::WorkerPanicked) => {}
            other => panic!("unexpected {:?}", other),
        }
        // Row 3 is the one that blew up, so at most the rows above it
        // made it out, and still in order.
        assert!(rows.iter().map(RowResult::index).eq(0..rows.len()));
        assert!(rows.len() <= 3);
    }

    #[test]
    fn worker_error_is_reported_instead_of_hanging() {
        let config = Config::new(4, 2, 2).unwrap();
        let grid = Grid::new(&config);
        let tracker = ProgressTracker::new(4, 2);
        let oracle = newton(2);
        // Row 1 is already in the table, so worker 1 is refused on its
        // first publish and stops.
        tracker
            .publish(1, compute_row(1, grid.row(1), &oracle))
            .unwrap();
        let mut rows: Vec<RowResult> = Vec::new();
        match run_pipeline(&grid, &tracker, &oracle, &mut rows) {
            Err(NewtonError::OutOfTurn { worker: 1, row: 1 }) => {}
            other => panic!("unexpected {:?}", other),
        }
        // Row 3 never arrives, so whatever the writer got out stops
        // short of it, in order.
        assert!(rows.iter().map(RowResult::index).eq(0..rows.len()));
        assert!(rows.len() <= 3);
    }

    #[test]
    fn writer_alone_reports_abandoned() {
        let config = Config::new(3, 3, 2).unwrap();
        let grid = Grid::new(&config);
        let tracker = ProgressTracker::new(3, 3);
        let oracle = newton(2);
        compute_rows(0, &grid, &oracle, &tracker).unwrap();
        drop(tracker.lease());
        let mut rows: Vec<RowResult> = Vec::new();
        match flush_rows(&tracker, &mut rows) {
            Err(NewtonError::Abandoned) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn compute_rows_walks_its_stride() {
        let config = Config::new(5, 2, 2).unwrap();
        let grid = Grid::new(&config);
        let tracker = ProgressTracker::new(5, 2);
        let oracle = newton(2);
        assert_eq!(compute_rows(1, &grid, &oracle, &tracker).unwrap(), 2);
        assert_eq!(tracker.pending(), 2);
        assert_eq!(tracker.frontier(), 0);
        assert_eq!(compute_rows(0, &grid, &oracle, &tracker).unwrap(), 3);
        assert_eq!(tracker.frontier(), 5);
    }
}
