// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The monitor between the row workers and the writer.
//!
//! Workers finish rows in whatever order the scheduler likes, but the
//! image has to be written top to bottom.  Each worker owns every
//! `W`th row starting at its own index, and always finishes its rows
//! in increasing order, so a single number per worker (the first row
//! it has not finished yet) describes everything it has done.  The
//! smallest of those numbers is the *frontier*: every row above it is
//! sitting in the table, ready to go.  Nothing below it can be
//! promised, because the worker holding the minimum may still be busy
//! with exactly that row.
//!
//! Finished rows move into the table under the lock, and move out of
//! it, to the writer, under the same lock.  Nobody else ever touches a
//! row in between, so the rows themselves need no locking.

use crate::errors::NewtonError;
use log::{debug, trace};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// One finished row of the image.
#[derive(Clone, Debug, PartialEq)]
pub struct RowResult {
    index: usize,
    attractors: Vec<u8>,
    iterations: Vec<u8>,
}

impl RowResult {
    /// An empty row with room for `width` pixels.
    pub fn with_capacity(index: usize, width: usize) -> RowResult {
        RowResult {
            index,
            attractors: Vec::with_capacity(width),
            iterations: Vec::with_capacity(width),
        }
    }

    /// Appends the next pixel.
    pub fn push(&mut self, attractor: u8, iterations: u8) {
        self.attractors.push(attractor);
        self.iterations.push(iterations);
    }

    /// Row index in the image.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Attractor id of each pixel, left to right.
    pub fn attractors(&self) -> &[u8] {
        &self.attractors
    }

    /// Newton steps taken by each pixel, left to right.
    pub fn iterations(&self) -> &[u8] {
        &self.iterations
    }

    /// Pixels in the row.
    pub fn len(&self) -> usize {
        self.attractors.len()
    }

    /// True for a row with no pixels.
    pub fn is_empty(&self) -> bool {
        self.attractors.is_empty()
    }
}

// Everything the lock protects.
#[derive(Debug)]
struct Ledger {
    // First row each worker has not yet finished.
    progress: Vec<usize>,
    // Finished rows the writer has not taken yet.
    slots: Vec<Option<RowResult>>,
    // Set when a worker died; the frontier will never move again.
    abandoned: bool,
}

impl Ledger {
    fn frontier(&self) -> usize {
        self.progress
            .iter()
            .cloned()
            .min()
            .unwrap_or(0)
            .min(self.slots.len())
    }
}

/// Shared state between the workers and the writer: one progress
/// counter per worker, and the table of finished rows.
#[derive(Debug)]
pub struct ProgressTracker {
    ledger: Mutex<Ledger>,
    changed: Condvar,
    rows: usize,
    workers: usize,
}

impl ProgressTracker {
    /// A tracker for an image of `rows` rows split among `workers`
    /// workers.  Worker `w` owns rows `w`, `w + workers`, ... and so
    /// starts out owing row `w`.
    pub fn new(rows: usize, workers: usize) -> ProgressTracker {
        ProgressTracker {
            ledger: Mutex::new(Ledger {
                progress: (0..workers).collect(),
                slots: (0..rows).map(|_| None).collect(),
                abandoned: false,
            }),
            changed: Condvar::new(),
            rows,
            workers,
        }
    }

    /// Rows in the image.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of workers, which is also each worker's stride.
    pub fn workers(&self) -> usize {
        self.workers
    }

    // Every change to the ledger is a single assignment, so a ledger
    // whose lock was poisoned is still consistent.
    fn lock(&self) -> MutexGuard<Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hands a finished row over to the table and advances `worker`'s
    /// counter past it.  The row must be the next one `worker` owes.
    pub fn publish(&self, worker: usize, row: RowResult) -> Result<(), NewtonError> {
        let index = row.index();
        {
            let mut ledger = self.lock();
            let in_turn = worker < self.workers
                && index < self.rows
                && ledger.progress[worker] == index
                && ledger.slots[index].is_none();
            if !in_turn {
                return Err(NewtonError::OutOfTurn { worker, row: index });
            }
            ledger.slots[index] = Some(row);
            ledger.progress[worker] = index + self.workers;
        }
        trace!("worker {} published row {}", worker, index);
        self.changed.notify_one();
        Ok(())
    }

    /// Row index below which every row has been finished.
    pub fn frontier(&self) -> usize {
        self.lock().frontier()
    }

    /// Takes rows `cursor..frontier` out of the table, in order,
    /// without waiting.  Empty if the frontier has not passed `cursor`.
    /// Fails with `MissingRow` if a row below the frontier was already
    /// taken.
    pub fn take_ready(&self, cursor: usize) -> Result<Vec<RowResult>, NewtonError> {
        let mut ledger = self.lock();
        Self::drain(&mut ledger, cursor)
    }

    /// Blocks until the frontier passes `cursor`, then takes rows
    /// `cursor..frontier` out of the table, in order.  Fails with
    /// `Abandoned` if a worker stopped early, since the frontier can
    /// then never move.
    pub fn wait_ready(&self, cursor: usize) -> Result<Vec<RowResult>, NewtonError> {
        let mut ledger = self.lock();
        loop {
            if ledger.frontier() > cursor {
                return Self::drain(&mut ledger, cursor);
            }
            if ledger.abandoned {
                return Err(NewtonError::Abandoned);
            }
            // Wakeups may be spurious; the frontier is rechecked above.
            ledger = self
                .changed
                .wait(ledger)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    // Every slot below the frontier holds a row until it is taken, so
    // an empty one means the cursor went backwards.
    fn drain(ledger: &mut Ledger, cursor: usize) -> Result<Vec<RowResult>, NewtonError> {
        let frontier = ledger.frontier();
        if frontier <= cursor {
            return Ok(Vec::new());
        }
        let slots = &mut ledger.slots[cursor..frontier];
        if let Some(gap) = slots.iter().position(Option::is_none) {
            return Err(NewtonError::MissingRow(cursor + gap));
        }
        Ok(slots.iter_mut().flat_map(Option::take).collect())
    }

    /// Rows sitting in the table, finished but not yet taken.
    pub fn pending(&self) -> usize {
        self.lock().slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Marks the run as failed and wakes the writer.
    pub fn abandon(&self) {
        self.lock().abandoned = true;
        self.changed.notify_all();
    }

    /// A guard for a worker thread.  Unless the worker calls
    /// [`WorkerLease::complete`] after publishing its last row, dropping
    /// the lease abandons the tracker, so the writer stops waiting for
    /// rows that will never come.  That covers both a panic and an
    /// early `?` return.
    pub fn lease(&self) -> WorkerLease {
        WorkerLease {
            tracker: self,
            completed: false,
        }
    }
}

/// See [`ProgressTracker::lease`].
#[derive(Debug)]
pub struct WorkerLease<'a> {
    tracker: &'a ProgressTracker,
    completed: bool,
}

impl<'a> WorkerLease<'a> {
    /// Releases the lease without abandoning the tracker.
    pub fn complete(mut self) {
        self.completed = true;
    }
}

impl<'a> Drop for WorkerLease<'a> {
    fn drop(&mut self) {
        if !self.completed {
            debug!("worker stopped early, abandoning the run");
            self.tracker.abandon();
        }
    }
}
