//! BoundaryIter: checkpoints for piecewise incremental transfer.
//!
//! `zfs send -I a b` covers any number of versions as long as `a` and `b`
//! live in the same dataset. Crossing to another backing dataset needs a
//! separate step, so for every run boundary we emit the last version of the
//! run (unless it is the checkpoint we are already standing on) and the first
//! version of the next run. The last version of the stream is always emitted.
//!
//! Пример: 1..3 -> fs1, 4 -> fs2, 5..6 -> fs3, 7..9 -> fs4, 10 -> fs5,
//! старт с 2: 3 4 5 6 7 9 10.

use std::collections::btree_map;
use std::ops::Bound::{Excluded, Unbounded};

use log::trace;

use super::{StreamVersion, Streamline};
use crate::error::{PlanError, PlanResult};
use crate::metrics::record_boundary_checkpoint;

/// Lazy, single-pass iterator over checkpoint versions after a start version.
/// Create a new one to scan again.
pub struct BoundaryIter<'a> {
    rest: btree_map::Range<'a, u64, StreamVersion>,
    /// Last checkpoint (initially the start version).
    boundary: u64,
    /// Last version seen and its backing dataset.
    prev: (u64, &'a str),
    /// Second half of a boundary pair.
    queued: Option<u64>,
    done: bool,
}

impl<'a> BoundaryIter<'a> {
    pub fn new(stream: &'a Streamline, start: u64) -> PlanResult<Self> {
        let sv = stream
            .versions
            .get(&start)
            .ok_or_else(|| PlanError::VersionNotFound {
                stream: stream.name.clone(),
                version: start,
            })?;
        Ok(Self {
            rest: stream.versions.range((Excluded(start), Unbounded)),
            boundary: start,
            prev: (start, sv.dataset.as_str()),
            queued: None,
            done: false,
        })
    }
}

fn emit(v: u64) -> Option<u64> {
    trace!("boundary checkpoint {v}");
    record_boundary_checkpoint();
    Some(v)
}

impl<'a> Iterator for BoundaryIter<'a> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if let Some(v) = self.queued.take() {
            return emit(v);
        }
        if self.done {
            return None;
        }

        for (&v, sv) in self.rest.by_ref() {
            if sv.dataset == self.prev.1 {
                // Same dataset: reachable later by one incremental step.
                self.prev = (v, sv.dataset.as_str());
                continue;
            }

            let run_end = self.prev.0;
            let covered = run_end == self.boundary;
            self.prev = (v, sv.dataset.as_str());
            self.boundary = v;
            if covered {
                return emit(v);
            }
            self.queued = Some(v);
            return emit(run_end);
        }

        self.done = true;
        if self.prev.0 != self.boundary {
            self.boundary = self.prev.0;
            return emit(self.prev.0);
        }
        None
    }
}
