//! Transactional commit of candidate placements.
//!
//! A candidate is computed from a snapshot that may be stale by the time
//! it is written. Commit closes that gap: under one engine-wide lock it
//! re-reads the live schedule, re-runs the constraint model, and only then
//! hands every row to the store in a single all-or-nothing call.

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::catalog::{CatalogStore, StoreError};
use crate::cp::{Candidate, ConstraintModel, Occupancy};
use crate::error::{Result, ScheduleError};
use crate::models::{Invariant, Schedule, Subject};

/// Serializes check-then-write against one store.
#[derive(Debug, Default)]
pub struct ScheduleCommit {
    lock: Mutex<()>,
}

impl ScheduleCommit {
    /// Creates a commit gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes new placements.
    ///
    /// Every candidate is checked against the live schedule and against
    /// the candidates before it. Nothing is written on any violation.
    ///
    /// # Errors
    /// `ConcurrentConflict` if the live schedule rejects a candidate or the
    /// store reports a uniqueness clash; `Store` for other store failures.
    pub fn commit<S: CatalogStore + ?Sized>(
        &self,
        store: &S,
        model: &ConstraintModel,
        candidates: &[Candidate],
    ) -> Result<Schedule> {
        let _guard = self.lock.lock();

        let live = Schedule::from_assignments(store.assignments()?);
        let violations = check_all(model, candidates, &live);
        if !violations.is_empty() {
            warn!(?violations, "commit rejected");
            return Err(ScheduleError::ConcurrentConflict { violations });
        }

        let subjects: Vec<Subject> = candidates.iter().map(|c| c.subject.clone()).collect();
        let rows: Vec<_> = candidates
            .iter()
            .flat_map(|c| c.assignments.iter().cloned())
            .collect();

        store
            .commit(&subjects, &rows)
            .map_err(|e| store_failure(store, model, candidates, e))?;

        info!(subjects = subjects.len(), rows = rows.len(), "schedule committed");
        Ok(Schedule::from_assignments(rows).sorted())
    }

    /// Replaces a subject's placement.
    ///
    /// The candidate is checked against the live schedule minus the
    /// subject's current rows; the store swaps old for new atomically.
    pub fn replace<S: CatalogStore + ?Sized>(
        &self,
        store: &S,
        model: &ConstraintModel,
        candidate: &Candidate,
    ) -> Result<Schedule> {
        let _guard = self.lock.lock();

        let live = Schedule::from_assignments(store.assignments()?)
            .without_subject(&candidate.subject.code);
        let violations = check_all(model, std::slice::from_ref(candidate), &live);
        if !violations.is_empty() {
            warn!(subject = %candidate.subject.code, ?violations, "reschedule rejected");
            return Err(ScheduleError::ConcurrentConflict { violations });
        }

        store
            .replace(&candidate.subject, &candidate.assignments)
            .map_err(|e| store_failure(store, model, std::slice::from_ref(candidate), e))?;

        info!(
            subject = %candidate.subject.code,
            rows = candidate.assignments.len(),
            "subject rescheduled"
        );
        Ok(Schedule::from_assignments(candidate.assignments.clone()).sorted())
    }
}

/// A uniqueness clash at the store means someone wrote past the lock;
/// report it as a conflict with whatever the model can now see.
fn store_failure<S: CatalogStore + ?Sized>(
    store: &S,
    model: &ConstraintModel,
    candidates: &[Candidate],
    error: StoreError,
) -> ScheduleError {
    match error {
        StoreError::Conflict(reason) => {
            let violations = store
                .assignments()
                .map(|rows| check_all(model, candidates, &Schedule::from_assignments(rows)))
                .unwrap_or_default();
            warn!(%reason, ?violations, "store rejected commit");
            ScheduleError::ConcurrentConflict { violations }
        }
        other => {
            warn!(error = %other, "store failure during commit");
            ScheduleError::Store(other)
        }
    }
}

/// Violations of placing every candidate, in order, into `existing`.
fn check_all(
    model: &ConstraintModel,
    candidates: &[Candidate],
    existing: &Schedule,
) -> Vec<Invariant> {
    let mut occupancy = Occupancy::from_schedule(existing);
    let mut found: Vec<Invariant> = Vec::new();
    for candidate in candidates {
        found.extend(
            model
                .conflicts_with(candidate, &mut occupancy)
                .into_iter()
                .map(|v| v.invariant),
        );
        occupancy.add_all(&candidate.assignments);
    }
    found.sort();
    found.dedup();
    found
}
