//! Exam placement, batch solving, commit, and schedule metrics.
//!
//! # Algorithms
//!
//! `IncrementalAllocator` places one subject with a deterministic
//! first-fit scan over (date, session). `BatchSolver` places several
//! subjects together by backtracking, most-constrained subject first.
//! Both consult the same [`ConstraintModel`]; `ScheduleCommit` re-checks
//! the candidate against the live schedule before writing it.
//!
//! # KPI
//!
//! `ScheduleKpi` reports exams, seats used, invigilator load and room
//! fill ratio for a committed schedule.
//!
//! # References
//!
//! - Carter, Laporte & Lee (1996), "Examination Timetabling: Algorithmic
//!   Strategies and Applications"
//! - Russell & Norvig (2020), "Artificial Intelligence: A Modern Approach", Ch. 6

mod batch;
mod commit;
mod engine;
mod incremental;
mod kpi;

pub use batch::{BatchSolution, BatchSolver};
pub use commit::ScheduleCommit;
pub use engine::ExamEngine;
pub use incremental::{place_in_slot, slot_placements, IncrementalAllocator, SlotRejection};
pub use kpi::ScheduleKpi;

use chrono::NaiveDate;

use crate::catalog::CatalogSnapshot;
use crate::config::EngineConfig;
use crate::cp::ConstraintModel;
use crate::error::Result;
use crate::models::{Session, Subject};

/// Builds the constraint model for `subjects` over the snapshot's
/// resources, both sessions, and `dates`.
pub(crate) fn build_model(
    subjects: &[Subject],
    dates: &[NaiveDate],
    snapshot: &CatalogSnapshot,
    config: &EngineConfig,
) -> Result<ConstraintModel> {
    Ok(ConstraintModel::build(
        subjects,
        dates,
        &Session::ALL,
        &snapshot.rooms,
        &snapshot.invigilators,
    )?
    .with_config(config))
}
