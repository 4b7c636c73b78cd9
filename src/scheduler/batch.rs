//! Backtracking solver for placing several subjects together.
//!
//! # Algorithm
//!
//! 1. Order subjects most-constrained-first with the ordering
//!    [`RuleEngine`] (most rooms, then semester peers, then department
//!    peers, then code).
//! 2. Depth-first over subjects: try each (date, session) in ascending
//!    order, and inside a slot each room set from [`slot_placements`]
//!    (first fit first, then the alternatives mixed seat limits allow).
//! 3. A value is kept only if the constraint model finds no conflict with
//!    the committed schedule and the subjects placed so far; otherwise
//!    the next value is tried, backtracking when a subject runs out.
//!
//! Rooms of one seat limit are interchangeable, and so are invigilators
//! free on the same date (their duty only binds that date). Branching on
//! per-limit room counts and taking invigilators first-fit therefore
//! loses no solutions: `Unsatisfiable { budget_exhausted: false }` means
//! no placement of the batch exists.
//!
//! # Termination
//! The search stops at the node budget, the optional time limit, or when
//! the caller's cancellation flag is raised.
//!
//! # Reference
//! Russell & Norvig (2020), "Artificial Intelligence: A Modern Approach", Ch. 6.3

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, info, trace};

use super::build_model;
use super::incremental::{check_capacity, slot_placements};
use crate::catalog::CatalogSnapshot;
use crate::config::EngineConfig;
use crate::cp::{Candidate, ConstraintModel, Occupancy};
use crate::error::{Result, ScheduleError};
use crate::models::{DateWindow, Schedule, Subject};
use crate::ordering::{OrderingContext, RuleEngine};
use crate::validation::validate_batch;

/// A joint placement of every batch subject.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSolution {
    /// One candidate per subject, in request order.
    pub candidates: Vec<Candidate>,
    /// Search nodes (value trials) used.
    pub nodes: u64,
}

impl BatchSolution {
    /// All rows as one schedule.
    pub fn into_schedule(self) -> Schedule {
        Schedule::from_assignments(
            self.candidates
                .into_iter()
                .flat_map(|c| c.assignments)
                .collect(),
        )
    }
}

/// Places several subjects simultaneously or proves it impossible.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use exam_schedule::catalog::CatalogSnapshot;
/// use exam_schedule::config::EngineConfig;
/// use exam_schedule::models::{DateWindow, Department, Invigilator, Room, Subject};
/// use exam_schedule::scheduler::BatchSolver;
///
/// let snapshot = CatalogSnapshot::new(
///     vec![Room::new("TP101"), Room::new("TP102")],
///     vec![Invigilator::new("VS1"), Invigilator::new("VS2")],
///     vec![Department::new("ECE", "Electronics"), Department::new("ME", "Mechanical")],
/// );
/// let monday = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap();
/// let subjects = vec![
///     Subject::new("EC201", "ECE", 3, 30),
///     Subject::new("ME201", "ME", 3, 30),
/// ];
///
/// let solution = BatchSolver::new(EngineConfig::default())
///     .solve(&subjects, DateWindow::single(monday), &snapshot)
///     .unwrap();
/// // Same semester: one sits FN, the other AN.
/// assert_eq!(solution.candidates.len(), 2);
/// assert_ne!(solution.candidates[0].slot(), solution.candidates[1].slot());
/// ```
#[derive(Debug, Clone, Default)]
pub struct BatchSolver {
    config: EngineConfig,
    ordering: RuleEngine,
}

impl BatchSolver {
    /// Creates a solver with the default most-constrained-first ordering.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ordering: RuleEngine::most_constrained_first(),
        }
    }

    /// Replaces the subject ordering.
    pub fn with_ordering(mut self, ordering: RuleEngine) -> Self {
        self.ordering = ordering;
        self
    }

    /// Solves without external cancellation.
    pub fn solve(
        &self,
        subjects: &[Subject],
        window: DateWindow,
        snapshot: &CatalogSnapshot,
    ) -> Result<BatchSolution> {
        let never = AtomicBool::new(false);
        self.solve_with_cancel(subjects, window, snapshot, &never)
    }

    /// Solves, stopping early once `cancel` is raised.
    ///
    /// # Errors
    /// - Input: `InvalidBatch`, `InvalidSubject`, `InvalidWindow`,
    ///   `UnknownDepartment`, `AlreadyScheduled`, `EmptyDomain`
    /// - Resource exhaustion: `InsufficientCapacity`, `EmptyWindow`,
    ///   `Unsatisfiable`
    pub fn solve_with_cancel(
        &self,
        subjects: &[Subject],
        window: DateWindow,
        snapshot: &CatalogSnapshot,
        cancel: &AtomicBool,
    ) -> Result<BatchSolution> {
        if subjects.is_empty() {
            return Err(ScheduleError::InvalidBatch("no subjects given".into()));
        }
        validate_batch(subjects, snapshot).map_err(ScheduleError::from_request_errors)?;
        if !window.is_valid() {
            return Err(ScheduleError::InvalidWindow(format!(
                "start {} is after end {}",
                window.start, window.end
            )));
        }
        if let Some(placed) = subjects
            .iter()
            .find(|s| snapshot.schedule.contains_subject(&s.code))
        {
            return Err(ScheduleError::AlreadyScheduled(placed.code.clone()));
        }

        let dates = window.exam_days();
        if dates.is_empty() {
            return Err(ScheduleError::EmptyWindow);
        }
        let model = build_model(subjects, &dates, snapshot, &self.config)?;
        for subject in subjects {
            check_capacity(subject, snapshot, &self.config)?;
        }

        let context = OrderingContext::from_model(&model, &self.config);
        let order = self.ordering.sort_indices(subjects, &context);

        info!(
            subjects = subjects.len(),
            days = dates.len(),
            constraints = model.constraints().len(),
            "batch search started"
        );

        let mut search = Search {
            model: &model,
            config: &self.config,
            order,
            occupancy: Occupancy::from_schedule(&snapshot.schedule),
            placed: vec![None; subjects.len()],
            nodes: 0,
            max_nodes: self.config.batch.max_nodes,
            deadline: self.config.batch.time_limit().map(|limit| Instant::now() + limit),
            cancel,
            exhausted: false,
        };

        if search.descend(0) {
            let nodes = search.nodes;
            let candidates: Vec<Candidate> = search.placed.into_iter().flatten().collect();
            info!(nodes, "batch search solved");
            Ok(BatchSolution { candidates, nodes })
        } else {
            info!(nodes = search.nodes, budget_exhausted = search.exhausted, "batch search failed");
            Err(ScheduleError::Unsatisfiable {
                budget_exhausted: search.exhausted,
            })
        }
    }
}

struct Search<'a> {
    model: &'a ConstraintModel,
    config: &'a EngineConfig,
    order: Vec<usize>,
    occupancy: Occupancy,
    placed: Vec<Option<Candidate>>,
    nodes: u64,
    max_nodes: u64,
    deadline: Option<Instant>,
    cancel: &'a AtomicBool,
    exhausted: bool,
}

impl Search<'_> {
    fn out_of_budget(&self) -> bool {
        self.nodes >= self.max_nodes
            || self.cancel.load(Ordering::Relaxed)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Places the subject at `depth` and everything after it.
    fn descend(&mut self, depth: usize) -> bool {
        let Some(&index) = self.order.get(depth) else {
            return true;
        };
        let model = self.model;
        let subject = &model.subjects()[index];

        for &date in model.dates() {
            for &session in model.sessions() {
                if self.out_of_budget() {
                    self.exhausted = true;
                    return false;
                }

                let placements = match slot_placements(
                    subject,
                    date,
                    session,
                    model.rooms(),
                    model.invigilators(),
                    &self.occupancy,
                    self.config,
                ) {
                    Ok(placements) => placements,
                    Err(reason) => {
                        self.nodes += 1;
                        trace!(
                            subject = %subject.code,
                            date = %date,
                            session = %session,
                            ?reason,
                            depth,
                            "value pruned"
                        );
                        continue;
                    }
                };

                for rows in placements {
                    if self.out_of_budget() {
                        self.exhausted = true;
                        return false;
                    }
                    self.nodes += 1;

                    let candidate = Candidate::new(subject.clone(), rows);
                    if !model.conflicts_with(&candidate, &mut self.occupancy).is_empty() {
                        continue;
                    }

                    self.occupancy.add_all(&candidate.assignments);
                    self.placed[index] = Some(candidate);

                    if self.descend(depth + 1) {
                        return true;
                    }
                    if let Some(undone) = self.placed[index].take() {
                        self.occupancy.remove_all(&undone.assignments);
                    }
                    if self.exhausted {
                        return false;
                    }
                }
            }
        }

        debug!(subject = %subject.code, depth, nodes = self.nodes, "backtracking");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, Department, Invigilator, Room, Session};
    use chrono::NaiveDate;
    use std::time::Duration;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, day).unwrap()
    }

    fn snapshot(rooms: usize, invigilators: usize) -> CatalogSnapshot {
        CatalogSnapshot::new(
            (1..=rooms).map(|i| Room::new(format!("R{i}"))).collect(),
            (1..=invigilators).map(|i| Invigilator::new(format!("VS{i}"))).collect(),
            vec![
                Department::new("MATH", "Mathematics"),
                Department::new("PHY", "Physics"),
                Department::new("CHEM", "Chemistry"),
            ],
        )
    }

    fn solver() -> BatchSolver {
        BatchSolver::new(EngineConfig::default())
    }

    fn assert_consistent(
        solution: &BatchSolution,
        snapshot: &CatalogSnapshot,
        dates: &[NaiveDate],
    ) {
        let subjects: Vec<Subject> = solution
            .candidates
            .iter()
            .map(|c| c.subject.clone())
            .collect();
        let model = build_model(&subjects, dates, snapshot, &EngineConfig::default()).unwrap();
        let mut existing = snapshot.schedule.clone();
        for c in &solution.candidates {
            assert!(model.violations(c, &existing).is_empty(), "{:?}", c);
            existing.extend(c.clone().into_schedule());
        }
    }

    #[test]
    fn test_solves_mutually_constrained_batch() {
        let snap = snapshot(2, 4);
        let subjects = vec![
            Subject::new("MA101", "MATH", 1, 30),
            Subject::new("MA201", "MATH", 2, 30),
            Subject::new("PH101", "PHY", 1, 60),
        ];
        let solution = solver().solve(&subjects, DateWindow::new(d(5), d(6)), &snap).unwrap();
        assert_eq!(solution.candidates.len(), 3);
        // Request order is kept in the output.
        assert_eq!(solution.candidates[0].subject.code, "MA101");
        assert_consistent(&solution, &snap, &[d(5), d(6)]);
    }

    #[test]
    fn test_department_rule_separates_days() {
        // PH101 needs both rooms and goes first; the two MATH subjects
        // cannot share a day.
        let snap = snapshot(2, 4);
        let subjects = vec![
            Subject::new("MA101", "MATH", 1, 10),
            Subject::new("MA102", "MATH", 2, 10),
            Subject::new("PH101", "PHY", 1, 60),
        ];
        let solution = solver().solve(&subjects, DateWindow::new(d(5), d(6)), &snap).unwrap();
        assert_consistent(&solution, &snap, &[d(5), d(6)]);
        let slots: Vec<_> = solution.candidates.iter().map(|c| c.slot().unwrap()).collect();
        assert_ne!(slots[0].0, slots[1].0);
    }

    #[test]
    fn test_unsatisfiable() {
        // Three subjects of one department on a single day.
        let snap = snapshot(3, 3);
        let subjects = vec![
            Subject::new("MA101", "MATH", 1, 10),
            Subject::new("MA102", "MATH", 1, 10),
            Subject::new("MA103", "MATH", 1, 10),
        ];
        let err = solver().solve(&subjects, DateWindow::single(d(5)), &snap).unwrap_err();
        assert!(matches!(err, ScheduleError::Unsatisfiable { budget_exhausted: false }));
    }

    #[test]
    fn test_budget_exhausted() {
        let snap = snapshot(3, 3);
        let subjects = vec![
            Subject::new("MA101", "MATH", 1, 10),
            Subject::new("MA102", "MATH", 1, 10),
            Subject::new("MA103", "MATH", 1, 10),
        ];
        let solver = BatchSolver::new(EngineConfig::default().with_max_nodes(2));
        let err = solver.solve(&subjects, DateWindow::new(d(5), d(9)), &snap).unwrap_err();
        assert!(matches!(err, ScheduleError::Unsatisfiable { budget_exhausted: true }));
    }

    #[test]
    fn test_time_limit_exhausted() {
        let snap = snapshot(3, 3);
        let subjects = vec![Subject::new("MA101", "MATH", 1, 10)];
        let solver = BatchSolver::new(EngineConfig::default().with_time_limit(Duration::ZERO));
        let err = solver.solve(&subjects, DateWindow::single(d(5)), &snap).unwrap_err();
        assert!(matches!(err, ScheduleError::Unsatisfiable { budget_exhausted: true }));
    }

    #[test]
    fn test_mixed_capacities_try_other_room_sets() {
        // First fit seats MA101 in the hall, which PH101 needs; the hall is
        // taken in the afternoon, so only MA101 in the small room works.
        let snap = CatalogSnapshot::new(
            vec![Room::new("L").with_capacity(60), Room::new("S").with_capacity(10)],
            (1..=4).map(|i| Invigilator::new(format!("VS{i}"))).collect(),
            vec![
                Department::new("MATH", "Mathematics"),
                Department::new("PHY", "Physics"),
                Department::new("CHEM", "Chemistry"),
            ],
        );
        let held = Subject::new("CH101", "CHEM", 3, 70);
        let snap = snap.with_schedule(Schedule::from_assignments(vec![
            Assignment::new(&held, d(5), Session::Afternoon, "L", "VS3", 60),
            Assignment::new(&held, d(5), Session::Afternoon, "S", "VS4", 10),
        ]));

        let subjects = vec![
            Subject::new("MA101", "MATH", 1, 10),
            Subject::new("PH101", "PHY", 2, 60),
        ];
        let solution = solver().solve(&subjects, DateWindow::single(d(5)), &snap).unwrap();
        assert_consistent(&solution, &snap, &[d(5)]);
        assert_eq!(solution.candidates[0].assignments[0].room_code, "S");
        assert_eq!(solution.candidates[1].assignments[0].room_code, "L");
        assert_eq!(solution.candidates[1].assignments[0].student_count, 60);
    }

    #[test]
    fn test_cancelled() {
        let snap = snapshot(3, 3);
        let subjects = vec![Subject::new("MA101", "MATH", 1, 10)];
        let cancel = AtomicBool::new(true);
        let err = solver()
            .solve_with_cancel(&subjects, DateWindow::single(d(5)), &snap, &cancel)
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Unsatisfiable { budget_exhausted: true }));
    }

    #[test]
    fn test_respects_committed_schedule() {
        let snap = snapshot(1, 2);
        let held = Subject::new("CH101", "CHEM", 1, 10);
        let committed = Candidate::new(
            held.clone(),
            vec![Assignment::new(&held, d(5), Session::Forenoon, "R1", "VS1", 10)],
        );
        let snap = snap.with_schedule(committed.into_schedule());

        let subjects = vec![Subject::new("PH101", "PHY", 2, 10)];
        let solution = solver().solve(&subjects, DateWindow::single(d(5)), &snap).unwrap();
        let c = &solution.candidates[0];
        assert_eq!(c.slot(), Some((d(5), Session::Afternoon)));
        assert_eq!(c.assignments[0].invigilator_code, "VS2");
    }

    #[test]
    fn test_input_errors() {
        let snap = snapshot(2, 2);
        assert!(matches!(
            solver().solve(&[], DateWindow::single(d(5)), &snap),
            Err(ScheduleError::InvalidBatch(_))
        ));

        let dup = vec![Subject::new("A", "MATH", 1, 10), Subject::new("A", "PHY", 2, 10)];
        assert!(matches!(
            solver().solve(&dup, DateWindow::single(d(5)), &snap),
            Err(ScheduleError::InvalidBatch(_))
        ));

        let zero = vec![Subject::new("A", "MATH", 1, 0)];
        assert!(matches!(
            solver().solve(&zero, DateWindow::single(d(5)), &snap),
            Err(ScheduleError::InvalidSubject { .. })
        ));

        let ok = vec![Subject::new("A", "MATH", 1, 10)];
        let no_invigilators = CatalogSnapshot::new(
            vec![Room::new("R1")],
            vec![],
            vec![Department::new("MATH", "Mathematics")],
        );
        assert!(matches!(
            solver().solve(&ok, DateWindow::single(d(5)), &no_invigilators),
            Err(ScheduleError::EmptyDomain("invigilator"))
        ));
        assert!(matches!(
            solver().solve(&ok, DateWindow::single(d(10)), &snap),
            Err(ScheduleError::EmptyWindow)
        ));
    }

    #[test]
    fn test_solution_schedule_has_no_split_subjects() {
        // Invigilators are blocked for the whole day, so the afternoon
        // subject needs two fresh ones.
        let snap = snapshot(4, 6);
        let subjects = vec![
            Subject::new("MA101", "MATH", 1, 95),
            Subject::new("PH101", "PHY", 2, 31),
        ];
        let solution = solver().solve(&subjects, DateWindow::single(d(5)), &snap).unwrap();
        assert_consistent(&solution, &snap, &[d(5)]);

        let schedule = solution.into_schedule();
        assert_eq!(schedule.exam_count(), 2);
        assert_eq!(schedule.assignment_count(), 6);
        assert_eq!(schedule.students_for_subject("MA101"), 95);
        assert_eq!(schedule.students_for_subject("PH101"), 31);
        assert_eq!(schedule.assignments_for(d(5), Some(Session::Afternoon)).len(), 2);
    }
}
