//! Engine facade: snapshot, search, commit.
//!
//! Every operation follows the same path: read a [`CatalogSnapshot`],
//! run a search against it, then hand the candidate to
//! [`ScheduleCommit`], which re-checks it against the live schedule
//! under the engine's lock before writing. Searches never hold the lock,
//! so previews and candidate computation may run concurrently.

use std::sync::atomic::AtomicBool;

use tracing::info;

use super::{build_model, BatchSolver, IncrementalAllocator, ScheduleCommit, ScheduleKpi};
use crate::catalog::{CatalogSnapshot, CatalogStore};
use crate::config::EngineConfig;
use crate::cp::Candidate;
use crate::error::{Result, ScheduleError};
use crate::models::{DateWindow, Schedule, Subject};
use crate::ordering::RuleEngine;

/// Exam scheduling engine over a catalog store.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use exam_schedule::catalog::InMemoryStore;
/// use exam_schedule::models::{DateWindow, Department, Invigilator, Session, Subject};
/// use exam_schedule::scheduler::ExamEngine;
///
/// let store = InMemoryStore::new()
///     .with_standard_rooms()
///     .with_invigilators((1..=10).map(|i| Invigilator::new(format!("VS{i}"))).collect())
///     .with_departments(vec![Department::new("ECE", "Electronics")]);
/// let engine = ExamEngine::new(store);
///
/// let monday = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap();
/// let friday = NaiveDate::from_ymd_opt(2025, 5, 9).unwrap();
/// let subject = Subject::new("EC201", "ECE", 3, 75).with_title("Signals and Systems");
///
/// let placed = engine
///     .schedule_subject(&subject, DateWindow::new(monday, friday))
///     .unwrap();
/// assert_eq!(placed.assignment_count(), 3);
/// assert!(placed.assignments.iter().all(|a| a.session == Session::Forenoon));
/// assert_eq!(engine.current_schedule().unwrap(), placed);
/// ```
#[derive(Debug)]
pub struct ExamEngine<S: CatalogStore> {
    store: S,
    config: EngineConfig,
    ordering: RuleEngine,
    gate: ScheduleCommit,
}

impl<S: CatalogStore> ExamEngine<S> {
    /// Creates an engine with the default configuration.
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: EngineConfig::default(),
            ordering: RuleEngine::most_constrained_first(),
            gate: ScheduleCommit::new(),
        }
    }

    /// Creates an engine with a validated configuration.
    pub fn with_config(store: S, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(store)
        })
    }

    /// Replaces the batch subject ordering.
    pub fn with_ordering(mut self, ordering: RuleEngine) -> Self {
        self.ordering = ordering;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reads and validates a catalog snapshot.
    pub fn snapshot(&self) -> Result<CatalogSnapshot> {
        let snapshot = CatalogSnapshot::take(&self.store)?;
        snapshot.validate().map_err(ScheduleError::Validation)?;
        Ok(snapshot)
    }

    /// Computes where `subject` would go, without committing.
    pub fn preview_subject(&self, subject: &Subject, window: DateWindow) -> Result<Candidate> {
        let snapshot = self.snapshot()?;
        self.allocator().allocate(subject, window, &snapshot)
    }

    /// Commits a previously previewed candidate.
    ///
    /// Fails with `ConcurrentConflict` if the schedule changed in a way
    /// that invalidates it; nothing is written in that case.
    pub fn commit_preview(&self, candidate: &Candidate, window: DateWindow) -> Result<Schedule> {
        let snapshot = self.snapshot()?;
        let model = build_model(
            std::slice::from_ref(&candidate.subject),
            &window.exam_days(),
            &snapshot,
            &self.config,
        )?;
        self.gate
            .commit(&self.store, &model, std::slice::from_ref(candidate))
    }

    /// Places one subject at the earliest feasible slot and commits it.
    ///
    /// Returns the committed rows, sorted.
    pub fn schedule_subject(&self, subject: &Subject, window: DateWindow) -> Result<Schedule> {
        info!(
            subject = %subject.code,
            start = %window.start,
            end = %window.end,
            "scheduling subject"
        );
        let snapshot = self.snapshot()?;
        let candidate = self.allocator().allocate(subject, window, &snapshot)?;
        let model = build_model(
            std::slice::from_ref(subject),
            &window.exam_days(),
            &snapshot,
            &self.config,
        )?;
        self.gate
            .commit(&self.store, &model, std::slice::from_ref(&candidate))
    }

    /// Places several subjects together and commits them in one write.
    pub fn schedule_batch(&self, subjects: &[Subject], window: DateWindow) -> Result<Schedule> {
        let never = AtomicBool::new(false);
        self.schedule_batch_with_cancel(subjects, window, &never)
    }

    /// Like [`ExamEngine::schedule_batch`], abandoning the search once
    /// `cancel` is raised.
    pub fn schedule_batch_with_cancel(
        &self,
        subjects: &[Subject],
        window: DateWindow,
        cancel: &AtomicBool,
    ) -> Result<Schedule> {
        info!(
            subjects = subjects.len(),
            start = %window.start,
            end = %window.end,
            "scheduling batch"
        );
        let snapshot = self.snapshot()?;
        let solution = BatchSolver::new(self.config.clone())
            .with_ordering(self.ordering.clone())
            .solve_with_cancel(subjects, window, &snapshot, cancel)?;
        let model = build_model(subjects, &window.exam_days(), &snapshot, &self.config)?;
        self.gate
            .commit(&self.store, &model, &solution.candidates)
    }

    /// Moves a subject to the earliest feasible slot in `window`.
    ///
    /// The subject's own current rows are ignored while searching; the old
    /// rows are replaced atomically. A subject with no rows yet is simply
    /// placed.
    pub fn reschedule_subject(&self, subject: &Subject, window: DateWindow) -> Result<Schedule> {
        info!(
            subject = %subject.code,
            start = %window.start,
            end = %window.end,
            "rescheduling subject"
        );
        let snapshot = self.snapshot()?;
        let remaining = snapshot.schedule.without_subject(&subject.code);
        let snapshot = snapshot.with_schedule(remaining);

        let candidate = self.allocator().allocate(subject, window, &snapshot)?;
        let model = build_model(
            std::slice::from_ref(subject),
            &window.exam_days(),
            &snapshot,
            &self.config,
        )?;
        self.gate.replace(&self.store, &model, &candidate)
    }

    /// The committed schedule ordered by date, session (FN first), room.
    pub fn current_schedule(&self) -> Result<Schedule> {
        Ok(Schedule::from_assignments(self.store.assignments()?).sorted())
    }

    /// Metrics of the committed schedule.
    pub fn kpi(&self) -> Result<ScheduleKpi> {
        let snapshot = CatalogSnapshot::take(&self.store)?;
        Ok(ScheduleKpi::calculate(
            &snapshot.schedule,
            &snapshot.rooms,
            &self.config,
        ))
    }

    fn allocator(&self) -> IncrementalAllocator {
        IncrementalAllocator::new(self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
    use std::sync::atomic::Ordering;

    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::catalog::{InMemoryStore, StoreError};
    use crate::error::ErrorKind;
    use crate::models::{Department, Invariant, Invigilator, Room, Session};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, day).unwrap()
    }

    fn monday() -> NaiveDate {
        d(5)
    }

    fn store(rooms: usize, invigilators: usize) -> InMemoryStore {
        InMemoryStore::new()
            .with_rooms((1..=rooms).map(|i| Room::new(format!("R{i}"))).collect())
            .with_invigilators(
                (1..=invigilators)
                    .map(|i| Invigilator::new(format!("VS{i}")))
                    .collect(),
            )
            .with_departments(vec![
                Department::new("MATH", "Mathematics"),
                Department::new("PHY", "Physics"),
                Department::new("CHEM", "Chemistry"),
            ])
    }

    /// Checks every schedule invariant directly against the rows.
    fn assert_invariants(
        schedule: &Schedule,
        subjects: &[Subject],
        rooms: &[Room],
        config: &EngineConfig,
    ) {
        let mut room_slots = HashSet::new();
        let mut invigilator_days = HashSet::new();
        let mut semester_slots: HashMap<(NaiveDate, Session, u32), BTreeSet<&str>> = HashMap::new();
        let mut department_days: HashMap<(NaiveDate, &str), BTreeSet<&str>> = HashMap::new();
        let mut subject_slots: HashMap<&str, BTreeSet<(NaiveDate, Session)>> = HashMap::new();
        let caps: HashMap<&str, u32> = rooms
            .iter()
            .map(|r| (r.code.as_str(), config.room_capacity(r)))
            .collect();

        for a in &schedule.assignments {
            assert!(
                room_slots.insert((a.date, a.session, a.room_code.as_str())),
                "room {} double booked",
                a.room_code
            );
            assert!(
                invigilator_days.insert((a.date, a.invigilator_code.as_str())),
                "invigilator {} double booked on {}",
                a.invigilator_code,
                a.date
            );
            semester_slots
                .entry((a.date, a.session, a.semester))
                .or_default()
                .insert(&a.subject_code);
            department_days
                .entry((a.date, a.department_code.as_str()))
                .or_default()
                .insert(&a.subject_code);
            subject_slots.entry(&a.subject_code).or_default().insert(a.slot());
            assert!(a.student_count <= caps[a.room_code.as_str()], "room {} over cap", a.room_code);
        }

        assert!(semester_slots.values().all(|s| s.len() == 1), "semester clash");
        assert!(department_days.values().all(|s| s.len() == 1), "department sits twice a day");
        assert!(subject_slots.values().all(|s| s.len() == 1), "subject split across slots");
        for subject in subjects {
            if schedule.contains_subject(&subject.code) {
                assert_eq!(schedule.students_for_subject(&subject.code), subject.student_count);
            }
        }
    }

    #[test]
    fn test_scenario_single_room_monday() {
        init_tracing();
        let engine = ExamEngine::new(store(1, 1));
        let s = Subject::new("MA101", "MATH", 1, 30);
        let placed = engine.schedule_subject(&s, DateWindow::single(monday())).unwrap();

        assert_eq!(placed.assignment_count(), 1);
        let a = &placed.assignments[0];
        assert_eq!((a.date, a.session), (monday(), Session::Forenoon));
        assert_eq!(a.room_code, "R1");
        assert_eq!(a.invigilator_code, "VS1");
        assert_eq!(a.student_count, 30);
    }

    #[test]
    fn test_scenario_same_department_moves_a_day() {
        init_tracing();
        let engine = ExamEngine::new(store(1, 1));
        let first = Subject::new("MA101", "MATH", 1, 30);
        engine.schedule_subject(&first, DateWindow::single(monday())).unwrap();

        let second = Subject::new("MA102", "MATH", 1, 30);
        let err = engine
            .schedule_subject(&second, DateWindow::single(monday()))
            .unwrap_err();
        assert!(matches!(err, ScheduleError::NoFeasibleSlot(_)));
        assert_eq!(err.kind(), ErrorKind::ResourceExhaustion);

        let placed = engine
            .schedule_subject(&second, DateWindow::new(monday(), d(6)))
            .unwrap();
        assert_eq!(placed.assignments[0].date, d(6));
        assert_eq!(placed.assignments[0].session, Session::Forenoon);
    }

    #[test]
    fn test_scenario_independent_subjects_share_monday() {
        init_tracing();
        let engine = ExamEngine::new(store(2, 2));
        let a = Subject::new("MA101", "MATH", 1, 30);
        let b = Subject::new("PH201", "PHY", 2, 30);
        engine.schedule_subject(&a, DateWindow::single(monday())).unwrap();
        engine.schedule_subject(&b, DateWindow::single(monday())).unwrap();

        let schedule = engine.current_schedule().unwrap();
        assert_eq!(schedule.assignment_count(), 2);
        assert!(schedule.assignments.iter().all(|a| a.date == monday()));
        assert_invariants(&schedule, &[a, b], &engine.snapshot().unwrap().rooms, engine.config());
    }

    #[test]
    fn test_scenario_batch_unsatisfiable() {
        init_tracing();
        let engine = ExamEngine::new(store(1, 1));
        let subjects = vec![
            Subject::new("MA101", "MATH", 1, 20),
            Subject::new("MA102", "MATH", 1, 20),
            Subject::new("MA103", "MATH", 1, 20),
        ];
        let err = engine
            .schedule_batch(&subjects, DateWindow::new(monday(), d(6)))
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Unsatisfiable { budget_exhausted: false }));
        assert!(engine.current_schedule().unwrap().is_empty());
    }

    #[test]
    fn test_batch_commits_all_or_nothing() {
        let engine = ExamEngine::new(store(3, 6));
        let subjects = vec![
            Subject::new("MA101", "MATH", 1, 60),
            Subject::new("MA201", "MATH", 2, 30),
            Subject::new("PH101", "PHY", 1, 45),
            Subject::new("CH101", "CHEM", 1, 10),
        ];
        let placed = engine
            .schedule_batch(&subjects, DateWindow::new(monday(), d(9)))
            .unwrap();
        assert_eq!(placed.exam_count(), 4);

        let schedule = engine.current_schedule().unwrap();
        assert_eq!(schedule, placed);
        assert_invariants(&schedule, &subjects, &engine.snapshot().unwrap().rooms, engine.config());

        // Scheduling any of them again is an input error.
        let err = engine
            .schedule_batch(&subjects[..1], DateWindow::new(monday(), d(9)))
            .unwrap_err();
        assert!(matches!(err, ScheduleError::AlreadyScheduled(_)));
    }

    #[test]
    fn test_batch_cancellation_and_budget() {
        let subjects = vec![
            Subject::new("MA101", "MATH", 1, 10),
            Subject::new("MA102", "MATH", 1, 10),
        ];
        let engine = ExamEngine::new(store(2, 2));
        let cancel = AtomicBool::new(false);
        cancel.store(true, Ordering::SeqCst);
        let err = engine
            .schedule_batch_with_cancel(&subjects, DateWindow::new(monday(), d(9)), &cancel)
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Unsatisfiable { budget_exhausted: true }));

        let config = EngineConfig::default().with_max_nodes(1);
        let tight = ExamEngine::with_config(store(2, 2), config).unwrap();
        let err = tight
            .schedule_batch(&subjects, DateWindow::new(monday(), d(9)))
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Unsatisfiable { budget_exhausted: true }));
    }

    #[test]
    fn test_stale_preview_rejected() {
        init_tracing();
        let engine = ExamEngine::new(store(1, 2));
        let a = Subject::new("MA101", "MATH", 1, 20);
        let b = Subject::new("PH101", "PHY", 2, 20);
        let window = DateWindow::single(monday());

        // Both previews see the same empty schedule and pick R1 at FN.
        let preview_a = engine.preview_subject(&a, window).unwrap();
        let preview_b = engine.preview_subject(&b, window).unwrap();
        assert_eq!(preview_a.assignments[0].room_code, preview_b.assignments[0].room_code);

        engine.commit_preview(&preview_a, window).unwrap();
        let err = engine.commit_preview(&preview_b, window).unwrap_err();
        match &err {
            ScheduleError::ConcurrentConflict { violations } => {
                assert!(violations.contains(&Invariant::RoomDoubleBooked));
                assert!(violations.contains(&Invariant::InvigilatorDoubleBooked));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_retryable());
        assert_eq!(engine.current_schedule().unwrap().assignment_count(), 1);

        // Retrying from a fresh snapshot lands in the afternoon.
        let placed = engine.schedule_subject(&b, window).unwrap();
        assert_eq!(placed.assignments[0].session, Session::Afternoon);
        assert_eq!(placed.assignments[0].invigilator_code, "VS2");
    }

    #[test]
    fn test_concurrent_callers_keep_invariants() {
        init_tracing();
        let engine = ExamEngine::new(store(4, 12));
        let subjects: Vec<Subject> = (0..8)
            .map(|i| {
                let dept = ["MATH", "PHY", "CHEM"][i % 3];
                Subject::new(format!("S{i:02}"), dept, (i % 4) as u32 + 1, 25 + (i as u32 * 7) % 50)
            })
            .collect();
        let window = DateWindow::new(monday(), d(16));

        std::thread::scope(|scope| {
            for chunk in subjects.chunks(2) {
                let engine = &engine;
                scope.spawn(move || {
                    for subject in chunk {
                        let mut attempts = 0;
                        loop {
                            attempts += 1;
                            match engine.schedule_subject(subject, window) {
                                Err(e) if e.is_retryable() && attempts < 20 => continue,
                                other => {
                                    other.unwrap();
                                    break;
                                }
                            }
                        }
                    }
                });
            }
        });

        let schedule = engine.current_schedule().unwrap();
        assert_eq!(schedule.exam_count(), subjects.len());
        assert_invariants(&schedule, &subjects, &engine.snapshot().unwrap().rooms, engine.config());
    }

    #[test]
    fn test_reschedule_moves_subject() {
        let engine = ExamEngine::new(store(2, 2));
        let s = Subject::new("MA101", "MATH", 1, 40);
        engine.schedule_subject(&s, DateWindow::single(monday())).unwrap();

        let moved = engine
            .reschedule_subject(&s, DateWindow::single(d(7)))
            .unwrap();
        assert!(moved.assignments.iter().all(|a| a.date == d(7)));

        let schedule = engine.current_schedule().unwrap();
        assert_eq!(schedule.assignment_count(), 2);
        assert!(schedule.assignments.iter().all(|a| a.date == d(7)));
        assert_eq!(engine.store().list_subjects().unwrap().len(), 1);
    }

    #[test]
    fn test_reschedule_same_window_keeps_slot() {
        let engine = ExamEngine::new(store(1, 1));
        let s = Subject::new("MA101", "MATH", 1, 30);
        let first = engine.schedule_subject(&s, DateWindow::single(monday())).unwrap();
        let again = engine.reschedule_subject(&s, DateWindow::single(monday())).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_input_errors_reach_caller() {
        let engine = ExamEngine::new(store(2, 2));
        let s = Subject::new("MA101", "MATH", 1, 10);

        let err = engine
            .schedule_subject(&s, DateWindow::new(d(9), d(5)))
            .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidWindow(_)));
        assert_eq!(err.kind(), ErrorKind::Input);

        let err = engine
            .schedule_subject(&s, DateWindow::new(d(10), d(11)))
            .unwrap_err();
        assert!(matches!(err, ScheduleError::EmptyWindow));

        let big = Subject::new("MA999", "MATH", 1, 61);
        let err = engine.schedule_subject(&big, DateWindow::single(monday())).unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::InsufficientCapacity { needed: 61, available: 60, .. }
        ));

        engine.schedule_subject(&s, DateWindow::single(monday())).unwrap();
        let err = engine.schedule_subject(&s, DateWindow::single(d(6))).unwrap_err();
        assert!(matches!(err, ScheduleError::AlreadyScheduled(_)));
    }

    #[test]
    fn test_store_failure_is_fatal() {
        let engine = ExamEngine::new(store(1, 1));
        engine.store().set_available(false);
        let err = engine
            .schedule_subject(&Subject::new("MA101", "MATH", 1, 10), DateWindow::single(monday()))
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Store(StoreError::Unavailable(_))));
        assert_eq!(err.kind(), ErrorKind::Store);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_invalid_catalog_rejected() {
        let engine = ExamEngine::new(store(1, 1).with_rooms(vec![Room::new("R1")]));
        let err = engine
            .schedule_subject(&Subject::new("MA101", "MATH", 1, 10), DateWindow::single(monday()))
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Validation(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig::default().with_max_nodes(0);
        let err = ExamEngine::with_config(store(1, 1), config).unwrap_err();
        assert!(matches!(err, ScheduleError::Config(_)));
    }

    #[test]
    fn test_current_schedule_order() {
        let engine = ExamEngine::new(store(3, 6));
        let tue = Subject::new("MA101", "MATH", 1, 70);
        let mon = Subject::new("PH101", "PHY", 1, 10);
        engine.schedule_subject(&tue, DateWindow::single(d(6))).unwrap();
        engine.schedule_subject(&mon, DateWindow::single(monday())).unwrap();

        let schedule = engine.current_schedule().unwrap();
        let keys: Vec<_> = schedule
            .assignments
            .iter()
            .map(|a| (a.date, a.session, a.room_code.clone()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(schedule.assignments[0].subject_code, "PH101");
    }

    #[test]
    fn test_load_balancing_spreads_invigilators() {
        let config = EngineConfig::default().with_load_balancing(true);
        let engine = ExamEngine::with_config(store(1, 3), config).unwrap();
        for (i, day) in [5, 6, 7].into_iter().enumerate() {
            let s = Subject::new(format!("MA10{i}"), "MATH", 1, 10);
            engine.schedule_subject(&s, DateWindow::single(d(day))).unwrap();
        }
        let kpi = engine.kpi().unwrap();
        assert_eq!(kpi.invigilator_load.len(), 3);
        assert_eq!(kpi.max_invigilator_load(), 1);

        // Without balancing VS1 takes every day.
        let engine = ExamEngine::new(store(1, 3));
        for (i, day) in [5, 6, 7].into_iter().enumerate() {
            let s = Subject::new(format!("MA10{i}"), "MATH", 1, 10);
            engine.schedule_subject(&s, DateWindow::single(d(day))).unwrap();
        }
        assert_eq!(engine.kpi().unwrap().invigilator_load["VS1"], 3);
    }

    #[test]
    fn test_kpi() {
        let engine = ExamEngine::new(store(4, 4));
        engine
            .schedule_subject(&Subject::new("MA101", "MATH", 1, 90), DateWindow::single(monday()))
            .unwrap();
        let kpi = engine.kpi().unwrap();
        assert_eq!(kpi.exam_count, 1);
        assert_eq!(kpi.assignment_count, 3);
        assert_eq!(kpi.seats_used, 90);
        assert_eq!(kpi.exam_days, 1);
        assert!((kpi.avg_fill_ratio - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_randomized_catalogs_keep_invariants() {
        init_tracing();
        let departments = ["MATH", "PHY", "CHEM"];

        for seed in 0..40u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let rooms: Vec<Room> = (0..rng.random_range(1..=6))
                .map(|i| {
                    let room = Room::new(format!("R{i}"));
                    match rng.random_range(0..3) {
                        0 => room,
                        1 => room.with_capacity(20),
                        _ => room.with_capacity(45),
                    }
                })
                .collect();
            let invigilators: Vec<Invigilator> = (0..rng.random_range(1..=8))
                .map(|i| Invigilator::new(format!("VS{i}")))
                .collect();
            let subjects: Vec<Subject> = (0..rng.random_range(1..=10))
                .map(|i| {
                    Subject::new(
                        format!("S{i:02}"),
                        departments[rng.random_range(0..departments.len())],
                        rng.random_range(1..=4),
                        rng.random_range(1..=90),
                    )
                })
                .collect();
            let balance = rng.random_bool(0.5);
            let config = EngineConfig::default().with_load_balancing(balance);
            let window = DateWindow::new(monday(), d(rng.random_range(5..=16)));

            let make_store = || {
                InMemoryStore::new()
                    .with_rooms(rooms.clone())
                    .with_invigilators(invigilators.clone())
                    .with_departments(
                        departments.iter().map(|c| Department::new(*c, *c)).collect(),
                    )
            };

            // One at a time.
            let engine = ExamEngine::with_config(make_store(), config.clone()).unwrap();
            for subject in &subjects {
                match engine.schedule_subject(subject, window) {
                    Ok(_) => {}
                    Err(e) => {
                        assert_eq!(e.kind(), ErrorKind::ResourceExhaustion, "seed {seed}: {e}")
                    }
                }
            }
            let schedule = engine.current_schedule().unwrap();
            assert_invariants(&schedule, &subjects, &rooms, &config);

            // All at once.
            let batch_config = config.clone().with_max_nodes(5_000);
            let engine = ExamEngine::with_config(make_store(), batch_config).unwrap();
            match engine.schedule_batch(&subjects, window) {
                Ok(placed) => {
                    assert_eq!(placed.exam_count(), subjects.len(), "seed {seed}");
                    let schedule = engine.current_schedule().unwrap();
                    assert_invariants(&schedule, &subjects, &rooms, &config);
                }
                Err(e) => {
                    assert_eq!(e.kind(), ErrorKind::ResourceExhaustion, "seed {seed}: {e}");
                    assert!(engine.current_schedule().unwrap().is_empty());
                }
            }
        }
    }

    #[test]
    fn test_standard_block_capacity() {
        let store = InMemoryStore::new()
            .with_standard_rooms()
            .with_invigilators((1..=120).map(|i| Invigilator::new(format!("VS{i}"))).collect())
            .with_departments(vec![Department::new("MATH", "Mathematics")]);
        let engine = ExamEngine::new(store);
        let s = Subject::new("MA100", "MATH", 1, 3600);
        let placed = engine.schedule_subject(&s, DateWindow::single(monday())).unwrap();
        assert_eq!(placed.assignment_count(), 120);

        let rooms: BTreeMap<&str, u32> = placed
            .assignments
            .iter()
            .map(|a| (a.room_code.as_str(), a.student_count))
            .collect();
        assert!(rooms.values().all(|&n| n == 30));
        assert!(rooms.contains_key("TP101") && rooms.contains_key("TP1508"));
    }
}
