//! First-fit placement of one subject into a committed schedule.
//!
//! # Algorithm
//!
//! 1. Reject bad input (no students, inverted window, unknown department,
//!    subject already placed).
//! 2. Check the whole room pool can seat the subject.
//! 3. For each weekday in the window, for each session (FN before AN),
//!    try to build a placement in that slot ([`place_in_slot`]).
//! 4. The first slot that works wins; students are split evenly across
//!    the chosen rooms.
//!
//! The search is deterministic: the same snapshot and request always give
//! the same candidate.
//!
//! # Complexity
//! O(d * s * (r + i)) where d=dates, s=sessions, r=rooms, i=invigilators.

use chrono::NaiveDate;
use tracing::{debug, trace};

use super::build_model;
use crate::catalog::CatalogSnapshot;
use crate::config::EngineConfig;
use crate::cp::{
    room_options, select_rooms, split_students, Candidate, ConstraintModel, Occupancy,
};
use crate::error::{Result, ScheduleError};
use crate::models::{Assignment, DateWindow, Invigilator, Room, Session, Subject};
use crate::validation::validate_subject;

/// Why a (date, session) could not host a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRejection {
    /// The department already sits an exam that day.
    DepartmentBusy,
    /// A same-semester subject already sits in the slot.
    SemesterClash,
    /// Free rooms cannot seat the subject.
    NotEnoughRooms,
    /// Fewer free invigilators than chosen rooms.
    NotEnoughInvigilators,
}

/// Builds a placement of `subject` at (date, session), or says why not.
///
/// Rooms are the first free ones in catalog order whose seats cover the
/// subject; invigilators are the first free ones for the whole date, in
/// catalog order or, with load balancing, by ascending total load.
pub fn place_in_slot(
    subject: &Subject,
    date: NaiveDate,
    session: Session,
    rooms: &[Room],
    invigilators: &[Invigilator],
    occupancy: &Occupancy,
    config: &EngineConfig,
) -> std::result::Result<Vec<Assignment>, SlotRejection> {
    check_department(subject, date, occupancy)?;

    let free = free_rooms(rooms, date, session, occupancy);
    let chosen = select_rooms(free.iter().copied(), subject.student_count, config)
        .ok_or(SlotRejection::NotEnoughRooms)?;

    let eligible = eligible_invigilators(invigilators, date, occupancy, config);
    if eligible.len() < chosen.len() {
        return Err(SlotRejection::NotEnoughInvigilators);
    }

    check_semester(subject, date, session, occupancy)?;
    Ok(seat(subject, date, session, &chosen, &eligible, config))
}

/// Every placement of `subject` at (date, session) worth trying in a
/// backtracking search, one per room set from [`room_options`].
///
/// When [`place_in_slot`] succeeds, the first entry equals its result.
/// Sets needing more invigilators than are free on the date are left out.
pub fn slot_placements(
    subject: &Subject,
    date: NaiveDate,
    session: Session,
    rooms: &[Room],
    invigilators: &[Invigilator],
    occupancy: &Occupancy,
    config: &EngineConfig,
) -> std::result::Result<Vec<Vec<Assignment>>, SlotRejection> {
    check_department(subject, date, occupancy)?;

    let free = free_rooms(rooms, date, session, occupancy);
    let options = room_options(&free, subject.student_count, config);
    if options.is_empty() {
        return Err(SlotRejection::NotEnoughRooms);
    }

    let eligible = eligible_invigilators(invigilators, date, occupancy, config);
    let staffed: Vec<Vec<&Room>> = options
        .into_iter()
        .filter(|set| set.len() <= eligible.len())
        .collect();
    if staffed.is_empty() {
        return Err(SlotRejection::NotEnoughInvigilators);
    }

    check_semester(subject, date, session, occupancy)?;
    Ok(staffed
        .iter()
        .map(|chosen| seat(subject, date, session, chosen, &eligible, config))
        .collect())
}

fn check_department(
    subject: &Subject,
    date: NaiveDate,
    occupancy: &Occupancy,
) -> std::result::Result<(), SlotRejection> {
    match occupancy.department_exam(date, &subject.department_code, &subject.code) {
        Some(_) => Err(SlotRejection::DepartmentBusy),
        None => Ok(()),
    }
}

fn check_semester(
    subject: &Subject,
    date: NaiveDate,
    session: Session,
    occupancy: &Occupancy,
) -> std::result::Result<(), SlotRejection> {
    match occupancy.semester_clash(date, session, subject.semester, &subject.code) {
        Some(_) => Err(SlotRejection::SemesterClash),
        None => Ok(()),
    }
}

fn free_rooms<'a>(
    rooms: &'a [Room],
    date: NaiveDate,
    session: Session,
    occupancy: &Occupancy,
) -> Vec<&'a Room> {
    rooms
        .iter()
        .filter(|r| occupancy.is_room_free(date, session, &r.code))
        .collect()
}

fn eligible_invigilators<'a>(
    invigilators: &'a [Invigilator],
    date: NaiveDate,
    occupancy: &Occupancy,
    config: &EngineConfig,
) -> Vec<&'a Invigilator> {
    let mut eligible: Vec<&Invigilator> = invigilators
        .iter()
        .filter(|i| occupancy.is_invigilator_free(date, &i.code))
        .collect();
    if config.balance_invigilator_load {
        eligible.sort_by_key(|i| occupancy.invigilator_load(&i.code));
    }
    eligible
}

/// Pairs rooms with invigilators and splits the students.
fn seat(
    subject: &Subject,
    date: NaiveDate,
    session: Session,
    chosen: &[&Room],
    eligible: &[&Invigilator],
    config: &EngineConfig,
) -> Vec<Assignment> {
    let caps: Vec<u32> = chosen.iter().map(|r| config.room_capacity(r)).collect();
    let shares = split_students(subject.student_count, &caps);

    chosen
        .iter()
        .zip(eligible)
        .zip(shares)
        .map(|((room, invigilator), count)| {
            Assignment::new(subject, date, session, &room.code, &invigilator.code, count)
        })
        .collect()
}

/// Places one subject at the earliest feasible slot.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use exam_schedule::catalog::CatalogSnapshot;
/// use exam_schedule::config::EngineConfig;
/// use exam_schedule::models::{DateWindow, Department, Invigilator, Room, Session, Subject};
/// use exam_schedule::scheduler::IncrementalAllocator;
///
/// let snapshot = CatalogSnapshot::new(
///     vec![Room::new("TP101"), Room::new("TP102")],
///     vec![Invigilator::new("VS1"), Invigilator::new("VS2")],
///     vec![Department::new("ECE", "Electronics")],
/// );
/// let monday = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap();
/// let subject = Subject::new("EC201", "ECE", 3, 45);
///
/// let candidate = IncrementalAllocator::new(EngineConfig::default())
///     .allocate(&subject, DateWindow::single(monday), &snapshot)
///     .unwrap();
/// assert_eq!(candidate.slot(), Some((monday, Session::Forenoon)));
/// assert_eq!(candidate.room_count(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct IncrementalAllocator {
    config: EngineConfig,
}

impl IncrementalAllocator {
    /// Creates an allocator.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Finds the earliest feasible placement of `subject` in `window`.
    ///
    /// # Errors
    /// - Input: `InvalidSubject`, `InvalidWindow`, `UnknownDepartment`,
    ///   `AlreadyScheduled`
    /// - Resource exhaustion: `InsufficientCapacity`, `EmptyWindow`,
    ///   `NoFeasibleSlot`
    pub fn allocate(
        &self,
        subject: &Subject,
        window: DateWindow,
        snapshot: &CatalogSnapshot,
    ) -> Result<Candidate> {
        check_request(subject, window, snapshot)?;
        check_capacity(subject, snapshot, &self.config)?;

        let dates = window.exam_days();
        if dates.is_empty() {
            return Err(ScheduleError::EmptyWindow);
        }
        if snapshot.invigilators.is_empty() {
            return Err(ScheduleError::NoFeasibleSlot(subject.code.clone()));
        }

        debug!(
            subject = %subject.code,
            students = subject.student_count,
            days = dates.len(),
            "allocating subject"
        );

        let model = build_model(std::slice::from_ref(subject), &dates, snapshot, &self.config)?;
        let mut occupancy = Occupancy::from_schedule(&snapshot.schedule);

        for &date in model.dates() {
            for &session in model.sessions() {
                let found = self.try_slot(&model, subject, date, session, &mut occupancy);
                if let Some(candidate) = found {
                    debug!(
                        subject = %subject.code,
                        date = %date,
                        session = %session,
                        rooms = candidate.room_count(),
                        "subject placed"
                    );
                    return Ok(candidate);
                }
            }
        }

        debug!(subject = %subject.code, "no feasible slot");
        Err(ScheduleError::NoFeasibleSlot(subject.code.clone()))
    }

    fn try_slot(
        &self,
        model: &ConstraintModel,
        subject: &Subject,
        date: NaiveDate,
        session: Session,
        occupancy: &mut Occupancy,
    ) -> Option<Candidate> {
        let rows = match place_in_slot(
            subject,
            date,
            session,
            model.rooms(),
            model.invigilators(),
            occupancy,
            &self.config,
        ) {
            Ok(rows) => rows,
            Err(reason) => {
                trace!(
                    subject = %subject.code,
                    date = %date,
                    session = %session,
                    ?reason,
                    "slot skipped"
                );
                return None;
            }
        };

        let candidate = Candidate::new(subject.clone(), rows);
        let conflicts = model.conflicts_with(&candidate, occupancy);
        if conflicts.is_empty() {
            Some(candidate)
        } else {
            trace!(
                subject = %subject.code,
                date = %date,
                session = %session,
                ?conflicts,
                "slot rejected by model"
            );
            None
        }
    }
}

/// Request checks shared by single-subject operations.
pub(crate) fn check_request(
    subject: &Subject,
    window: DateWindow,
    snapshot: &CatalogSnapshot,
) -> Result<()> {
    validate_subject(subject, snapshot).map_err(ScheduleError::from_request_errors)?;
    if !window.is_valid() {
        return Err(ScheduleError::InvalidWindow(format!(
            "start {} is after end {}",
            window.start, window.end
        )));
    }
    if snapshot.schedule.contains_subject(&subject.code) {
        return Err(ScheduleError::AlreadyScheduled(subject.code.clone()));
    }
    Ok(())
}

/// Fails when the whole room pool cannot seat the subject.
pub(crate) fn check_capacity(
    subject: &Subject,
    snapshot: &CatalogSnapshot,
    config: &EngineConfig,
) -> Result<()> {
    if select_rooms(&snapshot.rooms, subject.student_count, config).is_none() {
        return Err(ScheduleError::InsufficientCapacity {
            code: subject.code.clone(),
            needed: subject.student_count,
            available: snapshot.total_capacity(config),
        });
    }
    Ok(())
}
