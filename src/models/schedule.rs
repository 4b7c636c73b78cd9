//! Schedule (solution) model.
//!
//! A schedule is the set of committed assignments. One assignment places
//! part of a subject's students into one room under one invigilator at a
//! (date, session). A subject split across three rooms has three rows,
//! all sharing the same date and session.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Session, Subject};

/// A complete exam schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Committed assignments, in insertion order.
    pub assignments: Vec<Assignment>,
}

/// One room of one exam.
///
/// Subject title, semester, and department are denormalized from the
/// subject row so conflict checks need no joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Subject being examined.
    pub subject_code: String,
    /// Subject title.
    #[serde(default)]
    pub title: String,
    /// Owning department of the subject.
    pub department_code: String,
    /// Semester of the students.
    pub semester: u32,
    /// Exam date.
    pub date: NaiveDate,
    /// Exam session.
    pub session: Session,
    /// Room used.
    pub room_code: String,
    /// Invigilator supervising the room.
    pub invigilator_code: String,
    /// Students seated in this room.
    pub student_count: u32,
}

/// A rule broken by a candidate placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Which invariant was broken.
    pub invariant: Invariant,
    /// Offending entity (room, invigilator, subject or department code).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
}

/// Schedule invariants, in checking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Invariant {
    /// Two assignments share (date, session, room).
    RoomDoubleBooked,
    /// An invigilator works twice on the same date (any session).
    InvigilatorDoubleBooked,
    /// Two subjects of one semester share (date, session).
    SemesterClash,
    /// A department has two different subjects on one date.
    DepartmentSameDay,
    /// Room shares do not add up to the subject size or exceed a room cap.
    CapacitySplit,
    /// The subject already has committed assignments.
    SubjectAlreadyScheduled,
    /// A value lies outside its variable's domain (unknown room, weekend, ...).
    OutOfDomain,
}

impl Invariant {
    /// Stable identifier used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Invariant::RoomDoubleBooked => "room_double_booked",
            Invariant::InvigilatorDoubleBooked => "invigilator_double_booked",
            Invariant::SemesterClash => "semester_clash",
            Invariant::DepartmentSameDay => "department_same_day",
            Invariant::CapacitySplit => "capacity_split",
            Invariant::SubjectAlreadyScheduled => "subject_already_scheduled",
            Invariant::OutOfDomain => "out_of_domain",
        }
    }
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Assignment {
    /// Creates an assignment for `subject` in one room.
    pub fn new(
        subject: &Subject,
        date: NaiveDate,
        session: Session,
        room_code: impl Into<String>,
        invigilator_code: impl Into<String>,
        student_count: u32,
    ) -> Self {
        Self {
            subject_code: subject.code.clone(),
            title: subject.title.clone(),
            department_code: subject.department_code.clone(),
            semester: subject.semester,
            date,
            session,
            room_code: room_code.into(),
            invigilator_code: invigilator_code.into(),
            student_count,
        }
    }

    /// The (date, session) slot.
    #[inline]
    pub fn slot(&self) -> (NaiveDate, Session) {
        (self.date, self.session)
    }
}

impl Violation {
    /// Creates a violation.
    pub fn new(
        invariant: Invariant,
        entity_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            invariant,
            entity_id: entity_id.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.invariant, self.entity_id, self.message)
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps existing assignments.
    pub fn from_assignments(assignments: Vec<Assignment>) -> Self {
        Self { assignments }
    }

    /// Adds an assignment.
    pub fn add_assignment(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    /// Appends all assignments of another schedule.
    pub fn extend(&mut self, other: Schedule) {
        self.assignments.extend(other.assignments);
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// Whether the schedule has no assignments.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Distinct subject codes, sorted.
    pub fn subject_codes(&self) -> BTreeSet<&str> {
        self.assignments
            .iter()
            .map(|a| a.subject_code.as_str())
            .collect()
    }

    /// Number of distinct subjects.
    pub fn exam_count(&self) -> usize {
        self.subject_codes().len()
    }

    /// Whether a subject has any assignment.
    pub fn contains_subject(&self, subject_code: &str) -> bool {
        self.assignments
            .iter()
            .any(|a| a.subject_code == subject_code)
    }

    /// All assignments of a subject.
    pub fn assignments_for_subject(&self, subject_code: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.subject_code == subject_code)
            .collect()
    }

    /// Assignments on a date, optionally restricted to one session.
    pub fn assignments_for(&self, date: NaiveDate, session: Option<Session>) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.date == date && session.map_or(true, |s| a.session == s))
            .collect()
    }

    /// A department's assignments on a date.
    pub fn assignments_for_department(
        &self,
        department_code: &str,
        date: NaiveDate,
    ) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.date == date && a.department_code == department_code)
            .collect()
    }

    /// An invigilator's assignments on a date (any session).
    pub fn assignments_for_invigilator(
        &self,
        invigilator_code: &str,
        date: NaiveDate,
    ) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.date == date && a.invigilator_code == invigilator_code)
            .collect()
    }

    /// Total students seated for a subject.
    pub fn students_for_subject(&self, subject_code: &str) -> u32 {
        self.assignments
            .iter()
            .filter(|a| a.subject_code == subject_code)
            .map(|a| a.student_count)
            .sum()
    }

    /// Number of assignments per invigilator.
    pub fn invigilator_loads(&self) -> BTreeMap<&str, usize> {
        let mut loads = BTreeMap::new();
        for a in &self.assignments {
            *loads.entry(a.invigilator_code.as_str()).or_insert(0) += 1;
        }
        loads
    }

    /// A copy without the given subject's assignments.
    pub fn without_subject(&self, subject_code: &str) -> Schedule {
        Schedule::from_assignments(
            self.assignments
                .iter()
                .filter(|a| a.subject_code != subject_code)
                .cloned()
                .collect(),
        )
    }

    /// Sorts by date, session (FN first), then room code.
    pub fn sort(&mut self) {
        self.assignments.sort_by(|a, b| {
            (a.date, a.session, &a.room_code).cmp(&(b.date, b.session, &b.room_code))
        });
    }

    /// A sorted copy (see [`Schedule::sort`]).
    pub fn sorted(&self) -> Schedule {
        let mut s = self.clone();
        s.sort();
        s
    }
}
