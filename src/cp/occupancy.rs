//! Incremental occupancy index over a schedule.
//!
//! Answers the conflict predicates in O(1) per row and supports removal,
//! so a backtracking search can stage and unstage placements without
//! rebuilding state. Every key is reference-counted: a key is "busy"
//! while at least one staged row holds it.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use chrono::NaiveDate;

use crate::models::{Assignment, Invariant, Schedule, Session, Violation};

/// Counted occupancy of rooms, invigilators, semesters and departments.
#[derive(Debug, Clone, Default)]
pub struct Occupancy {
    rooms: HashMap<(NaiveDate, Session, String), usize>,
    invigilators: HashMap<(NaiveDate, String), usize>,
    semesters: HashMap<(NaiveDate, Session, u32), BTreeMap<String, usize>>,
    departments: HashMap<(NaiveDate, String), BTreeMap<String, usize>>,
    subjects: HashMap<String, usize>,
    invigilator_load: HashMap<String, usize>,
}

fn increment<K: Eq + Hash>(map: &mut HashMap<K, usize>, key: K) {
    *map.entry(key).or_insert(0) += 1;
}

fn decrement<K: Eq + Hash>(map: &mut HashMap<K, usize>, key: &K) {
    if let Some(n) = map.get_mut(key) {
        *n -= 1;
        if *n == 0 {
            map.remove(key);
        }
    }
}

type Members = BTreeMap<String, usize>;

fn increment_member<K: Eq + Hash>(map: &mut HashMap<K, Members>, key: K, member: &str) {
    *map.entry(key)
        .or_default()
        .entry(member.to_string())
        .or_insert(0) += 1;
}

fn decrement_member<K: Eq + Hash>(map: &mut HashMap<K, Members>, key: &K, member: &str) {
    if let Some(members) = map.get_mut(key) {
        if let Some(n) = members.get_mut(member) {
            *n -= 1;
            if *n == 0 {
                members.remove(member);
            }
        }
        if members.is_empty() {
            map.remove(key);
        }
    }
}

/// First member other than `except`.
fn other_member<'a>(members: Option<&'a BTreeMap<String, usize>>, except: &str) -> Option<&'a str> {
    members?
        .keys()
        .map(String::as_str)
        .find(|code| *code != except)
}

impl Occupancy {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes every assignment of a schedule.
    pub fn from_schedule(schedule: &Schedule) -> Self {
        let mut occ = Self::new();
        for a in &schedule.assignments {
            occ.add(a);
        }
        occ
    }

    /// Stages one assignment.
    pub fn add(&mut self, a: &Assignment) {
        increment(&mut self.rooms, (a.date, a.session, a.room_code.clone()));
        increment(&mut self.invigilators, (a.date, a.invigilator_code.clone()));
        increment_member(&mut self.semesters, (a.date, a.session, a.semester), &a.subject_code);
        increment_member(
            &mut self.departments,
            (a.date, a.department_code.clone()),
            &a.subject_code,
        );
        increment(&mut self.subjects, a.subject_code.clone());
        increment(&mut self.invigilator_load, a.invigilator_code.clone());
    }

    /// Unstages one assignment previously added.
    pub fn remove(&mut self, a: &Assignment) {
        decrement(&mut self.rooms, &(a.date, a.session, a.room_code.clone()));
        decrement(&mut self.invigilators, &(a.date, a.invigilator_code.clone()));
        decrement_member(&mut self.semesters, &(a.date, a.session, a.semester), &a.subject_code);
        decrement_member(
            &mut self.departments,
            &(a.date, a.department_code.clone()),
            &a.subject_code,
        );
        decrement(&mut self.subjects, &a.subject_code);
        decrement(&mut self.invigilator_load, &a.invigilator_code);
    }

    /// Stages a set of assignments.
    pub fn add_all(&mut self, rows: &[Assignment]) {
        for a in rows {
            self.add(a);
        }
    }

    /// Unstages a set of assignments.
    pub fn remove_all(&mut self, rows: &[Assignment]) {
        for a in rows {
            self.remove(a);
        }
    }

    /// Whether no assignment holds the room at (date, session).
    #[inline]
    pub fn is_room_free(&self, date: NaiveDate, session: Session, room_code: &str) -> bool {
        !self.rooms.contains_key(&(date, session, room_code.to_string()))
    }

    /// Whether the invigilator has no assignment on the date, in any session.
    #[inline]
    pub fn is_invigilator_free(&self, date: NaiveDate, invigilator_code: &str) -> bool {
        !self.invigilators.contains_key(&(date, invigilator_code.to_string()))
    }

    /// Another subject of `semester` already sitting at (date, session).
    pub fn semester_clash(
        &self,
        date: NaiveDate,
        session: Session,
        semester: u32,
        subject_code: &str,
    ) -> Option<&str> {
        other_member(self.semesters.get(&(date, session, semester)), subject_code)
    }

    /// Another subject of the department already examined on the date.
    pub fn department_exam(
        &self,
        date: NaiveDate,
        department_code: &str,
        subject_code: &str,
    ) -> Option<&str> {
        other_member(
            self.departments.get(&(date, department_code.to_string())),
            subject_code,
        )
    }

    /// Whether the subject has staged assignments.
    pub fn is_subject_placed(&self, subject_code: &str) -> bool {
        self.subjects.contains_key(subject_code)
    }

    /// Total staged assignments of an invigilator, all dates.
    pub fn invigilator_load(&self, invigilator_code: &str) -> usize {
        self.invigilator_load
            .get(invigilator_code)
            .copied()
            .unwrap_or(0)
    }

    /// Checks rows against the index, including conflicts among the rows
    /// themselves. The index is left unchanged.
    pub fn check_rows(&mut self, rows: &[Assignment]) -> Vec<Violation> {
        let mut violations = Vec::new();

        let mut seen_subjects: Vec<&str> = Vec::new();
        for a in rows {
            let code = a.subject_code.as_str();
            if seen_subjects.contains(&code) {
                continue;
            }
            seen_subjects.push(code);
            if self.is_subject_placed(code) {
                violations.push(Violation::new(
                    Invariant::SubjectAlreadyScheduled,
                    code,
                    format!("subject '{code}' already has committed assignments"),
                ));
            }
        }

        for (i, a) in rows.iter().enumerate() {
            if let Some(first) = rows[..i].iter().find(|b| b.subject_code == a.subject_code) {
                if first.slot() != a.slot() {
                    violations.push(Violation::new(
                        Invariant::SubjectAlreadyScheduled,
                        &a.subject_code,
                        format!(
                            "subject '{}' split across {} {} and {} {}",
                            a.subject_code, first.date, first.session, a.date, a.session
                        ),
                    ));
                }
            }
            self.check_row(a, &mut violations);
            self.add(a);
        }
        self.remove_all(rows);

        violations
    }

    fn check_row(&self, a: &Assignment, out: &mut Vec<Violation>) {
        if !self.is_room_free(a.date, a.session, &a.room_code) {
            out.push(Violation::new(
                Invariant::RoomDoubleBooked,
                &a.room_code,
                format!("room '{}' is already booked on {} {}", a.room_code, a.date, a.session),
            ));
        }
        if !self.is_invigilator_free(a.date, &a.invigilator_code) {
            out.push(Violation::new(
                Invariant::InvigilatorDoubleBooked,
                &a.invigilator_code,
                format!(
                    "invigilator '{}' already works on {}",
                    a.invigilator_code, a.date
                ),
            ));
        }
        if let Some(other) = self.semester_clash(a.date, a.session, a.semester, &a.subject_code) {
            out.push(Violation::new(
                Invariant::SemesterClash,
                &a.subject_code,
                format!(
                    "semester {} already sits '{}' on {} {}",
                    a.semester, other, a.date, a.session
                ),
            ));
        }
        if let Some(other) = self.department_exam(a.date, &a.department_code, &a.subject_code) {
            out.push(Violation::new(
                Invariant::DepartmentSameDay,
                &a.department_code,
                format!(
                    "department '{}' already sits '{}' on {}",
                    a.department_code, other, a.date
                ),
            ));
        }
    }
}
