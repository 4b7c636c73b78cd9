//! Constraint model for exam placement.
//!
//! Declares, for a set of subjects, the scheduling variables (date,
//! session, room set, invigilator set) and the constraints between them,
//! and decides whether a candidate placement is consistent with a
//! schedule. Both searches and the commit step use this module, so the
//! conflict rules exist exactly once.
//!
//! Constraints are plain data ([`ModelConstraint`]): a scope (one subject
//! or a pair) plus the [`Invariant`] it encodes. The declared list
//! describes the graph (the ordering rules read peer degrees from it);
//! it is not the evaluator. Candidates are checked through an
//! [`Occupancy`] index, which also covers rows already committed by
//! subjects outside the model.
//!
//! # Reference
//! - Russell & Norvig (2020), "Artificial Intelligence: A Modern Approach", Ch. 6
//! - Schaerf (1999), "A Survey of Automated Timetabling"

mod capacity;
mod occupancy;

pub use capacity::{room_options, rooms_needed, select_rooms, split_students};
pub use occupancy::Occupancy;

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{Result, ScheduleError};
use crate::models::{
    Assignment, Invariant, Invigilator, Room, Schedule, Session, Subject, Violation,
};

/// A proposed placement of one subject: one row per room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// The subject being placed.
    pub subject: Subject,
    /// One assignment per room, all at the same (date, session).
    pub assignments: Vec<Assignment>,
}

impl Candidate {
    /// Creates a candidate.
    pub fn new(subject: Subject, assignments: Vec<Assignment>) -> Self {
        Self {
            subject,
            assignments,
        }
    }

    /// The (date, session) of the first row.
    pub fn slot(&self) -> Option<(NaiveDate, Session)> {
        self.assignments.first().map(Assignment::slot)
    }

    /// Number of rooms used.
    pub fn room_count(&self) -> usize {
        self.assignments.len()
    }

    /// Converts into a schedule holding only this placement.
    pub fn into_schedule(self) -> Schedule {
        Schedule::from_assignments(self.assignments)
    }
}

/// Which variable of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Date,
    Session,
    Rooms,
    Invigilators,
}

/// A decision variable of one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variable {
    /// Index of the subject in the model.
    pub subject: usize,
    /// Which decision.
    pub kind: VariableKind,
    /// Number of candidate values (rooms/invigilators: pool size).
    pub domain_size: usize,
}

/// Subjects a constraint ranges over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintScope {
    /// A constraint on one subject's own variables.
    Subject(usize),
    /// A constraint between two subjects (`first < second`).
    Pair(usize, usize),
}

/// A declared constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelConstraint {
    /// Subjects involved.
    pub scope: ConstraintScope,
    /// Rule enforced.
    pub invariant: Invariant,
}

/// Variables, domains and constraints for a set of subjects.
#[derive(Debug, Clone)]
pub struct ConstraintModel {
    subjects: Vec<Subject>,
    dates: Vec<NaiveDate>,
    sessions: Vec<Session>,
    rooms: Vec<Room>,
    invigilators: Vec<Invigilator>,
    variables: Vec<Variable>,
    constraints: Vec<ModelConstraint>,
    capacities: HashMap<String, u32>,
}

impl ConstraintModel {
    /// Builds the model.
    ///
    /// Creates four variables per subject, a capacity constraint per
    /// subject, and for every pair of subjects:
    /// - room and invigilator exclusivity
    /// - semester clash, if both share a semester
    /// - one exam per department per day, if both share a department
    ///
    /// Room seat limits default to [`EngineConfig::default`]; see
    /// [`ConstraintModel::with_config`].
    ///
    /// # Errors
    /// [`ScheduleError::EmptyDomain`] if any domain is empty.
    pub fn build(
        subjects: &[Subject],
        dates: &[NaiveDate],
        sessions: &[Session],
        rooms: &[Room],
        invigilators: &[Invigilator],
    ) -> Result<Self> {
        if dates.is_empty() {
            return Err(ScheduleError::EmptyDomain("date"));
        }
        if sessions.is_empty() {
            return Err(ScheduleError::EmptyDomain("session"));
        }
        if rooms.is_empty() {
            return Err(ScheduleError::EmptyDomain("room"));
        }
        if invigilators.is_empty() {
            return Err(ScheduleError::EmptyDomain("invigilator"));
        }

        let mut variables = Vec::with_capacity(subjects.len() * 4);
        let mut constraints = Vec::new();

        for i in 0..subjects.len() {
            for (kind, domain_size) in [
                (VariableKind::Date, dates.len()),
                (VariableKind::Session, sessions.len()),
                (VariableKind::Rooms, rooms.len()),
                (VariableKind::Invigilators, invigilators.len()),
            ] {
                variables.push(Variable {
                    subject: i,
                    kind,
                    domain_size,
                });
            }
            constraints.push(ModelConstraint {
                scope: ConstraintScope::Subject(i),
                invariant: Invariant::CapacitySplit,
            });
        }

        for i in 0..subjects.len() {
            for j in (i + 1)..subjects.len() {
                let scope = ConstraintScope::Pair(i, j);
                let mut pair = vec![
                    Invariant::RoomDoubleBooked,
                    Invariant::InvigilatorDoubleBooked,
                ];
                if subjects[i].semester == subjects[j].semester {
                    pair.push(Invariant::SemesterClash);
                }
                if subjects[i].department_code == subjects[j].department_code {
                    pair.push(Invariant::DepartmentSameDay);
                }
                constraints.extend(
                    pair.into_iter()
                        .map(|invariant| ModelConstraint { scope, invariant }),
                );
            }
        }

        let model = Self {
            subjects: subjects.to_vec(),
            dates: dates.to_vec(),
            sessions: sessions.to_vec(),
            rooms: rooms.to_vec(),
            invigilators: invigilators.to_vec(),
            variables,
            constraints,
            capacities: HashMap::new(),
        };
        Ok(model.with_config(&EngineConfig::default()))
    }

    /// Applies the configured room seat limits.
    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.capacities = self
            .rooms
            .iter()
            .map(|r| (r.code.clone(), config.room_capacity(r)))
            .collect();
        self
    }

    /// Subjects in model order.
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// Date domain, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Session domain in search order.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Room domain in catalog order.
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Invigilator domain in catalog order.
    pub fn invigilators(&self) -> &[Invigilator] {
        &self.invigilators
    }

    /// All variables.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// All declared constraints.
    ///
    /// Graph metadata only: checks run through [`Occupancy`], which
    /// reports exactly the pair invariants declared here for any two
    /// model subjects.
    pub fn constraints(&self) -> &[ModelConstraint] {
        &self.constraints
    }

    /// Seat limit of a room in the domain.
    pub fn room_capacity(&self, room_code: &str) -> Option<u32> {
        self.capacities.get(room_code).copied()
    }

    /// Number of other subjects linked to `subject` by `invariant`.
    pub fn peer_count(&self, subject: usize, invariant: Invariant) -> usize {
        self.constraints
            .iter()
            .filter(|c| c.invariant == invariant)
            .filter(|c| match c.scope {
                ConstraintScope::Pair(a, b) => a == subject || b == subject,
                ConstraintScope::Subject(_) => false,
            })
            .count()
    }

    /// Invariants violated by placing `candidate` into `existing`, in
    /// invariant order without repeats. Empty means feasible.
    pub fn violations(&self, candidate: &Candidate, existing: &Schedule) -> Vec<Invariant> {
        let mut invariants: Vec<Invariant> = self
            .conflicts(candidate, existing)
            .into_iter()
            .map(|v| v.invariant)
            .collect();
        invariants.sort();
        invariants.dedup();
        invariants
    }

    /// Detailed violations of placing `candidate` into `existing`.
    pub fn conflicts(&self, candidate: &Candidate, existing: &Schedule) -> Vec<Violation> {
        let mut occupancy = Occupancy::from_schedule(existing);
        self.conflicts_with(candidate, &mut occupancy)
    }

    /// Like [`ConstraintModel::conflicts`], against a prepared index.
    /// The index is left unchanged.
    pub fn conflicts_with(
        &self,
        candidate: &Candidate,
        occupancy: &mut Occupancy,
    ) -> Vec<Violation> {
        let mut violations = self.domain_violations(candidate);
        violations.extend(self.capacity_violations(candidate));
        violations.extend(occupancy.check_rows(&candidate.assignments));
        violations.sort_by_key(|v| v.invariant);
        violations
    }

    fn domain_violations(&self, candidate: &Candidate) -> Vec<Violation> {
        let dates: HashSet<&NaiveDate> = self.dates.iter().collect();
        let mut out = Vec::new();

        for a in &candidate.assignments {
            if a.subject_code != candidate.subject.code {
                out.push(Violation::new(
                    Invariant::OutOfDomain,
                    &a.subject_code,
                    format!(
                        "row for '{}' in placement of '{}'",
                        a.subject_code, candidate.subject.code
                    ),
                ));
            }
            if a.semester != candidate.subject.semester
                || a.department_code != candidate.subject.department_code
            {
                out.push(Violation::new(
                    Invariant::OutOfDomain,
                    &a.subject_code,
                    "row does not match the subject's semester or department",
                ));
            }
            if !dates.contains(&a.date) {
                out.push(Violation::new(
                    Invariant::OutOfDomain,
                    a.date.to_string(),
                    format!("date {} is not an allowed exam date", a.date),
                ));
            }
            if !self.sessions.contains(&a.session) {
                out.push(Violation::new(
                    Invariant::OutOfDomain,
                    a.session.code(),
                    format!("session {} is not allowed", a.session),
                ));
            }
            if !self.capacities.contains_key(&a.room_code) {
                out.push(Violation::new(
                    Invariant::OutOfDomain,
                    &a.room_code,
                    format!("unknown room '{}'", a.room_code),
                ));
            }
            if !self.invigilators.iter().any(|i| i.code == a.invigilator_code) {
                out.push(Violation::new(
                    Invariant::OutOfDomain,
                    &a.invigilator_code,
                    format!("unknown invigilator '{}'", a.invigilator_code),
                ));
            }
        }
        out
    }

    fn capacity_violations(&self, candidate: &Candidate) -> Vec<Violation> {
        let mut out = Vec::new();
        let subject = &candidate.subject;

        let seated: u64 = candidate
            .assignments
            .iter()
            .map(|a| u64::from(a.student_count))
            .sum();
        if seated != u64::from(subject.student_count) {
            out.push(Violation::new(
                Invariant::CapacitySplit,
                &subject.code,
                format!(
                    "rooms seat {seated} students but '{}' has {}",
                    subject.code, subject.student_count
                ),
            ));
        }

        for a in &candidate.assignments {
            if let Some(cap) = self.room_capacity(&a.room_code) {
                if a.student_count > cap {
                    out.push(Violation::new(
                        Invariant::CapacitySplit,
                        &a.room_code,
                        format!(
                            "{} students exceed room '{}' cap of {cap}",
                            a.student_count, a.room_code
                        ),
                    ));
                }
            }
        }
        out
    }
}
