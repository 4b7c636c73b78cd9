//! In-memory reference store.
//!
//! Holds the catalog and schedule behind a `parking_lot::RwLock`. Writes
//! enforce the same uniqueness keys a relational schema would declare:
//! one assignment per (date, session, room) and one invigilator per
//! date. A rejected write leaves the state untouched.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use parking_lot::RwLock;
use tracing::debug;

use super::{CatalogStore, StoreError, StoreResult};
use crate::models::{Assignment, Department, Invigilator, Room, Session, Subject};

#[derive(Debug, Default)]
struct State {
    rooms: Vec<Room>,
    invigilators: Vec<Invigilator>,
    departments: Vec<Department>,
    subjects: Vec<Subject>,
    assignments: Vec<Assignment>,
}

/// Thread-safe in-memory catalog and schedule.
///
/// # Example
///
/// ```
/// use exam_schedule::catalog::{CatalogStore, InMemoryStore};
/// use exam_schedule::models::{Department, Invigilator};
///
/// let store = InMemoryStore::new()
///     .with_standard_rooms()
///     .with_invigilators(vec![Invigilator::new("VS10001")])
///     .with_departments(vec![Department::new("ECE", "Electronics")]);
///
/// assert_eq!(store.list_rooms().unwrap().len(), 120);
/// ```
#[derive(Debug)]
pub struct InMemoryStore {
    state: RwLock<State>,
    available: AtomicBool,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Adds rooms.
    pub fn with_rooms(self, rooms: Vec<Room>) -> Self {
        self.state.write().rooms.extend(rooms);
        self
    }

    /// Adds the 120-room standard block.
    pub fn with_standard_rooms(self) -> Self {
        self.with_rooms(Room::standard_block())
    }

    /// Adds invigilators.
    pub fn with_invigilators(self, invigilators: Vec<Invigilator>) -> Self {
        self.state.write().invigilators.extend(invigilators);
        self
    }

    /// Adds departments.
    pub fn with_departments(self, departments: Vec<Department>) -> Self {
        self.state.write().departments.extend(departments);
        self
    }

    /// Registers a room; codes are unique.
    pub fn add_room(&self, room: Room) -> StoreResult<()> {
        self.ensure_available()?;
        let mut state = self.state.write();
        if state.rooms.iter().any(|r| r.code == room.code) {
            return Err(StoreError::Conflict(format!("room '{}' already exists", room.code)));
        }
        state.rooms.push(room);
        Ok(())
    }

    /// Registers an invigilator; codes are unique.
    pub fn add_invigilator(&self, invigilator: Invigilator) -> StoreResult<()> {
        self.ensure_available()?;
        let mut state = self.state.write();
        if state.invigilators.iter().any(|i| i.code == invigilator.code) {
            return Err(StoreError::Conflict(format!(
                "invigilator '{}' already exists",
                invigilator.code
            )));
        }
        state.invigilators.push(invigilator);
        Ok(())
    }

    /// Registers a department; codes are unique.
    pub fn add_department(&self, department: Department) -> StoreResult<()> {
        self.ensure_available()?;
        let mut state = self.state.write();
        if state.departments.iter().any(|d| d.code == department.code) {
            return Err(StoreError::Conflict(format!(
                "department '{}' already exists",
                department.code
            )));
        }
        state.departments.push(department);
        Ok(())
    }

    /// Simulates an outage: while unavailable every call fails.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store is offline".into()))
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks the uniqueness keys of `incoming` against `existing` and itself.
fn check_unique_keys(existing: &[Assignment], incoming: &[Assignment]) -> StoreResult<()> {
    let mut rooms: HashSet<(NaiveDate, Session, &str)> = existing
        .iter()
        .map(|a| (a.date, a.session, a.room_code.as_str()))
        .collect();
    let mut invigilators: HashSet<(NaiveDate, &str)> = existing
        .iter()
        .map(|a| (a.date, a.invigilator_code.as_str()))
        .collect();

    for a in incoming {
        if !rooms.insert((a.date, a.session, a.room_code.as_str())) {
            return Err(StoreError::Conflict(format!(
                "room '{}' already booked on {} {}",
                a.room_code, a.date, a.session
            )));
        }
        if !invigilators.insert((a.date, a.invigilator_code.as_str())) {
            return Err(StoreError::Conflict(format!(
                "invigilator '{}' already booked on {}",
                a.invigilator_code, a.date
            )));
        }
    }
    Ok(())
}

fn register_subject(subjects: &mut Vec<Subject>, subject: &Subject) {
    if !subjects.iter().any(|s| s.code == subject.code) {
        subjects.push(subject.clone());
    }
}

impl CatalogStore for InMemoryStore {
    fn list_rooms(&self) -> StoreResult<Vec<Room>> {
        self.ensure_available()?;
        Ok(self.state.read().rooms.clone())
    }

    fn list_invigilators(&self) -> StoreResult<Vec<Invigilator>> {
        self.ensure_available()?;
        Ok(self.state.read().invigilators.clone())
    }

    fn list_departments(&self) -> StoreResult<Vec<Department>> {
        self.ensure_available()?;
        Ok(self.state.read().departments.clone())
    }

    fn list_subjects(&self) -> StoreResult<Vec<Subject>> {
        self.ensure_available()?;
        Ok(self.state.read().subjects.clone())
    }

    fn assignments(&self) -> StoreResult<Vec<Assignment>> {
        self.ensure_available()?;
        Ok(self.state.read().assignments.clone())
    }

    fn commit(&self, subjects: &[Subject], assignments: &[Assignment]) -> StoreResult<()> {
        self.ensure_available()?;
        let mut state = self.state.write();
        check_unique_keys(&state.assignments, assignments)?;

        for subject in subjects {
            register_subject(&mut state.subjects, subject);
        }
        state.assignments.extend_from_slice(assignments);
        debug!(rows = assignments.len(), "committed assignments");
        Ok(())
    }

    fn replace(&self, subject: &Subject, assignments: &[Assignment]) -> StoreResult<()> {
        self.ensure_available()?;
        let mut state = self.state.write();
        if assignments.iter().any(|a| a.subject_code != subject.code) {
            return Err(StoreError::Transaction(format!(
                "replacement rows must all belong to '{}'",
                subject.code
            )));
        }

        let kept: Vec<Assignment> = state
            .assignments
            .iter()
            .filter(|a| a.subject_code != subject.code)
            .cloned()
            .collect();
        check_unique_keys(&kept, assignments)?;

        let removed = state.assignments.len() - kept.len();
        state.assignments = kept;
        state.assignments.extend_from_slice(assignments);
        register_subject(&mut state.subjects, subject);
        debug!(subject = %subject.code, removed, added = assignments.len(), "replaced assignments");
        Ok(())
    }
}
