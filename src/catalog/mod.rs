//! Catalog and schedule store access.
//!
//! The engine reads rooms, invigilators, departments, and the committed
//! schedule through [`CatalogStore`], and writes only through its
//! all-or-nothing `commit` / `replace` calls. Persistence itself is an
//! external collaborator; [`InMemoryStore`] is the reference store.
//!
//! A [`CatalogSnapshot`] freezes one read of the store at the start of a
//! scheduling attempt. Searches run against the snapshot only, so the
//! store is never queried mid-search.

mod memory;

pub use memory::InMemoryStore;

use chrono::NaiveDate;
use thiserror::Error;

use crate::config::EngineConfig;
use crate::models::{Assignment, Department, Invigilator, Room, Schedule, Session, Subject};
use crate::validation::{validate_catalog, ValidationResult};

/// Store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness rule rejected the write.
    #[error("store rejected write: {0}")]
    Conflict(String),

    /// The write transaction failed and was rolled back.
    #[error("transaction failed: {0}")]
    Transaction(String),
}

/// Result type alias for store calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Catalog/schedule store contract.
///
/// All calls are blocking. `commit` and `replace` must be atomic: either
/// every row is written or none is.
pub trait CatalogStore: Send + Sync {
    /// All rooms, in catalog order.
    fn list_rooms(&self) -> StoreResult<Vec<Room>>;

    /// All invigilators, in catalog order.
    fn list_invigilators(&self) -> StoreResult<Vec<Invigilator>>;

    /// All departments.
    fn list_departments(&self) -> StoreResult<Vec<Department>>;

    /// All registered subjects.
    fn list_subjects(&self) -> StoreResult<Vec<Subject>>;

    /// Every committed assignment.
    fn assignments(&self) -> StoreResult<Vec<Assignment>>;

    /// Assignments on a date, optionally for one session.
    fn assignments_for(
        &self,
        date: NaiveDate,
        session: Option<Session>,
    ) -> StoreResult<Vec<Assignment>> {
        Ok(self
            .assignments()?
            .into_iter()
            .filter(|a| a.date == date && session.map_or(true, |s| a.session == s))
            .collect())
    }

    /// A department's assignments on a date.
    fn assignments_for_department(
        &self,
        department_code: &str,
        date: NaiveDate,
    ) -> StoreResult<Vec<Assignment>> {
        Ok(self
            .assignments()?
            .into_iter()
            .filter(|a| a.date == date && a.department_code == department_code)
            .collect())
    }

    /// An invigilator's assignments on a date, any session.
    fn assignments_for_invigilator(
        &self,
        invigilator_code: &str,
        date: NaiveDate,
    ) -> StoreResult<Vec<Assignment>> {
        Ok(self
            .assignments()?
            .into_iter()
            .filter(|a| a.date == date && a.invigilator_code == invigilator_code)
            .collect())
    }

    /// Writes assignments atomically, registering unknown subjects.
    fn commit(&self, subjects: &[Subject], assignments: &[Assignment]) -> StoreResult<()>;

    /// Atomically deletes a subject's assignments and writes new ones.
    fn replace(&self, subject: &Subject, assignments: &[Assignment]) -> StoreResult<()>;
}

/// Read-only view of the catalog at the start of a scheduling attempt.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    /// Rooms in catalog order.
    pub rooms: Vec<Room>,
    /// Invigilators in catalog order.
    pub invigilators: Vec<Invigilator>,
    /// Departments.
    pub departments: Vec<Department>,
    /// Committed schedule.
    pub schedule: Schedule,
}

impl CatalogSnapshot {
    /// Reads a snapshot from the store.
    pub fn take<S: CatalogStore + ?Sized>(store: &S) -> StoreResult<Self> {
        Ok(Self {
            rooms: store.list_rooms()?,
            invigilators: store.list_invigilators()?,
            departments: store.list_departments()?,
            schedule: Schedule::from_assignments(store.assignments()?),
        })
    }

    /// Creates a snapshot with an empty schedule.
    pub fn new(
        rooms: Vec<Room>,
        invigilators: Vec<Invigilator>,
        departments: Vec<Department>,
    ) -> Self {
        Self {
            rooms,
            invigilators,
            departments,
            schedule: Schedule::new(),
        }
    }

    /// Replaces the committed schedule.
    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Whether a department exists.
    pub fn has_department(&self, code: &str) -> bool {
        self.departments.iter().any(|d| d.code == code)
    }

    /// Total seats across all rooms under the configured policy.
    pub fn total_capacity(&self, config: &EngineConfig) -> u32 {
        self.rooms.iter().map(|r| config.room_capacity(r)).sum()
    }

    /// Structural checks (duplicate codes, zero capacities, ...).
    pub fn validate(&self) -> ValidationResult {
        validate_catalog(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_from_store() {
        let store = InMemoryStore::new()
            .with_rooms(vec![Room::new("R1").with_capacity(20), Room::new("R2")])
            .with_invigilators(vec![Invigilator::new("VS1")])
            .with_departments(vec![Department::new("ECE", "Electronics")]);

        let snap = CatalogSnapshot::take(&store).unwrap();
        assert_eq!(snap.rooms.len(), 2);
        assert_eq!(snap.invigilators.len(), 1);
        assert!(snap.has_department("ECE"));
        assert!(!snap.has_department("CSE"));
        assert!(snap.schedule.is_empty());
        assert_eq!(snap.total_capacity(&EngineConfig::default()), 50);
        assert_eq!(
            snap.total_capacity(&EngineConfig::default().with_uniform_capacity(10)),
            20
        );
    }

    #[test]
    fn test_snapshot_propagates_store_errors() {
        let store = InMemoryStore::new();
        store.set_available(false);
        let err = CatalogSnapshot::take(&store).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn test_default_filtered_queries() {
        let subject = Subject::new("MA101", "MATH", 1, 10);
        let date = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap();
        let store = InMemoryStore::new()
            .with_rooms(vec![Room::new("R1")])
            .with_invigilators(vec![Invigilator::new("VS1")]);
        store
            .commit(
                std::slice::from_ref(&subject),
                &[Assignment::new(&subject, date, Session::Forenoon, "R1", "VS1", 10)],
            )
            .unwrap();

        assert_eq!(store.assignments_for(date, None).unwrap().len(), 1);
        assert!(store
            .assignments_for(date, Some(Session::Afternoon))
            .unwrap()
            .is_empty());
        assert_eq!(store.assignments_for_department("MATH", date).unwrap().len(), 1);
        assert_eq!(store.assignments_for_invigilator("VS1", date).unwrap().len(), 1);
        assert!(store
            .assignments_for_invigilator("VS1", date.succ_opt().unwrap())
            .unwrap()
            .is_empty());
    }
}
