//! Batch context for ordering rule evaluation.

use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::cp::{rooms_needed, ConstraintModel};
use crate::models::Invariant;

/// Per-subject difficulty measures for one batch.
///
/// Built from the constraint graph, so peer counts reflect exactly the
/// constraints the search has to satisfy.
#[derive(Debug, Clone, Default)]
pub struct OrderingContext {
    /// Rooms needed per subject (subject code → rooms).
    pub rooms_needed: HashMap<String, usize>,
    /// Batch subjects sharing the semester (subject code → count).
    pub semester_peers: HashMap<String, usize>,
    /// Batch subjects sharing the department (subject code → count).
    pub department_peers: HashMap<String, usize>,
}

impl OrderingContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the measures from a constraint model.
    ///
    /// Subjects the room pool cannot seat count as needing every room.
    pub fn from_model(model: &ConstraintModel, config: &EngineConfig) -> Self {
        let mut context = Self::new();
        for (i, subject) in model.subjects().iter().enumerate() {
            let rooms = rooms_needed(model.rooms(), subject.student_count, config)
                .unwrap_or(model.rooms().len());
            context.rooms_needed.insert(subject.code.clone(), rooms);
            context.semester_peers.insert(
                subject.code.clone(),
                model.peer_count(i, Invariant::SemesterClash),
            );
            context.department_peers.insert(
                subject.code.clone(),
                model.peer_count(i, Invariant::DepartmentSameDay),
            );
        }
        context
    }

    /// Sets rooms needed for a subject.
    pub fn with_rooms_needed(mut self, subject_code: impl Into<String>, rooms: usize) -> Self {
        self.rooms_needed.insert(subject_code.into(), rooms);
        self
    }

    /// Sets the semester peer count for a subject.
    pub fn with_semester_peers(mut self, subject_code: impl Into<String>, peers: usize) -> Self {
        self.semester_peers.insert(subject_code.into(), peers);
        self
    }

    /// Sets the department peer count for a subject.
    pub fn with_department_peers(mut self, subject_code: impl Into<String>, peers: usize) -> Self {
        self.department_peers.insert(subject_code.into(), peers);
        self
    }
}
