//! Subjects (exams) and the departments that own them.

use serde::{Deserialize, Serialize};

/// A faculty unit. Each department sits at most one exam per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// Unique department code (e.g. "ECE").
    pub code: String,
    /// Display name.
    pub name: String,
}

impl Department {
    /// Creates a department.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// A subject whose exam must be placed.
///
/// Students sitting the exam belong to one semester of one department;
/// that pair drives the semester-clash and one-exam-per-day rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Unique subject code (e.g. "21ECE208J").
    pub code: String,
    /// Subject title.
    pub title: String,
    /// Semester of the students sitting the exam.
    pub semester: u32,
    /// Owning department code.
    pub department_code: String,
    /// Number of students sitting the exam.
    pub student_count: u32,
}

impl Subject {
    /// Creates a subject with an empty title.
    pub fn new(
        code: impl Into<String>,
        department_code: impl Into<String>,
        semester: u32,
        student_count: u32,
    ) -> Self {
        Self {
            code: code.into(),
            title: String::new(),
            semester,
            department_code: department_code.into(),
            student_count,
        }
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Rooms needed when every room seats `per_room` students.
    ///
    /// Returns 0 for a zero cap; callers validate caps beforehand.
    pub fn rooms_needed(&self, per_room: u32) -> u32 {
        if per_room == 0 {
            return 0;
        }
        self.student_count.div_ceil(per_room)
    }
}
