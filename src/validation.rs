//! Input validation for scheduling requests.
//!
//! Checks structural integrity of the catalog and of subject requests
//! before any search runs. Detects:
//! - Duplicate codes (rooms, invigilators, departments, batch subjects)
//! - Empty codes
//! - Rooms that seat nobody
//! - Subjects with no students or an unknown department
//!
//! All checks collect every problem found rather than stopping at the first.

use std::collections::HashSet;

use crate::catalog::CatalogSnapshot;
use crate::models::Subject;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Code of the offending entity (empty when the code itself is missing).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same code.
    DuplicateId,
    /// An entity has an empty code.
    EmptyCode,
    /// A room with an explicit capacity of zero.
    ZeroCapacity,
    /// A subject with no students.
    ZeroStudents,
    /// A subject references a department that doesn't exist.
    UnknownDepartment,
}

impl ValidationError {
    fn new(
        kind: ValidationErrorKind,
        entity_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            entity_id: entity_id.into(),
            message: message.into(),
        }
    }
}

fn check_codes<'a>(
    label: &str,
    codes: impl Iterator<Item = &'a str>,
    errors: &mut Vec<ValidationError>,
) {
    let mut seen = HashSet::new();
    for code in codes {
        if code.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyCode,
                "",
                format!("{label} with empty code"),
            ));
            continue;
        }
        if !seen.insert(code) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                code,
                format!("Duplicate {label} code: {code}"),
            ));
        }
    }
}

/// Validates catalog rows.
///
/// Checks:
/// 1. No empty or duplicate room codes
/// 2. No empty or duplicate invigilator codes
/// 3. No empty or duplicate department codes
/// 4. No room with an explicit capacity of zero
pub fn validate_catalog(catalog: &CatalogSnapshot) -> ValidationResult {
    let mut errors = Vec::new();

    check_codes("room", catalog.rooms.iter().map(|r| r.code.as_str()), &mut errors);
    check_codes(
        "invigilator",
        catalog.invigilators.iter().map(|i| i.code.as_str()),
        &mut errors,
    );
    check_codes(
        "department",
        catalog.departments.iter().map(|d| d.code.as_str()),
        &mut errors,
    );

    for room in &catalog.rooms {
        if room.capacity == Some(0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::ZeroCapacity,
                &room.code,
                format!("Room '{}' has zero capacity", room.code),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates one subject against the catalog.
///
/// Checks:
/// 1. Non-empty subject code
/// 2. At least one student
/// 3. Department exists in the catalog
pub fn validate_subject(subject: &Subject, catalog: &CatalogSnapshot) -> ValidationResult {
    let mut errors = Vec::new();
    collect_subject_errors(subject, catalog, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a batch of subjects: every subject individually, plus no
/// subject code appearing twice.
pub fn validate_batch(subjects: &[Subject], catalog: &CatalogSnapshot) -> ValidationResult {
    let mut errors = Vec::new();

    check_codes("subject", subjects.iter().map(|s| s.code.as_str()), &mut errors);
    for subject in subjects {
        collect_subject_errors(subject, catalog, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn collect_subject_errors(
    subject: &Subject,
    catalog: &CatalogSnapshot,
    errors: &mut Vec<ValidationError>,
) {
    if subject.code.trim().is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyCode,
            "",
            "subject with empty code",
        ));
    }
    if subject.student_count == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::ZeroStudents,
            &subject.code,
            format!("Subject '{}' has no students", subject.code),
        ));
    }
    if !catalog.has_department(&subject.department_code) {
        errors.push(ValidationError::new(
            ValidationErrorKind::UnknownDepartment,
            &subject.department_code,
            format!(
                "Subject '{}' references unknown department '{}'",
                subject.code, subject.department_code
            ),
        ));
    }
}
