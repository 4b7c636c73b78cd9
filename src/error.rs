//! Error types for the scheduling engine.

use thiserror::Error;

use crate::catalog::StoreError;
use crate::config::ConfigError;
use crate::models::Invariant;
use crate::validation::{ValidationError, ValidationErrorKind};

/// Broad classification of a [`ScheduleError`].
///
/// Callers decide how to react by kind: fix the input, widen the window or
/// add resources, retry from a fresh snapshot, or give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad request; rejected before any search.
    Input,
    /// Not a fault: the catalog cannot host the request.
    ResourceExhaustion,
    /// The schedule changed under the candidate; retry the whole attempt.
    Conflict,
    /// Persistence failed; nothing was committed.
    Store,
}

/// Main error type for engine operations.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Subject facts are unusable (zero students, empty code, ...).
    #[error("invalid subject '{code}': {reason}")]
    InvalidSubject { code: String, reason: String },

    /// The date window is inverted.
    #[error("invalid date window: {0}")]
    InvalidWindow(String),

    /// The subject's department is not in the catalog.
    #[error("unknown department '{0}'")]
    UnknownDepartment(String),

    /// The subject already has committed assignments.
    #[error("subject '{0}' is already scheduled")]
    AlreadyScheduled(String),

    /// A batch request is malformed (empty, duplicate subjects, ...).
    #[error("invalid batch: {0}")]
    InvalidBatch(String),

    /// Catalog data failed validation.
    #[error("catalog validation failed: {}", format_validation(.0))]
    Validation(Vec<ValidationError>),

    /// A constraint variable has no candidate values.
    #[error("empty domain for {0}")]
    EmptyDomain(&'static str),

    /// The whole room pool cannot seat the subject.
    #[error("subject '{code}' needs {needed} seats but the room pool seats {available}")]
    InsufficientCapacity {
        code: String,
        needed: u32,
        available: u32,
    },

    /// The window contains no weekday.
    #[error("date window contains no exam day (Monday-Friday)")]
    EmptyWindow,

    /// No (date, session) in the window can host the subject.
    #[error("no feasible slot for subject '{0}' in the requested window")]
    NoFeasibleSlot(String),

    /// The batch has no joint solution (or the search budget ran out).
    #[error("batch is unsatisfiable (budget exhausted: {budget_exhausted})")]
    Unsatisfiable { budget_exhausted: bool },

    /// The live schedule rejects the candidate at commit time.
    #[error("commit rejected, schedule changed: {}", format_invariants(.violations))]
    ConcurrentConflict { violations: Vec<Invariant> },

    /// The engine configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ScheduleError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScheduleError::InvalidSubject { .. }
            | ScheduleError::InvalidWindow(_)
            | ScheduleError::UnknownDepartment(_)
            | ScheduleError::AlreadyScheduled(_)
            | ScheduleError::InvalidBatch(_)
            | ScheduleError::Validation(_)
            | ScheduleError::EmptyDomain(_)
            | ScheduleError::Config(_) => ErrorKind::Input,
            ScheduleError::InsufficientCapacity { .. }
            | ScheduleError::EmptyWindow
            | ScheduleError::NoFeasibleSlot(_)
            | ScheduleError::Unsatisfiable { .. } => ErrorKind::ResourceExhaustion,
            ScheduleError::ConcurrentConflict { .. } => ErrorKind::Conflict,
            ScheduleError::Store(StoreError::Conflict(_)) => ErrorKind::Conflict,
            ScheduleError::Store(_) => ErrorKind::Store,
        }
    }

    /// Maps subject/batch validation failures to the matching request
    /// error. The first problem found decides the variant.
    pub fn from_request_errors(errors: Vec<ValidationError>) -> Self {
        let Some(first) = errors.first() else {
            return ScheduleError::Validation(errors);
        };
        match first.kind {
            ValidationErrorKind::ZeroStudents | ValidationErrorKind::EmptyCode => {
                ScheduleError::InvalidSubject {
                    code: first.entity_id.clone(),
                    reason: first.message.clone(),
                }
            }
            ValidationErrorKind::UnknownDepartment => {
                ScheduleError::UnknownDepartment(first.entity_id.clone())
            }
            ValidationErrorKind::DuplicateId => ScheduleError::InvalidBatch(first.message.clone()),
            ValidationErrorKind::ZeroCapacity => ScheduleError::Validation(errors),
        }
    }

    /// Whether retrying from a fresh snapshot may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
}

fn format_invariants(violations: &[Invariant]) -> String {
    violations
        .iter()
        .map(Invariant::name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, ScheduleError>;
