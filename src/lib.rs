//! Exam scheduling and resource allocation engine.
//!
//! Allocates a date, a session, one or more rooms, and one invigilator per
//! room to each examined subject, subject to hard conflict rules (no room
//! or invigilator double-booked, no semester clash, one exam per
//! department per day) and per-room seat limits.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Department`, `Subject`, `Room`,
//!   `Invigilator`, `Session`, `DateWindow`, `Assignment`, `Schedule`
//! - **`catalog`**: Store trait, in-memory store, catalog snapshots
//! - **`cp`**: Constraint model — variables, constraint graph, conflict checks
//! - **`ordering`**: Most-constrained-first subject ordering rules
//! - **`scheduler`**: First-fit allocator, backtracking batch solver,
//!   transactional commit, engine facade, KPIs
//! - **`validation`**: Input integrity checks (duplicate codes, zero
//!   students, unknown departments)
//! - **`config`**, **`error`**: Engine settings and error types
//!
//! # Architecture
//!
//! Every search reads a frozen [`catalog::CatalogSnapshot`] and consults
//! the single [`cp::ConstraintModel`]; the same model re-checks the
//! candidate at commit time against the live schedule under the engine's
//! lock. The engine never installs a `tracing` subscriber.
//!
//! # References
//!
//! - Carter, Laporte & Lee (1996), "Examination Timetabling: Algorithmic
//!   Strategies and Applications"
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Russell & Norvig (2020), "Artificial Intelligence: A Modern Approach", Ch. 6

pub mod catalog;
pub mod config;
pub mod cp;
pub mod error;
pub mod models;
pub mod ordering;
pub mod scheduler;
pub mod validation;

pub use config::EngineConfig;
pub use error::{ErrorKind, Result, ScheduleError};
pub use scheduler::ExamEngine;
