//! Subject ordering for the batch solver.
//!
//! Backtracking search fails fastest when the hardest subjects are placed
//! first. A [`RuleEngine`] ranks subjects by a chain of rules: each rule
//! only decides between subjects the earlier rules left tied, and the
//! subject code settles whatever remains.
//!
//! # Usage
//!
//! ```
//! use exam_schedule::ordering::{rules, RuleEngine};
//!
//! let engine = RuleEngine::new()
//!     .with_rule(rules::MostRooms)
//!     .with_rule(rules::SemesterPeers);
//! assert_eq!(engine.rule_names(), vec!["MOST_ROOMS", "SEMESTER_PEERS"]);
//! ```
//!
//! # References
//!
//! - Brélaz (1979), "New Methods to Color the Vertices of a Graph" (DSatur)
//! - Carter, Laporte & Lee (1996), "Examination Timetabling: Algorithmic
//!   Strategies and Applications"

mod context;
mod engine;
pub mod rules;

pub use context::OrderingContext;
pub use engine::RuleEngine;

use crate::models::Subject;
use std::fmt::Debug;

/// Score returned by an ordering rule.
///
/// Lower scores = placed earlier.
pub type RuleScore = i64;

/// A rule that ranks how hard a subject is to place.
///
/// Rules measuring difficulty return the negated measure, so the hardest
/// subject has the lowest score.
pub trait OrderingRule: Send + Sync + Debug {
    /// Rule name (e.g., "MOST_ROOMS").
    fn name(&self) -> &'static str;

    /// Evaluates a subject given the batch context.
    fn evaluate(&self, subject: &Subject, context: &OrderingContext) -> RuleScore;
}
