//! Built-in ordering rules.
//!
//! All three read counts from the [`OrderingContext`]; a subject missing
//! from a map counts as zero.

use std::collections::HashMap;

use super::{OrderingContext, OrderingRule, RuleScore};
use crate::models::Subject;

fn negated(map: &HashMap<String, usize>, code: &str) -> RuleScore {
    let n = map.get(code).copied().unwrap_or(0);
    -(i64::try_from(n).unwrap_or(i64::MAX))
}

/// Most rooms needed first.
///
/// Large subjects have the fewest slots with enough free rooms.
#[derive(Debug, Clone, Copy)]
pub struct MostRooms;

impl OrderingRule for MostRooms {
    fn name(&self) -> &'static str {
        "MOST_ROOMS"
    }

    fn evaluate(&self, subject: &Subject, context: &OrderingContext) -> RuleScore {
        negated(&context.rooms_needed, &subject.code)
    }
}

/// Most same-semester subjects in the batch first.
#[derive(Debug, Clone, Copy)]
pub struct SemesterPeers;

impl OrderingRule for SemesterPeers {
    fn name(&self) -> &'static str {
        "SEMESTER_PEERS"
    }

    fn evaluate(&self, subject: &Subject, context: &OrderingContext) -> RuleScore {
        negated(&context.semester_peers, &subject.code)
    }
}

/// Most same-department subjects in the batch first.
#[derive(Debug, Clone, Copy)]
pub struct DepartmentPeers;

impl OrderingRule for DepartmentPeers {
    fn name(&self) -> &'static str {
        "DEPARTMENT_PEERS"
    }

    fn evaluate(&self, subject: &Subject, context: &OrderingContext) -> RuleScore {
        negated(&context.department_peers, &subject.code)
    }
}
