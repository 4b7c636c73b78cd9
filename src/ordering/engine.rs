//! Rule chain for subject ordering.

use std::sync::Arc;

use super::{rules, OrderingContext, OrderingRule, RuleScore};
use crate::models::Subject;

/// Ranks subjects by a chain of rules, then by subject code.
///
/// Rules are compared lexicographically: a later rule is consulted only
/// when every earlier rule scores two subjects equally.
///
/// # Example
/// ```
/// use exam_schedule::models::Subject;
/// use exam_schedule::ordering::{OrderingContext, RuleEngine};
///
/// let subjects = vec![
///     Subject::new("MA101", "MATH", 1, 30),
///     Subject::new("PH101", "PHY", 1, 90),
/// ];
/// let context = OrderingContext::new()
///     .with_rooms_needed("MA101", 1)
///     .with_rooms_needed("PH101", 3);
///
/// let order = RuleEngine::most_constrained_first().sort_indices(&subjects, &context);
/// assert_eq!(order, vec![1, 0]);
/// ```
#[derive(Clone)]
pub struct RuleEngine {
    rules: Vec<Arc<dyn OrderingRule>>,
}

impl RuleEngine {
    /// Creates an engine with no rules (pure code order).
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The batch solver's default: most rooms, then most semester peers,
    /// then most department peers, then subject code.
    pub fn most_constrained_first() -> Self {
        Self::new()
            .with_rule(rules::MostRooms)
            .with_rule(rules::SemesterPeers)
            .with_rule(rules::DepartmentPeers)
    }

    /// Appends a rule to the chain.
    pub fn with_rule<R: OrderingRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Names of the rules, in chain order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Sorts subjects, first-to-place first.
    ///
    /// Returns indices into `subjects`.
    pub fn sort_indices(&self, subjects: &[Subject], context: &OrderingContext) -> Vec<usize> {
        let keys: Vec<(Vec<RuleScore>, &str)> = subjects
            .iter()
            .map(|s| {
                let scores = self.rules.iter().map(|r| r.evaluate(s, context)).collect();
                (scores, s.code.as_str())
            })
            .collect();

        let mut indices: Vec<usize> = (0..subjects.len()).collect();
        indices.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
        indices
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::most_constrained_first()
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field("rules", &self.rule_names())
            .finish()
    }
}
