//! Goal plan builder.
//!
//! Turns goal strings into scheduling-ready plans: estimated complexity and
//! criticality weights from keyword heuristics, the budget slots the goal
//! will occupy, and a strategy-dependent base priority. The keyword tables
//! are deliberately fuzzy scoring aids; they are matched over normalized
//! token sets, not reinterpreted.

use crate::domain::models::{Goal, GoalPlan, SchedulingStrategy};

/// Clause-connector tokens that indicate compound work.
const CONNECTOR_TOKENS: &[&str] = &[
    "and", "with", "then", "plus", "also", "while", "including", "across", "between",
];

/// Domain keywords that indicate intrinsically complex work.
const COMPLEXITY_KEYWORDS: &[&str] = &[
    "orchestration",
    "integration",
    "migration",
    "security",
    "distributed",
    "concurrency",
    "pipeline",
    "infrastructure",
    "observability",
    "automation",
];

/// Keywords that mark foundational, high-blast-radius work.
const CRITICALITY_STRONG: &[&str] = &[
    "foundation",
    "core",
    "platform",
    "schema",
    "migration",
    "dependency",
    "contract",
    "baseline",
];

/// Keywords that mark moderately critical cross-cutting work.
const CRITICALITY_MEDIUM: &[&str] = &[
    "orchestration",
    "integration",
    "security",
    "compliance",
    "governance",
];

/// Service for deriving scheduling plans from goals.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanBuilder {
    strategy: SchedulingStrategy,
    agent_budget: Option<u32>,
}

impl PlanBuilder {
    pub fn new(strategy: SchedulingStrategy, agent_budget: Option<u32>) -> Self {
        Self {
            strategy,
            agent_budget,
        }
    }

    /// Build one plan per goal, in submission order.
    ///
    /// `sub_unit_hints` optionally carries an explicit "target sub-unit
    /// count" per goal (parallel to `goals`); when present it overrides the
    /// free-text complexity heuristic for that goal.
    pub fn build(&self, goals: &[Goal], sub_unit_hints: &[Option<u32>]) -> Vec<GoalPlan> {
        goals
            .iter()
            .enumerate()
            .map(|(i, goal)| {
                let hint = sub_unit_hints.get(i).copied().flatten();
                self.plan_one(goal, hint)
            })
            .collect()
    }

    /// Build the plan for one goal.
    pub fn plan_one(&self, goal: &Goal, sub_unit_hint: Option<u32>) -> GoalPlan {
        let complexity_weight = complexity_weight(&goal.text, sub_unit_hint);
        let criticality_weight = criticality_weight(&goal.text);
        let scheduling_weight = scheduling_weight(complexity_weight, self.agent_budget);
        let base_priority = base_priority(
            self.strategy,
            complexity_weight,
            criticality_weight,
            goal.source_index,
        );

        GoalPlan {
            goal: goal.clone(),
            complexity_weight,
            criticality_weight,
            scheduling_weight,
            base_priority,
            wait_ticks: 0,
        }
    }
}

/// Budget slots a goal occupies while active.
///
/// `clamp(min(agent_budget, complexity), 1, agent_budget)` when a budget is
/// set; a single slot otherwise.
pub fn scheduling_weight(complexity_weight: u32, agent_budget: Option<u32>) -> u32 {
    match agent_budget {
        Some(budget) => complexity_weight.min(budget).clamp(1, budget.max(1)),
        None => 1,
    }
}

/// Estimate complexity in `1..=3`.
///
/// An explicit target sub-unit count wins: `>=5 -> 3`, `>=3 -> 2`, else 1.
/// Otherwise free text is scored: long descriptions, clause connectors, and
/// domain-complexity vocabulary each add points, and the total maps
/// `>=4 -> 3`, `>=2 -> 2`, else 1.
pub fn complexity_weight(text: &str, sub_unit_hint: Option<u32>) -> u32 {
    if let Some(hint) = sub_unit_hint {
        return if hint >= 5 {
            3
        } else if hint >= 3 {
            2
        } else {
            1
        };
    }

    let tokens = tokenize(text);
    let mut score = 0u32;

    let word_count = text.split_whitespace().count();
    if word_count >= 25 {
        score += 2;
    } else if word_count >= 12 {
        score += 1;
    }

    let connectors = text.matches(',').count()
        + tokens
            .iter()
            .filter(|t| CONNECTOR_TOKENS.contains(&t.as_str()))
            .count();
    if connectors >= 4 {
        score += 2;
    } else if connectors >= 2 {
        score += 1;
    }

    let domain_hits = tokens
        .iter()
        .filter(|t| COMPLEXITY_KEYWORDS.contains(&t.as_str()))
        .count();
    if domain_hits >= 4 {
        score += 1;
    }

    if score >= 4 {
        3
    } else if score >= 2 {
        2
    } else {
        1
    }
}

/// Estimate criticality in `1..=3` from keyword scans.
pub fn criticality_weight(text: &str) -> u32 {
    let tokens = tokenize(text);
    let strong = tokens
        .iter()
        .filter(|t| CRITICALITY_STRONG.contains(&t.as_str()))
        .count();
    let medium = tokens
        .iter()
        .filter(|t| CRITICALITY_MEDIUM.contains(&t.as_str()))
        .count();

    if strong >= 2 || (strong >= 1 && medium >= 1) {
        3
    } else if strong >= 1 || medium >= 2 {
        2
    } else {
        1
    }
}

/// Strategy-dependent static priority. Higher schedules first; later
/// insertion index always loses the tiebreak.
pub fn base_priority(
    strategy: SchedulingStrategy,
    complexity: u32,
    criticality: u32,
    index: usize,
) -> i64 {
    let index = index as i64;
    let complexity = i64::from(complexity);
    let criticality = i64::from(criticality);

    match strategy {
        SchedulingStrategy::Fifo => -index,
        SchedulingStrategy::ComplexFirst => complexity * 10_000 - index,
        SchedulingStrategy::ComplexLast => (10 - complexity) * 10_000 - index,
        SchedulingStrategy::CriticalFirst => criticality * 100_000 + complexity * 1_000 - index,
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_overrides_text() {
        assert_eq!(complexity_weight("trivial", Some(7)), 3);
        assert_eq!(complexity_weight("trivial", Some(3)), 2);
        assert_eq!(complexity_weight("trivial", Some(2)), 1);
    }

    #[test]
    fn test_short_plain_goal_is_simple() {
        assert_eq!(complexity_weight("fix the typo", None), 1);
    }

    #[test]
    fn test_long_compound_goal_is_complex() {
        let text = "Design the orchestration layer for the ingestion pipeline, \
                    integrate it with the security scanner, migrate the legacy \
                    configuration store, and wire up observability dashboards \
                    with alerting across every deployment environment";
        assert_eq!(complexity_weight(text, None), 3);
    }

    #[test]
    fn test_medium_goal() {
        // 12+ words and two connectors: score 2 -> weight 2.
        let text = "Refactor the parser and update the lexer with better spans for diagnostics output";
        assert_eq!(complexity_weight(text, None), 2);
    }

    #[test]
    fn test_criticality_tiers() {
        assert_eq!(criticality_weight("update the docs"), 1);
        assert_eq!(criticality_weight("tighten security and compliance checks"), 2);
        assert_eq!(criticality_weight("rework the core platform"), 3);
        assert_eq!(criticality_weight("schema migration for billing"), 3);
        assert_eq!(criticality_weight("baseline the integration suite"), 3);
    }

    #[test]
    fn test_scheduling_weight_clamps_to_budget() {
        assert_eq!(scheduling_weight(3, Some(2)), 2);
        assert_eq!(scheduling_weight(1, Some(8)), 1);
        assert_eq!(scheduling_weight(3, None), 1);
    }

    #[test]
    fn test_base_priority_orderings() {
        // FIFO: earlier index wins.
        assert!(
            base_priority(SchedulingStrategy::Fifo, 1, 1, 0)
                > base_priority(SchedulingStrategy::Fifo, 3, 3, 1)
        );

        // Complex-first: weight dominates index.
        assert!(
            base_priority(SchedulingStrategy::ComplexFirst, 3, 1, 9)
                > base_priority(SchedulingStrategy::ComplexFirst, 1, 1, 0)
        );

        // Complex-last inverts.
        assert!(
            base_priority(SchedulingStrategy::ComplexLast, 1, 1, 9)
                > base_priority(SchedulingStrategy::ComplexLast, 3, 1, 0)
        );

        // Critical-first: criticality dominates complexity.
        assert!(
            base_priority(SchedulingStrategy::CriticalFirst, 1, 3, 9)
                > base_priority(SchedulingStrategy::CriticalFirst, 3, 1, 0)
        );
    }

    #[test]
    fn test_builder_assigns_weights_and_order() {
        let builder = PlanBuilder::new(SchedulingStrategy::ComplexFirst, Some(2));
        let goals = vec![Goal::new("fix typo", 0), Goal::new("fix another typo", 1)];
        let plans = builder.build(&goals, &[None, None]);

        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].goal.source_index, 0);
        assert!(plans[0].base_priority > plans[1].base_priority);
        assert_eq!(plans[0].wait_ticks, 0);
    }
}
