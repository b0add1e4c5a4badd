//! Fitness evaluation for decoded candidates.
//!
//! Four normalized terms, each in [0, 1], combined by [`FitnessWeights`].
//! Lower is better. Jobs the decoder could not place add
//! `unplaced / job_count` on top of the weighted sum so a plan that drops
//! work never beats one that places it.

use std::collections::BTreeMap;

use super::{DecodedSchedule, SchedulingProblem};
use crate::config::FitnessWeights;
use crate::models::{Priority, ScoreRecord, Slot};

/// Tolerance when comparing a community share against its quota.
const QUOTA_TOLERANCE: f64 = 1e-12;

/// Scores decoded schedules of one problem.
#[derive(Debug, Clone, Copy)]
pub struct FitnessEvaluator<'p, 'a> {
    problem: &'p SchedulingProblem<'a>,
    weights: FitnessWeights,
}

impl<'p, 'a> FitnessEvaluator<'p, 'a> {
    /// Creates an evaluator.
    pub fn new(problem: &'p SchedulingProblem<'a>, weights: FitnessWeights) -> Self {
        Self { problem, weights }
    }

    /// Weights in use.
    pub fn weights(&self) -> FitnessWeights {
        self.weights
    }

    /// Scores a decoded schedule.
    pub fn score(&self, decoded: &DecodedSchedule) -> ScoreRecord {
        let problem = self.problem;
        let horizon = f64::from(problem.horizon.max(1));
        let job_count = problem.len().max(1) as f64;

        let makespan_slots = decoded.makespan();
        let makespan = f64::from(makespan_slots) / horizon;

        let utilization = self.utilization_penalty(decoded, makespan_slots);

        let mut weighted_lateness: u64 = 0;
        let mut deadline_misses: u32 = 0;
        for (g, placement) in decoded.placed() {
            let job = problem.job(g);
            let late = job.lateness(placement.end);
            if late > 0 {
                deadline_misses += 1;
                weighted_lateness += u64::from(job.priority.weight()) * u64::from(late);
            }
        }
        let priority_violation = (weighted_lateness as f64
            / (f64::from(Priority::MAX_WEIGHT) * horizon * job_count))
            .min(1.0);

        let (fairness_deviation, over_quota) = self.fairness(decoded);

        let unplaced = decoded.unplaced.len();
        let w = self.weights;
        let total = w.makespan * makespan
            + w.utilization * utilization
            + w.priority * priority_violation
            + w.fairness * fairness_deviation
            + unplaced as f64 / job_count;

        ScoreRecord {
            total,
            makespan,
            utilization,
            priority_violation,
            fairness_deviation,
            makespan_slots,
            violated_constraints: deadline_misses + unplaced as u32 + over_quota,
        }
    }

    /// `1 − busy / available` over `[0, makespan)` on usable machines.
    fn utilization_penalty(&self, decoded: &DecodedSchedule, makespan: Slot) -> f64 {
        if makespan == 0 {
            return 0.0;
        }
        let problem = self.problem;
        let available: u64 = problem
            .calendars
            .iter()
            .zip(&problem.usable)
            .filter(|(_, usable)| **usable)
            .map(|(calendar, _)| u64::from(makespan - calendar.blocked_in_range(0, makespan)))
            .sum();
        if available == 0 {
            return 0.0;
        }
        let busy: u64 = decoded.placed().map(|(_, p)| u64::from(p.duration())).sum();
        (1.0 - busy as f64 / available as f64).clamp(0.0, 1.0)
    }

    /// Summed excess over quota and the number of communities over quota.
    fn fairness(&self, decoded: &DecodedSchedule) -> (f64, u32) {
        let quotas = &self.problem.constraints.community_quotas;
        if quotas.is_empty() {
            return (0.0, 0);
        }

        let mut per_community: BTreeMap<&str, u64> = BTreeMap::new();
        let mut total: u64 = 0;
        for (g, placement) in decoded.placed() {
            let duration = u64::from(placement.duration());
            *per_community
                .entry(self.problem.job(g).community_id.as_str())
                .or_insert(0) += duration;
            total += duration;
        }
        if total == 0 {
            return (0.0, 0);
        }

        let mut deviation = 0.0;
        let mut over = 0;
        for (community, &quota) in quotas {
            let used = per_community.get(community.as_str()).copied().unwrap_or(0);
            let excess = used as f64 / total as f64 - quota;
            if excess > QUOTA_TOLERANCE {
                deviation += excess;
                over += 1;
            }
        }
        (deviation.min(1.0), over)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feasibility::partition;
    use crate::ga::{decode, Chromosome, Gene};
    use crate::models::{ConstraintSet, Job, Machine, PatternType, PlanningHorizon};
    use crate::validation::precedence_order;

    fn score_of(
        jobs: &[Job],
        machines: &[Machine],
        constraints: &ConstraintSet,
        genes: Vec<Gene>,
        weights: FitnessWeights,
    ) -> ScoreRecord {
        let order = precedence_order(jobs).unwrap();
        let report = partition(jobs, machines, constraints, &order);
        let problem = SchedulingProblem::new(jobs, machines, constraints, &report);
        let decoded = decode(&problem, &Chromosome::new(genes));
        FitnessEvaluator::new(&problem, weights).score(&decoded)
    }

    #[test]
    fn test_two_busy_machines_of_three() {
        let jobs = vec![
            Job::new("A", "c", PatternType::Plain, 10, 10, 4),
            Job::new("B", "c", PatternType::Twill, 10, 10, 4),
        ];
        let machines = vec![
            Machine::new("M1", "c", 100, 100).with_capability(PatternType::Plain),
            Machine::new("M2", "c", 100, 100).with_capability(PatternType::Twill),
            Machine::new("M3", "c", 100, 100).with_capability(PatternType::Twill),
        ];
        let constraints = ConstraintSet::new(PlanningHorizon::new(10));
        let score = score_of(
            &jobs,
            &machines,
            &constraints,
            vec![Gene { machine: 0, start: 0 }, Gene { machine: 1, start: 0 }],
            FitnessWeights::default(),
        );

        assert!((score.utilization - 1.0 / 3.0).abs() < 1e-12);
        assert!((score.makespan - 0.4).abs() < 1e-12);
        assert_eq!(score.makespan_slots, 4);
        assert_eq!(score.priority_violation, 0.0);
        assert_eq!(score.fairness_deviation, 0.0);
        assert_eq!(score.violated_constraints, 0);
        let expected = 0.4 * 0.4 + 0.3 / 3.0;
        assert!((score.total - expected).abs() < 1e-12);
    }

    #[test]
    fn test_late_urgent_job_penalized_by_weight() {
        let jobs = vec![Job::new("A", "c", PatternType::Plain, 10, 10, 5)
            .with_deadline(3)
            .with_priority(Priority::Urgent)];
        let machines = vec![Machine::new("M1", "c", 100, 100).with_capability(PatternType::Plain)];
        let constraints = ConstraintSet::new(PlanningHorizon::new(10));
        let score = score_of(
            &jobs,
            &machines,
            &constraints,
            vec![Gene { machine: 0, start: 0 }],
            FitnessWeights::default(),
        );

        // 4 × 2 late slots / (4 × 10 × 1)
        assert!((score.priority_violation - 0.2).abs() < 1e-12);
        assert_eq!(score.violated_constraints, 1);
    }

    #[test]
    fn test_quota_excess() {
        let jobs = vec![
            Job::new("A", "north", PatternType::Plain, 10, 10, 6),
            Job::new("B", "south", PatternType::Plain, 10, 10, 2),
        ];
        let machines = vec![
            Machine::new("M1", "c", 100, 100).with_capability(PatternType::Plain),
            Machine::new("M2", "c", 100, 100).with_capability(PatternType::Plain),
        ];
        let constraints = ConstraintSet::new(PlanningHorizon::new(10))
            .with_quota("north", 0.5)
            .with_quota("south", 0.5);
        let score = score_of(
            &jobs,
            &machines,
            &constraints,
            vec![Gene { machine: 0, start: 0 }, Gene { machine: 1, start: 0 }],
            FitnessWeights::default(),
        );

        assert!((score.fairness_deviation - 0.25).abs() < 1e-12);
        assert_eq!(score.violated_constraints, 1);
    }

    #[test]
    fn test_unplaced_penalty_dominates() {
        let jobs = vec![
            Job::new("A", "c", PatternType::Plain, 10, 10, 6),
            Job::new("B", "c", PatternType::Plain, 10, 10, 6),
        ];
        let machines = vec![Machine::new("M1", "c", 100, 100).with_capability(PatternType::Plain)];
        let constraints = ConstraintSet::new(PlanningHorizon::new(10));
        let score = score_of(
            &jobs,
            &machines,
            &constraints,
            vec![Gene { machine: 0, start: 0 }, Gene { machine: 0, start: 0 }],
            FitnessWeights::default(),
        );

        assert_eq!(score.violated_constraints, 1);
        assert!(score.total >= 0.5);
    }

    #[test]
    fn test_maintenance_excluded_from_available_time() {
        let jobs = vec![Job::new("A", "c", PatternType::Plain, 10, 10, 2)];
        let machines = vec![Machine::new("M1", "c", 100, 100).with_capability(PatternType::Plain)];
        let constraints = ConstraintSet::new(PlanningHorizon::new(10)).with_maintenance("M1", 0, 2);
        let score = score_of(
            &jobs,
            &machines,
            &constraints,
            vec![Gene { machine: 0, start: 0 }],
            FitnessWeights::default(),
        );

        assert_eq!(score.makespan_slots, 4);
        assert_eq!(score.utilization, 0.0);
    }

    #[test]
    fn test_zero_weights_leave_only_penalty() {
        let jobs = vec![Job::new("A", "c", PatternType::Plain, 10, 10, 3)];
        let machines = vec![Machine::new("M1", "c", 100, 100).with_capability(PatternType::Plain)];
        let constraints = ConstraintSet::new(PlanningHorizon::new(10));
        let weights = FitnessWeights {
            makespan: 0.0,
            utilization: 0.0,
            priority: 0.0,
            fairness: 0.0,
        };
        let score = score_of(
            &jobs,
            &machines,
            &constraints,
            vec![Gene { machine: 0, start: 2 }],
            weights,
        );
        assert_eq!(score.total, 0.0);
        assert!(score.makespan > 0.0);
    }
}
