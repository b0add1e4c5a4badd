//! Schedule (committed plan) model.
//!
//! A schedule maps every placed job to a machine and a slot interval,
//! records why the remaining jobs could not be placed, and carries the
//! score and search metadata of the run that produced it. Schedules are
//! immutable values: a new run yields a new schedule with a higher
//! version instead of mutating the old one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Slot;

/// A job placed on a machine over `[start_slot, end_slot)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Placed job.
    pub job_id: String,
    /// Machine running it.
    pub machine_id: String,
    /// First occupied slot.
    pub start_slot: Slot,
    /// First slot after the job.
    pub end_slot: Slot,
}

impl Assignment {
    /// Creates a new assignment.
    pub fn new(
        job_id: impl Into<String>,
        machine_id: impl Into<String>,
        start_slot: Slot,
        end_slot: Slot,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            machine_id: machine_id.into(),
            start_slot,
            end_slot,
        }
    }

    /// Occupied slots.
    #[inline]
    pub fn duration(&self) -> Slot {
        self.end_slot - self.start_slot
    }

    /// Whether two assignments share a machine and at least one slot.
    pub fn conflicts_with(&self, other: &Self) -> bool {
        self.machine_id == other.machine_id
            && self.start_slot < other.end_slot
            && other.start_slot < self.end_slot
    }
}

/// Why a job received no placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnschedulableReason {
    /// No machine offers the pattern type with enough warp/weft capacity.
    NoCapableMachine,
    /// Capable machines exist but none is available within the horizon.
    NoAvailableMachine,
    /// No capable, available machine can finish the job inside the horizon.
    ExceedsHorizon,
    /// Placement after repair would end past the horizon.
    HorizonExceeded,
    /// A predecessor cannot be scheduled.
    PredecessorUnschedulable,
    /// Job is running, completed, failed, or cancelled.
    InactiveState,
}

/// A job left out of the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unschedulable {
    /// Job identifier.
    pub job_id: String,
    /// Reason code.
    pub reason: UnschedulableReason,
}

impl Unschedulable {
    /// Creates a new entry.
    pub fn new(job_id: impl Into<String>, reason: UnschedulableReason) -> Self {
        Self {
            job_id: job_id.into(),
            reason,
        }
    }
}

/// Optimization score of a schedule. Lower `total` is better.
///
/// Component terms are normalized to [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Weighted objective including the unplaced-job penalty.
    pub total: f64,
    /// Latest end slot / horizon length.
    pub makespan: f64,
    /// 1 − busy time / available machine time.
    pub utilization: f64,
    /// Priority-weighted lateness.
    pub priority_violation: f64,
    /// Summed excess over community quotas.
    pub fairness_deviation: f64,
    /// Latest end slot, unnormalized.
    pub makespan_slots: Slot,
    /// Deadline misses + unplaced jobs + communities over quota.
    pub violated_constraints: u32,
}

/// How the search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Best score stopped improving.
    Converged,
    /// `max_generations` reached.
    GenerationBudget,
    /// Wall-clock budget reached.
    TimeBudget,
    /// Cancelled at a generation boundary.
    Cancelled,
    /// Nothing to optimize (no schedulable jobs).
    Trivial,
}

impl Termination {
    /// Whether the search stopped on a budget rather than by converging.
    pub fn is_budget_exhausted(self) -> bool {
        matches!(self, Termination::GenerationBudget | Termination::TimeBudget)
    }
}

/// Non-fatal condition reported alongside a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleWarning {
    /// Some jobs could not be placed; the rest of the plan stands.
    PartialInfeasibility {
        /// Number of unschedulable jobs.
        jobs: usize,
    },
    /// Search stopped on its generation or time budget.
    BudgetExhausted {
        /// Generations completed.
        generations: usize,
    },
    /// Search was cancelled; the plan is the best found so far.
    Cancelled {
        /// Generations completed.
        generations: usize,
    },
}

/// A committed production plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Monotonically increasing version.
    pub version: u64,
    /// Placed jobs, ordered by job identifier.
    pub assignments: Vec<Assignment>,
    /// Score of the plan.
    pub score: ScoreRecord,
    /// Jobs left out, ordered by job identifier.
    pub unschedulable: Vec<Unschedulable>,
    /// Seed of the run that produced the plan.
    pub seed: u64,
    /// Generations bred after the initial population.
    pub generations: usize,
    /// How the search ended.
    pub termination: Termination,
}

impl Schedule {
    /// Latest end slot (0 when nothing is placed).
    pub fn makespan(&self) -> Slot {
        self.assignments.iter().map(|a| a.end_slot).max().unwrap_or(0)
    }

    /// Assignment of a job, if placed.
    pub fn assignment_for(&self, job_id: &str) -> Option<&Assignment> {
        self.assignments
            .binary_search_by(|a| a.job_id.as_str().cmp(job_id))
            .ok()
            .map(|idx| &self.assignments[idx])
    }

    /// Unschedulable reason of a job, if it was left out.
    pub fn reason_for(&self, job_id: &str) -> Option<UnschedulableReason> {
        self.unschedulable
            .iter()
            .find(|u| u.job_id == job_id)
            .map(|u| u.reason)
    }

    /// All assignments on one machine, ordered by start slot.
    pub fn assignments_for_machine(&self, machine_id: &str) -> Vec<&Assignment> {
        let mut on_machine: Vec<&Assignment> = self
            .assignments
            .iter()
            .filter(|a| a.machine_id == machine_id)
            .collect();
        on_machine.sort_by_key(|a| a.start_slot);
        on_machine
    }

    /// Busy slots per machine.
    pub fn busy_slots(&self) -> BTreeMap<&str, Slot> {
        let mut busy: BTreeMap<&str, Slot> = BTreeMap::new();
        for a in &self.assignments {
            *busy.entry(a.machine_id.as_str()).or_insert(0) += a.duration();
        }
        busy
    }

    /// Number of jobs accounted for (placed or unschedulable).
    pub fn job_count(&self) -> usize {
        self.assignments.len() + self.unschedulable.len()
    }

    /// Whether every job was placed.
    pub fn is_complete(&self) -> bool {
        self.unschedulable.is_empty()
    }

    /// Non-fatal conditions of this plan.
    pub fn warnings(&self) -> Vec<ScheduleWarning> {
        let mut warnings = Vec::new();
        if !self.unschedulable.is_empty() {
            warnings.push(ScheduleWarning::PartialInfeasibility {
                jobs: self.unschedulable.len(),
            });
        }
        if self.termination.is_budget_exhausted() {
            warnings.push(ScheduleWarning::BudgetExhausted {
                generations: self.generations,
            });
        }
        if self.termination == Termination::Cancelled {
            warnings.push(ScheduleWarning::Cancelled {
                generations: self.generations,
            });
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schedule() -> Schedule {
        Schedule {
            version: 3,
            assignments: vec![
                Assignment::new("J1", "L1", 0, 4),
                Assignment::new("J2", "L2", 1, 3),
                Assignment::new("J3", "L1", 4, 9),
            ],
            score: ScoreRecord::default(),
            unschedulable: vec![Unschedulable::new("J4", UnschedulableReason::NoCapableMachine)],
            seed: 7,
            generations: 12,
            termination: Termination::GenerationBudget,
        }
    }

    #[test]
    fn test_schedule_queries() {
        let s = sample_schedule();
        assert_eq!(s.makespan(), 9);
        assert_eq!(s.assignment_for("J2").map(|a| a.machine_id.as_str()), Some("L2"));
        assert!(s.assignment_for("J4").is_none());
        assert_eq!(s.reason_for("J4"), Some(UnschedulableReason::NoCapableMachine));
        assert_eq!(s.job_count(), 4);
        assert!(!s.is_complete());

        let l1 = s.assignments_for_machine("L1");
        assert_eq!(l1.len(), 2);
        assert_eq!(l1[0].job_id, "J1");
    }

    #[test]
    fn test_busy_slots() {
        let s = sample_schedule();
        let busy = s.busy_slots();
        assert_eq!(busy["L1"], 9);
        assert_eq!(busy["L2"], 2);
    }

    #[test]
    fn test_assignment_conflicts() {
        let a = Assignment::new("J1", "L1", 0, 4);
        assert!(a.conflicts_with(&Assignment::new("J2", "L1", 3, 5)));
        assert!(!a.conflicts_with(&Assignment::new("J2", "L1", 4, 5)));
        assert!(!a.conflicts_with(&Assignment::new("J2", "L2", 0, 4)));
        assert_eq!(a.duration(), 4);
    }

    #[test]
    fn test_warnings() {
        let s = sample_schedule();
        assert_eq!(
            s.warnings(),
            vec![
                ScheduleWarning::PartialInfeasibility { jobs: 1 },
                ScheduleWarning::BudgetExhausted { generations: 12 },
            ]
        );

        let mut clean = sample_schedule();
        clean.unschedulable.clear();
        clean.termination = Termination::Converged;
        assert!(clean.warnings().is_empty());
        assert!(!Termination::Cancelled.is_budget_exhausted());

        let mut cancelled = clean;
        cancelled.termination = Termination::Cancelled;
        cancelled.generations = 4;
        assert_eq!(
            cancelled.warnings(),
            vec![ScheduleWarning::Cancelled { generations: 4 }]
        );
    }

    #[test]
    fn test_empty_schedule() {
        let s = Schedule {
            version: 1,
            assignments: Vec::new(),
            score: ScoreRecord::default(),
            unschedulable: Vec::new(),
            seed: 0,
            generations: 0,
            termination: Termination::Trivial,
        };
        assert_eq!(s.makespan(), 0);
        assert!(s.is_complete());
        assert!(s.busy_slots().is_empty());
    }
}
