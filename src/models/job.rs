//! Job (weaving order) model.
//!
//! A job is a single production order executed on one machine in one
//! contiguous window. Its duration and required capability are supplied
//! by the pattern-generation collaborator.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Slot;

/// Weave pattern family a machine must support to run a job.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    /// Plain (tabby) weave.
    Plain,
    /// Twill weave.
    Twill,
    /// Satin weave.
    Satin,
    /// Jacquard (individually controlled warp ends).
    Jacquard,
    /// Community-defined pattern family.
    Custom(String),
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternType::Plain => f.write_str("plain"),
            PatternType::Twill => f.write_str("twill"),
            PatternType::Satin => f.write_str("satin"),
            PatternType::Jacquard => f.write_str("jacquard"),
            PatternType::Custom(name) => f.write_str(name),
        }
    }
}

/// Ordered priority tier.
///
/// Tiers compare as integers, never as floats, so ranking is exact.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Best effort.
    Low,
    /// Regular community order.
    #[default]
    Normal,
    /// Expedited order.
    High,
    /// Must not slip.
    Urgent,
}

impl Priority {
    /// Heaviest tier weight, used to normalize lateness penalties.
    pub const MAX_WEIGHT: u32 = 4;

    /// Integer weight applied to lateness (1 for `Low` up to 4 for `Urgent`).
    pub fn weight(self) -> u32 {
        match self {
            Priority::Low => 1,
            Priority::Normal => 2,
            Priority::High => 3,
            Priority::Urgent => Self::MAX_WEIGHT,
        }
    }
}

/// Lifecycle state of a job as recorded by the persistence layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting for a slot.
    #[default]
    Queued,
    /// Placed by a previous plan; may be re-optimized.
    Scheduled,
    /// On a loom right now.
    Running,
    /// Finished.
    Completed,
    /// Aborted by the machine or operator.
    Failed,
    /// Withdrawn by the requesting community.
    Cancelled,
}

impl JobState {
    /// Whether a job in this state may receive a (new) placement.
    pub fn is_schedulable(self) -> bool {
        matches!(self, JobState::Queued | JobState::Scheduled)
    }
}

/// A production order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: String,
    /// Requesting community (fairness accounting).
    pub community_id: String,
    /// Capability the machine must offer.
    pub pattern_type: PatternType,
    /// Number of warp threads.
    pub warp: u32,
    /// Number of weft picks.
    pub weft: u32,
    /// Priority tier.
    pub priority: Priority,
    /// Latest acceptable end slot. `None` = no deadline.
    pub deadline: Option<Slot>,
    /// Jobs that must complete before this one may start.
    pub predecessors: Vec<String>,
    /// Lifecycle state.
    pub state: JobState,
    /// Estimated duration in slots on a machine with productivity 1.0.
    pub estimated_duration: Slot,
}

impl Job {
    /// Creates a queued, normal-priority job.
    pub fn new(
        id: impl Into<String>,
        community_id: impl Into<String>,
        pattern_type: PatternType,
        warp: u32,
        weft: u32,
        estimated_duration: Slot,
    ) -> Self {
        Self {
            id: id.into(),
            community_id: community_id.into(),
            pattern_type,
            warp,
            weft,
            priority: Priority::Normal,
            deadline: None,
            predecessors: Vec::new(),
            state: JobState::Queued,
            estimated_duration,
        }
    }

    /// Sets the priority tier.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the deadline (latest end slot).
    pub fn with_deadline(mut self, deadline: Slot) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Adds a predecessor job ID.
    pub fn with_predecessor(mut self, job_id: impl Into<String>) -> Self {
        self.predecessors.push(job_id.into());
        self
    }

    /// Sets the lifecycle state.
    pub fn with_state(mut self, state: JobState) -> Self {
        self.state = state;
        self
    }

    /// Slots past the deadline if the job ends at `end_slot`.
    pub fn lateness(&self, end_slot: Slot) -> Slot {
        match self.deadline {
            Some(deadline) => end_slot.saturating_sub(deadline),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_builder() {
        let job = Job::new("J1", "north", PatternType::Twill, 400, 900, 6)
            .with_priority(Priority::High)
            .with_deadline(20)
            .with_predecessor("J0")
            .with_state(JobState::Scheduled);

        assert_eq!(job.id, "J1");
        assert_eq!(job.community_id, "north");
        assert_eq!(job.pattern_type, PatternType::Twill);
        assert_eq!(job.priority, Priority::High);
        assert_eq!(job.deadline, Some(20));
        assert_eq!(job.predecessors, vec!["J0".to_string()]);
        assert!(job.state.is_schedulable());
    }

    #[test]
    fn test_priority_order_and_weight() {
        assert!(Priority::Urgent > Priority::High);
        assert!(Priority::Low < Priority::Normal);
        assert_eq!(Priority::Low.weight(), 1);
        assert_eq!(Priority::Urgent.weight(), Priority::MAX_WEIGHT);
    }

    #[test]
    fn test_lateness() {
        let job = Job::new("J1", "c", PatternType::Plain, 1, 1, 3).with_deadline(10);
        assert_eq!(job.lateness(8), 0);
        assert_eq!(job.lateness(10), 0);
        assert_eq!(job.lateness(13), 3);

        let open = Job::new("J2", "c", PatternType::Plain, 1, 1, 3);
        assert_eq!(open.lateness(1000), 0);
    }

    #[test]
    fn test_inactive_states() {
        for state in [JobState::Running, JobState::Completed, JobState::Failed, JobState::Cancelled] {
            assert!(!state.is_schedulable());
        }
    }

    #[test]
    fn test_pattern_serde() {
        let json = serde_json::to_string(&PatternType::Custom("herringbone".into())).unwrap();
        let back: PatternType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PatternType::Custom("herringbone".into()));
        assert_eq!(serde_json::to_string(&PatternType::Satin).unwrap(), "\"satin\"");
        assert_eq!(PatternType::Jacquard.to_string(), "jacquard");
    }
}
