//! Machine (loom) model.
//!
//! Machines are the resources jobs run on. Each has a fixed set of
//! supported pattern types, a maximum warp/weft bed size, and a
//! productivity factor scaling estimated job durations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Job, PatternType, Slot};

/// Operational status reported by the telemetry bridge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineStatus {
    /// Free to take work.
    #[default]
    Idle,
    /// Busy with a job until `committed_until`.
    Running,
    /// Under service until `committed_until`.
    Maintenance,
    /// Disconnected or decommissioned.
    Offline,
}

/// A loom that can be assigned jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    /// Unique machine identifier.
    pub id: String,
    /// Owning community; reported as fleet share by
    /// [`ScheduleKpi::calculate_with_fleet`](crate::scheduler::ScheduleKpi::calculate_with_fleet).
    pub community_id: String,
    /// Supported pattern types.
    pub capabilities: BTreeSet<PatternType>,
    /// Maximum warp threads.
    pub max_warp: u32,
    /// Maximum weft picks.
    pub max_weft: u32,
    /// Throughput multiplier (1.0 = nominal, >1.0 = faster).
    pub productivity_factor: f64,
    /// Current status.
    pub status: MachineStatus,
    /// End slot of the current commitment (for `Running`/`Maintenance`).
    pub committed_until: Option<Slot>,
}

/// A status change emitted by the telemetry collaborator between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineStatusUpdate {
    /// Machine the update applies to.
    pub machine_id: String,
    /// New status.
    pub status: MachineStatus,
    /// New commitment end, if any.
    pub committed_until: Option<Slot>,
}

impl Machine {
    /// Creates an idle machine with nominal productivity.
    pub fn new(
        id: impl Into<String>,
        community_id: impl Into<String>,
        max_warp: u32,
        max_weft: u32,
    ) -> Self {
        Self {
            id: id.into(),
            community_id: community_id.into(),
            capabilities: BTreeSet::new(),
            max_warp,
            max_weft,
            productivity_factor: 1.0,
            status: MachineStatus::Idle,
            committed_until: None,
        }
    }

    /// Adds a supported pattern type.
    pub fn with_capability(mut self, pattern: PatternType) -> Self {
        self.capabilities.insert(pattern);
        self
    }

    /// Sets the productivity factor.
    pub fn with_productivity(mut self, factor: f64) -> Self {
        self.productivity_factor = factor;
        self
    }

    /// Sets status and commitment end.
    pub fn with_status(mut self, status: MachineStatus, committed_until: Option<Slot>) -> Self {
        self.status = status;
        self.committed_until = committed_until;
        self
    }

    /// Whether the machine offers the pattern type.
    pub fn supports(&self, pattern: &PatternType) -> bool {
        self.capabilities.contains(pattern)
    }

    /// Capability and capacity check (ignores availability).
    pub fn can_run(&self, job: &Job) -> bool {
        self.supports(&job.pattern_type) && self.max_warp >= job.warp && self.max_weft >= job.weft
    }

    /// Duration of a job of `estimated` nominal slots on this machine.
    ///
    /// `ceil(estimated / productivity_factor)`, never less than one slot.
    pub fn effective_duration(&self, estimated: Slot) -> Slot {
        let scaled = (f64::from(estimated) / self.productivity_factor).ceil();
        if scaled >= f64::from(Slot::MAX) {
            Slot::MAX
        } else {
            (scaled as Slot).max(1)
        }
    }

    /// First slot at which new work may start, or `None` if the machine
    /// is unavailable for the whole horizon.
    pub fn available_from(&self, horizon_slots: Slot) -> Option<Slot> {
        let from = match self.status {
            MachineStatus::Idle => 0,
            MachineStatus::Running | MachineStatus::Maintenance => self.committed_until?,
            MachineStatus::Offline => return None,
        };
        (from < horizon_slots).then_some(from)
    }

    /// Returns a copy with the telemetry update applied.
    pub fn apply(&self, update: &MachineStatusUpdate) -> Machine {
        let mut next = self.clone();
        next.status = update.status;
        next.committed_until = update.committed_until;
        next
    }
}
