//! Resolved scheduling constraints.
//!
//! The constraint set is produced by collaborators (maintenance planning,
//! community governance) and consumed as-is: maintenance windows per
//! machine, per-community fairness quotas, and the planning horizon.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Slot, TimeWindow};

/// A period during which a machine cannot run jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceWindow {
    /// Affected machine.
    pub machine_id: String,
    /// Window start (inclusive).
    pub start: Slot,
    /// Window end (exclusive).
    pub end: Slot,
}

impl MaintenanceWindow {
    /// Slot interval covered by this window.
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.end)
    }
}

/// Discrete planning horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningHorizon {
    /// Wall-clock start of slot 0 (Unix seconds).
    pub start_time: i64,
    /// Length of one slot in seconds.
    pub slot_seconds: u32,
    /// Number of slots.
    pub slots: Slot,
}

impl PlanningHorizon {
    /// Horizon of `slots` slots starting at the epoch, one hour per slot.
    pub fn new(slots: Slot) -> Self {
        Self {
            start_time: 0,
            slot_seconds: 3600,
            slots,
        }
    }

    /// Sets the wall-clock origin.
    pub fn starting_at(mut self, start_time: i64, slot_seconds: u32) -> Self {
        self.start_time = start_time;
        self.slot_seconds = slot_seconds;
        self
    }

    /// Wall-clock time (Unix seconds) at which `slot` begins.
    pub fn slot_time(&self, slot: Slot) -> i64 {
        self.start_time + i64::from(slot) * i64::from(self.slot_seconds)
    }
}

/// All hard and soft constraints of one scheduling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    /// Machine maintenance windows.
    pub maintenance_windows: Vec<MaintenanceWindow>,
    /// Maximum share of scheduled machine-time per community, in [0, 1].
    pub community_quotas: BTreeMap<String, f64>,
    /// Planning horizon.
    pub horizon: PlanningHorizon,
}

impl ConstraintSet {
    /// Creates a constraint set with no windows and no quotas.
    pub fn new(horizon: PlanningHorizon) -> Self {
        Self {
            maintenance_windows: Vec::new(),
            community_quotas: BTreeMap::new(),
            horizon,
        }
    }

    /// Adds a maintenance window `[start, end)` for a machine.
    pub fn with_maintenance(mut self, machine_id: impl Into<String>, start: Slot, end: Slot) -> Self {
        self.maintenance_windows.push(MaintenanceWindow {
            machine_id: machine_id.into(),
            start,
            end,
        });
        self
    }

    /// Sets a community's fairness quota.
    pub fn with_quota(mut self, community_id: impl Into<String>, share: f64) -> Self {
        self.community_quotas.insert(community_id.into(), share);
        self
    }

    /// Number of slots in the horizon.
    #[inline]
    pub fn horizon_slots(&self) -> Slot {
        self.horizon.slots
    }

    /// Maintenance windows of one machine.
    pub fn windows_for<'a>(&'a self, machine_id: &'a str) -> impl Iterator<Item = TimeWindow> + 'a {
        self.maintenance_windows
            .iter()
            .filter(move |w| w.machine_id == machine_id)
            .map(MaintenanceWindow::window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_builder() {
        let c = ConstraintSet::new(PlanningHorizon::new(48))
            .with_maintenance("L1", 4, 8)
            .with_maintenance("L2", 0, 2)
            .with_maintenance("L1", 20, 22)
            .with_quota("north", 0.5);

        assert_eq!(c.horizon_slots(), 48);
        let l1: Vec<TimeWindow> = c.windows_for("L1").collect();
        assert_eq!(l1, vec![TimeWindow::new(4, 8), TimeWindow::new(20, 22)]);
        assert_eq!(c.windows_for("L3").count(), 0);
        assert_eq!(c.community_quotas.get("north"), Some(&0.5));
    }

    #[test]
    fn test_slot_time() {
        let h = PlanningHorizon::new(24).starting_at(1_700_000_000, 900);
        assert_eq!(h.slot_time(0), 1_700_000_000);
        assert_eq!(h.slot_time(4), 1_700_003_600);
    }

    #[test]
    fn test_constraint_serde() {
        let c = ConstraintSet::new(PlanningHorizon::new(10)).with_quota("a", 0.25);
        let json = serde_json::to_string(&c).unwrap();
        let back: ConstraintSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
