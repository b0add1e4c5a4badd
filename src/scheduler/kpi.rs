//! Schedule quality metrics (KPIs).
//!
//! Computes reporting indicators from a committed schedule and its input
//! jobs. Unlike the search objective these are unnormalized and meant for
//! operators, not for ranking candidates.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan | Latest end slot |
//! | Total Lateness | Sum of max(0, end - deadline) |
//! | Maximum Lateness | Largest single delay |
//! | On-Time Rate | Fraction of placed jobs meeting their deadline |
//! | Avg Utilization | Mean machine busyness over `[0, makespan)` |
//! | Community Share | Fraction of scheduled machine-time per community |
//! | Owner Share | Fraction of scheduled machine-time per machine-owning community |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::{Job, Machine, Schedule, Slot};

/// Schedule performance indicators. Time values are in slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleKpi {
    /// Latest end slot.
    pub makespan: Slot,
    /// Sum of lateness across placed jobs.
    pub total_lateness: u64,
    /// Largest lateness of any placed job.
    pub max_lateness: Slot,
    /// Fraction of placed jobs finishing by their deadline (0.0..1.0).
    pub on_time_rate: f64,
    /// Mean utilization over machines with at least one assignment.
    pub avg_utilization: f64,
    /// Busy slots / makespan per machine.
    pub utilization_by_machine: BTreeMap<String, f64>,
    /// Share of scheduled machine-time per requesting community.
    pub share_by_community: BTreeMap<String, f64>,
    /// Share of scheduled machine-time per machine-owning community.
    ///
    /// Empty unless computed with [`ScheduleKpi::calculate_with_fleet`].
    #[serde(default)]
    pub share_by_owner: BTreeMap<String, f64>,
    /// Jobs left unschedulable.
    pub unschedulable: usize,
}

impl ScheduleKpi {
    /// Computes KPIs from a schedule and its input jobs.
    ///
    /// Assignments whose job is missing from `jobs` count toward
    /// utilization but not toward lateness or community shares.
    pub fn calculate(schedule: &Schedule, jobs: &[Job]) -> Self {
        let by_id: HashMap<&str, &Job> = jobs.iter().map(|j| (j.id.as_str(), j)).collect();
        let makespan = schedule.makespan();

        let mut total_lateness: u64 = 0;
        let mut max_lateness: Slot = 0;
        let mut on_time: usize = 0;
        let mut counted: usize = 0;
        let mut community_time: BTreeMap<String, u64> = BTreeMap::new();
        let mut scheduled_time: u64 = 0;

        for a in &schedule.assignments {
            let Some(job) = by_id.get(a.job_id.as_str()) else {
                continue;
            };
            counted += 1;
            let late = job.lateness(a.end_slot);
            if late == 0 {
                on_time += 1;
            } else {
                total_lateness += u64::from(late);
                max_lateness = max_lateness.max(late);
            }
            *community_time.entry(job.community_id.clone()).or_insert(0) += u64::from(a.duration());
            scheduled_time += u64::from(a.duration());
        }

        let utilization_by_machine: BTreeMap<String, f64> = if makespan == 0 {
            BTreeMap::new()
        } else {
            schedule
                .busy_slots()
                .into_iter()
                .map(|(m, busy)| (m.to_string(), f64::from(busy) / f64::from(makespan)))
                .collect()
        };
        let avg_utilization = if utilization_by_machine.is_empty() {
            0.0
        } else {
            utilization_by_machine.values().sum::<f64>() / utilization_by_machine.len() as f64
        };

        let share_by_community = community_time
            .into_iter()
            .map(|(c, t)| (c, t as f64 / scheduled_time as f64))
            .collect();

        let on_time_rate = if counted == 0 {
            1.0
        } else {
            on_time as f64 / counted as f64
        };

        Self {
            makespan,
            total_lateness,
            max_lateness,
            on_time_rate,
            avg_utilization,
            utilization_by_machine,
            share_by_community,
            share_by_owner: BTreeMap::new(),
            unschedulable: schedule.unschedulable.len(),
        }
    }

    /// Computes KPIs including how machine-time splits across the
    /// communities that own the looms.
    ///
    /// Assignments on machines missing from `machines` are left out of
    /// the owner shares.
    pub fn calculate_with_fleet(schedule: &Schedule, jobs: &[Job], machines: &[Machine]) -> Self {
        let mut kpi = Self::calculate(schedule, jobs);
        let owners: HashMap<&str, &str> = machines
            .iter()
            .map(|m| (m.id.as_str(), m.community_id.as_str()))
            .collect();

        let mut owner_time: BTreeMap<String, u64> = BTreeMap::new();
        let mut total: u64 = 0;
        for a in &schedule.assignments {
            if let Some(owner) = owners.get(a.machine_id.as_str()) {
                *owner_time.entry((*owner).to_string()).or_insert(0) += u64::from(a.duration());
                total += u64::from(a.duration());
            }
        }
        kpi.share_by_owner = owner_time
            .into_iter()
            .map(|(c, t)| (c, t as f64 / total as f64))
            .collect();
        kpi
    }

    /// Whether the schedule meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_lateness: Slot, min_utilization: f64) -> bool {
        self.max_lateness <= max_lateness && self.avg_utilization >= min_utilization
    }
}
