//! Collaborator seams.
//!
//! The scheduler reads a consistent snapshot of jobs and machines before a
//! run and writes back a committed schedule afterwards. [`SnapshotSource`]
//! and [`ScheduleSink`] describe those two directions; [`InMemoryStore`]
//! implements both for tests and embedding callers.
//!
//! Snapshots are owned copies, so a running computation never observes
//! mutations made after it started.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Result, SchedulerError};
use crate::models::{ConstraintSet, Job, Machine, MachineStatusUpdate, Schedule};

/// A consistent view of the inputs of one run.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Jobs at snapshot time.
    pub jobs: Vec<Job>,
    /// Machines at snapshot time.
    pub machines: Vec<Machine>,
    /// Constraints at snapshot time.
    pub constraints: ConstraintSet,
    /// Latest committed schedule, if any.
    pub latest: Option<Arc<Schedule>>,
}

/// Supplies consistent snapshots.
pub trait SnapshotSource {
    /// Takes a snapshot atomically.
    fn snapshot(&self) -> Result<Snapshot>;
}

/// Accepts committed schedules.
pub trait ScheduleSink {
    /// Commits a schedule.
    ///
    /// # Errors
    /// `StaleVersion` if the version does not exceed the latest committed one.
    fn commit(&self, schedule: Schedule) -> Result<Arc<Schedule>>;
}

#[derive(Debug)]
struct StoreState {
    jobs: Vec<Job>,
    machines: Vec<Machine>,
    constraints: ConstraintSet,
    history: Vec<Arc<Schedule>>,
}

/// In-memory snapshot source and schedule sink.
///
/// Committed schedules are kept as immutable shared values; committing a
/// new one never touches an older one.
#[derive(Debug)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    /// Creates a store with no committed schedule.
    pub fn new(jobs: Vec<Job>, machines: Vec<Machine>, constraints: ConstraintSet) -> Self {
        Self {
            state: RwLock::new(StoreState {
                jobs,
                machines,
                constraints,
                history: Vec::new(),
            }),
        }
    }

    /// Inserts a job or replaces the one with the same identifier.
    pub fn upsert_job(&self, job: Job) {
        let mut state = self.state.write();
        match state.jobs.iter_mut().find(|j| j.id == job.id) {
            Some(existing) => *existing = job,
            None => state.jobs.push(job),
        }
    }

    /// Applies a telemetry status update to a machine.
    ///
    /// # Errors
    /// `Store` if no machine has the update's identifier.
    pub fn apply_status_update(&self, update: &MachineStatusUpdate) -> Result<()> {
        let mut state = self.state.write();
        let machine = state
            .machines
            .iter_mut()
            .find(|m| m.id == update.machine_id)
            .ok_or_else(|| SchedulerError::Store(format!("unknown machine '{}'", update.machine_id)))?;
        *machine = machine.apply(update);
        debug!(machine = %update.machine_id, status = ?update.status, "machine status updated");
        Ok(())
    }

    /// Latest committed schedule.
    pub fn latest(&self) -> Option<Arc<Schedule>> {
        self.state.read().history.last().cloned()
    }

    /// Version of the latest committed schedule (0 if none).
    pub fn latest_version(&self) -> u64 {
        self.state.read().history.last().map_or(0, |s| s.version)
    }

    /// All committed schedules, oldest first.
    pub fn history(&self) -> Vec<Arc<Schedule>> {
        self.state.read().history.clone()
    }
}

impl SnapshotSource for InMemoryStore {
    fn snapshot(&self) -> Result<Snapshot> {
        let state = self.state.read();
        Ok(Snapshot {
            jobs: state.jobs.clone(),
            machines: state.machines.clone(),
            constraints: state.constraints.clone(),
            latest: state.history.last().cloned(),
        })
    }
}

impl ScheduleSink for InMemoryStore {
    fn commit(&self, schedule: Schedule) -> Result<Arc<Schedule>> {
        let mut state = self.state.write();
        let latest = state.history.last().map_or(0, |s| s.version);
        if schedule.version <= latest {
            return Err(SchedulerError::StaleVersion {
                latest,
                got: schedule.version,
            });
        }
        let committed = Arc::new(schedule);
        state.history.push(Arc::clone(&committed));
        debug!(version = committed.version, "schedule committed");
        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        MachineStatus, PatternType, PlanningHorizon, ScoreRecord, Termination,
    };

    fn store() -> InMemoryStore {
        InMemoryStore::new(
            vec![Job::new("A", "north", PatternType::Plain, 10, 10, 2)],
            vec![Machine::new("L1", "north", 100, 100).with_capability(PatternType::Plain)],
            ConstraintSet::new(PlanningHorizon::new(10)),
        )
    }

    fn schedule(version: u64) -> Schedule {
        Schedule {
            version,
            assignments: Vec::new(),
            score: ScoreRecord::default(),
            unschedulable: Vec::new(),
            seed: 0,
            generations: 0,
            termination: Termination::Trivial,
        }
    }

    #[test]
    fn test_commit_rejects_stale_version() {
        let store = store();
        store.commit(schedule(1)).unwrap();
        store.commit(schedule(3)).unwrap();

        let err = store.commit(schedule(3)).unwrap_err();
        assert!(matches!(err, SchedulerError::StaleVersion { latest: 3, got: 3 }));
        assert_eq!(store.latest_version(), 3);
        assert_eq!(store.history().len(), 2);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_updates() {
        let store = store();
        let before = store.snapshot().unwrap();

        store
            .apply_status_update(&MachineStatusUpdate {
                machine_id: "L1".into(),
                status: MachineStatus::Offline,
                committed_until: None,
            })
            .unwrap();
        store.upsert_job(Job::new("B", "north", PatternType::Plain, 10, 10, 1));

        assert_eq!(before.machines[0].status, MachineStatus::Idle);
        assert_eq!(before.jobs.len(), 1);
        let after = store.snapshot().unwrap();
        assert_eq!(after.machines[0].status, MachineStatus::Offline);
        assert_eq!(after.jobs.len(), 2);
    }

    #[test]
    fn test_unknown_machine_update() {
        let store = store();
        let err = store
            .apply_status_update(&MachineStatusUpdate {
                machine_id: "nope".into(),
                status: MachineStatus::Idle,
                committed_until: None,
            })
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Store(_)));
    }

    #[test]
    fn test_committed_schedule_is_shared_not_copied() {
        let store = store();
        let committed = store.commit(schedule(1)).unwrap();
        let latest = store.latest().unwrap();
        assert!(Arc::ptr_eq(&committed, &latest));
        assert!(store.snapshot().unwrap().latest.is_some());
    }
}
