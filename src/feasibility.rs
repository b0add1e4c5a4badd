//! Feasibility filter.
//!
//! A single deterministic scan that decides, for every job, which machines
//! could run it at all. Jobs with no eligible machine are reported
//! unschedulable up front and never enter the genetic search.
//!
//! # Eligibility
//!
//! A machine is eligible for a job when it:
//! 1. offers the job's pattern type,
//! 2. has warp and weft capacity at least the job's dimensions,
//! 3. is available at some slot of the horizon, and
//! 4. can finish the job (at its effective duration) before the horizon ends.
//!
//! Jobs are visited in precedence order so a job whose predecessor was
//! rejected is rejected too.

use std::collections::HashMap;

use tracing::debug;

use crate::models::{
    ConstraintSet, Job, JobState, Machine, Slot, Unschedulable, UnschedulableReason,
};

/// A machine a job may run on, with the job's duration there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineOption {
    /// Index into the request's machine list.
    pub machine: usize,
    /// Effective duration on that machine (slots).
    pub duration: Slot,
}

/// A job that passed the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleJob {
    /// Index into the request's job list.
    pub job: usize,
    /// Eligible machines, in machine-list order. Never empty.
    pub options: Vec<MachineOption>,
}

/// Outcome of the filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeasibilityReport {
    /// Schedulable jobs, ordered by job identifier.
    pub eligible: Vec<EligibleJob>,
    /// Rejected jobs, ordered by job identifier.
    pub unschedulable: Vec<Unschedulable>,
}

impl FeasibilityReport {
    /// Whether no job can be scheduled.
    pub fn is_empty(&self) -> bool {
        self.eligible.is_empty()
    }
}

/// Partitions jobs into schedulable and unschedulable.
///
/// `order` must be a precedence order of `jobs` (see
/// [`precedence_order`](crate::validation::precedence_order)).
pub fn partition(
    jobs: &[Job],
    machines: &[Machine],
    constraints: &ConstraintSet,
    order: &[usize],
) -> FeasibilityReport {
    let horizon = constraints.horizon_slots();
    let index: HashMap<&str, usize> = jobs
        .iter()
        .enumerate()
        .map(|(i, job)| (job.id.as_str(), i))
        .collect();
    let available_from: Vec<Option<Slot>> =
        machines.iter().map(|m| m.available_from(horizon)).collect();

    let mut schedulable = vec![false; jobs.len()];
    let mut report = FeasibilityReport::default();

    for &i in order {
        let job = &jobs[i];
        match eligible_options(job, machines, &available_from, horizon) {
            Err(reason) => reject(&mut report, job, reason),
            Ok(options) => {
                let blocked = job.predecessors.iter().any(|p| match index.get(p.as_str()) {
                    Some(&pi) => jobs[pi].state != JobState::Completed && !schedulable[pi],
                    None => true,
                });
                if blocked {
                    reject(&mut report, job, UnschedulableReason::PredecessorUnschedulable);
                } else {
                    schedulable[i] = true;
                    report.eligible.push(EligibleJob { job: i, options });
                }
            }
        }
    }

    report.eligible.sort_by(|a, b| jobs[a.job].id.cmp(&jobs[b.job].id));
    report.unschedulable.sort_by(|a, b| a.job_id.cmp(&b.job_id));
    report
}

fn eligible_options(
    job: &Job,
    machines: &[Machine],
    available_from: &[Option<Slot>],
    horizon: Slot,
) -> Result<Vec<MachineOption>, UnschedulableReason> {
    if !job.state.is_schedulable() {
        return Err(UnschedulableReason::InactiveState);
    }

    let capable: Vec<usize> = (0..machines.len())
        .filter(|&m| machines[m].can_run(job))
        .collect();
    if capable.is_empty() {
        return Err(UnschedulableReason::NoCapableMachine);
    }

    let available: Vec<(usize, Slot)> = capable
        .into_iter()
        .filter_map(|m| available_from[m].map(|from| (m, from)))
        .collect();
    if available.is_empty() {
        return Err(UnschedulableReason::NoAvailableMachine);
    }

    let options: Vec<MachineOption> = available
        .into_iter()
        .map(|(m, from)| {
            let duration = machines[m].effective_duration(job.estimated_duration);
            (m, from, duration)
        })
        .filter(|&(_, from, duration)| u64::from(from) + u64::from(duration) <= u64::from(horizon))
        .map(|(machine, _, duration)| MachineOption { machine, duration })
        .collect();
    if options.is_empty() {
        return Err(UnschedulableReason::ExceedsHorizon);
    }
    Ok(options)
}

fn reject(report: &mut FeasibilityReport, job: &Job, reason: UnschedulableReason) {
    debug!(job_id = %job.id, ?reason, "job excluded before search");
    report.unschedulable.push(Unschedulable::new(job.id.clone(), reason));
}
