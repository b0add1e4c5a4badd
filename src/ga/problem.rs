//! Scheduling GA problem definition.
//!
//! Bridges the filtered domain snapshot to the search: one [`GeneInfo`]
//! per schedulable job plus a base occupancy calendar per machine.

use std::collections::HashMap;

use crate::feasibility::{FeasibilityReport, MachineOption};
use crate::models::{ConstraintSet, Job, Machine, MachineCalendar, Slot, TimeWindow};

/// Compact per-gene descriptor.
///
/// Extracted from `Job` so decoding never touches full domain objects.
#[derive(Debug, Clone)]
pub struct GeneInfo {
    /// Index into the job list.
    pub job: usize,
    /// Eligible machines with effective durations.
    pub options: Vec<MachineOption>,
    /// Gene indices of schedulable predecessors.
    pub predecessors: Vec<usize>,
    /// Gene indices of schedulable successors.
    pub successors: Vec<usize>,
}

impl GeneInfo {
    /// Option for a machine index, if eligible.
    pub fn option_for(&self, machine: usize) -> Option<&MachineOption> {
        self.options.iter().find(|o| o.machine == machine)
    }
}

/// Problem definition shared read-only by every candidate of a run.
#[derive(Debug, Clone)]
pub struct SchedulingProblem<'a> {
    /// Job snapshot.
    pub jobs: &'a [Job],
    /// Machine snapshot.
    pub machines: &'a [Machine],
    /// Constraints of the run.
    pub constraints: &'a ConstraintSet,
    /// One entry per schedulable job, ordered by job identifier.
    pub genes: Vec<GeneInfo>,
    /// Pre-commitment and maintenance blocks per machine.
    pub calendars: Vec<MachineCalendar>,
    /// Whether each machine is available at some slot of the horizon.
    pub usable: Vec<bool>,
    /// Horizon length in slots.
    pub horizon: Slot,
}

impl<'a> SchedulingProblem<'a> {
    /// Creates the problem from a feasibility report.
    pub fn new(
        jobs: &'a [Job],
        machines: &'a [Machine],
        constraints: &'a ConstraintSet,
        report: &FeasibilityReport,
    ) -> Self {
        let horizon = constraints.horizon_slots();

        let job_index: HashMap<&str, usize> = jobs
            .iter()
            .enumerate()
            .map(|(i, job)| (job.id.as_str(), i))
            .collect();
        let mut gene_of_job: Vec<Option<usize>> = vec![None; jobs.len()];
        for (g, eligible) in report.eligible.iter().enumerate() {
            gene_of_job[eligible.job] = Some(g);
        }

        let mut genes: Vec<GeneInfo> = report
            .eligible
            .iter()
            .map(|e| GeneInfo {
                job: e.job,
                options: e.options.clone(),
                predecessors: Vec::new(),
                successors: Vec::new(),
            })
            .collect();

        for g in 0..genes.len() {
            let job = &jobs[genes[g].job];
            let mut preds: Vec<usize> = job
                .predecessors
                .iter()
                .filter_map(|p| job_index.get(p.as_str()).copied())
                .filter_map(|ji| gene_of_job[ji])
                .collect();
            preds.sort_unstable();
            preds.dedup();
            for &p in &preds {
                genes[p].successors.push(g);
            }
            genes[g].predecessors = preds;
        }

        let mut calendars = Vec::with_capacity(machines.len());
        let mut usable = Vec::with_capacity(machines.len());
        for m in machines {
            let from = m.available_from(horizon);
            usable.push(from.is_some());
            let precommit = TimeWindow::new(0, from.unwrap_or(horizon));
            calendars.push(MachineCalendar::new(
                std::iter::once(precommit).chain(constraints.windows_for(&m.id)),
            ));
        }

        Self {
            jobs,
            machines,
            constraints,
            genes,
            calendars,
            usable,
            horizon,
        }
    }

    /// Number of genes (schedulable jobs).
    #[inline]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Whether there is nothing to schedule.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Job behind a gene.
    #[inline]
    pub fn job(&self, gene: usize) -> &'a Job {
        &self.jobs[self.genes[gene].job]
    }

    /// Gene index of a job identifier, if the job is schedulable.
    pub fn gene_for_job(&self, job_id: &str) -> Option<usize> {
        self.genes
            .binary_search_by(|g| self.jobs[g.job].id.as_str().cmp(job_id))
            .ok()
    }

    /// Machine index of a machine identifier.
    pub fn machine_index(&self, machine_id: &str) -> Option<usize> {
        self.machines.iter().position(|m| m.id == machine_id)
    }
}
