//! Chromosome decoder with deterministic repair.
//!
//! Decoding never discards a candidate. Hard-constraint violations are
//! repaired by shifting starts forward:
//!
//! - **Machine overlap**: the job placed later (smaller encoded start goes
//!   first, ties by job identifier) moves to the next free slot.
//! - **Precedence**: a job never starts before its predecessors end.
//! - **Maintenance / pre-commitment**: a start inside a blocked window
//!   moves to the window's end.
//!
//! Jobs are placed in list-scheduling order: among jobs whose
//! predecessors are all placed, the smallest `(encoded start, gene index)`
//! comes first. Gene indices follow job-identifier order, so the same
//! chromosome always decodes to the same plan.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::{Chromosome, SchedulingProblem};
use crate::models::{Slot, TimeWindow, UnschedulableReason};

/// Repaired placement of one gene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Machine index.
    pub machine: usize,
    /// Start slot.
    pub start: Slot,
    /// End slot (exclusive).
    pub end: Slot,
}

impl Placement {
    /// Occupied slots.
    #[inline]
    pub fn duration(&self) -> Slot {
        self.end - self.start
    }
}

/// A decoded (repaired) candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSchedule {
    /// Placement per gene; `None` for unplaced genes.
    pub placements: Vec<Option<Placement>>,
    /// Unplaced genes with reasons, ordered by gene index.
    pub unplaced: Vec<(usize, UnschedulableReason)>,
}

impl DecodedSchedule {
    /// Placed genes with their placements.
    pub fn placed(&self) -> impl Iterator<Item = (usize, &Placement)> {
        self.placements
            .iter()
            .enumerate()
            .filter_map(|(g, p)| p.as_ref().map(|p| (g, p)))
    }

    /// Latest end slot.
    pub fn makespan(&self) -> Slot {
        self.placed().map(|(_, p)| p.end).max().unwrap_or(0)
    }
}

/// Decodes a chromosome into a repaired plan.
///
/// A gene naming an ineligible machine (possible only for hand-built
/// chromosomes) falls back to the job's first eligible machine.
pub fn decode(problem: &SchedulingProblem<'_>, chromosome: &Chromosome) -> DecodedSchedule {
    let n = problem.len();
    let mut calendars = problem.calendars.clone();
    let mut placements: Vec<Option<Placement>> = vec![None; n];
    let mut failed = vec![false; n];
    let mut unplaced = Vec::new();

    let encoded_start = |g: usize| chromosome.genes.get(g).map_or(0, |gene| gene.start);

    let mut indegree: Vec<usize> = problem.genes.iter().map(|g| g.predecessors.len()).collect();
    let mut ready: BinaryHeap<Reverse<(Slot, usize)>> = (0..n)
        .filter(|&g| indegree[g] == 0)
        .map(|g| Reverse((encoded_start(g), g)))
        .collect();

    while let Some(Reverse((proposed, g))) = ready.pop() {
        let info = &problem.genes[g];

        if info.predecessors.iter().any(|&p| failed[p]) {
            failed[g] = true;
            unplaced.push((g, UnschedulableReason::PredecessorUnschedulable));
        } else {
            let requested = chromosome.genes.get(g).map(|gene| gene.machine);
            let option = requested
                .and_then(|m| info.option_for(m))
                .or_else(|| info.options.first());

            match option {
                None => {
                    failed[g] = true;
                    unplaced.push((g, UnschedulableReason::NoCapableMachine));
                }
                Some(option) => {
                    let after = info
                        .predecessors
                        .iter()
                        .filter_map(|&p| placements[p].map(|pl| pl.end))
                        .max()
                        .unwrap_or(0);
                    let calendar = &mut calendars[option.machine];
                    let start = calendar.earliest_fit(proposed.max(after), option.duration);
                    let end = u64::from(start) + u64::from(option.duration);

                    if end > u64::from(problem.horizon) {
                        failed[g] = true;
                        unplaced.push((g, UnschedulableReason::HorizonExceeded));
                    } else {
                        let end = start + option.duration;
                        calendar.reserve(TimeWindow::new(start, end));
                        placements[g] = Some(Placement {
                            machine: option.machine,
                            start,
                            end,
                        });
                    }
                }
            }
        }

        for &s in &info.successors {
            indegree[s] -= 1;
            if indegree[s] == 0 {
                ready.push(Reverse((encoded_start(s), s)));
            }
        }
    }

    unplaced.sort_unstable_by_key(|&(g, _)| g);
    DecodedSchedule {
        placements,
        unplaced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feasibility::partition;
    use crate::ga::Gene;
    use crate::models::{ConstraintSet, Job, Machine, PatternType, PlanningHorizon};
    use crate::validation::precedence_order;

    fn with_problem<T>(
        jobs: Vec<Job>,
        machines: Vec<Machine>,
        constraints: ConstraintSet,
        f: impl FnOnce(&SchedulingProblem<'_>) -> T,
    ) -> T {
        let order = precedence_order(&jobs).unwrap();
        let report = partition(&jobs, &machines, &constraints, &order);
        let problem = SchedulingProblem::new(&jobs, &machines, &constraints, &report);
        f(&problem)
    }

    fn plain_loom(id: &str) -> Machine {
        Machine::new(id, "c", 100, 100).with_capability(PatternType::Plain)
    }

    fn plain_job(id: &str, duration: Slot) -> Job {
        Job::new(id, "c", PatternType::Plain, 10, 10, duration)
    }

    fn gene(machine: usize, start: Slot) -> Gene {
        Gene { machine, start }
    }

    #[test]
    fn test_overlap_shifts_later_job() {
        with_problem(
            vec![plain_job("A", 4), plain_job("B", 3)],
            vec![plain_loom("L1")],
            ConstraintSet::new(PlanningHorizon::new(20)),
            |problem| {
                let decoded = decode(problem, &Chromosome::new(vec![gene(0, 2), gene(0, 3)]));
                assert_eq!(decoded.placements[0], Some(Placement { machine: 0, start: 2, end: 6 }));
                assert_eq!(decoded.placements[1], Some(Placement { machine: 0, start: 6, end: 9 }));
                assert!(decoded.unplaced.is_empty());
                assert_eq!(decoded.makespan(), 9);
            },
        );
    }

    #[test]
    fn test_equal_starts_break_ties_by_job_id() {
        with_problem(
            vec![plain_job("B", 3), plain_job("A", 4)],
            vec![plain_loom("L1")],
            ConstraintSet::new(PlanningHorizon::new(20)),
            |problem| {
                // Gene 0 is job "A" after ordering by identifier.
                let decoded = decode(problem, &Chromosome::new(vec![gene(0, 1), gene(0, 1)]));
                assert_eq!(decoded.placements[0].map(|p| p.start), Some(1));
                assert_eq!(decoded.placements[1].map(|p| p.start), Some(5));
            },
        );
    }

    #[test]
    fn test_precedence_overrides_encoded_order() {
        with_problem(
            vec![plain_job("A", 4), plain_job("B", 2).with_predecessor("A")],
            vec![plain_loom("L1"), plain_loom("L2")],
            ConstraintSet::new(PlanningHorizon::new(20)),
            |problem| {
                // B proposes slot 0 on another machine, A proposes slot 5.
                let decoded = decode(problem, &Chromosome::new(vec![gene(0, 5), gene(1, 0)]));
                let a = decoded.placements[0].unwrap();
                let b = decoded.placements[1].unwrap();
                assert_eq!((a.start, a.end), (5, 9));
                assert_eq!(b.start, 9);
            },
        );
    }

    #[test]
    fn test_maintenance_window_shifts_start() {
        with_problem(
            vec![plain_job("A", 3)],
            vec![plain_loom("L1")],
            ConstraintSet::new(PlanningHorizon::new(20)).with_maintenance("L1", 4, 8),
            |problem| {
                let inside = decode(problem, &Chromosome::new(vec![gene(0, 5)]));
                assert_eq!(inside.placements[0].map(|p| p.start), Some(8));
                // Starting at 2 would run into the window.
                let straddle = decode(problem, &Chromosome::new(vec![gene(0, 2)]));
                assert_eq!(straddle.placements[0].map(|p| p.start), Some(8));
                let before = decode(problem, &Chromosome::new(vec![gene(0, 1)]));
                assert_eq!(before.placements[0].map(|p| p.start), Some(1));
            },
        );
    }

    #[test]
    fn test_horizon_overflow_and_propagation() {
        with_problem(
            vec![
                plain_job("A", 6),
                plain_job("B", 6),
                plain_job("C", 1).with_predecessor("B"),
            ],
            vec![plain_loom("L1")],
            ConstraintSet::new(PlanningHorizon::new(10)),
            |problem| {
                let decoded = decode(problem, &Chromosome::new(vec![gene(0, 0), gene(0, 1), gene(0, 0)]));
                assert!(decoded.placements[0].is_some());
                assert!(decoded.placements[1].is_none());
                assert!(decoded.placements[2].is_none());
                assert_eq!(
                    decoded.unplaced,
                    vec![
                        (1, UnschedulableReason::HorizonExceeded),
                        (2, UnschedulableReason::PredecessorUnschedulable),
                    ]
                );
            },
        );
    }

    #[test]
    fn test_ineligible_machine_falls_back() {
        with_problem(
            vec![plain_job("A", 2)],
            vec![
                Machine::new("T1", "c", 100, 100).with_capability(PatternType::Twill),
                plain_loom("L1"),
            ],
            ConstraintSet::new(PlanningHorizon::new(10)),
            |problem| {
                let decoded = decode(problem, &Chromosome::new(vec![gene(0, 0)]));
                assert_eq!(decoded.placements[0].map(|p| p.machine), Some(1));
            },
        );
    }

    #[test]
    fn test_decode_is_deterministic() {
        with_problem(
            vec![plain_job("A", 3), plain_job("B", 3), plain_job("C", 3)],
            vec![plain_loom("L1"), plain_loom("L2")],
            ConstraintSet::new(PlanningHorizon::new(30)),
            |problem| {
                let ch = Chromosome::new(vec![gene(0, 2), gene(0, 2), gene(1, 0)]);
                assert_eq!(decode(problem, &ch), decode(problem, &ch));
            },
        );
    }
}
