//! Per-job assignment chromosome.
//!
//! # Encoding
//!
//! A fixed-length vector with one [`Gene`] per schedulable job, indexed
//! like [`SchedulingProblem::genes`]. Each gene names an eligible machine
//! and a proposed start slot. Because every position always belongs to the
//! same job, single-point crossover and per-gene mutation keep children
//! structurally valid without any permutation repair.

use rand::seq::IndexedRandom;
use rand::Rng;

use super::SchedulingProblem;
use crate::models::{Assignment, Slot, TimeWindow};

/// Machine and proposed start slot for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Gene {
    /// Index into the problem's machine list.
    pub machine: usize,
    /// Proposed start slot (the decoder may shift it later).
    pub start: Slot,
}

/// A complete candidate assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chromosome {
    /// One gene per schedulable job.
    pub genes: Vec<Gene>,
}

impl Chromosome {
    /// Creates a chromosome from genes.
    pub fn new(genes: Vec<Gene>) -> Self {
        Self { genes }
    }

    /// Number of genes.
    #[inline]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Whether the chromosome has no genes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Randomized greedy construction.
    ///
    /// Repeatedly picks a random job whose predecessors are already placed,
    /// assigns it a uniformly random eligible machine, and starts it at the
    /// earliest free slot of that machine after its predecessors end.
    pub fn greedy<R: Rng>(problem: &SchedulingProblem<'_>, rng: &mut R) -> Self {
        let n = problem.len();
        let mut calendars = problem.calendars.clone();
        let mut genes = vec![Gene { machine: 0, start: 0 }; n];
        let mut ends: Vec<Slot> = vec![0; n];
        let mut indegree: Vec<usize> = problem.genes.iter().map(|g| g.predecessors.len()).collect();
        let mut ready: Vec<usize> = (0..n).filter(|&g| indegree[g] == 0).collect();

        while !ready.is_empty() {
            let pick = rng.random_range(0..ready.len());
            let g = ready.swap_remove(pick);
            let info = &problem.genes[g];

            // Options are never empty for a gene that passed the filter.
            let option = match info.options.choose(rng) {
                Some(option) => *option,
                None => continue,
            };
            let after = info.predecessors.iter().map(|&p| ends[p]).max().unwrap_or(0);
            let start = calendars[option.machine].earliest_fit(after, option.duration);
            let end = start.saturating_add(option.duration);
            if end <= problem.horizon {
                calendars[option.machine].reserve(TimeWindow::new(start, end));
            }
            genes[g] = Gene {
                machine: option.machine,
                start,
            };
            ends[g] = end;

            for &s in &info.successors {
                indegree[s] -= 1;
                if indegree[s] == 0 {
                    ready.push(s);
                }
            }
        }

        Self { genes }
    }

    /// Encodes an existing plan, filling jobs it does not cover greedily.
    ///
    /// Assignments naming a machine that is no longer eligible for the job
    /// are ignored.
    pub fn from_assignments<R: Rng>(
        problem: &SchedulingProblem<'_>,
        assignments: &[Assignment],
        rng: &mut R,
    ) -> Self {
        let mut chromosome = Self::greedy(problem, rng);
        for a in assignments {
            let Some(g) = problem.gene_for_job(&a.job_id) else {
                continue;
            };
            let Some(machine) = problem.machine_index(&a.machine_id) else {
                continue;
            };
            if problem.genes[g].option_for(machine).is_some() {
                chromosome.genes[g] = Gene {
                    machine,
                    start: a.start_slot,
                };
            }
        }
        chromosome
    }

    /// Whether every gene names an eligible machine and a start inside the horizon.
    pub fn is_valid(&self, problem: &SchedulingProblem<'_>) -> bool {
        self.genes.len() == problem.len()
            && self
                .genes
                .iter()
                .zip(&problem.genes)
                .all(|(gene, info)| info.option_for(gene.machine).is_some() && gene.start < problem.horizon)
    }
}

// ======================== Crossover operators ========================

/// Single-point crossover.
///
/// Picks a cut point in `1..len` and swaps the tails. Chromosomes with
/// fewer than two genes are copied unchanged.
pub fn single_point_crossover<R: Rng>(
    p1: &Chromosome,
    p2: &Chromosome,
    rng: &mut R,
) -> (Chromosome, Chromosome) {
    let len = p1.len().min(p2.len());
    if len < 2 {
        return (p1.clone(), p2.clone());
    }
    let cut = rng.random_range(1..len);

    let mut c1 = Vec::with_capacity(len);
    c1.extend_from_slice(&p1.genes[..cut]);
    c1.extend_from_slice(&p2.genes[cut..len]);

    let mut c2 = Vec::with_capacity(len);
    c2.extend_from_slice(&p2.genes[..cut]);
    c2.extend_from_slice(&p1.genes[cut..len]);

    (Chromosome::new(c1), Chromosome::new(c2))
}

// ======================== Mutation operators ========================

/// Per-gene mutation.
///
/// Each gene is, with probability `rate`, reassigned to a random eligible
/// machine and a random start slot at which the job still fits inside the
/// horizon. Returns the number of mutated genes.
pub fn gene_mutation<R: Rng>(
    chromosome: &mut Chromosome,
    problem: &SchedulingProblem<'_>,
    rate: f64,
    rng: &mut R,
) -> usize {
    let mut mutated = 0;
    for (gene, info) in chromosome.genes.iter_mut().zip(&problem.genes) {
        if !rng.random_bool(rate) {
            continue;
        }
        let Some(option) = info.options.choose(rng) else {
            continue;
        };
        let latest = problem.horizon.saturating_sub(option.duration);
        *gene = Gene {
            machine: option.machine,
            start: rng.random_range(0..=latest),
        };
        mutated += 1;
    }
    mutated
}
