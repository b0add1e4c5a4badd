//! Genetic operators for the schedule search.
//!
//! Bundles tournament selection, single-point crossover, and per-gene
//! mutation with the rates of one run via [`GeneticOperators`].
//!
//! # Usage
//!
//! ```
//! use loom_schedule::ga::operators::GeneticOperators;
//! use loom_schedule::RunConfig;
//!
//! let ops = GeneticOperators::from_config(&RunConfig::default());
//! assert_eq!(ops.tournament_size, 3);
//! assert_eq!(ops.crossover_rate, 0.9);
//! ```

use rand::Rng;

use super::chromosome::{gene_mutation, single_point_crossover, Chromosome};
use super::problem::SchedulingProblem;
use crate::config::RunConfig;

/// Operator rates of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneticOperators {
    /// Candidates drawn per tournament.
    pub tournament_size: usize,
    /// Probability that a selected pair is recombined.
    pub crossover_rate: f64,
    /// Per-gene mutation probability.
    pub mutation_rate: f64,
}

impl Default for GeneticOperators {
    fn default() -> Self {
        Self::from_config(&RunConfig::default())
    }
}

impl GeneticOperators {
    /// Takes the operator rates from a run configuration.
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            tournament_size: config.tournament_size,
            crossover_rate: config.crossover_rate,
            mutation_rate: config.mutation_rate,
        }
    }

    /// Tournament selection over fitness values (lower is better).
    ///
    /// Draws `tournament_size` indices with replacement and returns the
    /// best one; equal fitness goes to the lower index.
    ///
    /// # Panics
    /// Panics if `fitness` is empty.
    pub fn select<R: Rng>(&self, fitness: &[f64], rng: &mut R) -> usize {
        let n = fitness.len();
        let mut best = rng.random_range(0..n);
        for _ in 1..self.tournament_size.max(1) {
            let challenger = rng.random_range(0..n);
            let better = fitness[challenger]
                .total_cmp(&fitness[best])
                .then(challenger.cmp(&best))
                .is_lt();
            if better {
                best = challenger;
            }
        }
        best
    }

    /// Recombines a pair with probability `crossover_rate`, otherwise
    /// returns copies of the parents.
    pub fn crossover<R: Rng>(
        &self,
        p1: &Chromosome,
        p2: &Chromosome,
        rng: &mut R,
    ) -> (Chromosome, Chromosome) {
        if rng.random_bool(self.crossover_rate) {
            single_point_crossover(p1, p2, rng)
        } else {
            (p1.clone(), p2.clone())
        }
    }

    /// Applies per-gene mutation. Returns the number of mutated genes.
    pub fn mutate<R: Rng>(
        &self,
        chromosome: &mut Chromosome,
        problem: &SchedulingProblem<'_>,
        rng: &mut R,
    ) -> usize {
        gene_mutation(chromosome, problem, self.mutation_rate, rng)
    }
}
