//! Generational genetic search.
//!
//! Runs the state machine
//! `Initialized → Evaluating → Selecting → Breeding → Converged | Exhausted`
//! over index-addressed population buffers. Each generation is a fresh
//! buffer; elites carry their scores over so they are not re-evaluated.
//!
//! All randomness comes from one [`StdRng`] seeded with the run seed and
//! consumed on the calling thread only. Parallel evaluation never touches
//! the stream, so a run with `parallel_evaluation` on yields the same
//! outcome as one with it off.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, trace};

use super::operators::GeneticOperators;
use super::{decode, Chromosome, FitnessEvaluator, SchedulingProblem};
use crate::config::RunConfig;
use crate::error::Result;
use crate::models::{ScoreRecord, Termination};

/// Phase of a search run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchState {
    /// Initial population generated.
    Initialized,
    /// Decoding and scoring candidates.
    Evaluating,
    /// Ranking and picking elites and parents.
    Selecting,
    /// Producing offspring.
    Breeding,
    /// Stopped because the best score stopped improving.
    Converged,
    /// Stopped by a generation or time budget, or by cancellation.
    Exhausted,
}

/// Cooperative cancellation flag, checked once per generation boundary.
///
/// Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates an unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clears a pending cancellation.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Result of a search run.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Best candidate observed across the run.
    pub best: Chromosome,
    /// Its score.
    pub best_score: ScoreRecord,
    /// Generations bred after the initial population.
    pub generations: usize,
    /// Why the run stopped.
    pub termination: Termination,
    /// Best total score after the initial population and each generation.
    pub best_history: Vec<f64>,
}

/// A population member; `score` is `None` until evaluated.
#[derive(Debug, Clone)]
struct Candidate {
    chromosome: Chromosome,
    score: Option<ScoreRecord>,
}

impl Candidate {
    fn unscored(chromosome: Chromosome) -> Self {
        Self {
            chromosome,
            score: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Scored {
    chromosome: Chromosome,
    score: ScoreRecord,
}

/// Tracks stagnation of the best score.
#[derive(Debug, Clone)]
struct ConvergenceTracker {
    window: usize,
    epsilon: f64,
    reference: f64,
    stagnant: usize,
}

impl ConvergenceTracker {
    fn new(window: usize, epsilon: f64, initial: f64) -> Self {
        Self {
            window,
            epsilon,
            reference: initial,
            stagnant: 0,
        }
    }

    /// Records the best score of a generation.
    fn observe(&mut self, best: f64) {
        if self.reference - best > self.epsilon {
            self.reference = best;
            self.stagnant = 0;
        } else {
            self.stagnant += 1;
        }
    }

    fn is_converged(&self) -> bool {
        self.stagnant >= self.window
    }
}

/// Genetic search over one scheduling problem.
///
/// # Example
///
/// ```
/// use loom_schedule::feasibility::partition;
/// use loom_schedule::ga::{GeneticSearch, SchedulingProblem};
/// use loom_schedule::models::{ConstraintSet, Job, Machine, PatternType, PlanningHorizon};
/// use loom_schedule::validation::precedence_order;
/// use loom_schedule::RunConfig;
///
/// let jobs = vec![
///     Job::new("A", "north", PatternType::Plain, 40, 60, 3),
///     Job::new("B", "north", PatternType::Plain, 40, 60, 2),
/// ];
/// let machines = vec![Machine::new("L1", "north", 100, 100).with_capability(PatternType::Plain)];
/// let constraints = ConstraintSet::new(PlanningHorizon::new(24));
///
/// let order = precedence_order(&jobs).unwrap();
/// let report = partition(&jobs, &machines, &constraints, &order);
/// let problem = SchedulingProblem::new(&jobs, &machines, &constraints, &report);
///
/// let config = RunConfig::default().with_population_size(10).with_max_generations(5);
/// let outcome = GeneticSearch::new(&problem, &config).run(7).unwrap();
/// assert_eq!(outcome.best_score.makespan_slots, 5);
/// ```
#[derive(Debug)]
pub struct GeneticSearch<'p, 'a> {
    problem: &'p SchedulingProblem<'a>,
    config: &'p RunConfig,
    operators: GeneticOperators,
    evaluator: FitnessEvaluator<'p, 'a>,
    cancellation: Option<CancellationToken>,
    warm_start: Option<Chromosome>,
    state: SearchState,
}

impl<'p, 'a> GeneticSearch<'p, 'a> {
    /// Creates a search for a problem.
    pub fn new(problem: &'p SchedulingProblem<'a>, config: &'p RunConfig) -> Self {
        Self {
            problem,
            config,
            operators: GeneticOperators::from_config(config),
            evaluator: FitnessEvaluator::new(problem, config.fitness_weights),
            cancellation: None,
            warm_start: None,
            state: SearchState::Initialized,
        }
    }

    /// Checks the cancellation token between generations.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Seeds the initial population with a known candidate.
    ///
    /// Ignored unless it has one gene per schedulable job.
    pub fn with_warm_start(mut self, chromosome: Chromosome) -> Self {
        self.warm_start = Some(chromosome);
        self
    }

    /// Current phase.
    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Runs the search to termination.
    ///
    /// Returns the best candidate observed; elitism makes the best score
    /// non-increasing across generations.
    pub fn run(&mut self, seed: u64) -> Result<SearchOutcome> {
        self.config.validate()?;
        let started = Instant::now();
        let budget = self.config.time_budget_ms.map(Duration::from_millis);
        let mut rng = StdRng::seed_from_u64(seed);

        self.state = SearchState::Initialized;
        let population = self.initial_population(&mut rng);

        self.state = SearchState::Evaluating;
        let mut population = self.evaluate(population);
        let mut best = best_of(&population).clone();
        let mut best_history = vec![best.score.total];
        let mut tracker = ConvergenceTracker::new(
            self.config.convergence_window,
            self.config.convergence_epsilon,
            best.score.total,
        );
        trace!(
            population = population.len(),
            best = best.score.total,
            "initial population evaluated"
        );

        let mut generation = 0;
        let termination = loop {
            if self.cancellation.as_ref().is_some_and(CancellationToken::is_cancelled) {
                break Termination::Cancelled;
            }
            if tracker.is_converged() {
                break Termination::Converged;
            }
            if generation >= self.config.max_generations {
                break Termination::GenerationBudget;
            }
            if budget.is_some_and(|b| started.elapsed() >= b) {
                break Termination::TimeBudget;
            }

            self.state = SearchState::Selecting;
            let ranked = rank(&population);
            let fitness: Vec<f64> = population.iter().map(|c| c.score.total).collect();

            self.state = SearchState::Breeding;
            let next = self.breed(&population, &ranked, &fitness, &mut rng);
            generation += 1;

            self.state = SearchState::Evaluating;
            population = self.evaluate(next);

            let generation_best = best_of(&population);
            if generation_best.score.total < best.score.total {
                best = generation_best.clone();
            }
            best_history.push(best.score.total);
            tracker.observe(best.score.total);

            debug!(
                generation,
                best = best.score.total,
                makespan = best.score.makespan_slots,
                violated = best.score.violated_constraints,
                "generation complete"
            );
        };

        self.state = match termination {
            Termination::Converged => SearchState::Converged,
            _ => SearchState::Exhausted,
        };

        Ok(SearchOutcome {
            best: best.chromosome,
            best_score: best.score,
            generations: generation,
            termination,
            best_history,
        })
    }

    fn initial_population(&self, rng: &mut StdRng) -> Vec<Candidate> {
        let size = self.config.population_size;
        let mut population = Vec::with_capacity(size);
        if let Some(seeded) = &self.warm_start {
            if seeded.len() == self.problem.len() {
                population.push(Candidate::unscored(seeded.clone()));
            }
        }
        while population.len() < size {
            population.push(Candidate::unscored(Chromosome::greedy(self.problem, rng)));
        }
        population
    }

    /// Scores every unscored candidate, preserving population order.
    fn evaluate(&self, population: Vec<Candidate>) -> Vec<Scored> {
        let evaluate_one = |candidate: Candidate| {
            let score = candidate.score.unwrap_or_else(|| {
                let decoded = decode(self.problem, &candidate.chromosome);
                self.evaluator.score(&decoded)
            });
            Scored {
                chromosome: candidate.chromosome,
                score,
            }
        };

        if self.config.parallel_evaluation {
            population.into_par_iter().map(evaluate_one).collect()
        } else {
            population.into_iter().map(evaluate_one).collect()
        }
    }

    fn breed(
        &self,
        population: &[Scored],
        ranked: &[usize],
        fitness: &[f64],
        rng: &mut StdRng,
    ) -> Vec<Candidate> {
        let size = self.config.population_size;
        let elites = self.config.elite_count().min(size);

        let mut next: Vec<Candidate> = ranked[..elites]
            .iter()
            .map(|&i| Candidate {
                chromosome: population[i].chromosome.clone(),
                score: Some(population[i].score),
            })
            .collect();

        while next.len() < size {
            let p1 = self.operators.select(fitness, rng);
            let p2 = self.operators.select(fitness, rng);
            let (mut c1, mut c2) = self.operators.crossover(
                &population[p1].chromosome,
                &population[p2].chromosome,
                rng,
            );
            self.operators.mutate(&mut c1, self.problem, rng);
            self.operators.mutate(&mut c2, self.problem, rng);

            next.push(Candidate::unscored(c1));
            if next.len() < size {
                next.push(Candidate::unscored(c2));
            }
        }
        next
    }
}

/// Population indices ordered best first; ties keep the lower index first.
fn rank(population: &[Scored]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..population.len()).collect();
    order.sort_by(|&a, &b| {
        population[a]
            .score
            .total
            .total_cmp(&population[b].score.total)
            .then(a.cmp(&b))
    });
    order
}

/// Best candidate; the first one wins ties.
fn best_of(population: &[Scored]) -> &Scored {
    let mut best = &population[0];
    for candidate in &population[1..] {
        if candidate.score.total < best.score.total {
            best = candidate;
        }
    }
    best
}
