//! Run configuration for the genetic search.
//!
//! A [`RunConfig`] is an immutable value threaded through every call of a
//! run; concurrent runs with different configurations never share it.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};

/// Weights of the four fitness terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessWeights {
    /// Makespan weight.
    pub makespan: f64,
    /// Utilization penalty weight.
    pub utilization: f64,
    /// Priority/deadline violation weight.
    pub priority: f64,
    /// Fairness deviation weight.
    pub fairness: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            makespan: 0.4,
            utilization: 0.3,
            priority: 0.2,
            fairness: 0.1,
        }
    }
}

impl FitnessWeights {
    fn validate(&self) -> Result<()> {
        let all = [
            ("makespan", self.makespan),
            ("utilization", self.utilization),
            ("priority", self.priority),
            ("fairness", self.fairness),
        ];
        for (name, w) in all {
            if !w.is_finite() || w < 0.0 {
                return Err(SchedulerError::InvalidConfig(format!(
                    "fitness weight `{name}` must be a finite non-negative number"
                )));
            }
        }
        Ok(())
    }
}

/// Genetic search parameters.
///
/// # Example
///
/// ```
/// use loom_schedule::RunConfig;
///
/// let config = RunConfig::default()
///     .with_population_size(60)
///     .with_max_generations(200)
///     .with_parallel(false);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Candidates per generation.
    pub population_size: usize,
    /// Generations bred after the initial population.
    pub max_generations: usize,
    /// Consecutive non-improving generations that count as converged.
    pub convergence_window: usize,
    /// Minimum improvement of the best score that resets the window.
    pub convergence_epsilon: f64,
    /// Per-gene mutation probability.
    pub mutation_rate: f64,
    /// Fraction of the population carried over unchanged.
    pub elite_fraction: f64,
    /// Candidates drawn per tournament.
    pub tournament_size: usize,
    /// Probability that a selected pair is recombined.
    pub crossover_rate: f64,
    /// Evaluate candidates of a generation on the rayon pool.
    pub parallel_evaluation: bool,
    /// Wall-clock budget in milliseconds, checked between generations.
    pub time_budget_ms: Option<u64>,
    /// Fitness term weights.
    pub fitness_weights: FitnessWeights,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 500,
            convergence_window: 50,
            convergence_epsilon: 1e-9,
            mutation_rate: 0.05,
            elite_fraction: 0.1,
            tournament_size: 3,
            crossover_rate: 0.9,
            parallel_evaluation: true,
            time_budget_ms: None,
            fitness_weights: FitnessWeights::default(),
        }
    }
}

impl RunConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Sets the generation budget.
    pub fn with_max_generations(mut self, generations: usize) -> Self {
        self.max_generations = generations;
        self
    }

    /// Sets the convergence window and epsilon.
    pub fn with_convergence(mut self, window: usize, epsilon: f64) -> Self {
        self.convergence_window = window;
        self.convergence_epsilon = epsilon;
        self
    }

    /// Sets the per-gene mutation probability.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Sets the elite fraction.
    pub fn with_elite_fraction(mut self, fraction: f64) -> Self {
        self.elite_fraction = fraction;
        self
    }

    /// Sets the tournament size.
    pub fn with_tournament_size(mut self, size: usize) -> Self {
        self.tournament_size = size;
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel_evaluation = parallel;
        self
    }

    /// Sets the wall-clock budget.
    pub fn with_time_budget_ms(mut self, budget_ms: u64) -> Self {
        self.time_budget_ms = Some(budget_ms);
        self
    }

    /// Sets the fitness weights.
    pub fn with_weights(mut self, weights: FitnessWeights) -> Self {
        self.fitness_weights = weights;
        self
    }

    /// Number of elites carried into each new generation (at least one).
    pub fn elite_count(&self) -> usize {
        let raw = (self.elite_fraction * self.population_size as f64).ceil() as usize;
        raw.clamp(1, self.population_size.max(1))
    }

    /// Validates ranges.
    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(SchedulerError::InvalidConfig(
                "population_size must be at least 2".into(),
            ));
        }
        if self.convergence_window == 0 {
            return Err(SchedulerError::InvalidConfig(
                "convergence_window must be greater than 0".into(),
            ));
        }
        if self.tournament_size == 0 {
            return Err(SchedulerError::InvalidConfig(
                "tournament_size must be greater than 0".into(),
            ));
        }
        if !self.convergence_epsilon.is_finite() || self.convergence_epsilon < 0.0 {
            return Err(SchedulerError::InvalidConfig(
                "convergence_epsilon must be a finite non-negative number".into(),
            ));
        }
        let probabilities = [
            ("mutation_rate", self.mutation_rate),
            ("elite_fraction", self.elite_fraction),
            ("crossover_rate", self.crossover_rate),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(SchedulerError::InvalidConfig(format!(
                    "{name} must be within [0, 1]"
                )));
            }
        }
        self.fitness_weights.validate()
    }

    /// Parses a configuration from JSON and validates it.
    ///
    /// Missing fields take their defaults.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let config: RunConfig = serde_json::from_str(input)
            .map_err(|e| SchedulerError::InvalidConfig(format!("parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}
