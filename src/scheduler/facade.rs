//! Scheduler facade.
//!
//! The public entry point of a scheduling run:
//!
//! 1. Validate the run configuration and the input (fail fast, nothing
//!    is scheduled on invalid input).
//! 2. Order jobs by precedence and run the feasibility filter.
//! 3. If no job is schedulable, return an empty plan.
//! 4. Otherwise run the genetic search to termination and decode its best
//!    candidate into the committed [`Schedule`].
//!
//! A run owns its population, random stream, and buffers; nothing is
//! shared between concurrent calls.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, info_span, warn};

use crate::config::RunConfig;
use crate::error::{Result, SchedulerError};
use crate::feasibility::partition;
use crate::ga::{decode, CancellationToken, Chromosome, GeneticSearch, SchedulingProblem};
use crate::models::{
    Assignment, ConstraintSet, Job, Machine, Schedule, ScoreRecord, Termination, Unschedulable,
};
use crate::ports::{ScheduleSink, SnapshotSource};
use crate::validation::validate_input;

/// Stream salt for encoding a warm-start plan, kept apart from the search stream.
const WARM_START_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Input of one scheduling run.
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    /// Jobs to schedule.
    pub jobs: Vec<Job>,
    /// Machine fleet.
    pub machines: Vec<Machine>,
    /// Maintenance, quotas, and horizon.
    pub constraints: ConstraintSet,
    /// Search parameters.
    pub config: RunConfig,
    /// Seed of the run's random stream.
    pub seed: u64,
    /// Version of the latest committed schedule (0 if none).
    pub previous_version: u64,
    /// Prior plan used to seed the initial population.
    pub warm_start: Option<Schedule>,
}

impl ScheduleRequest {
    /// Creates a request with the default configuration and seed 0.
    pub fn new(jobs: Vec<Job>, machines: Vec<Machine>, constraints: ConstraintSet) -> Self {
        Self {
            jobs,
            machines,
            constraints,
            config: RunConfig::default(),
            seed: 0,
            previous_version: 0,
            warm_start: None,
        }
    }

    /// Sets the run configuration.
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the version the new schedule increments from.
    pub fn with_previous_version(mut self, version: u64) -> Self {
        self.previous_version = version;
        self
    }

    /// Seeds the search with a prior plan (re-optimization).
    pub fn with_warm_start(mut self, schedule: Schedule) -> Self {
        self.warm_start = Some(schedule);
        self
    }
}

/// Computes a schedule for a request.
///
/// Shorthand for [`Scheduler::compute`] without cancellation.
///
/// # Errors
/// `InvalidInput` for malformed data or cyclic precedence, `InvalidConfig`
/// for out-of-range parameters. Unschedulable jobs and exhausted budgets
/// are reported on the returned schedule.
///
/// # Example
///
/// ```
/// use loom_schedule::models::{ConstraintSet, Job, Machine, PatternType, PlanningHorizon};
/// use loom_schedule::{compute_schedule, RunConfig, ScheduleRequest};
///
/// let jobs = vec![Job::new("A", "north", PatternType::Plain, 40, 60, 4)];
/// let machines = vec![Machine::new("L1", "north", 100, 100).with_capability(PatternType::Plain)];
/// let request = ScheduleRequest::new(jobs, machines, ConstraintSet::new(PlanningHorizon::new(24)))
///     .with_config(RunConfig::default().with_population_size(10).with_max_generations(10))
///     .with_seed(1);
///
/// let schedule = compute_schedule(&request).unwrap();
/// assert_eq!(schedule.version, 1);
/// assert_eq!(schedule.assignments.len(), 1);
/// ```
pub fn compute_schedule(request: &ScheduleRequest) -> Result<Schedule> {
    Scheduler::new().compute(request)
}

/// Runs scheduling requests, optionally under a cancellation token.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    cancellation: CancellationToken,
}

impl Scheduler {
    /// Creates a scheduler with its own cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a shared cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Token that cancels the next run of this scheduler at its next
    /// generation boundary.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Computes a schedule for a request under the scheduler's token.
    ///
    /// A cancellation is consumed by the run that observes it: the token is
    /// reset afterwards, so later runs search normally.
    pub fn compute(&self, request: &ScheduleRequest) -> Result<Schedule> {
        let schedule = self.compute_with(request, &self.cancellation)?;
        if schedule.termination == Termination::Cancelled {
            self.cancellation.reset();
        }
        Ok(schedule)
    }

    /// Computes a schedule for a request under a caller-owned token.
    ///
    /// The token is only read; it stays set after a cancelled run.
    pub fn compute_with(
        &self,
        request: &ScheduleRequest,
        cancellation: &CancellationToken,
    ) -> Result<Schedule> {
        let span = info_span!(
            "compute_schedule",
            seed = request.seed,
            jobs = request.jobs.len(),
            machines = request.machines.len()
        );
        let _enter = span.enter();

        request.config.validate()?;
        let order = validate_input(&request.jobs, &request.machines, &request.constraints)
            .map_err(SchedulerError::InvalidInput)?;

        let report = partition(&request.jobs, &request.machines, &request.constraints, &order);
        let version = request.previous_version.saturating_add(1);

        if report.is_empty() {
            warn!(
                unschedulable = report.unschedulable.len(),
                "no schedulable jobs, returning empty plan"
            );
            return Ok(Schedule {
                version,
                assignments: Vec::new(),
                score: ScoreRecord {
                    violated_constraints: count(report.unschedulable.len()),
                    ..ScoreRecord::default()
                },
                unschedulable: report.unschedulable,
                seed: request.seed,
                generations: 0,
                termination: Termination::Trivial,
            });
        }

        let problem = SchedulingProblem::new(
            &request.jobs,
            &request.machines,
            &request.constraints,
            &report,
        );
        let mut search = GeneticSearch::new(&problem, &request.config)
            .with_cancellation(cancellation.clone());
        if let Some(previous) = &request.warm_start {
            let mut rng = StdRng::seed_from_u64(request.seed ^ WARM_START_SALT);
            search = search.with_warm_start(Chromosome::from_assignments(
                &problem,
                &previous.assignments,
                &mut rng,
            ));
        }
        let outcome = search.run(request.seed)?;
        let decoded = decode(&problem, &outcome.best);

        let mut assignments: Vec<Assignment> = decoded
            .placed()
            .map(|(g, p)| {
                Assignment::new(
                    problem.job(g).id.clone(),
                    request.machines[p.machine].id.clone(),
                    p.start,
                    p.end,
                )
            })
            .collect();
        assignments.sort_by(|a, b| a.job_id.cmp(&b.job_id));

        let filtered = report.unschedulable.len();
        let mut unschedulable = report.unschedulable;
        unschedulable.extend(
            decoded
                .unplaced
                .iter()
                .map(|&(g, reason)| Unschedulable::new(problem.job(g).id.clone(), reason)),
        );
        unschedulable.sort_by(|a, b| a.job_id.cmp(&b.job_id));

        if !unschedulable.is_empty() {
            warn!(
                unschedulable = unschedulable.len(),
                "some jobs could not be scheduled"
            );
        }

        let mut score = outcome.best_score;
        score.violated_constraints += count(filtered);

        info!(
            version,
            assignments = assignments.len(),
            makespan = score.makespan_slots,
            score = score.total,
            generations = outcome.generations,
            termination = ?outcome.termination,
            "schedule computed"
        );

        Ok(Schedule {
            version,
            assignments,
            score,
            unschedulable,
            seed: request.seed,
            generations: outcome.generations,
            termination: outcome.termination,
        })
    }

    /// Takes a snapshot, computes a schedule on it, and commits the result.
    ///
    /// The new version increments the snapshot's latest committed version,
    /// and the latest plan seeds the search.
    pub fn run_from<S>(&self, store: &S, config: &RunConfig, seed: u64) -> Result<Schedule>
    where
        S: SnapshotSource + ScheduleSink,
    {
        let snapshot = store.snapshot()?;
        let mut request = ScheduleRequest::new(snapshot.jobs, snapshot.machines, snapshot.constraints)
            .with_config(config.clone())
            .with_seed(seed);
        if let Some(latest) = snapshot.latest {
            request = request
                .with_previous_version(latest.version)
                .with_warm_start(latest.as_ref().clone());
        }

        let schedule = self.compute(&request)?;
        store.commit(schedule.clone())?;
        Ok(schedule)
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        JobState, PatternType, PlanningHorizon, ScheduleWarning, UnschedulableReason,
    };

    fn fast_config() -> RunConfig {
        RunConfig::default()
            .with_population_size(16)
            .with_max_generations(20)
            .with_convergence(8, 1e-9)
    }

    fn loom(id: &str, pattern: PatternType) -> Machine {
        Machine::new(id, "north", 100, 100).with_capability(pattern)
    }

    #[test]
    fn test_version_increments() {
        let request = ScheduleRequest::new(
            vec![Job::new("A", "north", PatternType::Plain, 10, 10, 2)],
            vec![loom("L1", PatternType::Plain)],
            ConstraintSet::new(PlanningHorizon::new(10)),
        )
        .with_config(fast_config())
        .with_previous_version(41);

        let schedule = compute_schedule(&request).unwrap();
        assert_eq!(schedule.version, 42);
        assert_eq!(schedule.assignment_for("A").map(|a| a.machine_id.as_str()), Some("L1"));
    }

    #[test]
    fn test_no_schedulable_jobs_is_not_an_error() {
        let request = ScheduleRequest::new(
            vec![
                Job::new("A", "north", PatternType::Satin, 10, 10, 2),
                Job::new("B", "north", PatternType::Plain, 10, 10, 2)
                    .with_state(JobState::Completed),
            ],
            vec![loom("L1", PatternType::Plain)],
            ConstraintSet::new(PlanningHorizon::new(10)),
        )
        .with_config(fast_config());

        let schedule = compute_schedule(&request).unwrap();
        assert!(schedule.assignments.is_empty());
        assert_eq!(schedule.termination, Termination::Trivial);
        assert_eq!(schedule.reason_for("A"), Some(UnschedulableReason::NoCapableMachine));
        assert_eq!(schedule.reason_for("B"), Some(UnschedulableReason::InactiveState));
        assert_eq!(schedule.score.violated_constraints, 2);
    }

    #[test]
    fn test_invalid_config_fails_before_scheduling() {
        let request = ScheduleRequest::new(
            vec![Job::new("A", "north", PatternType::Plain, 10, 10, 2)],
            vec![loom("L1", PatternType::Plain)],
            ConstraintSet::new(PlanningHorizon::new(10)),
        )
        .with_config(RunConfig::default().with_mutation_rate(1.5));

        assert!(matches!(
            compute_schedule(&request),
            Err(SchedulerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_cancelled_scheduler_still_returns_plan() {
        let scheduler = Scheduler::new();
        scheduler.cancellation_token().cancel();
        let request = ScheduleRequest::new(
            vec![
                Job::new("A", "north", PatternType::Plain, 10, 10, 2),
                Job::new("B", "north", PatternType::Plain, 10, 10, 3),
            ],
            vec![loom("L1", PatternType::Plain)],
            ConstraintSet::new(PlanningHorizon::new(10)),
        )
        .with_config(fast_config());

        let schedule = scheduler.compute(&request).unwrap();
        assert_eq!(schedule.termination, Termination::Cancelled);
        assert_eq!(schedule.generations, 0);
        assert_eq!(schedule.assignments.len(), 2);
    }

    #[test]
    fn test_cancellation_is_consumed_by_one_run() {
        let scheduler = Scheduler::new();
        let token = scheduler.cancellation_token();
        let request = ScheduleRequest::new(
            vec![
                Job::new("A", "north", PatternType::Plain, 10, 10, 2),
                Job::new("B", "north", PatternType::Plain, 10, 10, 3),
            ],
            vec![loom("L1", PatternType::Plain), loom("L2", PatternType::Plain)],
            ConstraintSet::new(PlanningHorizon::new(10)),
        )
        .with_config(fast_config().with_max_generations(5).with_convergence(1000, 1e-9));

        token.cancel();
        let first = scheduler.compute(&request).unwrap();
        assert_eq!(first.termination, Termination::Cancelled);
        assert!(!token.is_cancelled());

        let second = scheduler.compute(&request).unwrap();
        assert_eq!(second.termination, Termination::GenerationBudget);
        assert_eq!(second.generations, 5);
        assert!(second.warnings().iter().all(|w| !matches!(w, ScheduleWarning::Cancelled { .. })));
    }

    #[test]
    fn test_compute_with_leaves_caller_token_set() {
        let scheduler = Scheduler::new();
        let request = ScheduleRequest::new(
            vec![Job::new("A", "north", PatternType::Plain, 10, 10, 2)],
            vec![loom("L1", PatternType::Plain)],
            ConstraintSet::new(PlanningHorizon::new(10)),
        )
        .with_config(fast_config().with_max_generations(3).with_convergence(1000, 1e-9));

        let token = CancellationToken::new();
        token.cancel();
        let cancelled = scheduler.compute_with(&request, &token).unwrap();
        assert_eq!(cancelled.termination, Termination::Cancelled);
        assert_eq!(
            cancelled.warnings(),
            vec![ScheduleWarning::Cancelled { generations: 0 }]
        );
        assert!(token.is_cancelled());

        let own = scheduler.compute(&request).unwrap();
        assert_eq!(own.termination, Termination::GenerationBudget);
        assert_eq!(own.generations, 3);
    }

    #[test]
    fn test_warm_start_keeps_result_valid() {
        let jobs = vec![
            Job::new("A", "north", PatternType::Plain, 10, 10, 2),
            Job::new("B", "north", PatternType::Plain, 10, 10, 3),
        ];
        let machines = vec![loom("L1", PatternType::Plain), loom("L2", PatternType::Plain)];
        let constraints = ConstraintSet::new(PlanningHorizon::new(10));
        let first = compute_schedule(
            &ScheduleRequest::new(jobs.clone(), machines.clone(), constraints.clone())
                .with_config(fast_config())
                .with_seed(3),
        )
        .unwrap();

        let second = compute_schedule(
            &ScheduleRequest::new(jobs, machines, constraints)
                .with_config(fast_config())
                .with_seed(4)
                .with_previous_version(first.version)
                .with_warm_start(first.clone()),
        )
        .unwrap();

        assert_eq!(second.version, 2);
        assert!(second.score.total <= first.score.total);
        assert_eq!(second.makespan(), 3);
    }
}
