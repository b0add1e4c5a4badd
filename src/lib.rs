//! Production scheduling for community-owned loom fleets.
//!
//! Assigns weaving jobs to machines and time slots. Capability, capacity,
//! precedence, and maintenance windows are hard constraints; makespan,
//! machine utilization, deadline lateness, and community fairness are
//! optimized by a seeded genetic search. Identical inputs and seed give a
//! bit-identical schedule.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Job`, `Machine`, `ConstraintSet`,
//!   `Schedule`, `MachineCalendar`
//! - **`validation`**: Input integrity checks (duplicate IDs, precedence
//!   cycles, bad dimensions, maintenance windows, quotas)
//! - **`feasibility`**: Per-job eligible machines and early rejection
//! - **`ga`**: Chromosome encoding, repair decoder, fitness, and search
//! - **`scheduler`**: `compute_schedule` facade and schedule KPIs
//! - **`ports`**: Snapshot source / schedule sink seams with an in-memory store
//! - **`config`**, **`error`**, **`telemetry`**: Run configuration, error
//!   taxonomy, tracing setup
//!
//! # Example
//!
//! ```
//! use loom_schedule::models::{ConstraintSet, Job, Machine, PatternType, PlanningHorizon};
//! use loom_schedule::{compute_schedule, RunConfig, ScheduleRequest};
//!
//! let jobs = vec![
//!     Job::new("A", "north", PatternType::Plain, 40, 60, 3),
//!     Job::new("B", "south", PatternType::Twill, 40, 60, 2).with_predecessor("A"),
//! ];
//! let machines = vec![
//!     Machine::new("L1", "north", 100, 100).with_capability(PatternType::Plain),
//!     Machine::new("L2", "south", 100, 100).with_capability(PatternType::Twill),
//! ];
//! let request = ScheduleRequest::new(jobs, machines, ConstraintSet::new(PlanningHorizon::new(24)))
//!     .with_config(RunConfig::default().with_population_size(20).with_max_generations(20))
//!     .with_seed(42);
//!
//! let schedule = compute_schedule(&request).unwrap();
//! let a = schedule.assignment_for("A").unwrap();
//! let b = schedule.assignment_for("B").unwrap();
//! assert!(b.start_slot >= a.end_slot);
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Cheng et al. (1996), "A Tutorial Survey of JSSP using GA"

pub mod config;
pub mod error;
pub mod feasibility;
pub mod ga;
pub mod models;
pub mod ports;
pub mod scheduler;
pub mod telemetry;
pub mod validation;

pub use config::{FitnessWeights, RunConfig};
pub use error::{Result, SchedulerError};
pub use scheduler::{compute_schedule, ScheduleKpi, ScheduleRequest, Scheduler};
