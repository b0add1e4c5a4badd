//! GA-based schedule optimization.
//!
//! Searches over per-job `(machine, start slot)` assignments. Every
//! candidate is decoded through a deterministic repair pass into a
//! feasible plan and scored by a normalized weighted objective.
//!
//! # Encoding
//!
//! One gene per schedulable job, ordered by job identifier. A gene holds
//! the index of an eligible machine and a proposed start slot; the decoder
//! shifts starts forward to resolve machine overlaps, precedence, and
//! maintenance windows.
//!
//! # Submodules
//!
//! - [`operators`]: tournament selection, single-point crossover,
//!   per-gene mutation
//! - [`engine`]: generational search loop and termination
//!
//! # Reference
//! - Cheng et al. (1996), "A Tutorial Survey of JSSP using GA"
//! - Goldberg (1989), "Genetic Algorithms in Search, Optimization and Machine Learning"

mod chromosome;
mod decoder;
pub mod engine;
mod fitness;
pub mod operators;
mod problem;

pub use chromosome::{Chromosome, Gene};
pub use decoder::{decode, DecodedSchedule, Placement};
pub use engine::{CancellationToken, GeneticSearch, SearchOutcome, SearchState};
pub use fitness::FitnessEvaluator;
pub use problem::{GeneInfo, SchedulingProblem};
