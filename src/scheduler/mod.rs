//! Scheduler facade and KPI evaluation.
//!
//! # Facade
//!
//! [`compute_schedule`] and [`Scheduler`] validate a request, filter jobs
//! no machine can run, and hand the rest to the genetic search. The
//! result is always a complete account of the input: every job is either
//! assigned or listed as unschedulable with a reason.
//!
//! # KPI
//!
//! [`ScheduleKpi`] computes reporting metrics of a committed schedule:
//! makespan, lateness, on-time rate, machine utilization, and community
//! shares.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1.2
//! - Baker & Trietsch (2019), "Principles of Sequencing and Scheduling"

mod facade;
mod kpi;

pub use facade::{compute_schedule, ScheduleRequest, Scheduler};
pub use kpi::ScheduleKpi;
