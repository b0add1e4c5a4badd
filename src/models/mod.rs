//! Scheduling domain models.
//!
//! Value types describing a production snapshot (jobs, machines,
//! constraints) and the committed plan produced for it.
//!
//! # Domain Mappings
//!
//! | loom-schedule | Weaving floor |
//! |---------------|---------------|
//! | Job | Weaving order (warp × weft, pattern type) |
//! | Machine | Loom with fixed capabilities and bed size |
//! | Slot | Discrete unit of the planning horizon |
//! | Schedule | Committed production plan |
//!
//! All times are expressed in slots relative to the planning horizon
//! start (slot 0). The consumer defines the wall-clock length of a slot.

mod calendar;
mod constraint;
mod job;
mod machine;
mod schedule;

/// A discrete time unit within the planning horizon.
pub type Slot = u32;

pub use calendar::{MachineCalendar, TimeWindow};
pub use constraint::{ConstraintSet, MaintenanceWindow, PlanningHorizon};
pub use job::{Job, JobState, PatternType, Priority};
pub use machine::{Machine, MachineStatus, MachineStatusUpdate};
pub use schedule::{
    Assignment, Schedule, ScheduleWarning, ScoreRecord, Termination, Unschedulable,
    UnschedulableReason,
};
