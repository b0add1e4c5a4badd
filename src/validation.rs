//! Input validation for scheduling requests.
//!
//! Checks structural integrity of jobs, machines, and constraints before
//! any scheduling work. Detects:
//! - Duplicate IDs
//! - Non-positive dimensions, durations, capacities, productivity
//! - Unknown or self-referencing predecessors
//! - Circular precedence (DAG validation)
//! - Malformed maintenance windows, quotas, and horizons
//!
//! Precedence acyclicity is checked with Kahn's algorithm, which is
//! iterative and therefore safe on adversarially deep chains.
//!
//! # Reference
//! Kahn (1962), "Topological sorting of large networks"

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::models::{ConstraintSet, Job, Machine};

/// Validation result: the precedence order of the jobs on success.
pub type ValidationResult = Result<Vec<usize>, Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A dimension, duration, or capacity is zero.
    NonPositiveValue,
    /// Productivity factor is not a positive finite number.
    InvalidProductivity,
    /// A job references a predecessor that doesn't exist.
    UnknownPredecessor,
    /// A job lists itself as predecessor.
    SelfDependency,
    /// Precedence graph contains a cycle.
    PrecedenceCycle,
    /// A maintenance window references an unknown machine or is empty.
    InvalidMaintenanceWindow,
    /// A community quota is outside [0, 1].
    InvalidQuota,
    /// The planning horizon has no slots.
    EmptyHorizon,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a scheduling request.
///
/// # Returns
/// `Ok(order)` with the [`precedence_order`] of `jobs` if all checks pass,
/// `Err(errors)` with every detected issue.
pub fn validate_input(
    jobs: &[Job],
    machines: &[Machine],
    constraints: &ConstraintSet,
) -> ValidationResult {
    let mut errors = Vec::new();

    let mut machine_ids = HashSet::new();
    for m in machines {
        if !machine_ids.insert(m.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate machine ID: {}", m.id),
            ));
        }
        if m.max_warp == 0 || m.max_weft == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonPositiveValue,
                format!("Machine '{}' has zero warp or weft capacity", m.id),
            ));
        }
        if !m.productivity_factor.is_finite() || m.productivity_factor <= 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidProductivity,
                format!(
                    "Machine '{}' has invalid productivity factor {}",
                    m.id, m.productivity_factor
                ),
            ));
        }
    }

    let mut job_ids = HashSet::new();
    for job in jobs {
        if !job_ids.insert(job.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate job ID: {}", job.id),
            ));
        }
        if job.warp == 0 || job.weft == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonPositiveValue,
                format!("Job '{}' has zero warp or weft", job.id),
            ));
        }
        if job.estimated_duration == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonPositiveValue,
                format!("Job '{}' has zero estimated duration", job.id),
            ));
        }
    }

    for job in jobs {
        for pred in &job.predecessors {
            if *pred == job.id {
                errors.push(ValidationError::new(
                    ValidationErrorKind::SelfDependency,
                    format!("Job '{}' lists itself as predecessor", job.id),
                ));
            } else if !job_ids.contains(pred.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownPredecessor,
                    format!("Job '{}' references unknown predecessor '{}'", job.id, pred),
                ));
            }
        }
    }

    let order = match precedence_order(jobs) {
        Ok(order) => order,
        Err(cycle) => {
            errors.push(cycle);
            Vec::new()
        }
    };

    for w in &constraints.maintenance_windows {
        if !machine_ids.contains(w.machine_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidMaintenanceWindow,
                format!("Maintenance window references unknown machine '{}'", w.machine_id),
            ));
        }
        if w.end <= w.start {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidMaintenanceWindow,
                format!(
                    "Maintenance window [{}, {}) on '{}' is empty",
                    w.start, w.end, w.machine_id
                ),
            ));
        }
    }

    for (community, &quota) in &constraints.community_quotas {
        if !(0.0..=1.0).contains(&quota) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidQuota,
                format!("Quota for community '{community}' must be within [0, 1], got {quota}"),
            ));
        }
    }

    if constraints.horizon_slots() == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyHorizon,
            "Planning horizon has no slots",
        ));
    }

    if errors.is_empty() {
        Ok(order)
    } else {
        Err(errors)
    }
}

/// Topological order of `jobs` (indices into the slice).
///
/// Among jobs whose predecessors are all emitted, the smallest job ID
/// comes first, so the order is fully deterministic. Unknown and
/// self-referencing predecessors are ignored here (reported by
/// [`validate_input`]).
///
/// # Errors
/// `PrecedenceCycle` naming the jobs that could not be ordered.
pub fn precedence_order(jobs: &[Job]) -> Result<Vec<usize>, ValidationError> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(jobs.len());
    for (i, job) in jobs.iter().enumerate() {
        index.entry(job.id.as_str()).or_insert(i);
    }

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); jobs.len()];
    let mut indegree = vec![0usize; jobs.len()];
    for (i, job) in jobs.iter().enumerate() {
        let preds: BTreeSet<usize> = job
            .predecessors
            .iter()
            .filter_map(|p| index.get(p.as_str()).copied())
            .filter(|&p| p != i)
            .collect();
        for p in preds {
            successors[p].push(i);
            indegree[i] += 1;
        }
    }

    let mut ready: BTreeSet<(&str, usize)> = jobs
        .iter()
        .enumerate()
        .filter(|(i, _)| indegree[*i] == 0)
        .map(|(i, job)| (job.id.as_str(), i))
        .collect();

    let mut order = Vec::with_capacity(jobs.len());
    while let Some((_, i)) = ready.pop_first() {
        order.push(i);
        for &s in &successors[i] {
            indegree[s] -= 1;
            if indegree[s] == 0 {
                ready.insert((jobs[s].id.as_str(), s));
            }
        }
    }

    if order.len() == jobs.len() {
        return Ok(order);
    }

    let stuck: BTreeSet<&str> = (0..jobs.len())
        .filter(|&i| indegree[i] > 0)
        .map(|i| jobs[i].id.as_str())
        .collect();
    Err(ValidationError::new(
        ValidationErrorKind::PrecedenceCycle,
        format!(
            "Precedence cycle among jobs: {}",
            stuck.into_iter().collect::<Vec<_>>().join(", ")
        ),
    ))
}
