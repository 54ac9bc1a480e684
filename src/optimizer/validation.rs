use std::collections::HashSet;

use crate::error::{OptimizeError, OptimizeResult};
use crate::global_variables::SOLVER_TOLERANCE;
use crate::shared_data::{Allocation, CycleConfig, DemandVector, MinGreenTime};

/// Rejects demand the proportional targets cannot be computed from.
pub fn validate_demand(demand: &DemandVector) -> OptimizeResult<()> {
    if demand.is_empty() {
        return Err(OptimizeError::InvalidDemand(
            "at least one direction is required".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(demand.len());
    for reading in demand.iter() {
        if !seen.insert(&reading.direction) {
            return Err(OptimizeError::InvalidDemand(format!(
                "direction '{}' appears more than once",
                reading.direction
            )));
        }
        if !reading.volume.is_finite() || reading.volume < 0.0 {
            return Err(OptimizeError::InvalidDemand(format!(
                "direction '{}' has volume {}, expected a finite value >= 0",
                reading.direction, reading.volume
            )));
        }
    }

    let total = demand.total_volume();
    if !total.is_finite() {
        return Err(OptimizeError::InvalidDemand(format!(
            "total volume {} is not a finite number",
            total
        )));
    }
    if total <= 0.0 {
        return Err(OptimizeError::InvalidDemand(
            "total volume is zero, proportional shares are undefined".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_cycle_time(total_cycle_time: f64) -> OptimizeResult<()> {
    if !total_cycle_time.is_finite() || total_cycle_time <= 0.0 {
        return Err(OptimizeError::InvalidConfig(format!(
            "total_cycle_time must be a positive number of seconds, got {}",
            total_cycle_time
        )));
    }
    Ok(())
}

/// Resolves the configured minimum for every direction, in demand order.
///
/// A per-direction map must name exactly the directions present in `demand`.
pub fn resolve_min_green(demand: &DemandVector, config: &CycleConfig) -> OptimizeResult<Vec<f64>> {
    if let MinGreenTime::PerDirection(map) = &config.min_green_time {
        if let Some(extra) = map.keys().find(|d| demand.volume(d).is_none()) {
            return Err(OptimizeError::InvalidConfig(format!(
                "minimum green given for unknown direction '{}'",
                extra
            )));
        }
    }

    demand
        .iter()
        .map(|reading| {
            let min = config
                .min_green_time
                .for_direction(&reading.direction)
                .ok_or_else(|| {
                    OptimizeError::InvalidConfig(format!(
                        "no minimum green configured for direction '{}'",
                        reading.direction
                    ))
                })?;
            if !min.is_finite() || min < 0.0 {
                return Err(OptimizeError::InvalidConfig(format!(
                    "minimum green for '{}' is {}, expected a finite value >= 0",
                    reading.direction, min
                )));
            }
            Ok(min)
        })
        .collect()
}

/// Fails fast when the minimums cannot fit in the cycle at all.
/// Rounding noise within solver tolerance still counts as an exact fit.
pub fn check_feasibility(minimums: &[f64], total_cycle_time: f64) -> OptimizeResult<()> {
    let required: f64 = minimums.iter().sum();
    if required > total_cycle_time + tolerance_for(total_cycle_time) {
        return Err(OptimizeError::InfeasibleConfig {
            required,
            available: total_cycle_time,
        });
    }
    Ok(())
}

pub fn tolerance_for(total_cycle_time: f64) -> f64 {
    SOLVER_TOLERANCE * total_cycle_time.abs().max(1.0)
}

/// Re-checks the sum and minimum-bound invariants on a solved allocation.
pub fn check_allocation(allocation: &Allocation) -> OptimizeResult<()> {
    let tolerance = tolerance_for(allocation.cycle_time);

    for timing in allocation.timings() {
        if !timing.green.is_finite() {
            return Err(OptimizeError::SolverInconsistency(format!(
                "direction '{}' was given a non-finite green time",
                timing.direction
            )));
        }
        if timing.green < timing.min_green - tolerance {
            return Err(OptimizeError::SolverInconsistency(format!(
                "direction '{}' got {:.6}s, below its minimum of {:.6}s",
                timing.direction, timing.green, timing.min_green
            )));
        }
    }

    let total = allocation.total_green();
    if (total - allocation.cycle_time).abs() > tolerance {
        return Err(OptimizeError::SolverInconsistency(format!(
            "greens sum to {:.6}s instead of the {:.6}s cycle",
            total, allocation.cycle_time
        )));
    }
    Ok(())
}
