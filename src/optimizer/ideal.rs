use crate::error::OptimizeResult;
use crate::optimizer::validation::{validate_cycle_time, validate_demand};
use crate::shared_data::{DemandVector, Direction};

/// Green time each direction would get if the cycle were split exactly by demand.
pub fn ideal_shares(
    demand: &DemandVector,
    total_cycle_time: f64,
) -> OptimizeResult<Vec<(Direction, f64)>> {
    validate_demand(demand)?;
    validate_cycle_time(total_cycle_time)?;

    let volumes: Vec<f64> = demand.iter().map(|r| r.volume).collect();
    let shares = proportional_shares(&volumes, total_cycle_time);
    Ok(demand.directions().cloned().zip(shares).collect())
}

// Caller guarantees a positive total.
pub(crate) fn proportional_shares(volumes: &[f64], total_cycle_time: f64) -> Vec<f64> {
    let total: f64 = volumes.iter().sum();
    volumes
        .iter()
        .map(|v| v / total * total_cycle_time)
        .collect()
}
