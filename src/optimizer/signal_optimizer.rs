// signal_optimizer.rs

use good_lp::{
    constraint, default_solver, variable, variables, Expression, ResolutionError, Solution,
    SolverModel, Variable,
};
use tokio::task::{self, JoinError};
use tokio::time::error::Elapsed;
use tokio::time::{timeout, Duration};

use crate::error::{OptimizeError, OptimizeResult};
use crate::optimizer::ideal::proportional_shares;
use crate::optimizer::validation::{
    check_allocation, check_feasibility, resolve_min_green, validate_cycle_time, validate_demand,
};
use crate::shared_data::{Allocation, CycleConfig, DemandVector, DirectionTiming};

/// Splits `config.total_cycle_time` across the directions of `demand`.
///
/// Each direction gets at least its minimum green and the greens add up to the
/// cycle. Among those allocations the one with the smallest total absolute
/// deviation from the demand-proportional shares is returned. When several
/// allocations tie, whichever vertex the solver lands on is accepted.
///
/// # Errors
///
/// - [`OptimizeError::InvalidDemand`] / [`OptimizeError::InvalidConfig`] for bad input.
/// - [`OptimizeError::InfeasibleConfig`] when the minimums exceed the cycle; the
///   solver is not invoked in that case.
/// - [`OptimizeError::SolverFailure`] when the LP does not solve to optimality.
/// - [`OptimizeError::SolverInconsistency`] when the solver's answer breaks the
///   sum or minimum-bound invariant.
pub fn optimize(demand: &DemandVector, config: &CycleConfig) -> OptimizeResult<Allocation> {
    validate_demand(demand)?;
    validate_cycle_time(config.total_cycle_time)?;
    let minimums = resolve_min_green(demand, config)?;
    check_feasibility(&minimums, config.total_cycle_time)?;

    let volumes: Vec<f64> = demand.iter().map(|r| r.volume).collect();
    let ideal = proportional_shares(&volumes, config.total_cycle_time);
    log::debug!(
        "Ideal shares for {} directions over {:.2}s: {:?}",
        ideal.len(),
        config.total_cycle_time,
        ideal
    );

    let greens = solve_min_deviation(&ideal, &minimums, config.total_cycle_time)?;

    let timings = demand
        .iter()
        .zip(minimums)
        .zip(ideal)
        .zip(greens)
        .map(|(((reading, min_green), ideal), green)| DirectionTiming {
            direction: reading.direction.clone(),
            demand: reading.volume,
            min_green,
            ideal,
            green,
        })
        .collect();
    let allocation = Allocation::new(config.total_cycle_time, timings);
    check_allocation(&allocation)?;

    log::info!(
        "Optimized {} directions: total deviation {:.4}s",
        allocation.len(),
        allocation.total_deviation()
    );
    Ok(allocation)
}

/// Runs [`optimize`] on the blocking pool and gives up after `limit`.
///
/// A solve that does not finish in time, or whose task dies, is reported as
/// [`OptimizeError::SolverFailure`]. The abandoned solve is left to finish on
/// its own thread.
pub async fn optimize_with_timeout(
    demand: DemandVector,
    config: CycleConfig,
    limit: Duration,
) -> OptimizeResult<Allocation> {
    let solve = task::spawn_blocking(move || optimize(&demand, &config));
    settle_timed_solve(timeout(limit, solve).await, limit)
}

// Folds the timer and the blocking task outcomes into one result.
fn settle_timed_solve<T>(
    outcome: Result<Result<OptimizeResult<T>, JoinError>, Elapsed>,
    limit: Duration,
) -> OptimizeResult<T> {
    match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(OptimizeError::SolverFailure(format!(
            "solve task did not complete: {}",
            join_error
        ))),
        Err(_) => {
            log::warn!("Signal timing solve exceeded {:?}", limit);
            Err(OptimizeError::SolverFailure(format!(
                "no solution within {:?}",
                limit
            )))
        }
    }
}

/// min  sum(dev)
/// s.t. green - dev <= ideal, green + dev >= ideal  (dev >= |green - ideal|)
///      sum(green) == total
///      green >= min, dev >= 0
fn solve_min_deviation(
    ideal: &[f64],
    minimums: &[f64],
    total_cycle_time: f64,
) -> OptimizeResult<Vec<f64>> {
    let n = ideal.len();
    let mut vars = variables!();

    let mut green: Vec<Variable> = Vec::with_capacity(n);
    let mut deviation: Vec<Variable> = Vec::with_capacity(n);
    let mut objective = Expression::with_capacity(n);
    for (idx, &min_green) in minimums.iter().enumerate() {
        green.push(vars.add(variable().min(min_green).name(format!("green_{}", idx))));
        let dev = vars.add(variable().min(0.0).name(format!("dev_{}", idx)));
        objective.add_mul(1.0, dev);
        deviation.push(dev);
    }

    let mut problem = vars.minimise(objective).using(default_solver);

    for ((&g, &d), &target) in green.iter().zip(&deviation).zip(ideal) {
        problem = problem
            .with(constraint!(g - d <= target))
            .with(constraint!(g + d >= target));
    }

    let mut cycle = Expression::with_capacity(n);
    for &g in &green {
        cycle.add_mul(1.0, g);
    }
    problem = problem.with(constraint!(cycle == total_cycle_time));

    let solution = problem.solve().map_err(|e| {
        log::warn!("Signal timing LP with {} directions failed: {}", n, e);
        solver_failure(e)
    })?;

    Ok(green.iter().map(|&g| solution.value(g)).collect())
}

fn solver_failure(error: ResolutionError) -> OptimizeError {
    match error {
        ResolutionError::Infeasible => {
            OptimizeError::SolverFailure("solver reported the model infeasible".to_string())
        }
        ResolutionError::Unbounded => {
            OptimizeError::SolverFailure("solver reported the model unbounded".to_string())
        }
        other => OptimizeError::SolverFailure(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared_data::Direction;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-4,
            "expected {expected}, got {actual}"
        );
    }

    fn green(allocation: &Allocation, name: &str) -> f64 {
        allocation
            .green(&Direction::from(name))
            .unwrap_or_else(|| panic!("no allocation for {name}"))
    }

    #[test]
    fn proportional_split_when_minimums_are_slack() {
        let allocation =
            optimize(&DemandVector::default_intersection(), &CycleConfig::default()).unwrap();

        assert_close(green(&allocation, "North"), 50.0 / 220.0 * 120.0);
        assert_close(green(&allocation, "East"), 80.0 / 220.0 * 120.0);
        assert_close(green(&allocation, "South"), 60.0 / 220.0 * 120.0);
        assert_close(green(&allocation, "West"), 30.0 / 220.0 * 120.0);
        assert_close(allocation.total_green(), 120.0);
        assert!(allocation.total_deviation() < 1e-4);
    }

    #[test]
    fn equal_demand_splits_evenly() {
        let demand: DemandVector = [("A", 1.0), ("B", 1.0), ("C", 1.0), ("D", 1.0)]
            .into_iter()
            .collect();
        let allocation = optimize(&demand, &CycleConfig::new(120.0, 10.0)).unwrap();
        for name in ["A", "B", "C", "D"] {
            assert_close(green(&allocation, name), 30.0);
        }
    }

    #[test]
    fn minimums_override_a_dominant_direction() {
        let demand: DemandVector = [("A", 1.0), ("B", 0.0), ("C", 0.0)].into_iter().collect();
        let allocation = optimize(&demand, &CycleConfig::new(30.0, 10.0)).unwrap();
        for name in ["A", "B", "C"] {
            assert_close(green(&allocation, name), 10.0);
        }
        assert_close(allocation.ideal(&Direction::from("A")).unwrap(), 30.0);
        assert_close(allocation.total_deviation(), 40.0);
    }

    #[test]
    fn oversized_minimums_fail_before_solving() {
        let demand: DemandVector = [("A", 1.0), ("B", 2.0), ("C", 3.0), ("D", 4.0)]
            .into_iter()
            .collect();
        let err = optimize(&demand, &CycleConfig::new(120.0, 40.0)).unwrap_err();
        assert_eq!(
            err,
            OptimizeError::InfeasibleConfig {
                required: 160.0,
                available: 120.0
            }
        );
    }

    #[test]
    fn per_direction_minimum_is_honoured() {
        let demand: DemandVector = [("Main", 90.0), ("Side", 10.0)].into_iter().collect();
        let config = CycleConfig::with_min_green_per_direction(
            100.0,
            [(Direction::from("Main"), 20.0), (Direction::from("Side"), 25.0)],
        );
        let allocation = optimize(&demand, &config).unwrap();
        assert_close(green(&allocation, "Side"), 25.0);
        assert_close(green(&allocation, "Main"), 75.0);
    }

    #[test]
    fn single_direction_takes_the_whole_cycle() {
        let demand: DemandVector = [("Only", 5.0)].into_iter().collect();
        let allocation = optimize(&demand, &CycleConfig::new(45.0, 10.0)).unwrap();
        assert_close(green(&allocation, "Only"), 45.0);
    }

    #[test]
    fn result_keeps_demand_order_and_keys() {
        let demand = DemandVector::default_intersection();
        let allocation = optimize(&demand, &CycleConfig::default()).unwrap();
        let expected: Vec<&Direction> = demand.directions().collect();
        let actual: Vec<&Direction> = allocation.directions().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn invalid_demand_is_reported_as_such() {
        let err = optimize(&DemandVector::new(), &CycleConfig::default()).unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidDemand(_)));
    }

    #[test]
    fn solver_statuses_map_to_solver_failure() {
        let infeasible = solver_failure(ResolutionError::Infeasible);
        assert!(matches!(&infeasible, OptimizeError::SolverFailure(msg) if msg.contains("infeasible")));

        let unbounded = solver_failure(ResolutionError::Unbounded);
        assert!(matches!(&unbounded, OptimizeError::SolverFailure(msg) if msg.contains("unbounded")));

        let other = solver_failure(ResolutionError::Str("numerical trouble".to_string()));
        assert!(matches!(&other, OptimizeError::SolverFailure(msg) if msg.contains("numerical trouble")));
    }

    #[tokio::test]
    async fn elapsed_timer_becomes_solver_failure() {
        let limit = Duration::from_millis(5);
        let elapsed = timeout(limit, std::future::pending::<()>())
            .await
            .unwrap_err();

        let err = settle_timed_solve::<Allocation>(Err(elapsed), limit).unwrap_err();
        assert!(matches!(&err, OptimizeError::SolverFailure(msg) if msg.contains("no solution within")));
    }

    #[tokio::test]
    async fn dead_solve_task_becomes_solver_failure() {
        let join_error = task::spawn_blocking(|| -> OptimizeResult<Allocation> {
            panic!("solver crashed")
        })
        .await
        .unwrap_err();

        let err = settle_timed_solve::<Allocation>(Ok(Err(join_error)), Duration::from_secs(1)).unwrap_err();
        assert!(matches!(&err, OptimizeError::SolverFailure(msg) if msg.contains("did not complete")));
    }

    #[test]
    fn finished_solve_passes_through() {
        let ok = settle_timed_solve(Ok(Ok(Ok(7_u32))), Duration::from_secs(1));
        assert_eq!(ok, Ok(7));

        let failed = settle_timed_solve::<u32>(
            Ok(Ok(Err(OptimizeError::InvalidDemand("empty".to_string())))),
            Duration::from_secs(1),
        );
        assert!(matches!(failed, Err(OptimizeError::InvalidDemand(_))));
    }

    #[tokio::test]
    async fn timeout_wrapper_returns_the_solution() {
        let allocation = optimize_with_timeout(
            DemandVector::default_intersection(),
            CycleConfig::default(),
            Duration::from_secs(10),
        )
        .await
        .unwrap();
        assert_close(allocation.total_green(), 120.0);
    }

    #[tokio::test]
    async fn timeout_wrapper_passes_errors_through() {
        let demand: DemandVector = [("A", 1.0), ("B", 1.0)].into_iter().collect();
        let err = optimize_with_timeout(demand, CycleConfig::new(10.0, 10.0), Duration::from_secs(10))
            .await
            .unwrap_err();
        assert!(matches!(err, OptimizeError::InfeasibleConfig { .. }));
    }
}
