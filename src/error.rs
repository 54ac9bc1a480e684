use thiserror::Error;

/// Everything `optimize` can fail with. Nothing here is retried by the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizeError {
    /// The demand vector is empty, has negative/non-finite volumes, repeats a
    /// direction, or sums to zero.
    #[error("invalid demand: {0}")]
    InvalidDemand(String),

    /// Cycle parameters are malformed (as opposed to merely unsatisfiable).
    #[error("invalid cycle configuration: {0}")]
    InvalidConfig(String),

    /// The minimum greens alone need more time than the cycle offers.
    #[error(
        "infeasible cycle configuration: minimum green times need {required:.3}s but the cycle is {available:.3}s"
    )]
    InfeasibleConfig { required: f64, available: f64 },

    #[error("solver failure: {0}")]
    SolverFailure(String),

    /// The solver reported success but its answer breaks the sum or minimum bound.
    #[error("solver returned an inconsistent allocation: {0}")]
    SolverInconsistency(String),
}

pub type OptimizeResult<T> = Result<T, OptimizeError>;
