pub mod config;
pub mod control_system;
pub mod error;
pub mod global_variables;
pub mod monitoring;
pub mod optimizer;
pub mod sensors;
pub mod service;
pub mod shared_data;

pub use error::{OptimizeError, OptimizeResult};
pub use optimizer::{ideal_shares, optimize, optimize_with_timeout};
pub use shared_data::{Allocation, CycleConfig, DemandVector, Direction, MinGreenTime};
