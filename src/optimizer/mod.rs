pub mod ideal;
pub mod signal_optimizer;
pub mod validation;

// Re-export the entry points
pub use ideal::ideal_shares;
pub use signal_optimizer::{optimize, optimize_with_timeout};
