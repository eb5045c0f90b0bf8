//! Configuration errors, validation and parallelism policy.

pub mod errors;
pub mod parallel;

pub use errors::{ConfigError, ConfigValidator};
pub use parallel::ParallelPolicy;
