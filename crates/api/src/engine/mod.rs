//! Job execution engine.
//!
//! - [`optimizer`]: the external optimization collaborator and its HTTP client.
//! - [`runner`]: drives one job from `queued` to a terminal state.
//! - [`supervisor`]: owns the background tasks the request handlers spawn.

pub mod optimizer;
pub mod runner;
pub mod supervisor;

pub use optimizer::{HttpOptimizer, OptimizationRequest, Optimizer, RunnerError};
pub use runner::JobRunner;
pub use supervisor::JobSupervisor;
