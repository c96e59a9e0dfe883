//! Operation executors
//!
//! Two strategies implement the same three operations:
//! - `LocalExecutor` - in-process runner, serialized behind one gate
//! - `CliExecutor` - external stack CLI, one subprocess per call

pub mod cli;
pub mod local;

pub use cli::CliExecutor;
pub use local::LocalExecutor;

use async_trait::async_trait;
use stackd_foundation::{
    DestroyRequest, Error, OperationResult, ProvisionRequest, StopRequest,
};
use thiserror::Error as ThisError;

/// An operation failure that still carries the captured result.
///
/// Partial console output survives the error path so callers can return it
/// to the client.
#[derive(Debug, ThisError)]
#[error("{source}")]
pub struct OperationError {
    pub source: Error,
    pub result: OperationResult,
}

/// What every operation produces: a result, or a failure carrying one
pub type OperationOutcome = std::result::Result<OperationResult, OperationError>;

/// Executor trait - implement to add new execution strategies
#[async_trait]
pub trait Executor: Send + Sync {
    /// Provision the stack for a project (pre-clean stop, then start)
    async fn provision(&self, req: &ProvisionRequest) -> OperationOutcome;

    /// Stop a project's stack, preserving data volumes
    async fn stop(&self, req: &StopRequest) -> OperationOutcome;

    /// Tear a project's stack down
    async fn destroy(&self, req: &DestroyRequest) -> OperationOutcome;

    /// Get executor name
    fn name(&self) -> &'static str;
}
