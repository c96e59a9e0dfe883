//! stackd execution layer
//!
//! Everything between a validated HTTP request and the stack runner:
//! - `ExecutionContext` - explicit per-operation environment
//! - `OutputSink` / capture harness - console capture with fault containment
//! - `StackRunner` - the injected stack-lifecycle capability
//! - `LocalExecutor` - serialized in-process strategy
//! - `CliExecutor` - subprocess-per-call strategy

pub mod capture;
pub mod context;
pub mod executor;
pub mod runner;

pub use capture::OutputSink;
pub use context::{ExecutionContext, OutputFormat};
pub use executor::{CliExecutor, Executor, LocalExecutor, OperationError, OperationOutcome};
pub use runner::StackRunner;
