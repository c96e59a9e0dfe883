//! Stack runner capability
//!
//! The component that actually starts and stops the local service stack
//! (containers, migrations) lives outside this crate. Executors consume it
//! through this seam; tests substitute recording fakes.

use async_trait::async_trait;
use stackd_foundation::Result;

use crate::capture::OutputSink;
use crate::context::ExecutionContext;

/// Injected stack-lifecycle capability
#[async_trait]
pub trait StackRunner: Send + Sync {
    /// Bring the stack up for the context's project.
    ///
    /// `excluded_services` are not started; `ignore_health_check` skips the
    /// post-start health verification.
    async fn start(
        &self,
        ctx: &ExecutionContext,
        sink: &OutputSink,
        excluded_services: &[String],
        ignore_health_check: bool,
    ) -> Result<()>;

    /// Take the stack down.
    ///
    /// `preserve_data` retains persistent volumes; `all` tears down every
    /// project's stack instead of only the context's. Returns
    /// `Error::NotRunning` when there is nothing to stop.
    async fn stop(
        &self,
        ctx: &ExecutionContext,
        sink: &OutputSink,
        preserve_data: bool,
        all: bool,
    ) -> Result<()>;
}
