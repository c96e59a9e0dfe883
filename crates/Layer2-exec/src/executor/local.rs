//! Local executor - drives an in-process stack runner
//!
//! The runner is single-flight by construction, so the executor serializes
//! provision/stop/destroy behind one async gate. Each operation composes:
//! gate -> execution context -> capture harness -> runner. The gated body
//! runs on a detached task: a caller that stops awaiting (an HTTP deadline,
//! a dropped connection) must not release the gate while the runner is
//! still working.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use stackd_foundation::{
    DestroyRequest, Error, OperationResult, ProvisionRequest, Result, StopRequest,
};
use tokio::sync::Mutex;

use crate::capture::{self, OutputSink};
use crate::context::ExecutionContext;
use crate::executor::{Executor, OperationError, OperationOutcome};
use crate::runner::StackRunner;

/// In-process executor; one stack operation at a time
pub struct LocalExecutor {
    runner: Arc<dyn StackRunner>,
    gate: Arc<Mutex<()>>,
    hostname_override: Option<String>,
}

impl LocalExecutor {
    /// Create an executor around an injected stack runner
    pub fn new(runner: Arc<dyn StackRunner>) -> Self {
        Self {
            runner,
            gate: Arc::new(Mutex::new(())),
            hostname_override: None,
        }
    }

    /// Override the hostname seeded into every execution context
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname_override = Some(hostname.into());
        self
    }

    async fn run_gated<F>(&self, sink: OutputSink, operation: F) -> OperationOutcome
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let gate = Arc::clone(&self.gate);
        let task = tokio::spawn(async move {
            let _guard = gate.lock().await;
            capture::run_captured(&sink, operation).await
        });

        match task.await {
            Ok((result, None)) => Ok(result),
            Ok((result, Some(source))) => Err(OperationError { source, result }),
            // The capture harness traps operation panics, so a join error
            // here means the task itself was torn down.
            Err(join_error) => Err(OperationError {
                source: Error::Fault(format!("operation task failed: {join_error}")),
                result: OperationResult::default(),
            }),
        }
    }
}

#[async_trait]
impl Executor for LocalExecutor {
    async fn provision(&self, req: &ProvisionRequest) -> OperationOutcome {
        let req = req.clone();
        let runner = Arc::clone(&self.runner);
        let hostname = self.hostname_override.clone();
        let sink = OutputSink::new();
        let op_sink = sink.clone();

        self.run_gated(sink, async move {
            let ctx = ExecutionContext::prepare(
                Path::new(&req.project_root),
                &req.project_ref,
                Some(&req.network_id),
                hostname.as_deref(),
            )?;

            // Graceful pre-clean: a half-provisioned stack must not block a
            // fresh start. Nothing running is fine.
            match runner.stop(&ctx, &op_sink, true, false).await {
                Ok(()) => {}
                Err(error) if error.is_not_running() => {}
                Err(error) => return Err(error.with_operation("stack stop before start failed")),
            }

            runner
                .start(&ctx, &op_sink, &req.excluded_services, req.ignore_health_check)
                .await
                .map_err(|error| error.with_operation("stack start failed"))
        })
        .await
    }

    async fn stop(&self, req: &StopRequest) -> OperationOutcome {
        let req = req.clone();
        let runner = Arc::clone(&self.runner);
        let hostname = self.hostname_override.clone();
        let sink = OutputSink::new();
        let op_sink = sink.clone();

        self.run_gated(sink, async move {
            let ctx = ExecutionContext::prepare(
                Path::new(&req.project_root),
                &req.project_ref,
                None,
                hostname.as_deref(),
            )?;
            match runner.stop(&ctx, &op_sink, true, false).await {
                Ok(()) => Ok(()),
                Err(error) if error.is_not_running() => Ok(()),
                Err(error) => Err(error.with_operation("stack stop failed")),
            }
        })
        .await
    }

    async fn destroy(&self, req: &DestroyRequest) -> OperationOutcome {
        // Intentional parity with stop: no volume purge until product intent
        // says otherwise.
        let req = req.clone();
        let runner = Arc::clone(&self.runner);
        let hostname = self.hostname_override.clone();
        let sink = OutputSink::new();
        let op_sink = sink.clone();

        self.run_gated(sink, async move {
            let ctx = ExecutionContext::prepare(
                Path::new(&req.project_root),
                &req.project_ref,
                None,
                hostname.as_deref(),
            )?;
            match runner.stop(&ctx, &op_sink, true, false).await {
                Ok(()) => Ok(()),
                Err(error) if error.is_not_running() => Ok(()),
                Err(error) => Err(error.with_operation("stack stop failed")),
            }
        })
        .await
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
