//! CLI executor - drives the external stack CLI binary
//!
//! One subprocess per operation. The OS process boundary is the isolation
//! mechanism here, so there is no gate and no output capture: the child
//! inherits the agent's stdio and its own globals die with it.

use std::path::PathBuf;
use std::time::Instant;

use async_trait::async_trait;
use stackd_foundation::{
    DestroyRequest, Error, OperationResult, ProvisionRequest, Result, StopRequest,
};
use tokio::process::Command;
use tracing::{info, warn};

use crate::context::TELEMETRY_ENV;
use crate::executor::{Executor, OperationError, OperationOutcome};

/// Subprocess-per-call executor around an external stack CLI
pub struct CliExecutor {
    binary: PathBuf,
}

impl CliExecutor {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run(&self, project_root: &str, args: Vec<String>) -> Result<()> {
        info!(
            binary = %self.binary.display(),
            args = %args.join(" "),
            cwd = project_root,
            "running stack command"
        );

        let status = Command::new(&self.binary)
            .args(&args)
            .current_dir(project_root)
            .env(TELEMETRY_ENV, "true")
            .kill_on_drop(true)
            .status()
            .await?;

        if !status.success() {
            return Err(Error::Runner(format!(
                "{} {} exited with {status}",
                self.binary.display(),
                args.join(" ")
            )));
        }
        Ok(())
    }

    async fn stop_stack(&self, project_root: &str) -> Result<()> {
        self.run(project_root, vec!["stop".into(), "--yes".into()])
            .await
    }
}

#[async_trait]
impl Executor for CliExecutor {
    async fn provision(&self, req: &ProvisionRequest) -> OperationOutcome {
        let started = Instant::now();

        // Best-effort pre-clean; a stale stack must not block the start.
        if let Err(error) = self.stop_stack(&req.project_root).await {
            warn!(
                error = %error,
                project_ref = %req.project_ref,
                project_root = %req.project_root,
                "initial stack stop failed, continuing with start"
            );
        }

        let mut args = vec!["start".to_string()];
        if req.ignore_health_check {
            args.push("--ignore-health-check".into());
        }
        let network_id = req.network_id.trim();
        if !network_id.is_empty() {
            args.push("--network-id".into());
            args.push(network_id.to_string());
        }
        for service in &req.excluded_services {
            let service = service.trim();
            if service.is_empty() {
                continue;
            }
            args.push("--exclude".into());
            args.push(service.to_string());
        }

        match self.run(&req.project_root, args).await {
            Ok(()) => Ok(elapsed_result(started)),
            Err(error) => Err(OperationError {
                source: error.with_operation("stack start failed"),
                result: elapsed_result(started),
            }),
        }
    }

    async fn stop(&self, req: &StopRequest) -> OperationOutcome {
        let started = Instant::now();
        match self.stop_stack(&req.project_root).await {
            Ok(()) => Ok(elapsed_result(started)),
            Err(error) => Err(OperationError {
                source: error.with_operation("stack stop failed"),
                result: elapsed_result(started),
            }),
        }
    }

    async fn destroy(&self, req: &DestroyRequest) -> OperationOutcome {
        let started = Instant::now();
        match self.stop_stack(&req.project_root).await {
            Ok(()) => Ok(elapsed_result(started)),
            // A CLI exit failure here almost always means "already stopped";
            // teardown stays idempotent. Spawn failures still surface.
            Err(Error::Runner(message)) => {
                warn!(
                    error = %message,
                    project_ref = %req.project_ref,
                    project_root = %req.project_root,
                    "stack stop failed during destroy, continuing"
                );
                Ok(elapsed_result(started))
            }
            Err(error) => Err(OperationError {
                source: error,
                result: elapsed_result(started),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "cli"
    }
}

fn elapsed_result(started: Instant) -> OperationResult {
    OperationResult {
        stdout: String::new(),
        stderr: String::new(),
        duration_ms: started.elapsed().as_millis() as u64,
    }
}
