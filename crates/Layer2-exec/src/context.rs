//! Per-operation execution environment
//!
//! The stack runner historically leaned on process-wide state: the working
//! directory, a global configuration singleton, and flag-like globals. Here
//! every operation gets its own `ExecutionContext` value instead, so two
//! operations can never observe each other's environment and nothing needs
//! restoring afterwards.

use std::path::{Path, PathBuf};

use stackd_foundation::{paths, Error, Result};
use tracing::info;

/// Environment variable that disables runner telemetry for anything the
/// runner spawns.
pub const TELEMETRY_ENV: &str = "STACKCTL_TELEMETRY_DISABLED";

/// Process-level hostname override consulted when no operation-scoped
/// override is configured.
pub const HOSTNAME_ENV: &str = "STACKD_STACK_HOSTNAME";

/// Console output format the runner is asked to produce
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

/// Explicit ambient state for exactly one operation
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    project_root: PathBuf,
    project_ref: String,
    network_id: Option<String>,
    hostname: String,
    output_format: OutputFormat,
    env: Vec<(String, String)>,
}

impl ExecutionContext {
    /// Build the context for one operation.
    ///
    /// Fails with `Error::Environment` when the project root does not exist
    /// or is not a directory; the runner is never invoked in that case.
    pub fn prepare(
        project_root: &Path,
        project_ref: &str,
        network_id: Option<&str>,
        hostname_override: Option<&str>,
    ) -> Result<Self> {
        let project_root = paths::absolutize(project_root)?;
        let metadata = std::fs::metadata(&project_root).map_err(|err| {
            Error::Environment(format!(
                "cannot enter project root {}: {err}",
                project_root.display()
            ))
        })?;
        if !metadata.is_dir() {
            return Err(Error::Environment(format!(
                "project root {} is not a directory",
                project_root.display()
            )));
        }

        let hostname = resolve_hostname(hostname_override);
        info!(%hostname, project_ref, "prepared execution context");

        Ok(Self {
            project_root,
            project_ref: project_ref.to_string(),
            network_id: network_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from),
            hostname,
            output_format: OutputFormat::default(),
            env: vec![(TELEMETRY_ENV.to_string(), "true".to_string())],
        })
    }

    /// Filesystem root the operation runs against
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn project_ref(&self) -> &str {
        &self.project_ref
    }

    pub fn network_id(&self) -> Option<&str> {
        self.network_id.as_deref()
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    /// Environment pairs the runner must apply to any process it spawns
    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }
}

/// Operation-scoped override, else process env override, else the host's
/// own name.
fn resolve_hostname(hostname_override: Option<&str>) -> String {
    if let Some(hostname) = hostname_override.map(str::trim).filter(|h| !h.is_empty()) {
        return hostname.to_string();
    }
    if let Ok(hostname) = std::env::var(HOSTNAME_ENV) {
        let hostname = hostname.trim();
        if !hostname.is_empty() {
            return hostname.to_string();
        }
    }
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "localhost".to_string())
}
