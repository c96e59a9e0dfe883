//! Wire types shared by the server and executor layers

use serde::{Deserialize, Serialize};

/// Request to provision the full stack for one project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvisionRequest {
    #[serde(default)]
    pub project_id: i64,

    #[serde(default)]
    pub project_ref: String,

    #[serde(default)]
    pub project_name: String,

    #[serde(default)]
    pub organization_slug: String,

    /// Filesystem root of the project the stack runs in
    #[serde(default)]
    pub project_root: String,

    #[serde(default)]
    pub cloud_provider: String,

    #[serde(default)]
    pub region: String,

    #[serde(default)]
    pub database_password: String,

    /// Service names the runner must not start
    #[serde(default)]
    pub excluded_services: Vec<String>,

    #[serde(default)]
    pub network_id: String,

    /// Skip the runner's post-start health verification
    #[serde(default)]
    pub ignore_health_check: bool,
}

/// Request to stop a running stack, preserving its data volumes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopRequest {
    #[serde(default)]
    pub project_ref: String,

    #[serde(default)]
    pub project_root: String,
}

/// Request to tear a stack down.
///
/// Currently identical in effect to a stop; the organization slug is
/// informational.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DestroyRequest {
    #[serde(default)]
    pub project_ref: String,

    #[serde(default)]
    pub project_root: String,

    #[serde(default)]
    pub organization_slug: String,
}

/// Captured console output and timing for one operation.
///
/// Produced exactly once per operation, including failed ones - partial
/// output is preserved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationResult {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stdout: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stderr: String,

    #[serde(default)]
    pub duration_ms: u64,
}
