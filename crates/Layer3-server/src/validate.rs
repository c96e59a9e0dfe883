//! Request validation
//!
//! Every rule runs before the executor is touched; a violation means the
//! operation has no side effects at all.

use std::path::Path;

use stackd_foundation::{
    paths, Config, DestroyRequest, Error, ProvisionRequest, Result, StopRequest,
};

pub fn provision(req: &ProvisionRequest, config: &Config) -> Result<()> {
    if req.project_id <= 0 {
        return Err(Error::Validation("project_id must be positive".into()));
    }
    require("project_ref", &req.project_ref)?;
    require("project_name", &req.project_name)?;
    require("project_root", &req.project_root)?;
    require("database_password", &req.database_password)?;
    require("network_id", &req.network_id)?;
    allowlisted_root(&req.project_root, config)
}

pub fn stop(req: &StopRequest, config: &Config) -> Result<()> {
    require("project_ref", &req.project_ref)?;
    require("project_root", &req.project_root)?;
    allowlisted_root(&req.project_root, config)
}

pub fn destroy(req: &DestroyRequest, config: &Config) -> Result<()> {
    require("project_ref", &req.project_ref)?;
    require("project_root", &req.project_root)?;
    allowlisted_root(&req.project_root, config)
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Confine the supplied root to the configured allowlist directory.
///
/// The comparison is component-wise on the absolutized, lexically cleaned
/// path, so `/projects-evil` can not pass as a child of `/projects`.
fn allowlisted_root(root: &str, config: &Config) -> Result<()> {
    let Some(projects_root) = &config.projects_root else {
        return Ok(());
    };
    match paths::is_within(Path::new(root.trim()), projects_root) {
        Ok(true) => Ok(()),
        Ok(false) => Err(Error::Validation(format!(
            "project_root must be inside {}",
            projects_root.display()
        ))),
        Err(error) => Err(Error::Validation(format!(
            "project_root could not be resolved: {error}"
        ))),
    }
}
