//! Scoped destroy for provisioned deployments.

use tracing::{error, info};

use crate::runner::CommandRunner;
use crate::terraform::{Terraform, TerraformError};

/// Destroys the deployment exactly once: on [`TeardownGuard::release`], or
/// on drop if it was never released (early return or panic).
///
/// Arm the guard before provisioning so partially created resources are
/// also removed.
#[derive(Debug)]
pub struct TeardownGuard<'a, R: CommandRunner> {
    terraform: &'a Terraform<R>,
    verify_clean_state: bool,
    armed: bool,
}

impl<'a, R: CommandRunner> TeardownGuard<'a, R> {
    /// Arms a guard for `terraform`. When `verify_clean_state` is set, the
    /// destroy is followed by a residual state check.
    #[must_use]
    pub const fn arm(terraform: &'a Terraform<R>, verify_clean_state: bool) -> Self {
        Self {
            terraform,
            verify_clean_state,
            armed: true,
        }
    }

    /// Destroys the deployment now and disarms the guard.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError`] when destroy fails or resources remain.
    pub fn release(mut self) -> Result<(), TerraformError> {
        self.armed = false;
        destroy_deployment(self.terraform, self.verify_clean_state)
    }
}

impl<R: CommandRunner> Drop for TeardownGuard<'_, R> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;
        if let Err(err) = destroy_deployment(self.terraform, self.verify_clean_state) {
            error!(error = %err, "teardown during unwind failed; resources may remain");
        }
    }
}

/// Runs `terraform destroy` and, optionally, confirms state is empty.
///
/// # Errors
///
/// Returns [`TerraformError`] when destroy fails or, with
/// `verify_clean_state`, when resources remain in state.
pub fn destroy_deployment<R: CommandRunner>(
    terraform: &Terraform<R>,
    verify_clean_state: bool,
) -> Result<(), TerraformError> {
    info!(dir = %terraform.options().terraform_dir, "destroying deployment");
    terraform.destroy()?;
    if verify_clean_state {
        terraform.ensure_clean()?;
    }
    info!("deployment destroyed");
    Ok(())
}
