//! Orchestrates the end-to-end verification of a deployment.
//!
//! The workflow arms a teardown guard, provisions the Terraform root module,
//! reads the two URL outputs, runs the HTTP checks in order, and destroys the
//! deployment. Destroy is attempted exactly once whether provisioning fails,
//! checks fail, or the run unwinds.

use std::fmt::Display;

use thiserror::Error;
use tracing::info;

use crate::probe::{CheckReport, Prober};
use crate::runner::CommandRunner;
use crate::terraform::{Terraform, TerraformError};

mod suite;
mod teardown;

pub use suite::{
    DEFAULT_GREETING, DEFAULT_POST_STATUS, DeploymentOutputs, FUNCTION_URL_OUTPUT,
    LOAD_BALANCER_URL_OUTPUT, SuiteExpectations, UNAUTHORISED_STATUSES, hello_world_checks,
};
pub use teardown::{TeardownGuard, destroy_deployment};

/// Errors that stop a verification run. Failed checks are not errors; they
/// are reported in [`VerifyReport`].
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Raised when `init` or `apply` fails.
    #[error("failed to provision deployment: {message}")]
    Provision {
        /// Human-readable description of the failure.
        message: String,
        /// Underlying Terraform error.
        #[source]
        source: TerraformError,
    },
    /// Raised when an output cannot be read.
    #[error("failed to read output {name}: {message}")]
    Output {
        /// Output key that was requested.
        name: String,
        /// Human-readable description of the failure.
        message: String,
        /// Underlying Terraform error.
        #[source]
        source: TerraformError,
    },
    /// Raised when an output is not an absolute URL.
    #[error("output {name} is not a valid URL ({value}): {message}")]
    InvalidOutput {
        /// Output key that was requested.
        name: String,
        /// Value Terraform returned.
        value: String,
        /// Human-readable description of the failure.
        message: String,
    },
    /// Raised when destroy fails after the checks ran.
    #[error("failed to destroy deployment: {source}")]
    Teardown {
        /// Underlying Terraform error.
        #[source]
        source: TerraformError,
        /// Results of the checks that ran before teardown.
        report: Box<VerifyReport>,
    },
}

impl VerifyError {
    fn with_teardown_note(self, teardown_error: Option<&TerraformError>) -> Self {
        match self {
            Self::Provision { message, source } => Self::Provision {
                message: append_teardown_note(message, teardown_error),
                source,
            },
            Self::Output {
                name,
                message,
                source,
            } => Self::Output {
                name,
                message: append_teardown_note(message, teardown_error),
                source,
            },
            Self::InvalidOutput {
                name,
                value,
                message,
            } => Self::InvalidOutput {
                name,
                value,
                message: append_teardown_note(message, teardown_error),
            },
            teardown @ Self::Teardown { .. } => teardown,
        }
    }
}

/// Results of a verification run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VerifyReport {
    /// Outputs the checks ran against.
    pub outputs: DeploymentOutputs,
    /// One report per check, in execution order.
    pub checks: Vec<CheckReport>,
}

impl VerifyReport {
    /// Returns `true` when every check passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.checks.iter().all(CheckReport::passed)
    }

    /// Returns the checks that did not pass.
    #[must_use]
    pub fn failures(&self) -> Vec<&CheckReport> {
        self.checks.iter().filter(|check| !check.passed()).collect()
    }
}

/// Executes the verification flow using the provided Terraform wrapper and
/// prober.
#[derive(Debug)]
pub struct VerifyOrchestrator<R: CommandRunner, P: Prober> {
    terraform: Terraform<R>,
    prober: P,
    expectations: SuiteExpectations,
    load_balancer_output: String,
    function_output: String,
    verify_clean_state: bool,
}

impl<R: CommandRunner, P: Prober> VerifyOrchestrator<R, P> {
    /// Creates an orchestrator with default expectations and output names.
    #[must_use]
    pub fn new(terraform: Terraform<R>, prober: P) -> Self {
        Self {
            terraform,
            prober,
            expectations: SuiteExpectations::default(),
            load_balancer_output: LOAD_BALANCER_URL_OUTPUT.to_owned(),
            function_output: FUNCTION_URL_OUTPUT.to_owned(),
            verify_clean_state: false,
        }
    }

    /// Overrides the values responses are compared against.
    #[must_use]
    pub fn with_expectations(mut self, expectations: SuiteExpectations) -> Self {
        self.expectations = expectations;
        self
    }

    /// Overrides the Terraform output names holding the two URLs.
    #[must_use]
    pub fn with_output_names(
        mut self,
        load_balancer_output: impl Into<String>,
        function_output: impl Into<String>,
    ) -> Self {
        self.load_balancer_output = load_balancer_output.into();
        self.function_output = function_output.into();
        self
    }

    /// Enables the residual state check after destroy.
    #[must_use]
    pub const fn with_clean_state_check(mut self, enabled: bool) -> Self {
        self.verify_clean_state = enabled;
        self
    }

    /// Runs the end-to-end workflow and returns the check results.
    ///
    /// Failed checks are reported in the returned [`VerifyReport`]; the
    /// caller decides how to surface them. Teardown is always attempted;
    /// when it fails after another error, the teardown failure is appended
    /// to that error's message.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError`] when provisioning, output retrieval, or
    /// teardown fail.
    pub async fn execute(&self) -> Result<VerifyReport, VerifyError> {
        let guard = TeardownGuard::arm(&self.terraform, self.verify_clean_state);
        let outcome = self.provision_and_check().await;
        let teardown = guard.release();

        match (outcome, teardown) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(report), Err(source)) => Err(VerifyError::Teardown {
                source,
                report: Box::new(report),
            }),
            (Err(err), teardown_result) => {
                Err(err.with_teardown_note(teardown_result.err().as_ref()))
            }
        }
    }

    async fn provision_and_check(&self) -> Result<VerifyReport, VerifyError> {
        info!(dir = %self.terraform.options().terraform_dir, "provisioning deployment");
        self.terraform
            .init_and_apply()
            .map_err(|source| VerifyError::Provision {
                message: source.to_string(),
                source,
            })?;

        let outputs = DeploymentOutputs {
            load_balancer_url: self.read_url_output(&self.load_balancer_output)?,
            function_url: self.read_url_output(&self.function_output)?,
        };
        info!(
            load_balancer_url = %outputs.load_balancer_url,
            function_url = %outputs.function_url,
            "deployment ready"
        );

        let mut checks = Vec::new();
        for check in hello_world_checks(&outputs, &self.expectations) {
            info!(
                check = %check.name,
                method = %check.request.method,
                url = %check.request.url,
                "running check"
            );
            checks.push(check.run(&self.prober).await);
        }

        Ok(VerifyReport { outputs, checks })
    }

    fn read_url_output(&self, name: &str) -> Result<String, VerifyError> {
        let value = self
            .terraform
            .output(name)
            .map_err(|source| VerifyError::Output {
                name: name.to_owned(),
                message: source.to_string(),
                source,
            })?;

        match reqwest::Url::parse(&value) {
            Ok(url) if url.has_host() => Ok(value),
            Ok(_) => Err(VerifyError::InvalidOutput {
                name: name.to_owned(),
                value,
                message: String::from("URL has no host"),
            }),
            Err(err) => Err(VerifyError::InvalidOutput {
                name: name.to_owned(),
                value,
                message: err.to_string(),
            }),
        }
    }
}

fn append_teardown_note<E: Display>(message: String, teardown_error: Option<&E>) -> String {
    if let Some(teardown) = teardown_error {
        format!("{message} (teardown also failed: {teardown})")
    } else {
        message
    }
}
