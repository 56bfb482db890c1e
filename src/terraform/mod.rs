//! Thin wrapper around the Terraform CLI.
//!
//! Each operation shells out through a [`CommandRunner`] so the lifecycle can
//! be driven by scripted runners in tests. Commands run non-interactively
//! against the configured root module via `-chdir`, and every non-zero exit
//! is surfaced as [`TerraformError::CommandFailure`].

use std::ffi::OsString;

use tracing::{debug, info};

use crate::runner::{CommandOutput, CommandRunner, ProcessCommandRunner, render_command};

mod error;
mod options;
mod output;

pub use error::TerraformError;
pub use options::{DEFAULT_TERRAFORM_BIN, TF_IN_AUTOMATION_ENV, TerraformOptions, TerraformVars};

/// Drives `init`, `apply`, `output`, and `destroy` for one root module.
#[derive(Clone, Debug)]
pub struct Terraform<R: CommandRunner> {
    options: TerraformOptions,
    runner: R,
}

impl Terraform<ProcessCommandRunner> {
    /// Convenience constructor that wires the real process runner.
    #[must_use]
    pub const fn with_process_runner(options: TerraformOptions) -> Self {
        Self::new(options, ProcessCommandRunner)
    }
}

impl<R: CommandRunner> Terraform<R> {
    /// Creates a wrapper using the provided options and runner.
    #[must_use]
    pub const fn new(options: TerraformOptions, runner: R) -> Self {
        Self { options, runner }
    }

    /// Returns the options this wrapper was built with.
    #[must_use]
    pub const fn options(&self) -> &TerraformOptions {
        &self.options
    }

    /// Runs `terraform init`.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError`] when Terraform cannot be started or exits
    /// unsuccessfully.
    pub fn init(&self) -> Result<(), TerraformError> {
        self.run_checked("init", &["-input=false", "-no-color"], false)
            .map(drop)
    }

    /// Runs `terraform apply` with the configured variables.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError`] when Terraform cannot be started or exits
    /// unsuccessfully.
    pub fn apply(&self) -> Result<(), TerraformError> {
        self.run_checked(
            "apply",
            &["-input=false", "-auto-approve", "-no-color"],
            true,
        )
        .map(drop)
    }

    /// Runs `init` followed by `apply`.
    ///
    /// # Errors
    ///
    /// Returns the first [`TerraformError`] encountered.
    pub fn init_and_apply(&self) -> Result<(), TerraformError> {
        self.init()?;
        self.apply()
    }

    /// Reads a single output value.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError::CommandFailure`] when the output does not
    /// exist, [`TerraformError::EmptyOutput`] when it is `null` or empty, and
    /// [`TerraformError::Parse`] when Terraform prints invalid JSON.
    pub fn output(&self, name: &str) -> Result<String, TerraformError> {
        let output = self.run_checked("output", &["-no-color", "-json", name], false)?;
        let value = output::parse_output(name, &output.stdout)?;
        debug!(output = name, %value, "read terraform output");
        Ok(value)
    }

    /// Runs `terraform destroy` with the configured variables.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError`] when Terraform cannot be started or exits
    /// unsuccessfully.
    pub fn destroy(&self) -> Result<(), TerraformError> {
        self.run_checked(
            "destroy",
            &["-input=false", "-auto-approve", "-no-color"],
            true,
        )
        .map(drop)
    }

    /// Lists resource addresses still tracked in state.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError`] when Terraform cannot be started or exits
    /// unsuccessfully.
    pub fn state_list(&self) -> Result<Vec<String>, TerraformError> {
        let output = self.run_checked("state", &["list"], false)?;
        Ok(output::parse_state_list(&output.stdout))
    }

    /// Fails when any resource is still tracked in state.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError::NotClean`] listing the remaining addresses,
    /// or any error from [`Terraform::state_list`].
    pub fn ensure_clean(&self) -> Result<(), TerraformError> {
        let addresses = self.state_list()?;
        if addresses.is_empty() {
            return Ok(());
        }
        Err(TerraformError::NotClean { addresses })
    }

    fn build_args(&self, subcommand: &str, flags: &[&str], with_vars: bool) -> Vec<OsString> {
        let mut args = vec![self.options.chdir_arg(), OsString::from(subcommand)];
        if with_vars {
            args.extend(self.options.vars.to_args());
        }
        args.extend(flags.iter().map(OsString::from));
        args
    }

    fn run_checked(
        &self,
        subcommand: &str,
        flags: &[&str],
        with_vars: bool,
    ) -> Result<CommandOutput, TerraformError> {
        let args = self.build_args(subcommand, flags, with_vars);
        info!(
            command = %render_command(&self.options.terraform_bin, &args),
            "running terraform {subcommand}"
        );
        let output = self
            .runner
            .run(&self.options.terraform_bin, &args, &self.options.process_env())?;
        if output.is_success() {
            return Ok(output);
        }

        Err(TerraformError::CommandFailure {
            subcommand: subcommand.to_owned(),
            status: output.code,
            status_text: output.status_text(),
            stderr: output.stderr,
        })
    }
}
