//! Configuration loading via `ortho-config`.
//!
//! Two layered structures are exposed: [`DeploymentConfig`] describes what
//! to provision and how, and [`CheckConfig`] tunes the HTTP checks. Both
//! merge defaults, `infraprobe.toml`, and environment variables.

use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::probe::{HttpProber, ProbeError};
use crate::terraform::{DEFAULT_TERRAFORM_BIN, TerraformOptions, TerraformVars};
use crate::verify::{
    DEFAULT_GREETING, DEFAULT_POST_STATUS, FUNCTION_URL_OUTPUT, LOAD_BALANCER_URL_OUTPUT,
    SuiteExpectations,
};

/// Environment variable naming the credentials file for the Google provider.
pub const DEFAULT_CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Default per-request timeout, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Deployment settings: the Terraform root module, its input variables, and
/// the credentials handed to the provider.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "INFRAPROBE",
    discovery(
        app_name = "infraprobe",
        env_var = "INFRAPROBE_CONFIG_PATH",
        config_file_name = "infraprobe.toml",
        dotfile_name = ".infraprobe.toml",
        project_file_name = "infraprobe.toml"
    )
)]
pub struct DeploymentConfig {
    /// Path to the `terraform` executable.
    #[ortho_config(default = DEFAULT_TERRAFORM_BIN.to_owned())]
    pub terraform_bin: String,
    /// Directory holding the Terraform root module.
    #[ortho_config(default = "terraform".to_owned())]
    pub terraform_dir: String,
    /// Value of the `environment` variable (for example `dev`).
    #[ortho_config(default = "dev".to_owned())]
    pub environment: String,
    /// Value of the `your_name` variable, used to label resources.
    #[ortho_config(default = "tester".to_owned())]
    pub your_name: String,
    /// Billing account linked to the project. This value is required.
    pub billing_account_id: String,
    /// Path to the service-account credentials file. When absent, the
    /// provider falls back to application default credentials.
    pub credentials_file: Option<String>,
    /// Environment variable used to pass `credentials_file` to Terraform.
    #[ortho_config(default = DEFAULT_CREDENTIALS_ENV.to_owned())]
    pub credentials_env: String,
    /// Output holding the load-balancer URL.
    #[ortho_config(default = LOAD_BALANCER_URL_OUTPUT.to_owned())]
    pub load_balancer_output: String,
    /// Output holding the function URL.
    #[ortho_config(default = FUNCTION_URL_OUTPUT.to_owned())]
    pub function_output: String,
    /// Whether to fail when resources remain in state after destroy.
    #[ortho_config(default = true)]
    pub verify_clean_state: bool,
}

/// HTTP check settings.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "INFRAPROBE_CHECK",
    discovery(
        app_name = "infraprobe",
        env_var = "INFRAPROBE_CONFIG_PATH",
        config_file_name = "infraprobe.toml",
        dotfile_name = ".infraprobe.toml",
        project_file_name = "infraprobe.toml"
    )
)]
pub struct CheckConfig {
    /// Per-request timeout in seconds.
    #[ortho_config(default = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,
    /// Skip TLS certificate validation.
    #[ortho_config(default = true)]
    pub accept_invalid_certs: bool,
    /// Substring the load-balancer `GET` body must contain.
    #[ortho_config(default = DEFAULT_GREETING.to_owned())]
    pub expected_greeting: String,
    /// Status expected for a `POST` through the load balancer. The edge
    /// security policy rejects it before it reaches the function.
    #[ortho_config(default = DEFAULT_POST_STATUS)]
    pub post_expected_status: u16,
    /// How many times to send the load-balancer `GET`; every response must
    /// match the first.
    #[ortho_config(default = 1)]
    pub get_repetitions: u32,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn missing(&self) -> ConfigError {
        ConfigError::MissingField(format!(
            "missing {}: set {} or add {} to infraprobe.toml",
            self.description, self.env_var, self.toml_key
        ))
    }
}

fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(metadata.missing());
    }
    Ok(())
}

impl DeploymentConfig {
    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("infraprobe")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation on required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            (
                self.terraform_bin.as_str(),
                FieldMetadata::new("Terraform binary", "INFRAPROBE_TERRAFORM_BIN", "terraform_bin"),
            ),
            (
                self.terraform_dir.as_str(),
                FieldMetadata::new(
                    "Terraform directory",
                    "INFRAPROBE_TERRAFORM_DIR",
                    "terraform_dir",
                ),
            ),
            (
                self.environment.as_str(),
                FieldMetadata::new("environment name", "INFRAPROBE_ENVIRONMENT", "environment"),
            ),
            (
                self.your_name.as_str(),
                FieldMetadata::new("display name", "INFRAPROBE_YOUR_NAME", "your_name"),
            ),
            (
                self.billing_account_id.as_str(),
                FieldMetadata::new(
                    "billing account ID",
                    "INFRAPROBE_BILLING_ACCOUNT_ID",
                    "billing_account_id",
                ),
            ),
            (
                self.credentials_env.as_str(),
                FieldMetadata::new(
                    "credentials environment variable",
                    "INFRAPROBE_CREDENTIALS_ENV",
                    "credentials_env",
                ),
            ),
            (
                self.load_balancer_output.as_str(),
                FieldMetadata::new(
                    "load balancer output name",
                    "INFRAPROBE_LOAD_BALANCER_OUTPUT",
                    "load_balancer_output",
                ),
            ),
            (
                self.function_output.as_str(),
                FieldMetadata::new(
                    "function output name",
                    "INFRAPROBE_FUNCTION_OUTPUT",
                    "function_output",
                ),
            ),
        ];
        for (value, metadata) in &fields {
            require_field(value, metadata)?;
        }

        if let Some(path) = self.credentials_file.as_deref() {
            require_field(
                path,
                &FieldMetadata::new(
                    "credentials file",
                    "INFRAPROBE_CREDENTIALS_FILE",
                    "credentials_file",
                ),
            )?;
        }
        Ok(())
    }

    /// Terraform input variables derived from this configuration.
    #[must_use]
    pub fn terraform_vars(&self) -> TerraformVars {
        TerraformVars::new()
            .with("environment", self.environment.trim())
            .with("your_name", self.your_name.trim())
            .with("billing_account_id", self.billing_account_id.trim())
    }

    /// Builds [`TerraformOptions`] after validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn terraform_options(&self) -> Result<TerraformOptions, ConfigError> {
        self.validate()?;
        let mut options = TerraformOptions::new(Utf8PathBuf::from(self.terraform_dir.trim()))
            .terraform_bin(self.terraform_bin.trim())
            .vars(self.terraform_vars());
        if let Some(path) = self.credentials_file.as_deref() {
            options = options.env_var(self.credentials_env.trim(), expand_tilde(path.trim()));
        }
        Ok(options)
    }
}

/// Expands a leading `~/` prefix to the user's home directory.
///
/// If `HOME` is not set the input is returned unchanged.
///
/// # Examples
///
/// ```
/// # use infraprobe::config::expand_tilde;
/// let home = std::env::var("HOME").expect("HOME should be set");
/// assert_eq!(expand_tilde("~/.config/gcloud/sa.json"), format!("{home}/.config/gcloud/sa.json"));
/// assert_eq!(expand_tilde("./sa.json"), "./sa.json");
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return format!("{}/{rest}", home.to_string_lossy());
    }
    path.to_owned()
}

impl CheckConfig {
    /// Loads configuration without attempting to parse CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("infraprobe")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when the greeting is blank and
    /// [`ConfigError::Invalid`] when a numeric value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_field(
            &self.expected_greeting,
            &FieldMetadata::new(
                "expected greeting",
                "INFRAPROBE_CHECK_EXPECTED_GREETING",
                "expected_greeting",
            ),
        )?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(String::from(
                "request_timeout_secs must be at least 1",
            )));
        }
        if !(100..=599).contains(&self.post_expected_status) {
            return Err(ConfigError::Invalid(format!(
                "post_expected_status {} is not an HTTP status code",
                self.post_expected_status
            )));
        }
        if self.get_repetitions == 0 {
            return Err(ConfigError::Invalid(String::from(
                "get_repetitions must be at least 1",
            )));
        }
        Ok(())
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Values the checks compare responses against.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn expectations(&self) -> Result<SuiteExpectations, ConfigError> {
        self.validate()?;
        Ok(SuiteExpectations {
            greeting: self.expected_greeting.clone(),
            post_status: self.post_expected_status,
            get_repetitions: self.get_repetitions,
        })
    }

    /// Builds the HTTP prober used by the checks.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Client`] when the HTTP client cannot be built.
    pub fn prober(&self) -> Result<HttpProber, ProbeError> {
        HttpProber::new(self.request_timeout(), self.accept_invalid_certs)
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a value is present but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
