//! Invocation settings for the Terraform wrapper.

use std::collections::BTreeMap;
use std::ffi::OsString;

use camino::Utf8PathBuf;

/// Default Terraform binary name.
pub const DEFAULT_TERRAFORM_BIN: &str = "terraform";

/// Environment variable Terraform consults to suppress interactive hints.
pub const TF_IN_AUTOMATION_ENV: &str = "TF_IN_AUTOMATION";

/// Input variables passed to Terraform as `-var name=value` pairs.
///
/// Variables are kept sorted by name so the rendered command line is stable.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TerraformVars(BTreeMap<String, String>);

impl TerraformVars {
    /// Creates an empty variable set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a variable.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Returns the value of `name`, if set.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Number of variables in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no variables are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(super) fn to_args(&self) -> Vec<OsString> {
        let mut args = Vec::with_capacity(self.0.len() * 2);
        for (name, value) in &self.0 {
            args.push(OsString::from("-var"));
            args.push(OsString::from(format!("{name}={value}")));
        }
        args
    }
}

/// Everything needed to drive Terraform for one deployment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TerraformOptions {
    /// Terraform executable.
    pub terraform_bin: String,
    /// Directory holding the root module.
    pub terraform_dir: Utf8PathBuf,
    /// Input variables for `apply` and `destroy`.
    pub vars: TerraformVars,
    /// Extra environment variables for every invocation (credentials).
    pub env_vars: BTreeMap<String, String>,
}

impl TerraformOptions {
    /// Creates options for `terraform_dir` using the default binary and no
    /// variables.
    #[must_use]
    pub fn new(terraform_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            terraform_bin: DEFAULT_TERRAFORM_BIN.to_owned(),
            terraform_dir: terraform_dir.into(),
            vars: TerraformVars::new(),
            env_vars: BTreeMap::new(),
        }
    }

    /// Overrides the Terraform executable.
    #[must_use]
    pub fn terraform_bin(mut self, value: impl Into<String>) -> Self {
        self.terraform_bin = value.into();
        self
    }

    /// Replaces the input variables.
    #[must_use]
    pub fn vars(mut self, vars: TerraformVars) -> Self {
        self.vars = vars;
        self
    }

    /// Adds an environment variable passed to every invocation.
    #[must_use]
    pub fn env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    pub(super) fn chdir_arg(&self) -> OsString {
        OsString::from(format!("-chdir={}", self.terraform_dir))
    }

    pub(super) fn process_env(&self) -> Vec<(OsString, OsString)> {
        let mut envs = vec![(
            OsString::from(TF_IN_AUTOMATION_ENV),
            OsString::from("1"),
        )];
        envs.extend(
            self.env_vars
                .iter()
                .map(|(key, value)| (OsString::from(key), OsString::from(value))),
        );
        envs
    }
}
