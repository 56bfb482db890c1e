//! Core library for the `infraprobe` deployment verifier.
//!
//! The crate provisions a Terraform root module describing a load balancer in
//! front of a serverless hello-world function, checks the deployed endpoints
//! over HTTP, and always destroys what it created (provision → check →
//! destroy). A local rendition of the function is included so the checks can
//! run against a real server.

pub mod config;
pub mod function;
pub mod probe;
pub mod runner;
pub mod terraform;
pub mod test_support;
pub mod verify;

pub use config::{CheckConfig, ConfigError, DeploymentConfig};
pub use probe::{
    Check, CheckOutcome, CheckReport, HttpProber, ProbeError, ProbeMethod, ProbeRequest,
    ProbeResponse, Prober, StatusExpectation,
};
pub use runner::{CommandError, CommandOutput, CommandRunner, ProcessCommandRunner};
pub use terraform::{Terraform, TerraformError, TerraformOptions, TerraformVars};
pub use verify::{
    DeploymentOutputs, SuiteExpectations, TeardownGuard, VerifyError, VerifyOrchestrator,
    VerifyReport, destroy_deployment,
};
