//! The hello-world deployment's outputs and the checks run against them.

use crate::probe::{Check, ProbeRequest, StatusExpectation};

/// Terraform output holding the public load-balancer URL.
pub const LOAD_BALANCER_URL_OUTPUT: &str = "load_balancer_url";

/// Terraform output holding the function's direct invocation URL.
pub const FUNCTION_URL_OUTPUT: &str = "function_url";

/// Greeting the function is expected to return through the load balancer.
pub const DEFAULT_GREETING: &str = "Hello World";

/// Status the edge security policy returns for a `POST` via the load balancer.
pub const DEFAULT_POST_STATUS: u16 = 403;

/// Statuses accepted when calling the function directly.
pub const UNAUTHORISED_STATUSES: [u16; 2] = [401, 403];

/// URLs read from Terraform after a successful apply.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeploymentOutputs {
    /// Public entry point forwarding to the function.
    pub load_balancer_url: String,
    /// Direct invocation URL of the function.
    pub function_url: String,
}

/// Values the checks compare responses against.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SuiteExpectations {
    /// Substring the load-balancer `GET` body must contain.
    pub greeting: String,
    /// Status expected for a `POST` through the load balancer.
    pub post_status: u16,
    /// How many times the load-balancer `GET` is sent.
    pub get_repetitions: u32,
}

impl Default for SuiteExpectations {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_owned(),
            post_status: DEFAULT_POST_STATUS,
            get_repetitions: 1,
        }
    }
}

/// Builds the three checks, in the order they run.
#[must_use]
pub fn hello_world_checks(
    outputs: &DeploymentOutputs,
    expectations: &SuiteExpectations,
) -> Vec<Check> {
    vec![
        Check::new(
            "load_balancer_get",
            ProbeRequest::get(&outputs.load_balancer_url),
            StatusExpectation::Exactly(200),
        )
        .body_contains(&expectations.greeting)
        .repetitions(expectations.get_repetitions),
        Check::new(
            "load_balancer_post",
            ProbeRequest::post(&outputs.load_balancer_url),
            StatusExpectation::Exactly(expectations.post_status),
        ),
        Check::new(
            "direct_function_access",
            ProbeRequest::get(&outputs.function_url),
            StatusExpectation::OneOf(UNAUTHORISED_STATUSES.to_vec()),
        ),
    ]
}
