//! BDD scenarios for the verification workflow.

use rstest_bdd_macros::scenario;

use super::test_helpers::{VerifyContext, verify_context};

#[scenario(
    path = "tests/features/verify.feature",
    name = "Healthy deployment passes every check and is destroyed"
)]
fn scenario_healthy_deployment(verify_context: VerifyContext) {
    let _ = verify_context;
}

#[scenario(
    path = "tests/features/verify.feature",
    name = "Failed apply still tears the deployment down"
)]
fn scenario_failed_apply(verify_context: VerifyContext) {
    let _ = verify_context;
}

#[scenario(
    path = "tests/features/verify.feature",
    name = "POST reaching the function fails its check"
)]
fn scenario_post_reaches_function(verify_context: VerifyContext) {
    let _ = verify_context;
}

#[scenario(
    path = "tests/features/verify.feature",
    name = "A timed out request ends only its own check"
)]
fn scenario_timeout_ends_own_check(verify_context: VerifyContext) {
    let _ = verify_context;
}
