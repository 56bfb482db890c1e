//! BDD step definitions for the verification workflow.

use std::time::Duration;

use infraprobe::{CheckOutcome, CheckReport, ProbeError};
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;

use super::test_helpers::{FUNCTION_URL, LB_URL, VerifyContext, VerifyOutcome};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a configured verification run")]
fn configured_run(verify_context: VerifyContext) -> Result<VerifyContext, StepError> {
    Ok(verify_context)
}

#[given("terraform provisions the deployment")]
fn terraform_provisions(verify_context: VerifyContext) -> Result<VerifyContext, StepError> {
    verify_context.runner.push_success(); // init
    verify_context.runner.push_success(); // apply
    verify_context.runner.push_json_string(LB_URL);
    verify_context.runner.push_json_string(FUNCTION_URL);
    Ok(verify_context)
}

#[given("terraform apply fails")]
fn terraform_apply_fails(verify_context: VerifyContext) -> Result<VerifyContext, StepError> {
    verify_context.runner.push_success(); // init
    verify_context.runner.push_failure(1); // apply
    Ok(verify_context)
}

#[given("the endpoints behave as deployed")]
fn endpoints_healthy(verify_context: VerifyContext) -> Result<VerifyContext, StepError> {
    verify_context.prober.push_response(200, "Hello World!");
    verify_context.prober.push_response(403, "Forbidden");
    verify_context.prober.push_response(403, "Forbidden");
    Ok(verify_context)
}

#[given("the load balancer forwards POST to the function")]
fn post_reaches_function(verify_context: VerifyContext) -> Result<VerifyContext, StepError> {
    verify_context.prober.push_response(200, "Hello World!");
    verify_context
        .prober
        .push_response(405, "Method not allowed");
    verify_context.prober.push_response(403, "Forbidden");
    Ok(verify_context)
}

#[given("the load balancer GET times out")]
fn get_times_out(verify_context: VerifyContext) -> Result<VerifyContext, StepError> {
    verify_context.prober.push_error(ProbeError::Timeout {
        url: LB_URL.to_owned(),
        timeout: Duration::from_secs(10),
    });
    verify_context.prober.push_response(403, "Forbidden");
    verify_context.prober.push_response(403, "Forbidden");
    Ok(verify_context)
}

#[when("I verify the deployment")]
fn verify_deployment(verify_context: VerifyContext) -> Result<VerifyContext, StepError> {
    let runtime = Runtime::new().map_err(|err| StepError::Assertion(err.to_string()))?;
    verify_context.runner.push_success(); // destroy
    verify_context.runner.push_success(); // state list

    let orchestrator = verify_context.orchestrator();
    let result = runtime.block_on(async move { orchestrator.execute().await });
    let outcome = match result {
        Ok(report) => VerifyOutcome::Completed(report),
        Err(err) => VerifyOutcome::Failed(err.to_string()),
    };
    *verify_context.outcome.borrow_mut() = Some(outcome);
    Ok(verify_context)
}

#[then("every check passes")]
fn every_check_passes(verify_context: &VerifyContext) -> Result<(), StepError> {
    match verify_context.outcome.borrow().as_ref() {
        Some(VerifyOutcome::Completed(report)) if report.passed() => Ok(()),
        Some(VerifyOutcome::Completed(report)) => Err(StepError::Assertion(format!(
            "expected every check to pass, got failures: {:?}",
            report.failures()
        ))),
        Some(VerifyOutcome::Failed(message)) => Err(StepError::Assertion(format!(
            "expected success, got failure: {message}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("verification fails with \"{fragment}\"")]
fn verification_fails_with(
    verify_context: &VerifyContext,
    fragment: String,
) -> Result<(), StepError> {
    let Some(VerifyOutcome::Failed(message)) = verify_context.outcome.borrow().clone() else {
        return Err(StepError::Assertion(String::from(
            "expected failure outcome",
        )));
    };
    if message.contains(fragment.as_str()) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected error containing '{fragment}', got: {message}"
        )))
    }
}

#[then("the check \"{name}\" fails")]
fn check_fails(verify_context: &VerifyContext, name: String) -> Result<(), StepError> {
    let check = find_check(verify_context, &name)?;
    if matches!(check.outcome, CheckOutcome::Failed { .. }) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {name} to fail, got {:?}",
            check.outcome
        )))
    }
}

#[then("the check \"{name}\" errors")]
fn check_errors(verify_context: &VerifyContext, name: String) -> Result<(), StepError> {
    let check = find_check(verify_context, &name)?;
    if matches!(check.outcome, CheckOutcome::Errored { .. }) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {name} to error, got {:?}",
            check.outcome
        )))
    }
}

#[then("the check \"{name}\" passes")]
fn check_passes(verify_context: &VerifyContext, name: String) -> Result<(), StepError> {
    let check = find_check(verify_context, &name)?;
    if check.passed() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {name} to pass, got {:?}",
            check.outcome
        )))
    }
}

#[then("no request is sent")]
fn no_request_sent(verify_context: &VerifyContext) -> Result<(), StepError> {
    let requests = verify_context.prober.requests();
    if requests.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no requests, got {requests:?}"
        )))
    }
}

#[then("the deployment is destroyed exactly once")]
fn destroyed_once(verify_context: &VerifyContext) -> Result<(), StepError> {
    match verify_context.destroy_count() {
        1 => Ok(()),
        count => Err(StepError::Assertion(format!(
            "expected one destroy, got {count}"
        ))),
    }
}

fn find_check(verify_context: &VerifyContext, name: &str) -> Result<CheckReport, StepError> {
    let Some(VerifyOutcome::Completed(report)) = verify_context.outcome.borrow().clone() else {
        return Err(StepError::Assertion(String::from(
            "expected a completed report",
        )));
    };
    report
        .checks
        .into_iter()
        .find(|check| check.name == name)
        .ok_or_else(|| StepError::Assertion(format!("missing check {name}")))
}
