//! Shared fixtures for verification BDD scenarios.

use std::cell::RefCell;
use std::rc::Rc;

use infraprobe::test_support::{ScriptedProber, ScriptedRunner};
use infraprobe::{Terraform, TerraformOptions, TerraformVars, VerifyOrchestrator, VerifyReport};
use rstest::fixture;

pub const LB_URL: &str = "https://34.120.0.1/";
pub const FUNCTION_URL: &str = "https://europe-west1-demo.cloudfunctions.net/hello-world";

#[derive(Clone, Debug)]
pub enum VerifyOutcome {
    Completed(VerifyReport),
    Failed(String),
}

#[derive(Clone, Debug)]
pub struct VerifyContext {
    pub runner: ScriptedRunner,
    pub prober: ScriptedProber,
    pub outcome: Rc<RefCell<Option<VerifyOutcome>>>,
}

impl VerifyContext {
    pub fn orchestrator(&self) -> VerifyOrchestrator<ScriptedRunner, ScriptedProber> {
        let options = TerraformOptions::new("terraform").vars(
            TerraformVars::new()
                .with("environment", "dev")
                .with("your_name", "bdd"),
        );
        VerifyOrchestrator::new(
            Terraform::new(options, self.runner.clone()),
            self.prober.clone(),
        )
        .with_clean_state_check(true)
    }

    pub fn destroy_count(&self) -> usize {
        self.runner
            .subcommands()
            .iter()
            .filter(|sub| sub.as_str() == "destroy")
            .count()
    }
}

#[fixture]
pub fn verify_context() -> VerifyContext {
    VerifyContext {
        runner: ScriptedRunner::new(),
        prober: ScriptedProber::new(),
        outcome: Rc::new(RefCell::new(None)),
    }
}
