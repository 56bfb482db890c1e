//! Binary entry point for the `infraprobe` CLI.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::process;

use clap::Parser;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use infraprobe::{
    CheckConfig, CheckOutcome, ConfigError, DeploymentConfig, ProbeError, Terraform,
    TerraformError, VerifyError, VerifyOrchestrator, VerifyReport, destroy_deployment, function,
};

mod cli;

use cli::{Cli, ServeCommand};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("HTTP client error: {0}")]
    Probe(#[from] ProbeError),
    #[error("verification failed: {0}")]
    Verify(#[from] VerifyError),
    #[error("destroy failed: {0}")]
    Destroy(#[from] TerraformError),
    #[error("failed to serve on {addr}: {source}")]
    Serve {
        addr: String,
        #[source]
        source: io::Error,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    match cli {
        Cli::Verify => run_verify().await,
        Cli::Destroy => run_destroy(),
        Cli::Serve(ServeCommand { listen }) => run_serve(listen).await,
    }
}

async fn run_verify() -> Result<i32, CliError> {
    let deployment = DeploymentConfig::load_without_cli_args()?;
    let checks = CheckConfig::load_without_cli_args()?;
    let terraform = Terraform::with_process_runner(deployment.terraform_options()?);
    let expectations = checks.expectations()?;
    let prober = checks.prober()?;

    let orchestrator = VerifyOrchestrator::new(terraform, prober)
        .with_expectations(expectations)
        .with_output_names(
            deployment.load_balancer_output.trim(),
            deployment.function_output.trim(),
        )
        .with_clean_state_check(deployment.verify_clean_state);

    match orchestrator.execute().await {
        Ok(report) => {
            print_report(&report);
            Ok(exit_code_for(&report))
        }
        Err(VerifyError::Teardown { source, report }) => {
            print_report(&report);
            Err(CliError::Verify(VerifyError::Teardown { source, report }))
        }
        Err(err) => Err(err.into()),
    }
}

fn run_destroy() -> Result<i32, CliError> {
    let deployment = DeploymentConfig::load_without_cli_args()?;
    let terraform = Terraform::with_process_runner(deployment.terraform_options()?);
    destroy_deployment(&terraform, deployment.verify_clean_state)?;
    writeln!(io::stdout(), "deployment destroyed").ok();
    Ok(0)
}

async fn run_serve(addr: SocketAddr) -> Result<i32, CliError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| CliError::Serve {
            addr: addr.to_string(),
            source,
        })?;
    function::serve(listener)
        .await
        .map_err(|source| CliError::Serve {
            addr: addr.to_string(),
            source,
        })?;
    Ok(0)
}

fn exit_code_for(report: &VerifyReport) -> i32 {
    if report.passed() { 0 } else { 1 }
}

fn render_report(report: &VerifyReport) -> String {
    let mut rendered = String::new();
    writeln!(
        rendered,
        "load balancer: {}",
        report.outputs.load_balancer_url
    )
    .ok();
    writeln!(rendered, "function: {}", report.outputs.function_url).ok();

    for check in &report.checks {
        let statuses = check
            .observed_statuses
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        match &check.outcome {
            CheckOutcome::Passed => {
                writeln!(rendered, "PASS  {} [{statuses}]", check.name).ok();
            }
            CheckOutcome::Failed { reason } => {
                writeln!(rendered, "FAIL  {} [{statuses}]: {reason}", check.name).ok();
            }
            CheckOutcome::Errored { reason } => {
                writeln!(rendered, "ERROR {}: {reason}", check.name).ok();
            }
        }
    }

    let passed = report.checks.iter().filter(|check| check.passed()).count();
    writeln!(
        rendered,
        "{passed}/{} checks passed",
        report.checks.len()
    )
    .ok();
    rendered
}

fn print_report(report: &VerifyReport) {
    write!(io::stdout(), "{}", render_report(report)).ok();
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
