//! Unit tests for the `infraprobe` CLI binary implementation.
//!
//! Keeping these tests in a separate module helps keep `src/main.rs` focused.

use super::*;
use infraprobe::{CheckReport, DeploymentOutputs};
use rstest::{fixture, rstest};

#[fixture]
fn report() -> VerifyReport {
    VerifyReport {
        outputs: DeploymentOutputs {
            load_balancer_url: String::from("https://34.120.0.1/"),
            function_url: String::from("https://fn.example.test/hello-world"),
        },
        checks: vec![
            CheckReport {
                name: String::from("load_balancer_get"),
                outcome: CheckOutcome::Passed,
                observed_statuses: vec![200],
            },
            CheckReport {
                name: String::from("load_balancer_post"),
                outcome: CheckOutcome::Failed {
                    reason: String::from("expected status 403 for POST https://34.120.0.1/, got 405"),
                },
                observed_statuses: vec![405],
            },
            CheckReport {
                name: String::from("direct_function_access"),
                outcome: CheckOutcome::Errored {
                    reason: String::from("request timed out"),
                },
                observed_statuses: vec![],
            },
        ],
    }
}

#[rstest]
fn render_report_lists_every_check(report: VerifyReport) {
    let rendered = render_report(&report);

    assert_eq!(
        rendered,
        concat!(
            "load balancer: https://34.120.0.1/\n",
            "function: https://fn.example.test/hello-world\n",
            "PASS  load_balancer_get [200]\n",
            "FAIL  load_balancer_post [405]: expected status 403 for POST https://34.120.0.1/, got 405\n",
            "ERROR direct_function_access: request timed out\n",
            "1/3 checks passed\n",
        )
    );
}

#[rstest]
fn failed_checks_exit_non_zero(report: VerifyReport) {
    assert_eq!(exit_code_for(&report), 1);
}

#[rstest]
fn passing_report_exits_zero(mut report: VerifyReport) {
    report.checks.truncate(1);
    assert_eq!(exit_code_for(&report), 0);
}

#[rstest]
#[case::default(&["infraprobe", "serve"], "127.0.0.1:8080")]
#[case::explicit(&["infraprobe", "serve", "--listen", "0.0.0.0:9000"], "0.0.0.0:9000")]
fn serve_listen_address_is_parsed(#[case] args: &[&str], #[case] expected: &str) {
    let cli = Cli::try_parse_from(args).expect("arguments should parse");

    let Cli::Serve(command) = cli else {
        panic!("expected serve command, got {cli:?}");
    };
    assert_eq!(command.listen.to_string(), expected);
}

#[rstest]
fn serve_rejects_invalid_address() {
    let result = Cli::try_parse_from(["infraprobe", "serve", "--listen", "not-an-addr"]);
    assert!(result.is_err());
}

#[rstest]
#[case::verify("verify")]
#[case::destroy("destroy")]
fn subcommands_without_arguments_parse(#[case] name: &str) {
    let cli = Cli::try_parse_from(["infraprobe", name]).expect("subcommand should parse");
    assert!(matches!(cli, Cli::Verify | Cli::Destroy), "got {cli:?}");
}

#[rstest]
#[tokio::test]
async fn verify_without_billing_account_reports_config_error() {
    let _guard = infraprobe::test_support::EnvGuard::set_vars(&[
        ("INFRAPROBE_BILLING_ACCOUNT_ID", ""),
        ("INFRAPROBE_TERRAFORM_BIN", "/nonexistent/terraform"),
    ])
    .await;

    let err = run_verify()
        .await
        .expect_err("blank billing account should be rejected before provisioning");

    assert!(matches!(err, CliError::Config(_)), "unexpected error: {err}");
    assert!(err.to_string().contains("billing_account_id"), "{err}");
}

#[rstest]
fn write_error_writes_cli_error() {
    let mut buf = Vec::new();
    let err = CliError::Destroy(TerraformError::NotClean {
        addresses: vec![String::from("google_compute_url_map.default")],
    });
    write_error(&mut buf, &err);
    let rendered = String::from_utf8(buf).expect("utf8");
    assert_eq!(
        rendered,
        "destroy failed: resources remain after destroy: google_compute_url_map.default\n"
    );
}
