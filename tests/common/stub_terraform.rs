//! A shell script standing in for the `terraform` binary.
//!
//! The script appends each invocation's arguments to `STUB_TF_LOG`, prints
//! `STUB_TF_LB_URL` and `STUB_TF_FUNCTION_URL` as JSON strings for the two
//! outputs, prints `STUB_TF_STATE` for `state list`, and fails `apply` when
//! `STUB_TF_FAIL_APPLY` is set.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

const SCRIPT: &str = r#"#!/bin/sh
printf '%s\n' "$*" >> "$STUB_TF_LOG"
case " $* " in
  *" output "*load_balancer_url*)
    printf '"%s"\n' "$STUB_TF_LB_URL" ;;
  *" output "*function_url*)
    printf '"%s"\n' "$STUB_TF_FUNCTION_URL" ;;
  *" apply "*)
    if [ -n "$STUB_TF_FAIL_APPLY" ]; then
      echo "Error: quota exceeded" >&2
      exit 1
    fi ;;
  *" state list "*)
    if [ -n "$STUB_TF_STATE" ]; then
      printf '%s\n' "$STUB_TF_STATE"
    fi ;;
esac
exit 0
"#;

/// Temporary directory holding the stub binary and its invocation log.
pub struct StubTerraform {
    dir: TempDir,
}

impl StubTerraform {
    /// Writes the stub script into a fresh temporary directory.
    pub fn install() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let bin = dir.path().join("terraform");
        fs::write(&bin, SCRIPT).expect("write stub terraform");
        fs::set_permissions(&bin, fs::Permissions::from_mode(0o755))
            .expect("mark stub executable");
        fs::write(dir.path().join("calls.log"), "").expect("create call log");
        Self { dir }
    }

    /// Path to the stub binary.
    pub fn bin(&self) -> PathBuf {
        self.dir.path().join("terraform")
    }

    /// Path to the invocation log.
    pub fn log(&self) -> PathBuf {
        self.dir.path().join("calls.log")
    }

    /// Directory used as the Terraform root module.
    pub fn module_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Subcommands recorded so far, in order.
    pub fn subcommands(&self) -> Vec<String> {
        fs::read_to_string(self.log())
            .expect("read call log")
            .lines()
            .filter_map(|line| {
                line.split_whitespace()
                    .find(|arg| !arg.starts_with("-chdir="))
                    .map(str::to_owned)
            })
            .collect()
    }

    /// Raw invocation lines.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.log())
            .expect("read call log")
            .lines()
            .map(str::to_owned)
            .collect()
    }
}
