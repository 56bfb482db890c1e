//! Command-line interface definitions for the `infraprobe` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use std::net::SocketAddr;

use clap::Parser;

/// Address the local function listens on when `--listen` is not given.
pub(crate) const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Top-level CLI for the `infraprobe` binary.
#[derive(Debug, Parser)]
#[command(
    name = "infraprobe",
    about = "Provision a load-balanced hello-world function, check it over HTTP, and tear it down",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Provision, check, and destroy the deployment.
    #[command(name = "verify", about = "Provision, check, and destroy the deployment")]
    Verify,
    /// Destroy a deployment left behind by an interrupted run.
    #[command(
        name = "destroy",
        about = "Destroy a deployment left behind by an interrupted run"
    )]
    Destroy,
    /// Serve the hello-world function locally.
    #[command(name = "serve", about = "Serve the hello-world function locally")]
    Serve(ServeCommand),
}

/// Arguments for the `infraprobe serve` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct ServeCommand {
    /// Socket address to listen on.
    #[arg(long, value_name = "ADDR", default_value = DEFAULT_LISTEN_ADDR)]
    pub(crate) listen: SocketAddr,
}
