//! proto-gen - run an explicitly versioned protoc inside a container
//!
//! Builds the pinned protoc image (protoc plus the Go and Twirp plugins) and
//! runs it against the current directory. Every argument goes to protoc
//! untouched:
//!
//! ```text
//! proto-gen --proto_path=$(pwd) --go_out=.. --twirp_out=. \
//!     --go_opt=paths=source_relative messages.proto services.proto
//! ```
//!
//! The current directory is mounted into the container at the same path,
//! so generated files land where protoc's output flags say.
//!
//! ## Environment
//!
//! - `PROTO_GEN_RUNTIME`: docker-compatible runtime binary (default `docker`)
//! - `PROTO_GEN_LOG_JSON`: emit JSON log lines
//! - `PROTO_GEN_VERBOSE`: default to debug logging
//! - `RUST_LOG`: fine-grained log filtering

use std::ffi::OsString;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use protogen_core::{CliRuntime, EnvironmentSpec, InvocationRequest, Settings};
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "proto-gen")]
#[command(author = "Stevedores Org")]
#[command(about = "Run a version-pinned protoc inside a container", long_about = None)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Arguments passed verbatim to protoc
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    protoc_args: Vec<OsString>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = Settings::from_env();
    protogen_core::init_tracing(settings.log_json, settings.log_level());

    match run(cli, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(cli: Cli, settings: &Settings) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let spec = EnvironmentSpec::pinned();
    let request = InvocationRequest::from_current_dir(cli.protoc_args)?;
    let runtime = CliRuntime::new(settings.runtime.clone());

    rt.block_on(protogen_core::run(&runtime, &spec, &request))?;
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<protogen_core::Error>()
        .map(protogen_core::Error::exit_code)
        .unwrap_or(1)
}
