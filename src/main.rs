// src/main.rs

//! pine-validate
//!
//! Entry point for the pine-validate CLI.
//!
//! Responsibilities of this file:
//! - Load `.env` if present
//! - Parse CLI arguments
//! - Hand off to the runner
//!
//! There is intentionally *no business logic* here.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use pine_validate::{cli, runner};

fn main() -> Result<ExitCode> {
    // Optional; NODE_PATH and RUST_LOG are commonly kept there
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();

    runner::run(cli)
}
