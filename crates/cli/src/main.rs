// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

#![allow(clippy::module_name_repetitions)]

use std::{io::IsTerminal, process::ExitCode};

use anyhow::Context;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod commands;
mod lifecycle;
mod server;
mod util;

/// The application version
static VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log to stderr, filtered by `RUST_LOG`, `info` by default.
///
/// Logs are written from a background thread, which stops when the returned
/// guard is dropped.
fn setup_logging() -> anyhow::Result<WorkerGuard> {
    let stderr = std::io::stderr();
    let with_ansi = stderr.is_terminal();
    let (writer, guard) = tracing_appender::non_blocking(stderr);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("could not setup logging filter")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(with_ansi),
        )
        .try_init()
        .context("could not initialize logging")?;

    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Keep the result to log it once logging is set up
    let dotenv = dotenvy::dotenv()
        .map(Some)
        .or_else(|e| if e.not_found() { Ok(None) } else { Err(e) });

    let _guard = setup_logging()?;

    match dotenv {
        Ok(Some(path)) => tracing::info!(?path, "Loaded environment variables from .env file"),
        Ok(None) => {}
        Err(e) => tracing::warn!(?e, "Failed to load .env file"),
    }

    let opts = self::commands::Options::parse();
    let figment = opts.figment();

    tracing::trace!(?opts, "Running command");
    opts.run(&figment).await
}
