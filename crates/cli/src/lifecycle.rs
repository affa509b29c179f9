// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use futures_util::future::BoxFuture;
use tokio::signal::unix::{Signal, SignalKind};

type ReloadHandler = Box<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Waits for the process to be asked to shut down.
///
/// SIGTERM and SIGINT trigger the shutdown, SIGHUP runs the reload handlers.
pub struct LifecycleManager {
    sigterm: Signal,
    sigint: Signal,
    sighup: Signal,
    reload_handlers: Vec<ReloadHandler>,
}

impl LifecycleManager {
    /// Create a new lifecycle manager, installing the signal handlers
    ///
    /// # Errors
    ///
    /// Returns an error if the signal handlers could not be installed
    pub fn new() -> Result<Self, std::io::Error> {
        let sigterm = tokio::signal::unix::signal(SignalKind::terminate())?;
        let sigint = tokio::signal::unix::signal(SignalKind::interrupt())?;
        let sighup = tokio::signal::unix::signal(SignalKind::hangup())?;

        Ok(Self {
            sigterm,
            sigint,
            sighup,
            reload_handlers: Vec::new(),
        })
    }

    /// Add a handler to be called when the process receives SIGHUP
    pub fn register_reload_handler<F, Fut>(&mut self, handler: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.reload_handlers
            .push(Box::new(move || Box::pin(handler())));
    }

    /// Resolves when a shutdown signal is received
    pub async fn wait_for_shutdown(mut self) {
        loop {
            tokio::select! {
                _ = self.sigterm.recv() => {
                    tracing::info!("Shutdown signal received (SIGTERM), shutting down");
                    break;
                },

                _ = self.sigint.recv() => {
                    tracing::info!("Shutdown signal received (SIGINT), shutting down");
                    break;
                },

                _ = self.sighup.recv() => {
                    tracing::info!("Reload signal received (SIGHUP), reloading");

                    futures_util::future::join_all(
                        self.reload_handlers
                            .iter()
                            .map(|handler| handler())
                    ).await;

                    tracing::info!("Reloading done");
                },
            }
        }
    }
}
