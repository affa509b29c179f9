// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use figment::Figment;
use inertia_config::{ConfigurationSection, RootConfig};
use tracing::{info, info_span, warn};

use crate::{lifecycle::LifecycleManager, util::inertia_from_config};

#[derive(Parser, Debug, Default)]
pub(super) struct Options {
    /// Do not reload the root template on SIGHUP
    #[arg(long)]
    no_reload: bool,
}

impl Options {
    pub async fn run(self, figment: &Figment) -> anyhow::Result<ExitCode> {
        let span = info_span!("cli.run.init").entered();
        let mut lifecycle = LifecycleManager::new()?;
        let config = RootConfig::extract(figment).map_err(anyhow::Error::from_boxed)?;

        info!(version = crate::VERSION, "Starting up");

        let inertia = inertia_from_config(&config.inertia, &config.http, &config.ssr)?;
        inertia.share_prop("appName", "Inertia demo");

        if self.no_reload {
            info!("Root template reloading is disabled");
        } else {
            let inertia = inertia.clone();
            lifecycle.register_reload_handler(move || {
                let inertia = inertia.clone();
                async move {
                    if let Err(e) = inertia.template().reload() {
                        warn!(
                            error = &e as &dyn std::error::Error,
                            "Failed to reload the root template"
                        );
                    }
                }
            });
        }

        let router = crate::server::build_router(inertia, &config.http);

        let listener = tokio::net::TcpListener::bind(config.http.listen)
            .await
            .with_context(|| format!("Failed to listen on {}", config.http.listen))?;
        info!(
            "Listening on http://{}",
            listener.local_addr().unwrap_or(config.http.listen)
        );

        span.exit();

        axum::serve(listener, router)
            .with_graceful_shutdown(lifecycle.wait_for_shutdown())
            .await
            .context("Server failed")?;

        info!("Server stopped");
        Ok(ExitCode::SUCCESS)
    }
}
