// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier serve` command implementation.
//!
//! Opens storage and the SMTP transport, then runs the scheduler until
//! SIGINT or SIGTERM. Each tick sends one batch for every InProcess mass
//! email under the shared hourly cap.

use std::time::Duration;

use courier_config::CourierConfig;
use courier_core::CourierError;
use courier_engine::Scheduler;
use tracing::info;

use crate::app::App;
use crate::shutdown;

/// Runs the `courier serve` command.
pub async fn run_serve(config: CourierConfig) -> Result<(), CourierError> {
    init_tracing(&config.logging.level);

    info!(
        max_per_hour = config.mass_email.max_per_hour,
        poll_interval_secs = config.mass_email.poll_interval_secs,
        "starting courier serve"
    );

    let app = App::open(&config).await?;
    let cancel = shutdown::install_signal_handler();

    let interval = Duration::from_secs(config.mass_email.poll_interval_secs.max(1));
    Scheduler::new(app.service.clone(), interval)
        .run(cancel)
        .await;

    app.close().await?;
    info!("courier serve stopped");
    Ok(())
}

/// Initialize the tracing subscriber. `RUST_LOG` overrides the configured level.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("courier={log_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init();
}
