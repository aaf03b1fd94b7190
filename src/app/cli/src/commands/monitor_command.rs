// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use replag::{LagMonitor, LagRound};
use time_source::SystemTimeSource;

use super::Command;
use crate::CLIError;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct MonitorCommand {
    monitor: Arc<dyn LagMonitor>,
    time_source: Arc<dyn SystemTimeSource>,
    daemon_interval: Option<Duration>,
}

impl MonitorCommand {
    pub fn new(
        monitor: Arc<dyn LagMonitor>,
        time_source: Arc<dyn SystemTimeSource>,
        daemon_interval: Option<Duration>,
    ) -> Self {
        Self {
            monitor,
            time_source,
            daemon_interval,
        }
    }

    /// Runs a round every `interval` until `shutdown` resolves. A failed round
    /// is logged and does not stop the loop.
    pub async fn run_daemon(
        &self,
        interval: Duration,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), CLIError> {
        tracing::info!(?interval, "Starting monitor daemon");

        tokio::pin!(shutdown);

        loop {
            match self.monitor.monitor().await {
                Ok(round) => {
                    tracing::info!(
                        sample = round.sample,
                        average_lag = %round.average_lag,
                        history_len = round.history_len,
                        "Monitor round completed"
                    );
                    println!("{}", Self::describe_round(&round));
                }
                Err(err) => {
                    tracing::error!(error = ?err, error_msg = %err, "Monitor round failed");
                }
            }

            tokio::select! {
                biased;
                () = &mut shutdown => {
                    tracing::info!("Stopping monitor daemon");
                    return Ok(());
                }
                () = self.time_source.sleep(interval) => {}
            }
        }
    }

    pub fn describe_round(round: &LagRound) -> String {
        format!(
            "Lag {}s, average {} over {} samples",
            round.sample, round.average_lag, round.history_len
        )
    }
}

#[async_trait::async_trait(?Send)]
impl Command for MonitorCommand {
    async fn run(&mut self) -> Result<(), CLIError> {
        let Some(interval) = self.daemon_interval else {
            let round = self.monitor.monitor().await?;
            println!("{}", Self::describe_round(&round));
            return Ok(());
        };

        self.run_daemon(interval, shutdown_signal()).await
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Unable to listen for the interrupt signal");
        std::future::pending::<()>().await;
    }
}
