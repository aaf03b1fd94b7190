// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use replag::{LagHistory, LagStorage, ReplicaSet};
use serde::Serialize;

use super::Command;
use crate::{CLIError, OutputFormat};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct StatsCommand {
    replica_set: Arc<ReplicaSet>,
    storage: Arc<dyn LagStorage>,
    output_format: OutputFormat,
}

impl StatsCommand {
    pub fn new(
        replica_set: Arc<ReplicaSet>,
        storage: Arc<dyn LagStorage>,
        output_format: OutputFormat,
    ) -> Self {
        Self {
            replica_set,
            storage,
            output_format,
        }
    }

    pub async fn collect(&self) -> Result<LagStats, CLIError> {
        let primary_host = self.replica_set.primary_host();

        let average_lag = self.storage.get_average_lag(primary_host).await?;
        let history = self.storage.get_history(primary_host).await?;

        Ok(LagStats {
            primary_host: primary_host.to_string(),
            average_lag: average_lag.seconds(),
            history: history.to_vec(),
        })
    }
}

#[async_trait::async_trait(?Send)]
impl Command for StatsCommand {
    async fn run(&mut self) -> Result<(), CLIError> {
        let stats = self.collect().await?;
        println!("{}", stats.render(self.output_format)?);
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LagStats {
    pub primary_host: String,
    /// Seconds
    pub average_lag: u64,
    /// Seconds, oldest first
    pub history: Vec<u64>,
}

impl LagStats {
    pub fn render(&self, format: OutputFormat) -> Result<String, CLIError> {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(self).map_err(CLIError::failure),
            OutputFormat::Text => Ok(format!(
                "Primary host: {}\nAverage lag:  {}s\nHistory:      {:?} ({} of {} samples)",
                self.primary_host,
                self.average_lag,
                self.history,
                self.history.len(),
                LagHistory::CAPACITY,
            )),
        }
    }
}
