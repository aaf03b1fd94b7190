// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use replag::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct LagMonitorImpl {
    replica_set: Arc<ReplicaSet>,
    storage: Arc<dyn LagStorage>,
}

#[dill::component(pub)]
#[dill::interface(dyn LagMonitor)]
impl LagMonitorImpl {
    pub fn new(replica_set: Arc<ReplicaSet>, storage: Arc<dyn LagStorage>) -> Self {
        Self {
            replica_set,
            storage,
        }
    }

    /// Worst lag across all replicas. Any replica without a usable value
    /// aborts the whole round.
    async fn sample_replicas(&self) -> Result<LagSample, MonitorError> {
        let mut max_behind: LagSample = 0;

        for replica in self.replica_set.replicas() {
            let status = replica.fetch_status().await?;

            let lag = status
                .ok_or(LagValidationReason::NoStatus)
                .and_then(|row| row.lag_seconds())
                .map_err(|reason| LagValidationError {
                    replica: replica.describe(),
                    reason,
                })?;

            tracing::debug!(replica = %replica.describe(), lag, "Sampled replica lag");
            max_behind = max_behind.max(lag);
        }

        Ok(max_behind)
    }
}

#[async_trait::async_trait]
impl LagMonitor for LagMonitorImpl {
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(primary_host = %self.replica_set.primary_host())
    )]
    async fn monitor(&self) -> Result<LagRound, MonitorError> {
        let sample = self.sample_replicas().await?;
        let host = self.replica_set.primary_host();

        let mut history = self.storage.get_history(host).await?;
        history.push(sample);

        let average_lag = history.average();

        self.storage.set_average_lag(host, average_lag).await?;
        self.storage.set_history(host, &history).await?;

        tracing::debug!(sample, %average_lag, history_len = history.len(), "Recorded lag");

        Ok(LagRound {
            sample,
            average_lag,
            history_len: history.len(),
        })
    }
}
