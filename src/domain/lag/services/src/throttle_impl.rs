// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use replag::*;
use time_source::SystemTimeSource;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct ThrottleImpl {
    replica_set: Arc<ReplicaSet>,
    storage: Arc<dyn LagStorage>,
    time_source: Arc<dyn SystemTimeSource>,
    config: ThrottleConfig,
    state: tokio::sync::Mutex<ThrottleState>,
}

#[dill::component(pub)]
#[dill::interface(dyn Throttle)]
impl ThrottleImpl {
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(
        replica_set: Arc<ReplicaSet>,
        storage: Arc<dyn LagStorage>,
        time_source: Arc<dyn SystemTimeSource>,
        config: Option<Arc<ThrottleConfig>>,
    ) -> Self {
        Self {
            replica_set,
            storage,
            time_source,
            config: config.map_or_else(ThrottleConfig::default, |cfg| *cfg),
            state: tokio::sync::Mutex::new(ThrottleState::default()),
        }
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// Returns the cached average, re-reading it from storage once it is older
    /// than [`THROTTLE_FRESHNESS_WINDOW`].
    ///
    /// The lock is held across the storage read so that concurrent callers of
    /// the same instance share one read.
    async fn average_lag(&self) -> Result<AverageLag, ThrottleError> {
        let mut state = self.state.lock().await;

        let now = self.time_source.now();
        if state.is_fresh(now) {
            return Ok(state.average_lag);
        }

        let average_lag = self
            .storage
            .get_average_lag(self.replica_set.primary_host())
            .await?;

        tracing::debug!(
            primary_host = %self.replica_set.primary_host(),
            %average_lag,
            "Refreshed average lag"
        );

        state.average_lag = average_lag;
        state.fetched_at = Some(now);

        Ok(average_lag)
    }
}

#[async_trait::async_trait]
impl Throttle for ThrottleImpl {
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(primary_host = %self.replica_set.primary_host())
    )]
    async fn throttle(&self) -> Result<Duration, ThrottleError> {
        let delay = self.current_delay().await?;

        if !delay.is_zero() {
            self.time_source.sleep(delay).await;
        }

        Ok(delay)
    }

    async fn current_delay(&self) -> Result<Duration, ThrottleError> {
        let average_lag = self.average_lag().await?;
        Ok(self.config.sleep_duration(average_lag.seconds()))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Locally cached average lag of one throttle instance
#[derive(Debug, Default)]
struct ThrottleState {
    average_lag: AverageLag,
    fetched_at: Option<DateTime<Utc>>,
}

impl ThrottleState {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let Some(fetched_at) = self.fetched_at else {
            return false;
        };

        // A clock that went backwards invalidates the cache as well
        let elapsed = now.signed_duration_since(fetched_at);
        elapsed >= chrono::Duration::zero()
            && elapsed.to_std().is_ok_and(|e| e <= THROTTLE_FRESHNESS_WINDOW)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
