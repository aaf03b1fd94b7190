// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Default)]
struct State {
    average_by_host: HashMap<PrimaryHost, AverageLag>,
    history_by_host: HashMap<PrimaryHost, LagHistory>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Process-local lag storage. Only useful when the monitor and the throttled
/// writers live in the same process.
pub struct InMemoryLagStorage {
    state: Arc<RwLock<State>>,
}

#[dill::component(pub)]
#[dill::interface(dyn LagStorage)]
#[dill::scope(dill::Singleton)]
impl InMemoryLagStorage {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl LagStorage for InMemoryLagStorage {
    async fn get_average_lag(&self, host: &PrimaryHost) -> Result<AverageLag, LagStorageError> {
        let readable_state = self.state.read().await;

        Ok(readable_state
            .average_by_host
            .get(host)
            .copied()
            .unwrap_or_default())
    }

    async fn set_average_lag(
        &self,
        host: &PrimaryHost,
        average_lag: AverageLag,
    ) -> Result<(), LagStorageError> {
        let mut writable_state = self.state.write().await;

        writable_state
            .average_by_host
            .insert(host.clone(), average_lag);

        Ok(())
    }

    async fn get_history(&self, host: &PrimaryHost) -> Result<LagHistory, LagStorageError> {
        let readable_state = self.state.read().await;

        Ok(readable_state
            .history_by_host
            .get(host)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_history(
        &self,
        host: &PrimaryHost,
        history: &LagHistory,
    ) -> Result<(), LagStorageError> {
        let mut writable_state = self.state.write().await;

        writable_state
            .history_by_host
            .insert(host.clone(), history.clone());

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
