// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use internal_error::{ErrorIntoInternal, ResultIntoInternal};

use crate::domain::*;
use crate::{MemcachedConfig, MemcachedConnection, MemcachedError, StoreReply};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

const KEY_PREFIX: &str = "DbReplication";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Lag storage shared between processes through a single memcached server.
///
/// Holds one connection that is established on first use and re-established
/// after it breaks.
pub struct MemcachedLagStorage {
    config: Arc<MemcachedConfig>,
    connection: tokio::sync::Mutex<Option<MemcachedConnection>>,
}

#[dill::component(pub)]
#[dill::interface(dyn LagStorage)]
#[dill::scope(dill::Singleton)]
impl MemcachedLagStorage {
    pub fn new(config: Arc<MemcachedConfig>) -> Self {
        Self {
            config,
            connection: tokio::sync::Mutex::new(None),
        }
    }

    pub fn average_lag_key(host: &PrimaryHost) -> String {
        format!("{KEY_PREFIX}:{host}:SecondsBehind")
    }

    pub fn history_key(host: &PrimaryHost) -> String {
        format!("{KEY_PREFIX}:{host}:History")
    }

    async fn checkout(
        &self,
        slot: &mut Option<MemcachedConnection>,
    ) -> Result<MemcachedConnection, MemcachedError> {
        if let Some(connection) = slot.take() {
            return Ok(connection);
        }

        tracing::debug!(address = %self.config.address(), "Connecting to memcached");
        MemcachedConnection::connect(&self.config).await
    }

    fn checkin<T>(
        slot: &mut Option<MemcachedConnection>,
        connection: MemcachedConnection,
        res: &Result<T, MemcachedError>,
    ) {
        match res {
            Err(e) if e.breaks_connection() => {
                tracing::warn!(error = %e, "Dropping memcached connection");
            }
            _ => *slot = Some(connection),
        }
    }

    async fn get_value(&self, key: &str) -> Result<Option<Vec<u8>>, MemcachedError> {
        let mut slot = self.connection.lock().await;
        let mut connection = self.checkout(&mut slot).await?;

        let res = connection.get(key).await;
        Self::checkin(&mut slot, connection, &res);
        res
    }

    async fn set_value(&self, key: &str, value: &[u8]) -> Result<(), LagStorageError> {
        let res = {
            let mut slot = self.connection.lock().await;
            match self.checkout(&mut slot).await {
                Ok(mut connection) => {
                    let res = connection.set(key, value).await;
                    Self::checkin(&mut slot, connection, &res);
                    res
                }
                Err(e) => Err(e),
            }
        };

        match res {
            Ok(StoreReply::Stored) => Ok(()),
            Ok(StoreReply::NotStored(reply)) => {
                tracing::warn!(key, reply, "Memcached did not store the value");
                Err(LagStorageError::StoreFailed {
                    key: key.to_string(),
                })
            }
            Err(MemcachedError::Rejected { reply }) => {
                tracing::warn!(key, reply, "Memcached rejected the value");
                Err(LagStorageError::StoreFailed {
                    key: key.to_string(),
                })
            }
            Err(e) => Err(e.int_err().with_context(format!("Storing '{key}'")).into()),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl LagStorage for MemcachedLagStorage {
    async fn get_average_lag(&self, host: &PrimaryHost) -> Result<AverageLag, LagStorageError> {
        let key = Self::average_lag_key(host);

        let Some(value) = self.get_value(&key).await.int_err()? else {
            return Ok(AverageLag::ZERO);
        };

        let seconds = std::str::from_utf8(&value)
            .int_err()
            .and_then(|s| s.trim().parse::<u64>().int_err())
            .map_err(|e| e.with_context(format!("Decoding '{key}'")))?;

        Ok(AverageLag::new(seconds))
    }

    async fn set_average_lag(
        &self,
        host: &PrimaryHost,
        average_lag: AverageLag,
    ) -> Result<(), LagStorageError> {
        self.set_value(
            &Self::average_lag_key(host),
            average_lag.seconds().to_string().as_bytes(),
        )
        .await
    }

    async fn get_history(&self, host: &PrimaryHost) -> Result<LagHistory, LagStorageError> {
        let key = Self::history_key(host);

        let Some(value) = self.get_value(&key).await.int_err()? else {
            return Ok(LagHistory::new());
        };

        let history: LagHistory =
            serde_json::from_slice(&value).context_int_err(format!("Decoding '{key}'"))?;

        Ok(history)
    }

    async fn set_history(
        &self,
        host: &PrimaryHost,
        history: &LagHistory,
    ) -> Result<(), LagStorageError> {
        let value = serde_json::to_vec(history).int_err()?;

        self.set_value(&Self::history_key(host), &value).await
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
