// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use internal_error::{InternalError, ResultIntoInternal};
use replag::{ReplicaStatusRow, ReplicaStatusSource, StatusValue};
use secrecy::ExposeSecret;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, MySqlPool, Row, ValueRef};

use crate::MySqlReplicaConfig;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

const REPLICA_STATUS_QUERY: &str = "SHOW SLAVE STATUS";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Reads the replication status of one MySQL replica.
///
/// The pool connects lazily, so an unreachable replica only surfaces as an
/// error of the round that queries it.
pub struct MySqlReplicaStatusSource {
    label: String,
    mysql_pool: MySqlPool,
}

impl MySqlReplicaStatusSource {
    pub fn new(label: impl Into<String>, mysql_pool: MySqlPool) -> Self {
        Self {
            label: label.into(),
            mysql_pool,
        }
    }

    /// Must be called within a tokio runtime
    pub fn from_config(config: &MySqlReplicaConfig) -> Self {
        let mut connect_options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username);

        if let Some(password) = &config.password {
            connect_options = connect_options.password(password.expose_secret());
        }
        if let Some(database) = &config.database {
            connect_options = connect_options.database(database);
        }

        let mysql_pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy_with(connect_options);

        Self::new(config.label(), mysql_pool)
    }
}

#[async_trait::async_trait]
impl ReplicaStatusSource for MySqlReplicaStatusSource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    async fn fetch_status(&self) -> Result<Option<ReplicaStatusRow>, InternalError> {
        let maybe_row = sqlx::query(REPLICA_STATUS_QUERY)
            .fetch_optional(&self.mysql_pool)
            .await
            .context_int_err(format!("Querying replica status of {}", self.label))?;

        let Some(row) = maybe_row else {
            tracing::debug!(replica = %self.label, "Replica reports no replication status");
            return Ok(None);
        };

        status_row_from_mysql(&row).map(Some)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Converts a row of untyped status columns, keeping integer values as
/// integers and textual ones as text. Columns of other types are skipped.
fn status_row_from_mysql(row: &MySqlRow) -> Result<ReplicaStatusRow, InternalError> {
    let mut status = ReplicaStatusRow::new();

    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index).int_err()?;

        let value = if raw.is_null() {
            StatusValue::Null
        } else if let Ok(v) = row.try_get::<u64, _>(index) {
            StatusValue::UInt(v)
        } else if let Ok(v) = row.try_get::<i64, _>(index) {
            StatusValue::Int(v)
        } else if let Ok(v) = row.try_get::<String, _>(index) {
            StatusValue::Text(v)
        } else if let Ok(bytes) = row.try_get::<Vec<u8>, _>(index) {
            StatusValue::Text(String::from_utf8_lossy(&bytes).into_owned())
        } else {
            tracing::debug!(column = column.name(), "Skipping status column of unsupported type");
            continue;
        };

        status.insert(column.name(), value);
    }

    Ok(status)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
