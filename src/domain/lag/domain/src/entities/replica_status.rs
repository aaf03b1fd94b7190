// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::LagSample;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Column of the replication status row that carries the lag
pub const REPLICA_LAG_COLUMN: &str = "Seconds_Behind_Master";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusValue {
    Null,
    UInt(u64),
    Int(i64),
    Text(String),
}

impl From<u64> for StatusValue {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<i64> for StatusValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for StatusValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for StatusValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<StatusValue>> From<Option<T>> for StatusValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A single row of a replication status query, keyed by column name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicaStatusRow {
    columns: BTreeMap<String, StatusValue>,
}

impl ReplicaStatusRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<StatusValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<StatusValue>) {
        self.columns.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&StatusValue> {
        self.columns.get(column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Extracts the non-negative lag value from [`REPLICA_LAG_COLUMN`]
    pub fn lag_seconds(&self) -> Result<LagSample, LagValidationReason> {
        match self.get(REPLICA_LAG_COLUMN) {
            None => Err(LagValidationReason::MissingField),
            Some(StatusValue::Null) => Err(LagValidationReason::NullField),
            Some(StatusValue::UInt(v)) => Ok(*v),
            Some(StatusValue::Int(v)) => {
                u64::try_from(*v).map_err(|_| LagValidationReason::InvalidValue(v.to_string()))
            }
            Some(StatusValue::Text(v)) => v
                .trim()
                .parse::<u64>()
                .map_err(|_| LagValidationReason::InvalidValue(v.clone())),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for ReplicaStatusRow
where
    K: Into<String>,
    V: Into<StatusValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
#[error("Replica {replica} reported no usable lag: {reason}")]
pub struct LagValidationError {
    pub replica: String,
    pub reason: LagValidationReason,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LagValidationReason {
    #[error("replication status is not available")]
    NoStatus,

    #[error("Seconds_Behind_Master is missing")]
    MissingField,

    #[error("Seconds_Behind_Master is null")]
    NullField,

    #[error("Seconds_Behind_Master is not a valid value: '{0}'")]
    InvalidValue(String),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
