// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::{PrimaryHost, ReplicaStatusSource};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// The primary together with every replica whose lag is taken into account.
/// Immutable once constructed.
#[derive(Clone)]
pub struct ReplicaSet {
    primary_host: PrimaryHost,
    replicas: Vec<Arc<dyn ReplicaStatusSource>>,
}

impl ReplicaSet {
    pub fn try_new(
        primary_host: PrimaryHost,
        replicas: Vec<Arc<dyn ReplicaStatusSource>>,
    ) -> Result<Self, ConfigurationError> {
        if replicas.is_empty() {
            return Err(ConfigurationError::EmptyReplicaSet);
        }

        Ok(Self {
            primary_host,
            replicas,
        })
    }

    pub fn primary_host(&self) -> &PrimaryHost {
        &self.primary_host
    }

    pub fn replicas(&self) -> &[Arc<dyn ReplicaStatusSource>] {
        &self.replicas
    }
}

impl fmt::Debug for ReplicaSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicaSet")
            .field("primary_host", &self.primary_host)
            .field(
                "replicas",
                &self
                    .replicas
                    .iter()
                    .map(|r| r.describe())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Missing required list of replicas")]
    EmptyReplicaSet,

    #[error("Primary host must not be empty")]
    EmptyPrimaryHost,

    #[error("Replica #{index} is not a queryable replica: {reason}")]
    InvalidReplica { index: usize, reason: String },

    #[error("Invalid storage configuration: {reason}")]
    InvalidStorage { reason: String },
}
