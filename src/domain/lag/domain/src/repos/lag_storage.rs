// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use internal_error::InternalError;
use thiserror::Error;

use crate::{AverageLag, LagHistory, PrimaryHost};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Shared key-value state of the lag monitor, keyed by primary host.
///
/// Implementations must make each individual get/set atomic. No atomicity is
/// expected across calls: concurrent monitors may interleave their
/// read-modify-write of the history, and the history is treated as an
/// approximate signal accordingly.
#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait LagStorage: Send + Sync {
    /// Returns [`AverageLag::ZERO`] when nothing was recorded for the host yet
    async fn get_average_lag(&self, host: &PrimaryHost) -> Result<AverageLag, LagStorageError>;

    async fn set_average_lag(
        &self,
        host: &PrimaryHost,
        average_lag: AverageLag,
    ) -> Result<(), LagStorageError>;

    /// Returns an empty history when nothing was recorded for the host yet
    async fn get_history(&self, host: &PrimaryHost) -> Result<LagHistory, LagStorageError>;

    async fn set_history(
        &self,
        host: &PrimaryHost,
        history: &LagHistory,
    ) -> Result<(), LagStorageError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum LagStorageError {
    #[error("Unable to store value under key '{key}'")]
    StoreFailed { key: String },

    #[error(transparent)]
    Internal(#[from] InternalError),
}
