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

use crate::{LagRound, LagStorageError, LagValidationError};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait LagMonitor: Send + Sync {
    /// Samples all replicas once and folds the worst lag into the persisted
    /// history and average of the primary.
    ///
    /// A single replica without a usable lag value fails the entire round and
    /// nothing is written.
    async fn monitor(&self) -> Result<LagRound, MonitorError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error(transparent)]
    Validation(#[from] LagValidationError),

    #[error(transparent)]
    Storage(#[from] LagStorageError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}
