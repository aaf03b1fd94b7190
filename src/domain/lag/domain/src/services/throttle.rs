// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

use thiserror::Error;

use crate::LagStorageError;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait Throttle: Send + Sync {
    /// Suspends the caller for a time proportional to the current average lag
    /// of the primary. Returns the duration of the pause.
    async fn throttle(&self) -> Result<Duration, ThrottleError>;

    /// Computes the pause [`Self::throttle`] would take right now, without
    /// suspending
    async fn current_delay(&self) -> Result<Duration, ThrottleError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum ThrottleError {
    #[error(transparent)]
    Storage(#[from] LagStorageError),
}
