// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use internal_error::InternalError;

use crate::ReplicaStatusRow;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A replica that can report its replication status
#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait ReplicaStatusSource: Send + Sync {
    /// Human-readable identity used in errors and logs, e.g. `host:port`
    fn describe(&self) -> String;

    /// Returns `None` when the instance reports no replication status at all,
    /// i.e. it is not configured as a replica
    async fn fetch_status(&self) -> Result<Option<ReplicaStatusRow>, InternalError>;
}
