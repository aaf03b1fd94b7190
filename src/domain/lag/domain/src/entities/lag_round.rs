// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{AverageLag, LagSample};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Outcome of a successful monitoring round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagRound {
    /// Worst lag among all replicas in this round
    pub sample: LagSample,

    /// Average over the updated history, as persisted
    pub average_lag: AverageLag,

    pub history_len: usize,
}
