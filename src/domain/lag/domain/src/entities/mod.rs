// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod lag_history;
mod lag_round;
mod primary_host;
mod replica_set;
mod replica_status;
mod throttle_config;

pub use lag_history::*;
pub use lag_round::*;
pub use primary_host::*;
pub use replica_set::*;
pub use replica_status::*;
pub use throttle_config::*;
