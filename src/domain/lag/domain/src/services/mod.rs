// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod lag_monitor;
mod replica_status_source;
mod throttle;

pub use lag_monitor::*;
pub use replica_status_source::*;
pub use throttle::*;
