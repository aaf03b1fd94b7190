// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;
use std::time::Duration;

use replag::{ReplicaSet, Throttle};

use super::Command;
use crate::CLIError;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct ThrottleCommand {
    throttle: Arc<dyn Throttle>,
    replica_set: Arc<ReplicaSet>,
    dry_run: bool,
}

impl ThrottleCommand {
    pub fn new(throttle: Arc<dyn Throttle>, replica_set: Arc<ReplicaSet>, dry_run: bool) -> Self {
        Self {
            throttle,
            replica_set,
            dry_run,
        }
    }

    pub async fn apply(&self) -> Result<Duration, CLIError> {
        let delay = if self.dry_run {
            self.throttle.current_delay().await?
        } else {
            self.throttle.throttle().await?
        };
        Ok(delay)
    }

    pub fn describe(&self, delay: Duration) -> String {
        let primary_host = self.replica_set.primary_host();
        if self.dry_run {
            format!("Writes to {primary_host} would pause for {delay:?}")
        } else {
            format!("Writes to {primary_host} paused for {delay:?}")
        }
    }
}

#[async_trait::async_trait(?Send)]
impl Command for ThrottleCommand {
    async fn run(&mut self) -> Result<(), CLIError> {
        let delay = self.apply().await?;
        println!("{}", self.describe(delay));
        Ok(())
    }
}
