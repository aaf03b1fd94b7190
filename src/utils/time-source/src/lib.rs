// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Abstracts access to the wall clock and to suspending the current task,
/// so that time-dependent components can be tested deterministically
#[async_trait::async_trait]
pub trait SystemTimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    async fn sleep(&self, duration: Duration);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct SystemTimeSourceDefault;

#[dill::component(pub)]
#[dill::interface(dyn SystemTimeSource)]
impl SystemTimeSourceDefault {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl SystemTimeSource for SystemTimeSourceDefault {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Test double: the clock only moves when told to, and sleeping returns
/// immediately after advancing the clock by the requested duration.
///
/// Clones share the same state.
#[derive(Debug, Clone)]
pub struct SystemTimeSourceStub {
    state: Arc<Mutex<StubState>>,
}

#[derive(Debug, Default)]
struct StubState {
    t: Option<DateTime<Utc>>,
    sleeps: Vec<Duration>,
}

impl SystemTimeSourceStub {
    /// Follows the real clock until [`Self::set`] is called
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StubState::default())),
        }
    }

    pub fn new_set(t: DateTime<Utc>) -> Self {
        let stub = Self::new();
        stub.set(t);
        stub
    }

    pub fn set(&self, t: DateTime<Utc>) {
        self.state.lock().unwrap().t = Some(t);
    }

    pub fn unset(&self) {
        self.state.lock().unwrap().t = None;
    }

    pub fn advance(&self, duration: chrono::Duration) -> DateTime<Utc> {
        let mut state = self.state.lock().unwrap();
        let t = state.t.unwrap_or_else(Utc::now) + duration;
        state.t = Some(t);
        t
    }

    /// All durations passed to [`SystemTimeSource::sleep`] so far
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().unwrap().sleeps.clone()
    }
}

#[async_trait::async_trait]
impl SystemTimeSource for SystemTimeSourceStub {
    fn now(&self) -> DateTime<Utc> {
        self.state.lock().unwrap().t.unwrap_or_else(Utc::now)
    }

    async fn sleep(&self, duration: Duration) {
        let mut state = self.state.lock().unwrap();
        state.sleeps.push(duration);
        if let Some(t) = state.t {
            if let Some(t) = chrono::Duration::from_std(duration)
                .ok()
                .and_then(|step| t.checked_add_signed(step))
            {
                state.t = Some(t);
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
