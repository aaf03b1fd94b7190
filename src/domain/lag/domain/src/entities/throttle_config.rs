// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Exponent of the load curve. Small lag produces near-zero pauses while a
/// lag of a few seconds quickly saturates at the configured maximum.
pub const THROTTLE_LOAD_EXPONENT: f64 = 5.2;

/// Maximum age of a locally cached average before it is re-read from storage
pub const THROTTLE_FRESHNESS_WINDOW: Duration = Duration::from_secs(1);

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Scaling of the load curve, in percent
    pub weighting: u32,

    /// Upper bound of a single pause, in milliseconds
    pub max_sleep_ms: u64,
}

impl ThrottleConfig {
    pub const DEFAULT_WEIGHTING: u32 = 100;
    pub const DEFAULT_MAX_SLEEP_MS: u64 = 1000;

    pub fn new(weighting: u32, max_sleep_ms: u64) -> Self {
        Self {
            weighting,
            max_sleep_ms,
        }
    }

    /// Pause in milliseconds for the given average lag in seconds:
    /// `min(lag^5.2 / 100 * weighting / 100, max_sleep_ms)`
    #[allow(clippy::cast_precision_loss)]
    pub fn sleep_millis(&self, average_lag_secs: u64) -> f64 {
        let load = (average_lag_secs as f64).powf(THROTTLE_LOAD_EXPONENT) / 100.0;
        let weighting = f64::from(self.weighting) / 100.0;

        (load * weighting).min(self.max_sleep_ms as f64)
    }

    /// Same as [`Self::sleep_millis`], truncated to whole microseconds
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn sleep_duration(&self, average_lag_secs: u64) -> Duration {
        let micros = (self.sleep_millis(average_lag_secs) * 1000.0).floor();
        Duration::from_micros(micros as u64)
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WEIGHTING, Self::DEFAULT_MAX_SLEEP_MS)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
