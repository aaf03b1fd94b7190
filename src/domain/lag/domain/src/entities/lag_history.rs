// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Seconds of lag observed from one replica in one monitoring round
pub type LagSample = u64;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Rolling window of the most recent per-round lag samples of a primary,
/// oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LagHistory {
    samples: VecDeque<LagSample>,
}

impl LagHistory {
    pub const CAPACITY: usize = 30;

    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps previously persisted samples as-is. The capacity is only
    /// enforced on the next [`Self::push`].
    pub fn from_samples(samples: impl IntoIterator<Item = LagSample>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
        }
    }

    /// Appends a sample and evicts the oldest ones until the history fits into
    /// [`Self::CAPACITY`]
    pub fn push(&mut self, sample: LagSample) {
        self.samples.push_back(sample);

        let excess = self.samples.len().saturating_sub(Self::CAPACITY);
        self.samples.drain(..excess);
    }

    /// Ceiling of the arithmetic mean, or zero for an empty history
    pub fn average(&self) -> AverageLag {
        if self.samples.is_empty() {
            return AverageLag::ZERO;
        }

        let sum: u128 = self.samples.iter().map(|s| u128::from(*s)).sum();
        let count = self.samples.len() as u128;

        let avg = sum.div_ceil(count);
        AverageLag::new(u64::try_from(avg).unwrap_or(u64::MAX))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> impl ExactSizeIterator<Item = LagSample> + '_ {
        self.samples.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<LagSample> {
        self.samples.iter().copied().collect()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Rounded-up mean of a [`LagHistory`], in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AverageLag(u64);

impl AverageLag {
    pub const ZERO: Self = Self(0);

    pub const fn new(seconds: u64) -> Self {
        Self(seconds)
    }

    pub const fn seconds(self) -> u64 {
        self.0
    }
}

impl From<u64> for AverageLag {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for AverageLag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
