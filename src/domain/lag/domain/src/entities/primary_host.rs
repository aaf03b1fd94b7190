// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt;

use crate::ConfigurationError;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Identity of the primary database instance. Lag values of all its replicas
/// are stored under this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimaryHost(String);

impl PrimaryHost {
    pub fn try_new(host: impl Into<String>) -> Result<Self, ConfigurationError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(ConfigurationError::EmptyPrimaryHost);
        }
        Ok(Self(host))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrimaryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PrimaryHost {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
