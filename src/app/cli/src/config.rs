// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::path::Path;
use std::time::Duration;

use duration_string::DurationString;
use replag::{ConfigurationError, PrimaryHost, ThrottleConfig};
use replag_memcached::MemcachedConfig;
use replag_mysql::MySqlReplicaConfig;
use secrecy::SecretString;
use serde::Deserialize;

use crate::CLIError;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReplagConfig {
    /// Primary whose replicas are monitored
    pub primary: PrimaryConfig,

    /// Replicas to sample lag from
    #[serde(default)]
    pub replicas: Vec<ReplicaConfig>,

    /// Where lag statistics are shared between processes. Required: the
    /// in-memory store has to be chosen explicitly.
    pub storage: StorageConfig,

    #[serde(default)]
    pub throttle: ThrottleSettings,

    #[serde(default)]
    pub monitor: MonitorSettings,
}

impl ReplagConfig {
    pub fn load(path: &Path) -> Result<Self, CLIError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CLIError::usage_error_with_source(
                format!("Unable to read config {}", path.display()),
                e,
            )
        })?;

        Self::from_yaml(&contents).map_err(|e| {
            CLIError::usage_error_with_source(format!("Invalid config {}", path.display()), e)
        })
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    pub fn primary_host(&self) -> Result<PrimaryHost, ConfigurationError> {
        PrimaryHost::try_new(self.primary.host.clone())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryConfig {
    pub host: String,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaConfig {
    pub host: String,

    #[serde(default = "ReplicaConfig::default_port")]
    pub port: u16,

    pub username: String,

    #[serde(default)]
    pub password: Option<SecretString>,

    #[serde(default)]
    pub database: Option<String>,
}

impl ReplicaConfig {
    fn default_port() -> u16 {
        MySqlReplicaConfig::DEFAULT_PORT
    }

    /// Checks that the entry can form a queryable replica
    pub fn validate(&self, index: usize) -> Result<(), ConfigurationError> {
        let reason = if self.host.trim().is_empty() {
            "host must not be empty"
        } else if self.port == 0 {
            "port must not be 0"
        } else if self.username.trim().is_empty() {
            "username must not be empty"
        } else {
            return Ok(());
        };

        Err(ConfigurationError::InvalidReplica {
            index,
            reason: reason.to_string(),
        })
    }

    pub fn to_mysql_config(&self) -> MySqlReplicaConfig {
        let mut config = MySqlReplicaConfig::new(self.host.trim(), &self.username).with_port(self.port);
        config.password.clone_from(&self.password);
        config.database.clone_from(&self.database);
        config
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StorageConfig {
    /// Only shared within a single process
    InMemory,
    Memcached(MemcachedStorageConfig),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemcachedStorageConfig {
    pub host: String,

    #[serde(default = "MemcachedStorageConfig::default_port")]
    pub port: u16,

    /// Connect timeout
    #[serde(default = "MemcachedStorageConfig::default_timeout")]
    pub timeout: DurationString,
}

impl MemcachedStorageConfig {
    fn default_port() -> u16 {
        MemcachedConfig::DEFAULT_PORT
    }

    fn default_timeout() -> DurationString {
        MemcachedConfig::DEFAULT_CONNECT_TIMEOUT.into()
    }

    pub fn to_memcached_config(&self) -> Result<MemcachedConfig, ConfigurationError> {
        if self.host.trim().is_empty() {
            return Err(ConfigurationError::InvalidStorage {
                reason: "memcached host must not be empty".to_string(),
            });
        }

        Ok(MemcachedConfig::new(self.host.trim())
            .with_port(self.port)
            .with_connect_timeout(self.timeout.into()))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThrottleSettings {
    /// Percentage applied to the computed pause
    pub weighting: u32,

    /// Upper bound of a single pause in milliseconds
    pub max_sleep: u64,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self {
            weighting: ThrottleConfig::DEFAULT_WEIGHTING,
            max_sleep: ThrottleConfig::DEFAULT_MAX_SLEEP_MS,
        }
    }
}

impl ThrottleSettings {
    pub fn to_throttle_config(&self) -> ThrottleConfig {
        ThrottleConfig::new(self.weighting, self.max_sleep)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorSettings {
    /// Pause between rounds in daemon mode
    pub interval: DurationString,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1).into(),
        }
    }
}

impl MonitorSettings {
    pub fn interval(&self) -> Duration {
        self.interval.into()
    }
}
