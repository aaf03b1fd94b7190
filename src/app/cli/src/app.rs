// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use dill::CatalogBuilder;
use replag::{ConfigurationError, ReplicaSet, ReplicaStatusSource};
use replag_inmem::InMemoryLagStorage;
use replag_memcached::MemcachedLagStorage;
use replag_mysql::MySqlReplicaStatusSource;
use replag_services::{LagMonitorImpl, ThrottleImpl};
use time_source::SystemTimeSourceDefault;

use crate::config::{ReplagConfig, StorageConfig};
use crate::{CLIError, OutputConfig, cli, cli_commands};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const BINARY_NAME: &str = "replag";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn run(args: cli::Cli) -> Result<(), CLIError> {
    let output_config = OutputConfig::detect(args.verbose);

    let guard = configure_logging(&args, &output_config)?;
    observability::panic_handler::set_hook_trace_panics(BINARY_NAME);

    tracing::info!(
        version = VERSION,
        args = ?std::env::args().collect::<Vec<_>>(),
        config_path = %args.config.display(),
        "Initializing {BINARY_NAME}"
    );

    let result = async {
        let config = ReplagConfig::load(&args.config)?;
        let catalog = configure_catalog(&config)?.build();

        let mut command = cli_commands::get_command(&catalog, &config, args.command)?;
        command.run().await
    }
    .await;

    match &result {
        Ok(()) => {
            tracing::info!("Command successful");
        }
        Err(err) => {
            tracing::error!(
                error_dbg = ?err,
                error = %err.pretty(),
                "Command failed",
            );
        }
    }

    // Flush all logging sinks
    drop(guard);

    result
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Catalog
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Registers all components the commands depend on. Must be called within a
/// tokio runtime, as replica connection pools are created here.
pub fn configure_catalog(config: &ReplagConfig) -> Result<CatalogBuilder, CLIError> {
    let mut catalog_builder = CatalogBuilder::new();

    catalog_builder.add::<SystemTimeSourceDefault>();

    catalog_builder.add_value(build_replica_set(config)?);
    catalog_builder.add_value(config.throttle.to_throttle_config());

    match &config.storage {
        StorageConfig::InMemory => {
            catalog_builder.add::<InMemoryLagStorage>();
        }
        StorageConfig::Memcached(memcached) => {
            catalog_builder.add_value(memcached.to_memcached_config()?);
            catalog_builder.add::<MemcachedLagStorage>();
        }
    }

    catalog_builder.add::<LagMonitorImpl>();
    catalog_builder.add::<ThrottleImpl>();

    Ok(catalog_builder)
}

pub fn build_replica_set(config: &ReplagConfig) -> Result<ReplicaSet, ConfigurationError> {
    let primary_host = config.primary_host()?;

    let replicas = config
        .replicas
        .iter()
        .enumerate()
        .map(|(index, replica)| {
            replica.validate(index)?;

            let source = MySqlReplicaStatusSource::from_config(&replica.to_mysql_config());
            Ok(Arc::new(source) as Arc<dyn ReplicaStatusSource>)
        })
        .collect::<Result<Vec<_>, ConfigurationError>>()?;

    ReplicaSet::try_new(primary_host, replicas)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Logging
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn configure_logging(
    args: &cli::Cli,
    output_config: &OutputConfig,
) -> Result<observability::init::Guard, CLIError> {
    let config = observability::init::Config::new(BINARY_NAME)
        .with_default_log_levels(output_config.log_levels())
        .with_format(output_config.log_format())
        .with_log_file(args.log_file.clone());

    observability::init::init(&config)
        .map_err(|e| CLIError::usage_error_with_source("Unable to create log file", e))
}
