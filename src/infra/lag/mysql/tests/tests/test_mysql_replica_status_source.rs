// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

use replag::ReplicaStatusSource;
use replag_mysql::{MySqlReplicaConfig, MySqlReplicaStatusSource};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn test_config_defaults() {
    let config = MySqlReplicaConfig::new("replica-1.local", "monitor");

    pretty_assertions::assert_eq!(config.port, 3306);
    pretty_assertions::assert_eq!(config.label(), "replica-1.local:3306");
    assert!(config.password.is_none());
    assert!(config.database.is_none());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn test_config_does_not_leak_password() {
    let config = MySqlReplicaConfig::new("replica-1.local", "monitor")
        .with_port(3307)
        .with_password("hunter2")
        .with_database("app");

    pretty_assertions::assert_eq!(config.label(), "replica-1.local:3307");
    assert!(!format!("{config:?}").contains("hunter2"));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_describe_uses_label() {
    let source = MySqlReplicaStatusSource::from_config(
        &MySqlReplicaConfig::new("replica-2.local", "monitor").with_port(3310),
    );

    pretty_assertions::assert_eq!(source.describe(), "replica-2.local:3310");
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_unreachable_replica_is_internal_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let mut config = MySqlReplicaConfig::new("127.0.0.1", "monitor").with_port(port);
    config.acquire_timeout = Duration::from_secs(1);

    let source = MySqlReplicaStatusSource::from_config(&config);

    let res = source.fetch_status().await;
    assert!(res.is_err(), "{res:?}");
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
