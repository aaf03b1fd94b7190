// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use dill::{Catalog, CatalogBuilder};
use replag::*;
use replag_memcached::{MemcachedConfig, MemcachedLagStorage};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufStream};
use tokio::net::{TcpListener, TcpStream};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_missing_host_reads_as_empty() {
    let harness = MemcachedLagStorageHarness::new(FakeBehavior::Normal).await;
    replag_repo_tests::test_missing_host_reads_as_empty(&harness.catalog).await;
}

#[test_log::test(tokio::test)]
async fn test_store_average_lag() {
    let harness = MemcachedLagStorageHarness::new(FakeBehavior::Normal).await;
    replag_repo_tests::test_store_average_lag(&harness.catalog).await;
}

#[test_log::test(tokio::test)]
async fn test_store_history() {
    let harness = MemcachedLagStorageHarness::new(FakeBehavior::Normal).await;
    replag_repo_tests::test_store_history(&harness.catalog).await;
}

#[test_log::test(tokio::test)]
async fn test_store_full_history() {
    let harness = MemcachedLagStorageHarness::new(FakeBehavior::Normal).await;
    replag_repo_tests::test_store_full_history(&harness.catalog).await;
}

#[test_log::test(tokio::test)]
async fn test_overwrite_replaces_values() {
    let harness = MemcachedLagStorageHarness::new(FakeBehavior::Normal).await;
    replag_repo_tests::test_overwrite_replaces_values(&harness.catalog).await;
}

#[test_log::test(tokio::test)]
async fn test_hosts_are_isolated() {
    let harness = MemcachedLagStorageHarness::new(FakeBehavior::Normal).await;
    replag_repo_tests::test_hosts_are_isolated(&harness.catalog).await;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_wire_format() {
    let harness = MemcachedLagStorageHarness::new(FakeBehavior::Normal).await;
    let host = PrimaryHost::try_new("db-1").unwrap();

    harness
        .storage
        .set_average_lag(&host, AverageLag::new(7))
        .await
        .unwrap();
    harness
        .storage
        .set_history(&host, &LagHistory::from_samples([1, 2, 3]))
        .await
        .unwrap();

    pretty_assertions::assert_eq!(
        harness.server.value("DbReplication:db-1:SecondsBehind"),
        Some(b"7".to_vec())
    );
    pretty_assertions::assert_eq!(
        harness.server.value("DbReplication:db-1:History"),
        Some(b"[1,2,3]".to_vec())
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_reads_values_written_by_others() {
    let harness = MemcachedLagStorageHarness::new(FakeBehavior::Normal).await;
    let host = PrimaryHost::try_new("db-1").unwrap();

    harness
        .server
        .put("DbReplication:db-1:SecondsBehind", b"12");
    harness
        .server
        .put("DbReplication:db-1:History", b"[10, 14]");

    pretty_assertions::assert_eq!(
        harness.storage.get_average_lag(&host).await.unwrap(),
        AverageLag::new(12)
    );
    pretty_assertions::assert_eq!(
        harness.storage.get_history(&host).await.unwrap().to_vec(),
        vec![10, 14]
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_undecodable_values_are_internal_errors() {
    let harness = MemcachedLagStorageHarness::new(FakeBehavior::Normal).await;
    let host = PrimaryHost::try_new("db-1").unwrap();

    harness
        .server
        .put("DbReplication:db-1:SecondsBehind", b"a:1:{}");
    harness
        .server
        .put("DbReplication:db-1:History", b"{\"0\": 3}");

    let res = harness.storage.get_average_lag(&host).await;
    assert!(matches!(res, Err(LagStorageError::Internal(_))), "{res:?}");

    let res = harness.storage.get_history(&host).await;
    assert!(matches!(res, Err(LagStorageError::Internal(_))), "{res:?}");
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_oversized_value_length_is_rejected() {
    for header in [
        "VALUE DbReplication:db-1:History 0 18446744073709551615",
        "VALUE DbReplication:db-1:History 0 4294967296",
        "VALUE DbReplication:db-1:History 0 1048577",
    ] {
        let harness = MemcachedLagStorageHarness::new(FakeBehavior::GetReplyHeader(header)).await;
        let host = PrimaryHost::try_new("db-1").unwrap();

        let res = harness.storage.get_history(&host).await;
        assert!(matches!(res, Err(LagStorageError::Internal(_))), "{header}: {res:?}");

        // The connection is in an unknown state and gets replaced
        let res = harness.storage.get_history(&host).await;
        assert!(matches!(res, Err(LagStorageError::Internal(_))), "{header}: {res:?}");
        pretty_assertions::assert_eq!(harness.server.connections(), 2);
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_not_stored_is_store_failure() {
    let harness = MemcachedLagStorageHarness::new(FakeBehavior::RejectSets("NOT_STORED")).await;
    let host = PrimaryHost::try_new("db-1").unwrap();

    let res = harness
        .storage
        .set_average_lag(&host, AverageLag::new(3))
        .await;
    assert!(
        matches!(
            &res,
            Err(LagStorageError::StoreFailed { key }) if key == "DbReplication:db-1:SecondsBehind"
        ),
        "{res:?}"
    );

    // The connection survives a declined write
    pretty_assertions::assert_eq!(
        harness.storage.get_average_lag(&host).await.unwrap(),
        AverageLag::ZERO
    );
    pretty_assertions::assert_eq!(harness.server.connections(), 1);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_server_error_is_store_failure() {
    let harness = MemcachedLagStorageHarness::new(FakeBehavior::RejectSets(
        "SERVER_ERROR out of memory storing object",
    ))
    .await;
    let host = PrimaryHost::try_new("db-1").unwrap();

    let res = harness
        .storage
        .set_history(&host, &LagHistory::from_samples([1]))
        .await;
    assert!(
        matches!(
            &res,
            Err(LagStorageError::StoreFailed { key }) if key == "DbReplication:db-1:History"
        ),
        "{res:?}"
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_reconnects_after_connection_loss() {
    let harness = MemcachedLagStorageHarness::new(FakeBehavior::CloseAfterReply).await;
    let host = PrimaryHost::try_new("db-1").unwrap();

    harness
        .storage
        .set_average_lag(&host, AverageLag::new(5))
        .await
        .unwrap();

    // The server hung up after the previous reply
    let res = harness.storage.get_average_lag(&host).await;
    assert!(matches!(res, Err(LagStorageError::Internal(_))), "{res:?}");

    pretty_assertions::assert_eq!(
        harness.storage.get_average_lag(&host).await.unwrap(),
        AverageLag::new(5)
    );
    pretty_assertions::assert_eq!(harness.server.connections(), 2);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_unreachable_server() {
    let address = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let storage = MemcachedLagStorage::new(Arc::new(
        MemcachedConfig::new(address.ip().to_string()).with_port(address.port()),
    ));
    let host = PrimaryHost::try_new("db-1").unwrap();

    let res = storage.get_history(&host).await;
    assert!(matches!(res, Err(LagStorageError::Internal(_))), "{res:?}");

    let res = storage.set_history(&host, &LagHistory::new()).await;
    assert!(matches!(res, Err(LagStorageError::Internal(_))), "{res:?}");
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_unstorable_key_is_rejected() {
    let harness = MemcachedLagStorageHarness::new(FakeBehavior::Normal).await;
    let host = PrimaryHost::try_new("db 1").unwrap();

    let res = harness.storage.get_average_lag(&host).await;
    assert!(matches!(res, Err(LagStorageError::Internal(_))), "{res:?}");

    let res = harness
        .storage
        .set_average_lag(&host, AverageLag::new(1))
        .await;
    assert!(matches!(res, Err(LagStorageError::Internal(_))), "{res:?}");

    assert!(harness.server.value("DbReplication:db 1:SecondsBehind").is_none());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Harness
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

struct MemcachedLagStorageHarness {
    server: FakeMemcached,
    catalog: Catalog,
    storage: Arc<dyn LagStorage>,
}

impl MemcachedLagStorageHarness {
    async fn new(behavior: FakeBehavior) -> Self {
        let server = FakeMemcached::start(behavior).await;

        let mut catalog_builder = CatalogBuilder::new();
        catalog_builder.add_value(server.config());
        catalog_builder.add::<MemcachedLagStorage>();
        let catalog = catalog_builder.build();

        Self {
            server,
            storage: catalog.get_one().unwrap(),
            catalog,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy)]
enum FakeBehavior {
    Normal,
    RejectSets(&'static str),
    CloseAfterReply,
    /// Answers every `get` with the given header line and no data
    GetReplyHeader(&'static str),
}

#[derive(Default)]
struct FakeState {
    values: HashMap<String, Vec<u8>>,
    connections: usize,
}

/// Tiny memcached stand-in that understands `get <key>` and `set`
struct FakeMemcached {
    address: SocketAddr,
    state: Arc<Mutex<FakeState>>,
}

impl FakeMemcached {
    async fn start(behavior: FakeBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(FakeState::default()));

        let server_state = state.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                server_state.lock().unwrap().connections += 1;
                tokio::spawn(serve_connection(socket, server_state.clone(), behavior));
            }
        });

        Self { address, state }
    }

    fn config(&self) -> MemcachedConfig {
        MemcachedConfig::new(self.address.ip().to_string()).with_port(self.address.port())
    }

    fn value(&self, key: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().values.get(key).cloned()
    }

    fn put(&self, key: &str, value: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .values
            .insert(key.to_string(), value.to_vec());
    }

    fn connections(&self) -> usize {
        self.state.lock().unwrap().connections
    }
}

async fn serve_connection(socket: TcpStream, state: Arc<Mutex<FakeState>>, behavior: FakeBehavior) {
    let mut stream = BufStream::new(socket);

    loop {
        let mut line = String::new();
        match stream.read_line(&mut line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let parts: Vec<&str> = line.trim_end().split(' ').collect();

        let reply = match (parts.as_slice(), behavior) {
            (["get", _], FakeBehavior::GetReplyHeader(header)) => {
                format!("{header}\r\n").into_bytes()
            }
            (["get", key], _) => {
                let value = state.lock().unwrap().values.get(*key).cloned();
                match value {
                    Some(value) => {
                        let mut reply = format!("VALUE {key} 0 {}\r\n", value.len()).into_bytes();
                        reply.extend_from_slice(&value);
                        reply.extend_from_slice(b"\r\nEND\r\n");
                        reply
                    }
                    None => b"END\r\n".to_vec(),
                }
            }
            (["set", key, _flags, _exptime, len], _) => {
                let len: usize = len.parse().unwrap();
                let mut data = vec![0; len + 2];
                if stream.read_exact(&mut data).await.is_err() {
                    return;
                }
                data.truncate(len);

                match behavior {
                    FakeBehavior::RejectSets(reply) => format!("{reply}\r\n").into_bytes(),
                    FakeBehavior::Normal
                    | FakeBehavior::CloseAfterReply
                    | FakeBehavior::GetReplyHeader(_) => {
                        state.lock().unwrap().values.insert((*key).to_string(), data);
                        b"STORED\r\n".to_vec()
                    }
                }
            }
            _ => b"ERROR\r\n".to_vec(),
        };

        if stream.write_all(&reply).await.is_err() || stream.flush().await.is_err() {
            return;
        }

        if let FakeBehavior::CloseAfterReply = behavior {
            return;
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
