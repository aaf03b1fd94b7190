// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Minimal client side of the memcached ASCII protocol: just enough of `get`
//! and `set` to persist lag statistics.
//!
//! ```text
//! get <key>\r\n
//!     -> VALUE <key> <flags> <bytes> [<cas>]\r\n<data>\r\nEND\r\n
//!     -> END\r\n
//! set <key> <flags> <exptime> <bytes>\r\n<data>\r\n
//!     -> STORED\r\n | NOT_STORED\r\n | EXISTS\r\n | NOT_FOUND\r\n
//! ```
//!
//! Any command may also be answered with `ERROR`, `CLIENT_ERROR <msg>` or
//! `SERVER_ERROR <msg>`.

use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;

use crate::MemcachedConfig;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const MAX_KEY_LENGTH: usize = 250;

/// Default item size limit of memcached, larger values are never accepted
pub const MAX_VALUE_LENGTH: usize = 1024 * 1024;

const CRLF: &[u8] = b"\r\n";

/// Upper bound for a single reply line, values are read separately
const MAX_LINE_LENGTH: u64 = 2048;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub fn validate_key(key: &str) -> Result<(), MemcachedError> {
    if key.is_empty()
        || key.len() > MAX_KEY_LENGTH
        || key.chars().any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(MemcachedError::InvalidKey {
            key: key.to_string(),
        });
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreReply {
    Stored,
    /// Server declined to store the value, carries the reply line
    NotStored(String),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct MemcachedConnection {
    stream: BufStream<TcpStream>,
}

impl MemcachedConnection {
    pub async fn connect(config: &MemcachedConfig) -> Result<Self, MemcachedError> {
        let address = config.address();

        let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(&address))
            .await
            .map_err(|_| MemcachedError::ConnectTimeout {
                address: address.clone(),
                timeout: config.connect_timeout,
            })??;

        stream.set_nodelay(true)?;

        Ok(Self {
            stream: BufStream::new(stream),
        })
    }

    pub async fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>, MemcachedError> {
        validate_key(key)?;

        self.stream
            .write_all(format!("get {key}\r\n").as_bytes())
            .await?;
        self.stream.flush().await?;

        let mut value = None;

        loop {
            let line = self.read_line().await?;
            check_error_reply(&line)?;

            if line == "END" {
                return Ok(value);
            }

            let Some(len) = parse_value_header(&line, key) else {
                return Err(MemcachedError::UnexpectedReply { reply: line });
            };
            if value.is_some() {
                return Err(MemcachedError::UnexpectedReply { reply: line });
            }

            let Some(block_len) = len.checked_add(CRLF.len()) else {
                return Err(MemcachedError::UnexpectedReply { reply: line });
            };

            let mut data = vec![0; block_len];
            self.stream.read_exact(&mut data).await?;
            if !data.ends_with(CRLF) {
                return Err(MemcachedError::UnexpectedReply {
                    reply: "Value block is not terminated with CRLF".to_string(),
                });
            }
            data.truncate(len);

            value = Some(data);
        }
    }

    pub async fn set(&mut self, key: &str, value: &[u8]) -> Result<StoreReply, MemcachedError> {
        validate_key(key)?;

        self.stream
            .write_all(format!("set {key} 0 0 {}\r\n", value.len()).as_bytes())
            .await?;
        self.stream.write_all(value).await?;
        self.stream.write_all(CRLF).await?;
        self.stream.flush().await?;

        let line = self.read_line().await?;
        check_error_reply(&line)?;

        match line.as_str() {
            "STORED" => Ok(StoreReply::Stored),
            "NOT_STORED" | "EXISTS" | "NOT_FOUND" => Ok(StoreReply::NotStored(line)),
            _ => Err(MemcachedError::UnexpectedReply { reply: line }),
        }
    }

    async fn read_line(&mut self) -> Result<String, MemcachedError> {
        let mut buf = Vec::new();
        let read = (&mut self.stream)
            .take(MAX_LINE_LENGTH)
            .read_until(b'\n', &mut buf)
            .await?;

        if read == 0 {
            return Err(MemcachedError::ConnectionClosed);
        }
        if !buf.ends_with(CRLF) {
            return Err(MemcachedError::UnexpectedReply {
                reply: String::from_utf8_lossy(&buf).into_owned(),
            });
        }
        buf.truncate(buf.len() - CRLF.len());

        String::from_utf8(buf).map_err(|e| MemcachedError::UnexpectedReply {
            reply: String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn check_error_reply(line: &str) -> Result<(), MemcachedError> {
    if line == "ERROR"
        || line.starts_with("CLIENT_ERROR")
        || line.starts_with("SERVER_ERROR")
    {
        return Err(MemcachedError::Rejected {
            reply: line.to_string(),
        });
    }
    Ok(())
}

/// Parses `VALUE <key> <flags> <bytes> [<cas>]` into the data length, which
/// is at most [`MAX_VALUE_LENGTH`]
fn parse_value_header(line: &str, expected_key: &str) -> Option<usize> {
    let mut parts = line.split(' ');

    if parts.next()? != "VALUE" || parts.next()? != expected_key {
        return None;
    }
    parts.next()?.parse::<u32>().ok()?;
    let len = parts
        .next()?
        .parse::<usize>()
        .ok()
        .filter(|len| *len <= MAX_VALUE_LENGTH)?;

    match (parts.next(), parts.next()) {
        (None, _) => Some(len),
        (Some(cas), None) if cas.parse::<u64>().is_ok() => Some(len),
        _ => None,
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum MemcachedError {
    #[error("Key '{key}' cannot be stored in memcached")]
    InvalidKey { key: String },

    #[error("Timed out connecting to memcached at {address} after {timeout:?}")]
    ConnectTimeout { address: String, timeout: Duration },

    #[error("Memcached closed the connection")]
    ConnectionClosed,

    #[error("Memcached rejected the command: {reply}")]
    Rejected { reply: String },

    #[error("Unexpected reply from memcached: {reply}")]
    UnexpectedReply { reply: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MemcachedError {
    /// Whether the connection may be left in an unknown state and has to be
    /// re-established
    pub fn breaks_connection(&self) -> bool {
        !matches!(self, Self::InvalidKey { .. } | Self::Rejected { .. })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
