//! Ethereum JSON RPC HTTP transport.

use crate::transport::{Transport, TransportError};
use futures::future::BoxFuture;
use reqwest::{StatusCode, Url};
use std::env;
use thiserror::Error;

pub use reqwest;

/// A request/response transport over HTTP.
#[derive(Clone, Debug)]
pub struct Http {
    client: reqwest::Client,
    url: Url,
}

impl Http {
    /// Creates a new JSON RPC HTTP transport for the specified URL with the
    /// default HTTP client.
    pub fn new(url: Url) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Creates a new JSON RPC HTTP transport for the specified client
    /// instance and URL.
    pub fn with_client(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    /// Creates a new JSON RPC HTTP transport from the environment. This
    /// method uses the `ETHRPC` environment variable. This is useful for
    /// testing.
    ///
    /// # Panics
    ///
    /// This method panics if the environment variable is not present, or if
    /// it is not a valid HTTP url.
    pub fn from_env() -> Self {
        Self::new(
            env::var("ETHRPC")
                .expect("missing ETHRPC environment variable")
                .parse()
                .expect("invalid ETHRPC url"),
        )
    }

    async fn roundtrip(&self, payload: String) -> Result<String, Error> {
        let response = self
            .client
            .post(self.url.clone())
            .header("content-type", "application/json")
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Status(status, body));
        }
        Ok(body)
    }
}

impl Transport for Http {
    fn send(&self, payload: String) -> BoxFuture<'_, Result<Option<String>, TransportError>> {
        Box::pin(async move {
            self.roundtrip(payload)
                .await
                .map(Some)
                .map_err(TransportError::new)
        })
    }
}

/// An HTTP transport error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {0} error: {1}")]
    Status(StatusCode, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        abi::{AbiItem, Param, ParamType},
        eth,
        types::{Address, BlockTag, Empty, Hydrated, TransactionRequest},
        web3, Client,
    };
    use hex_literal::hex;

    #[tokio::test]
    #[ignore]
    async fn connect_to_node() {
        let client = Client::new(Http::from_env());
        let version = client.call_np(web3::ClientVersion).await.unwrap();
        println!("client version: {version}");
    }

    #[tokio::test]
    #[ignore]
    async fn batch_request() {
        let client = Client::new(Http::from_env());
        let (latest, safe) = client
            .batch((
                (eth::BlockNumber, Empty),
                (eth::GetBlockByNumber, (BlockTag::Safe.into(), Hydrated::No)),
            ))
            .await
            .unwrap();
        println!("Latest block: {latest}");
        println!("Safe block: {:?}", safe.unwrap().number);
    }

    #[tokio::test]
    #[ignore]
    async fn contract_call() {
        let client = Client::new(Http::from_env());
        let domain_separator = AbiItem::function(
            "domainSeparator",
            vec![],
            vec![Param::new("", ParamType::FixedBytes(32))],
            Default::default(),
        );
        let domain = client
            .call_function(
                &domain_separator,
                &[],
                TransactionRequest {
                    to: Some(Address(hex!("9008D19f58AAbD9eD0D60971565AA8510560ab41"))),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        println!("CoW Protocol domain separator: {domain}");
    }
}
