//! Sending transactions and following them until they are confirmed.

use crate::{
    client::Client,
    eth,
    promievent::{Emitter, PromiEvent, TransactionEvent},
    transport::Transport,
    types::{
        Address, Digest, TransactionReceipt, TransactionReceiptStatus, TransactionRequest, U256,
    },
    Error,
};
use std::{fmt::Debug, sync::Arc};
use thiserror::Error;
use tokio::time::{self, Instant};

/// A failed transaction.
#[derive(Clone, Debug, Error)]
pub enum TransactionError {
    #[error("Transaction has been reverted by the EVM:\n{}", pretty(.0))]
    Reverted(Box<TransactionReceipt>),
    #[error("Transaction ran out of gas. Please provide more gas:\n{}", pretty(.0))]
    OutOfGas(Box<TransactionReceipt>),
    #[error("Transaction {0} was not mined within the polling timeout")]
    Timeout(Digest),
}

fn pretty(receipt: &TransactionReceipt) -> String {
    serde_json::to_string_pretty(receipt).unwrap_or_default()
}

/// An error signing a transaction with a local account.
#[derive(Clone, Debug, Error)]
#[error("signer error: {0}")]
pub struct SignerError(pub String);

/// A collection of local accounts.
pub trait Wallet: Send + Sync {
    /// Returns the account for an address, if the wallet holds it.
    fn account(&self, address: &Address) -> Option<Arc<dyn Account>>;
}

/// A local account that signs transactions.
pub trait Account: Debug + Send + Sync {
    fn address(&self) -> Address;

    /// Returns the signed, RLP encoded transaction.
    fn sign_transaction(&self, tx: &TransactionRequest) -> Result<Vec<u8>, SignerError>;
}

/// Checks that a transaction receipt describes a successful execution.
///
/// A transaction that consumed all of its `gas` is reported as out of gas,
/// even if the node reports success. Receipts without a status (from before
/// the Byzantium upgrade) are otherwise considered successful.
pub fn validate_receipt(
    receipt: &TransactionReceipt,
    gas: Option<U256>,
) -> Result<(), TransactionError> {
    let exhausted = receipt.out_of_gas == Some(true)
        || gas.map_or(false, |gas| receipt.gas_used >= gas);
    if exhausted {
        return Err(TransactionError::OutOfGas(Box::new(receipt.clone())));
    }
    if receipt.status == Some(TransactionReceiptStatus::Failure) {
        return Err(TransactionError::Reverted(Box::new(receipt.clone())));
    }
    Ok(())
}

impl<T> Client<T>
where
    T: Transport + 'static,
{
    /// Sends a transaction and follows it until it is confirmed.
    ///
    /// The transaction is signed locally if the client's wallet holds the
    /// account of its sender, and signed by the node otherwise. The returned
    /// [`PromiEvent`] resolves with the validated receipt, and emits
    /// [`TransactionEvent::Confirmation`] events for the configured number of
    /// blocks afterwards.
    ///
    /// # Panics
    ///
    /// This method panics if called outside of a Tokio runtime.
    pub fn send_transaction(&self, tx: TransactionRequest) -> PromiEvent<TransactionReceipt> {
        let blocks = self.config().confirmation_blocks.min(1024) as usize;
        let (promievent, mut emitter) = PromiEvent::new(blocks + 4);
        let client = self.clone();

        tokio::spawn(async move {
            match client.submit_transaction(tx, &emitter).await {
                Ok(receipt) => {
                    emitter.resolve(Ok(receipt.clone()));
                    client.confirm_transaction(receipt, &emitter).await;
                }
                Err(err) => emitter.resolve(Err(err)),
            }
        });

        promievent
    }

    async fn submit_transaction(
        &self,
        tx: TransactionRequest,
        emitter: &Emitter<TransactionReceipt>,
    ) -> Result<TransactionReceipt, Error> {
        let account = tx
            .from
            .and_then(|from| self.wallet().and_then(|wallet| wallet.account(&from)));
        let hash = match account {
            Some(account) => {
                let raw = account.sign_transaction(&tx)?;
                self.call(eth::SendRawTransaction, (raw,)).await?
            }
            None => self.call(eth::SendTransaction, (tx.clone(),)).await?,
        };
        tracing::debug!(%hash, "sent transaction");
        emitter.emit(TransactionEvent::TransactionHash(hash));

        let receipt = self.wait_for_receipt(hash).await?;
        validate_receipt(&receipt, tx.gas)?;
        emitter.emit(TransactionEvent::Receipt(receipt.clone()));
        Ok(receipt)
    }

    async fn wait_for_receipt(&self, hash: Digest) -> Result<TransactionReceipt, Error> {
        let started = Instant::now();
        loop {
            if let Some(receipt) = self.call(eth::GetTransactionReceipt, (hash,)).await? {
                return Ok(receipt);
            }
            if started.elapsed() >= self.config().polling_timeout {
                return Err(TransactionError::Timeout(hash).into());
            }
            time::sleep(self.config().polling_interval).await;
        }
    }

    async fn confirm_transaction(
        &self,
        receipt: TransactionReceipt,
        emitter: &Emitter<TransactionReceipt>,
    ) {
        let Some(mined) = receipt.block_number else {
            return;
        };
        let blocks = self.config().confirmation_blocks;

        let mut confirmations = 0;
        while confirmations < blocks && !emitter.is_closed() {
            time::sleep(self.config().polling_interval).await;
            let current = match self.call_np(eth::BlockNumber).await {
                Ok(current) => current,
                Err(err) => {
                    emitter.emit(TransactionEvent::Error(err));
                    return;
                }
            };

            let depth = if current > mined {
                u64::try_from(current - mined).unwrap_or(u64::MAX)
            } else {
                0
            };
            while confirmations < depth.min(blocks) {
                confirmations += 1;
                tracing::trace!(hash = %receipt.transaction_hash, confirmations, "confirmed transaction");
                emitter.emit(TransactionEvent::Confirmation {
                    number: confirmations,
                    receipt: receipt.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Configuration,
        transport::{mock::Replies, TransportError},
    };
    use futures::StreamExt as _;
    use serde_json::{json, Value};
    use std::{
        sync::atomic::{AtomicU32, Ordering},
        time::Duration,
    };

    fn receipt(status: bool, out_of_gas: Option<bool>, gas_used: u64) -> TransactionReceipt {
        TransactionReceipt {
            status: Some(if status {
                TransactionReceiptStatus::Success
            } else {
                TransactionReceiptStatus::Failure
            }),
            out_of_gas,
            gas_used: U256::from(gas_used),
            ..Default::default()
        }
    }

    #[test]
    fn receipt_validation() {
        let reverted = validate_receipt(&receipt(false, None, 100), Some(U256::new(101)));
        assert!(matches!(reverted, Err(TransactionError::Reverted(_))));
        assert!(reverted
            .unwrap_err()
            .to_string()
            .starts_with("Transaction has been reverted by the EVM:\n{"));

        let out_of_gas = validate_receipt(&receipt(true, Some(false), 100), Some(U256::new(100)));
        assert!(matches!(out_of_gas, Err(TransactionError::OutOfGas(_))));
        assert!(out_of_gas.unwrap_err().to_string().contains("ran out of gas"));

        assert!(validate_receipt(&receipt(true, None, 90), Some(U256::new(100))).is_ok());
        assert!(validate_receipt(&receipt(true, Some(true), 90), None).is_err());
        assert!(validate_receipt(
            &TransactionReceipt {
                status: None,
                ..receipt(true, None, 10)
            },
            None,
        )
        .is_ok());
    }

    #[derive(Debug)]
    struct Signer;

    impl Account for Signer {
        fn address(&self) -> Address {
            Address([0x11; 20])
        }

        fn sign_transaction(&self, tx: &TransactionRequest) -> Result<Vec<u8>, SignerError> {
            match tx.nonce {
                Some(_) => Ok(vec![0xc0, 0xff, 0xee]),
                None => Err(SignerError("missing nonce".to_owned())),
            }
        }
    }

    struct Keys;

    impl Wallet for Keys {
        fn account(&self, address: &Address) -> Option<Arc<dyn Account>> {
            (*address == Signer.address()).then(|| Arc::new(Signer) as Arc<dyn Account>)
        }
    }

    fn node(
        blocks: Vec<&'static str>,
    ) -> Replies<impl Fn(&Value) -> Result<Value, TransportError>> {
        let polls = AtomicU32::new(0);
        let block = AtomicU32::new(0);
        Replies::new(move |request: &Value| {
            let result = match request["method"].as_str() {
                Some("eth_sendRawTransaction") => {
                    assert_eq!(request["params"], json!(["0xc0ffee"]));
                    json!(format!("0x{}", "ab".repeat(32)))
                }
                Some("eth_getTransactionReceipt") if polls.fetch_add(1, Ordering::SeqCst) == 0 => {
                    Value::Null
                }
                Some("eth_getTransactionReceipt") => json!({
                    "transactionHash": request["params"][0],
                    "blockNumber": "0x10",
                    "gasUsed": "0x5208",
                    "status": "0x1",
                    "logs": [],
                }),
                Some("eth_blockNumber") => {
                    let index = block.fetch_add(1, Ordering::SeqCst) as usize;
                    json!(blocks[index.min(blocks.len() - 1)])
                }
                method => panic!("unexpected method {method:?}"),
            };
            Ok(json!({ "jsonrpc": "2.0", "id": request["id"], "result": result }))
        })
    }

    fn client(
        blocks: Vec<&'static str>,
    ) -> Client<Replies<impl Fn(&Value) -> Result<Value, TransportError>>> {
        Client::with_parts(
            node(blocks),
            Configuration {
                confirmation_blocks: 2,
                polling_interval: Duration::from_millis(1),
                ..Default::default()
            },
            Default::default(),
            Some(Arc::new(Keys)),
        )
    }

    #[tokio::test]
    async fn follows_transaction_until_confirmed() {
        let client = client(vec!["0x10", "0x11", "0x13"]);
        let mut sent = client.send_transaction(TransactionRequest {
            from: Some(Address([0x11; 20])),
            nonce: Some(U256::ZERO),
            gas: Some(U256::new(30_000)),
            ..Default::default()
        });
        let events = sent.events();

        let receipt = (&mut sent).await.unwrap();
        assert_eq!(receipt.block_number, Some(U256::new(16)));

        let events = events.collect::<Vec<_>>().await;
        assert!(matches!(
            events[..],
            [
                TransactionEvent::TransactionHash(_),
                TransactionEvent::Receipt(_),
                TransactionEvent::Confirmation { number: 1, .. },
                TransactionEvent::Confirmation { number: 2, .. },
            ],
        ));
    }

    #[tokio::test]
    async fn rejects_failed_transactions() {
        let client = client(vec!["0x10"]);
        let mut sent = client.send_transaction(TransactionRequest {
            from: Some(Address([0x11; 20])),
            nonce: Some(U256::ZERO),
            gas: Some(U256::new(21_000)),
            ..Default::default()
        });
        let events = sent.events();

        assert!(matches!(
            sent.await,
            Err(Error::Transaction(TransactionError::OutOfGas(_))),
        ));
        let events = events.collect::<Vec<_>>().await;
        assert!(matches!(
            events[..],
            [
                TransactionEvent::TransactionHash(_),
                TransactionEvent::Error(_),
            ],
        ));

        let unsigned = client.send_transaction(TransactionRequest {
            from: Some(Address([0x11; 20])),
            ..Default::default()
        });
        assert!(matches!(unsigned.await, Err(Error::Signer(_))));
    }
}
