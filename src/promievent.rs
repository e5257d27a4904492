//! A future for the outcome of a sent transaction paired with a stream of
//! its progress events.

use crate::{
    types::{Digest, TransactionReceipt},
    Error,
};
use futures::{
    channel::oneshot,
    future::FutureExt as _,
    stream::{self, BoxStream, StreamExt as _},
};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::broadcast::{self, error::RecvError};

/// A progress event of a sent transaction.
#[derive(Clone, Debug)]
pub enum TransactionEvent {
    /// The transaction was accepted by the node.
    TransactionHash(Digest),
    /// The transaction was included in a block.
    Receipt(TransactionReceipt),
    /// A block was added on top of the block including the transaction.
    /// `number` counts confirmations starting at 1.
    Confirmation {
        number: u64,
        receipt: TransactionReceipt,
    },
    /// Sending the transaction or waiting for it failed.
    Error(Error),
}

/// The pending outcome of a sent transaction.
///
/// Awaiting a `PromiEvent` yields the final result. Progress events can be
/// observed concurrently through [`PromiEvent::events`].
#[derive(Debug)]
pub struct PromiEvent<T> {
    result: oneshot::Receiver<Result<T, Error>>,
    first: Option<broadcast::Receiver<TransactionEvent>>,
    later: broadcast::Receiver<TransactionEvent>,
}

impl<T> PromiEvent<T> {
    /// Creates a `PromiEvent` and the emitter that drives it. The event
    /// buffer holds `capacity` events; listeners that fall further behind
    /// skip the oldest ones.
    pub(crate) fn new(capacity: usize) -> (Self, Emitter<T>) {
        let (result_sender, result) = oneshot::channel();
        let (events, first) = broadcast::channel(capacity.max(1));
        let later = first.resubscribe();
        (
            Self {
                result,
                first: Some(first),
                later,
            },
            Emitter {
                events,
                result: Some(result_sender),
            },
        )
    }

    /// Returns a stream of progress events.
    ///
    /// The first stream returned receives every event emitted since the
    /// transaction was sent; later streams only receive events emitted after
    /// they were created. Streams end once the transaction workflow is done.
    pub fn events(&mut self) -> BoxStream<'static, TransactionEvent> {
        let receiver = self
            .first
            .take()
            .unwrap_or_else(|| self.later.resubscribe());
        stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => return Some((event, receiver)),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "transaction event listener lagged");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
        .boxed()
    }
}

impl<T> Future for PromiEvent<T> {
    type Output = Result<T, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.result
            .poll_unpin(cx)
            .map(|result| result.unwrap_or(Err(Error::Disconnected)))
    }
}

/// The sending half of a [`PromiEvent`].
pub(crate) struct Emitter<T> {
    events: broadcast::Sender<TransactionEvent>,
    result: Option<oneshot::Sender<Result<T, Error>>>,
}

impl<T> Emitter<T> {
    pub fn emit(&self, event: TransactionEvent) {
        let _ = self.events.send(event);
    }

    /// Resolves the `PromiEvent`. Failures are also emitted as an
    /// [`TransactionEvent::Error`] event.
    pub fn resolve(&mut self, result: Result<T, Error>) {
        if let Err(err) = &result {
            self.emit(TransactionEvent::Error(err.clone()));
        }
        if let Some(sender) = self.result.take() {
            let _ = sender.send(result);
        }
    }

    /// Returns `true` once the `PromiEvent` and all of its event streams
    /// have been dropped.
    pub fn is_closed(&self) -> bool {
        self.events.receiver_count() == 0
    }
}
