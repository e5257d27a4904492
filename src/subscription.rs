//! Streams of subscription notifications.

use crate::{client::Client, descriptor::Descriptor, transport::Transport, Error};
use futures::{channel::mpsc, Stream, StreamExt as _};
use serde_json::Value;
use std::{
    fmt::{self, Debug, Formatter},
    pin::Pin,
    task::{Context, Poll},
};

type Transform<U> = Box<dyn Fn(Value) -> Result<U, Error> + Send + Sync>;

/// An active subscription.
///
/// Notifications are yielded in the order the node pushed them. Errors
/// pushed by the node are yielded as `Err` items. The stream ends when the
/// client disconnects.
///
/// Dropping a subscription stops routing notifications to it, but does not
/// notify the node; use [`Subscription::unsubscribe`] for that.
pub struct Subscription<T, U> {
    client: Client<T>,
    namespace: String,
    id: String,
    receiver: mpsc::UnboundedReceiver<Result<Value, Error>>,
    transform: Transform<U>,
}

impl<T, U> Subscription<T, U> {
    pub(crate) fn new(
        client: Client<T>,
        namespace: String,
        id: String,
        receiver: mpsc::UnboundedReceiver<Result<Value, Error>>,
        transform: Transform<U>,
    ) -> Self {
        Self {
            client,
            namespace,
            id,
            receiver,
            transform,
        }
    }

    /// The subscription ID assigned by the node.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl<T, U> Subscription<T, U>
where
    T: Transport,
{
    /// Cancels the subscription with `<namespace>_unsubscribe`.
    ///
    /// Notifications stop being routed to the subscription before the
    /// request is sent, so none are delivered afterwards regardless of the
    /// outcome.
    pub async fn unsubscribe(self) -> Result<bool, Error> {
        self.client.unregister(&self.id);
        let descriptor = Descriptor::passthrough(format!("{}_unsubscribe", self.namespace));
        let result = self
            .client
            .execute(&descriptor, vec![Value::String(self.id.clone())])
            .await?;
        tracing::debug!(id = %self.id, "unsubscribed");
        result
            .as_bool()
            .ok_or_else(|| Error::InvalidResponse(format!("invalid unsubscribe result {result}")))
    }
}

impl<T, U> Stream for Subscription<T, U> {
    type Item = Result<U, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        this.receiver
            .poll_next_unpin(cx)
            .map(|item| item.map(|item| item.and_then(&this.transform)))
    }
}

impl<T, U> Drop for Subscription<T, U> {
    fn drop(&mut self) {
        self.client.unregister(&self.id);
    }
}

impl<T, U> Debug for Subscription<T, U> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("namespace", &self.namespace)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
