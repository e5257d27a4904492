//! The JSON RPC client: dispatches requests over a transport and routes
//! responses and subscription notifications back to their callers.

use crate::{
    abi::{AbiItem, Token},
    config::Configuration,
    descriptor::{Descriptor, Registry},
    events::{self, DecodedLog},
    jsonrpc::{
        batch::Batch, payload::PayloadMapper, Id, Message, Notification, Request, Response,
        SubscriptionItem,
    },
    method::{self, Method},
    subscription::Subscription,
    transaction::Wallet,
    transport::Transport,
    types::{Empty, Log, LogFilter, LogFilterValue, TransactionRequest},
    Error,
};
use futures::{
    channel::{mpsc, oneshot},
    future,
};
use serde_json::Value;
use std::{
    collections::HashMap,
    mem,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::time;

type Sink = mpsc::UnboundedSender<Result<Value, Error>>;

/// A call awaiting its response. Subscribe calls carry the sink for their
/// notifications, which is installed when the subscription ID is routed
/// back so that no push following the response is missed.
struct Pending {
    reply: oneshot::Sender<Result<Value, Error>>,
    sink: Option<Sink>,
}

/// The IDs of the calls registered by one request. Dropping it forgets the
/// calls that are still pending, including when the request's future is
/// cancelled.
struct Registered<'a, T> {
    client: &'a Client<T>,
    ids: Vec<Id>,
}

impl<T> Drop for Registered<'_, T> {
    fn drop(&mut self) {
        self.client.forget(&self.ids);
    }
}

/// An Ethereum JSON RPC client.
///
/// Clients are cheap to clone; clones share the transport, the request ID
/// counter and all in-flight calls.
pub struct Client<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    transport: T,
    mapper: PayloadMapper,
    registry: Registry,
    config: Configuration,
    wallet: Option<Arc<dyn Wallet>>,
    pending: Mutex<HashMap<Id, Pending>>,
    subscriptions: Mutex<HashMap<String, Sink>>,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> Client<T> {
    /// Creates a client with the default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, Configuration::default())
    }

    /// Creates a client with the specified configuration and the standard
    /// method registry.
    pub fn with_config(transport: T, config: Configuration) -> Self {
        let registry = Registry::standard(config.default_block);
        Self::with_parts(transport, config, registry, None)
    }

    /// Creates a client from its parts. The `wallet` holds local accounts
    /// used to sign transactions before sending them.
    pub fn with_parts(
        transport: T,
        config: Configuration,
        registry: Registry,
        wallet: Option<Arc<dyn Wallet>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                mapper: PayloadMapper::new(config.first_id),
                registry,
                config,
                wallet,
                pending: Mutex::default(),
                subscriptions: Mutex::default(),
            }),
        }
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    pub fn config(&self) -> &Configuration {
        &self.inner.config
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub(crate) fn wallet(&self) -> Option<&dyn Wallet> {
        self.inner.wallet.as_deref()
    }

    /// Handles a message received from a transport that delivers its
    /// replies asynchronously. Responses are routed to the calls awaiting
    /// them and notifications to their subscription.
    ///
    /// Messages that cannot be routed are logged and discarded.
    pub fn receive(&self, message: &str) -> Result<(), Error> {
        tracing::trace!(%message, "received message");
        match serde_json::from_str::<Message>(message)? {
            Message::Response(response) => self.route(response),
            Message::Batch(responses) => {
                for response in responses {
                    self.route(response);
                }
            }
            Message::Notification(notification) => self.notify(notification),
        }
        Ok(())
    }

    fn route(&self, response: Response) {
        let id = response.id;
        let Some(pending) = id.and_then(|id| lock(&self.inner.pending).remove(&id)) else {
            tracing::warn!(?id, "discarding response for unknown request");
            return;
        };

        let result = response.into_result();
        if let (Some(sink), Ok(Value::String(subscription))) = (pending.sink, &result) {
            lock(&self.inner.subscriptions).insert(subscription.clone(), sink);
        }
        let _ = pending.reply.send(result);
    }

    fn notify(&self, notification: Notification) {
        let SubscriptionItem {
            subscription,
            result,
            error,
        } = notification.params;
        let item = match (error, result) {
            (Some(error), _) => Err(Error::Node(error)),
            (None, Some(result)) => Ok(result),
            (None, None) => Err(Error::InvalidResponse(
                "notification is missing a result".to_owned(),
            )),
        };

        let mut subscriptions = lock(&self.inner.subscriptions);
        let Some(sink) = subscriptions.get(&subscription) else {
            tracing::warn!(%subscription, "discarding notification for unknown subscription");
            return;
        };
        if sink.unbounded_send(item).is_err() {
            tracing::debug!(%subscription, "subscription stream was dropped");
            subscriptions.remove(&subscription);
        }
    }

    fn register(&self, id: Id, sink: Option<Sink>) -> oneshot::Receiver<Result<Value, Error>> {
        let (reply, receiver) = oneshot::channel();
        lock(&self.inner.pending).insert(id, Pending { reply, sink });
        receiver
    }

    fn forget(&self, ids: &[Id]) {
        let mut pending = lock(&self.inner.pending);
        for id in ids {
            pending.remove(id);
        }
    }

    fn reject_missing(&self, ids: &[Id]) {
        let mut pending = lock(&self.inner.pending);
        for id in ids {
            if let Some(pending) = pending.remove(id) {
                let _ = pending.reply.send(Err(Error::MissingResponse(*id)));
            }
        }
    }

    async fn wait(
        &self,
        id: Id,
        receiver: oneshot::Receiver<Result<Value, Error>>,
    ) -> Result<Value, Error> {
        let result = match self.inner.config.request_timeout {
            Some(timeout) => match time::timeout(timeout, receiver).await {
                Ok(result) => result,
                Err(_) => {
                    self.forget(&[id]);
                    return Err(Error::Timeout);
                }
            },
            None => receiver.await,
        };
        result.unwrap_or(Err(Error::Disconnected))
    }

    pub(crate) fn unregister(&self, subscription: &str) -> bool {
        lock(&self.inner.subscriptions)
            .remove(subscription)
            .is_some()
    }
}

impl<T> Client<T>
where
    T: Transport,
{
    /// Executes a call described by `descriptor`.
    pub async fn execute(&self, descriptor: &Descriptor, params: Vec<Value>) -> Result<Value, Error> {
        self.execute_with_sink(descriptor, params, None).await
    }

    async fn execute_with_sink(
        &self,
        descriptor: &Descriptor,
        params: Vec<Value>,
        sink: Option<Sink>,
    ) -> Result<Value, Error> {
        let params = descriptor.prepare(params)?;
        let request = self.inner.mapper.to_payload(descriptor.name(), params)?;
        let result = self.roundtrip(request, sink).await?;
        descriptor.finish(result)
    }

    /// Executes a call by method name, using the registered descriptor for
    /// the method.
    pub async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, Error> {
        let descriptor = self.inner.registry.get(method);
        self.execute(&descriptor, params).await
    }

    /// Executes a typed JSON RPC call.
    pub async fn call<M>(&self, method: M, params: M::Params) -> Result<M::Result, Error>
    where
        M: Method,
    {
        let descriptor = method::descriptor(&method);
        let result = self
            .execute(&descriptor, method::params::<M>(&params)?)
            .await?;
        method::result::<M>(result)
    }

    /// Executes a typed JSON RPC call with no parameters.
    pub async fn call_np<M>(&self, method: M) -> Result<M::Result, Error>
    where
        M: Method<Params = Empty>,
    {
        self.call(method, Empty).await
    }

    async fn roundtrip(&self, request: Request, sink: Option<Sink>) -> Result<Value, Error> {
        let id = request.id;
        let payload = serde_json::to_string(&request)?;
        let receiver = self.register(id, sink);
        let registered = Registered {
            client: self,
            ids: vec![id],
        };

        tracing::debug!(%id, method = %request.method, "sending request");
        let Some(reply) = self.inner.transport.send(payload).await? else {
            return self.wait(id, receiver).await;
        };

        drop(registered);
        tracing::trace!(%reply, "received response");
        let response = serde_json::from_str::<Response>(&reply)?;
        match (response.id, &response.error) {
            (Some(actual), _) if actual == id => {}
            (None, Some(_)) => {}
            (actual, _) => {
                return Err(Error::IdMismatch {
                    expected: id,
                    actual,
                })
            }
        }
        response.into_result()
    }

    /// Starts building an untyped batch request.
    pub fn new_batch(&self) -> BatchRequest<'_, T> {
        BatchRequest {
            client: self,
            calls: Vec::new(),
        }
    }

    /// Executes a typed JSON RPC batch request.
    pub async fn batch<B>(&self, batch: B) -> Result<B::Values, Error>
    where
        B: Batch,
    {
        B::values(self.try_batch(batch).await?)
    }

    /// Executes a typed JSON RPC batch request, returning individual results
    /// for each batched call. This allows fine-grained error handling for
    /// individual methods.
    pub async fn try_batch<B>(&self, batch: B) -> Result<B::Results, Error>
    where
        B: Batch,
    {
        let results = self.execute_batch(batch.into_calls()?).await?;
        Ok(B::from_results(results))
    }

    /// Executes calls as a single batch request. Each call resolves
    /// independently; the results are returned in call order.
    pub async fn execute_batch(
        &self,
        calls: Vec<(Descriptor, Vec<Value>)>,
    ) -> Result<Vec<Result<Value, Error>>, Error> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let (descriptors, params): (Vec<_>, Vec<_>) = calls.into_iter().unzip();
        let requests = self
            .inner
            .mapper
            .to_batch_payload(descriptors.iter().zip(params))?;
        let ids = requests.iter().map(|request| request.id).collect::<Vec<_>>();
        let payload = serde_json::to_string(&requests)?;
        let receivers = ids
            .iter()
            .map(|id| self.register(*id, None))
            .collect::<Vec<_>>();
        let registered = Registered {
            client: self,
            ids,
        };
        let ids = &registered.ids;

        tracing::debug!(?ids, "sending batch request");
        if let Some(reply) = self.inner.transport.send(payload).await? {
            tracing::trace!(%reply, "received batch response");
            match serde_json::from_str::<Message>(&reply)? {
                Message::Batch(responses) => {
                    for response in responses {
                        let id = response.id;
                        match id {
                            Some(id) if ids.contains(&id) => self.route(response),
                            _ => tracing::warn!(?id, "discarding batch response for another request"),
                        }
                    }
                    self.reject_missing(ids);
                }
                Message::Response(response) => {
                    response.into_result()?;
                    return Err(Error::InvalidResponse(
                        "expected a batch response".to_owned(),
                    ));
                }
                Message::Notification(_) => {
                    return Err(Error::InvalidResponse(
                        "expected a batch response".to_owned(),
                    ));
                }
            }
        }

        let results = future::join_all(
            ids.iter()
                .zip(receivers)
                .map(|(id, receiver)| self.wait(*id, receiver)),
        )
        .await;
        Ok(descriptors
            .iter()
            .zip(results)
            .map(|(descriptor, result)| result.and_then(|value| descriptor.finish(value)))
            .collect())
    }

    /// Calls a constant contract function with `eth_call`.
    pub async fn call_function(
        &self,
        function: &AbiItem,
        tokens: &[Token],
        call: TransactionRequest,
    ) -> Result<Value, Error> {
        let descriptor =
            Descriptor::function_call(function, tokens, self.inner.config.default_block)?;
        self.execute(&descriptor, vec![serde_json::to_value(call)?])
            .await
    }

    /// Fetches past logs of a contract event, decoded as instances of the
    /// event.
    pub async fn past_logs(&self, event: &AbiItem, filter: LogFilter) -> Result<Value, Error> {
        let descriptor = Descriptor::past_logs(event)?;
        self.execute(&descriptor, vec![serde_json::to_value(filter)?])
            .await
    }

    /// Subscribes to notifications with `<namespace>_subscribe`.
    pub async fn subscribe(
        &self,
        namespace: &str,
        params: Vec<Value>,
    ) -> Result<Subscription<T, Value>, Error> {
        self.subscribe_with(namespace, params, Ok).await
    }

    /// Subscribes to logs of a contract event. Logs are decoded as instances
    /// of the event.
    pub async fn subscribe_logs(
        &self,
        event: &AbiItem,
        mut filter: LogFilter,
    ) -> Result<Subscription<T, DecodedLog>, Error> {
        if filter.topics.is_empty() && !event.is_anonymous() {
            filter.topics.push(LogFilterValue::Exact(event.hash()));
        }
        let params = vec![Value::from("logs"), serde_json::to_value(filter)?];
        let event = event.clone();
        self.subscribe_with("eth", params, move |value| {
            let log = serde_json::from_value::<Log>(value)?;
            Ok(events::decode(&event, &log)?)
        })
        .await
    }

    async fn subscribe_with<U, F>(
        &self,
        namespace: &str,
        params: Vec<Value>,
        transform: F,
    ) -> Result<Subscription<T, U>, Error>
    where
        F: Fn(Value) -> Result<U, Error> + Send + Sync + 'static,
    {
        if !self.inner.transport.supports_subscriptions() {
            return Err(Error::SubscriptionsNotSupported);
        }

        let (sink, receiver) = mpsc::unbounded();
        let descriptor = Descriptor::passthrough(format!("{namespace}_subscribe"));
        let id = match self
            .execute_with_sink(&descriptor, params, Some(sink.clone()))
            .await?
        {
            Value::String(id) => id,
            value => {
                return Err(Error::InvalidResponse(format!(
                    "invalid subscription ID {value}"
                )))
            }
        };

        // Replies returned directly by the transport are not routed.
        lock(&self.inner.subscriptions)
            .entry(id.clone())
            .or_insert(sink);
        tracing::debug!(%id, %namespace, "subscribed");

        Ok(Subscription::new(
            self.clone(),
            namespace.to_owned(),
            id,
            receiver,
            Box::new(transform),
        ))
    }

    /// Rejects all pending calls, ends all subscriptions and closes the
    /// transport. Returns `false` if the transport has no connection to
    /// close.
    pub fn disconnect(&self) -> bool {
        let pending = mem::take(&mut *lock(&self.inner.pending));
        for (_, pending) in pending {
            let _ = pending.reply.send(Err(Error::Disconnected));
        }
        lock(&self.inner.subscriptions).clear();
        self.inner.transport.disconnect()
    }
}

/// An untyped batch request.
pub struct BatchRequest<'a, T> {
    client: &'a Client<T>,
    calls: Vec<(Descriptor, Vec<Value>)>,
}

impl<T> BatchRequest<'_, T>
where
    T: Transport,
{
    /// Adds a call by method name, using the registered descriptor for the
    /// method.
    pub fn add(&mut self, method: &str, params: Vec<Value>) -> &mut Self {
        let descriptor = self.client.registry().get(method);
        self.add_descriptor(descriptor, params)
    }

    /// Adds a call described by `descriptor`.
    pub fn add_descriptor(&mut self, descriptor: Descriptor, params: Vec<Value>) -> &mut Self {
        self.calls.push((descriptor, params));
        self
    }

    pub async fn execute(self) -> Result<Vec<Result<Value, Error>>, Error> {
        self.client.execute_batch(self.calls).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        abi::{Param, ParamType},
        eth, jsonrpc, net,
        transport::{
            mock::{Duplex, Replies},
            TransportError,
        },
        types::{Address, U256},
    };
    use futures::StreamExt as _;
    use serde_json::json;
    use std::time::Duration;

    fn reply(id: &Value, result: Value) -> Value {
        json!({ "jsonrpc": "2.0", "id": id, "result": result })
    }

    #[tokio::test]
    async fn concurrent_calls_resolve_out_of_order() {
        let (transport, mut outgoing) = Duplex::new();
        let client = Client::new(transport);

        let first = client.request("eth_blockNumber", vec![]);
        let second = client.request("net_version", vec![]);
        let node = async {
            let a = outgoing.next().await.unwrap();
            let b = outgoing.next().await.unwrap();
            assert_eq!((&a["id"], &b["id"]), (&json!(1), &json!(2)));
            client.receive(&reply(&b["id"], json!("5")).to_string()).unwrap();
            client.receive(&reply(&a["id"], json!("0x10")).to_string()).unwrap();
        };

        let (first, second, ()) = futures::join!(first, second, node);
        assert_eq!(first.unwrap(), json!(16));
        assert_eq!(second.unwrap(), json!("5"));
    }

    #[tokio::test]
    async fn request_response_transport() {
        let client = Client::new(Replies::new(|request: &Value| {
            Ok(match request["method"].as_str() {
                Some("eth_chainId") => reply(&request["id"], json!("0x1")),
                Some("eth_mining") => reply(&json!(99), json!(false)),
                Some("eth_syncing") => json!({ "jsonrpc": "2.0", "id": request["id"] }),
                _ => json!({
                    "jsonrpc": "2.0",
                    "id": request["id"],
                    "error": { "code": -32601, "message": "method not found" },
                }),
            })
        }));

        assert_eq!(client.call_np(eth::ChainId).await.unwrap(), U256::ONE);
        assert!(matches!(
            client.request("eth_mining", vec![]).await,
            Err(Error::IdMismatch {
                expected: Id(2),
                actual: Some(Id(99)),
            }),
        ));
        assert!(matches!(
            client.request("eth_syncing", vec![]).await,
            Err(Error::InvalidResponse(_)),
        ));
        match client.request("debug_unknown", vec![]).await {
            Err(Error::Node(err)) => assert_eq!(err.code, jsonrpc::ErrorCode::MethodNotFound),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            client.request("eth_getBalance", vec![json!("0xabc")]).await,
            Err(Error::Argument(_)),
        ));
        // Argument errors are detected before an ID is assigned.
        assert_eq!(client.transport().sent.lock().unwrap().len(), 4);
        assert!(client.inner.pending.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn transport_errors_reject_the_failed_call() {
        let client = Client::new(Replies::new(|request: &Value| {
            if request["method"] == "eth_gasPrice" {
                return Err(TransportError::other("connection reset"));
            }
            Ok(reply(&request["id"], json!("0x1")))
        }));

        assert!(matches!(
            client.request("eth_gasPrice", vec![]).await,
            Err(Error::Transport(_)),
        ));
        assert_eq!(client.request("eth_chainId", vec![]).await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn batches_match_responses_by_id() {
        let client = Client::new(Replies::new(|requests: &Value| {
            let requests = requests.as_array().unwrap();
            Ok(json!([
                reply(&requests[2]["id"], json!("0x2")),
                {
                    "jsonrpc": "2.0",
                    "id": requests[0]["id"],
                    "error": { "code": -32000, "message": "header not found" },
                },
            ]))
        }));

        let mut batch = client.new_batch();
        batch
            .add("eth_getBalance", vec![json!("0x1111111111111111111111111111111111111111")])
            .add("net_version", vec![])
            .add("eth_blockNumber", vec![]);
        let results = batch.execute().await.unwrap();

        assert!(matches!(results[0], Err(Error::Node(_))));
        assert!(matches!(results[1], Err(Error::MissingResponse(Id(2)))));
        assert_eq!(results[2].as_ref().unwrap(), &json!(2));

        let sent = client.transport().sent.lock().unwrap().clone();
        assert_eq!(sent[0][0]["params"][1], json!("latest"));
    }

    #[tokio::test]
    async fn typed_batches() {
        let client = Client::new(Replies::new(|requests: &Value| {
            Ok(Value::Array(
                requests
                    .as_array()
                    .unwrap()
                    .iter()
                    .rev()
                    .map(|request| match request["method"].as_str() {
                        Some("eth_blockNumber") => reply(&request["id"], json!("0x2a")),
                        _ => reply(&request["id"], json!("1")),
                    })
                    .collect(),
            ))
        }));

        let (number, network) = client
            .batch(((eth::BlockNumber, Empty), (net::Version, Empty)))
            .await
            .unwrap();
        assert_eq!(number, U256::new(42));
        assert_eq!(network, "1");
    }

    #[tokio::test]
    async fn push_batches() {
        let (transport, mut outgoing) = Duplex::new();
        let client = Client::new(transport);

        let mut batch = client.new_batch();
        batch.add("eth_chainId", vec![]).add("eth_gasPrice", vec![]);
        let node = async {
            let requests = outgoing.next().await.unwrap();
            let responses = json!([
                reply(&requests[1]["id"], json!("0x3b9aca00")),
                reply(&requests[0]["id"], json!("0x5")),
            ]);
            client.receive(&responses.to_string()).unwrap();
        };

        let (results, ()) = futures::join!(batch.execute(), node);
        let results = results.unwrap();
        assert_eq!(results[0].as_ref().unwrap(), &json!(5));
        assert_eq!(results[1].as_ref().unwrap(), &json!(1_000_000_000));
    }

    #[tokio::test]
    async fn contract_calls() {
        let client = Client::new(Replies::new(|request: &Value| {
            assert_eq!(request["method"], "eth_call");
            assert_eq!(
                request["params"][0]["data"],
                "0x18160ddd",
            );
            Ok(reply(
                &request["id"],
                json!("0x0000000000000000000000000000000000000000000000000000000000000064"),
            ))
        }));

        let total_supply = AbiItem::function(
            "totalSupply",
            vec![],
            vec![Param::new("", ParamType::Uint(256))],
            Default::default(),
        );
        let supply = client
            .call_function(
                &total_supply,
                &[],
                TransactionRequest {
                    to: Some(Address([0x11; 20])),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(supply, json!("100"));
    }

    #[tokio::test]
    async fn subscriptions() {
        let (transport, mut outgoing) = Duplex::new();
        let client = Client::new(transport);

        let subscribe = client.subscribe("eth", vec![json!("newHeads")]);
        let node = async {
            let request = outgoing.next().await.unwrap();
            assert_eq!(request["method"], "eth_subscribe");
            client
                .receive(&reply(&request["id"], json!("0xcd0c")).to_string())
                .unwrap();
        };
        let (subscription, ()) = futures::join!(subscribe, node);
        let mut subscription = subscription.unwrap();
        assert_eq!(subscription.id(), "0xcd0c");

        let notification = |result: Value| {
            json!({
                "jsonrpc": "2.0",
                "method": "eth_subscription",
                "params": { "subscription": "0xcd0c", "result": result },
            })
            .to_string()
        };
        client.receive(&notification(json!({ "number": "0x1" }))).unwrap();
        client
            .receive(
                &json!({
                    "jsonrpc": "2.0",
                    "method": "eth_subscription",
                    "params": {
                        "subscription": "0xcd0c",
                        "error": { "code": -32000, "message": "reorg" },
                    },
                })
                .to_string(),
            )
            .unwrap();
        assert_eq!(
            subscription.next().await.unwrap().unwrap(),
            json!({ "number": "0x1" }),
        );
        assert!(matches!(
            subscription.next().await.unwrap(),
            Err(Error::Node(_)),
        ));

        let unsubscribe = subscription.unsubscribe();
        let node = async {
            let request = outgoing.next().await.unwrap();
            assert_eq!(request["method"], "eth_unsubscribe");
            assert_eq!(request["params"], json!(["0xcd0c"]));
            // Late notifications are discarded.
            client.receive(&notification(json!({ "number": "0x2" }))).unwrap();
            client
                .receive(&reply(&request["id"], json!(true)).to_string())
                .unwrap();
        };
        let (unsubscribed, ()) = futures::join!(unsubscribe, node);
        assert!(unsubscribed.unwrap());
        assert!(client.inner.subscriptions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn log_subscriptions_decode_events() {
        let (transport, mut outgoing) = Duplex::new();
        let client = Client::new(transport);
        let event = AbiItem::event(
            "Deposit",
            vec![Param::new("amount", ParamType::Uint(256))],
            false,
        );

        let subscribe = client.subscribe_logs(&event, LogFilter::default());
        let node = async {
            let request = outgoing.next().await.unwrap();
            assert_eq!(request["params"][0], "logs");
            assert_eq!(
                request["params"][1]["topics"][0],
                serde_json::to_value(event.hash()).unwrap(),
            );
            client
                .receive(&reply(&request["id"], json!("0x1")).to_string())
                .unwrap();
        };
        let (subscription, ()) = futures::join!(subscribe, node);
        let mut subscription = subscription.unwrap();

        client
            .receive(
                &json!({
                    "jsonrpc": "2.0",
                    "method": "eth_subscription",
                    "params": {
                        "subscription": "0x1",
                        "result": {
                            "address": "0x1111111111111111111111111111111111111111",
                            "data": "0x0000000000000000000000000000000000000000000000000000000000000007",
                            "topics": [event.hash()],
                        },
                    },
                })
                .to_string(),
            )
            .unwrap();
        let log = subscription.next().await.unwrap().unwrap();
        assert_eq!(log.event, "Deposit");
        assert_eq!(
            log.return_values.named("amount"),
            Some(&Token::Uint(U256::new(7))),
        );

        drop(subscription);
        assert!(client.inner.subscriptions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn notifications_right_after_the_subscription_id_are_kept() {
        let (transport, mut outgoing) = Duplex::new();
        let client = Client::new(transport);

        let mut subscribe = Box::pin(client.subscribe("eth", vec![json!("newPendingTransactions")]));
        assert!(futures::poll!(&mut subscribe).is_pending());

        // The node replies and pushes before the subscriber is woken up.
        let request = outgoing.next().await.unwrap();
        client
            .receive(&reply(&request["id"], json!("0xab")).to_string())
            .unwrap();
        client
            .receive(
                &json!({
                    "jsonrpc": "2.0",
                    "method": "eth_subscription",
                    "params": { "subscription": "0xab", "result": "0x01" },
                })
                .to_string(),
            )
            .unwrap();

        let mut subscription = subscribe.await.unwrap();
        assert_eq!(subscription.next().await.unwrap().unwrap(), json!("0x01"));
    }

    #[tokio::test]
    async fn cancelled_calls_are_forgotten() {
        let (transport, mut outgoing) = Duplex::new();
        let client = Client::new(transport);

        let mut call = Box::pin(client.request("eth_blockNumber", vec![]));
        assert!(futures::poll!(&mut call).is_pending());
        assert_eq!(client.inner.pending.lock().unwrap().len(), 1);
        drop(call);
        assert!(client.inner.pending.lock().unwrap().is_empty());

        let mut batch = client.new_batch();
        batch.add("eth_chainId", vec![]).add("eth_gasPrice", vec![]);
        let mut batch = Box::pin(batch.execute());
        assert!(futures::poll!(&mut batch).is_pending());
        assert_eq!(client.inner.pending.lock().unwrap().len(), 2);
        drop(batch);
        assert!(client.inner.pending.lock().unwrap().is_empty());

        // Responses for cancelled calls are discarded.
        let request = outgoing.next().await.unwrap();
        client
            .receive(&reply(&request["id"], json!("0x1")).to_string())
            .unwrap();
    }

    #[tokio::test]
    async fn batch_replies_only_resolve_their_own_calls() {
        let client = Client::new(Replies::new(|requests: &Value| {
            let requests = requests.as_array().unwrap();
            Ok(json!([
                reply(&requests[0]["id"], json!("0x1")),
                reply(&json!(1000), json!("0x2")),
            ]))
        }));
        let mut unrelated = client.register(Id(1000), None);

        let mut batch = client.new_batch();
        batch.add("eth_chainId", vec![]);
        let results = batch.execute().await.unwrap();

        assert_eq!(results[0].as_ref().unwrap(), &json!(1));
        assert!(matches!(unrelated.try_recv(), Ok(None)));
        assert!(client.inner.pending.lock().unwrap().contains_key(&Id(1000)));
    }

    #[tokio::test]
    async fn subscriptions_require_a_push_transport() {
        let client = Client::new(Replies::new(|_: &Value| Ok(json!(null))));
        assert!(matches!(
            client.subscribe("eth", vec![json!("newHeads")]).await,
            Err(Error::SubscriptionsNotSupported),
        ));
    }

    #[tokio::test]
    async fn disconnect_rejects_pending_calls() {
        let (transport, mut outgoing) = Duplex::new();
        let client = Client::new(transport);

        let call = client.request("eth_blockNumber", vec![]);
        let node = async {
            outgoing.next().await.unwrap();
            assert!(client.disconnect());
        };
        let (result, ()) = futures::join!(call, node);
        assert!(matches!(result, Err(Error::Disconnected)));
        assert!(*client.transport().closed.lock().unwrap());
    }

    #[tokio::test]
    async fn request_timeout() {
        let (transport, _outgoing) = Duplex::new();
        let client = Client::with_config(
            transport,
            Configuration {
                first_id: 100,
                request_timeout: Some(Duration::from_millis(10)),
                ..Default::default()
            },
        );

        assert!(matches!(
            client.request("eth_blockNumber", vec![]).await,
            Err(Error::Timeout),
        ));
        assert!(client.inner.pending.lock().unwrap().is_empty());

        // Responses arriving after the timeout are discarded.
        client.receive(&reply(&json!(100), json!("0x1")).to_string()).unwrap();
    }
}
