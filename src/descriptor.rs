//! Descriptors of JSON RPC calls.
//!
//! A [`Descriptor`] describes one kind of call: its method name, the number
//! of parameters it takes, a hook that validates and formats parameters
//! before the request is built, and a hook that formats the raw result. The
//! [`Registry`] maps method names to descriptors for the standard `eth`,
//! `net` and `web3` namespaces.

pub mod hooks;

use crate::{
    abi::{coder, AbiItem, Token},
    events, serialization,
    types::{BlockId, Log},
    Error,
};
use serde_json::{Map, Value};
use std::{
    borrow::Cow,
    collections::HashMap,
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

type Before = Arc<dyn Fn(Vec<Value>) -> Result<Vec<Value>, Error> + Send + Sync>;
type After = Arc<dyn Fn(Value) -> Result<Value, Error> + Send + Sync>;

/// A description of a JSON RPC call.
#[derive(Clone)]
pub struct Descriptor {
    name: Cow<'static, str>,
    param_count: Option<usize>,
    before: Before,
    after: After,
}

impl Descriptor {
    /// Creates a descriptor for a method taking exactly `param_count`
    /// parameters, with no formatting hooks.
    pub fn new(name: impl Into<Cow<'static, str>>, param_count: usize) -> Self {
        Self {
            param_count: Some(param_count),
            ..Self::passthrough(name)
        }
    }

    /// Creates a descriptor that forwards any parameters and the result
    /// unchanged.
    pub fn passthrough(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            param_count: None,
            before: Arc::new(|params: Vec<Value>| Ok::<_, Error>(params)),
            after: Arc::new(|result: Value| Ok::<_, Error>(result)),
        }
    }

    /// Adds a parameter hook, run after any previously added ones.
    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Vec<Value>, Error> + Send + Sync + 'static,
    {
        let previous = self.before;
        self.before = Arc::new(move |params: Vec<Value>| hook(previous(params)?));
        self
    }

    /// Adds a result hook, run after any previously added ones.
    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(Value) -> Result<Value, Error> + Send + Sync + 'static,
    {
        let previous = self.after;
        self.after = Arc::new(move |result: Value| hook(previous(result)?));
        self
    }

    /// Formats the parameter at `index` when it is present and not `null`.
    pub fn format_param(self, index: usize, format: fn(&Value) -> Result<Value, Error>) -> Self {
        self.before(move |mut params| {
            if let Some(param) = params.get_mut(index).filter(|param| !param.is_null()) {
                *param = format(param)?;
            }
            Ok(params)
        })
    }

    /// Fills in the parameter at `index` when it is omitted or `null`.
    pub fn default_param(self, index: usize, default: Value) -> Self {
        self.before(move |mut params| {
            if params.len() == index {
                params.push(default.clone());
            } else if let Some(param) = params.get_mut(index).filter(|param| param.is_null()) {
                *param = default.clone();
            }
            Ok(params)
        })
    }

    /// The JSON RPC method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The number of parameters, `None` for pass-through descriptors.
    pub fn param_count(&self) -> Option<usize> {
        self.param_count
    }

    /// Validates and formats call parameters.
    ///
    /// Hooks may fill in trailing parameters, so more parameters than the
    /// descriptor takes are rejected before running them and the formatted
    /// parameters must then match the count exactly.
    pub fn prepare(&self, params: Vec<Value>) -> Result<Vec<Value>, Error> {
        let count = match self.param_count {
            Some(count) => count,
            None => return (self.before)(params),
        };
        if params.len() > count {
            return Err(self.arity_error(params.len()));
        }
        let params = (self.before)(params)?;
        if params.len() != count {
            return Err(self.arity_error(params.len()));
        }
        Ok(params)
    }

    /// Formats a call's raw result.
    pub fn finish(&self, result: Value) -> Result<Value, Error> {
        (self.after)(result)
    }

    fn arity_error(&self, actual: usize) -> Error {
        Error::Argument(format!(
            "{} expects {} parameters but got {actual}",
            self.name,
            self.param_count.unwrap_or_default(),
        ))
    }

    /// Creates an `eth_call` descriptor for a contract function call.
    ///
    /// The calldata is encoded up front and set as the `data` of the call
    /// object parameter. The result is decoded with the function outputs: a
    /// single output is returned as its value, multiple outputs as an object
    /// keyed by position and name.
    pub fn function_call(
        function: &AbiItem,
        tokens: &[Token],
        default_block: BlockId,
    ) -> Result<Self, Error> {
        let data = Value::String(serialization::encode(&coder::encode_function_call(
            function, tokens,
        )?));
        let outputs = function.clone();

        Ok(Self::new("eth_call", 2)
            .before(move |mut params| {
                let call = params
                    .first_mut()
                    .and_then(Value::as_object_mut)
                    .ok_or_else(|| Error::Argument("missing call object".to_owned()))?;
                call.insert("data".to_owned(), data.clone());
                Ok(params)
            })
            .format_param(0, hooks::transaction)
            .default_param(1, default_block.to_json())
            .format_param(1, hooks::block)
            .after(move |result| {
                let hex = result
                    .as_str()
                    .ok_or_else(|| Error::InvalidResponse(format!("invalid call result {result}")))?;
                let data = serialization::decode::<serde_json::Error>(hex)?;
                if data.is_empty() && !outputs.outputs().is_empty() {
                    return Err(Error::InvalidResponse(
                        "returned values are empty, did the call run out of gas?".to_owned(),
                    ));
                }
                let decoded = coder::decode_function_output(&outputs, &data)?;
                Ok(match outputs.outputs().len() {
                    0 => Value::Null,
                    1 => decoded
                        .into_tokens()
                        .first()
                        .map(Token::to_json)
                        .unwrap_or_default(),
                    _ => decoded.to_json(),
                })
            }))
    }

    /// Creates an `eth_getLogs` descriptor that decodes every returned log as
    /// an instance of `event`.
    ///
    /// Filters without topics are restricted to the event's topic 0, unless
    /// the event is anonymous.
    pub fn past_logs(event: &AbiItem) -> Result<Self, Error> {
        let topic = (!event.is_anonymous())
            .then(|| serde_json::to_value(event.hash()))
            .transpose()?;
        let event = event.clone();

        Ok(Self::new("eth_getLogs", 1)
            .default_param(0, Value::Object(Map::new()))
            .before(move |mut params| {
                let filter = params
                    .first_mut()
                    .and_then(Value::as_object_mut)
                    .ok_or_else(|| Error::Argument("invalid log filter".to_owned()))?;
                if let Some(topic) = &topic {
                    filter
                        .entry("topics")
                        .or_insert_with(|| Value::Array(vec![topic.clone()]));
                }
                for key in ["fromBlock", "toBlock"] {
                    if let Some(block) = filter.get_mut(key) {
                        *block = hooks::block(block)?;
                    }
                }
                if let Some(address) = filter.get_mut("address").filter(|a| a.is_string()) {
                    *address = hooks::address(address)?;
                }
                Ok(params)
            })
            .after(move |result| {
                let logs = serde_json::from_value::<Vec<Log>>(result)?;
                let decoded = logs
                    .iter()
                    .map(|log| events::decode(&event, log))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(serde_json::to_value(decoded)?)
            }))
    }
}

impl Debug for Descriptor {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("name", &self.name)
            .field("param_count", &self.param_count)
            .finish_non_exhaustive()
    }
}

/// A lookup table of call descriptors by method name.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    descriptors: HashMap<String, Descriptor>,
}

impl Registry {
    /// Creates a registry of the standard `eth`, `net` and `web3` calls.
    /// Calls with an optional block parameter use `default_block` when it is
    /// omitted.
    pub fn standard(default_block: BlockId) -> Self {
        let block = default_block.to_json();
        let at_block = |name: &'static str, count: usize| {
            Descriptor::new(name, count)
                .default_param(count - 1, block.clone())
                .format_param(count - 1, hooks::block)
        };
        let quantity = |name: &'static str| Descriptor::new(name, 0).after(hooks::output_quantity);

        let mut registry = Self::default();
        for descriptor in [
            Descriptor::new("eth_protocolVersion", 0),
            Descriptor::new("eth_syncing", 0),
            Descriptor::new("eth_coinbase", 0),
            Descriptor::new("eth_mining", 0),
            Descriptor::new("eth_accounts", 0),
            quantity("eth_hashrate"),
            quantity("eth_gasPrice"),
            quantity("eth_blockNumber"),
            quantity("eth_chainId"),
            at_block("eth_getBalance", 2)
                .format_param(0, hooks::address)
                .after(hooks::output_quantity),
            at_block("eth_getStorageAt", 3)
                .format_param(0, hooks::address)
                .format_param(1, hooks::quantity),
            at_block("eth_getCode", 2).format_param(0, hooks::address),
            at_block("eth_getTransactionCount", 2)
                .format_param(0, hooks::address)
                .after(hooks::output_quantity),
            Descriptor::new("eth_getBlockByNumber", 2)
                .format_param(0, hooks::block)
                .default_param(1, Value::Bool(false))
                .after(hooks::output_block),
            Descriptor::new("eth_getBlockByHash", 2)
                .default_param(1, Value::Bool(false))
                .after(hooks::output_block),
            Descriptor::new("eth_getBlockTransactionCountByNumber", 1)
                .format_param(0, hooks::block)
                .after(hooks::output_quantity),
            Descriptor::new("eth_getBlockTransactionCountByHash", 1)
                .after(hooks::output_quantity),
            Descriptor::new("eth_getTransactionByHash", 1),
            Descriptor::new("eth_getTransactionReceipt", 1).after(hooks::output_receipt),
            Descriptor::new("eth_sendTransaction", 1).format_param(0, hooks::transaction),
            Descriptor::new("eth_sendRawTransaction", 1),
            Descriptor::new("eth_sign", 2).format_param(0, hooks::address),
            Descriptor::new("eth_signTransaction", 1).format_param(0, hooks::transaction),
            at_block("eth_call", 2).format_param(0, hooks::transaction),
            Descriptor::new("eth_estimateGas", 1)
                .format_param(0, hooks::transaction)
                .after(hooks::output_quantity),
            Descriptor::new("eth_getLogs", 1).after(hooks::output_logs),
            Descriptor::new("net_version", 0),
            Descriptor::new("net_listening", 0),
            quantity("net_peerCount"),
            Descriptor::new("web3_clientVersion", 0),
            Descriptor::new("web3_sha3", 1),
        ] {
            registry.insert(descriptor);
        }
        registry
    }

    /// Adds a descriptor, replacing any existing one with the same name.
    pub fn insert(&mut self, descriptor: Descriptor) {
        self.descriptors
            .insert(descriptor.name().to_owned(), descriptor);
    }

    /// Returns `true` if the registry has a descriptor for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    /// Returns the descriptor for `name`, falling back to a pass-through
    /// descriptor for unknown methods.
    pub fn get(&self, name: &str) -> Descriptor {
        self.descriptors
            .get(name)
            .cloned()
            .unwrap_or_else(|| Descriptor::passthrough(name.to_owned()))
    }
}
