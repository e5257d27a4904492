//! Contract ABI items parsed from Solidity compiler JSON output.

use super::{coder, Error, ParamType};
use crate::types::Digest;
use serde::Deserialize;

/// A function, event or error parameter.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(try_from = "RawParam")]
pub struct Param {
    /// The parameter name, empty for unnamed parameters.
    pub name: String,
    /// The parameter type.
    pub kind: ParamType,
    /// Whether the parameter is an indexed event parameter.
    pub indexed: bool,
}

impl Param {
    /// Creates a new non-indexed parameter.
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
            indexed: false,
        }
    }

    /// Creates a new indexed event parameter.
    pub fn indexed(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            indexed: true,
            ..Self::new(name, kind)
        }
    }
}

#[derive(Deserialize)]
struct RawParam {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    components: Vec<Param>,
    #[serde(default)]
    indexed: bool,
}

impl TryFrom<RawParam> for Param {
    type Error = Error;

    fn try_from(raw: RawParam) -> Result<Self, Self::Error> {
        let components = raw
            .components
            .into_iter()
            .map(|component| component.kind)
            .collect::<Vec<_>>();
        Ok(Self {
            name: raw.name,
            kind: ParamType::from_fragment(&raw.kind, &components)?,
            indexed: raw.indexed,
        })
    }
}

/// The kind of an ABI item.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Function,
    Constructor,
    Event,
    Fallback,
    Receive,
    Error,
}

/// Function state mutability.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    #[default]
    NonPayable,
    Payable,
}

/// A single contract ABI item.
///
/// The canonical signature and its hash are derived once on construction.
/// The hash is the topic 0 of non-anonymous events, and its first 4 bytes
/// are the function selector.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(try_from = "RawItem")]
pub struct AbiItem {
    kind: ItemKind,
    name: String,
    inputs: Vec<Param>,
    outputs: Vec<Param>,
    state_mutability: StateMutability,
    anonymous: bool,
    signature: String,
    hash: Digest,
}

impl AbiItem {
    /// Creates a new ABI item.
    pub fn new(
        kind: ItemKind,
        name: impl Into<String>,
        inputs: Vec<Param>,
        outputs: Vec<Param>,
        state_mutability: StateMutability,
        anonymous: bool,
    ) -> Self {
        let name = name.into();
        let signature = format!(
            "{name}({})",
            inputs
                .iter()
                .map(|input| input.kind.to_string())
                .collect::<Vec<_>>()
                .join(","),
        );
        let hash = coder::keccak256(&signature);
        Self {
            kind,
            name,
            inputs,
            outputs,
            state_mutability,
            anonymous,
            signature,
            hash,
        }
    }

    /// Creates a function item.
    pub fn function(
        name: impl Into<String>,
        inputs: Vec<Param>,
        outputs: Vec<Param>,
        state_mutability: StateMutability,
    ) -> Self {
        Self::new(ItemKind::Function, name, inputs, outputs, state_mutability, false)
    }

    /// Creates an event item.
    pub fn event(name: impl Into<String>, inputs: Vec<Param>, anonymous: bool) -> Self {
        Self::new(
            ItemKind::Event,
            name,
            inputs,
            Vec::new(),
            StateMutability::default(),
            anonymous,
        )
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[Param] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Param] {
        &self.outputs
    }

    pub fn state_mutability(&self) -> StateMutability {
        self.state_mutability
    }

    /// Returns `true` for functions that do not modify state and can be
    /// executed with `eth_call`.
    pub fn is_constant(&self) -> bool {
        matches!(
            self.state_mutability,
            StateMutability::Pure | StateMutability::View
        )
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// The canonical signature, for example `transfer(address,uint256)`.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// The Keccak-256 hash of the canonical signature.
    pub fn hash(&self) -> Digest {
        self.hash
    }

    /// The 4-byte function selector.
    pub fn selector(&self) -> [u8; 4] {
        let mut selector = [0; 4];
        selector.copy_from_slice(&self.hash.0[..4]);
        selector
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawItem {
    #[serde(rename = "type", default)]
    kind: ItemKind,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<Param>,
    #[serde(default)]
    outputs: Vec<Param>,
    #[serde(default)]
    state_mutability: Option<StateMutability>,
    #[serde(default)]
    constant: bool,
    #[serde(default)]
    payable: bool,
    #[serde(default)]
    anonymous: bool,
}

impl TryFrom<RawItem> for AbiItem {
    type Error = Error;

    fn try_from(raw: RawItem) -> Result<Self, Self::Error> {
        let state_mutability = match raw.state_mutability {
            Some(state_mutability) => state_mutability,
            None if raw.constant => StateMutability::View,
            None if raw.payable => StateMutability::Payable,
            None => StateMutability::NonPayable,
        };
        Ok(Self::new(
            raw.kind,
            raw.name,
            raw.inputs,
            raw.outputs,
            state_mutability,
            raw.anonymous,
        ))
    }
}

/// A contract ABI.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct Abi(pub Vec<AbiItem>);

impl Abi {
    /// Parses an ABI from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns the first function with the specified name.
    pub fn function(&self, name: &str) -> Option<&AbiItem> {
        self.functions(name).next()
    }

    /// Returns all overloads of the function with the specified name.
    pub fn functions<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a AbiItem> + 'a {
        self.of_kind(ItemKind::Function)
            .filter(move |item| item.name == name)
    }

    /// Returns the event with the specified name.
    pub fn event(&self, name: &str) -> Option<&AbiItem> {
        self.of_kind(ItemKind::Event).find(|item| item.name == name)
    }

    /// Returns the non-anonymous event with the specified topic 0.
    pub fn event_by_topic(&self, topic: &Digest) -> Option<&AbiItem> {
        self.of_kind(ItemKind::Event)
            .find(|item| !item.anonymous && item.hash == *topic)
    }

    fn of_kind(&self, kind: ItemKind) -> impl Iterator<Item = &AbiItem> {
        self.0.iter().filter(move |item| item.kind == kind)
    }
}
