//! ABI coder for parameter lists, function calls and event logs.

use super::{codec, param, AbiItem, Error, Param, ParamType, Token};
use crate::types::{ArrayVec, Digest};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use sha3::{Digest as _, Keccak256};

/// Computes the Keccak-256 hash of some data.
pub fn keccak256(data: impl AsRef<[u8]>) -> Digest {
    let mut hasher = Keccak256::new();
    hasher.update(data.as_ref());
    Digest(hasher.finalize().into())
}

/// Encodes a list of values.
pub fn encode_parameters(kinds: &[ParamType], tokens: &[Token]) -> Result<Vec<u8>, Error> {
    codec::encode_block(kinds, tokens)
}

/// Decodes a list of values.
pub fn decode(kinds: &[ParamType], data: &[u8]) -> Result<Vec<Token>, Error> {
    codec::decode_block(kinds, data)
}

/// Decodes a list of named parameters.
pub fn decode_parameters(params: &[Param], data: &[u8]) -> Result<DecodedParams, Error> {
    let kinds = params.iter().map(|p| p.kind.clone()).collect::<Vec<_>>();
    let tokens = decode(&kinds, data)?;
    Ok(DecodedParams(
        params
            .iter()
            .zip(tokens)
            .enumerate()
            .map(|(index, (param, value))| DecodedParam::new(index, param, value))
            .collect(),
    ))
}

/// Normalizes a function or event signature by stripping parameter names and
/// data location modifiers and by expanding type aliases.
///
/// For example, `transfer(address to, uint amount)` is normalized to
/// `transfer(address,uint256)`.
pub fn canonical_signature(signature: &str) -> Result<String, Error> {
    let invalid = || Error::InvalidSignature(signature.to_owned());

    let signature = signature.trim();
    let open = signature.find('(').ok_or_else(invalid)?;
    let name = signature[..open].trim();
    let params = signature[open + 1..].strip_suffix(')').ok_or_else(invalid)?;
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(invalid());
    }

    let kinds = param::split_top_level(params)
        .ok_or_else(invalid)?
        .into_iter()
        .map(|param| declared_type(param).ok_or_else(invalid))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(format!(
        "{name}({})",
        kinds
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(","),
    ))
}

/// Parses the type of a parameter declaration such as `uint amount` or
/// `(address owner, bytes data)[] memory orders`.
fn declared_type(declaration: &str) -> Option<ParamType> {
    let kind = type_of(declaration.trim());
    if kind.is_empty() {
        return None;
    }
    if !kind.starts_with('(') {
        return kind.parse().ok();
    }

    let mut depth = 0_usize;
    let close = kind.char_indices().find_map(|(i, c)| {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        None
    })?;
    let fields = param::split_top_level(&kind[1..close])?
        .into_iter()
        .map(declared_type)
        .collect::<Option<Vec<_>>>()?;
    param::apply_dimensions(ParamType::Tuple(fields), &kind[close + 1..], kind).ok()
}

/// Returns the type portion of a parameter declaration, that is everything
/// up to the first whitespace outside of parenthesis.
fn type_of(param: &str) -> &str {
    let mut depth = 0_usize;
    for (i, c) in param.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => return &param[..i],
            _ => {}
        }
    }
    param
}

/// Computes the 4-byte selector for a function signature.
pub fn encode_function_signature(signature: &str) -> Result<[u8; 4], Error> {
    let hash = encode_event_signature(signature)?;
    let mut selector = [0; 4];
    selector.copy_from_slice(&hash.0[..4]);
    Ok(selector)
}

/// Computes the topic 0 hash for an event signature.
pub fn encode_event_signature(signature: &str) -> Result<Digest, Error> {
    Ok(keccak256(canonical_signature(signature)?))
}

/// Encodes calldata for a function call: the function selector followed by
/// the encoded arguments.
pub fn encode_function_call(function: &AbiItem, tokens: &[Token]) -> Result<Vec<u8>, Error> {
    let kinds = function
        .inputs()
        .iter()
        .map(|input| input.kind.clone())
        .collect::<Vec<_>>();
    let mut calldata = function.selector().to_vec();
    calldata.append(&mut encode_parameters(&kinds, tokens)?);
    Ok(calldata)
}

/// Decodes the return data of a function call.
pub fn decode_function_output(function: &AbiItem, data: &[u8]) -> Result<DecodedParams, Error> {
    decode_parameters(function.outputs(), data)
}

/// Decodes event log parameters.
///
/// The `topics` are the argument topics only: callers must strip topic 0
/// from logs of non-anonymous events. Indexed parameters are read from the
/// topics in order, the rest are decoded from `data`. When `data` is `None`,
/// non-indexed parameters are omitted from the result.
///
/// Indexed parameters of reference types (strings, bytes, arrays and tuples)
/// are only stored as the hash of their value, so they decode to the raw
/// 32-byte topic.
pub fn decode_log(
    inputs: &[Param],
    data: Option<&[u8]>,
    topics: &[Digest],
) -> Result<DecodedParams, Error> {
    let unindexed = inputs
        .iter()
        .filter(|input| !input.indexed)
        .map(|input| input.kind.clone())
        .collect::<Vec<_>>();
    let mut values = match data {
        Some(data) => decode(&unindexed, data)?.into_iter(),
        None => Vec::new().into_iter(),
    };
    let mut topics = topics.iter();

    let mut decoded = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.iter().enumerate() {
        let value = if input.indexed {
            let topic = topics.next().ok_or_else(|| {
                Error::malformed(format!("missing topic for indexed parameter {index}"))
            })?;
            if is_value_type(&input.kind) {
                codec::decode(&input.kind, &topic.0, 0)?.0
            } else {
                Token::FixedBytes(ArrayVec::from(topic.0))
            }
        } else {
            match values.next() {
                Some(value) => value,
                None => continue,
            }
        };
        decoded.push(DecodedParam::new(index, input, value));
    }

    Ok(DecodedParams(decoded))
}

fn is_value_type(kind: &ParamType) -> bool {
    matches!(
        kind,
        ParamType::Uint(_)
            | ParamType::Int(_)
            | ParamType::Address
            | ParamType::Bool
            | ParamType::FixedBytes(_)
    )
}

/// A decoded parameter value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodedParam {
    /// The position of the parameter in its parameter list.
    pub index: usize,
    /// The parameter name, if it has one.
    pub name: Option<String>,
    pub value: Token,
}

impl DecodedParam {
    fn new(index: usize, param: &Param, value: Token) -> Self {
        Self {
            index,
            name: (!param.name.is_empty()).then(|| param.name.clone()),
            value,
        }
    }
}

/// Decoded parameter values, accessible by position and by name.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DecodedParams(pub Vec<DecodedParam>);

impl DecodedParams {
    /// Returns the value of the parameter at the specified position.
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.0
            .iter()
            .find(|param| param.index == index)
            .map(|param| &param.value)
    }

    /// Returns the value of the parameter with the specified name.
    pub fn named(&self, name: &str) -> Option<&Token> {
        self.0
            .iter()
            .find(|param| param.name.as_deref() == Some(name))
            .map(|param| &param.value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the decoded values in order.
    pub fn into_tokens(self) -> Vec<Token> {
        self.0.into_iter().map(|param| param.value).collect()
    }

    /// Renders the values as a JSON object keyed by both position and name.
    /// Keys are inserted in parameter order, so a name that collides with a
    /// position overwrites it.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        for param in &self.0 {
            let value = param.value.to_json();
            object.insert(param.index.to_string(), value.clone());
            if let Some(name) = &param.name {
                object.insert(name.clone(), value);
            }
        }
        Value::Object(object)
    }
}

impl Serialize for DecodedParams {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Address, I256, U256};
    use hex_literal::hex;
    use serde_json::json;

    fn kinds(s: &[&str]) -> Vec<ParamType> {
        s.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn word(data: &[u8], index: usize) -> U256 {
        U256::from_be_bytes(data[index * 32..][..32].try_into().unwrap())
    }

    fn samples() -> Vec<(Vec<ParamType>, Vec<Token>)> {
        vec![
            (
                kinds(&["uint256", "int8", "address", "bool", "bytes3"]),
                vec![
                    Token::Uint(U256::MAX),
                    Token::Int(I256::new(-7)),
                    Token::Address(Address([0x42; 20])),
                    Token::Bool(false),
                    Token::fixed_bytes(&hex!("010203")).unwrap(),
                ],
            ),
            (
                kinds(&["string", "uint8", "bytes"]),
                vec![
                    Token::from("hello world, this string is longer than one word"),
                    Token::Uint(U256::new(3)),
                    Token::Bytes(vec![]),
                ],
            ),
            (
                kinds(&["uint256[]", "string[2]", "(uint64,bytes)[]"]),
                vec![
                    Token::Array(vec![Token::Uint(U256::ONE), Token::Uint(U256::new(2))]),
                    Token::FixedArray(vec![Token::from(""), Token::from("b")]),
                    Token::Array(vec![
                        Token::Tuple(vec![Token::Uint(U256::new(5)), Token::Bytes(vec![0xff; 33])]),
                        Token::Tuple(vec![Token::Uint(U256::ZERO), Token::Bytes(vec![1])]),
                    ]),
                ],
            ),
            (
                kinds(&["(bool,address)[2]", "uint16[2][]", "int256"]),
                vec![
                    Token::FixedArray(vec![
                        Token::Tuple(vec![Token::Bool(true), Token::Address(Address([1; 20]))]),
                        Token::Tuple(vec![Token::Bool(false), Token::Address(Address([2; 20]))]),
                    ]),
                    Token::Array(vec![Token::FixedArray(vec![
                        Token::Uint(U256::new(65535)),
                        Token::Uint(U256::ZERO),
                    ])]),
                    Token::Int(I256::MIN),
                ],
            ),
        ]
    }

    #[test]
    fn roundtrips_and_word_alignment() {
        for (kinds, tokens) in samples() {
            let encoded = encode_parameters(&kinds, &tokens).unwrap();
            assert_eq!(encoded.len() % 32, 0);
            assert_eq!(decode(&kinds, &encoded).unwrap(), tokens);
        }
    }

    #[test]
    fn offsets_point_to_tail_segments() {
        let kinds = kinds(&["uint256", "string", "bytes", "bool"]);
        let tokens = vec![
            Token::Uint(U256::new(1)),
            Token::from("abc"),
            Token::Bytes(vec![0xaa; 40]),
            Token::Bool(true),
        ];
        let encoded = encode_parameters(&kinds, &tokens).unwrap();

        let head = 4 * 32;
        let string = usize::try_from(word(&encoded, 1)).unwrap();
        let bytes = usize::try_from(word(&encoded, 2)).unwrap();
        assert_eq!(string, head);
        // "abc" occupies a length word and a single padded word.
        assert_eq!(bytes, head + 64);
        // 40 bytes occupy a length word and two padded words.
        assert_eq!(encoded.len() - head, 64 + 96);
        assert_eq!(word(&encoded, string / 32), U256::new(3));
        assert_eq!(word(&encoded, bytes / 32), U256::new(40));
    }

    #[test]
    fn known_encoding() {
        // Example from the Solidity ABI specification.
        let encoded = encode_parameters(
            &kinds(&["uint256", "uint32[]", "bytes10", "bytes"]),
            &[
                Token::Uint(U256::new(0x123)),
                Token::Array(vec![
                    Token::Uint(U256::new(0x456)),
                    Token::Uint(U256::new(0x789)),
                ]),
                Token::fixed_bytes(b"1234567890").unwrap(),
                Token::Bytes(b"Hello, world!".to_vec()),
            ],
        )
        .unwrap();
        assert_eq!(
            encoded,
            hex!(
                "0000000000000000000000000000000000000000000000000000000000000123"
                "0000000000000000000000000000000000000000000000000000000000000080"
                "3132333435363738393000000000000000000000000000000000000000000000"
                "00000000000000000000000000000000000000000000000000000000000000e0"
                "0000000000000000000000000000000000000000000000000000000000000002"
                "0000000000000000000000000000000000000000000000000000000000000456"
                "0000000000000000000000000000000000000000000000000000000000000789"
                "000000000000000000000000000000000000000000000000000000000000000d"
                "48656c6c6f2c20776f726c642100000000000000000000000000000000000000"
            ),
        );
    }

    #[test]
    fn arity_mismatch() {
        assert_eq!(
            encode_parameters(&kinds(&["uint256", "uint256"]), &[Token::Uint(U256::ONE)]),
            Err(Error::Arity {
                expected: 2,
                actual: 1
            }),
        );
    }

    #[test]
    fn function_selectors() {
        let selector = encode_function_signature("transfer(address,uint256)").unwrap();
        assert_eq!(selector, hex!("a9059cbb"));
        assert_eq!(
            encode_function_signature("transfer(address to, uint256 amount)").unwrap(),
            selector,
        );
        assert_eq!(
            encode_function_signature(" transfer( address  to ,uint amount ) ").unwrap(),
            selector,
        );
        assert_eq!(
            canonical_signature("submit((address owner, bytes data)[] memory orders, byte b)")
                .unwrap(),
            "submit((address,bytes)[],bytes1)",
        );
        assert_eq!(canonical_signature("f()").unwrap(), "f()");
        for invalid in ["transfer", "(address)", "f(address,)", "f(uint7)", "f((uint256)"] {
            assert!(canonical_signature(invalid).is_err(), "{invalid}");
        }
    }

    #[test]
    fn event_signatures() {
        assert_eq!(
            encode_event_signature("Transfer(address indexed from, address indexed to, uint value)")
                .unwrap(),
            Digest(hex!(
                "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
            )),
        );
    }

    #[test]
    fn function_calls() {
        let transfer = AbiItem::function(
            "transfer",
            vec![
                Param::new("to", ParamType::Address),
                Param::new("amount", ParamType::Uint(256)),
            ],
            vec![Param::new("", ParamType::Bool)],
            Default::default(),
        );
        let calldata = encode_function_call(
            &transfer,
            &[Token::Address(Address([0x11; 20])), Token::Uint(U256::new(1000))],
        )
        .unwrap();
        assert_eq!(
            calldata,
            hex!(
                "a9059cbb"
                "0000000000000000000000001111111111111111111111111111111111111111"
                "00000000000000000000000000000000000000000000000000000000000003e8"
            ),
        );

        let output = decode_function_output(
            &transfer,
            &hex!("0000000000000000000000000000000000000000000000000000000000000001"),
        )
        .unwrap();
        assert_eq!(output.get(0), Some(&Token::Bool(true)));
        assert_eq!(output.to_json(), json!({ "0": true }));
    }

    #[test]
    fn named_and_positional_access() {
        let params = vec![
            Param::new("owner", ParamType::Address),
            Param::new("0", ParamType::Uint(8)),
        ];
        let data = encode_parameters(
            &[ParamType::Address, ParamType::Uint(8)],
            &[Token::Address(Address([0x33; 20])), Token::Uint(U256::new(9))],
        )
        .unwrap();
        let decoded = decode_parameters(&params, &data).unwrap();

        assert_eq!(decoded.named("owner"), Some(&Token::Address(Address([0x33; 20]))));
        assert_eq!(decoded.get(1), Some(&Token::Uint(U256::new(9))));
        // The second parameter's name collides with the first position.
        assert_eq!(
            decoded.to_json(),
            json!({
                "0": "9",
                "1": "9",
                "owner": "0x3333333333333333333333333333333333333333",
            }),
        );
    }

    #[test]
    fn log_parameters() {
        let inputs = vec![
            Param::indexed("from", ParamType::Address),
            Param::new("value", ParamType::Uint(256)),
            Param::indexed("memo", ParamType::String),
        ];
        let from = Digest(hex!(
            "0000000000000000000000001111111111111111111111111111111111111111"
        ));
        let memo = Digest([0xee; 32]);
        let data = encode_parameters(&[ParamType::Uint(256)], &[Token::Uint(U256::new(7))]).unwrap();

        let decoded = decode_log(&inputs, Some(&data), &[from, memo]).unwrap();
        assert_eq!(
            decoded.into_tokens(),
            vec![
                Token::Address(Address([0x11; 20])),
                Token::Uint(U256::new(7)),
                Token::FixedBytes(ArrayVec::from([0xee; 32])),
            ],
        );

        let decoded = decode_log(&inputs, None, &[from, memo]).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded.get(1), None);
        assert_eq!(
            decoded.named("memo"),
            Some(&Token::FixedBytes(ArrayVec::from([0xee; 32]))),
        );

        assert!(matches!(
            decode_log(&inputs, Some(&data), &[from]),
            Err(Error::MalformedData(_)),
        ));
    }
}
