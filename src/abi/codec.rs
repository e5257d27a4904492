//! Type codec for individual Solidity ABI values.
//!
//! Every value is encoded as a sequence of 32-byte words. Static values are
//! encoded in place, while dynamic values are referenced from the head of
//! their enclosing block by an offset relative to the start of that block,
//! with their contents appended to the block's tail.

use super::{Error, ParamType, Token, Word};
use crate::types::{Address, ArrayVec, I256, U256};
use std::iter;

/// Encodes a single value of the specified type.
///
/// For static types, this is the value's in-place head encoding. For dynamic
/// types, this is the value's tail contents (length prefixed for strings,
/// bytes and dynamic arrays); the offset to it is written by the enclosing
/// block.
pub fn encode(kind: &ParamType, token: &Token) -> Result<Vec<u8>, Error> {
    let mut buffer = Vec::new();
    encode_into(kind, token, &mut buffer)?;
    Ok(buffer)
}

/// Encodes a sequence of values as a block of head and tail sections.
pub(crate) fn encode_block(kinds: &[ParamType], tokens: &[Token]) -> Result<Vec<u8>, Error> {
    if kinds.len() != tokens.len() {
        return Err(Error::Arity {
            expected: kinds.len(),
            actual: tokens.len(),
        });
    }

    let head_size = kinds
        .iter()
        .try_fold(0_usize, |size, kind| size.checked_add(kind.head_size()))
        .filter(|&size| size <= isize::MAX as usize)
        .ok_or_else(|| Error::InvalidType(ParamType::Tuple(kinds.to_vec()).to_string()))?;
    let mut head = Vec::new();
    let mut tail = Vec::new();
    for (kind, token) in kinds.iter().zip(tokens) {
        if kind.is_dynamic() {
            head.extend_from_slice(&usize_word(head_size + tail.len()));
            encode_into(kind, token, &mut tail)?;
        } else {
            encode_into(kind, token, &mut head)?;
        }
    }

    head.append(&mut tail);
    Ok(head)
}

fn encode_into(kind: &ParamType, token: &Token, buffer: &mut Vec<u8>) -> Result<(), Error> {
    match (kind, token) {
        (ParamType::Uint(bits), Token::Uint(value)) => {
            if *value > U256::MAX >> (256 - *bits as u32) {
                return Err(Error::OutOfRange(kind.to_string()));
            }
            buffer.extend_from_slice(&value.to_be_bytes());
        }
        (ParamType::Int(bits), Token::Int(value)) => {
            let shift = 256 - *bits as u32;
            if *value < I256::MIN >> shift || *value > I256::MAX >> shift {
                return Err(Error::OutOfRange(kind.to_string()));
            }
            buffer.extend_from_slice(&value.to_be_bytes());
        }
        (ParamType::Address, Token::Address(address)) => {
            let mut word = Word::default();
            word[12..].copy_from_slice(&address.0);
            buffer.extend_from_slice(&word);
        }
        (ParamType::Bool, Token::Bool(value)) => {
            buffer.extend_from_slice(&usize_word(*value as usize));
        }
        (ParamType::FixedBytes(len), Token::FixedBytes(bytes)) => {
            if bytes.len() > *len {
                return Err(Error::OutOfRange(kind.to_string()));
            }
            let mut word = Word::default();
            word[..bytes.len()].copy_from_slice(bytes);
            buffer.extend_from_slice(&word);
        }
        (ParamType::Bytes, Token::Bytes(bytes)) => encode_packed_bytes(bytes, buffer),
        (ParamType::String, Token::String(value)) => encode_packed_bytes(value.as_bytes(), buffer),
        (ParamType::Array(inner), Token::Array(items)) => {
            buffer.extend_from_slice(&usize_word(items.len()));
            let kinds = vec![(**inner).clone(); items.len()];
            buffer.append(&mut encode_block(&kinds, items)?);
        }
        (ParamType::FixedArray(inner, len), Token::FixedArray(items)) => {
            if items.len() != *len {
                return Err(Error::Arity {
                    expected: *len,
                    actual: items.len(),
                });
            }
            let kinds = vec![(**inner).clone(); *len];
            buffer.append(&mut encode_block(&kinds, items)?);
        }
        (ParamType::Tuple(fields), Token::Tuple(items)) => {
            buffer.append(&mut encode_block(fields, items)?);
        }
        _ => {
            return Err(Error::TypeMismatch {
                expected: kind.to_string(),
                actual: token.kind().to_owned(),
            })
        }
    }
    Ok(())
}

fn encode_packed_bytes(bytes: &[u8], buffer: &mut Vec<u8>) {
    buffer.extend_from_slice(&usize_word(bytes.len()));
    buffer.extend_from_slice(bytes);
    let padding = (32 - bytes.len() % 32) % 32;
    buffer.resize(buffer.len() + padding, 0);
}

fn usize_word(value: usize) -> Word {
    U256::from(value as u64).to_be_bytes()
}

/// Decodes a single value of the specified type from `data` at the
/// specified `offset`, where `data` starts at the enclosing block.
///
/// Returns the decoded value along with the number of head bytes that it
/// consumed. Dynamic values are followed through their offset and always
/// consume a single head word.
pub fn decode(kind: &ParamType, data: &[u8], offset: usize) -> Result<(Token, usize), Error> {
    if kind.is_dynamic() {
        let start = read_usize(data, offset)?;
        if start > data.len() {
            return Err(Error::malformed(format!(
                "offset {start} is out of bounds for {} bytes",
                data.len()
            )));
        }
        let token = decode_in_place(kind, &data[start..], 0)?;
        Ok((token, 32))
    } else {
        let token = decode_in_place(kind, data, offset)?;
        Ok((token, kind.head_size()))
    }
}

/// Decodes a block of values.
pub(crate) fn decode_block(kinds: &[ParamType], data: &[u8]) -> Result<Vec<Token>, Error> {
    decode_sequence(kinds, data)
}

fn decode_sequence<'a>(
    kinds: impl IntoIterator<Item = &'a ParamType>,
    data: &[u8],
) -> Result<Vec<Token>, Error> {
    let mut offset = 0;
    kinds
        .into_iter()
        .map(|kind| {
            let (token, consumed) = decode(kind, data, offset)?;
            offset += consumed;
            Ok(token)
        })
        .collect()
}

fn decode_in_place(kind: &ParamType, data: &[u8], offset: usize) -> Result<Token, Error> {
    match kind {
        ParamType::Uint(bits) => {
            let value = U256::from_be_bytes(*read_word(data, offset)?);
            if value > U256::MAX >> (256 - *bits as u32) {
                return Err(Error::OutOfRange(kind.to_string()));
            }
            Ok(Token::Uint(value))
        }
        ParamType::Int(bits) => {
            let value = I256::from_be_bytes(*read_word(data, offset)?);
            let shift = 256 - *bits as u32;
            if value < I256::MIN >> shift || value > I256::MAX >> shift {
                return Err(Error::OutOfRange(kind.to_string()));
            }
            Ok(Token::Int(value))
        }
        ParamType::Address => {
            let word = read_word(data, offset)?;
            if word[..12].iter().any(|&b| b != 0) {
                return Err(Error::malformed("address with non-zero padding"));
            }
            let mut address = [0; 20];
            address.copy_from_slice(&word[12..]);
            Ok(Token::Address(Address(address)))
        }
        ParamType::Bool => {
            let value = U256::from_be_bytes(*read_word(data, offset)?);
            if value > U256::ONE {
                return Err(Error::malformed(format!("invalid boolean value {value}")));
            }
            Ok(Token::Bool(value == U256::ONE))
        }
        ParamType::FixedBytes(len) => {
            let word = read_word(data, offset)?;
            if word[*len..].iter().any(|&b| b != 0) {
                return Err(Error::malformed(format!("bytes{len} with non-zero padding")));
            }
            let mut bytes = ArrayVec::new();
            bytes.extend(word[..*len].iter().copied());
            Ok(Token::FixedBytes(bytes))
        }
        ParamType::Bytes => Ok(Token::Bytes(read_packed_bytes(data, offset)?.to_vec())),
        ParamType::String => {
            let bytes = read_packed_bytes(data, offset)?;
            let value = String::from_utf8(bytes.to_vec())
                .map_err(|_| Error::malformed("string is not valid UTF-8"))?;
            Ok(Token::String(value))
        }
        ParamType::Array(inner) => {
            let len = read_usize(data, offset)?;
            let items = &data[offset + 32..];
            Ok(Token::Array(decode_elements(inner, len, items)?))
        }
        ParamType::FixedArray(inner, len) => {
            let items = data
                .get(offset..)
                .ok_or_else(|| Error::malformed("fixed array is out of bounds"))?;
            Ok(Token::FixedArray(decode_elements(inner, *len, items)?))
        }
        ParamType::Tuple(fields) => {
            let items = data
                .get(offset..)
                .ok_or_else(|| Error::malformed("tuple is out of bounds"))?;
            Ok(Token::Tuple(decode_block(fields, items)?))
        }
    }
}

/// Decodes `len` consecutive elements of the same type. The elements' head
/// encodings must fit in `items`, which bounds the work done for corrupt
/// lengths.
fn decode_elements(inner: &ParamType, len: usize, items: &[u8]) -> Result<Vec<Token>, Error> {
    let fits = len
        .checked_mul(inner.head_size().max(1))
        .map_or(false, |size| size <= items.len());
    if !fits {
        return Err(Error::malformed(format!(
            "{len} elements of type {inner} are out of bounds for {} bytes",
            items.len()
        )));
    }
    decode_sequence(iter::repeat(inner).take(len), items)
}

fn read_word(data: &[u8], offset: usize) -> Result<&Word, Error> {
    offset
        .checked_add(32)
        .and_then(|end| data.get(offset..end))
        .and_then(|word| word.try_into().ok())
        .ok_or_else(|| {
            Error::malformed(format!(
                "expected a word at offset {offset} but data is {} bytes",
                data.len()
            ))
        })
}

fn read_usize(data: &[u8], offset: usize) -> Result<usize, Error> {
    let value = U256::from_be_bytes(*read_word(data, offset)?);
    usize::try_from(value).map_err(|_| Error::malformed(format!("value {value} is too large")))
}

fn read_packed_bytes(data: &[u8], offset: usize) -> Result<&[u8], Error> {
    let len = read_usize(data, offset)?;
    let start = offset + 32;
    start
        .checked_add(len)
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| Error::malformed(format!("{len} bytes are out of bounds")))
}
