//! Solidity ABI parameter types.

use super::Error;
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

/// A Solidity ABI type.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ParamType {
    /// Unsigned integer with the specified bit width.
    Uint(usize),
    /// Signed integer with the specified bit width.
    Int(usize),
    /// A 20-byte address.
    Address,
    /// A boolean.
    Bool,
    /// Fixed-size bytes with the specified length.
    FixedBytes(usize),
    /// Dynamically sized bytes.
    Bytes,
    /// A UTF-8 string.
    String,
    /// A dynamically sized array.
    Array(Box<ParamType>),
    /// A fixed-size array.
    FixedArray(Box<ParamType>, usize),
    /// A tuple (struct).
    Tuple(Vec<ParamType>),
}

impl ParamType {
    /// Parses a type from an ABI JSON fragment. Tuple types (`tuple`,
    /// `tuple[]`, `tuple[2][]`, ...) take their fields from `components`.
    pub fn from_fragment(kind: &str, components: &[ParamType]) -> Result<Self, Error> {
        match kind.strip_prefix("tuple") {
            Some(dimensions) if dimensions.is_empty() || dimensions.starts_with('[') => {
                if components.is_empty() {
                    return Err(Error::InvalidType(kind.to_owned()));
                }
                apply_dimensions(Self::Tuple(components.to_vec()), dimensions, kind)
            }
            _ => kind.parse(),
        }
    }

    /// Returns `true` if the type is dynamically sized, meaning it is encoded
    /// in the tail of its enclosing block and referenced by an offset.
    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::Bytes | Self::String | Self::Array(_) => true,
            Self::FixedArray(inner, _) => inner.is_dynamic(),
            Self::Tuple(fields) => fields.iter().any(Self::is_dynamic),
            _ => false,
        }
    }

    /// The number of bytes the type occupies in the head of its enclosing
    /// block. Saturates at `usize::MAX` for types too large to encode,
    /// which the parser rejects.
    pub fn head_size(&self) -> usize {
        self.checked_head_size().unwrap_or(usize::MAX)
    }

    fn checked_head_size(&self) -> Option<usize> {
        if self.is_dynamic() {
            return Some(32);
        }
        match self {
            Self::FixedArray(inner, len) => inner.checked_head_size()?.checked_mul(*len),
            Self::Tuple(fields) => fields.iter().try_fold(0_usize, |size, field| {
                size.checked_add(field.checked_head_size()?)
            }),
            _ => Some(32),
        }
    }
}

impl Display for ParamType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Uint(bits) => write!(f, "uint{bits}"),
            Self::Int(bits) => write!(f, "int{bits}"),
            Self::Address => f.write_str("address"),
            Self::Bool => f.write_str("bool"),
            Self::FixedBytes(len) => write!(f, "bytes{len}"),
            Self::Bytes => f.write_str("bytes"),
            Self::String => f.write_str("string"),
            Self::Array(inner) => write!(f, "{inner}[]"),
            Self::FixedArray(inner, len) => write!(f, "{inner}[{len}]"),
            Self::Tuple(fields) => {
                f.write_str("(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{field}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl FromStr for ParamType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || Error::InvalidType(s.to_owned());

        if let Some(rest) = s.strip_suffix(']') {
            let open = rest.rfind('[').ok_or_else(invalid)?;
            let inner = rest[..open].parse::<ParamType>()?;
            return match &rest[open + 1..] {
                "" => Ok(Self::Array(Box::new(inner))),
                len => fixed_array(inner, len).ok_or_else(invalid),
            };
        }

        if let Some(fields) = s.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
            let fields = split_top_level(fields)
                .ok_or_else(invalid)?
                .into_iter()
                .map(str::parse::<ParamType>)
                .collect::<Result<Vec<_>, _>>()?;
            if fields.is_empty() {
                return Err(invalid());
            }
            return Ok(Self::Tuple(fields));
        }

        match s {
            "address" => return Ok(Self::Address),
            "bool" => return Ok(Self::Bool),
            "bytes" => return Ok(Self::Bytes),
            "string" => return Ok(Self::String),
            "byte" => return Ok(Self::FixedBytes(1)),
            "uint" => return Ok(Self::Uint(256)),
            "int" => return Ok(Self::Int(256)),
            _ => {}
        }

        let sized = |prefix: &str| s.strip_prefix(prefix).and_then(decimal);
        if let Some(bits) = sized("uint") {
            return integer_bits(bits).map(Self::Uint).ok_or_else(invalid);
        }
        if let Some(bits) = sized("int") {
            return integer_bits(bits).map(Self::Int).ok_or_else(invalid);
        }
        if let Some(len) = sized("bytes") {
            return match len {
                1..=32 => Ok(Self::FixedBytes(len)),
                _ => Err(invalid()),
            };
        }

        Err(invalid())
    }
}

/// Splits a comma separated list on commas that are not nested within
/// parenthesis. Returns `None` on unbalanced input.
pub(crate) fn split_top_level(s: &str) -> Option<Vec<&str>> {
    if s.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    parts.push(s[start..].trim());
    Some(parts)
}

pub(crate) fn apply_dimensions(
    mut base: ParamType,
    dimensions: &str,
    kind: &str,
) -> Result<ParamType, Error> {
    let invalid = || Error::InvalidType(kind.to_owned());
    let mut rest = dimensions;
    while !rest.is_empty() {
        let close = rest.find(']').ok_or_else(invalid)?;
        let len = rest[..close].strip_prefix('[').ok_or_else(invalid)?;
        base = match len {
            "" => ParamType::Array(Box::new(base)),
            len => fixed_array(base, len).ok_or_else(invalid)?,
        };
        rest = &rest[close + 1..];
    }
    Ok(base)
}

fn decimal(s: &str) -> Option<usize> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) || s.starts_with('0') {
        return None;
    }
    s.parse().ok()
}

fn integer_bits(bits: usize) -> Option<usize> {
    (bits % 8 == 0 && (8..=256).contains(&bits)).then_some(bits)
}

/// Builds a fixed array type, rejecting lengths whose head encoding would
/// not fit in memory.
fn fixed_array(inner: ParamType, len: &str) -> Option<ParamType> {
    let len = decimal(len.trim())?;
    let kind = ParamType::FixedArray(Box::new(inner), len);
    kind.checked_head_size()
        .filter(|&size| size <= isize::MAX as usize)
        .map(|_| kind)
}
