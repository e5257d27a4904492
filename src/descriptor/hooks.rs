//! Parameter and result formatters used by the standard descriptors.

use crate::{
    abi::coder::keccak256,
    types::{BlockTag, U256},
    Error,
};
use serde_json::{Map, Value};

/// Validates an address and renders it as lowercase `0x`-prefixed hex.
///
/// Mixed-case addresses must carry a valid EIP-55 checksum.
pub fn address(value: &Value) -> Result<Value, Error> {
    let invalid = || Error::Argument(format!("invalid address {value}"));

    let s = value.as_str().ok_or_else(invalid)?;
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let lower = digits.to_ascii_lowercase();
    let mixed = digits != lower && digits != digits.to_ascii_uppercase();
    if mixed && !checksum_matches(digits, &lower) {
        return Err(Error::Argument(format!("invalid address checksum {value}")));
    }

    Ok(Value::String(format!("0x{lower}")))
}

fn checksum_matches(digits: &str, lower: &str) -> bool {
    let hash = keccak256(lower);
    digits.bytes().enumerate().all(|(i, digit)| {
        let nibble = (hash.0[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0xf;
        match digit {
            b'a'..=b'f' => nibble < 8,
            b'A'..=b'F' => nibble >= 8,
            _ => true,
        }
    })
}

/// Formats an integer as a hex quantity. Accepts JSON numbers, decimal
/// strings and `0x`-prefixed hex strings.
pub fn quantity(value: &Value) -> Result<Value, Error> {
    let invalid = || Error::Argument(format!("invalid quantity {value}"));

    let number = match value {
        Value::Number(n) => n.as_u64().map(U256::from).ok_or_else(invalid)?,
        Value::String(s) => match s.strip_prefix("0x") {
            Some(digits) => U256::from_str_radix(digits, 16),
            None => U256::from_str_radix(s, 10),
        }
        .map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };
    Ok(Value::String(format!("0x{number:x}")))
}

/// Formats a block parameter: tags and block hashes are kept as is, block
/// numbers are converted to hex quantities.
pub fn block(value: &Value) -> Result<Value, Error> {
    if let Some(s) = value.as_str() {
        if BlockTag::from_name(s).is_some() {
            return Ok(value.clone());
        }
        if let Some(digits) = s.strip_prefix("0x").filter(|digits| digits.len() == 64) {
            if digits.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Ok(Value::String(s.to_ascii_lowercase()));
            }
        }
    }
    quantity(value).map_err(|_| Error::Argument(format!("invalid block {value}")))
}

/// Normalizes a transaction object: addresses are validated and lowercased
/// and numeric fields are converted to hex quantities.
pub fn transaction(value: &Value) -> Result<Value, Error> {
    let mut tx = value
        .as_object()
        .cloned()
        .ok_or_else(|| Error::Argument(format!("invalid transaction object {value}")))?;

    for key in ["from", "to"] {
        update(&mut tx, key, address)?;
    }
    for key in [
        "gas",
        "gasPrice",
        "maxFeePerGas",
        "maxPriorityFeePerGas",
        "value",
        "nonce",
        "chainId",
    ] {
        update(&mut tx, key, quantity)?;
    }

    Ok(Value::Object(tx))
}

/// Converts a hex quantity result to a JSON number, or to a decimal string
/// when it does not fit in 64 bits.
pub fn output_quantity(value: Value) -> Result<Value, Error> {
    let s = match &value {
        Value::String(s) => s,
        _ => return Ok(value),
    };
    let number = s
        .strip_prefix("0x")
        .and_then(|digits| U256::from_str_radix(digits, 16).ok())
        .ok_or_else(|| Error::InvalidResponse(format!("invalid quantity {value}")))?;
    Ok(match u64::try_from(number) {
        Ok(number) => Value::from(number),
        Err(_) => Value::String(number.to_string()),
    })
}

/// Parses a receipt status given as a boolean or as a `0x0`/`0x1` quantity.
fn receipt_status(status: &Value) -> Option<bool> {
    match status {
        Value::Bool(success) => Some(*success),
        Value::String(s) => {
            let value = U256::from_str_radix(s.strip_prefix("0x")?, 16).ok()?;
            (value <= U256::ONE).then(|| value == U256::ONE)
        }
        _ => None,
    }
}

/// Formats a transaction receipt, converting its status to a boolean.
pub fn output_receipt(value: Value) -> Result<Value, Error> {
    let mut receipt = match value {
        Value::Object(receipt) => receipt,
        _ => return Ok(value),
    };

    if let Some(status) = receipt.get_mut("status").filter(|status| !status.is_null()) {
        let success = receipt_status(status)
            .ok_or_else(|| Error::InvalidResponse(format!("invalid receipt status {status}")))?;
        *status = Value::Bool(success);
    }
    for key in [
        "blockNumber",
        "transactionIndex",
        "cumulativeGasUsed",
        "gasUsed",
        "effectiveGasPrice",
    ] {
        update_output(&mut receipt, key)?;
    }
    if let Some(Value::Array(logs)) = receipt.remove("logs") {
        let logs = logs.into_iter().map(output_log).collect::<Result<_, _>>()?;
        receipt.insert("logs".to_owned(), Value::Array(logs));
    }

    Ok(Value::Object(receipt))
}

/// Formats a block, converting its numeric header fields to numbers.
pub fn output_block(value: Value) -> Result<Value, Error> {
    let mut block = match value {
        Value::Object(block) => block,
        _ => return Ok(value),
    };
    for key in [
        "number",
        "gasLimit",
        "gasUsed",
        "timestamp",
        "size",
        "baseFeePerGas",
        "difficulty",
        "totalDifficulty",
    ] {
        update_output(&mut block, key)?;
    }
    Ok(Value::Object(block))
}

/// Formats a list of logs.
pub fn output_logs(value: Value) -> Result<Value, Error> {
    match value {
        Value::Array(logs) => Ok(Value::Array(
            logs.into_iter().map(output_log).collect::<Result<_, _>>()?,
        )),
        value => Ok(value),
    }
}

fn output_log(value: Value) -> Result<Value, Error> {
    let mut log = match value {
        Value::Object(log) => log,
        _ => return Ok(value),
    };
    for key in ["blockNumber", "logIndex", "transactionIndex"] {
        update_output(&mut log, key)?;
    }
    Ok(Value::Object(log))
}

fn update(
    object: &mut Map<String, Value>,
    key: &str,
    format: fn(&Value) -> Result<Value, Error>,
) -> Result<(), Error> {
    if let Some(value) = object.get_mut(key).filter(|value| !value.is_null()) {
        *value = format(value)?;
    }
    Ok(())
}

fn update_output(object: &mut Map<String, Value>, key: &str) -> Result<(), Error> {
    if let Some(value) = object.get_mut(key) {
        *value = output_quantity(value.take())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn addresses() {
        assert_eq!(
            address(&json!("0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED")).unwrap(),
            json!("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
        );
        assert_eq!(
            address(&json!("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")).unwrap(),
            json!("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
        );
        assert_eq!(
            address(&json!("1111111111111111111111111111111111111111")).unwrap(),
            json!("0x1111111111111111111111111111111111111111"),
        );
        for invalid in [
            json!("0xabc"),
            json!("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD"),
            json!(42),
        ] {
            assert!(matches!(address(&invalid), Err(Error::Argument(_))), "{invalid}");
        }
    }

    #[test]
    fn quantities_and_blocks() {
        assert_eq!(quantity(&json!(255)).unwrap(), json!("0xff"));
        assert_eq!(quantity(&json!("1000")).unwrap(), json!("0x3e8"));
        assert_eq!(quantity(&json!("0x0")).unwrap(), json!("0x0"));
        assert!(quantity(&json!(-1)).is_err());
        assert!(quantity(&json!("0xzz")).is_err());

        assert_eq!(block(&json!("pending")).unwrap(), json!("pending"));
        assert_eq!(block(&json!(16)).unwrap(), json!("0x10"));
        assert!(block(&json!("newest")).is_err());
    }

    #[test]
    fn transactions() {
        let tx = transaction(&json!({
            "from": "0x1111111111111111111111111111111111111111",
            "to": null,
            "gas": 21000,
            "value": "1000000000000000000",
            "data": "0x",
        }))
        .unwrap();
        assert_eq!(
            tx,
            json!({
                "from": "0x1111111111111111111111111111111111111111",
                "to": null,
                "gas": "0x5208",
                "value": "0xde0b6b3a7640000",
                "data": "0x",
            }),
        );
        assert!(transaction(&json!("0x")).is_err());
        assert!(transaction(&json!({ "from": "0x1" })).is_err());
    }

    #[test]
    fn outputs() {
        assert_eq!(output_quantity(json!("0x10")).unwrap(), json!(16));
        assert_eq!(
            output_quantity(json!("0x10000000000000000")).unwrap(),
            json!("18446744073709551616"),
        );
        assert_eq!(output_quantity(Value::Null).unwrap(), Value::Null);
        assert!(output_quantity(json!("ten")).is_err());

        assert_eq!(
            output_receipt(json!({
                "status": "0x0",
                "gasUsed": "0x64",
                "logs": [{ "logIndex": "0x1" }],
            }))
            .unwrap(),
            json!({ "status": false, "gasUsed": 100, "logs": [{ "logIndex": 1 }] }),
        );
        assert_eq!(output_receipt(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn receipt_status_is_a_quantity() {
        for (status, success) in [
            (json!("0x0"), false),
            (json!("0x00"), false),
            (json!("0x1"), true),
            (json!("0x01"), true),
            (json!(true), true),
            (json!(false), false),
        ] {
            assert_eq!(
                output_receipt(json!({ "status": status })).unwrap(),
                json!({ "status": success }),
            );
        }
        for invalid in [json!("0x2"), json!("1"), json!("0x"), json!(1)] {
            assert!(matches!(
                output_receipt(json!({ "status": invalid })),
                Err(Error::InvalidResponse(_)),
            ));
        }
        assert_eq!(
            output_receipt(json!({ "status": null })).unwrap(),
            json!({ "status": null }),
        );
    }
}
