//! Human-readable and JSON rendering of decode results

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::U256;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::domain::abi::{
    DecodeResult, DecodedArg, EventSignature, FunctionSignature, UNKNOWN_MESSAGE,
};

/// Format a DynSolValue for display
pub fn format_dyn_sol_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::FixedBytes(word, size) => {
            let bytes = &word.as_slice()[..(*size).min(32)];
            format!("0x{}", hex::encode(bytes))
        }
        DynSolValue::Address(addr) => addr.to_checksum(None),
        DynSolValue::Function(func) => format!("0x{}", hex::encode(func.as_slice())),
        DynSolValue::Bytes(bytes) => {
            if bytes.len() <= 32 {
                format!("0x{}", hex::encode(bytes))
            } else {
                format!("0x{}… ({} bytes)", hex::encode(&bytes[..32]), bytes.len())
            }
        }
        DynSolValue::String(s) => {
            if s.chars().count() <= 64 {
                format!("\"{}\"", s)
            } else {
                let head: String = s.chars().take(64).collect();
                format!("\"{}…\" ({} chars)", head, s.chars().count())
            }
        }
        DynSolValue::Array(arr) | DynSolValue::FixedArray(arr) => {
            let max_items = 10;
            let items: Vec<String> = arr
                .iter()
                .take(max_items)
                .map(format_dyn_sol_value)
                .collect();
            if arr.len() > max_items {
                format!("[{}, …] ({} items)", items.join(", "), arr.len())
            } else {
                format!("[{}]", items.join(", "))
            }
        }
        DynSolValue::Tuple(fields) => {
            let items: Vec<String> = fields.iter().map(format_dyn_sol_value).collect();
            format!("({})", items.join(", "))
        }
        #[allow(unreachable_patterns)]
        other => format!("{other:?}"),
    }
}

/// Format a wei amount as ether, trimming trailing zeros
pub fn format_ether(wei: U256) -> String {
    let unit = U256::from(1_000_000_000_000_000_000u64);
    let ether = wei / unit;
    let remainder = wei % unit;
    if remainder.is_zero() {
        ether.to_string()
    } else {
        let decimal = format!("{:0>18}", remainder.to_string());
        format!("{}.{}", ether, decimal.trim_end_matches('0'))
    }
}

fn push_arguments(output: &mut String, arguments: &[DecodedArg]) {
    output.push_str("   Arguments:\n");
    let mut named: IndexMap<&str, &DynSolValue> = IndexMap::new();
    for arg in arguments {
        named.insert(arg.name.as_str(), &arg.value);
    }
    for (name, value) in named {
        output.push_str(&format!("     {}: {}\n", name, format_dyn_sol_value(value)));
    }
}

/// Render a decode result as a multi-line summary
pub fn format_result(result: &DecodeResult) -> String {
    let mut output = String::from("\nDecode Result:\n");
    output.push_str(&format!("   Type: {}\n", result.kind()));

    match result {
        DecodeResult::FunctionCall(call) => {
            output.push_str(&format!("   Function: {}\n", call.function_name));
            output.push_str(&format!("   Signature: {}\n", call.signature));
            output.push_str(&format!("   Selector: {}\n", call.selector_hex()));
            push_arguments(&mut output, &call.arguments);
            if let Some(gas_limit) = call.gas_limit {
                output.push_str(&format!("   Gas Limit: {}\n", gas_limit));
            }
            if let Some(value) = call.value {
                output.push_str(&format!("   Value: {} ETH\n", format_ether(value)));
            }
        }
        DecodeResult::EventLog(event) => {
            output.push_str(&format!("   Event: {}\n", event.event_name));
            output.push_str(&format!("   Signature: {}\n", event.signature));
            push_arguments(&mut output, &event.arguments);
        }
        DecodeResult::Error { error, .. } => {
            output.push_str(&format!("   Error: {}\n", error));
        }
        DecodeResult::Unknown { selector, data, .. } => {
            output.push_str(&format!("   Selector: {}\n", selector));
            output.push_str(&format!("   Data: {}\n", data));
            output.push_str(&format!("   Error: {}\n", UNKNOWN_MESSAGE));
        }
    }

    output
}

/// One-line listing of a function fragment
pub fn format_function(function: &FunctionSignature) -> String {
    format!("{}  {}", function.selector_hex(), function.full_signature)
}

/// One-line listing of an event fragment
pub fn format_event(event: &EventSignature) -> String {
    if event.anonymous {
        format!("{:<66}  {}", "(anonymous)", event.full_signature)
    } else {
        format!("{}  {}", event.topic_hex(), event.full_signature)
    }
}

/// JSON form of a decoded value. Integers are decimal strings so no precision is lost.
pub fn value_to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Int(i, _) => Value::String(i.to_string()),
        DynSolValue::Uint(u, _) => Value::String(u.to_string()),
        DynSolValue::FixedBytes(word, size) => {
            Value::String(format!("0x{}", hex::encode(&word[..(*size).min(32)])))
        }
        DynSolValue::Address(addr) => Value::String(addr.to_checksum(None)),
        DynSolValue::Function(func) => Value::String(format!("0x{}", hex::encode(func.as_slice()))),
        DynSolValue::Bytes(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            Value::Array(items.iter().map(value_to_json).collect())
        }
        #[allow(unreachable_patterns)]
        other => Value::String(format!("{other:?}")),
    }
}

fn args_json(arguments: &[DecodedArg]) -> (Vec<Value>, Map<String, Value>) {
    let positional = arguments.iter().map(|arg| value_to_json(&arg.value)).collect();
    let mut named = Map::new();
    for arg in arguments {
        named.insert(arg.name.clone(), value_to_json(&arg.value));
    }
    (positional, named)
}

/// Serializable decode result (JSON output)
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ExportableResult {
    FunctionCall {
        selector: String,
        function_name: String,
        function_signature: String,
        args: Vec<Value>,
        args_named: Map<String, Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        gas_limit: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    EventLog {
        event_name: String,
        event_signature: String,
        args: Vec<Value>,
        args_named: Map<String, Value>,
        topics: Vec<String>,
    },
    Error {
        code: &'static str,
        error: String,
        raw_data: String,
    },
    Unknown {
        selector: String,
        data: String,
        error: &'static str,
        function_error: String,
        event_error: String,
    },
}

impl From<&DecodeResult> for ExportableResult {
    fn from(result: &DecodeResult) -> Self {
        match result {
            DecodeResult::FunctionCall(call) => {
                let (args, args_named) = args_json(&call.arguments);
                Self::FunctionCall {
                    selector: call.selector_hex(),
                    function_name: call.function_name.clone(),
                    function_signature: call.signature.clone(),
                    args,
                    args_named,
                    gas_limit: call.gas_limit,
                    value: call.value.map(|v| v.to_string()),
                }
            }
            DecodeResult::EventLog(event) => {
                let (args, args_named) = args_json(&event.arguments);
                Self::EventLog {
                    event_name: event.event_name.clone(),
                    event_signature: event.signature.clone(),
                    args,
                    args_named,
                    topics: event.topics.clone(),
                }
            }
            DecodeResult::Error { error, raw_data } => Self::Error {
                code: error.code(),
                error: error.to_string(),
                raw_data: raw_data.clone(),
            },
            DecodeResult::Unknown {
                selector,
                data,
                function_error,
                event_error,
            } => Self::Unknown {
                selector: selector.clone(),
                data: data.clone(),
                error: UNKNOWN_MESSAGE,
                function_error: function_error.clone(),
                event_error: event_error.clone(),
            },
        }
    }
}

/// JSON listing entry for a function fragment
pub fn function_json(function: &FunctionSignature) -> Value {
    json!({
        "name": function.name,
        "selector": function.selector_hex(),
        "signature": function.signature,
        "fullSignature": function.full_signature,
        "inputs": function.inputs,
        "outputs": function.outputs,
        "stateMutability": function.state_mutability,
    })
}

/// JSON listing entry for an event fragment
pub fn event_json(event: &EventSignature) -> Value {
    json!({
        "name": event.name,
        "topic": event.topic_hex(),
        "signature": event.signature,
        "fullSignature": event.full_signature,
        "inputs": event.inputs,
        "anonymous": event.anonymous,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::{CodecError, DecodedCall};
    use alloy_primitives::Address;

    fn sample_call() -> DecodeResult {
        DecodeResult::FunctionCall(DecodedCall {
            selector: [0xa9, 0x05, 0x9c, 0xbb],
            function_name: "transfer".into(),
            signature: "transfer(address,uint256)".into(),
            arguments: vec![
                DecodedArg {
                    name: "to".into(),
                    kind: "address".into(),
                    value: DynSolValue::Address(Address::with_last_byte(1)),
                    indexed: false,
                },
                DecodedArg {
                    name: "amount".into(),
                    kind: "uint256".into(),
                    value: DynSolValue::Uint(U256::from(100), 256),
                    indexed: false,
                },
            ],
            value: Some(U256::from(1_500_000_000_000_000_000u64)),
            gas_limit: Some(21_000),
        })
    }

    #[test]
    fn test_format_value() {
        let addr = DynSolValue::Address(Address::from([0x12; 20]));
        assert!(format_dyn_sol_value(&addr).starts_with("0x"));

        let value = DynSolValue::Uint(U256::from(1000000), 256);
        assert_eq!(format_dyn_sol_value(&value), "1000000");

        let large = DynSolValue::Uint(U256::MAX, 256);
        assert_eq!(
            format_dyn_sol_value(&large),
            "115792089237316195423570985008687907853269984665640564039457584007913129639935"
        );

        assert_eq!(format_dyn_sol_value(&DynSolValue::Bool(true)), "true");
        assert_eq!(format_dyn_sol_value(&DynSolValue::String("hello".into())), "\"hello\"");
    }

    #[test]
    fn test_format_ether() {
        assert_eq!(format_ether(U256::from(1_000_000_000_000_000_000u64)), "1");
        assert_eq!(format_ether(U256::from(1_500_000_000_000_000_000u64)), "1.5");
        assert_eq!(format_ether(U256::from(100_000_000_000_000_000u64)), "0.1");
        assert_eq!(format_ether(U256::ZERO), "0");
    }

    #[test]
    fn test_format_function_call() {
        let output = format_result(&sample_call());
        assert!(output.contains("Type: function_call"));
        assert!(output.contains("Function: transfer"));
        assert!(output.contains("     amount: 100\n"));
        assert!(output.contains("Gas Limit: 21000"));
        assert!(output.contains("Value: 1.5 ETH"));
        assert_eq!(output, format_result(&sample_call()));
    }

    #[test]
    fn test_format_error_and_unknown() {
        let error = DecodeResult::Error {
            error: CodecError::DataTooShort { len: 4 },
            raw_data: "0xabcd".into(),
        };
        assert!(format_result(&error).contains("Error: data too short"));

        let unknown = DecodeResult::Unknown {
            selector: "0xdeadbeef".into(),
            data: "0x".into(),
            function_error: "no function".into(),
            event_error: "no topics".into(),
        };
        let output = format_result(&unknown);
        assert!(output.contains("Selector: 0xdeadbeef"));
        assert!(output.contains(UNKNOWN_MESSAGE));
    }

    #[test]
    fn test_export_json_shape() {
        let json = serde_json::to_value(ExportableResult::from(&sample_call())).unwrap();
        assert_eq!(json["type"], "function_call");
        assert_eq!(json["functionName"], "transfer");
        assert_eq!(json["argsNamed"]["amount"], "100");
        assert_eq!(json["args"][0], "0x0000000000000000000000000000000000000001");
        assert_eq!(json["gasLimit"], 21000);
        assert_eq!(json["value"], "1500000000000000000");
    }
}
