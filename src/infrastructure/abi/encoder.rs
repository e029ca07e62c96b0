//! ABI encoder - function call data from a fragment and argument values

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{Address, B256, I256, U256};
use serde_json::Value;

use super::decoder::resolve_types;
use crate::domain::abi::{AbiRegistry, CodecError, FunctionSignature, Result};

fn encode_err(reason: impl Into<String>) -> CodecError {
    CodecError::Encode {
        reason: reason.into(),
    }
}

/// Pick the function to encode.
///
/// `name` may be a bare name or a canonical signature such as
/// `transfer(address,uint256)`. For a bare overloaded name the first
/// declaration taking `arity` arguments wins, falling back to the first
/// declaration so the arity error names a real fragment.
pub fn select_function<'a>(
    registry: &'a AbiRegistry,
    name: &str,
    arity: usize,
) -> Result<&'a FunctionSignature> {
    let unknown = || CodecError::UnknownFunction {
        name: name.to_string(),
    };

    if name.contains('(') {
        let normalized: String = name.chars().filter(|c| !c.is_whitespace()).collect();
        return registry.function_by_signature(&normalized).ok_or_else(unknown);
    }

    let candidates = registry.functions_named(name);
    let first = *candidates.first().ok_or_else(unknown)?;
    Ok(candidates
        .into_iter()
        .find(|f| f.inputs.len() == arity)
        .unwrap_or(first))
}

/// Encode `selector ++ abi_encode_params(values)` after checking arity and types
pub fn encode_function(function: &FunctionSignature, values: &[DynSolValue]) -> Result<Vec<u8>> {
    // Check argument count matches parameter count
    if values.len() != function.inputs.len() {
        return Err(encode_err(format!(
            "argument count mismatch for {}: expected {} arguments, got {}",
            function.signature,
            function.inputs.len(),
            values.len()
        )));
    }

    let types = resolve_types(&function.inputs).map_err(|err| encode_err(err.to_string()))?;
    for (idx, ((param, ty), value)) in function.inputs.iter().zip(&types).zip(values).enumerate() {
        if !ty.matches(value) {
            return Err(encode_err(format!(
                "argument {} ('{}'): expected {}, got {}",
                idx + 1,
                param.display_name(idx),
                param.kind,
                value_kind(value)
            )));
        }
        check_range(value).map_err(|reason| {
            encode_err(format!("argument {} ('{}'): {reason}", idx + 1, param.display_name(idx)))
        })?;
    }

    let mut calldata = function.selector.to_vec();
    if !values.is_empty() {
        // Wrap values in a tuple for proper encoding
        let encoded = DynSolValue::Tuple(values.to_vec()).abi_encode_params();
        calldata.extend_from_slice(&encoded);
    }

    Ok(calldata)
}

/// Parse string arguments (CLI form) against the function's input types
pub fn values_from_strs(function: &FunctionSignature, args: &[&str]) -> Result<Vec<DynSolValue>> {
    let types = typed_inputs(function, args.len())?;
    types
        .iter()
        .zip(args)
        .enumerate()
        .map(|(i, (ty, arg))| {
            parse_value(ty, arg)
                .map_err(|e| encode_err(format!("failed to parse argument {} ({}): {e}", i + 1, ty)))
        })
        .collect()
}

/// Convert JSON arguments against the function's input types
pub fn values_from_json(function: &FunctionSignature, args: &[Value]) -> Result<Vec<DynSolValue>> {
    let types = typed_inputs(function, args.len())?;
    types
        .iter()
        .zip(args)
        .enumerate()
        .map(|(i, (ty, arg))| {
            json_value(ty, arg)
                .map_err(|e| encode_err(format!("failed to parse argument {} ({}): {e}", i + 1, ty)))
        })
        .collect()
}

fn typed_inputs(function: &FunctionSignature, arity: usize) -> Result<Vec<DynSolType>> {
    if arity != function.inputs.len() {
        return Err(encode_err(format!(
            "argument count mismatch for {}: expected {} arguments, got {}",
            function.signature,
            function.inputs.len(),
            arity
        )));
    }
    resolve_types(&function.inputs).map_err(|err| encode_err(err.to_string()))
}

/// Solidity-ish name of a value's shape, for error messages
fn value_kind(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Address(_) => "address".into(),
        DynSolValue::Bool(_) => "bool".into(),
        DynSolValue::Int(_, size) => format!("int{size}"),
        DynSolValue::Uint(_, size) => format!("uint{size}"),
        DynSolValue::FixedBytes(_, size) => format!("bytes{size}"),
        DynSolValue::Bytes(_) => "bytes".into(),
        DynSolValue::String(_) => "string".into(),
        DynSolValue::Array(_) => "array".into(),
        DynSolValue::FixedArray(values) => format!("array[{}]", values.len()),
        DynSolValue::Tuple(values) => format!("tuple of {}", values.len()),
        _ => "unsupported value".into(),
    }
}

/// Reject integers that do not fit their declared width
fn check_range(value: &DynSolValue) -> Result<(), String> {
    match value {
        DynSolValue::Uint(u, size) if *size < 256 && u.bit_len() > *size => {
            Err(format!("value {u} overflows uint{size}"))
        }
        DynSolValue::Int(i, size) if *size < 256 => {
            let bound = I256::from_raw(U256::from(1) << (*size - 1));
            if *i >= bound || *i < -bound {
                Err(format!("value {i} overflows int{size}"))
            } else {
                Ok(())
            }
        }
        DynSolValue::Array(values) | DynSolValue::FixedArray(values) | DynSolValue::Tuple(values) => {
            values.iter().try_for_each(check_range)
        }
        _ => Ok(()),
    }
}

/// Convert a JSON value according to its type
fn json_value(ty: &DynSolType, value: &Value) -> Result<DynSolValue, String> {
    match (ty, value) {
        (DynSolType::Array(inner), Value::Array(items)) => items
            .iter()
            .map(|item| json_value(inner, item))
            .collect::<Result<Vec<_>, _>>()
            .map(DynSolValue::Array),
        (DynSolType::FixedArray(inner, size), Value::Array(items)) => {
            if items.len() != *size {
                return Err(format!(
                    "Fixed array size mismatch: expected {} elements, got {}",
                    size,
                    items.len()
                ));
            }
            items
                .iter()
                .map(|item| json_value(inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::FixedArray)
        }
        (DynSolType::Tuple(types), Value::Array(items)) => {
            if items.len() != types.len() {
                return Err(format!(
                    "Tuple size mismatch: expected {} elements, got {}",
                    types.len(),
                    items.len()
                ));
            }
            types
                .iter()
                .zip(items)
                .map(|(ty, item)| json_value(ty, item))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::Tuple)
        }
        (_, Value::String(s)) => parse_value(ty, s),
        (_, Value::Number(n)) => parse_value(ty, &n.to_string()),
        (_, Value::Bool(b)) => parse_value(ty, &b.to_string()),
        (_, other) => Err(format!("cannot convert JSON {other} to {ty}")),
    }
}

/// Parse a single value according to its type
pub(crate) fn parse_value(ty: &DynSolType, arg: &str) -> Result<DynSolValue, String> {
    let arg = arg.trim();
    match ty {
        DynSolType::Address => {
            let addr = arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")).unwrap_or(arg);

            if addr.len() != 40 || !addr.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err("Invalid address: expected 40 hex characters".to_string());
            }

            let bytes = hex::decode(addr).map_err(|e| format!("Invalid hex: {}", e))?;
            Ok(DynSolValue::Address(Address::from_slice(&bytes)))
        }

        DynSolType::Bool => {
            let value = match arg.to_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => return Err(format!("Invalid bool: expected true/false, got '{}'", arg)),
            };
            Ok(DynSolValue::Bool(value))
        }

        DynSolType::Int(size) => {
            let value = if let Some(hex_str) = strip_hex_prefix(arg) {
                // Hex format - two's complement word
                let bytes = parse_hex_to_bytes(hex_str, 32)?;
                let mut array = [0u8; 32];
                array.copy_from_slice(&bytes);
                I256::from_be_bytes(array)
            } else {
                arg.parse::<I256>()
                    .map_err(|e| format!("Invalid integer: {}", e))?
            };
            Ok(DynSolValue::Int(value, *size))
        }

        DynSolType::Uint(size) => {
            let value = if let Some(hex_str) = strip_hex_prefix(arg) {
                let bytes = parse_hex_to_bytes(hex_str, 32)?;
                let mut array = [0u8; 32];
                array.copy_from_slice(&bytes);
                U256::from_be_bytes(array)
            } else {
                arg.parse::<U256>()
                    .map_err(|e| format!("Invalid unsigned integer: {}", e))?
            };
            Ok(DynSolValue::Uint(value, *size))
        }

        DynSolType::Bytes => {
            let hex_str = strip_hex_prefix(arg).unwrap_or(arg);
            let bytes = hex::decode(hex_str).map_err(|e| format!("Invalid hex: {}", e))?;
            Ok(DynSolValue::Bytes(bytes))
        }

        DynSolType::FixedBytes(size) => {
            let hex_str = strip_hex_prefix(arg).unwrap_or(arg);
            let bytes = hex::decode(hex_str).map_err(|e| format!("Invalid hex: {}", e))?;

            if bytes.len() != *size {
                return Err(format!(
                    "Invalid bytes length: expected {} bytes, got {}",
                    size,
                    bytes.len()
                ));
            }

            // Left-aligned in the word
            let mut word = [0u8; 32];
            word[..*size].copy_from_slice(&bytes);
            Ok(DynSolValue::FixedBytes(B256::from(word), *size))
        }

        DynSolType::String => {
            // Remove quotes if present
            let s = if arg.len() >= 2
                && ((arg.starts_with('"') && arg.ends_with('"'))
                    || (arg.starts_with('\'') && arg.ends_with('\'')))
            {
                &arg[1..arg.len() - 1]
            } else {
                arg
            };
            Ok(DynSolValue::String(s.to_string()))
        }

        DynSolType::Array(inner_ty) => {
            let inner_str = enclosed(arg, '[', ']')
                .ok_or_else(|| "Array must be enclosed in brackets: [val1,val2,...]".to_string())?;
            split_top_level(inner_str)
                .into_iter()
                .map(|elem| parse_value(inner_ty, elem))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::Array)
        }

        DynSolType::FixedArray(inner_ty, size) => {
            let inner_str = enclosed(arg, '[', ']')
                .ok_or_else(|| "Array must be enclosed in brackets: [val1,val2,...]".to_string())?;
            let elements = split_top_level(inner_str);

            if elements.len() != *size {
                return Err(format!(
                    "Fixed array size mismatch: expected {} elements, got {}",
                    size,
                    elements.len()
                ));
            }

            elements
                .into_iter()
                .map(|elem| parse_value(inner_ty, elem))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::FixedArray)
        }

        DynSolType::Tuple(types) => {
            let inner_str = enclosed(arg, '(', ')').ok_or_else(|| {
                "Tuple must be enclosed in parentheses: (val1,val2,...)".to_string()
            })?;
            let elements = split_top_level(inner_str);

            if elements.len() != types.len() {
                return Err(format!(
                    "Tuple size mismatch: expected {} elements, got {}",
                    types.len(),
                    elements.len()
                ));
            }

            types
                .iter()
                .zip(elements)
                .map(|(ty, elem)| parse_value(ty, elem))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::Tuple)
        }

        _ => Err(format!("Unsupported type: {}", ty)),
    }
}

fn strip_hex_prefix(arg: &str) -> Option<&str> {
    arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X"))
}

fn enclosed(arg: &str, open: char, close: char) -> Option<&str> {
    arg.trim().strip_prefix(open)?.strip_suffix(close)
}

/// Split on commas that are not nested inside brackets, parentheses or quotes
fn split_top_level(s: &str) -> Vec<&str> {
    if s.trim().is_empty() {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (idx, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(s[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

/// Parse hex string to bytes with padding
fn parse_hex_to_bytes(hex_str: &str, expected_size: usize) -> Result<Vec<u8>, String> {
    let padded_hex = if hex_str.len() % 2 == 1 {
        format!("0{hex_str}")
    } else {
        hex_str.to_string()
    };
    let bytes = hex::decode(padded_hex).map_err(|e| format!("Invalid hex: {}", e))?;

    if bytes.len() > expected_size {
        return Err(format!(
            "Hex value too large: expected max {} bytes, got {}",
            expected_size,
            bytes.len()
        ));
    }

    // Pad with zeros on the left
    let mut padded = vec![0u8; expected_size];
    padded[expected_size - bytes.len()..].copy_from_slice(&bytes);

    Ok(padded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::{Fragment, ParamSpec, StateMutability};

    fn function(name: &str, selector: [u8; 4], kinds: &[&str]) -> FunctionSignature {
        FunctionSignature {
            selector,
            name: name.to_string(),
            signature: format!("{name}({})", kinds.join(",")),
            full_signature: String::new(),
            inputs: kinds
                .iter()
                .enumerate()
                .map(|(i, kind)| ParamSpec::new(format!("p{i}"), *kind))
                .collect(),
            outputs: vec![],
            state_mutability: StateMutability::NonPayable,
        }
    }

    fn transfer() -> FunctionSignature {
        function("transfer", [0xa9, 0x05, 0x9c, 0xbb], &["address", "uint256"])
    }

    #[test]
    fn test_encode_transfer() {
        let args = ["0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb0", "1000000"];
        let values = values_from_strs(&transfer(), &args).unwrap();

        let result = encode_function(&transfer(), &values).unwrap();
        let hex_result = hex::encode(&result);

        assert!(hex_result.starts_with("a9059cbb"));
        assert!(hex_result.contains("742d35cc6634c0532925a3b844bc9e7595f0beb0"));
        assert!(hex_result.ends_with("0f4240"));
        assert_eq!(result.len(), 4 + 64);
    }

    #[test]
    fn test_encode_no_args() {
        let total_supply = function("totalSupply", [0x18, 0x16, 0x0d, 0xdd], &[]);
        let result = encode_function(&total_supply, &[]).unwrap();
        // Should be just 4 bytes (selector)
        assert_eq!(result, vec![0x18, 0x16, 0x0d, 0xdd]);
    }

    #[test]
    fn test_argument_count_mismatch() {
        let args = ["0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb0"];
        let err = values_from_strs(&transfer(), &args).unwrap_err();
        assert!(err.to_string().contains("argument count mismatch"));

        let err = encode_function(&transfer(), &[]).unwrap_err();
        assert!(matches!(err, CodecError::Encode { .. }));
    }

    #[test]
    fn test_type_mismatch() {
        let values = [DynSolValue::Bool(true), DynSolValue::Uint(U256::from(1), 256)];
        let err = encode_function(&transfer(), &values).unwrap_err();
        assert!(err.to_string().contains("expected address, got bool"));
    }

    #[test]
    fn test_uint_overflow() {
        let small = function("small", [1, 2, 3, 4], &["uint8"]);
        let values = values_from_strs(&small, &["300"]).unwrap();
        let err = encode_function(&small, &values).unwrap_err();
        assert!(err.to_string().contains("overflows uint8"));

        let signed = function("signed", [1, 2, 3, 5], &["int8"]);
        assert!(encode_function(&signed, &values_from_strs(&signed, &["-128"]).unwrap()).is_ok());
        assert!(encode_function(&signed, &values_from_strs(&signed, &["128"]).unwrap()).is_err());
    }

    #[test]
    fn test_parse_bool() {
        let ty = DynSolType::Bool;
        assert!(matches!(parse_value(&ty, "true"), Ok(DynSolValue::Bool(true))));
        assert!(matches!(parse_value(&ty, "false"), Ok(DynSolValue::Bool(false))));
        assert!(matches!(parse_value(&ty, "1"), Ok(DynSolValue::Bool(true))));
        assert!(matches!(parse_value(&ty, "0"), Ok(DynSolValue::Bool(false))));
        assert!(parse_value(&ty, "yes").is_err());
    }

    #[test]
    fn test_parse_string() {
        let ty = DynSolType::String;
        assert!(matches!(
            parse_value(&ty, "\"hello\""),
            Ok(DynSolValue::String(s)) if s == "hello"
        ));
        assert!(matches!(
            parse_value(&ty, "world"),
            Ok(DynSolValue::String(s)) if s == "world"
        ));
    }

    #[test]
    fn test_parse_nested() {
        let ty: DynSolType = "(string,uint256[])[]".parse().unwrap();
        let value = parse_value(&ty, r#"[("a,b",[1,2]),("c",[])]"#).unwrap();
        let DynSolValue::Array(items) = value else {
            panic!("expected array");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0],
            DynSolValue::Tuple(vec![
                DynSolValue::String("a,b".into()),
                DynSolValue::Array(vec![
                    DynSolValue::Uint(U256::from(1), 256),
                    DynSolValue::Uint(U256::from(2), 256),
                ]),
            ])
        );
    }

    #[test]
    fn test_parse_fixed_bytes_left_aligned() {
        let value = parse_value(&DynSolType::FixedBytes(4), "0xdeadbeef").unwrap();
        let DynSolValue::FixedBytes(word, 4) = value else {
            panic!("expected bytes4");
        };
        assert_eq!(&word[..4], &[0xde, 0xad, 0xbe, 0xef]);
        assert!(word[4..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_json_values() {
        let args = [
            Value::String("0x0000000000000000000000000000000000000001".into()),
            serde_json::json!(100),
        ];
        let values = values_from_json(&transfer(), &args).unwrap();
        assert_eq!(values[0], DynSolValue::Address(Address::with_last_byte(1)));
        assert_eq!(values[1], DynSolValue::Uint(U256::from(100), 256));

        let err = values_from_json(&transfer(), &[Value::Null, serde_json::json!(1)]).unwrap_err();
        assert!(matches!(err, CodecError::Encode { .. }));
    }

    #[test]
    fn test_select_overload() {
        let registry = AbiRegistry::from_fragments([
            Fragment::Function(function("mint", [0, 0, 0, 1], &["uint256"])),
            Fragment::Function(function("mint", [0, 0, 0, 2], &["address", "uint256"])),
        ]);

        assert_eq!(select_function(&registry, "mint", 1).unwrap().selector, [0, 0, 0, 1]);
        assert_eq!(select_function(&registry, "mint", 2).unwrap().selector, [0, 0, 0, 2]);
        // No arity match falls back to the first declaration
        assert_eq!(select_function(&registry, "mint", 5).unwrap().selector, [0, 0, 0, 1]);
        assert_eq!(
            select_function(&registry, "mint(address, uint256)", 0).unwrap().selector,
            [0, 0, 0, 2]
        );
        assert!(matches!(
            select_function(&registry, "burn", 1),
            Err(CodecError::UnknownFunction { .. })
        ));
    }

    #[test]
    fn test_selected_function_outlives_name() {
        let registry = AbiRegistry::from_fragments([
            Fragment::Function(function("mint", [0, 0, 0, 1], &["uint256"])),
            Fragment::Function(function("mint", [0, 0, 0, 2], &["address", "uint256"])),
        ]);

        let selected = {
            let name = String::from("mint");
            select_function(&registry, &name, 2).unwrap()
        };
        assert_eq!(selected.signature, "mint(address,uint256)");
        assert_eq!(registry.functions_named("mint").len(), 2);
        assert!(registry.functions_named("burn").is_empty());
    }
}
