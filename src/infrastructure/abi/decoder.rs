//! ABI decoder implementation using alloy-dyn-abi

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::B256;

use crate::domain::abi::{
    AbiDecoder, AbiRegistry, CodecError, DecodedArg, DecodedCall, DecodedEvent, EventSignature,
    FunctionSignature, ParamSpec, Result,
};

/// ABI decoder implementation using alloy-dyn-abi
#[derive(Debug, Clone)]
pub struct AlloyAbiDecoder {
    registry: AbiRegistry,
}

impl AlloyAbiDecoder {
    /// Create a new decoder with the given registry
    pub fn new(registry: AbiRegistry) -> Self {
        Self { registry }
    }

    /// Get the underlying registry
    pub fn registry(&self) -> &AbiRegistry {
        &self.registry
    }

    /// Set a new registry
    pub fn set_registry(&mut self, registry: AbiRegistry) {
        self.registry = registry;
    }
}

/// Parse the canonical type of each parameter
pub(crate) fn resolve_types<'a>(
    params: impl IntoIterator<Item = &'a ParamSpec>,
) -> Result<Vec<DynSolType>> {
    params
        .into_iter()
        .map(|param| {
            param.kind.parse::<DynSolType>().map_err(|err| CodecError::Decode {
                reason: format!("failed to parse type '{}' for param '{}': {err}", param.kind, param.name),
            })
        })
        .collect()
}

/// Decode an ABI parameter sequence (call arguments or log data)
fn decode_params(types: Vec<DynSolType>, data: &[u8]) -> Result<Vec<DynSolValue>> {
    if types.is_empty() {
        return Ok(Vec::new());
    }

    let decoded = DynSolType::Tuple(types)
        .abi_decode_params(data)
        .map_err(|err| CodecError::Decode {
            reason: err.to_string(),
        })?;

    // Extract individual values from the tuple
    match decoded {
        DynSolValue::Tuple(values) => Ok(values),
        other => Ok(vec![other]),
    }
}

/// Decode a single indexed topic.
///
/// Value types are stored as their 32-byte ABI word. Reference types (string,
/// bytes, arrays, tuples) are stored as the keccak256 of their encoding, so the
/// raw topic is returned as `bytes32`.
fn decode_topic(ty: &DynSolType, topic: &[u8; 32]) -> Result<DynSolValue> {
    match ty {
        DynSolType::String
        | DynSolType::Bytes
        | DynSolType::Array(_)
        | DynSolType::FixedArray(..)
        | DynSolType::Tuple(_) => Ok(DynSolValue::FixedBytes(B256::from(*topic), 32)),
        _ => ty.abi_decode(topic).map_err(|err| CodecError::Decode {
            reason: format!("topic decode: {err}"),
        }),
    }
}

impl AbiDecoder for AlloyAbiDecoder {
    fn decode_calldata(&self, function: &FunctionSignature, data: &[u8]) -> Result<DecodedCall> {
        let Some((selector, args_data)) = data.split_first_chunk::<4>() else {
            return Err(CodecError::DataTooShort {
                len: data.len() * 2,
            });
        };

        // Verify selector matches
        if *selector != function.selector {
            return Err(CodecError::Decode {
                reason: format!(
                    "selector mismatch: got 0x{}, expected {}",
                    hex::encode(selector),
                    function.selector_hex()
                ),
            });
        }

        let types = resolve_types(&function.inputs)?;
        let decoded_values = decode_params(types, args_data)?;

        let arguments = function
            .inputs
            .iter()
            .zip(decoded_values)
            .enumerate()
            .map(|(idx, (param, value))| DecodedArg {
                name: param.display_name(idx),
                kind: param.kind.clone(),
                value,
                indexed: false,
            })
            .collect();

        Ok(DecodedCall {
            selector: *selector,
            function_name: function.name.clone(),
            signature: function.signature.clone(),
            arguments,
            value: None,
            gas_limit: None,
        })
    }

    fn decode_by_selector(&self, selector: [u8; 4], data: &[u8]) -> Result<Option<DecodedCall>> {
        match self.registry.lookup(selector) {
            Some(function) => self.decode_calldata(function, data).map(Some),
            None => Ok(None),
        }
    }

    fn decode_log(
        &self,
        event: &EventSignature,
        topics: &[[u8; 32]],
        data: &[u8],
    ) -> Result<DecodedEvent> {
        let expected = event.indexed_count() + usize::from(!event.anonymous);
        if topics.len() != expected {
            return Err(CodecError::DecodeMismatch {
                expected,
                got: topics.len(),
            });
        }

        let types = resolve_types(&event.inputs)?;
        let mut indexed_topics = topics.iter().skip(usize::from(!event.anonymous));

        // Indexed values come from topics, the rest from one data tuple
        let mut indexed_values = Vec::new();
        let mut data_types = Vec::new();
        for (param, ty) in event.inputs.iter().zip(&types) {
            if param.indexed {
                let topic = indexed_topics.next().ok_or(CodecError::DecodeMismatch {
                    expected,
                    got: topics.len(),
                })?;
                indexed_values.push(decode_topic(ty, topic)?);
            } else {
                data_types.push(ty.clone());
            }
        }
        let mut data_values = decode_params(data_types, data)?.into_iter();
        let mut indexed_values = indexed_values.into_iter();

        let mut arguments = Vec::with_capacity(event.inputs.len());
        for (idx, param) in event.inputs.iter().enumerate() {
            let value = if param.indexed {
                indexed_values.next()
            } else {
                data_values.next()
            };
            let Some(value) = value else {
                return Err(CodecError::Decode {
                    reason: format!("missing value for param '{}'", param.display_name(idx)),
                });
            };
            arguments.push(DecodedArg {
                name: param.display_name(idx),
                kind: param.kind.clone(),
                value,
                indexed: param.indexed,
            });
        }

        Ok(DecodedEvent {
            event_name: event.name.clone(),
            signature: event.signature.clone(),
            arguments,
            topics: topics
                .iter()
                .map(|topic| format!("0x{}", hex::encode(topic)))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::{Fragment, StateMutability};
    use alloy_primitives::{Address, U256};

    fn make_transfer_function() -> FunctionSignature {
        FunctionSignature {
            selector: [0xa9, 0x05, 0x9c, 0xbb],
            name: "transfer".to_string(),
            signature: "transfer(address,uint256)".to_string(),
            full_signature: "function transfer(address to, uint256 amount)".to_string(),
            inputs: vec![ParamSpec::new("to", "address"), ParamSpec::new("amount", "uint256")],
            outputs: vec![],
            state_mutability: StateMutability::NonPayable,
        }
    }

    fn make_transfer_event() -> EventSignature {
        let indexed = |name: &str| ParamSpec {
            name: name.to_string(),
            kind: "address".to_string(),
            indexed: true,
        };
        EventSignature {
            topic: [0xdd; 32],
            name: "Transfer".to_string(),
            signature: "Transfer(address,address,uint256)".to_string(),
            full_signature: String::new(),
            inputs: vec![indexed("from"), indexed("to"), ParamSpec::new("value", "uint256")],
            anonymous: false,
        }
    }

    fn address_topic(byte: u8) -> [u8; 32] {
        let mut topic = [0u8; 32];
        topic[12..].copy_from_slice(&[byte; 20]);
        topic
    }

    #[test]
    fn test_decode_transfer() {
        let function = make_transfer_function();

        // transfer(0x1234567890123456789012345678901234567890, 1000)
        let calldata = hex::decode(
            "a9059cbb000000000000000000000000123456789012345678901234567890123456789000000000000000000000000000000000000000000000000000000000000003e8"
        ).unwrap();

        let registry = AbiRegistry::from_fragments([Fragment::Function(function.clone())]);
        let decoder = AlloyAbiDecoder::new(registry);

        let result = decoder.decode_calldata(&function, &calldata).unwrap();

        assert_eq!(result.function_name, "transfer");
        assert_eq!(result.arguments.len(), 2);
        assert_eq!(result.arguments[0].name, "to");
        assert_eq!(
            result.arguments[0].value,
            DynSolValue::Address("0x1234567890123456789012345678901234567890".parse().unwrap())
        );
        assert_eq!(result.arguments[1].name, "amount");
        assert_eq!(result.arguments[1].value, DynSolValue::Uint(U256::from(1000), 256));

        let by_selector = decoder.decode_by_selector(function.selector, &calldata).unwrap();
        assert_eq!(by_selector, Some(result));
    }

    #[test]
    fn test_selector_mismatch() {
        let function = make_transfer_function();

        // Wrong selector
        let calldata = hex::decode("deadbeef").unwrap();

        let decoder = AlloyAbiDecoder::new(AbiRegistry::new());

        let result = decoder.decode_calldata(&function, &calldata);
        assert!(result.unwrap_err().to_string().contains("selector mismatch"));
        assert_eq!(decoder.decode_by_selector([0xde, 0xad, 0xbe, 0xef], &calldata), Ok(None));
    }

    #[test]
    fn test_truncated_arguments() {
        let function = make_transfer_function();
        let calldata = hex::decode("a9059cbb0000").unwrap();

        let decoder = AlloyAbiDecoder::new(AbiRegistry::new());
        let err = decoder.decode_calldata(&function, &calldata).unwrap_err();
        assert!(matches!(err, CodecError::Decode { .. }));
    }

    #[test]
    fn test_decode_log() {
        let event = make_transfer_event();
        let topics = [event.topic, address_topic(0x11), address_topic(0x22)];
        let data = U256::from(500).to_be_bytes::<32>();

        let decoder = AlloyAbiDecoder::new(AbiRegistry::new());
        let decoded = decoder.decode_log(&event, &topics, &data).unwrap();

        assert_eq!(decoded.event_name, "Transfer");
        let named = decoded.args_named();
        assert_eq!(named["from"], DynSolValue::Address(Address::repeat_byte(0x11)));
        assert_eq!(named["to"], DynSolValue::Address(Address::repeat_byte(0x22)));
        assert_eq!(named["value"], DynSolValue::Uint(U256::from(500), 256));
        assert!(decoded.arguments[0].indexed);
        assert!(!decoded.arguments[2].indexed);
        assert_eq!(decoded.topics.len(), 3);
    }

    #[test]
    fn test_decode_log_topic_count_mismatch() {
        let event = make_transfer_event();
        let topics = [event.topic, address_topic(0x11)];

        let decoder = AlloyAbiDecoder::new(AbiRegistry::new());
        let err = decoder.decode_log(&event, &topics, &[]).unwrap_err();
        assert_eq!(err, CodecError::DecodeMismatch { expected: 3, got: 2 });
    }

    #[test]
    fn test_indexed_reference_type_stays_hashed() {
        let event = EventSignature {
            topic: [0xaa; 32],
            name: "Named".to_string(),
            signature: "Named(string)".to_string(),
            full_signature: String::new(),
            inputs: vec![ParamSpec {
                name: "label".to_string(),
                kind: "string".to_string(),
                indexed: true,
            }],
            anonymous: false,
        };
        let hashed = [0x42; 32];

        let decoder = AlloyAbiDecoder::new(AbiRegistry::new());
        let decoded = decoder.decode_log(&event, &[event.topic, hashed], &[]).unwrap();
        assert_eq!(
            decoded.arguments[0].value,
            DynSolValue::FixedBytes(B256::from(hashed), 32)
        );
    }
}
