//! ABI decoder trait and decode result types

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::U256;
use indexmap::IndexMap;

use super::{CodecError, EventSignature, FunctionSignature, Result};

/// Message carried by an [`DecodeResult::Unknown`] result
pub const UNKNOWN_MESSAGE: &str = "Unable to decode as function call or event log";

/// A decoded function or event argument
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedArg {
    /// Parameter name (or "arg{n}" if unnamed)
    pub name: String,
    /// Solidity type (e.g., "address", "uint256", "(uint256,address)")
    pub kind: String,
    /// Decoded value
    pub value: DynSolValue,
    /// Whether the value came from a topic
    pub indexed: bool,
}

/// Zip decoded arguments into a name -> value map.
///
/// A repeated name keeps its first position but takes the last value.
fn named(arguments: &[DecodedArg]) -> IndexMap<String, DynSolValue> {
    let mut map = IndexMap::with_capacity(arguments.len());
    for arg in arguments {
        map.insert(arg.name.clone(), arg.value.clone());
    }
    map
}

/// Result of decoding a function call
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCall {
    /// 4-byte selector taken from the call data
    pub selector: [u8; 4],
    /// Function name
    pub function_name: String,
    /// Full function signature (e.g., "transfer(address,uint256)")
    pub signature: String,
    /// Decoded arguments
    pub arguments: Vec<DecodedArg>,
    /// Wei attached to the transaction, when decoded from an envelope
    pub value: Option<U256>,
    /// Gas limit of the transaction, when decoded from an envelope
    pub gas_limit: Option<u64>,
}

impl DecodedCall {
    pub fn selector_hex(&self) -> String {
        format!("0x{}", hex::encode(self.selector))
    }

    /// Positional argument values
    pub fn args(&self) -> Vec<&DynSolValue> {
        self.arguments.iter().map(|arg| &arg.value).collect()
    }

    pub fn args_named(&self) -> IndexMap<String, DynSolValue> {
        named(&self.arguments)
    }
}

/// Result of decoding an event log
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    /// Event name
    pub event_name: String,
    /// Full event signature (e.g., "Transfer(address,address,uint256)")
    pub signature: String,
    /// Decoded arguments in declaration order
    pub arguments: Vec<DecodedArg>,
    /// Topics the event was decoded from, hex encoded
    pub topics: Vec<String>,
}

impl DecodedEvent {
    /// Positional argument values
    pub fn args(&self) -> Vec<&DynSolValue> {
        self.arguments.iter().map(|arg| &arg.value).collect()
    }

    pub fn args_named(&self) -> IndexMap<String, DynSolValue> {
        named(&self.arguments)
    }
}

/// Classification of an arbitrary payload
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeResult {
    FunctionCall(DecodedCall),
    EventLog(DecodedEvent),
    /// The payload could not be inspected at all (too short, bad hex, bad envelope)
    Error { error: CodecError, raw_data: String },
    /// Neither a known function nor a decodable event
    Unknown {
        selector: String,
        data: String,
        function_error: String,
        event_error: String,
    },
}

impl DecodeResult {
    /// Kind tag, as rendered by the formatter and in JSON output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FunctionCall(_) => "function_call",
            Self::EventLog(_) => "event_log",
            Self::Error { .. } => "error",
            Self::Unknown { .. } => "unknown",
        }
    }

    pub fn as_call(&self) -> Option<&DecodedCall> {
        match self {
            Self::FunctionCall(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_event(&self) -> Option<&DecodedEvent> {
        match self {
            Self::EventLog(event) => Some(event),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&CodecError> {
        match self {
            Self::Error { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Trait for ABI decoding implementations
///
/// This trait abstracts over the actual ABI decoding implementation,
/// allowing us to swap out alloy-dyn-abi for a different library if needed.
pub trait AbiDecoder: Send + Sync {
    /// Decode calldata given a function signature
    ///
    /// # Arguments
    /// * `function` - The function signature to decode with
    /// * `data` - The calldata bytes (including the 4-byte selector)
    fn decode_calldata(&self, function: &FunctionSignature, data: &[u8]) -> Result<DecodedCall>;

    /// Decode calldata by looking up the selector
    ///
    /// # Returns
    /// * `Ok(Some(DecodedCall))` - If the selector was found and decoding succeeded
    /// * `Ok(None)` - If the selector was not found
    /// * `Err(...)` - If decoding fails
    fn decode_by_selector(&self, selector: [u8; 4], data: &[u8]) -> Result<Option<DecodedCall>>;

    /// Decode a log given its event signature
    ///
    /// `topics` includes the signature topic at index 0.
    fn decode_log(
        &self,
        event: &EventSignature,
        topics: &[[u8; 32]],
        data: &[u8],
    ) -> Result<DecodedEvent>;
}
