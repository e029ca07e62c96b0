//! `AbiCodec` - the load / decode / encode façade over one ABI description

use std::path::Path;

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::U256;
use serde_json::Value;
use tracing::{debug, info};

use crate::domain::abi::{
    AbiDecoder, AbiRegistry, CodecError, DecodeResult, DecodedEvent, EventSignature,
    FunctionSignature, Result,
};
use crate::infrastructure::abi::{encoder, format, AbiLoader, AlloyAbiDecoder};

/// Call data plus the envelope fields a decoded call should carry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionEnvelope {
    /// Hex call data (`input` of the transaction)
    pub data: String,
    /// Wei attached to the call
    pub value: Option<U256>,
    pub gas_limit: Option<u64>,
}

impl TransactionEnvelope {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }
}

/// Decoder and encoder bound to at most one loaded ABI description.
///
/// Loading takes `&mut self`; every other operation is read-only, so a loaded
/// codec can be shared across threads behind an `Arc`.
#[derive(Debug, Default, Clone)]
pub struct AbiCodec {
    decoder: Option<AlloyAbiDecoder>,
}

impl AbiCodec {
    /// Create a codec with nothing loaded
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec and load the ABI file at `path`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut codec = Self::new();
        codec.load_file(path)?;
        Ok(codec)
    }

    /// Load an ABI JSON file, replacing any loaded description
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<&AbiRegistry> {
        let path = path.as_ref();
        let registry = AbiLoader::load_file(path)?;
        Ok(self.install(registry, &path.display().to_string()))
    }

    /// Load an in-memory fragment array (or artifact object)
    pub fn load_json(&mut self, abi: &Value) -> Result<&AbiRegistry> {
        let registry = AbiLoader::load_value(abi)?;
        Ok(self.install(registry, "<memory>"))
    }

    /// Load ABI JSON text
    pub fn load_str(&mut self, abi: &str) -> Result<&AbiRegistry> {
        let registry = AbiLoader::load_str(abi)?;
        Ok(self.install(registry, "<memory>"))
    }

    fn install(&mut self, registry: AbiRegistry, source: &str) -> &AbiRegistry {
        info!(
            source,
            functions = registry.functions().len(),
            events = registry.events().len(),
            skipped = registry.skipped,
            "ABI loaded"
        );
        let decoder = match self.decoder.take() {
            Some(mut decoder) => {
                decoder.set_registry(registry);
                decoder
            }
            None => AlloyAbiDecoder::new(registry),
        };
        self.decoder.insert(decoder).registry()
    }

    pub fn is_loaded(&self) -> bool {
        self.decoder.is_some()
    }

    fn decoder(&self) -> Result<&AlloyAbiDecoder> {
        self.decoder.as_ref().ok_or(CodecError::NotLoaded)
    }

    /// The loaded description
    pub fn registry(&self) -> Result<&AbiRegistry> {
        self.decoder().map(AlloyAbiDecoder::registry)
    }

    /// Classify and decode raw call data.
    ///
    /// Only `NotLoaded` is returned as `Err`; malformed or unrecognised data comes
    /// back as [`DecodeResult::Error`] or [`DecodeResult::Unknown`].
    pub fn decode_call_data(&self, data: &str) -> Result<DecodeResult> {
        self.decode_transaction(&TransactionEnvelope::new(data))
    }

    /// Same as [`decode_call_data`](Self::decode_call_data), carrying the envelope's
    /// value and gas limit into a decoded call
    pub fn decode_transaction(&self, tx: &TransactionEnvelope) -> Result<DecodeResult> {
        let decoder = self.decoder()?;
        Ok(self.classify(decoder, tx))
    }

    /// Decode a signed EIP-2718 transaction and classify its input
    pub fn decode_raw_transaction(&self, raw: &str) -> Result<DecodeResult> {
        let decoder = self.decoder()?;

        let bytes = match parse_hex(raw) {
            Ok(bytes) => bytes,
            Err(error) => return Ok(error_result(error, raw)),
        };
        let envelope = match TxEnvelope::decode_2718(&mut bytes.as_slice()) {
            Ok(envelope) => envelope,
            Err(err) => {
                let error = CodecError::InvalidTransaction {
                    reason: err.to_string(),
                };
                return Ok(error_result(error, raw));
            }
        };

        let tx = TransactionEnvelope {
            data: format!("0x{}", hex::encode(envelope.input())),
            value: Some(envelope.value()),
            gas_limit: Some(envelope.gas_limit()),
        };
        Ok(self.classify(decoder, &tx))
    }

    /// Function, then event, then unknown
    fn classify(&self, decoder: &AlloyAbiDecoder, tx: &TransactionEnvelope) -> DecodeResult {
        let raw = tx.data.as_str();
        let body = strip_prefix(raw.trim());

        if body.len() < 8 {
            return error_result(CodecError::DataTooShort { len: body.len() }, raw);
        }
        let bytes = match parse_hex(raw) {
            Ok(bytes) if bytes.len() < 4 => {
                return error_result(CodecError::DataTooShort { len: bytes.len() * 2 }, raw)
            }
            Ok(bytes) => bytes,
            Err(error) => return error_result(error, raw),
        };

        let selector = format!("0x{}", hex::encode(&bytes[..4]));
        let data = format!("0x{}", hex::encode(&bytes[4..]));
        debug!(%selector, data_len = bytes.len() - 4, "classifying call data");

        let function_error = match self.decode_function(decoder, &bytes) {
            Ok(mut call) => {
                call.value = tx.value;
                call.gas_limit = tx.gas_limit;
                debug!(function = %call.signature, "decoded as function call");
                return DecodeResult::FunctionCall(call);
            }
            Err(err) => err.to_string(),
        };

        // Bare call data has no topics, so this branch cannot match an event
        let event_error = match self.decode_log_bytes(decoder, &[], &bytes) {
            Ok(event) => return DecodeResult::EventLog(event),
            Err(err) => err.to_string(),
        };

        debug!(%selector, %function_error, %event_error, "unable to classify data");
        DecodeResult::Unknown {
            selector,
            data,
            function_error,
            event_error,
        }
    }

    fn decode_function(
        &self,
        decoder: &AlloyAbiDecoder,
        bytes: &[u8],
    ) -> Result<crate::domain::abi::DecodedCall> {
        let selector: [u8; 4] = bytes
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or(CodecError::DataTooShort {
                len: bytes.len() * 2,
            })?;
        decoder
            .decode_by_selector(selector, bytes)?
            .ok_or_else(|| CodecError::Decode {
                reason: format!("no function matches selector 0x{}", hex::encode(selector)),
            })
    }

    fn decode_log_bytes(
        &self,
        decoder: &AlloyAbiDecoder,
        topics: &[[u8; 32]],
        data: &[u8],
    ) -> Result<DecodedEvent> {
        let first = topics.first().ok_or_else(|| CodecError::UnknownEvent {
            topic: "(none)".to_string(),
        })?;
        let event = decoder
            .registry()
            .lookup_event(*first)
            .ok_or_else(|| CodecError::UnknownEvent {
                topic: format!("0x{}", hex::encode(first)),
            })?;
        decoder.decode_log(event, topics, data)
    }

    /// Decode an event log from its topics and data blob
    pub fn decode_event<T: AsRef<str>>(&self, topics: &[T], data: &str) -> Result<DecodedEvent> {
        let decoder = self.decoder()?;

        let topics = topics
            .iter()
            .map(|topic| parse_topic(topic.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let data = parse_hex(data)?;

        let event = self.decode_log_bytes(decoder, &topics, &data)?;
        debug!(event = %event.signature, "decoded event log");
        Ok(event)
    }

    /// Loaded functions in declaration order
    pub fn list_functions(&self) -> Result<&[FunctionSignature]> {
        Ok(self.registry()?.functions())
    }

    /// Loaded events in declaration order
    pub fn list_events(&self) -> Result<&[EventSignature]> {
        Ok(self.registry()?.events())
    }

    /// Encode a call from typed values
    pub fn encode_call(&self, name: &str, args: &[DynSolValue]) -> Result<Vec<u8>> {
        let function = encoder::select_function(self.registry()?, name, args.len())?;
        encoder::encode_function(function, args)
    }

    /// Encode a call from JSON values (`["0x…", 100]`)
    pub fn encode_call_json(&self, name: &str, args: &[Value]) -> Result<Vec<u8>> {
        let function = encoder::select_function(self.registry()?, name, args.len())?;
        let values = encoder::values_from_json(function, args)?;
        encoder::encode_function(function, &values)
    }

    /// Encode a call from command-line style strings
    pub fn encode_call_strs(&self, name: &str, args: &[&str]) -> Result<Vec<u8>> {
        let function = encoder::select_function(self.registry()?, name, args.len())?;
        let values = encoder::values_from_strs(function, args)?;
        encoder::encode_function(function, &values)
    }

    /// Render a result as a multi-line summary
    pub fn format_result(result: &DecodeResult) -> String {
        format::format_result(result)
    }
}

fn error_result(error: CodecError, raw: &str) -> DecodeResult {
    DecodeResult::Error {
        error,
        raw_data: raw.to_string(),
    }
}

fn strip_prefix(hex_str: &str) -> &str {
    hex_str
        .strip_prefix("0x")
        .or_else(|| hex_str.strip_prefix("0X"))
        .unwrap_or(hex_str)
}

/// Decode a hex payload, rejecting odd lengths instead of truncating
pub fn parse_hex(hex_str: &str) -> Result<Vec<u8>> {
    hex::decode(strip_prefix(hex_str.trim())).map_err(|err| CodecError::InvalidHex {
        reason: err.to_string(),
    })
}

fn parse_topic(topic: &str) -> Result<[u8; 32]> {
    let bytes = parse_hex(topic)?;
    bytes.try_into().map_err(|bytes: Vec<u8>| CodecError::InvalidHex {
        reason: format!("topic must be 32 bytes, got {}", bytes.len()),
    })
}

/// `0x`-prefixed lower-case hex
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABI: &str = r#"[
        {"type":"function","name":"transfer","inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[{"name":"","type":"bool"}],"stateMutability":"nonpayable"},
        {"type":"event","name":"Transfer","inputs":[{"name":"from","type":"address","indexed":true},{"name":"to","type":"address","indexed":true},{"name":"value","type":"uint256","indexed":false}],"anonymous":false}
    ]"#;

    fn codec() -> AbiCodec {
        let mut codec = AbiCodec::new();
        codec.load_str(ABI).unwrap();
        codec
    }

    #[test]
    fn test_not_loaded() {
        let codec = AbiCodec::new();
        assert!(!codec.is_loaded());
        assert_eq!(codec.decode_call_data("0xa9059cbb"), Err(CodecError::NotLoaded));
        assert_eq!(codec.list_functions().unwrap_err(), CodecError::NotLoaded);
        assert_eq!(codec.list_events().unwrap_err(), CodecError::NotLoaded);
        assert_eq!(codec.encode_call("transfer", &[]).unwrap_err(), CodecError::NotLoaded);
        assert_eq!(
            codec.decode_event(&["0x00"], "0x").unwrap_err(),
            CodecError::NotLoaded
        );
    }

    #[test]
    fn test_data_too_short() {
        let codec = codec();
        for input in ["", "0x", "0xa9059c", "a9059c"] {
            let result = codec.decode_call_data(input).unwrap();
            assert!(
                matches!(result.error(), Some(CodecError::DataTooShort { .. })),
                "{input}: {result:?}"
            );
        }
    }

    #[test]
    fn test_whitespace_padded_short_input() {
        let codec = codec();
        for input in ["0xabcd\n\n\n\n", "  0xabcd    ", "\tabcdef\t\t"] {
            let result = codec.decode_call_data(input).unwrap();
            assert!(
                matches!(result.error(), Some(CodecError::DataTooShort { .. })),
                "{input:?}: {result:?}"
            );
        }

        let padded = codec.decode_call_data("  0xdeadbeef\n").unwrap();
        assert_eq!(padded.kind(), "unknown");
    }

    #[test]
    fn test_odd_length_rejected() {
        let codec = codec();
        let result = codec.decode_call_data("0xa9059cbb0").unwrap();
        assert!(matches!(result.error(), Some(CodecError::InvalidHex { .. })));
    }

    #[test]
    fn test_envelope_fields_carried() {
        let codec = codec();
        let data = codec
            .encode_call_strs("transfer", &["0x0000000000000000000000000000000000000001", "5"])
            .unwrap();
        let tx = TransactionEnvelope {
            data: to_hex(&data),
            value: Some(U256::from(7)),
            gas_limit: Some(60_000),
        };

        let result = codec.decode_transaction(&tx).unwrap();
        let call = result.as_call().unwrap();
        assert_eq!(call.value, Some(U256::from(7)));
        assert_eq!(call.gas_limit, Some(60_000));

        let bare = codec.decode_call_data(&tx.data).unwrap();
        assert_eq!(bare.as_call().unwrap().value, None);
    }

    #[test]
    fn test_reload_replaces_description() {
        let mut codec = codec();
        codec
            .load_str(r#"[{"type":"function","name":"ping","inputs":[]}]"#)
            .unwrap();
        let names: Vec<&str> = codec.list_functions().unwrap().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["ping"]);
        assert!(codec.list_events().unwrap().is_empty());
    }

    #[test]
    fn test_failed_load_keeps_previous() {
        let mut codec = codec();
        assert!(codec.load_str("[{\"type\":\"nope\"}]").is_err());
        assert_eq!(codec.list_functions().unwrap()[0].name, "transfer");
    }

    #[test]
    fn test_bad_topic_length() {
        let codec = codec();
        let err = codec.decode_event(&["0xdead"], "0x").unwrap_err();
        assert!(matches!(err, CodecError::InvalidHex { .. }));
    }

    #[test]
    fn test_empty_topics_is_unknown_event() {
        let codec = codec();
        let err = codec.decode_event::<&str>(&[], "0x").unwrap_err();
        assert!(matches!(err, CodecError::UnknownEvent { .. }));
    }
}
