//! Decode and encode Ethereum call data and event logs against a JSON ABI.
//!
//! ```no_run
//! use abi_codec::{AbiCodec, DecodeResult};
//!
//! let codec = AbiCodec::from_file("erc20.json")?;
//! match codec.decode_call_data("0xa9059cbb...")? {
//!     DecodeResult::FunctionCall(call) => println!("{}", call.function_name),
//!     other => println!("{}", AbiCodec::format_result(&other)),
//! }
//! # Ok::<(), abi_codec::CodecError>(())
//! ```

pub mod codec;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;

pub use codec::{parse_hex, to_hex, AbiCodec, TransactionEnvelope};
pub use domain::abi::{
    AbiDecoder, AbiRegistry, CodecError, DecodeResult, DecodedArg, DecodedCall, DecodedEvent,
    EventSignature, FunctionSignature, ParamSpec, Result, StateMutability, UNKNOWN_MESSAGE,
};
pub use infrastructure::abi::ExportableResult;
