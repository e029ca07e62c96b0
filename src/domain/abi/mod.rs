//! ABI domain models and contracts
//!
//! This module defines the fragment registry, the decode result types and the
//! decoder trait. Parsing and word-level codec work live in
//! [`crate::infrastructure::abi`].

mod decoder;
mod error;
mod registry;

pub use decoder::{AbiDecoder, DecodeResult, DecodedArg, DecodedCall, DecodedEvent, UNKNOWN_MESSAGE};
pub use error::{CodecError, Result};
pub use registry::{
    AbiRegistry, EventSignature, Fragment, FunctionSignature, ParamSpec, StateMutability,
};
