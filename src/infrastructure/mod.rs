//! Infrastructure layer
//!
//! This layer contains:
//! - ABI JSON loading on top of alloy-json-abi
//! - Word-level decoding and encoding using alloy-dyn-abi
//! - Text and JSON rendering of decode results

pub mod abi;

pub use abi::{AbiLoader, AlloyAbiDecoder};
