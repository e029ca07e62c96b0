//! ABI infrastructure - Alloy-based ABI loading, decoding and encoding

mod decoder;
pub mod encoder;
pub mod format;
mod loader;

pub use decoder::AlloyAbiDecoder;
pub use encoder::{encode_function, select_function};
pub use format::{format_dyn_sol_value, format_ether, format_result, ExportableResult};
pub use loader::AbiLoader;
