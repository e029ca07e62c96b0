//! Domain layer - codec models independent of how they are parsed or printed

pub mod abi;
