//! CUDA->HIP mapping tables.
//!
//! This module handles:
//! - The counter catalog shared by rules and statistics
//! - TOML mapping table parsing and validation
//! - The built-in default table

pub mod parser;
pub mod types;

pub use parser::{default_mapping_table, parse_mapping_file, parse_mapping_str};
pub use types::{Counter, DeviceFunction, HostFunctions, MappingEntry, MappingTable, SupportStatus};
