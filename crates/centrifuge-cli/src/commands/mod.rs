//! CLI command implementations.

pub mod bsp;
pub mod crc_table;
pub mod download;
