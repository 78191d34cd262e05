//! # centrifuge
//!
//! Tools for pulling data out of CS:GO game files.
//!
//! This crate provides:
//! - Extraction of the official map CRC table from `engine_client.so`
//!   (signature scan plus static decoding of the comparison chain)
//! - Source engine `.bsp` parsing: raw lumps, map checksum, the embedded
//!   pakfile and its radar overview images
//! - A Steam workshop client for downloading published maps
//!
//! ## Feature Flags
//!
//! - `api` (default): the Steam workshop client, built on `ureq`.

pub mod bsp;
pub mod config;
pub mod crc;
pub mod error;
pub mod source;
#[cfg(feature = "api")]
pub mod steam;

pub use bsp::{Bsp, Lump, LumpInfo, Pakfile, RadarOverview};
pub use config::Config;
pub use crc::{
    LayoutPreset, PatternLocator, Record, RecordChain, RecordField, TableLayout, builtin_layout,
    extract_crc_table, extract_crc_table_with, find_pattern, load_layout, save_layout,
};
pub use error::{Error, Result};
pub use source::{ByteSource, ReadAt};
#[cfg(feature = "api")]
pub use steam::{PublishedFileDetails, PublishedFileDetailsResponse, WorkshopClient};
