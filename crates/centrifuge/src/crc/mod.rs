//! Map CRC table extraction from `engine_client.so`
//!
//! The client checks a downloaded map against the table of official maps
//! before loading it. This module recovers that table (map name, map CRC,
//! workshop id) from the shared library without disassembling it: the
//! signature scan finds the first comparison, and the entries after it are
//! decoded at a fixed stride until the instruction pattern stops.

mod chain;
mod layout;
mod locator;
mod record;
#[cfg(test)]
pub(crate) mod testing;

pub use chain::{RecordChain, decode_record, is_valid_prefix};
pub use layout::*;
pub use locator::{DEFAULT_CHUNK_SIZE, PatternLocator, find_pattern};
pub use record::{Record, RecordField};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::source::ByteSource;

/// Extract the CRC table using the built-in layout.
pub fn extract_crc_table<S: ByteSource + ?Sized>(source: &mut S) -> Result<Vec<Record>> {
    extract_crc_table_with(source, &builtin_layout(), DEFAULT_CHUNK_SIZE)
}

/// Extract the CRC table described by `layout`.
///
/// Either the whole table is returned or an error: a failure on any entry
/// discards the entries decoded before it.
pub fn extract_crc_table_with<S: ByteSource + ?Sized>(
    source: &mut S,
    layout: &TableLayout,
    chunk_size: usize,
) -> Result<Vec<Record>> {
    layout.validate()?;

    let anchor = PatternLocator::new(chunk_size)
        .find(&mut *source, &layout.signature)?
        .ok_or(Error::SignatureNotFound)?;
    debug!("Table signature at {:#x}", anchor);

    let first = anchor.checked_add_signed(layout.anchor_adjust).ok_or_else(|| {
        Error::corrupt(
            RecordField::Prefix,
            anchor,
            format!("anchor adjustment {} overflows", layout.anchor_adjust),
        )
    })?;

    let source = &*source;
    if !is_valid_prefix(source, first, &layout.prefix)? {
        return Err(Error::corrupt(
            RecordField::Prefix,
            first,
            "signature is not followed by a table entry",
        ));
    }

    let mut records = layout.leading_records.clone();
    for record in RecordChain::new(source, layout, first) {
        records.push(record?);
    }

    info!(
        "Extracted {} CRC table entries ({} built in)",
        records.len(),
        layout.leading_records.len()
    );
    Ok(records)
}
