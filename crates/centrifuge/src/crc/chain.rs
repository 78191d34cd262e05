//! Table entry decoding
//!
//! Entries are decoded statically: every address the engine would compute
//! at runtime via RIP-relative operands is recomputed here from the
//! displacement fields, with checked arithmetic so malformed input surfaces
//! as `CorruptData` rather than a wrapped address.

use std::iter::FusedIterator;

use tracing::debug;

use super::layout::{DISPLACEMENT_SIZE, TableLayout};
use super::{Record, RecordField};
use crate::error::{Error, Result};
use crate::source::ReadAt;

/// Check whether `offset` starts with the entry prefix.
///
/// A read that cannot be satisfied (past end of source) is `CorruptData`:
/// the table ran into the end of the file without a terminating instruction.
pub fn is_valid_prefix<S: ReadAt + ?Sized>(source: &S, offset: u64, prefix: &[u8]) -> Result<bool> {
    let bytes = source
        .read_bytes(offset, prefix.len())
        .map_err(|e| Error::corrupt(RecordField::Prefix, offset, e))?;
    Ok(bytes == prefix)
}

/// Lazy sequence of table entries starting at a candidate offset.
///
/// Each step re-checks the entry prefix, decodes, and advances by the
/// layout stride. The sequence ends at the first offset without the prefix;
/// after an error it yields nothing further.
pub struct RecordChain<'a, S: ReadAt + ?Sized> {
    source: &'a S,
    layout: &'a TableLayout,
    cursor: Option<u64>,
}

impl<'a, S: ReadAt + ?Sized> RecordChain<'a, S> {
    pub fn new(source: &'a S, layout: &'a TableLayout, start: u64) -> Self {
        Self {
            source,
            layout,
            cursor: Some(start),
        }
    }

    /// Offset of the next candidate, if the chain has not ended.
    pub fn position(&self) -> Option<u64> {
        self.cursor
    }
}

impl<S: ReadAt + ?Sized> Iterator for RecordChain<'_, S> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.cursor?;

        match is_valid_prefix(self.source, start, &self.layout.prefix) {
            Ok(true) => {}
            Ok(false) => {
                debug!("No table entry at {:#x}, end of table", start);
                self.cursor = None;
                return None;
            }
            Err(e) => {
                self.cursor = None;
                return Some(Err(e));
            }
        }

        let result = decode_record(self.source, self.layout, start);
        self.cursor = match result {
            Ok(_) => start.checked_add(self.layout.stride),
            Err(_) => None,
        };
        Some(result)
    }
}

impl<S: ReadAt + ?Sized> FusedIterator for RecordChain<'_, S> {}

/// Decode the entry at `start`. The prefix is assumed to be checked.
pub fn decode_record<S: ReadAt + ?Sized>(
    source: &S,
    layout: &TableLayout,
    start: u64,
) -> Result<Record> {
    let checksum_addr = offset_add(start, layout.checksum_offset, RecordField::Checksum)?;
    let checksum = read_u32(source, checksum_addr, RecordField::Checksum)?;

    let base = offset_add(start, layout.jump_base_offset, RecordField::JumpDelta)?;
    let delta_addr = offset_add(base, layout.jump_delta_offset, RecordField::JumpDelta)?;
    let jump_delta = read_i32(source, delta_addr, RecordField::JumpDelta)?;
    let jump_base = base.checked_add_signed(i64::from(jump_delta)).ok_or_else(|| {
        Error::corrupt(
            RecordField::JumpDelta,
            delta_addr,
            format!("delta {} from {:#x} leaves the address space", jump_delta, base),
        )
    })?;

    let name_ptr_addr =
        offset_add(jump_base, layout.name_pointer_offset, RecordField::NamePointer)?;
    let name_ptr = read_i32(source, name_ptr_addr, RecordField::NamePointer)?;
    let name_addr = name_ptr_addr
        .checked_add(DISPLACEMENT_SIZE)
        .and_then(|next| next.checked_add_signed(i64::from(name_ptr)))
        .ok_or_else(|| {
            Error::corrupt(
                RecordField::NamePointer,
                name_ptr_addr,
                format!("pointer {} leaves the address space", name_ptr),
            )
        })?;
    let name = read_name(source, name_addr, layout.max_name_len)?;

    let identifier_addr =
        offset_add(jump_base, layout.identifier_offset, RecordField::Identifier)?;
    let identifier = read_u32(source, identifier_addr, RecordField::Identifier)?;

    debug!(
        "Entry at {:#x}: {} crc={} workshop_id={}",
        start, name, checksum, identifier
    );

    Ok(Record {
        name,
        checksum,
        identifier,
    })
}

/// Read a NUL-terminated name of at most `max_len` bytes.
///
/// A name with no NUL in its first `max_len` bytes is kept whole. A name
/// cut short by the end of the source without a NUL is corrupt.
fn read_name<S: ReadAt + ?Sized>(source: &S, addr: u64, max_len: usize) -> Result<String> {
    let bytes = source
        .read_up_to(addr, max_len)
        .map_err(|e| Error::corrupt(RecordField::Name, addr, e))?;

    let len = match bytes.iter().position(|&b| b == 0) {
        Some(len) => len,
        None if bytes.len() == max_len => max_len,
        None => {
            return Err(Error::corrupt(
                RecordField::Name,
                addr,
                format!("unterminated name after {} bytes at end of source", bytes.len()),
            ));
        }
    };

    Ok(String::from_utf8_lossy(&bytes[..len]).into_owned())
}

fn offset_add(addr: u64, offset: u64, field: RecordField) -> Result<u64> {
    addr.checked_add(offset)
        .ok_or_else(|| Error::corrupt(field, addr, format!("offset {:#x} overflows", offset)))
}

fn read_u32<S: ReadAt + ?Sized>(source: &S, addr: u64, field: RecordField) -> Result<u32> {
    source
        .read_u32_le(addr)
        .map_err(|e| Error::corrupt(field, addr, e))
}

fn read_i32<S: ReadAt + ?Sized>(source: &S, addr: u64, field: RecordField) -> Result<i32> {
    source
        .read_i32_le(addr)
        .map_err(|e| Error::corrupt(field, addr, e))
}
