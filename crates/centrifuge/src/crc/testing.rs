//! Builder for synthetic `engine_client` images used in tests.

use std::io::{self, Cursor, Read};
use std::ops::Range;

use super::layout::{ANCHOR_ADJUST, ENTRY_PREFIX, TABLE_SIGNATURE};
use crate::source::ReadAt;

pub struct TableImage {
    data: Vec<u8>,
}

impl TableImage {
    pub fn new(filler: usize) -> Self {
        Self {
            data: vec![0xCC; filler],
        }
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn push(&mut self, bytes: &[u8]) -> u64 {
        let offset = self.len();
        self.data.extend_from_slice(bytes);
        offset
    }

    pub fn patch_u32(&mut self, offset: u64, value: u32) {
        let offset = offset as usize;
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Signature plus the bytes up to the first entry.
    pub fn signature(&mut self) -> u64 {
        self.signature_with_anchor(ANCHOR_ADJUST)
    }

    /// Signature with the first entry `anchor_adjust` bytes after its start.
    pub fn signature_with_anchor(&mut self, anchor_adjust: i64) -> u64 {
        let offset = self.push(&TABLE_SIGNATURE);
        let gap = anchor_adjust as usize - TABLE_SIGNATURE.len();
        self.push(&vec![0x00; gap]);
        offset
    }

    /// `cmp dword [rbx+0x20], checksum` / `jz` with the delta left at zero.
    pub fn entry(&mut self, checksum: u32) -> u64 {
        let offset = self.push(&ENTRY_PREFIX);
        self.push(&checksum.to_le_bytes());
        self.push(&[0x0F, 0x84]);
        self.push(&[0x00; 4]);
        offset
    }

    /// `xor r13d, r13d`, which ends the table.
    pub fn terminator(&mut self) -> u64 {
        self.push(&[0x45, 0x31, 0xED])
    }

    pub fn target(&mut self, entry: u64, name: &[u8], identifier: u32) -> u64 {
        let mut name = name.to_vec();
        name.push(0);
        self.target_raw(entry, &name, identifier)
    }

    /// Append a jump block for `entry` and point the entry's delta at it.
    ///
    /// Block layout: 16 filler bytes, name rel32, 13 filler bytes,
    /// identifier, then the name bytes as given.
    pub fn target_raw(&mut self, entry: u64, name: &[u8], identifier: u32) -> u64 {
        let block = self.len();
        self.patch_u32(entry + 9, (block - (entry + 7)) as u32);

        self.push(&[0xCC; 16]);
        let name_ptr_addr = self.len();
        let name_addr = block + 37;
        self.push(&((name_addr - (name_ptr_addr + 4)) as u32).to_le_bytes());
        self.push(&[0xCC; 13]);
        self.push(&identifier.to_le_bytes());
        self.push(name);
        block
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

/// In-memory source whose positional reads fail inside `fail`.
pub struct FailingSource {
    inner: Cursor<Vec<u8>>,
    fail: Range<u64>,
}

impl FailingSource {
    pub fn new(data: Vec<u8>, fail: Range<u64>) -> Self {
        Self {
            inner: Cursor::new(data),
            fail,
        }
    }
}

impl Read for FailingSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl ReadAt for FailingSource {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let end = offset + buf.len() as u64;
        if offset < self.fail.end && self.fail.start < end {
            return Err(io::Error::other("injected read failure"));
        }
        self.inner.read_at(offset, buf)
    }
}
