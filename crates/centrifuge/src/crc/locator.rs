//! Streaming signature scan

use std::io::{self, Read};

use memchr::memmem;
use tracing::debug;

use crate::error::{Error, Result};

/// Bytes requested from the reader per scan step.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Finds the first occurrence of a byte pattern in a forward-only stream.
///
/// The scan buffer holds one chunk plus `pattern.len() - 1` bytes carried
/// over from the previous step, so a match straddling two reads is still
/// seen. Memory use is bounded by the chunk size regardless of source size.
#[derive(Debug, Clone, Copy)]
pub struct PatternLocator {
    chunk_size: usize,
}

impl Default for PatternLocator {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl PatternLocator {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Return the stream offset of the first match, or `None` at end of stream.
    pub fn find<R: Read + ?Sized>(&self, reader: &mut R, pattern: &[u8]) -> Result<Option<u64>> {
        if pattern.is_empty() {
            return Err(Error::InvalidArgument("Search pattern is empty".to_string()));
        }

        // A chunk never holds less than one full pattern.
        let chunk_size = self.chunk_size.max(pattern.len());
        if chunk_size != self.chunk_size {
            debug!(
                "Chunk size {} is smaller than the {}-byte pattern, using {}",
                self.chunk_size,
                pattern.len(),
                chunk_size
            );
        }

        let finder = memmem::Finder::new(pattern);
        let tail_len = pattern.len() - 1;
        let mut buffer = vec![0u8; chunk_size + tail_len];
        let mut carried = 0usize;
        let mut consumed: u64 = 0;

        loop {
            let n = match reader.read(&mut buffer[carried..]) {
                Ok(0) => {
                    debug!("Pattern not found in {:#x} bytes", consumed);
                    return Ok(None);
                }
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            let filled = carried + n;
            // Stream offset of buffer[0]
            let window_start = consumed - carried as u64;

            if let Some(idx) = finder.find(&buffer[..filled]) {
                let offset = window_start + idx as u64;
                debug!("Pattern found at {:#x}", offset);
                return Ok(Some(offset));
            }

            let keep = tail_len.min(filled);
            buffer.copy_within(filled - keep..filled, 0);
            carried = keep;
            consumed += n as u64;
        }
    }
}

/// Scan `reader` with the default chunk size.
pub fn find_pattern<R: Read + ?Sized>(reader: &mut R, pattern: &[u8]) -> Result<Option<u64>> {
    PatternLocator::default().find(reader, pattern)
}
