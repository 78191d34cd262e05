//! Source engine map (`.bsp`) container
//!
//! Only the header is parsed: lumps are exposed as raw byte slices.
//!
//! ```text
//! 0x000  "VBSP"
//! 0x004  version        i32
//! 0x008  lumps[64]      { offset i32, length i32, version i32, fourcc [u8; 4] }
//! 0x408  map revision   i32
//! ```

mod pakfile;

pub use pakfile::{Pakfile, RadarOverview};

use std::fs;
use std::io::Read;
use std::path::Path;

use strum::{Display, FromRepr, IntoStaticStr};
use tracing::debug;

use crate::error::{Error, Result};

pub const HEADER_LUMPS: usize = 64;

const IDENT: [u8; 4] = *b"VBSP";
const LUMP_DESCRIPTOR_SIZE: usize = 16;
const LUMPS_OFFSET: usize = 8;
const HEADER_SIZE: usize = LUMPS_OFFSET + HEADER_LUMPS * LUMP_DESCRIPTOR_SIZE + 4;

/// Lumps this crate reads by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr, Display)]
#[repr(u8)]
pub enum Lump {
    #[strum(serialize = "entities")]
    Entities = 0,
    #[strum(serialize = "planes")]
    Planes = 1,
    #[strum(serialize = "texdata")]
    TexData = 2,
    #[strum(serialize = "vertexes")]
    Vertexes = 3,
    #[strum(serialize = "visibility")]
    Visibility = 4,
    #[strum(serialize = "nodes")]
    Nodes = 5,
    #[strum(serialize = "texinfo")]
    TexInfo = 6,
    #[strum(serialize = "faces")]
    Faces = 7,
    #[strum(serialize = "lighting")]
    Lighting = 8,
    #[strum(serialize = "models")]
    Models = 14,
    #[strum(serialize = "game lump")]
    GameLump = 35,
    #[strum(serialize = "pakfile")]
    Pakfile = 40,
}

impl Lump {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index).ok().and_then(Self::from_repr)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LumpInfo {
    pub offset: u32,
    pub length: u32,
    pub version: i32,
    pub four_cc: [u8; 4],
}

/// A parsed map file holding its full contents.
#[derive(Debug, Clone)]
pub struct Bsp {
    data: Vec<u8>,
    version: i32,
    map_revision: i32,
    lumps: Vec<LumpInfo>,
}

impl Bsp {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::InvalidBsp(format!(
                "file is {} bytes, header needs {}",
                data.len(),
                HEADER_SIZE
            )));
        }
        if data[0..4] != IDENT {
            return Err(Error::InvalidBsp(format!(
                "bad ident {:02X?}, expected \"VBSP\"",
                &data[0..4]
            )));
        }

        let version = read_i32(&data, 4);
        let map_revision = read_i32(&data, HEADER_SIZE - 4);

        let mut lumps = Vec::with_capacity(HEADER_LUMPS);
        for index in 0..HEADER_LUMPS {
            let at = LUMPS_OFFSET + index * LUMP_DESCRIPTOR_SIZE;
            let offset = read_i32(&data, at);
            let length = read_i32(&data, at + 4);
            let (Ok(offset), Ok(length)) = (u32::try_from(offset), u32::try_from(length)) else {
                return Err(Error::InvalidBsp(format!(
                    "lump {} has negative offset or length ({}, {})",
                    index, offset, length
                )));
            };

            let end = u64::from(offset) + u64::from(length);
            if length > 0 && end > data.len() as u64 {
                return Err(Error::LumpOutOfBounds {
                    lump: index,
                    offset: u64::from(offset),
                    length: u64::from(length),
                    file_len: data.len() as u64,
                });
            }

            lumps.push(LumpInfo {
                offset,
                length,
                version: read_i32(&data, at + 8),
                four_cc: [data[at + 12], data[at + 13], data[at + 14], data[at + 15]],
            });
        }

        debug!(
            "Parsed BSP header: version={}, revision={}, {} bytes",
            version,
            map_revision,
            data.len()
        );

        Ok(Self {
            data,
            version,
            map_revision,
            lumps,
        })
    }

    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_bytes(fs::read(path)?)
    }

    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn map_revision(&self) -> i32 {
        self.map_revision
    }

    pub fn lump_info(&self, lump: Lump) -> &LumpInfo {
        &self.lumps[lump.index()]
    }

    pub fn lumps(&self) -> &[LumpInfo] {
        &self.lumps
    }

    pub fn raw_lump(&self, lump: Lump) -> &[u8] {
        self.lump_bytes(lump.index())
    }

    pub fn raw_lump_at(&self, index: usize) -> Result<&[u8]> {
        if index >= HEADER_LUMPS {
            return Err(Error::InvalidArgument(format!(
                "lump index {} out of range (0..{})",
                index, HEADER_LUMPS
            )));
        }
        Ok(self.lump_bytes(index))
    }

    /// Map checksum as computed by the engine: CRC-32 over every lump
    /// except the entities lump, in lump order.
    pub fn crc32(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        for index in 0..HEADER_LUMPS {
            if index == Lump::Entities.index() {
                continue;
            }
            hasher.update(self.lump_bytes(index));
        }
        hasher.finalize()
    }

    fn lump_bytes(&self, index: usize) -> &[u8] {
        let info = &self.lumps[index];
        if info.length == 0 {
            return &[];
        }
        // Bounds checked in from_bytes
        let start = info.offset as usize;
        &self.data[start..start + info.length as usize]
    }
}

fn read_i32(data: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}
