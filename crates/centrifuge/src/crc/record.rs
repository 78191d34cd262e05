use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

/// One entry of the engine's official map table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "map_name")]
    pub name: String,
    #[serde(rename = "map_crc")]
    pub checksum: u32,
    #[serde(rename = "workshop_id")]
    pub identifier: u32,
}

impl Record {
    pub fn new(name: impl Into<String>, checksum: u32, identifier: u32) -> Self {
        Self {
            name: name.into(),
            checksum,
            identifier,
        }
    }
}

/// The part of a table entry a read was resolving when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum RecordField {
    #[strum(serialize = "validity prefix")]
    Prefix,
    #[strum(serialize = "checksum")]
    Checksum,
    #[strum(serialize = "jump delta")]
    JumpDelta,
    #[strum(serialize = "name pointer")]
    NamePointer,
    #[strum(serialize = "name")]
    Name,
    #[strum(serialize = "identifier")]
    Identifier,
}
