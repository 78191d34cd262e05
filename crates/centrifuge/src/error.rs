use thiserror::Error;

use crate::crc::RecordField;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("CRC table signature not found")]
    SignatureNotFound,

    #[error("Corrupt table data: failed to read {field} at offset {offset:#x}: {reason}")]
    CorruptData {
        field: RecordField,
        offset: u64,
        reason: String,
    },

    #[error("Invalid BSP data: {0}")]
    InvalidBsp(String),

    #[error("Lump {lump} ({offset:#x}+{length:#x}) extends past end of {file_len}-byte BSP")]
    LumpOutOfBounds {
        lump: usize,
        offset: u64,
        length: u64,
        file_len: u64,
    },

    #[error("Pakfile error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Radar overview not found in pakfile")]
    RadarOverviewNotFound,

    #[cfg(feature = "api")]
    #[error("HTTP error: {0}")]
    Http(#[from] ureq::Error),

    #[error("Workshop item not found: {0}")]
    WorkshopItemNotFound(u64),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    pub(crate) fn corrupt(field: RecordField, offset: u64, reason: impl ToString) -> Self {
        Error::CorruptData {
            field,
            offset,
            reason: reason.to_string(),
        }
    }
}
