//! Byte layout of the map CRC table in `engine_client.so`
//!
//! The table is not stored as data. The engine compares the loaded map's
//! checksum against each known map in a run of compiled comparisons, and
//! every comparison jumps into a block that loads the map name and workshop
//! id with RIP-relative references.
//!
//! ```text
//!  entry (stride 13)
//!  ┌──────────┬──────────────┬───────┬───────────┐
//!  │ 81 7B 20 │ checksum u32 │ 0F 84 │ delta u32 │   cmp dword [rbx+0x20], crc / jz
//!  └──────────┴──────────────┴───────┴───────────┘
//!   +0         +3             +7      +9
//!
//!  base      = entry + 7
//!  name ptr  @ base + delta + 16   (rel32, resolved against the end of the field)
//!  workshop  @ base + delta + 33   (u32)
//! ```
//!
//! The first map in the table (de_nuke) is compared by a different
//! instruction sequence, so its comparison doubles as the scan signature and
//! the entry itself is carried as a known constant.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

use super::Record;
use crate::error::{Error, Result};

/// `cmp dword [rbx+0x20], 0xBA3ED1C2` followed by the `jz` opcode.
pub const TABLE_SIGNATURE: [u8; 9] = [0x81, 0x7B, 0x20, 0xC2, 0xD1, 0x3E, 0xBA, 0x0F, 0x84];

/// Distance from the signature to the first decodable entry.
pub const ANCHOR_ADJUST: i64 = 11;

/// Distance to the first entry in the shipped release `engine_client.so`,
/// where eight more bytes sit between the signature and the table.
pub const RELEASE_ANCHOR_ADJUST: i64 = 19;

/// Opcode bytes every entry starts with.
pub const ENTRY_PREFIX: [u8; 3] = [0x81, 0x7B, 0x20];

/// Size of one compare-and-jump entry.
pub const ENTRY_STRIDE: u64 = 13;

pub const CHECKSUM_OFFSET: u64 = 3;
pub const JUMP_BASE_OFFSET: u64 = 7;
pub const JUMP_DELTA_OFFSET: u64 = 2;
pub const NAME_POINTER_OFFSET: u64 = 16;
pub const IDENTIFIER_OFFSET: u64 = 33;

/// Name bytes read before truncating at the first NUL.
pub const MAX_NAME_LEN: usize = 64;

/// Width of a rel32 field.
pub const DISPLACEMENT_SIZE: u64 = 4;

/// Description of one binary build's table encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLayout {
    pub version: String,
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
    pub anchor_adjust: i64,
    #[serde(with = "hex_bytes")]
    pub prefix: Vec<u8>,
    pub stride: u64,
    pub checksum_offset: u64,
    pub jump_base_offset: u64,
    pub jump_delta_offset: u64,
    pub name_pointer_offset: u64,
    pub identifier_offset: u64,
    pub max_name_len: usize,
    #[serde(default)]
    pub leading_records: Vec<Record>,
}

impl TableLayout {
    pub fn validate(&self) -> Result<()> {
        if self.signature.is_empty() {
            return Err(Error::InvalidArgument("Table signature is empty".to_string()));
        }
        if self.prefix.is_empty() {
            return Err(Error::InvalidArgument("Entry prefix is empty".to_string()));
        }
        if self.stride == 0 {
            return Err(Error::InvalidArgument("Entry stride must be non-zero".to_string()));
        }
        if self.max_name_len == 0 {
            return Err(Error::InvalidArgument(
                "Maximum name length must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for TableLayout {
    fn default() -> Self {
        builtin_layout()
    }
}

/// Named layouts selectable without a layout file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display, VariantNames)]
pub enum LayoutPreset {
    #[default]
    #[strum(serialize = "csgo-linux64")]
    Linux64,
    #[strum(serialize = "csgo-linux64-release")]
    Linux64Release,
}

impl LayoutPreset {
    pub fn names() -> &'static [&'static str] {
        Self::VARIANTS
    }

    pub fn layout(self) -> TableLayout {
        let mut layout = builtin_layout();
        if self == Self::Linux64Release {
            layout.anchor_adjust = RELEASE_ANCHOR_ADJUST;
        }
        layout.version = self.to_string();
        layout
    }
}

/// Layout of the linux64 `engine_client.so` shipped with CS:GO.
pub fn builtin_layout() -> TableLayout {
    TableLayout {
        version: "csgo-linux64".to_string(),
        signature: TABLE_SIGNATURE.to_vec(),
        anchor_adjust: ANCHOR_ADJUST,
        prefix: ENTRY_PREFIX.to_vec(),
        stride: ENTRY_STRIDE,
        checksum_offset: CHECKSUM_OFFSET,
        jump_base_offset: JUMP_BASE_OFFSET,
        jump_delta_offset: JUMP_DELTA_OFFSET,
        name_pointer_offset: NAME_POINTER_OFFSET,
        identifier_offset: IDENTIFIER_OFFSET,
        max_name_len: MAX_NAME_LEN,
        leading_records: vec![Record::new("de_nuke", 3124679106, 157233767)],
    }
}

pub fn load_layout<P: AsRef<Path>>(path: P) -> Result<TableLayout> {
    let content = fs::read_to_string(&path)?;
    let layout: TableLayout = serde_json::from_str(&content)?;
    layout.validate()?;
    Ok(layout)
}

pub fn save_layout<P: AsRef<Path>>(path: P, layout: &TableLayout) -> Result<()> {
    let content = serde_json::to_string_pretty(layout)?;
    fs::write(path, content)?;
    Ok(())
}

/// Parse hex bytes, either spaced (`"81 7B 20"`) or packed (`"817b20"`).
pub fn parse_hex_pattern(pattern: &str) -> Result<Vec<u8>> {
    let digits: String = pattern.split_whitespace().collect();
    if digits.is_empty() {
        return Err(Error::InvalidArgument("Byte pattern is empty".to_string()));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidArgument(format!(
            "Byte pattern '{}' contains non-hex characters",
            pattern
        )));
    }
    if digits.len() % 2 != 0 {
        return Err(Error::InvalidArgument(format!(
            "Byte pattern '{}' has an odd number of hex digits",
            pattern
        )));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16).map_err(|e| {
                Error::InvalidArgument(format!("Invalid byte '{}': {}", &digits[i..i + 2], e))
            })
        })
        .collect()
}

pub fn format_hex_pattern(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

mod hex_bytes {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_hex_pattern(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        super::parse_hex_pattern(&pattern).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_hex_pattern_spaced_and_packed() {
        let spaced = parse_hex_pattern("81 7B 20 C2 D1 3E BA 0F 84").unwrap();
        let packed = parse_hex_pattern("817b20c2d13eba0f84").unwrap();
        assert_eq!(spaced, TABLE_SIGNATURE.to_vec());
        assert_eq!(packed, TABLE_SIGNATURE.to_vec());
    }

    #[test]
    fn test_parse_hex_pattern_rejects_bad_input() {
        assert!(matches!(
            parse_hex_pattern("   "),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_hex_pattern("81 7"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_hex_pattern("81 ?? 20"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_hex_pattern("8é"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_format_hex_pattern() {
        assert_eq!(format_hex_pattern(&ENTRY_PREFIX), "81 7B 20");
        assert_eq!(format_hex_pattern(&[]), "");
    }

    #[test]
    fn test_builtin_layout_leading_record() {
        let layout = builtin_layout();
        assert!(layout.validate().is_ok());
        assert_eq!(
            layout.leading_records,
            vec![Record::new("de_nuke", 3124679106, 157233767)]
        );
        // The leading record's checksum is the immediate in the signature.
        assert_eq!(
            u32::from_le_bytes([
                layout.signature[3],
                layout.signature[4],
                layout.signature[5],
                layout.signature[6]
            ]),
            3124679106
        );
    }

    #[test]
    fn test_layout_presets() {
        assert_eq!(LayoutPreset::default().layout(), builtin_layout());

        let preset: LayoutPreset = "csgo-linux64-release".parse().unwrap();
        assert_eq!(preset, LayoutPreset::Linux64Release);
        let layout = preset.layout();
        assert_eq!(layout.version, "csgo-linux64-release");
        assert_eq!(layout.anchor_adjust, RELEASE_ANCHOR_ADJUST);
        assert_eq!(layout.signature, builtin_layout().signature);
        assert_eq!(layout.leading_records, builtin_layout().leading_records);

        assert!("csgo-win32".parse::<LayoutPreset>().is_err());
        assert_eq!(
            LayoutPreset::names(),
            &["csgo-linux64", "csgo-linux64-release"]
        );
    }

    #[test]
    fn test_validate_rejects_degenerate_layouts() {
        let mut layout = builtin_layout();
        layout.stride = 0;
        assert!(matches!(layout.validate(), Err(Error::InvalidArgument(_))));

        let mut layout = builtin_layout();
        layout.signature.clear();
        assert!(matches!(layout.validate(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_layout_save_and_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let layout = builtin_layout();

        save_layout(temp_file.path(), &layout).unwrap();
        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("\"81 7B 20 C2 D1 3E BA 0F 84\""));

        let loaded = load_layout(temp_file.path()).unwrap();
        assert_eq!(loaded, layout);
    }

    #[test]
    fn test_load_layout_without_leading_records() {
        let json = r#"{
            "version": "custom",
            "signature": "817b20c2d13eba0f84",
            "anchor_adjust": 19,
            "prefix": "81 7b 20",
            "stride": 13,
            "checksum_offset": 3,
            "jump_base_offset": 7,
            "jump_delta_offset": 2,
            "name_pointer_offset": 16,
            "identifier_offset": 33,
            "max_name_len": 64
        }"#;
        let layout: TableLayout = serde_json::from_str(json).unwrap();
        assert_eq!(layout.anchor_adjust, 19);
        assert!(layout.leading_records.is_empty());
        assert_eq!(layout.prefix, ENTRY_PREFIX.to_vec());
    }
}
