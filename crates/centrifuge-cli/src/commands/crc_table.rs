//! Extract the map CRC table from `engine_client.so`.

use std::path::Path;

use anyhow::{Context, Result};
use centrifuge::{Config, LayoutPreset, Record, extract_crc_table_with, load_layout};
use tracing::info;

use crate::files::{self, Input};

pub fn run(
    config: &Config,
    in_file: &str,
    out_file: &str,
    layout: Option<&Path>,
    preset: LayoutPreset,
    chunk_size: Option<usize>,
    pretty: bool,
) -> Result<()> {
    let layout = match layout {
        Some(path) => load_layout(path)
            .with_context(|| format!("Failed to load table layout {:?}", path))?,
        None => preset.layout(),
    };
    info!("Using table layout {}", layout.version);

    let mut input = Input::open(in_file)?;
    let chunk_size = chunk_size.unwrap_or(config.scan_chunk_size);
    let records = extract_crc_table_with(&mut input, &layout, chunk_size)
        .with_context(|| format!("Failed to extract CRC table from {:?}", in_file))?;

    let json = to_json(&records, pretty)?;
    files::write_output(out_file, json.as_bytes())
}

fn to_json(records: &[Record], pretty: bool) -> Result<String> {
    let mut json = if pretty {
        serde_json::to_string_pretty(records)
    } else {
        serde_json::to_string(records)
    }
    .context("Failed to serialize CRC table")?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_json_keys_and_order() {
        let records = vec![
            Record::new("de_nuke", 3124679106, 157233767),
            Record::new("de_dust2", 1182019033, 1),
        ];
        let json = to_json(&records, false).unwrap();
        assert_eq!(
            json,
            "[{\"map_name\":\"de_nuke\",\"map_crc\":3124679106,\"workshop_id\":157233767},\
             {\"map_name\":\"de_dust2\",\"map_crc\":1182019033,\"workshop_id\":1}]\n"
        );
    }

    #[test]
    fn test_no_output_file_without_signature() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("engine_client.so");
        let output = dir.path().join("crc.json");
        fs::write(&input, vec![0x90u8; 8192]).unwrap();

        let result = run(
            &Config::default(),
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            None,
            LayoutPreset::default(),
            None,
            false,
        );
        assert!(result.is_err());
        assert!(!output.exists());
    }
}
