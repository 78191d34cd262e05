//! Command line definition.

use std::path::PathBuf;

use centrifuge::LayoutPreset;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "centrifuge")]
#[command(about = "Extract interesting data from CS:GO game files and maps", version)]
pub struct Cli {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(short, long, global = true, env = "CENTRIFUGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract the official map CRC table from engine_client.so as JSON
    #[command(alias = "crc")]
    CrcTable {
        /// engine_client.so to read, `-` for stdin
        #[arg(short, long, default_value = "-")]
        in_file: String,

        /// JSON output file, `-` for stdout
        #[arg(short, long, default_value = "-")]
        out_file: String,

        /// JSON table layout for a different client build
        #[arg(long, conflicts_with = "layout_preset")]
        layout: Option<PathBuf>,

        /// Built-in table layout to use
        #[arg(long, value_parser = parse_layout_preset)]
        layout_preset: Option<LayoutPreset>,

        /// Bytes read per scan step (overrides config)
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Work with BSP map files
    #[command(subcommand)]
    Bsp(BspCommand),

    /// Download a file from the Steam workshop
    #[command(alias = "dl")]
    Download {
        /// Steam workshop file id
        #[arg(short = 'w', long)]
        workshop_file_id: u64,

        /// Output file, `-` for stdout
        #[arg(short, long, default_value = "-", alias = "target-file")]
        out_file: String,

        /// Steam Web API base URL (overrides config)
        #[arg(long, env = "CENTRIFUGE_STEAM_API_URL")]
        steam_api_url: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum BspCommand {
    /// Extract the pakfile zip archive
    #[command(alias = "pak")]
    Pakfile {
        /// BSP file to read, `-` for stdin
        #[arg(short, long, default_value = "-", alias = "bsp-file")]
        in_file: String,

        /// Output zip file, `-` for stdout
        #[arg(short, long, default_value = "-", alias = "target-file")]
        out_file: String,
    },

    /// Extract the radar overview image (.dds) and its info file (.txt)
    #[command(alias = "radar")]
    RadarImage {
        /// BSP file to read, `-` for stdin
        #[arg(short, long, default_value = "-", alias = "bsp-file")]
        in_file: String,

        /// Directory to write to (defaults to `overview_dir` from config)
        #[arg(short = 'd', long, alias = "target-dir")]
        output_dir: Option<PathBuf>,

        /// Also extract every other .dds texture in the pakfile
        #[arg(long)]
        all_dds: bool,
    },

    /// Print the map checksum the engine compares against the CRC table
    Crc32 {
        /// BSP file to read, `-` for stdin
        #[arg(short, long, default_value = "-", alias = "bsp-file")]
        in_file: String,
    },
}

fn parse_layout_preset(name: &str) -> Result<LayoutPreset, String> {
    name.parse().map_err(|_| {
        format!(
            "unknown layout preset '{}' (expected one of: {})",
            name,
            LayoutPreset::names().join(", ")
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_crc_table_defaults_to_stdio() {
        let cli = Cli::try_parse_from(["centrifuge", "crc"]).unwrap();
        match cli.command {
            Command::CrcTable {
                in_file,
                out_file,
                layout,
                layout_preset,
                pretty,
                ..
            } => {
                assert_eq!(in_file, "-");
                assert_eq!(out_file, "-");
                assert!(layout.is_none());
                assert!(layout_preset.is_none());
                assert!(!pretty);
            }
            _ => panic!("expected crc-table"),
        }
    }

    #[test]
    fn test_crc_table_layout_preset() {
        let cli =
            Cli::try_parse_from(["centrifuge", "crc", "--layout-preset", "csgo-linux64-release"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Command::CrcTable {
                layout_preset: Some(LayoutPreset::Linux64Release),
                ..
            }
        ));

        let err = Cli::try_parse_from(["centrifuge", "crc", "--layout-preset", "csgo-win32"])
            .err()
            .unwrap();
        assert!(err.to_string().contains("csgo-linux64-release"));

        assert!(
            Cli::try_parse_from([
                "centrifuge",
                "crc",
                "--layout",
                "layout.json",
                "--layout-preset",
                "csgo-linux64",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_bsp_aliases() {
        let cli = Cli::try_parse_from([
            "centrifuge",
            "bsp",
            "radar",
            "--bsp-file",
            "de_cache.bsp",
            "--target-dir",
            "radar",
        ])
        .unwrap();
        match cli.command {
            Command::Bsp(BspCommand::RadarImage {
                in_file,
                output_dir,
                all_dds,
            }) => {
                assert_eq!(in_file, "de_cache.bsp");
                assert_eq!(output_dir, Some(PathBuf::from("radar")));
                assert!(!all_dds);
            }
            _ => panic!("expected bsp radar-image"),
        }
    }

    #[test]
    fn test_download_requires_id() {
        assert!(Cli::try_parse_from(["centrifuge", "dl"]).is_err());

        let cli =
            Cli::try_parse_from(["centrifuge", "-v", "dl", "-w", "125438255", "-o", "map.bsp"])
                .unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Download {
                workshop_file_id: 125438255,
                ..
            }
        ));
    }
}
