mod cli;
mod commands;
mod files;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use centrifuge::Config;
use cli::{BspCommand, Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `-` outputs stay clean
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(format!("centrifuge={}", level).parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config =
        Config::load_or_default(cli.config.as_deref()).context("Failed to load config")?;
    debug!("Config: {:?}", config);

    match cli.command {
        Command::CrcTable {
            in_file,
            out_file,
            layout,
            layout_preset,
            chunk_size,
            pretty,
        } => commands::crc_table::run(
            &config,
            &in_file,
            &out_file,
            layout.as_deref(),
            layout_preset.unwrap_or_default(),
            chunk_size,
            pretty,
        ),
        Command::Bsp(BspCommand::Pakfile { in_file, out_file }) => {
            commands::bsp::pakfile(&in_file, &out_file)
        }
        Command::Bsp(BspCommand::RadarImage {
            in_file,
            output_dir,
            all_dds,
        }) => {
            let output_dir = output_dir.unwrap_or_else(|| config.overview_dir.clone());
            commands::bsp::radar_image(&in_file, &output_dir, all_dds)
        }
        Command::Bsp(BspCommand::Crc32 { in_file }) => commands::bsp::crc32(&in_file),
        Command::Download {
            workshop_file_id,
            out_file,
            steam_api_url,
        } => {
            if let Some(url) = steam_api_url {
                config.steam_api_url = url;
            }
            commands::download::run(&config, workshop_file_id, &out_file)
        }
    }
}
