//! BSP map commands.

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use centrifuge::{Bsp, Lump, Pakfile};
use tracing::info;

use crate::files;

fn load_bsp(in_file: &str) -> Result<Bsp> {
    let data = files::read_input(in_file)?;
    Bsp::read_from(&mut Cursor::new(data))
        .with_context(|| format!("Failed to read BSP data from {:?}", in_file))
}

/// Copy the raw pakfile lump.
pub fn pakfile(in_file: &str, out_file: &str) -> Result<()> {
    let bsp = load_bsp(in_file)?;
    let lump = bsp.raw_lump(Lump::Pakfile);
    info!("Pakfile lump is {} bytes", lump.len());
    files::write_output(out_file, lump)
}

pub fn radar_image(in_file: &str, output_dir: &Path, all_dds: bool) -> Result<()> {
    let bsp = load_bsp(in_file)?;
    let mut pakfile = Pakfile::from_bsp(&bsp).context("Failed to open pakfile")?;

    let (image, info_file) = pakfile
        .extract_radar_overview(output_dir)
        .with_context(|| format!("Failed to extract radar overview to {:?}", output_dir))?;
    eprintln!("Wrote {}", image.display());
    eprintln!("Wrote {}", info_file.display());

    if all_dds {
        let written = pakfile
            .extract_dds_files(output_dir)
            .with_context(|| format!("Failed to extract DDS files to {:?}", output_dir))?;
        eprintln!("Wrote {} DDS files", written.len());
    }
    Ok(())
}

pub fn crc32(in_file: &str) -> Result<()> {
    let bsp = load_bsp(in_file)?;
    println!("{}", bsp.crc32());
    Ok(())
}
