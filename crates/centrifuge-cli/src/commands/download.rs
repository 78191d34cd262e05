//! Download a workshop item.

use anyhow::{Context, Result};
use centrifuge::{Config, WorkshopClient};

use crate::files;

pub fn run(config: &Config, workshop_file_id: u64, out_file: &str) -> Result<()> {
    let client = WorkshopClient::new(config);

    let written = files::stream_output(out_file, |writer| {
        client
            .download(workshop_file_id, writer)
            .with_context(|| format!("Failed to download workshop item {}", workshop_file_id))
    })?;

    eprintln!("Downloaded {} bytes", written);
    Ok(())
}
