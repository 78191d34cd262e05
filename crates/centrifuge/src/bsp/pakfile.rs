//! Embedded zip archive (pakfile lump)

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};
use zip::ZipArchive;

use super::{Bsp, Lump};
use crate::error::{Error, Result};

static OVERVIEW_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^resource/overviews/([^./]+)\.txt$").expect("overview pattern is valid")
});

/// Radar image and overview description shipped inside a map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadarOverview {
    pub map_name: String,
    /// `resource/overviews/<map>_radar.dds`
    pub image: Vec<u8>,
    /// `resource/overviews/<map>.txt`
    pub info: Vec<u8>,
}

impl RadarOverview {
    pub fn image_file_name(&self) -> String {
        format!("{}_radar.dds", self.map_name)
    }

    pub fn info_file_name(&self) -> String {
        format!("{}.txt", self.map_name)
    }

    /// Write both files into `dir`, returning their paths.
    pub fn write_to_dir(&self, dir: &Path) -> Result<(PathBuf, PathBuf)> {
        fs::create_dir_all(dir)?;
        let image_path = dir.join(self.image_file_name());
        let info_path = dir.join(self.info_file_name());
        fs::write(&image_path, &self.image)?;
        fs::write(&info_path, &self.info)?;
        Ok((image_path, info_path))
    }
}

pub struct Pakfile<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> Pakfile<'a> {
    pub fn from_bytes(data: &'a [u8]) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(data))?;
        debug!("Pakfile holds {} entries", archive.len());
        Ok(Self { archive })
    }

    pub fn from_bsp(bsp: &'a Bsp) -> Result<Self> {
        let lump = bsp.raw_lump(Lump::Pakfile);
        if lump.is_empty() {
            return Err(Error::InvalidBsp("map has no pakfile lump".to_string()));
        }
        Self::from_bytes(lump)
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.archive.file_names()
    }

    /// Map name taken from the first `resource/overviews/<name>.txt` entry in
    /// archive order.
    pub fn map_name(&self) -> Result<String> {
        (0..self.archive.len())
            .filter_map(|i| self.archive.name_for_index(i))
            .find_map(|name| {
                OVERVIEW_PATH
                    .captures(name)
                    .map(|caps| caps[1].to_string())
            })
            .ok_or(Error::RadarOverviewNotFound)
    }

    /// Read an entry by path, ignoring ASCII case and slash direction.
    pub fn read_file(&mut self, path: &str) -> Result<Option<Vec<u8>>> {
        let wanted = normalize(path);
        let Some(index) = (0..self.archive.len()).find(|&i| {
            self.archive
                .name_for_index(i)
                .is_some_and(|name| normalize(name) == wanted)
        }) else {
            return Ok(None);
        };

        // Declared sizes are untrusted
        let mut file = self.archive.by_index(index)?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        Ok(Some(contents))
    }

    /// Copy one entry to `dest`. Returns false when the entry is missing.
    pub fn extract_file(&mut self, path: &str, dest: &Path) -> Result<bool> {
        match self.read_file(path)? {
            Some(contents) => {
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(dest, contents)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn radar_overview(&mut self) -> Result<RadarOverview> {
        let map_name = self.map_name()?;
        let image = self
            .read_file(&format!("resource/overviews/{}_radar.dds", map_name))?
            .ok_or(Error::RadarOverviewNotFound)?;
        let info = self
            .read_file(&format!("resource/overviews/{}.txt", map_name))?
            .ok_or(Error::RadarOverviewNotFound)?;

        debug!(
            "Radar overview for {}: image {} bytes, info {} bytes",
            map_name,
            image.len(),
            info.len()
        );
        Ok(RadarOverview {
            map_name,
            image,
            info,
        })
    }

    /// Write `<map>_radar.dds` and `<map>.txt` into `dir`, returning their paths.
    pub fn extract_radar_overview(&mut self, dir: &Path) -> Result<(PathBuf, PathBuf)> {
        let overview = self.radar_overview()?;
        let paths = overview.write_to_dir(dir)?;
        info!(
            "Extracted radar overview for {} to {}",
            overview.map_name,
            dir.display()
        );
        Ok(paths)
    }

    /// Write every `.dds` entry into `dir` under its base name.
    ///
    /// Entries sharing a base name overwrite each other in archive order.
    pub fn extract_dds_files(&mut self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();

        for index in 0..self.archive.len() {
            let mut file = self.archive.by_index(index)?;
            if file.is_dir() || !file.name().to_ascii_lowercase().ends_with(".dds") {
                continue;
            }
            let Some(base) = base_name(file.name()) else {
                continue;
            };

            let dest = dir.join(base);
            let mut out = fs::File::create(&dest)?;
            std::io::copy(&mut file, &mut out)?;
            written.push(dest);
        }

        info!("Extracted {} DDS files to {}", written.len(), dir.display());
        Ok(written)
    }
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/").to_ascii_lowercase()
}

fn base_name(path: &str) -> Option<&str> {
    path.rsplit(['/', '\\']).next().filter(|name| !name.is_empty())
}
