use std::path::Path;

use log::{debug, info, warn};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::section::SectionFlags;
use crate::sections::Sections;

/// Layout of the combined output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutFmt {
    /// Bytes only.
    #[default]
    Raw,
    /// Bytes prefixed with the little-endian load address.
    Prg,
}

/// A section written to a file of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Image {
    pub bytes: Vec<u8>,
    pub side_files: Vec<SideFile>,
}

const BANK_WINDOW: std::ops::Range<i64> = 0xa000..0xc000;
const BANK_SIZE: i64 = 0x2000;

fn header(addr: i32) -> [u8; 2] {
    [(addr & 0xff) as u8, ((addr >> 8) & 0xff) as u8]
}

// Position of a section in the combined stream. Banked sections must sit
// inside the bank window and are stacked by bank number.
fn file_offset(name: &str, start: i32, len: usize) -> Result<i64> {
    let bank = (start >> 16) as i64;
    if bank <= 0 {
        return Ok(start as i64);
    }
    let low = (start & 0xffff) as i64;
    if low >= BANK_WINDOW.start && low + len as i64 <= BANK_WINDOW.end {
        Ok(bank * BANK_SIZE + low)
    } else {
        Err(Error::IllegalAddress(name.to_string(), start))
    }
}

impl Sections {
    /// Build the output image. `None` when no bytes were emitted.
    pub fn image(&self, fmt: OutFmt) -> Result<Option<Image>> {
        let mut filtered: Vec<_> = self.iter().filter(|s| !s.data.is_empty()).collect();
        if filtered.is_empty() {
            warn!("No sections");
            return Ok(None);
        }
        debug!("{} data sections", filtered.len());
        filtered.sort_by_key(|s| s.start);

        let (Some(first), Some(last)) = (filtered.first(), filtered.last()) else {
            return Ok(None);
        };
        let start = first.start;
        if last.end() <= start as i64 {
            warn!("No code generated");
            return Ok(None);
        }

        let mut image = Image::default();
        if fmt == OutFmt::Prg {
            image.bytes.extend(header(start));
        }

        let mut last_end: i64 = -1;
        for s in filtered {
            if (s.start as i64) < last_end {
                return Err(Error::OverlapsPrevious(s.name.clone()));
            }
            if s.flags.contains(SectionFlags::WRITE_TO_DISK) {
                let mut bytes = header(s.start).to_vec();
                bytes.extend(&s.data);
                image.side_files.push(SideFile {
                    name: s.name.clone(),
                    bytes,
                });
                continue;
            }
            if s.flags.contains(SectionFlags::NO_STORAGE) {
                continue;
            }

            let offset = file_offset(&s.name, s.start, s.len())?;
            if last_end >= 0 && offset > last_end {
                let pad = (offset - last_end) as usize;
                image.bytes.resize(image.bytes.len() + pad, 0);
            }
            last_end = offset + s.len() as i64;
            image.bytes.extend(&s.data);
        }
        Ok(Some(image))
    }

    /// Write the image to `path`. Side files go next to it.
    pub fn write(&self, path: &Path, fmt: OutFmt) -> Result<()> {
        let Some(image) = self.image(fmt)? else {
            return Ok(());
        };
        info!("Writing {} bytes to {}", image.bytes.len(), path.display());
        std::fs::write(path, &image.bytes)
            .map_err(|e| Error::FileWrite(path.display().to_string(), e))?;
        for side in &image.side_files {
            let side_path = path.with_file_name(&side.name);
            info!("Writing {} bytes to {}", side.bytes.len(), side_path.display());
            std::fs::write(&side_path, &side.bytes)
                .map_err(|e| Error::FileWrite(side_path.display().to_string(), e))?;
        }
        Ok(())
    }
}
