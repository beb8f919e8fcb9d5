use crate::utils::error::Result;
use std::io::{Cursor, Write};
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

/// In-memory zip of `{mb_id}.png` entries.
pub struct ImageBundle {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    entries: usize,
}

impl ImageBundle {
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            entries: 0,
        }
    }

    pub fn add_png(&mut self, mb_id: &str, png: &[u8]) -> Result<()> {
        // PNG 已壓縮，直接存放
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        self.zip.start_file(format!("{}.png", mb_id), options)?;
        self.zip.write_all(png)?;
        self.entries += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub fn finish(self) -> Result<Vec<u8>> {
        let cursor = self.zip.finish()?;
        Ok(cursor.into_inner())
    }
}

impl Default for ImageBundle {
    fn default() -> Self {
        Self::new()
    }
}
