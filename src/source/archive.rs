use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use super::{RecordSource, RECORD_EXTENSION};

/// `*.json` entries of a zip archive; identifiers are entry names
pub struct ZipSource {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
}

impl ZipSource {
    pub fn open(zip_path: &Path) -> Result<Self> {
        let file = File::open(zip_path).context("Failed to open zip file")?;
        let reader = BufReader::new(file);
        let archive = ZipArchive::new(reader).context("Failed to read zip archive")?;

        Ok(Self {
            path: zip_path.to_path_buf(),
            archive,
        })
    }
}

impl RecordSource for ZipSource {
    fn describe(&self) -> String {
        format!("archive {:?} ({} entries)", self.path, self.archive.len())
    }

    fn identifiers(&mut self) -> Result<Vec<String>> {
        let suffix = format!(".{}", RECORD_EXTENSION);

        // Directory entries end in '/', so they never match
        let mut names: Vec<String> = self
            .archive
            .file_names()
            .filter(|name| name.ends_with(&suffix))
            .map(str::to_string)
            .collect();

        names.sort();
        Ok(names)
    }

    fn read_record(&mut self, id: &str) -> Result<Vec<u8>> {
        let mut entry = self
            .archive
            .by_name(id)
            .with_context(|| format!("Failed to find {} in archive", id))?;

        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buf)
            .with_context(|| format!("Failed to extract: {}", id))?;

        Ok(buf)
    }
}
