//! Where killmail records come from

pub mod archive;
pub mod directory;

pub use archive::ZipSource;
pub use directory::DirectorySource;

use anyhow::{bail, Result};
use std::path::Path;

/// File extension of a killmail record
pub const RECORD_EXTENSION: &str = "json";

/// An enumerable collection of raw killmail records
pub trait RecordSource {
    /// Short description used in logs
    fn describe(&self) -> String;

    /// Record identifiers, sorted lexicographically
    fn identifiers(&mut self) -> Result<Vec<String>>;

    /// Raw bytes of one record
    fn read_record(&mut self, id: &str) -> Result<Vec<u8>>;
}

/// Open a directory of `.json` files or a `.zip` archive of them
pub fn open_source(path: &Path) -> Result<Box<dyn RecordSource>> {
    if !path.exists() {
        bail!("Input {:?} does not exist", path);
    }

    if path.is_dir() {
        return Ok(Box::new(DirectorySource::new(path)));
    }

    let is_zip = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"));

    if is_zip {
        Ok(Box::new(ZipSource::open(path)?))
    } else {
        bail!("Input {:?} is neither a directory nor a .zip archive", path)
    }
}
