use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::{RecordSource, RECORD_EXTENSION};

/// `*.json` files directly inside a directory; identifiers are file names
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }
}

impl RecordSource for DirectorySource {
    fn describe(&self) -> String {
        format!("directory {:?}", self.dir)
    }

    fn identifiers(&mut self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read directory: {:?}", self.dir))?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    fn read_record(&mut self, id: &str) -> Result<Vec<u8>> {
        let path = self.dir.join(id);
        fs::read(&path).with_context(|| format!("Failed to read: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_identifiers_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        for name in ["b.json", "a.json", "c.txt", "10.json"] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }
        fs::create_dir(dir.path().join("nested.json")).unwrap();

        let mut source = DirectorySource::new(dir.path());
        let ids = source.identifiers().unwrap();
        assert_eq!(ids, vec!["10.json", "a.json", "b.json"]);
        assert_eq!(source.read_record("a.json").unwrap(), b"{}");
    }

    #[test]
    fn test_missing_directory() {
        let mut source = DirectorySource::new(Path::new("/no/such/killmails"));
        assert!(source.identifiers().is_err());
    }
}
