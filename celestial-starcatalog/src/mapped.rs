//! Fixed-record-length random access over a memory-mapped file.
//!
//! The file is mapped once, read-only, when [`MappedFile::open`] succeeds.
//! Records are addressed by 0-based index; [`MappedFile::get`] borrows the
//! record bytes straight from the map without copying. Several published
//! catalog files end with a short record (a missing final newline), so the
//! record count is the file length divided by the record length, truncated.

use crate::error::{CatalogError, Result};
use memmap2::Mmap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct MappedFile {
    path: PathBuf,
    // empty files are not mapped
    mmap: Option<Mmap>,
    record_length: usize,
    records: usize,
}

impl MappedFile {
    /// Map `path` as a sequence of `record_length`-byte records.
    ///
    /// # Errors
    /// Fails if the file cannot be opened or is not a regular file.
    pub fn open(path: impl AsRef<Path>, record_length: usize) -> Result<Self> {
        let path = path.as_ref();
        if record_length == 0 {
            return Err(CatalogError::Logic("record length must be positive".into()));
        }
        let meta = fs::metadata(path).map_err(|e| CatalogError::file(path, e))?;
        if !meta.is_file() {
            return Err(CatalogError::file(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }
        let file = File::open(path).map_err(|e| CatalogError::file(path, e))?;

        let len = meta.len() as usize;
        let mmap = if len == 0 {
            None
        } else {
            Some(unsafe { Mmap::map(&file) }.map_err(|e| CatalogError::file(path, e))?)
        };

        let records = len / record_length;
        if len % record_length != 0 {
            debug!(
                "{:?}: {} trailing bytes ignored (record length {})",
                path,
                len % record_length,
                record_length
            );
        }
        debug!("{:?} mapped: {} records of {} bytes", path, records, record_length);

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            record_length,
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_length(&self) -> usize {
        self.record_length
    }

    /// Number of complete records.
    pub fn len(&self) -> usize {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Raw bytes of record `index`.
    ///
    /// # Errors
    /// Returns [`CatalogError::Range`] if `index >= len()`.
    pub fn get(&self, index: usize) -> Result<&[u8]> {
        match &self.mmap {
            Some(mmap) if index < self.records => {
                let start = index * self.record_length;
                Ok(&mmap[start..start + self.record_length])
            }
            _ => Err(CatalogError::Range(format!(
                "record {} out of range, {:?} has {} records",
                index, self.path, self.records
            ))),
        }
    }

    /// Record `index` as text.
    pub fn get_str(&self, index: usize) -> Result<&str> {
        let bytes = self.get(index)?;
        std::str::from_utf8(bytes)
            .map_err(|e| CatalogError::parse(format!("record {} is not text: {}", index, e)))
    }
}

/// Resolve a catalog location that may name either the data file or the
/// directory holding it under its standard `filename`.
pub fn resolve_catalog_file(path: impl AsRef<Path>, filename: &str) -> Result<PathBuf> {
    let path = path.as_ref();
    let meta = fs::metadata(path).map_err(|e| CatalogError::file(path, e))?;
    let file = if meta.is_dir() {
        let f = path.join(filename);
        let meta = fs::metadata(&f).map_err(|e| CatalogError::file(&f, e))?;
        if !meta.is_file() {
            return Err(not_regular(&f));
        }
        f
    } else if meta.is_file() {
        path.to_path_buf()
    } else {
        return Err(not_regular(path));
    };
    Ok(file)
}

fn not_regular(path: &Path) -> CatalogError {
    CatalogError::file(
        path,
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_records_by_index() {
        let file = file_with(b"aaaa\nbbbb\ncccc\n");
        let mapped = MappedFile::open(file.path(), 5).unwrap();
        assert_eq!(mapped.len(), 3);
        assert_eq!(mapped.get(0).unwrap(), b"aaaa\n");
        assert_eq!(mapped.get_str(2).unwrap(), "cccc\n");
    }

    #[test]
    fn test_trailing_short_record_truncated() {
        let file = file_with(b"aaaa\nbbbb\ncc");
        let mapped = MappedFile::open(file.path(), 5).unwrap();
        assert_eq!(mapped.len(), 2);
        assert!(mapped.get(2).is_err());
    }

    #[test]
    fn test_out_of_range() {
        let file = file_with(b"aaaa\n");
        let mapped = MappedFile::open(file.path(), 5).unwrap();
        let err = mapped.get(1).unwrap_err();
        assert!(matches!(err, CatalogError::Range(_)), "unexpected: {}", err);
    }

    #[test]
    fn test_empty_file() {
        let file = file_with(b"");
        let mapped = MappedFile::open(file.path(), 78).unwrap();
        assert!(mapped.is_empty());
        assert!(mapped.get(0).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = MappedFile::open("/nonexistent/catalog.dat", 10).err().unwrap();
        assert!(matches!(err, CatalogError::File { .. }));
    }

    #[test]
    fn test_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(MappedFile::open(dir.path(), 10).is_err());
    }

    #[test]
    fn test_resolve_directory_or_file() {
        let dir = tempfile::tempdir().unwrap();
        let f = dir.path().join("tyc2.dat");
        std::fs::write(&f, b"x").unwrap();
        assert_eq!(resolve_catalog_file(dir.path(), "tyc2.dat").unwrap(), f);
        assert_eq!(resolve_catalog_file(&f, "ignored").unwrap(), f);
        assert!(resolve_catalog_file(dir.path(), "hip_main.dat").is_err());
    }
}
