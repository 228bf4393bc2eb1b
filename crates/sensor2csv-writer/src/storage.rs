//! Append-only file storage for sinks.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::error::{Result, WriterError};

/// Byte-level append target. Only the accumulator thread calls it.
pub trait SinkStorage: Send + 'static {
    /// Append `bytes` to `file`. An empty or missing file starts with `header`.
    fn append(&mut self, file: &str, header: Option<&[u8]>, bytes: &[u8]) -> Result<()>;

    /// Make sure `file` exists, writing `header` if it is new.
    fn prepare(&mut self, file: &str, header: Option<&[u8]>) -> Result<()> {
        self.append(file, header, &[])
    }
}

/// Files under a local output directory.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Use `root` as the output directory, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| WriterError::write_failure(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }
}

impl SinkStorage for FsStorage {
    fn append(&mut self, file: &str, header: Option<&[u8]>, bytes: &[u8]) -> Result<()> {
        let path = self.path_of(file);
        let mut handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| WriterError::write_failure(&path, e))?;

        let needs_header = match header {
            Some(_) => {
                handle
                    .metadata()
                    .map_err(|e| WriterError::write_failure(&path, e))?
                    .len()
                    == 0
            }
            None => false,
        };

        let result = match header {
            Some(header) if needs_header => {
                let mut buf = Vec::with_capacity(header.len() + bytes.len());
                buf.extend_from_slice(header);
                buf.extend_from_slice(bytes);
                handle.write_all(&buf)
            }
            _ if bytes.is_empty() => Ok(()),
            _ => handle.write_all(bytes),
        };
        result.map_err(|e| WriterError::write_failure(&path, e))?;

        tracing::trace!(path = %path.display(), bytes = bytes.len(), "appended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/data");
        let storage = FsStorage::new(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(storage.root(), nested.as_path());
    }

    #[test]
    fn header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FsStorage::new(dir.path()).unwrap();

        storage.prepare("t.csv", Some(b"a,b\n")).unwrap();
        storage.prepare("t.csv", Some(b"a,b\n")).unwrap();
        storage.append("t.csv", Some(b"a,b\n"), b"1,2\n").unwrap();

        // A second storage over the same directory simulates a restart.
        let mut restarted = FsStorage::new(dir.path()).unwrap();
        restarted.append("t.csv", Some(b"a,b\n"), b"3,4\n").unwrap();

        let content = fs::read_to_string(dir.path().join("t.csv")).unwrap();
        assert_eq!(content, "a,b\n1,2\n3,4\n");
    }

    #[test]
    fn deleted_file_is_recreated_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FsStorage::new(dir.path()).unwrap();
        storage.append("t.csv", Some(b"h\n"), b"1\n").unwrap();
        fs::remove_file(dir.path().join("t.csv")).unwrap();
        storage.append("t.csv", Some(b"h\n"), b"2\n").unwrap();

        let content = fs::read_to_string(dir.path().join("t.csv")).unwrap();
        assert_eq!(content, "h\n2\n");
    }

    #[test]
    fn headerless_prepare_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FsStorage::new(dir.path()).unwrap();
        storage.prepare("raw.jsonl", None).unwrap();
        assert_eq!(fs::read(dir.path().join("raw.jsonl")).unwrap().len(), 0);
    }

    #[test]
    fn missing_directory_is_a_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FsStorage::new(dir.path()).unwrap();
        fs::remove_dir_all(dir.path()).unwrap();

        let err = storage.append("t.csv", None, b"x\n").unwrap_err();
        assert_eq!(err.code(), "E002");
    }
}
