use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use super::types::*;

/// Temporary files handed to `op` on the command line. Each file is
/// removed exactly once, by [`ScratchFiles::close`] or on drop.
#[derive(Debug, Default)]
pub struct ScratchFiles {
    paths: Vec<TempPath>,
}

impl ScratchFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `contents` to a new scratch file and return its path.
    pub fn create(&mut self, prefix: &str, contents: &[u8]) -> OpResult<PathBuf> {
        let mut file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(".json")
            .tempfile()?;
        file.write_all(contents)?;
        file.flush()?;
        let path = file.into_temp_path();
        let owned = path.to_path_buf();
        log::debug!("created scratch file {}", owned.display());
        self.paths.push(path);
        Ok(owned)
    }

    pub fn paths(&self) -> Vec<&Path> {
        self.paths.iter().map(|p| &**p).collect()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Remove every tracked file. A file already gone is not an error;
    /// the first other failure is returned after all removals are tried.
    pub fn close(&mut self) -> OpResult<()> {
        let mut first_err: Option<io::Error> = None;
        for path in self.paths.drain(..) {
            let display = path.to_path_buf();
            match path.close() {
                Ok(()) => log::debug!("removed scratch file {}", display.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    log::warn!("failed to remove scratch file {}: {}", display.display(), e);
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }
        match first_err {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("scratch cleanup on drop: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn create_writes_contents() {
        let mut scratch = ScratchFiles::new();
        let path = scratch.create("opw-test-", b"{\"a\":1}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\":1}");
        assert_eq!(scratch.len(), 1);
        scratch.close().unwrap();
        assert!(!path.exists());
        assert!(scratch.is_empty());
    }

    #[test]
    fn drop_removes_files() {
        let path = {
            let mut scratch = ScratchFiles::new();
            scratch.create("opw-test-", b"x").unwrap()
        };
        assert!(!path.exists());
    }

    #[test]
    fn already_removed_file_is_tolerated() {
        let mut scratch = ScratchFiles::new();
        let path = scratch.create("opw-test-", b"x").unwrap();
        fs::remove_file(&path).unwrap();
        assert!(scratch.close().is_ok());
    }

    #[test]
    fn close_twice_is_a_no_op() {
        let mut scratch = ScratchFiles::new();
        scratch.create("opw-test-", b"x").unwrap();
        scratch.close().unwrap();
        scratch.close().unwrap();
    }
}
