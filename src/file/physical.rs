use memmap2::Mmap;
use std::{fs, path::Path};

use crate::Result;

/// A read-only, memory-mapped file on disk.
///
/// Documentation files shipped next to assemblies can be several megabytes; mapping them
/// avoids reading the whole file into a heap buffer before parsing.
#[derive(Debug)]
pub struct Physical {
    data: Mmap,
}

impl Physical {
    /// Map the file at `path` into memory
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = fs::File::open(path)?;

        // The mapping is read-only and the handle is kept alive by `Mmap`.
        let mmap = unsafe { Mmap::map(&file) }?;

        Ok(Physical { data: mmap })
    }

    /// The mapped bytes
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }
}
