use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SerError};

/// Random-access byte source the decoder reads from.
///
/// Anything that is `Read + Seek` qualifies: files, memory maps, in-memory
/// cursors. Closing is dropping.
pub trait ByteStore: Read + Seek {
    /// Total size in bytes. The read position is left where it was.
    fn size(&mut self) -> io::Result<u64> {
        let pos = self.stream_position()?;
        let end = self.seek(SeekFrom::End(0))?;
        if pos != end {
            self.seek(SeekFrom::Start(pos))?;
        }
        Ok(end)
    }

    /// Fill as much of `buf` as the store can provide.
    ///
    /// Returns fewer than `buf.len()` bytes only at end of data.
    fn read_up_to(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<T: Read + Seek> ByteStore for T {}

/// Owned store handed out by [`open_store`].
pub type DynStore = Box<dyn ByteStore + Send>;

/// A memory-mapped file viewed as a seekable byte stream.
pub type MappedStore = Cursor<Mmap>;

/// How a path is turned into a [`ByteStore`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Buffered reads through the file handle.
    #[default]
    Buffered,
    /// Memory-map the whole file.
    Mapped,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buffered => write!(f, "buffered"),
            Self::Mapped => write!(f, "mapped"),
        }
    }
}

/// Open `path` as a byte store of the requested kind.
pub fn open_store(path: &Path, kind: StoreKind) -> Result<DynStore> {
    let unavailable = |source| SerError::IoUnavailable {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(unavailable)?;
    debug!(path = %path.display(), %kind, "Opening byte store");

    match kind {
        StoreKind::Buffered => Ok(Box::new(BufReader::new(file))),
        StoreKind::Mapped => {
            // SAFETY: the map is read-only; concurrent truncation by another
            // process is outside what this reader can guard against.
            let mmap = unsafe { Mmap::map(&file) }.map_err(unavailable)?;
            Ok(Box::new(Cursor::new(mmap)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_preserves_position() {
        let mut store = Cursor::new(vec![0u8; 32]);
        store.seek(SeekFrom::Start(5)).unwrap();
        assert_eq!(store.size().unwrap(), 32);
        assert_eq!(store.stream_position().unwrap(), 5);
    }

    #[test]
    fn read_up_to_reports_short_reads() {
        let mut store = Cursor::new(vec![1u8, 2, 3]);
        let mut buf = [0u8; 8];
        assert_eq!(store.read_up_to(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
        assert_eq!(store.read_up_to(&mut buf).unwrap(), 0);
    }

    #[test]
    fn missing_file_is_unavailable() {
        let err = open_store(Path::new("/definitely/not/here.ser"), StoreKind::Buffered)
            .err()
            .unwrap();
        assert!(matches!(err, SerError::IoUnavailable { .. }));
    }
}
