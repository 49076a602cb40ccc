/// Streaming (windowed) digests for large files.
///
/// A byte range is hashed one window at a time. Only one window buffer is
/// live at any point, so peak memory is bounded by the window size no
/// matter how large the file is. The digest is identical to hashing the
/// same bytes in a single pass.
use std::io::{Read, Seek, SeekFrom};

use tracing::debug;

use crate::config::DEFAULT_WINDOW_SIZE;
use crate::crypto::hash::HashAlgorithm;
use crate::error::{Result, SignError};

/// A byte source that can be read in bounded windows at arbitrary offsets.
pub trait WindowReader {
    /// Total size of the source in bytes.
    fn size(&mut self) -> Result<u64>;

    /// Fill `buf` completely with the bytes starting at `offset`.
    fn read_window(&mut self, offset: u64, buf: &mut [u8]) -> Result<()>;
}

impl<R: Read + Seek> WindowReader for R {
    fn size(&mut self) -> Result<u64> {
        Ok(self.seek(SeekFrom::End(0))?)
    }

    fn read_window(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.read_exact(buf)?;
        Ok(())
    }
}

/// Hashes byte ranges of a [`WindowReader`] in fixed-size windows.
#[derive(Debug, Clone, Copy)]
pub struct ChunkedHasher {
    window_size: u64,
}

impl Default for ChunkedHasher {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl ChunkedHasher {
    /// Window sizes of zero are bumped to one byte.
    pub fn new(window_size: u64) -> Self {
        Self {
            window_size: window_size.max(1),
        }
    }

    pub fn window_size(&self) -> u64 {
        self.window_size
    }

    /// Digest `length` bytes starting at `offset`. A `length` of zero means
    /// "through the end of the source". Ranges that run past the end are
    /// clamped to the end.
    pub fn digest<W: WindowReader + ?Sized>(
        &self,
        source: &mut W,
        offset: u64,
        length: u64,
        algorithm: HashAlgorithm,
    ) -> Result<Vec<u8>> {
        let size = source.size()?;
        let mut hasher = algorithm.hasher();

        if size == 0 && offset == 0 && length == 0 {
            // Empty file: the whole-file digest is the digest of nothing.
            return Ok(hasher.finalize().into_vec());
        }
        if offset >= size {
            return Err(SignError::Range { offset, size });
        }

        let available = size - offset;
        let mut remaining = if length == 0 {
            available
        } else {
            length.min(available)
        };

        let mut pos = offset;
        let mut windows = 0u64;
        while remaining > 0 {
            let n = remaining.min(self.window_size) as usize;
            let mut window = vec![0u8; n];
            source.read_window(pos, &mut window)?;
            hasher.update(&window);
            // Released before the next window is allocated.
            drop(window);

            pos += n as u64;
            remaining -= n as u64;
            windows += 1;
        }

        debug!(offset, bytes = pos - offset, windows, "Digested byte range");
        Ok(hasher.finalize().into_vec())
    }
}
