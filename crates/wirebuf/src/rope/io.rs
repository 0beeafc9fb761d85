//! `std::io` integration: draining readers into ropes and reading ropes back.

use std::io::{self, BufRead, Read, Write};

use alloc::{vec, vec::Vec};

use super::{ByteBuffer, Chunks};

const MIN_READ_CHUNK: usize = 0x100;
const MAX_READ_CHUNK: usize = 0x2000;

impl ByteBuffer {
    /// Reads `reader` to the end.
    ///
    /// The data is stored as a balanced rope of chunks that start at 256 bytes
    /// and double up to 8 KiB, so short streams stay small and long streams
    /// do not need one huge reallocation.
    ///
    /// # Errors
    ///
    /// Any error from `reader` other than [`io::ErrorKind::Interrupted`].
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> io::Result<ByteBuffer> {
        let mut pieces = Vec::new();
        let mut chunk_size = MIN_READ_CHUNK;
        while let Some(piece) = read_chunk(reader, chunk_size)? {
            pieces.push(piece);
            chunk_size = (chunk_size * 2).min(MAX_READ_CHUNK);
        }
        Ok(pieces.into_iter().collect())
    }

    /// Writes every leaf to `writer`.
    ///
    /// # Errors
    ///
    /// Whatever `writer` reports.
    pub fn write_all_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        for chunk in self.chunks() {
            writer.write_all(chunk)?;
        }
        Ok(())
    }

    /// A reader over the contents. Also implements [`BufRead`], handing out
    /// leaf slices directly.
    #[must_use]
    pub fn reader(&self) -> RopeReader<'_> {
        RopeReader {
            chunks: self.chunks(),
            current: &[],
        }
    }
}

/// Fills up to `size` bytes, stopping early only at end of stream.
fn read_chunk<R: Read + ?Sized>(reader: &mut R, size: usize) -> io::Result<Option<ByteBuffer>> {
    let mut buf = vec![0; size];
    let mut filled = 0;
    while filled < size {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    if filled == 0 {
        return Ok(None);
    }
    buf.truncate(filled);
    Ok(Some(ByteBuffer::from(buf)))
}

/// [`Read`] and [`BufRead`] over a [`ByteBuffer`]. See [`ByteBuffer::reader`].
pub struct RopeReader<'a> {
    chunks: Chunks<'a>,
    current: &'a [u8],
}

impl BufRead for RopeReader<'_> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        while self.current.is_empty() {
            match self.chunks.next() {
                Some(chunk) => self.current = chunk,
                None => break,
            }
        }
        Ok(self.current)
    }

    fn consume(&mut self, amt: usize) {
        self.current = &self.current[amt.min(self.current.len())..];
    }
}

impl Read for RopeReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}
