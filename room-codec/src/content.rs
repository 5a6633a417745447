//! Content buffer factory: an in-memory buffer below the fast-buffering
//! threshold, a temp-file-backed buffer above it.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

/// Default threshold (bytes) below which content stays in memory.
pub const DEFAULT_MAX_FAST_BUFFERING: u64 = 1024 * 1024;

static NEXT_TEMP_ID: AtomicU64 = AtomicU64::new(0);

/// An opaque byte sequence exposed as a seekable byte-sink: held in memory
/// when small, spilled to a temp file otherwise.
///
/// The factory hands out a `ContentBuffer` with no further retention; the
/// caller owns its lifetime. A `TempFile` buffer unlinks its backing file
/// when dropped.
#[derive(Debug)]
pub enum ContentBuffer {
    /// Declared length was 0 — no allocation at all.
    Null,
    /// Declared length was at or below `max_fast_buffering`.
    Memory { data: Vec<u8>, pos: usize },
    /// Declared length exceeded `max_fast_buffering`.
    TempFile {
        file: File,
        path: tempfile::TempPath,
        len: u64,
    },
}

impl ContentBuffer {
    /// Wrap already-owned bytes as an in-memory content buffer (for
    /// constructing outbound messages without going through `read_message`).
    pub fn from_bytes(data: Vec<u8>) -> Self {
        if data.is_empty() {
            Self::Null
        } else {
            Self::Memory { data, pos: 0 }
        }
    }

    /// Choose a backing store for `declared_len` bytes of content.
    ///
    /// `temp_content_folder` and `temp_content_prefix` are only consulted
    /// when the content must spill to disk.
    pub async fn allocate(
        declared_len: u64,
        max_fast_buffering: u64,
        temp_content_folder: &Path,
        temp_content_prefix: &str,
    ) -> io::Result<Self> {
        if declared_len == 0 {
            return Ok(Self::Null);
        }

        if declared_len <= max_fast_buffering {
            return Ok(Self::Memory {
                data: Vec::with_capacity(declared_len as usize),
                pos: 0,
            });
        }

        let id = NEXT_TEMP_ID.fetch_add(1, Ordering::Relaxed);
        let prefix = format!("{temp_content_prefix}{id}-");
        let dir = temp_content_folder.to_path_buf();
        let named = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new().prefix(&prefix).tempfile_in(&dir)
        })
        .await
        .map_err(|e| io::Error::other(e.to_string()))??;

        tracing::debug!(temp_id = id, declared_len, "spilling content to temp file");

        let (std_file, path) = named.into_parts();
        let file = File::from_std(std_file);
        Ok(Self::TempFile { file, path, len: 0 })
    }

    /// Declared/current length of the buffer in bytes.
    pub fn len(&self) -> u64 {
        match self {
            Self::Null => 0,
            Self::Memory { data, .. } => data.len() as u64,
            Self::TempFile { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `buf` to the end of the content, growing it. Used while
    /// filling the buffer during a read.
    pub async fn write_chunk(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            Self::Null => {
                if !buf.is_empty() {
                    return Err(io::Error::other("write to null content buffer"));
                }
                Ok(())
            }
            Self::Memory { data, .. } => {
                data.extend_from_slice(buf);
                Ok(())
            }
            Self::TempFile { file, len, .. } => {
                file.write_all(buf).await?;
                *len += buf.len() as u64;
                Ok(())
            }
        }
    }

    /// Rewind to offset 0, preparing the buffer for sequential reading by
    /// the caller.
    pub async fn rewind(&mut self) -> io::Result<()> {
        match self {
            Self::Null => Ok(()),
            Self::Memory { pos, .. } => {
                *pos = 0;
                Ok(())
            }
            Self::TempFile { file, .. } => {
                file.seek(std::io::SeekFrom::Start(0)).await?;
                Ok(())
            }
        }
    }

    /// Fill `buf` with up to `buf.len()` bytes, returning the number of
    /// bytes read (0 signals the end of the content).
    pub async fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Null => Ok(0),
            Self::Memory { data, pos } => {
                let remaining = &data[*pos..];
                let n = remaining.len().min(buf.len());
                buf[..n].copy_from_slice(&remaining[..n]);
                *pos += n;
                Ok(n)
            }
            Self::TempFile { file, .. } => file.read(buf).await,
        }
    }

    /// Read the whole buffer into a `Vec<u8>`, rewinding first. Convenience
    /// for tests and small payloads.
    pub async fn read_to_vec(&mut self) -> io::Result<Vec<u8>> {
        self.rewind().await?;
        let mut out = Vec::with_capacity(self.len() as usize);
        let mut chunk = [0u8; 8192];
        loop {
            let n = self.read_chunk(&mut chunk).await?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
        }
        Ok(out)
    }

    /// The backing file path, if this buffer spilled to disk.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::TempFile { path, .. } => Some(path.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_length_allocates_null() {
        let dir = tempfile::tempdir().unwrap();
        let buf = ContentBuffer::allocate(0, DEFAULT_MAX_FAST_BUFFERING, dir.path(), "room-")
            .await
            .unwrap();
        assert!(matches!(buf, ContentBuffer::Null));
        assert_eq!(buf.len(), 0);
        assert!(buf.is_empty());
        assert!(buf.path().is_none());
    }

    #[tokio::test]
    async fn below_threshold_stays_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let buf = ContentBuffer::allocate(16, 1024, dir.path(), "room-")
            .await
            .unwrap();
        assert!(matches!(buf, ContentBuffer::Memory { .. }));
        assert!(buf.path().is_none());
    }

    #[tokio::test]
    async fn above_threshold_spills_to_temp_file_under_folder() {
        let dir = tempfile::tempdir().unwrap();
        let buf = ContentBuffer::allocate(2048, 1024, dir.path(), "room-")
            .await
            .unwrap();
        assert!(matches!(buf, ContentBuffer::TempFile { .. }));
        let path = buf.path().expect("spilled buffer exposes a path");
        assert_eq!(path.parent(), Some(dir.path()));
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("room-"));
    }

    #[tokio::test]
    async fn temp_file_unlinked_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let buf = ContentBuffer::allocate(2048, 1024, dir.path(), "room-")
            .await
            .unwrap();
        let path = buf.path().unwrap().to_path_buf();
        assert!(path.exists());
        drop(buf);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn write_then_read_roundtrips_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = ContentBuffer::allocate(5, 1024, dir.path(), "room-")
            .await
            .unwrap();
        buf.write_chunk(b"hello").await.unwrap();
        assert_eq!(buf.len(), 5);
        let out = buf.read_to_vec().await.unwrap();
        assert_eq!(out, b"hello");
    }

    #[tokio::test]
    async fn write_then_read_roundtrips_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = ContentBuffer::allocate(2048, 16, dir.path(), "room-")
            .await
            .unwrap();
        let payload = vec![0x5au8; 2048];
        buf.write_chunk(&payload[..1024]).await.unwrap();
        buf.write_chunk(&payload[1024..]).await.unwrap();
        assert_eq!(buf.len(), 2048);
        let out = buf.read_to_vec().await.unwrap();
        assert_eq!(out, payload);
    }

    #[tokio::test]
    async fn rewind_allows_rereading() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = ContentBuffer::allocate(3, 1024, dir.path(), "room-")
            .await
            .unwrap();
        buf.write_chunk(b"abc").await.unwrap();
        let mut scratch = [0u8; 3];
        let n = buf.read_chunk(&mut scratch).await.unwrap();
        assert_eq!(n, 3);
        assert_eq!(&scratch, b"abc");
        buf.rewind().await.unwrap();
        let n = buf.read_chunk(&mut scratch).await.unwrap();
        assert_eq!(n, 3);
        assert_eq!(&scratch, b"abc");
    }

    #[tokio::test]
    async fn from_bytes_empty_is_null() {
        let buf = ContentBuffer::from_bytes(Vec::new());
        assert!(matches!(buf, ContentBuffer::Null));
    }
}
