use block::Score;
use byteorder::{LittleEndian, WriteBytesExt};
use crc32fast::Hasher as Crc32;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tempfile::{Builder, NamedTempFile};
use tracing::debug;

use crate::format::{write_footer, write_header, Footer, MAX_RECORDS};
use crate::ArchiveError;

/// Write buffer size for archive output.
const WRITE_BUFFER_BYTES: usize = 64 * 1024;

/// Writes score snapshots to disk as archive files.
///
/// Like the reader, the writer is stateless: everything happens inside
/// [`write`](ArchiveWriter::write).
pub struct ArchiveWriter {}

impl ArchiveWriter {
    /// Streams `entries` into a new archive at `path`, replacing any existing
    /// file atomically. Returns the number of records written.
    ///
    /// # Crash Safety
    ///
    /// Data goes to a uniquely named `<name>.tmp.*` file in the same
    /// directory, is flushed and `sync_all`ed, then renamed over `path`.
    /// Concurrent writers to one path never share a temp file, so `path`
    /// always holds one complete archive. The parent directory is synced
    /// afterwards so the rename itself survives a crash. On any error the
    /// temp file is removed and `path` is left untouched.
    pub fn write<P, I>(path: P, entries: I) -> Result<u64, ArchiveError>
    where
        P: AsRef<Path>,
        I: Iterator<Item = (u32, Score)>,
    {
        let path = path.as_ref();
        let name = path.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "archive path has no file name")
        })?;
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut prefix = name.to_os_string();
        prefix.push(".tmp.");
        // Dropped (and deleted) on every early return below.
        let mut tmp = Builder::new().prefix(&prefix).tempfile_in(parent)?;

        let count = Self::write_tmp(&mut tmp, entries)?;
        tmp.persist(path).map_err(|e| e.error)?;

        // Fsync the parent directory so the rename is durable.
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }

        debug!(path = %path.display(), records = count, "archive written");
        Ok(count)
    }

    fn write_tmp<I>(tmp: &mut NamedTempFile, entries: I) -> Result<u64, ArchiveError>
    where
        I: Iterator<Item = (u32, Score)>,
    {
        let mut file = BufWriter::with_capacity(WRITE_BUFFER_BYTES, tmp.as_file_mut());

        write_header(&mut file)?;

        let mut hasher = Crc32::new();
        let mut count: u64 = 0;
        let mut record = [0u8; 6];

        for (addr, score) in entries {
            if count == MAX_RECORDS {
                return Err(ArchiveError::TooManyRecords(count + 1));
            }
            let mut buf = &mut record[..];
            buf.write_u32::<LittleEndian>(addr)?;
            buf.write_i16::<LittleEndian>(score.get())?;

            hasher.update(&record);
            file.write_all(&record)?;
            count += 1;
        }

        write_footer(
            &mut file,
            Footer {
                count,
                crc: hasher.finalize(),
            },
        )?;

        // Flush BufWriter, then sync the underlying file
        file.flush()?;
        file.into_inner().map_err(|e| e.into_error())?.sync_all()?;

        Ok(count)
    }
}
