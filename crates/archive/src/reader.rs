use block::Score;
use byteorder::{LittleEndian, ReadBytesExt};
use crc32fast::Hasher as Crc32;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::warn;

use crate::format::{read_footer, read_header, Footer, FOOTER_BYTES, HEADER_BYTES, RECORD_BYTES};
use crate::ArchiveError;

/// Sequential archive reader.
///
/// [`open`](ArchiveReader::open) validates the header, the footer and the
/// file size up front; [`replay`](ArchiveReader::replay) then streams every
/// record and verifies the CRC once the DATA section has been consumed.
///
/// Generic over `Read + Seek` so tests can feed an in-memory `Cursor`.
pub struct ArchiveReader<R: Read + Seek> {
    rdr: BufReader<R>,
    footer: Footer,
}

impl ArchiveReader<File> {
    /// Opens an archive file and validates its framing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<ArchiveReader<File>, ArchiveError> {
        let f = File::open(path.as_ref())?;
        Self::from_reader(f).inspect_err(|e| {
            warn!(path = %path.as_ref().display(), error = %e, "rejected archive");
        })
    }
}

impl<R: Read + Seek> ArchiveReader<R> {
    /// Constructs a reader from any `Read + Seek` implementor.
    pub fn from_reader(mut reader: R) -> Result<Self, ArchiveError> {
        let filesize = reader.seek(SeekFrom::End(0))?;
        if filesize < HEADER_BYTES + FOOTER_BYTES {
            return Err(ArchiveError::Truncated {
                expected: HEADER_BYTES + FOOTER_BYTES,
                actual: filesize,
            });
        }

        reader.seek(SeekFrom::Start(0))?;
        read_header(&mut reader)?;
        let footer = read_footer(&mut reader)?;

        let expected = HEADER_BYTES + footer.count * RECORD_BYTES + FOOTER_BYTES;
        if expected != filesize {
            return Err(ArchiveError::Truncated {
                expected,
                actual: filesize,
            });
        }

        // Position at the first record
        reader.seek(SeekFrom::Start(HEADER_BYTES))?;

        Ok(Self {
            rdr: BufReader::new(reader),
            footer,
        })
    }

    /// Number of records the footer declares.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.footer.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.footer.count == 0
    }

    /// Streams every record to `apply`, skipping zero scores.
    ///
    /// Returns the number of records passed to `apply`.
    ///
    /// # Termination
    ///
    /// - All records read and CRC matches -> `Ok(applied)`.
    /// - A score of `i16::MIN` -> `Err(InvalidScore)`.
    /// - CRC mismatch -> `Err(ChecksumMismatch)`, detected only after every
    ///   record has been handed to `apply`; callers that need all-or-nothing
    ///   semantics must undo on error.
    pub fn replay<F>(&mut self, mut apply: F) -> Result<u64, ArchiveError>
    where
        F: FnMut(u32, Score),
    {
        let mut hasher = Crc32::new();
        let mut record = [0u8; RECORD_BYTES as usize];
        let mut applied = 0u64;

        for _ in 0..self.footer.count {
            self.rdr.read_exact(&mut record)?;
            hasher.update(&record);

            let mut br = &record[..];
            let addr = br.read_u32::<LittleEndian>()?;
            let raw = br.read_i16::<LittleEndian>()?;

            let score = Score::try_from(raw).map_err(|_| ArchiveError::InvalidScore { addr, raw })?;
            if score.is_zero() {
                continue;
            }
            apply(addr, score);
            applied += 1;
        }

        let computed = hasher.finalize();
        if computed != self.footer.crc {
            return Err(ArchiveError::ChecksumMismatch {
                stored: self.footer.crc,
                computed,
            });
        }

        Ok(applied)
    }
}
