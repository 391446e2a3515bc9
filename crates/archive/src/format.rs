//! Archive binary format constants and header/footer helpers.
//!
//! ## Header (8 bytes)
//!
//! ```text
//! [magic: u32 LE "IPSA"][version: u32 LE]
//! ```
//!
//! ## Footer (16 bytes)
//!
//! ```text
//! [count: u64 LE][crc32: u32 LE][magic: u32 LE "IPSA"]
//! ```
//!
//! The CRC covers the whole DATA section (every record, in file order).

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::ArchiveError;

/// Magic number identifying archive files (ASCII "IPSA").
pub const ARCHIVE_MAGIC: u32 = 0x4950_5341;

/// Current (and only) archive format version.
pub const ARCHIVE_VERSION: u32 = 1;

/// Size of the header in bytes: 4 (`magic`) + 4 (`version`).
pub const HEADER_BYTES: u64 = 4 + 4;

/// Size of the footer in bytes: 8 (`count`) + 4 (`crc32`) + 4 (`magic`).
pub const FOOTER_BYTES: u64 = 8 + 4 + 4;

/// Size of one DATA record: 4 (`address`) + 2 (`score`).
pub const RECORD_BYTES: u64 = 4 + 2;

/// Upper bound on records in one archive (one per IPv4 address).
pub const MAX_RECORDS: u64 = 1 << 32;

/// Parsed archive footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub count: u64,
    pub crc: u32,
}

pub fn write_header<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_u32::<LittleEndian>(ARCHIVE_MAGIC)?;
    w.write_u32::<LittleEndian>(ARCHIVE_VERSION)?;
    Ok(())
}

pub fn write_footer<W: Write>(w: &mut W, footer: Footer) -> io::Result<()> {
    w.write_u64::<LittleEndian>(footer.count)?;
    w.write_u32::<LittleEndian>(footer.crc)?;
    w.write_u32::<LittleEndian>(ARCHIVE_MAGIC)?;
    Ok(())
}

/// Reads and validates the header at the current position.
pub fn read_header<R: Read>(r: &mut R) -> Result<(), ArchiveError> {
    let magic = r.read_u32::<LittleEndian>()?;
    if magic != ARCHIVE_MAGIC {
        return Err(ArchiveError::BadMagic(magic));
    }
    let version = r.read_u32::<LittleEndian>()?;
    if version != ARCHIVE_VERSION {
        return Err(ArchiveError::UnsupportedVersion(version));
    }
    Ok(())
}

/// Reads the footer from the last [`FOOTER_BYTES`] of `r`.
///
/// The caller must have checked that the file is large enough.
pub fn read_footer<R: Read + Seek>(r: &mut R) -> Result<Footer, ArchiveError> {
    r.seek(SeekFrom::End(-(FOOTER_BYTES as i64)))?;
    let count = r.read_u64::<LittleEndian>()?;
    let crc = r.read_u32::<LittleEndian>()?;
    let magic = r.read_u32::<LittleEndian>()?;
    if magic != ARCHIVE_MAGIC {
        return Err(ArchiveError::BadMagic(magic));
    }
    if count > MAX_RECORDS {
        return Err(ArchiveError::TooManyRecords(count));
    }
    Ok(Footer { count, crc })
}
