//! # Archive - Score Snapshot Files
//!
//! Binary persistence for the score store: every non-zero
//! `(address, score)` pair is written to a single archive file.
//!
//! ## File layout
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ HEADER   magic (u32) "IPSA" | version (u32)   │
//! ├──────────────────────────────────────────────┤
//! │ DATA     address (u32) | score (i16)          │
//! │          ... repeated `count` times ...       │
//! ├──────────────────────────────────────────────┤
//! │ FOOTER   count (u64) | crc32 (u32) | magic    │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. The CRC32 covers the DATA section.
//!
//! ## Crash safety
//!
//! [`ArchiveWriter::write`] writes to `<name>.tmp.<pid>` next to the target,
//! fsyncs it, renames it over the destination and fsyncs the parent
//! directory. Readers therefore see either the old archive or the new one,
//! never a partial file.
//!
//! ## Example
//!
//! ```rust,no_run
//! use archive::{ArchiveReader, ArchiveWriter};
//! use block::Score;
//!
//! let entries = vec![(0x0A00_0001, Score::new(42).unwrap())];
//! ArchiveWriter::write("scores.ipsa", entries.into_iter()).unwrap();
//!
//! let mut r = ArchiveReader::open("scores.ipsa").unwrap();
//! r.replay(|addr, score| println!("{addr:#x} = {score}")).unwrap();
//! ```

mod format;
mod reader;
mod writer;

pub use format::{
    Footer, ARCHIVE_MAGIC, ARCHIVE_VERSION, FOOTER_BYTES, HEADER_BYTES, MAX_RECORDS,
    RECORD_BYTES,
};
pub use reader::ArchiveReader;
pub use writer::ArchiveWriter;

use std::io;
use thiserror::Error;

/// Errors that can occur while writing or reading an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Header or footer magic did not match.
    #[error("bad archive magic: {0:#010x}")]
    BadMagic(u32),

    /// The header carried a version this build does not understand.
    #[error("unsupported archive version {0}")]
    UnsupportedVersion(u32),

    /// The footer claims more records than there are IPv4 addresses.
    #[error("archive claims {0} records")]
    TooManyRecords(u64),

    /// File size does not match the record count in the footer.
    #[error("archive size mismatch: expected {expected} bytes, found {actual}")]
    Truncated { expected: u64, actual: u64 },

    /// The DATA section failed CRC validation.
    #[error("archive checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    /// A record held a value outside the score domain.
    #[error("invalid score {raw} for address {addr:#010x}")]
    InvalidScore { addr: u32, raw: i16 },
}
