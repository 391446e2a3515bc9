//! # Bulk - Line-Oriented Score Changes
//!
//! Parses textual change feeds into [`BulkRecord`]s and collects
//! [`BulkStats`] while doing so. The reader never touches a store itself:
//! [`BulkReader::replay`] hands each record to a callback, the same way a
//! log replay would.
//!
//! ## Line grammar
//!
//! ```text
//! line    := ws* address ws* ',' ws* change ws* ('#' comment)?
//! change  := '+' '-'? digits      relative  -> increment(address, ±N)
//!          | '-'? digits          absolute  -> set(address, ±N)
//! ```
//!
//! Only a leading `+` marks a change as relative. A bare `-25` **sets** the
//! score to -25; `+-25` **subtracts** 25. Magnitudes above 32767 saturate.
//!
//! Blank lines and lines whose first non-blank character is `#` are
//! comments. Anything else that does not match the grammar is a parse error:
//! it is counted and skipped, never applied.
//!
//! ## Example
//!
//! ```rust
//! use bulk::{BulkReader, Change};
//!
//! let feed = b"# feed\n10.0.0.1,100\n10.0.0.2,+-5\nbogus\n";
//! let mut applied = Vec::new();
//! let stats = BulkReader::from_bytes(feed).replay(|r| applied.push(r)).unwrap();
//! assert_eq!(stats.sets, 1);
//! assert_eq!(stats.updates, 1);
//! assert_eq!(stats.parse_errors, 1);
//! assert!(matches!(applied[1].change, Change::Adjust(d) if d.get() == -5));
//! ```

use addr::{parse_ipv4, AddrError};
use block::Score;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, trace};

/// Read buffer size for file input.
const READ_BUFFER_BYTES: usize = 64 * 1024;

/// A single parsed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Overwrite the score (`N` or `-N`).
    Set(Score),
    /// Add a signed delta to the score (`+N` or `+-N`).
    Adjust(Score),
}

/// One applied line: an address and what to do with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkRecord {
    pub addr: u32,
    pub change: Change,
}

/// Why a line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing ',' between address and change")]
    MissingComma,

    #[error("bad address: {0}")]
    Address(#[from] AddrError),

    #[error("missing change value")]
    EmptyChange,

    #[error("bad change value {0:?}")]
    InvalidChange(String),

    #[error("line is not valid UTF-8")]
    NotUtf8,
}

/// Counters produced by one bulk load.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BulkStats {
    /// Non-blank, non-comment lines seen (parse errors included).
    pub lines_processed: u64,
    /// Blank and comment lines.
    pub lines_skipped: u64,
    /// Absolute changes applied.
    pub sets: u64,
    /// Relative changes applied.
    pub updates: u64,
    /// Lines rejected by the parser.
    pub parse_errors: u64,
    pub elapsed_seconds: f64,
    /// `lines_processed / elapsed_seconds`, or `0.0` if no time elapsed.
    pub lines_per_second: f64,
}

impl BulkStats {
    fn finish(&mut self, elapsed: Duration) {
        self.elapsed_seconds = elapsed.as_secs_f64();
        self.lines_per_second = if self.elapsed_seconds > 0.0 {
            self.lines_processed as f64 / self.elapsed_seconds
        } else {
            0.0
        };
    }
}

/// Parses one line.
///
/// Returns `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<BulkRecord>, ParseError> {
    let content = line.trim();
    if content.is_empty() || content.starts_with('#') {
        return Ok(None);
    }

    let (ip, change) = content.split_once(',').ok_or(ParseError::MissingComma)?;
    let addr = parse_ipv4(ip.trim())?;

    let change = change.split_once('#').map_or(change, |(c, _)| c).trim();
    if change.is_empty() {
        return Err(ParseError::EmptyChange);
    }

    Ok(Some(BulkRecord {
        addr,
        change: parse_change(change)?,
    }))
}

fn parse_change(token: &str) -> Result<Change, ParseError> {
    let invalid = || ParseError::InvalidChange(token.to_string());

    let (relative, rest) = match token.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let (negative, digits) = match rest.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, rest),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let max = i64::from(Score::MAX.get());
    let magnitude = digits
        .bytes()
        .fold(0i64, |acc, b| (acc * 10 + i64::from(b - b'0')).min(max));
    let value = Score::saturating(if negative { -magnitude } else { magnitude });

    Ok(if relative {
        Change::Adjust(value)
    } else {
        Change::Set(value)
    })
}

/// Streams change lines from any `BufRead`.
pub struct BulkReader<R: BufRead> {
    rdr: R,
}

impl BulkReader<BufReader<File>> {
    /// Opens a change file for replay.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let f = File::open(path)?;
        Ok(Self {
            rdr: BufReader::with_capacity(READ_BUFFER_BYTES, f),
        })
    }
}

impl<'a> BulkReader<&'a [u8]> {
    /// Reads change lines from an in-memory buffer.
    pub fn from_bytes(data: &'a [u8]) -> Self {
        Self { rdr: data }
    }
}

impl<R: BufRead> BulkReader<R> {
    pub fn from_reader(reader: R) -> Self {
        Self { rdr: reader }
    }

    /// Parses every line, calling `apply` for each valid record, and
    /// returns the statistics.
    ///
    /// Parse errors are counted, not returned: only an I/O failure aborts
    /// the replay. Records applied before such a failure stay applied.
    pub fn replay<F>(&mut self, mut apply: F) -> io::Result<BulkStats>
    where
        F: FnMut(BulkRecord),
    {
        let start = Instant::now();
        let mut stats = BulkStats::default();
        let mut buf = Vec::with_capacity(128);
        let mut line_no = 0u64;

        loop {
            buf.clear();
            if self.rdr.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_no += 1;

            let parsed = std::str::from_utf8(&buf)
                .map_err(|_| ParseError::NotUtf8)
                .and_then(parse_line);

            match parsed {
                Ok(None) => stats.lines_skipped += 1,
                Ok(Some(record)) => {
                    stats.lines_processed += 1;
                    match record.change {
                        Change::Set(_) => stats.sets += 1,
                        Change::Adjust(_) => stats.updates += 1,
                    }
                    apply(record);
                }
                Err(e) => {
                    stats.lines_processed += 1;
                    stats.parse_errors += 1;
                    trace!(line = line_no, error = %e, "skipping bulk line");
                }
            }
        }

        stats.finish(start.elapsed());
        debug!(
            processed = stats.lines_processed,
            sets = stats.sets,
            updates = stats.updates,
            parse_errors = stats.parse_errors,
            "bulk replay finished"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests;
