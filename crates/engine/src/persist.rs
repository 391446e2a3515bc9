use archive::{ArchiveReader, ArchiveWriter};
use bulk::{BulkReader, BulkRecord, BulkStats, Change};
use std::io::BufRead;
use std::path::Path;
use tracing::{info, warn};

use crate::{Engine, Error, Result};

impl Engine {
    /// Writes every non-zero score to an archive at `path` and returns the
    /// number of records written.
    ///
    /// # Crash Safety
    ///
    /// The archive is written to a temp file and renamed into place, so
    /// `path` holds either the previous archive or the complete new one.
    /// Scores written concurrently with the save may or may not be included.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<u64> {
        let path = path.as_ref();
        let written = ArchiveWriter::write(path, self.scores())?;
        info!(path = %path.display(), records = written, "archive saved");
        Ok(written)
    }

    /// Replaces the engine's contents with the archive at `path` and returns
    /// the number of scores loaded.
    ///
    /// The engine is cleared first. If the archive is missing or fails
    /// validation the engine is left empty; a partial load is never kept.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<u64> {
        let path = path.as_ref();
        self.clear();

        match self.load_archive(path) {
            Ok(loaded) => {
                info!(path = %path.display(), records = loaded, "archive loaded");
                Ok(loaded)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "archive load failed, engine cleared");
                self.clear();
                Err(e)
            }
        }
    }

    fn load_archive(&self, path: &Path) -> Result<u64> {
        let mut reader = ArchiveReader::open(path)?;
        let mut failure = None;
        let loaded = reader.replay(|addr, score| {
            if failure.is_none() {
                if let Err(e) = self.set(addr, score) {
                    failure = Some(e);
                }
            }
        })?;
        match failure {
            Some(e) => Err(e),
            None => Ok(loaded),
        }
    }

    /// Applies a change file. See the [`bulk`] crate for the line grammar.
    ///
    /// Malformed lines are counted in [`BulkStats::parse_errors`] and
    /// skipped. Changes already applied stay applied if the load fails
    /// part-way.
    pub fn bulk_load_file<P: AsRef<Path>>(&self, path: P) -> Result<BulkStats> {
        let path = path.as_ref();
        let stats = self.bulk_load(BulkReader::open(path)?)?;
        info!(
            path = %path.display(),
            processed = stats.lines_processed,
            parse_errors = stats.parse_errors,
            "bulk file loaded"
        );
        Ok(stats)
    }

    /// Applies change lines held in memory.
    pub fn bulk_load_buffer(&self, data: &[u8]) -> Result<BulkStats> {
        self.bulk_load(BulkReader::from_bytes(data))
    }

    fn bulk_load<R: BufRead>(&self, mut reader: BulkReader<R>) -> Result<BulkStats> {
        let mut failure: Option<Error> = None;
        let stats = reader.replay(|record| {
            if failure.is_none() {
                if let Err(e) = self.apply(record) {
                    failure = Some(e);
                }
            }
        })?;
        match failure {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }

    fn apply(&self, record: BulkRecord) -> Result<()> {
        match record.change {
            Change::Set(value) => self.set(record.addr, value)?,
            Change::Adjust(delta) => self.increment(record.addr, delta)?,
        };
        Ok(())
    }
}
