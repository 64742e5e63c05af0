//! Persisted sector-history layout.
//!
//! The history is an append-only log written as sectors are discovered and
//! replayed at startup. Every stream begins with a [`HistoryHeader`] followed
//! by bincode-encoded [`SectorRecord`]s.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const HISTORY_MAGIC: [u8; 4] = *b"DFSH";
pub const HISTORY_VERSION: u16 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryHeader {
    pub magic: [u8; 4],
    pub version: u16,
}

impl Default for HistoryHeader {
    fn default() -> Self {
        Self {
            magic: HISTORY_MAGIC,
            version: HISTORY_VERSION,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanetRecord {
    /// 64 hex digits, left padded.
    pub location_hash: String,
    pub noise: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectorRecord {
    pub x: i32,
    pub y: i32,
    pub region: i32,
    pub planet: Option<PlanetRecord>,
}

impl SectorRecord {
    pub fn has_planet(&self) -> bool {
        self.planet.is_some()
    }
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("history encoding failed: {0}")]
    Codec(#[from] bincode::Error),
    #[error("history stream has bad magic {found:?}")]
    BadMagic { found: [u8; 4] },
    #[error("history version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },
}

/// Appends records to a history stream.
pub struct HistoryWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> HistoryWriter<W> {
    /// Starts a fresh stream by writing the header.
    pub fn new(mut inner: W) -> Result<Self, HistoryError> {
        bincode::serialize_into(&mut inner, &HistoryHeader::default())?;
        Ok(Self { inner, written: 0 })
    }

    pub fn append(&mut self, record: &SectorRecord) -> Result<(), HistoryError> {
        bincode::serialize_into(&mut self.inner, record)?;
        self.inner.flush()?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Iterates over records of a history stream.
///
/// A truncated trailing record (e.g. the process died mid-write) ends the
/// iteration instead of producing an error.
pub struct HistoryReader<R: Read> {
    inner: R,
    finished: bool,
}

impl<R: Read> HistoryReader<R> {
    pub fn new(mut inner: R) -> Result<Self, HistoryError> {
        let header: HistoryHeader = bincode::deserialize_from(&mut inner)?;
        if header.magic != HISTORY_MAGIC {
            return Err(HistoryError::BadMagic {
                found: header.magic,
            });
        }
        if header.version != HISTORY_VERSION {
            return Err(HistoryError::UnsupportedVersion {
                found: header.version,
                expected: HISTORY_VERSION,
            });
        }
        Ok(Self {
            inner,
            finished: false,
        })
    }
}

impl<R: Read> Iterator for HistoryReader<R> {
    type Item = Result<SectorRecord, HistoryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match bincode::deserialize_from(&mut self.inner) {
            Ok(record) => Some(Ok(record)),
            Err(err) if is_end_of_stream(&err) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err.into()))
            }
        }
    }
}

fn is_end_of_stream(err: &bincode::Error) -> bool {
    matches!(
        err.as_ref(),
        bincode::ErrorKind::Io(io_err) if io_err.kind() == io::ErrorKind::UnexpectedEof
    )
}

pub fn encode_records(records: &[SectorRecord]) -> Result<Vec<u8>, HistoryError> {
    let mut writer = HistoryWriter::new(Vec::new())?;
    for record in records {
        writer.append(record)?;
    }
    Ok(writer.into_inner())
}

pub fn decode_records(bytes: &[u8]) -> Result<Vec<SectorRecord>, HistoryError> {
    HistoryReader::new(bytes)?.collect()
}
