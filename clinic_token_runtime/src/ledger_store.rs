//! Ledger store: the persisted CSV file.
//!
//! Rules:
//!   - Every append rewrites the full ledger, never just the new row
//!   - Writes go to a uniquely named sibling temp file, fsync, then
//!     rename over the ledger
//!   - Before writing, the on-disk bytes must still hash to the
//!     fingerprint seen at the last load or write; otherwise another
//!     session got there first and the append is refused
//!   - A missing file is an empty ledger, not an error
//!
//! The fingerprint check narrows but does not close the race between
//! two writers; there is no file lock.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use clinic_token_engine::domain::{Ledger, VisitRecord};
use clinic_token_engine::hashing::sha256_hex;

use crate::csv_codec::{decode_ledger, encode_ledger, DateStyle};
use crate::error::LedgerError;

/// CSV-backed ledger file.
#[derive(Debug)]
pub struct LedgerStore {
    path: PathBuf,
    /// SHA-256 of the bytes last seen on disk. `None` means no file.
    fingerprint: Option<String>,
}

impl LedgerStore {
    /// Open the store at `path`, creating the parent directory if
    /// needed. The file itself is not created until the first append.
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let fingerprint = read_current(path)?.map(|bytes| sha256_hex(&bytes));

        Ok(Self {
            path: path.to_path_buf(),
            fingerprint,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// Read the persisted ledger, or an empty one if the file is absent.
    pub fn load(&mut self) -> Result<Ledger, LedgerError> {
        match read_current(&self.path)? {
            Some(bytes) => {
                let ledger = decode_ledger(&bytes)?;
                self.fingerprint = Some(sha256_hex(&bytes));
                debug!(path = %self.path.display(), records = ledger.len(), "ledger loaded");
                Ok(ledger)
            }
            None => {
                self.fingerprint = None;
                debug!(path = %self.path.display(), "no ledger file, starting empty");
                Ok(Ledger::new())
            }
        }
    }

    /// Persist `ledger` with `record` appended and return the new ledger.
    pub fn append(&mut self, ledger: &Ledger, record: VisitRecord) -> Result<Ledger, LedgerError> {
        let on_disk = read_current(&self.path)?.map(|bytes| sha256_hex(&bytes));
        if on_disk != self.fingerprint {
            warn!(
                path = %self.path.display(),
                expected = ?self.fingerprint,
                found = ?on_disk,
                "ledger changed on disk since last load"
            );
            return Err(LedgerError::ConcurrentModification {
                path: self.path.clone(),
            });
        }

        let mut next = ledger.clone();
        next.push(record);

        let bytes = encode_ledger(&next, DateStyle::Timestamp)?;
        write_atomic(&self.path, &bytes)?;
        self.fingerprint = Some(sha256_hex(&bytes));

        debug!(path = %self.path.display(), records = next.len(), "ledger persisted");
        Ok(next)
    }

    /// Delete the persisted ledger. Absent file is fine; any other
    /// failure propagates.
    pub fn clear(&mut self) -> Result<(), LedgerError> {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "ledger file removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.fingerprint = None;
        Ok(())
    }

    /// Full ledger as downloadable CSV, `Date` rendered as a long date.
    pub fn to_export_blob(ledger: &Ledger) -> Result<Vec<u8>, LedgerError> {
        encode_ledger(ledger, DateStyle::LongDate)
    }
}

fn read_current(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Write to a uniquely named temp file beside `path`, fsync, then
/// rename it over `path`. Concurrent writers never share a temp file.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
