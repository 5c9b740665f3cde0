//! An in-memory engine holding preloaded entries.
//!
//! Entries are keyed by exact address. Besides regular records, an address
//! can be set up to fail the way a damaged database would, which makes every
//! outcome of a query reproducible without database files.

use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};

use crate::engine::{GeoDatabase, GeoEngine, Lookup};
use crate::error::{LookupError, Result};
use crate::record::Record;

#[derive(Clone, Debug)]
enum Entry {
    Record(Record),
    EngineFault(String),
    Corrupt(String),
}

/// A set of entries standing in for one database file.
#[derive(Clone, Debug, Default)]
pub struct MemoryDatabase {
    entries: HashMap<IpAddr, Entry>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry for `ip`.
    pub fn with_entry(mut self, ip: IpAddr, record: Record) -> Self {
        self.entries.insert(ip, Entry::Record(record));
        self
    }

    /// Make searches for `ip` fail inside the engine.
    pub fn with_engine_fault(mut self, ip: IpAddr, message: &str) -> Self {
        self.entries.insert(ip, Entry::EngineFault(message.to_string()));
        self
    }

    /// Make the entry for `ip` undecodable.
    pub fn with_corrupt_entry(mut self, ip: IpAddr, message: &str) -> Self {
        self.entries.insert(ip, Entry::Corrupt(message.to_string()));
        self
    }
}

/// Engine serving [`MemoryDatabase`]s registered under file paths.
///
/// Opening a path with no registered database fails like a missing file.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    databases: HashMap<Utf8PathBuf, Arc<MemoryDatabase>>,
    open_handles: Arc<AtomicUsize>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `db` under `path`.
    pub fn with_database(mut self, path: impl Into<Utf8PathBuf>, db: MemoryDatabase) -> Self {
        self.databases.insert(path.into(), Arc::new(db));
        self
    }

    /// Number of handles opened and not yet dropped.
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }
}

/// Open handle returned by [`MemoryEngine`].
#[derive(Debug)]
pub struct MemoryHandle {
    db: Arc<MemoryDatabase>,
    open_handles: Arc<AtomicUsize>,
}

impl GeoEngine for MemoryEngine {
    type Database = MemoryHandle;

    fn open(&self, path: &Utf8Path) -> Result<MemoryHandle> {
        let db = self.databases.get(path).ok_or_else(|| LookupError::Open {
            path: path.to_owned(),
            source: Box::new(io::Error::new(
                io::ErrorKind::NotFound,
                "no such database",
            )),
        })?;
        self.open_handles.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryHandle {
            db: Arc::clone(db),
            open_handles: Arc::clone(&self.open_handles),
        })
    }
}

impl GeoDatabase for MemoryHandle {
    fn lookup(&self, address: &str) -> Result<Lookup> {
        let ip: IpAddr = address
            .parse()
            .map_err(|e: std::net::AddrParseError| LookupError::AddressResolution {
                address: address.to_string(),
                source: Box::new(e),
            })?;

        match self.db.entries.get(&ip) {
            None => Ok(Lookup::NotFound),
            Some(Entry::Record(record)) => Ok(Lookup::Found(record.clone())),
            Some(Entry::EngineFault(message)) => Err(LookupError::Engine {
                address: address.to_string(),
                source: Box::new(io::Error::other(message.clone())),
            }),
            Some(Entry::Corrupt(message)) => Err(LookupError::Decode {
                address: address.to_string(),
                source: Box::new(io::Error::other(message.clone())),
            }),
        }
    }
}

impl Drop for MemoryHandle {
    fn drop(&mut self) {
        self.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}
