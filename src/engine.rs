//! The database engine seam.
//!
//! Resolvers only talk to [`GeoEngine`] and [`GeoDatabase`]. The production
//! engine reads MaxMind DB files through the `maxminddb` crate; tests and
//! preloaded setups use [`crate::memory::MemoryEngine`].

use std::net::IpAddr;

use camino::{Utf8Path, Utf8PathBuf};
use maxminddb::Reader;

use crate::error::{LookupError, Result};
use crate::record::Record;

/// Outcome of a successful search in one database.
#[derive(Clone, Debug, PartialEq)]
pub enum Lookup {
    /// The address has an entry; it has been fully decoded.
    Found(Record),
    /// The address is valid but the database holds nothing for it.
    NotFound,
}

/// An open database. Dropping the handle closes it.
pub trait GeoDatabase {
    /// Search for `address` and decode its entry.
    fn lookup(&self, address: &str) -> Result<Lookup>;
}

/// Opens databases by path.
pub trait GeoEngine: Sync {
    type Database: GeoDatabase;

    fn open(&self, path: &Utf8Path) -> Result<Self::Database>;
}

/// Engine backed by MaxMind DB files on disk.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaxMindEngine;

/// A MaxMind DB file loaded into memory.
pub struct MaxMindDatabase {
    path: Utf8PathBuf,
    reader: Reader<Vec<u8>>,
}

impl MaxMindDatabase {
    /// Database type from the file metadata, e.g. `GeoLite2-City`.
    pub fn database_type(&self) -> &str {
        &self.reader.metadata.database_type
    }
}

impl GeoEngine for MaxMindEngine {
    type Database = MaxMindDatabase;

    fn open(&self, path: &Utf8Path) -> Result<MaxMindDatabase> {
        let reader = Reader::open_readfile(path).map_err(|e| LookupError::Open {
            path: path.to_owned(),
            source: Box::new(e),
        })?;
        let db = MaxMindDatabase {
            path: path.to_owned(),
            reader,
        };
        log::debug!("opened {} ({})", db.path, db.database_type());
        Ok(db)
    }
}

impl GeoDatabase for MaxMindDatabase {
    fn lookup(&self, address: &str) -> Result<Lookup> {
        let ip: IpAddr = address
            .parse()
            .map_err(|e: std::net::AddrParseError| LookupError::AddressResolution {
                address: address.to_string(),
                source: Box::new(e),
            })?;

        let result = self.reader.lookup(ip).map_err(|e| LookupError::Engine {
            address: address.to_string(),
            source: Box::new(e),
        })?;

        if !result.has_data() {
            return Ok(Lookup::NotFound);
        }

        match result.decode::<Record>() {
            Ok(Some(record)) => Ok(Lookup::Found(record)),
            Ok(None) => Ok(Lookup::NotFound),
            Err(e) => Err(LookupError::Decode {
                address: address.to_string(),
                source: Box::new(e),
            }),
        }
    }
}

impl Drop for MaxMindDatabase {
    fn drop(&mut self) {
        log::debug!("closed {}", self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_open_error() {
        let err = MaxMindEngine
            .open(Utf8Path::new("/nonexistent/dir/GeoLite2-City.mmdb"))
            .err()
            .expect("open should fail");
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("GeoLite2-City.mmdb"));
    }

    #[test]
    fn non_mmdb_file_is_an_open_error() {
        let path = Utf8Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
        let err = MaxMindEngine.open(&path).err().expect("open should fail");
        assert!(matches!(err, LookupError::Open { .. }));
    }
}
