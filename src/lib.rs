//! The geolookup library resolves an IP address to geolocation and
//! autonomous-system attributes read from MaxMind databases.
//!
//! Two independent queries make up a lookup: one against a City database,
//! assembled into an [`AttributeRecord`], and one against an ASN database,
//! reduced to an [`AsRecord`]. A failure in either query stays in that
//! query's result.
//!
//! # Examples
//!
//! Resolving against preloaded entries:
//!
//! ```rust
//! use camino::Utf8Path;
//! use geolookup::{DatabaseConfig, MemoryDatabase, MemoryEngine, Record, Resolver};
//!
//! let asn = MemoryDatabase::new().with_entry(
//!     "8.8.8.8".parse().unwrap(),
//!     Record::map([("autonomous_system_number", Record::from(15169u32))]),
//! );
//! let engine = MemoryEngine::new().with_database("/db/GeoLite2-ASN.mmdb", asn);
//! let resolver = Resolver::new(engine, DatabaseConfig::from_dir(Utf8Path::new("/db")));
//!
//! let report = resolver.resolve("8.8.8.8");
//! assert_eq!(report.asn.to_string(), "AS15169: Unknown");
//! // no City database registered
//! assert_eq!(report.exit_code(), 1);
//! ```

pub mod asn;
pub mod attributes;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod memory;
pub mod path;
pub mod record;
pub mod report;

pub use crate::asn::{resolve_as, AsFailure, AsRecord};
pub use crate::attributes::{
    assemble, resolve_geo, Attribute, AttributeRecord, Geolocation, PlaceholderPolicy,
};
pub use crate::config::DatabaseConfig;
pub use crate::engine::{GeoDatabase, GeoEngine, Lookup, MaxMindEngine};
pub use crate::error::{LookupError, NOT_FOUND_EXIT_CODE};
pub use crate::extract::extract;
pub use crate::memory::{MemoryDatabase, MemoryEngine};
pub use crate::path::FieldPath;
pub use crate::record::{Record, TypedValue};
pub use crate::report::{Report, Resolver};
