//! Autonomous-system ownership of an address.
//!
//! The AS query runs against its own database and never shares a handle or
//! an outcome with the geolocation query. Whatever goes wrong here degrades
//! the AS field only.

use std::fmt;

use camino::Utf8Path;
use serde::{Serialize, Serializer};

use crate::engine::{GeoDatabase, GeoEngine, Lookup};
use crate::error::LookupError;
use crate::extract::extract;
use crate::path::FieldPath;

/// Organization names longer than this many characters are cut.
pub const ORGANIZATION_DISPLAY_LIMIT: usize = 48;

/// Shown when the entry has a number but no organization.
pub const UNKNOWN_ORGANIZATION: &str = "Unknown";

const NUMBER_PATH: FieldPath<'static> = FieldPath::new(&["autonomous_system_number"]);
const ORGANIZATION_PATH: FieldPath<'static> =
    FieldPath::new(&["autonomous_system_organization"]);

/// Why no AS could be reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AsFailure {
    /// An entry was found but it has no AS number.
    MissingNumber,
    Open,
    AddressResolution,
    Engine,
    Decode,
    NotFound,
}

impl AsFailure {
    /// Numeric code shown in the report, matching the process exit codes.
    pub fn code(self) -> u8 {
        match self {
            AsFailure::MissingNumber => 0,
            AsFailure::Open => 1,
            AsFailure::AddressResolution => 2,
            AsFailure::Engine => 3,
            AsFailure::Decode => 4,
            AsFailure::NotFound => 5,
        }
    }
}

impl From<&LookupError> for AsFailure {
    fn from(err: &LookupError) -> Self {
        match err {
            LookupError::Open { .. } => AsFailure::Open,
            LookupError::AddressResolution { .. } => AsFailure::AddressResolution,
            LookupError::Engine { .. } => AsFailure::Engine,
            LookupError::Decode { .. } => AsFailure::Decode,
        }
    }
}

/// The AS owning an address, or the reason it is unknown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AsRecord {
    Known { number: String, organization: String },
    Unknown(AsFailure),
}

impl AsRecord {
    /// Build a known record, truncating the organization for display.
    pub fn known(number: impl Into<String>, organization: Option<String>) -> AsRecord {
        let organization = match organization {
            Some(org) => truncate_organization(org),
            None => UNKNOWN_ORGANIZATION.to_string(),
        };
        AsRecord::Known {
            number: number.into(),
            organization,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, AsRecord::Known { .. })
    }
}

/// `AS<number>: <organization>` or `Unknown - Exit Code: <code>`.
impl fmt::Display for AsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsRecord::Known {
                number,
                organization,
            } => write!(f, "AS{number}: {organization}"),
            AsRecord::Unknown(failure) => write!(f, "Unknown - Exit Code: {}", failure.code()),
        }
    }
}

impl Serialize for AsRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Cut `org` to [`ORGANIZATION_DISPLAY_LIMIT`] characters.
///
/// Counts characters, not bytes, so a multi-byte name is never split inside
/// a character.
pub fn truncate_organization(mut org: String) -> String {
    if let Some((idx, _)) = org.char_indices().nth(ORGANIZATION_DISPLAY_LIMIT) {
        org.truncate(idx);
    }
    org
}

/// Query the ASN database at `path` for `address`.
///
/// Never fails: every problem is folded into [`AsRecord::Unknown`] and
/// logged. The database is closed before returning.
pub fn resolve_as<E: GeoEngine>(engine: &E, path: &Utf8Path, address: &str) -> AsRecord {
    let lookup = engine.open(path).and_then(|db| db.lookup(address));

    let entry = match lookup {
        Ok(Lookup::Found(entry)) => entry,
        Ok(Lookup::NotFound) => {
            log::warn!("no AS entry for this IP address ({address}) was found");
            return AsRecord::Unknown(AsFailure::NotFound);
        }
        Err(err) => {
            log::warn!("AS lookup failed: {err}: {}", source_message(&err));
            return AsRecord::Unknown(AsFailure::from(&err));
        }
    };

    match extract(&entry, NUMBER_PATH) {
        Some(number) => AsRecord::known(number, extract(&entry, ORGANIZATION_PATH)),
        None => {
            log::warn!("AS entry for {address} has no autonomous_system_number");
            AsRecord::Unknown(AsFailure::MissingNumber)
        }
    }
}

fn source_message(err: &LookupError) -> String {
    std::error::Error::source(err)
        .map(|source| source.to_string())
        .unwrap_or_default()
}
