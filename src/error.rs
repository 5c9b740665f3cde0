use camino::Utf8PathBuf;

/// Boxed source error carried by [`LookupError`] variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a single database query.
///
/// A query that fails does not affect any other query: the geolocation and
/// AS lookups each produce their own outcome.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The database file could not be opened or is not a valid MMDB file.
    #[error("can't open {path}")]
    Open {
        path: Utf8PathBuf,
        #[source]
        source: BoxError,
    },

    /// The address string could not be resolved to an IP address.
    #[error("error resolving address {address}")]
    AddressResolution {
        address: String,
        #[source]
        source: BoxError,
    },

    /// The database engine failed while searching for the address.
    #[error("database error while looking up {address}")]
    Engine {
        address: String,
        #[source]
        source: BoxError,
    },

    /// The entry for the address was found but could not be decoded.
    #[error("error decoding the entry for {address}")]
    Decode {
        address: String,
        #[source]
        source: BoxError,
    },
}

impl LookupError {
    /// Process exit code reported when this error ends the geolocation query.
    pub fn exit_code(&self) -> u8 {
        match self {
            LookupError::Open { .. } => 1,
            LookupError::AddressResolution { .. } => 2,
            LookupError::Engine { .. } => 3,
            LookupError::Decode { .. } => 4,
        }
    }
}

/// Exit code for an address that has no entry in the database.
pub const NOT_FOUND_EXIT_CODE: u8 = 5;

/// Convenience type alias for Results using the library error.
pub type Result<T> = std::result::Result<T, LookupError>;
