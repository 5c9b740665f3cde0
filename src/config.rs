use camino::{Utf8Path, Utf8PathBuf};

pub const CITY_DB_FILENAME: &str = "GeoLite2-City.mmdb";
pub const ASN_DB_FILENAME: &str = "GeoLite2-ASN.mmdb";

/// Directories searched for the databases when none is given, in order.
pub const DEFAULT_SEARCH_DIRS: [&str; 3] = [
    "/usr/share/GeoIP",
    "/opt/homebrew/var/GeoIP",
    "/var/lib/GeoIP",
];

/// Locations of the two databases a lookup reads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub city: Utf8PathBuf,
    pub asn: Utf8PathBuf,
}

impl DatabaseConfig {
    /// Both databases under their standard names in `dir`.
    pub fn from_dir(dir: &Utf8Path) -> Self {
        Self {
            city: dir.join(CITY_DB_FILENAME),
            asn: dir.join(ASN_DB_FILENAME),
        }
    }

    /// The first of [`DEFAULT_SEARCH_DIRS`] that exists, else the first one.
    pub fn default_dir() -> Utf8PathBuf {
        DEFAULT_SEARCH_DIRS
            .iter()
            .map(Utf8Path::new)
            .find(|dir| dir.is_dir())
            .unwrap_or_else(|| Utf8Path::new(DEFAULT_SEARCH_DIRS[0]))
            .to_owned()
    }

    pub fn with_city(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.city = path.into();
        self
    }

    pub fn with_asn(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.asn = path.into();
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::from_dir(&Self::default_dir())
    }
}
