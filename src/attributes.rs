//! Assembling the geolocation attribute record.

use std::fmt;

use camino::Utf8Path;
use serde::Serialize;

use crate::engine::{GeoDatabase, GeoEngine, Lookup};
use crate::error::Result;
use crate::extract::extract;
use crate::path::FieldPath;
use crate::record::Record;

/// Rendered in place of an attribute the database does not provide.
pub const PLACEHOLDER: &str = "--";

/// The fixed set of geolocation attributes, in report order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    ContinentCode,
    Continent,
    CountryCode,
    Country,
    City,
    RegionCode,
    Region,
    Latitude,
    Longitude,
}

impl Attribute {
    pub const ALL: [Attribute; 9] = [
        Attribute::ContinentCode,
        Attribute::Continent,
        Attribute::CountryCode,
        Attribute::Country,
        Attribute::City,
        Attribute::RegionCode,
        Attribute::Region,
        Attribute::Latitude,
        Attribute::Longitude,
    ];

    /// Where the attribute lives in a City database entry.
    pub fn path(self) -> FieldPath<'static> {
        match self {
            Attribute::ContinentCode => FieldPath::new(&["continent", "code"]),
            Attribute::Continent => FieldPath::new(&["continent", "names", "en"]),
            Attribute::CountryCode => FieldPath::new(&["country", "iso_code"]),
            Attribute::Country => FieldPath::new(&["country", "names", "en"]),
            Attribute::City => FieldPath::new(&["city", "names", "en"]),
            Attribute::RegionCode => FieldPath::new(&["subdivisions", "0", "iso_code"]),
            Attribute::Region => FieldPath::new(&["subdivisions", "0", "names", "en"]),
            Attribute::Latitude => FieldPath::new(&["location", "latitude"]),
            Attribute::Longitude => FieldPath::new(&["location", "longitude"]),
        }
    }

    /// Key used in JSON output.
    pub const fn key(self) -> &'static str {
        match self {
            Attribute::ContinentCode => "continent_code",
            Attribute::Continent => "continent",
            Attribute::CountryCode => "country_code",
            Attribute::Country => "country",
            Attribute::City => "city",
            Attribute::RegionCode => "region_code",
            Attribute::Region => "region",
            Attribute::Latitude => "latitude",
            Attribute::Longitude => "longitude",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// How absent attributes are filled in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaceholderPolicy {
    /// Every absent attribute becomes [`PLACEHOLDER`].
    #[default]
    Uniform,
    /// Only city and region attributes become [`PLACEHOLDER`]; the rest
    /// become empty strings, as older releases of the lookup tool printed.
    Legacy,
}

impl PlaceholderPolicy {
    /// Fill-in text for `attribute` when the entry lacks it.
    pub fn fallback(self, attribute: Attribute) -> &'static str {
        match (self, attribute) {
            (PlaceholderPolicy::Uniform, _) => PLACEHOLDER,
            (
                PlaceholderPolicy::Legacy,
                Attribute::City | Attribute::RegionCode | Attribute::Region,
            ) => PLACEHOLDER,
            (PlaceholderPolicy::Legacy, _) => "",
        }
    }
}

/// Geolocation attributes of one address. Every attribute is always set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttributeRecord {
    pub continent_code: String,
    pub continent: String,
    pub country_code: String,
    pub country: String,
    pub city: String,
    pub region_code: String,
    pub region: String,
    pub latitude: String,
    pub longitude: String,
}

impl AttributeRecord {
    pub fn get(&self, attribute: Attribute) -> &str {
        match attribute {
            Attribute::ContinentCode => &self.continent_code,
            Attribute::Continent => &self.continent,
            Attribute::CountryCode => &self.country_code,
            Attribute::Country => &self.country,
            Attribute::City => &self.city,
            Attribute::RegionCode => &self.region_code,
            Attribute::Region => &self.region,
            Attribute::Latitude => &self.latitude,
            Attribute::Longitude => &self.longitude,
        }
    }

    /// Attributes paired with their values, in report order.
    pub fn iter(&self) -> impl Iterator<Item = (Attribute, &str)> + '_ {
        Attribute::ALL.into_iter().map(move |a| (a, self.get(a)))
    }
}

/// Build the attribute record for a decoded City database entry.
///
/// Each attribute is read independently of the others; anything missing is
/// filled in according to `policy`.
pub fn assemble(record: &Record, policy: PlaceholderPolicy) -> AttributeRecord {
    let field = |attribute: Attribute| {
        extract(record, attribute.path()).unwrap_or_else(|| policy.fallback(attribute).to_owned())
    };

    AttributeRecord {
        continent_code: field(Attribute::ContinentCode),
        continent: field(Attribute::Continent),
        country_code: field(Attribute::CountryCode),
        country: field(Attribute::Country),
        city: field(Attribute::City),
        region_code: field(Attribute::RegionCode),
        region: field(Attribute::Region),
        latitude: field(Attribute::Latitude),
        longitude: field(Attribute::Longitude),
    }
}

/// A located address: the decoded entry and the attributes read from it.
#[derive(Clone, Debug, PartialEq)]
pub struct Geolocation {
    pub entry: Record,
    pub attributes: AttributeRecord,
}

/// Query the City database at `path` for `address`.
///
/// Returns `Ok(None)` when the database has no entry for the address. The
/// database is closed before returning on every path.
pub fn resolve_geo<E: GeoEngine>(
    engine: &E,
    path: &Utf8Path,
    address: &str,
    policy: PlaceholderPolicy,
) -> Result<Option<Geolocation>> {
    let db = engine.open(path)?;
    match db.lookup(address)? {
        Lookup::Found(entry) => {
            let attributes = assemble(&entry, policy);
            Ok(Some(Geolocation { entry, attributes }))
        }
        Lookup::NotFound => {
            log::info!("no entry for {address} in {path}");
            Ok(None)
        }
    }
}
