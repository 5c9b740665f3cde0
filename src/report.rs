//! One address in, one combined report out.

use std::io;
use std::panic;
use std::thread;

use serde::Serialize;
use termcolor::{ColorSpec, WriteColor};

use crate::asn::{resolve_as, AsRecord};
use crate::attributes::{resolve_geo, AttributeRecord, Geolocation, PlaceholderPolicy};
use crate::config::DatabaseConfig;
use crate::engine::GeoEngine;
use crate::error::{LookupError, NOT_FOUND_EXIT_CODE};
use crate::record::Record;

/// Resolves addresses against a City and an ASN database.
#[derive(Debug)]
pub struct Resolver<E> {
    engine: E,
    config: DatabaseConfig,
    policy: PlaceholderPolicy,
}

impl<E: GeoEngine> Resolver<E> {
    pub fn new(engine: E, config: DatabaseConfig) -> Self {
        Self {
            engine,
            config,
            policy: PlaceholderPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PlaceholderPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run the geolocation and AS queries for `address`.
    ///
    /// The AS query runs on a scoped thread next to the geolocation query.
    /// Neither waits on or observes the other; each outcome lands in its own
    /// field of the report.
    pub fn resolve(&self, address: &str) -> Report {
        thread::scope(|scope| {
            let asn = scope.spawn(|| resolve_as(&self.engine, &self.config.asn, address));
            let geo = resolve_geo(&self.engine, &self.config.city, address, self.policy);
            let asn = asn
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload));
            Report {
                address: address.to_string(),
                geo,
                asn,
            }
        })
    }
}

/// Combined outcome of both queries for one address.
#[derive(Debug)]
pub struct Report {
    pub address: String,
    /// `Ok(None)` when the City database has no entry for the address.
    pub geo: Result<Option<Geolocation>, LookupError>,
    pub asn: AsRecord,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    address: &'a str,
    #[serde(flatten)]
    attributes: &'a AttributeRecord,
    #[serde(rename = "as")]
    asn: &'a AsRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    entry: Option<&'a Record>,
}

impl Report {
    /// The geolocation, when the address was located.
    pub fn located(&self) -> Option<&Geolocation> {
        match &self.geo {
            Ok(Some(geo)) => Some(geo),
            _ => None,
        }
    }

    /// Process exit code for this report. Only the geolocation query decides
    /// it; a failed AS query shows up in the AS field instead.
    pub fn exit_code(&self) -> u8 {
        match &self.geo {
            Ok(Some(_)) => 0,
            Ok(None) => NOT_FOUND_EXIT_CODE,
            Err(err) => err.exit_code(),
        }
    }

    /// Write the human-readable report. Writes nothing unless located.
    pub fn write_text<W: WriteColor>(&self, out: &mut W) -> io::Result<()> {
        let Some(geo) = self.located() else {
            return Ok(());
        };
        let a = &geo.attributes;

        writeln!(out)?;
        label(out, "Address:")?;
        writeln!(out, "\t{}", self.address)?;
        label(out, "CountryCode:")?;
        writeln!(out, "\t{}", a.country_code)?;
        label(out, "Country:")?;
        writeln!(
            out,
            "\t{}: {}, {}: {}",
            a.continent_code, a.continent, a.country_code, a.country
        )?;
        label(out, "City:")?;
        writeln!(
            out,
            "\t\t{}, {}, {}, {}, {}",
            a.region_code, a.city, a.region, a.latitude, a.longitude
        )?;
        label(out, "AS Number:")?;
        writeln!(out, "\t{}", self.asn)?;
        writeln!(out)?;
        Ok(())
    }

    /// Write the report as one pretty-printed JSON object, keys in report
    /// order. Writes nothing unless located.
    pub fn write_json<W: io::Write>(
        &self,
        mut out: W,
        include_entry: bool,
    ) -> serde_json::Result<()> {
        let Some(geo) = self.located() else {
            return Ok(());
        };
        let report = JsonReport {
            address: &self.address,
            attributes: &geo.attributes,
            asn: &self.asn,
            entry: include_entry.then_some(&geo.entry),
        };
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out).map_err(serde_json::Error::io)
    }
}

fn label<W: WriteColor>(out: &mut W, text: &str) -> io::Result<()> {
    write!(out, "  ")?;
    out.set_color(ColorSpec::new().set_bold(true))?;
    write!(out, "{text}")?;
    out.reset()
}
