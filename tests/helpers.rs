// Shared test helpers that write small MaxMind DB files.
//
// The files are real MMDB v2 databases (IPv4 search tree, 24-bit records),
// so tests built on them run the maxminddb decoder rather than the in-memory
// engine.
#![allow(dead_code)] // Each test file uses a different subset

use std::fs;
use std::net::Ipv4Addr;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

const METADATA_MARKER: &[u8] = b"\xab\xcd\xefMaxMind.com";
const DATA_SECTION_SEPARATOR: usize = 16;

/// A value in MaxMind DB data section terms.
pub enum Value {
    Str(&'static str),
    Double(f64),
    U16(u16),
    U32(u32),
    U64(u64),
    Bool(bool),
    Map(Vec<(&'static str, Value)>),
    Array(Vec<Value>),
}

impl Value {
    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Value::Str(s) => {
                control(out, 2, s.len());
                out.extend_from_slice(s.as_bytes());
            }
            Value::Double(d) => {
                control(out, 3, 8);
                out.extend_from_slice(&d.to_be_bytes());
            }
            Value::U16(n) => {
                control(out, 5, 2);
                out.extend_from_slice(&n.to_be_bytes());
            }
            Value::U32(n) => {
                control(out, 6, 4);
                out.extend_from_slice(&n.to_be_bytes());
            }
            Value::Map(pairs) => {
                control(out, 7, pairs.len());
                for (key, value) in pairs {
                    Value::Str(*key).encode(out);
                    value.encode(out);
                }
            }
            Value::U64(n) => {
                control(out, 9, 8);
                out.extend_from_slice(&n.to_be_bytes());
            }
            Value::Array(items) => {
                control(out, 11, items.len());
                for item in items {
                    item.encode(out);
                }
            }
            // the size field carries the value
            Value::Bool(b) => control(out, 14, usize::from(*b)),
        }
    }
}

/// Control byte, extended type byte and size bytes for one field.
fn control(out: &mut Vec<u8>, type_num: u8, size: usize) {
    let (head, extended) = if type_num <= 7 {
        (type_num << 5, None)
    } else {
        (0, Some(type_num - 7))
    };
    let (size_bits, size_bytes): (u8, Vec<u8>) = if size < 29 {
        (size as u8, vec![])
    } else if size < 285 {
        (29, vec![(size - 29) as u8])
    } else {
        (30, u16::try_from(size - 285).unwrap().to_be_bytes().to_vec())
    };
    out.push(head | size_bits);
    out.extend(extended);
    out.extend(size_bytes);
}

#[derive(Clone, Copy)]
enum Slot {
    Empty,
    Node(u32),
    Data(u32),
}

/// Builds an IPv4 database holding one entry per /32 address.
pub struct MmdbBuilder {
    database_type: &'static str,
    entries: Vec<(Ipv4Addr, Value)>,
}

impl MmdbBuilder {
    pub fn new(database_type: &'static str) -> Self {
        Self {
            database_type,
            entries: Vec::new(),
        }
    }

    pub fn entry(mut self, ip: &str, value: Value) -> Self {
        self.entries.push((ip.parse().unwrap(), value));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut nodes = vec![[Slot::Empty; 2]];
        let mut data = Vec::new();

        for (ip, value) in &self.entries {
            let offset = u32::try_from(data.len()).unwrap();
            value.encode(&mut data);

            let bits = u32::from(*ip);
            let mut node = 0;
            for depth in 0..32 {
                let bit = ((bits >> (31 - depth)) & 1) as usize;
                if depth == 31 {
                    nodes[node][bit] = Slot::Data(offset);
                    break;
                }
                node = match nodes[node][bit] {
                    Slot::Node(next) => next as usize,
                    _ => {
                        nodes.push([Slot::Empty; 2]);
                        let next = nodes.len() - 1;
                        nodes[node][bit] = Slot::Node(next as u32);
                        next
                    }
                };
            }
        }

        let node_count = u32::try_from(nodes.len()).unwrap();
        let mut out = Vec::new();
        for node in &nodes {
            for slot in node {
                let record = match slot {
                    Slot::Empty => node_count,
                    Slot::Node(next) => *next,
                    Slot::Data(offset) => node_count + DATA_SECTION_SEPARATOR as u32 + offset,
                };
                out.extend_from_slice(&record.to_be_bytes()[1..]);
            }
        }
        out.extend_from_slice(&[0; DATA_SECTION_SEPARATOR]);
        out.extend_from_slice(&data);

        out.extend_from_slice(METADATA_MARKER);
        Value::Map(vec![
            ("binary_format_major_version", Value::U16(2)),
            ("binary_format_minor_version", Value::U16(0)),
            ("build_epoch", Value::U64(1_700_000_000)),
            ("database_type", Value::Str(self.database_type)),
            (
                "description",
                Value::Map(vec![("en", Value::Str("geolookup test database"))]),
            ),
            ("ip_version", Value::U16(4)),
            ("languages", Value::Array(vec![Value::Str("en")])),
            ("node_count", Value::U32(node_count)),
            ("record_size", Value::U16(24)),
        ])
        .encode(&mut out);
        out
    }

    pub fn write(&self, dir: &Utf8Path, file_name: &str) -> Utf8PathBuf {
        let path = dir.join(file_name);
        fs::write(&path, self.build()).expect("Failed to write test database");
        path
    }
}

/// A City and an ASN database in a temporary directory, named the way the
/// default lookup expects.
pub struct TestDatabases {
    // Removed on drop
    _dir: TempDir,
    pub dir: Utf8PathBuf,
    pub city: Utf8PathBuf,
    pub asn: Utf8PathBuf,
}

fn names(en: &'static str) -> Value {
    Value::Map(vec![("en", Value::Str(en)), ("de", Value::Str(en))])
}

/// GeoLite2-shaped City entry for 8.8.8.8, with a country-level location.
pub fn google_city() -> Value {
    Value::Map(vec![
        (
            "continent",
            Value::Map(vec![
                ("code", Value::Str("NA")),
                ("geoname_id", Value::U32(6255149)),
                ("names", names("North America")),
            ]),
        ),
        (
            "country",
            Value::Map(vec![
                ("geoname_id", Value::U32(6252001)),
                ("iso_code", Value::Str("US")),
                ("names", names("United States")),
            ]),
        ),
        (
            "location",
            Value::Map(vec![
                ("accuracy_radius", Value::U16(1000)),
                ("latitude", Value::Double(37.751)),
                ("longitude", Value::Double(-97.822)),
                ("time_zone", Value::Str("America/Chicago")),
            ]),
        ),
        (
            "registered_country",
            Value::Map(vec![
                ("iso_code", Value::Str("US")),
                ("is_in_european_union", Value::Bool(false)),
            ]),
        ),
    ])
}

/// GeoLite2-shaped City entry for 81.2.69.142, inside the EU.
pub fn london_city() -> Value {
    Value::Map(vec![
        ("city", Value::Map(vec![("names", names("London"))])),
        (
            "continent",
            Value::Map(vec![("code", Value::Str("EU")), ("names", names("Europe"))]),
        ),
        (
            "country",
            Value::Map(vec![
                ("is_in_european_union", Value::Bool(true)),
                ("iso_code", Value::Str("GB")),
                ("names", names("United Kingdom")),
            ]),
        ),
        (
            "location",
            Value::Map(vec![
                ("latitude", Value::Double(51.5142)),
                ("longitude", Value::Double(-0.0931)),
            ]),
        ),
        (
            "subdivisions",
            Value::Array(vec![Value::Map(vec![
                ("iso_code", Value::Str("ENG")),
                ("names", names("England")),
            ])]),
        ),
        ("traits", Value::Map(vec![("user_count", Value::U64(42))])),
    ])
}

pub fn create_test_databases() -> TestDatabases {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let dir = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 temp dir");

    let city = MmdbBuilder::new("GeoLite2-City")
        .entry("8.8.8.8", google_city())
        .entry("81.2.69.142", london_city())
        .write(&dir, "GeoLite2-City.mmdb");
    let asn = MmdbBuilder::new("GeoLite2-ASN")
        .entry(
            "8.8.8.8",
            Value::Map(vec![
                ("autonomous_system_number", Value::U32(15169)),
                ("autonomous_system_organization", Value::Str("GOOGLE")),
            ]),
        )
        .entry(
            "81.2.69.142",
            Value::Map(vec![("autonomous_system_number", Value::U32(20712))]),
        )
        .write(&dir, "GeoLite2-ASN.mmdb");

    TestDatabases {
        _dir: tmp,
        dir,
        city,
        asn,
    }
}
