//! Reading single fields out of a decoded entry as display strings.

use crate::path::FieldPath;
use crate::record::{Record, TypedValue};

/// Read the value at `path` and render it for display.
///
/// Never fails: a path that cannot be followed, or a value of a type with no
/// rendering, is reported as `None`. Optional geolocation fields are missing
/// routinely, so absence is an ordinary result here.
pub fn extract(record: &Record, path: FieldPath<'_>) -> Option<String> {
    let value = record.value_at(path)?;
    let rendered = render(value);
    if rendered.is_none() {
        log::debug!("no handler for {value:?} at {path}");
    }
    rendered
}

/// Render one leaf value.
///
/// Strings are copied as stored, integers are plain decimal and doubles get
/// six digits after the decimal point.
pub fn render(value: TypedValue<'_>) -> Option<String> {
    match value {
        TypedValue::Utf8(s) => Some(s.to_owned()),
        TypedValue::U16(n) => Some(itoa::Buffer::new().format(n).to_owned()),
        TypedValue::U32(n) => Some(itoa::Buffer::new().format(n).to_owned()),
        TypedValue::Double(d) => Some(format!("{d:.6}")),
        TypedValue::Unsupported(_) => None,
    }
}
