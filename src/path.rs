use std::fmt;

/// A sequence of segments addressing a leaf inside a decoded record.
///
/// Segments are map keys or, when the current node is an array, decimal
/// indexes (negative values count from the end).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldPath<'a> {
    segments: &'a [&'a str],
}

impl<'a> FieldPath<'a> {
    pub const fn new(segments: &'a [&'a str]) -> FieldPath<'a> {
        FieldPath { segments }
    }

    #[inline]
    pub fn segments(&self) -> &'a [&'a str] {
        self.segments
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Dotted form, e.g. `subdivisions.0.iso_code`.
impl fmt::Display for FieldPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}
