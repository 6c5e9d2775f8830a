//! Dot-separated destination paths, e.g. `patient_id.weight`.

use std::fmt;

/// A parsed destination path. Every segment but the last names a relation;
/// the last names the field that receives the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationPath {
    segments: Vec<String>,
}

impl DestinationPath {
    /// Parse a declared destination. Returns `None` for an absent or blank
    /// declaration, which callers treat as "nothing to project".
    pub fn parse(declared: Option<&str>) -> Option<Self> {
        let declared = declared.map(str::trim).filter(|d| !d.is_empty())?;
        Some(Self {
            segments: declared.split('.').map(str::to_string).collect(),
        })
    }

    /// The relation segments walked before the final write.
    pub fn relations(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    /// The field written at the end of the walk.
    pub fn field(&self) -> &str {
        // parse() never yields an empty segment list
        &self.segments[self.segments.len() - 1]
    }
}

impl fmt::Display for DestinationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_declarations_are_skipped() {
        assert_eq!(DestinationPath::parse(None), None);
        assert_eq!(DestinationPath::parse(Some("")), None);
        assert_eq!(DestinationPath::parse(Some("   ")), None);
    }

    #[test]
    fn splits_relations_and_field() {
        let path = DestinationPath::parse(Some("patient_id.some_field")).unwrap();
        assert_eq!(path.relations(), ["patient_id".to_string()]);
        assert_eq!(path.field(), "some_field");
        assert_eq!(path.to_string(), "patient_id.some_field");
    }

    #[test]
    fn single_segment_targets_the_response() {
        let path = DestinationPath::parse(Some("note")).unwrap();
        assert!(path.relations().is_empty());
        assert_eq!(path.field(), "note");
    }
}
