//! Addresses of nodes in the remote scene tree

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Delimiter between segments in the wire form of a path
pub const PATH_DELIMITER: char = '/';

/// Ordered list of segments addressing a node in the scene tree.
///
/// A `Path` never changes after construction: [`Path::append`] returns a new
/// value and leaves the receiver untouched. Segments are opaque; nothing is
/// reserved or validated here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// Path with a single segment
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            segments: vec![name.into()],
        }
    }

    /// Child path: these segments followed by `segment`
    pub fn append(&self, segment: impl Into<String>) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment.into());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Wire form: segments joined by [`PATH_DELIMITER`]
    pub fn to_wire(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push(PATH_DELIMITER);
            }
            out.push_str(segment);
        }
        out
    }

    /// Inverse of [`Path::to_wire`] for segments that do not contain the delimiter
    pub fn from_wire(wire: &str) -> Self {
        Self {
            segments: wire.split(PATH_DELIMITER).map(String::from).collect(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl<S: Into<String>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = String::deserialize(deserializer)?;
        Ok(Path::from_wire(&wire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_has_one_segment() {
        let path = Path::root("meshcat");
        assert_eq!(path.segments(), ["meshcat"]);
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn test_append_leaves_original_untouched() {
        let parent = Path::root("meshcat");
        let child = parent.append("box");

        assert_eq!(parent.segments(), ["meshcat"]);
        assert_eq!(child.segments(), ["meshcat", "box"]);
    }

    #[test]
    fn test_append_extends_segments_by_one() {
        let base: Path = ["a", "b", "c"].into_iter().collect();
        for segment in ["", "d", "with space", "ünïcode"] {
            let next = base.append(segment);
            let mut expected = base.segments().to_vec();
            expected.push(segment.to_string());
            assert_eq!(next.segments(), expected.as_slice());
        }
        assert_eq!(base.len(), 3);
    }

    #[test]
    fn test_siblings_are_disjoint() {
        let root = Path::root("root");
        let a = root.append("a");
        let b = root.append("b");
        assert_ne!(a, b);
        assert_eq!(a.to_wire(), "root/a");
        assert_eq!(b.to_wire(), "root/b");
    }

    #[test]
    fn test_wire_form() {
        let path = Path::root("meshcat").append("robot").append("arm");
        assert_eq!(path.to_wire(), "meshcat/robot/arm");
        assert_eq!(path.to_string(), "meshcat/robot/arm");
        assert_eq!(Path::from_wire("meshcat/robot/arm"), path);
    }

    #[test]
    fn test_empty_segments_survive_wire_form() {
        let path = Path::root("").append("x").append("");
        assert_eq!(path.to_wire(), "/x/");
        assert_eq!(Path::from_wire(&path.to_wire()), path);
    }

    #[test]
    fn test_serializes_as_wire_string() {
        let path = Path::root("meshcat").append("box");
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"meshcat/box\"");

        let back: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
