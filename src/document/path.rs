//! Locations inside a document tree.
//!
//! Example: the multiplicity of component `macro` is at
//! `/model/components/macro/multiplicity`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DocPath(Vec<String>);

impl DocPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path of a child node, by key or sequence index.
    pub fn join(&self, segment: impl fmt::Display) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_as_slash_separated() {
        assert_eq!(DocPath::root().to_string(), "/");
        let p = DocPath::root().join("settings").join("a.b[1]").join(0);
        assert_eq!(p.to_string(), "/settings/a.b[1]/0");
        assert_eq!(p.segments().len(), 3);
    }
}
