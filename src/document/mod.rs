//! Reading and writing yMMSL text.
//!
//! Text goes through a generic `serde_yaml::Value` tree in both directions:
//! [`decode`] turns a tree into objects, [`encode`] produces the canonical
//! tree for a set of objects. The functions here only add the YAML syntax
//! layer on top.

pub mod decode;
pub mod encode;
mod path;
mod tree;

pub use path::DocPath;

use crate::configuration::{Configuration, PartialConfiguration};
use crate::error::{Error, Result};

use std::io;

/// Parse a document fragment. Cross-references are not checked.
pub fn load_partial(text: &str) -> Result<PartialConfiguration> {
    let tree = tree::parse(serde_yaml::Deserializer::from_str(text))?;
    decode::partial_configuration(&tree)
}

/// Parse a complete, consistent document.
pub fn load(text: &str) -> Result<Configuration> {
    Configuration::new(load_partial(text)?)
}

/// Read a document fragment from a byte source.
pub fn read(reader: impl io::Read) -> Result<PartialConfiguration> {
    let tree = tree::parse(serde_yaml::Deserializer::from_reader(reader))?;
    decode::partial_configuration(&tree)
}

/// Render in canonical form. Dumping the result of loading a dump gives
/// the same text again.
pub fn dump(config: &impl AsRef<PartialConfiguration>) -> Result<String> {
    serde_yaml::to_string(&encode::partial_configuration(config.as_ref()))
        .map_err(|e| Error::Yaml(e.to_string()))
}

/// Write in canonical form to a byte sink.
pub fn save(config: &impl AsRef<PartialConfiguration>, writer: impl io::Write) -> Result<()> {
    serde_yaml::to_writer(writer, &encode::partial_configuration(config.as_ref()))
        .map_err(|e| Error::Yaml(e.to_string()))
}

impl AsRef<PartialConfiguration> for PartialConfiguration {
    fn as_ref(&self) -> &PartialConfiguration {
        self
    }
}

impl AsRef<PartialConfiguration> for Configuration {
    fn as_ref(&self) -> &PartialConfiguration {
        self.as_partial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Category;
    use pretty_assertions::assert_eq;

    #[test]
    fn malformed_yaml_is_a_syntax_error() {
        let err = load_partial("ymmsl_version: [v0.1\n").unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
        assert_eq!(err.category(), Category::Syntax);
    }

    #[test]
    fn read_and_save_use_byte_streams() {
        let text = "ymmsl_version: v0.1\nsettings:\n  a: 1\n";
        let config = read(text.as_bytes()).unwrap();

        let mut out = Vec::new();
        save(&config, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), dump(&config).unwrap());
    }

    #[test]
    fn load_checks_consistency_but_load_partial_does_not() {
        let text = "ymmsl_version: v0.1
model:
  name: m
  components:
    a: impl_a
  conduits:
    a.out: b.in
";
        assert!(load_partial(text).is_ok());
        let err = load(text).unwrap_err();
        assert_eq!(err.category(), Category::Consistency);
    }

    #[test]
    fn a_component_named_twice_is_a_consistency_error() {
        let text = "ymmsl_version: v0.1
model:
  name: m
  components:
    a: impl_a
    a: impl_b
";
        let err = load_partial(text).unwrap_err();
        assert_eq!(err.root(), &Error::DuplicateComponent("a".into()));
        assert_eq!(err.category(), Category::Consistency);

        let err = read(text.as_bytes()).unwrap_err();
        assert_eq!(err.path().unwrap().to_string(), "/model/components");
    }
}
