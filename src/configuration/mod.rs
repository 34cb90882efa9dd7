//! Top-level yMMSL documents.
//!
//! A [`PartialConfiguration`] is any document fragment: every section is
//! optional and cross-references are not checked, so a model can be split
//! over several files or overlaid by experiment settings. A
//! [`Configuration`] is a fragment whose model is internally consistent.

mod merge;

use crate::checkpoint::Checkpoints;
use crate::document::DocPath;
use crate::error::{Error, Result, ResultExt};
use crate::execution::{Implementation, ResourceRequirements};
use crate::identity::{Identifier, Reference};
use crate::model::Model;
use crate::settings::Settings;

use indexmap::IndexMap;
use std::fmt;

/// The only document format version understood.
pub const YMMSL_VERSION: &str = "v0.1";

pub type Implementations = IndexMap<Reference, Implementation>;
pub type Resources = IndexMap<Reference, ResourceRequirements>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PartialConfiguration {
    pub model: Option<Model>,
    pub settings: Option<Settings>,
    /// Keyed by implementation name.
    pub implementations: Option<Implementations>,
    /// Keyed by component name.
    pub resources: Option<Resources>,
    pub checkpoints: Option<Checkpoints>,
}

impl PartialConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an implementation, keyed by its name.
    pub fn add_implementation(&mut self, implementation: Implementation) {
        self.implementations
            .get_or_insert_with(IndexMap::new)
            .insert(implementation.name.clone(), implementation);
    }

    pub fn set_resources(&mut self, component: Reference, resources: ResourceRequirements) {
        self.resources
            .get_or_insert_with(IndexMap::new)
            .insert(component, resources);
    }

    pub fn is_empty(&self) -> bool {
        self.model.is_none()
            && self.settings.is_none()
            && self.implementations.is_none()
            && self.resources.is_none()
            && self.checkpoints.is_none()
    }
}

/// A document whose model has been checked for consistency and whose
/// checkpoints section, if any, requests something.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    inner: PartialConfiguration,
}

impl Configuration {
    /// Validate a fragment as a standalone configuration.
    pub fn new(partial: PartialConfiguration) -> Result<Self> {
        let root = DocPath::root();
        if let Some(model) = &partial.model {
            model
                .check_consistent()
                .at(&root.join("model").join("conduits"))?;
        }
        let impls = root.join("implementations");
        for (name, implementation) in partial.implementations.iter().flatten() {
            implementation.check().at(&impls.join(name))?;
        }
        if let Some(checkpoints) = &partial.checkpoints {
            checkpoints.check().at(&root.join("checkpoints"))?;
        }
        Ok(Self { inner: partial })
    }

    pub fn model(&self) -> Option<&Model> {
        self.inner.model.as_ref()
    }

    pub fn settings(&self) -> Option<&Settings> {
        self.inner.settings.as_ref()
    }

    pub fn implementations(&self) -> Option<&Implementations> {
        self.inner.implementations.as_ref()
    }

    pub fn resources(&self) -> Option<&Resources> {
        self.inner.resources.as_ref()
    }

    pub fn checkpoints(&self) -> Option<&Checkpoints> {
        self.inner.checkpoints.as_ref()
    }

    pub fn as_partial(&self) -> &PartialConfiguration {
        &self.inner
    }

    pub fn into_partial(self) -> PartialConfiguration {
        self.inner
    }

    /// Overlay a fragment onto this configuration.
    ///
    /// See [`PartialConfiguration::merged`] for the rules. The result is
    /// checked for consistency again. Not commutative: on conflicting keys
    /// the overlay wins.
    pub fn merge(&self, overlay: &PartialConfiguration) -> Result<Configuration> {
        Configuration::new(self.inner.merged(overlay)?)
    }

    /// Overlay a complete configuration, treating it as a fragment.
    pub fn merge_configuration(&self, overlay: &Configuration) -> Result<Configuration> {
        self.merge(&overlay.inner)
    }

    /// Things missing before this configuration can be run.
    ///
    /// Every component needs an implementation that is defined here, and a
    /// resource request.
    pub fn check_runnable(&self) -> Vec<RunProblem> {
        let Some(model) = self.model() else {
            return vec![RunProblem::NoModel];
        };

        let mut problems = Vec::new();
        for comp in model.components() {
            match comp.implementation() {
                None => problems.push(RunProblem::NoImplementation(comp.name().clone())),
                Some(imp) => {
                    let known = self
                        .implementations()
                        .is_some_and(|impls| impls.contains_key(imp));
                    if !known {
                        problems.push(RunProblem::UnknownImplementation {
                            component: comp.name().clone(),
                            implementation: imp.clone(),
                        });
                    }
                }
            }

            let name = Reference::from(comp.name().clone());
            if !self.resources().is_some_and(|res| res.contains_key(&name)) {
                problems.push(RunProblem::NoResources(comp.name().clone()));
            }
        }
        problems
    }
}

impl TryFrom<PartialConfiguration> for Configuration {
    type Error = Error;

    fn try_from(partial: PartialConfiguration) -> Result<Self> {
        Configuration::new(partial)
    }
}

impl From<Configuration> for PartialConfiguration {
    fn from(config: Configuration) -> Self {
        config.inner
    }
}

/// A reason a configuration cannot be run yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunProblem {
    NoModel,
    NoImplementation(Identifier),
    UnknownImplementation {
        component: Identifier,
        implementation: Reference,
    },
    NoResources(Identifier),
}

impl fmt::Display for RunProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoModel => write!(f, "no model is defined"),
            Self::NoImplementation(c) => write!(f, "component `{c}` has no implementation"),
            Self::UnknownImplementation {
                component,
                implementation,
            } => write!(
                f,
                "component `{component}` uses implementation `{implementation}`, which is not defined"
            ),
            Self::NoResources(c) => write!(f, "component `{c}` has no resource request"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Component, Conduit};
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> Identifier {
        Identifier::new(s).unwrap()
    }

    fn r(s: &str) -> Reference {
        Reference::parse(s).unwrap()
    }

    #[test]
    fn configuration_checks_model_consistency() {
        let model = Model::new(
            id("m"),
            vec![Component::new(id("a"))],
            vec![Conduit::parse("a.out", "b.in").unwrap()],
        )
        .unwrap();
        let partial = PartialConfiguration {
            model: Some(model),
            ..Default::default()
        };
        let err = Configuration::try_from(partial).unwrap_err();
        assert!(matches!(err.root(), Error::UnknownComponent { .. }));
        assert_eq!(err.path().unwrap().to_string(), "/model/conduits");
    }

    #[test]
    fn runnable_needs_implementations_and_resources() {
        let model = Model::new(
            id("m"),
            vec![
                Component::new(id("a")).with_implementation(r("impl_a")).unwrap(),
                Component::new(id("b")),
            ],
            vec![],
        )
        .unwrap();
        let mut partial = PartialConfiguration {
            model: Some(model),
            ..Default::default()
        };
        partial.add_implementation(Implementation::executable(r("impl_a"), "/bin/a"));
        partial.set_resources(r("a"), ResourceRequirements::threaded(1).unwrap());

        let config = Configuration::new(partial).unwrap();
        assert_eq!(
            config.check_runnable(),
            vec![
                RunProblem::NoImplementation(id("b")),
                RunProblem::NoResources(id("b")),
            ]
        );
        assert_eq!(
            Configuration::new(PartialConfiguration::new())
                .unwrap()
                .check_runnable(),
            vec![RunProblem::NoModel]
        );
    }
}
