//! Coupled simulation models: components connected by conduits.
//!
//! A [`Model`] checks the structural invariants that hold for any document
//! fragment on construction (unique component names, one conduit per
//! receiving port). Cross-references between conduits and components are
//! checked separately by [`Model::check_consistent`], since a fragment may
//! wire up components that another fragment declares.

pub mod component;
pub mod conduit;

pub use component::{Component, Operator, Port};
pub use conduit::Conduit;

use crate::error::{Error, Result};
use crate::identity::{Identifier, Reference};

use indexmap::IndexMap;
use std::collections::HashSet;

/// Receiving port name that the runtime connects implicitly to every
/// component, so it is accepted even when not declared.
pub const SETTINGS_IN_PORT: &str = "muscle_settings_in";

/// Conduits are kept grouped by sender, senders in first-seen order, which
/// is also the order in which they are written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    name: Identifier,
    components: Vec<Component>,
    conduits: Vec<Conduit>,
}

impl Model {
    pub fn new(name: Identifier, components: Vec<Component>, conduits: Vec<Conduit>) -> Result<Self> {
        let mut names = HashSet::new();
        for comp in &components {
            if !names.insert(comp.name()) {
                return Err(Error::DuplicateComponent(comp.name().to_string()));
            }
        }

        let mut receivers = HashSet::new();
        for conduit in &conduits {
            if !receivers.insert(conduit.receiver()) {
                return Err(Error::DuplicateReceiver(conduit.receiver().to_string()));
            }
        }

        Ok(Self {
            name,
            components,
            conduits: grouped_by_sender(conduits),
        })
    }

    pub fn name(&self) -> &Identifier {
        &self.name
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn conduits(&self) -> &[Conduit] {
        &self.conduits
    }

    pub fn component(&self, name: &Identifier) -> Option<&Component> {
        self.components.iter().find(|c| c.name() == name)
    }

    fn component_by_ref(&self, name: &Reference) -> Option<&Component> {
        match name.parts() {
            [part] => part.as_identifier().and_then(|id| self.component(id)),
            _ => None,
        }
    }

    /// Conduits grouped by sender, senders in first-seen order.
    pub fn conduits_by_sender(&self) -> IndexMap<&Reference, Vec<&Reference>> {
        let mut out: IndexMap<&Reference, Vec<&Reference>> = IndexMap::new();
        for conduit in &self.conduits {
            out.entry(conduit.sender())
                .or_default()
                .push(conduit.receiver());
        }
        out
    }

    /// Check that every conduit connects existing ports in the right
    /// direction and does not use slots.
    ///
    /// Components that declare no ports accept any port name.
    pub fn check_consistent(&self) -> Result<()> {
        for conduit in &self.conduits {
            if !conduit.sending_slot().is_empty() || !conduit.receiving_slot().is_empty() {
                return Err(Error::SlotNotSupported {
                    conduit: conduit.to_string(),
                });
            }

            let scomp = conduit.sending_component();
            let sender = self
                .component_by_ref(&scomp)
                .ok_or_else(|| Error::UnknownComponent {
                    conduit: conduit.to_string(),
                    component: scomp.to_string(),
                })?;
            let sport = conduit.sending_port();
            if !has_port(sender, sport, Operator::allows_sending) {
                return Err(Error::UnknownPort {
                    conduit: conduit.to_string(),
                    component: scomp.to_string(),
                    port: sport.to_string(),
                    direction: "sending",
                });
            }

            let rcomp = conduit.receiving_component();
            let receiver = self
                .component_by_ref(&rcomp)
                .ok_or_else(|| Error::UnknownComponent {
                    conduit: conduit.to_string(),
                    component: rcomp.to_string(),
                })?;
            let rport = conduit.receiving_port();
            if rport != SETTINGS_IN_PORT && !has_port(receiver, rport, Operator::allows_receiving) {
                return Err(Error::UnknownPort {
                    conduit: conduit.to_string(),
                    component: rcomp.to_string(),
                    port: rport.to_string(),
                    direction: "receiving",
                });
            }
        }
        Ok(())
    }

    /// Overlay another definition of the same model onto this one.
    ///
    /// Components with the same name are merged field by field, new ones
    /// are appended. Conduits are unioned; a union that connects a receiving
    /// port twice fails with [`Error::DuplicateReceiver`].
    pub fn merged_with(&self, overlay: &Model) -> Result<Model> {
        if self.name != overlay.name {
            return Err(Error::IncompatibleModels {
                base: self.name.to_string(),
                overlay: overlay.name.to_string(),
            });
        }

        let mut components = self.components.clone();
        for newc in &overlay.components {
            match components.iter_mut().find(|c| c.name() == newc.name()) {
                Some(old) => *old = old.overlaid_with(newc),
                None => components.push(newc.clone()),
            }
        }

        let mut conduits = self.conduits.clone();
        for newt in &overlay.conduits {
            if !conduits.contains(newt) {
                conduits.push(newt.clone());
            }
        }

        Model::new(self.name.clone(), components, conduits)
    }
}

fn grouped_by_sender(conduits: Vec<Conduit>) -> Vec<Conduit> {
    let mut groups: IndexMap<Reference, Vec<Conduit>> = IndexMap::new();
    for conduit in conduits {
        groups
            .entry(conduit.sender().clone())
            .or_default()
            .push(conduit);
    }
    groups.into_values().flatten().collect()
}

fn has_port(component: &Component, port: &Identifier, allowed: fn(Operator) -> bool) -> bool {
    if component.ports().is_empty() {
        return true;
    }
    component.port(port).is_some_and(|p| allowed(p.operator))
}
