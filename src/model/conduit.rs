//! Conduits connect a sending port to a receiving port.

use crate::error::{Error, Result};
use crate::identity::{Identifier, Reference, ReferencePart};

use std::fmt;

/// A message channel between two component ports.
///
/// Endpoints are written `component.port`, optionally followed by slot
/// indices (`component.port[3]`). Slots parse, but a model using them does
/// not pass [`Model::check_consistent`](super::Model::check_consistent).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Conduit {
    sender: Reference,
    receiver: Reference,
}

impl Conduit {
    pub fn new(sender: Reference, receiver: Reference) -> Result<Self> {
        check_endpoint(&sender)?;
        check_endpoint(&receiver)?;
        Ok(Self { sender, receiver })
    }

    pub fn parse(sender: &str, receiver: &str) -> Result<Self> {
        Self::new(Reference::parse(sender)?, Reference::parse(receiver)?)
    }

    pub fn sender(&self) -> &Reference {
        &self.sender
    }

    pub fn receiver(&self) -> &Reference {
        &self.receiver
    }

    pub fn sending_component(&self) -> Reference {
        component_of(&self.sender)
    }

    pub fn sending_port(&self) -> &Identifier {
        port_of(&self.sender)
    }

    /// Slot indices on the sending side; empty if none were given.
    pub fn sending_slot(&self) -> Vec<i64> {
        slot_of(&self.sender)
    }

    pub fn receiving_component(&self) -> Reference {
        component_of(&self.receiver)
    }

    pub fn receiving_port(&self) -> &Identifier {
        port_of(&self.receiver)
    }

    pub fn receiving_slot(&self) -> Vec<i64> {
        slot_of(&self.receiver)
    }
}

impl fmt::Display for Conduit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.sender, self.receiver)
    }
}

/// Number of leading parts before the trailing slot indices.
fn stem_len(reference: &Reference) -> usize {
    let parts = reference.parts();
    parts.len()
        - parts
            .iter()
            .rev()
            .take_while(|p| matches!(p, ReferencePart::Index(_)))
            .count()
}

fn check_endpoint(reference: &Reference) -> Result<()> {
    let stem = stem_len(reference);
    if reference.parts()[..stem]
        .iter()
        .any(|p| matches!(p, ReferencePart::Index(_)))
    {
        return Err(Error::InvalidReference {
            text: reference.to_string(),
            reason: "conduit endpoints may only have subscripts at the end".into(),
        });
    }
    if stem < 2 {
        return Err(Error::InvalidReference {
            text: reference.to_string(),
            reason: "conduit endpoints need a component name and a port name".into(),
        });
    }
    Ok(())
}

fn component_of(reference: &Reference) -> Reference {
    // stem has at least two identifiers, checked on construction
    reference
        .prefix(stem_len(reference) - 1)
        .unwrap_or_else(|| reference.clone())
}

fn port_of(reference: &Reference) -> &Identifier {
    match &reference.parts()[stem_len(reference) - 1] {
        ReferencePart::Identifier(id) => id,
        ReferencePart::Index(_) => unreachable!("conduit stems end in an identifier"),
    }
}

fn slot_of(reference: &Reference) -> Vec<i64> {
    reference.parts()[stem_len(reference)..]
        .iter()
        .filter_map(ReferencePart::as_index)
        .collect()
}
