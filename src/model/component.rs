//! Simulation components and their ports.

use crate::error::{Error, Result};
use crate::identity::{Identifier, Reference};

use std::fmt;

/// The role a port plays in a component's execution cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operator {
    /// Initial state input, before the main loop.
    FInit,
    /// Intermediate output, inside the main loop.
    OI,
    /// State input, inside the main loop.
    S,
    /// Final output, after the main loop.
    OF,
}

impl Operator {
    /// All operators, in document order.
    pub const ALL: [Operator; 4] = [Operator::FInit, Operator::OI, Operator::S, Operator::OF];

    /// Key used for this operator under `ports:`.
    pub fn key(self) -> &'static str {
        match self {
            Self::FInit => "f_init",
            Self::OI => "o_i",
            Self::S => "s",
            Self::OF => "o_f",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.key() == key)
    }

    pub fn allows_sending(self) -> bool {
        matches!(self, Self::OI | Self::OF)
    }

    pub fn allows_receiving(self) -> bool {
        matches!(self, Self::FInit | Self::S)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FInit => "F_INIT",
            Self::OI => "O_I",
            Self::S => "S",
            Self::OF => "O_F",
        };
        f.write_str(name)
    }
}

/// A named connection point on a component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Port {
    pub name: Identifier,
    pub operator: Operator,
    /// Fixed number of slots for vector ports, written `name[n]`.
    pub cardinality: Option<u32>,
}

impl Port {
    pub fn new(name: Identifier, operator: Operator) -> Self {
        Self {
            name,
            operator,
            cardinality: None,
        }
    }

    pub fn vector(name: Identifier, operator: Operator, cardinality: u32) -> Self {
        Self {
            name,
            operator,
            cardinality: Some(cardinality),
        }
    }

    /// Parse a port declaration, `name` or `name[n]`.
    pub fn parse(text: &str, operator: Operator) -> Result<Self> {
        let reference = Reference::parse(text)?;
        let invalid = || Error::InvalidReference {
            text: text.to_string(),
            reason: "ports are declared as `name` or `name[size]`".into(),
        };
        let name = reference.parts()[0]
            .as_identifier()
            .cloned()
            .ok_or_else(invalid)?;
        match reference.parts() {
            [_] => Ok(Self::new(name, operator)),
            [_, last] => match last.as_index().map(u32::try_from) {
                Some(Ok(n)) => Ok(Self::vector(name, operator, n)),
                _ => Err(invalid()),
            },
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cardinality {
            Some(n) => write!(f, "{}[{n}]", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A declaration of a (possibly multiplied) simulation component.
///
/// Ports are kept grouped by operator in `F_INIT, O_I, S, O_F` order, keeping
/// declaration order within each group, so two components declaring the same
/// ports compare equal regardless of how their documents were laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    name: Identifier,
    implementation: Option<Reference>,
    multiplicity: Vec<u64>,
    ports: Vec<Port>,
}

impl Component {
    /// A singleton component without implementation or ports.
    pub fn new(name: Identifier) -> Self {
        Self {
            name,
            implementation: None,
            multiplicity: Vec::new(),
            ports: Vec::new(),
        }
    }

    pub fn with_implementation(mut self, implementation: Reference) -> Result<Self> {
        if implementation.has_index() {
            return Err(Error::InvalidReference {
                text: implementation.to_string(),
                reason: "implementation names may not contain subscripts".into(),
            });
        }
        self.implementation = Some(implementation);
        Ok(self)
    }

    pub fn with_multiplicity(mut self, multiplicity: Vec<u64>) -> Self {
        self.multiplicity = multiplicity;
        self
    }

    pub fn with_ports(mut self, mut ports: Vec<Port>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for port in &ports {
            if !seen.insert(&port.name) {
                return Err(Error::DuplicatePort(port.name.to_string()));
            }
        }
        ports.sort_by_key(|p| p.operator);
        self.ports = ports;
        Ok(self)
    }

    pub fn name(&self) -> &Identifier {
        &self.name
    }

    pub fn implementation(&self) -> Option<&Reference> {
        self.implementation.as_ref()
    }

    /// Shape of the instance array; empty for a single instance.
    pub fn multiplicity(&self) -> &[u64] {
        &self.multiplicity
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn port(&self, name: &Identifier) -> Option<&Port> {
        self.ports.iter().find(|p| &p.name == name)
    }

    pub fn ports_for(&self, operator: Operator) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(move |p| p.operator == operator)
    }

    /// Whether this component can be written as a bare implementation name.
    pub fn is_short_form(&self) -> bool {
        self.implementation.is_some() && self.multiplicity.is_empty() && self.ports.is_empty()
    }

    /// Number of instances, or `None` if it does not fit in a `u64`.
    pub fn instance_count(&self) -> Option<u64> {
        self.multiplicity
            .iter()
            .try_fold(1u64, |count, &dim| count.checked_mul(dim))
    }

    /// References naming every instance, in row-major order.
    ///
    /// A component with multiplicity `[2, 3]` named `c` has instances
    /// `c[0][0]`, `c[0][1]`, ..., `c[1][2]`.
    pub fn instances(&self) -> Vec<Reference> {
        let base = Reference::from(self.name.clone());
        if self.multiplicity.is_empty() {
            return vec![base];
        }
        if self.multiplicity.contains(&0) {
            return Vec::new();
        }

        let mut out = Vec::new();
        let mut index = vec![0u64; self.multiplicity.len()];
        loop {
            let parts: Vec<i64> = index.iter().map(|&i| i as i64).collect();
            out.push(base.clone() + &parts[..]);

            // odometer increment, last dimension fastest
            let mut dim = index.len();
            loop {
                if dim == 0 {
                    return out;
                }
                dim -= 1;
                index[dim] += 1;
                if index[dim] < self.multiplicity[dim] {
                    break;
                }
                index[dim] = 0;
            }
        }
    }

    /// Overlay `other` onto this component field by field.
    ///
    /// Fields `other` sets (an implementation, a non-empty multiplicity, a
    /// non-empty port list) replace ours; the rest are kept.
    pub fn overlaid_with(&self, other: &Component) -> Component {
        Component {
            name: self.name.clone(),
            implementation: other
                .implementation
                .clone()
                .or_else(|| self.implementation.clone()),
            multiplicity: if other.multiplicity.is_empty() {
                self.multiplicity.clone()
            } else {
                other.multiplicity.clone()
            },
            ports: if other.ports.is_empty() {
                self.ports.clone()
            } else {
                other.ports.clone()
            },
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for dim in &self.multiplicity {
            write!(f, "[0:{dim}]")?;
        }
        Ok(())
    }
}
