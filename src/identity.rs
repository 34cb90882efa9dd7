//! Names used throughout a yMMSL document.
//!
//! An [`Identifier`] is a single name (`macro`, `state_out`). A [`Reference`]
//! is a path of identifiers and integer indices, written like `a.b[2].c`.
//! References name components and implementations, address settings, and
//! describe conduit endpoints.

use crate::error::{Error, Result};

use regex::Regex;
use std::fmt;
use std::ops::Add;
use std::str::FromStr;
use std::sync::LazyLock;

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// A validated name: `[A-Za-z_][A-Za-z0-9_]*`.
///
/// Names starting with an underscore followed by more characters are reserved
/// for the runtime and rejected by [`Identifier::new`]; a lone `_` is allowed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        Self::check_syntax(&text)?;
        if text.len() > 1 && text.starts_with('_') {
            return Err(Error::ReservedName(text));
        }
        Ok(Self(text))
    }

    /// Create an identifier in the reserved `_name` space.
    ///
    /// Only syntax is checked. Used for names the runtime owns.
    pub fn new_internal(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        Self::check_syntax(&text)?;
        Ok(Self(text))
    }

    fn check_syntax(text: &str) -> Result<()> {
        if IDENTIFIER_RE.is_match(text) {
            return Ok(());
        }
        let reason = if text.is_empty() {
            "identifiers must not be empty"
        } else if text.starts_with(|c: char| c.is_ascii_digit()) {
            "identifiers must not start with a digit"
        } else {
            "identifiers may only contain letters, digits and underscores"
        };
        Err(Error::InvalidIdentifier {
            text: text.to_string(),
            reason,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_reserved(&self) -> bool {
        self.0.len() > 1 && self.0.starts_with('_')
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// One step of a [`Reference`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReferencePart {
    Identifier(Identifier),
    Index(i64),
}

impl ReferencePart {
    pub fn as_identifier(&self) -> Option<&Identifier> {
        match self {
            Self::Identifier(id) => Some(id),
            Self::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<i64> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Identifier(_) => None,
        }
    }
}

impl From<Identifier> for ReferencePart {
    fn from(id: Identifier) -> Self {
        Self::Identifier(id)
    }
}

impl From<i64> for ReferencePart {
    fn from(index: i64) -> Self {
        Self::Index(index)
    }
}

/// A path of identifiers and indices, e.g. `a.b[2].c`.
///
/// The first part is always an identifier. Rendering with `Display` is the
/// exact inverse of parsing with [`Reference::parse`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reference(Vec<ReferencePart>);

impl Reference {
    /// Build a reference from parts. The first part must be an identifier.
    pub fn new(parts: Vec<ReferencePart>) -> Result<Self> {
        match parts.first() {
            Some(ReferencePart::Identifier(_)) => Ok(Self(parts)),
            Some(ReferencePart::Index(i)) => Err(Error::InvalidReference {
                text: format!("[{i}]"),
                reason: "the first part must be an identifier".into(),
            }),
            None => Err(Error::InvalidReference {
                text: String::new(),
                reason: "references must not be empty".into(),
            }),
        }
    }

    /// Parse `a.b[2].c` style text.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidReference {
            text: text.to_string(),
            reason,
        };

        let first_end = next_operator(text, 0);
        if first_end == 0 {
            return Err(invalid("the leading segment is empty".into()));
        }

        let mut parts = vec![ReferencePart::Identifier(Identifier::new(&text[..first_end])?)];
        let mut cur = first_end;
        while cur < text.len() {
            match text.as_bytes()[cur] {
                b'.' => {
                    let next = next_operator(text, cur + 1);
                    parts.push(ReferencePart::Identifier(Identifier::new(
                        &text[cur + 1..next],
                    )?));
                    cur = next;
                }
                b'[' => {
                    let close = text[cur..]
                        .find(']')
                        .map(|off| cur + off)
                        .ok_or_else(|| invalid("missing closing bracket".into()))?;
                    let inner = &text[cur + 1..close];
                    let index: i64 = inner
                        .parse()
                        .map_err(|_| invalid(format!("index {inner:?} is not an integer")))?;
                    parts.push(ReferencePart::Index(index));
                    cur = close + 1;
                }
                _ => {
                    let ch = text[cur..].chars().next().unwrap_or_default();
                    return Err(invalid(format!("unexpected character {ch:?}")));
                }
            }
        }
        Ok(Self(parts))
    }

    pub fn parts(&self) -> &[ReferencePart] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> &ReferencePart {
        // never empty by construction
        &self.0[self.0.len() - 1]
    }

    /// The final part, if it is an identifier (a port or attribute name).
    pub fn last_identifier(&self) -> Option<&Identifier> {
        self.last().as_identifier()
    }

    /// The reference without its final part, or `None` for single-part ones.
    pub fn without_last(&self) -> Option<Reference> {
        if self.0.len() <= 1 {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// The first `n` parts. `n` must be at least one.
    pub fn prefix(&self, n: usize) -> Option<Reference> {
        if n == 0 || n > self.0.len() {
            return None;
        }
        Some(Self(self.0[..n].to_vec()))
    }

    pub fn has_index(&self) -> bool {
        self.0.iter().any(|p| matches!(p, ReferencePart::Index(_)))
    }

    pub fn starts_with(&self, prefix: &Reference) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

fn next_operator(text: &str, start: usize) -> usize {
    text[start..]
        .find(['.', '['])
        .map(|off| start + off)
        .unwrap_or(text.len())
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            match part {
                ReferencePart::Identifier(id) if i == 0 => write!(f, "{id}")?,
                ReferencePart::Identifier(id) => write!(f, ".{id}")?,
                ReferencePart::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for Reference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Identifier> for Reference {
    fn from(id: Identifier) -> Self {
        Self(vec![ReferencePart::Identifier(id)])
    }
}

impl PartialEq<str> for Reference {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

impl PartialEq<&str> for Reference {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

impl Add<Identifier> for Reference {
    type Output = Reference;

    fn add(mut self, rhs: Identifier) -> Reference {
        self.0.push(ReferencePart::Identifier(rhs));
        self
    }
}

impl Add<&Reference> for Reference {
    type Output = Reference;

    fn add(mut self, rhs: &Reference) -> Reference {
        self.0.extend(rhs.0.iter().cloned());
        self
    }
}

impl Add<i64> for Reference {
    type Output = Reference;

    fn add(mut self, rhs: i64) -> Reference {
        self.0.push(ReferencePart::Index(rhs));
        self
    }
}

impl Add<&[i64]> for Reference {
    type Output = Reference;

    fn add(mut self, rhs: &[i64]) -> Reference {
        self.0.extend(rhs.iter().map(|&i| ReferencePart::Index(i)));
        self
    }
}
