//! Typed setting values and the ordered settings map.

use crate::error::{Error, Result};
use crate::identity::Reference;

use indexmap::IndexMap;
use indexmap::map::Iter;
use std::fmt;

/// A single setting value.
///
/// The set of kinds is closed. Values keep their kind through load, merge
/// and save; no conversion happens between kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Vector(Vec<f64>),
    Matrix(Matrix),
}

/// At least one row, all rows of the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(Error::InvalidValue("a matrix needs at least one row".into()));
        };
        let expected = first.len();
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
            return Err(Error::IrregularMatrix {
                row,
                len: r.len(),
                expected,
            });
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<f64>> {
        self.rows
    }
}

impl TryFrom<Vec<Vec<f64>>> for Matrix {
    type Error = Error;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::new(rows)
    }
}

impl SettingValue {
    /// Build a matrix value; see [`Matrix::new`].
    pub fn matrix(rows: Vec<Vec<f64>>) -> Result<Self> {
        Matrix::new(rows).map(Self::Matrix)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::Vector(_) => "vector",
            Self::Matrix(_) => "matrix",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value; integers widen to float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Vector(v) => write!(f, "{v:?}"),
            Self::Matrix(m) => write!(f, "{:?}", m.rows()),
        }
    }
}

impl From<&str> for SettingValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<i64> for SettingValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for SettingValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<Vec<f64>> for SettingValue {
    fn from(v: Vec<f64>) -> Self {
        Self::Vector(v)
    }
}

impl From<Matrix> for SettingValue {
    fn from(m: Matrix) -> Self {
        Self::Matrix(m)
    }
}

/// Ordered map from setting name to value.
///
/// Insertion order is kept and used when saving. Two `Settings` are equal
/// when they hold the same entries in the same order.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    store: IndexMap<Reference, SettingValue>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &Reference) -> Option<&SettingValue> {
        self.store.get(key)
    }

    /// Set a value, returning the previous one. A new key goes to the end;
    /// an existing key keeps its position.
    pub fn set(&mut self, key: Reference, value: impl Into<SettingValue>) -> Option<SettingValue> {
        self.store.insert(key, value.into())
    }

    /// Remove a key, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &Reference) -> Option<SettingValue> {
        self.store.shift_remove(key)
    }

    pub fn contains(&self, key: &Reference) -> bool {
        self.store.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, Reference, SettingValue> {
        self.store.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Reference> {
        self.store.keys()
    }

    /// Copy every entry of `overlay` over this map. Overlay values win,
    /// whatever their kind.
    pub fn update(&mut self, overlay: &Settings) {
        for (key, value) in overlay.iter() {
            self.store.insert(key.clone(), value.clone());
        }
    }
}

impl PartialEq for Settings {
    fn eq(&self, other: &Self) -> bool {
        self.store.len() == other.store.len() && self.store.iter().eq(other.store.iter())
    }
}

impl<'a> IntoIterator for &'a Settings {
    type Item = (&'a Reference, &'a SettingValue);
    type IntoIter = Iter<'a, Reference, SettingValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.store.iter()
    }
}

impl FromIterator<(Reference, SettingValue)> for Settings {
    fn from_iter<I: IntoIterator<Item = (Reference, SettingValue)>>(iter: I) -> Self {
        Self {
            store: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn r(s: &str) -> Reference {
        Reference::parse(s).unwrap()
    }

    #[test]
    fn set_get_remove_keep_order() {
        let mut s = Settings::new();
        s.set(r("b"), 1i64);
        s.set(r("a.x"), "text");
        s.set(r("c"), vec![1.0, 2.0]);
        assert_eq!(s.set(r("b"), 2.5), Some(SettingValue::Integer(1)));

        let keys: Vec<String> = s.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["b", "a.x", "c"]);
        assert_eq!(s.get(&r("b")), Some(&SettingValue::Float(2.5)));

        assert!(s.remove(&r("b")).is_some());
        assert!(!s.contains(&r("b")));
        let keys: Vec<String> = s.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["a.x", "c"]);
    }

    #[test]
    fn equality_is_order_sensitive() {
        let a: Settings = [(r("x"), 1i64.into()), (r("y"), 2i64.into())]
            .into_iter()
            .collect();
        let b: Settings = [(r("y"), 2i64.into()), (r("x"), 1i64.into())]
            .into_iter()
            .collect();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn integer_and_float_are_distinct() {
        assert_ne!(SettingValue::Integer(1), SettingValue::Float(1.0));
        assert_eq!(SettingValue::Integer(1).as_f64(), Some(1.0));
    }

    #[test]
    fn update_overrides_and_extends() {
        let mut base: Settings = [(r("a"), 1i64.into())].into_iter().collect();
        let overlay: Settings = [(r("a"), "two".into()), (r("b"), 3i64.into())]
            .into_iter()
            .collect();
        base.update(&overlay);
        assert_eq!(base.get(&r("a")), Some(&SettingValue::String("two".into())));
        assert_eq!(base.get(&r("b")), Some(&SettingValue::Integer(3)));
    }

    #[test]
    fn matrix_rows_must_match() {
        assert!(SettingValue::matrix(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).is_ok());
        assert_eq!(
            SettingValue::matrix(vec![vec![1.0, 2.0], vec![3.0]]),
            Err(Error::IrregularMatrix {
                row: 1,
                len: 1,
                expected: 2
            })
        );
        assert!(SettingValue::matrix(vec![]).is_err());
    }

    #[test]
    fn matrices_only_exist_checked() {
        let m = Matrix::try_from(vec![vec![1.0], vec![2.0]]).unwrap();
        assert_eq!(m.rows().len(), 2);
        assert_eq!(SettingValue::from(m.clone()).kind(), "matrix");
        assert_eq!(SettingValue::from(m).to_string(), "[[1.0], [2.0]]");
        assert!(Matrix::new(Vec::new()).is_err());
    }
}
