//! Hierarchical property-bag persistence primitive.
//!
//! A [`Bag`] is a named collection of scalar values and sub-bags. The same
//! name may appear more than once; repeated instances are addressed by index
//! via [`Bag::num_instances`] and the `*_at` accessors, which is how object
//! sets serialize a variable number of members under one key.
//!
//! The bag is the unit of persistence for the simulation core: actors and
//! registries write themselves into bags and read themselves back out. The
//! on-disk grammar is deliberately out of scope here; bags derive `serde`
//! traits so any serde format can carry them.
//!
//! # Example
//!
//! ```
//! use propbag::Bag;
//!
//! let mut bag = Bag::new();
//! bag.add_text("name", "barrel");
//! bag.add_number("x", 4.0);
//!
//! assert_eq!(bag.text("name").unwrap(), "barrel");
//! assert_eq!(bag.number("x").unwrap(), 4.0);
//! assert_eq!(bag.num_instances("name"), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Errors
// =============================================================================

/// Errors produced by typed bag accessors.
///
/// Missing or mistyped fields are expected conditions for callers probing
/// optional data; they are never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BagError {
    /// No instance of the requested key exists in the bag.
    #[error("no field named `{0}` in bag")]
    Missing(String),
    /// The key exists but holds a different value type.
    #[error("field `{key}` is not a {expected}")]
    WrongType {
        /// The requested key.
        key: String,
        /// The expected type name ("text", "number", "flag", "bag").
        expected: &'static str,
    },
    /// The instance index exceeds the number of instances under the key.
    #[error("field `{key}` has {len} instance(s), index {index} out of range")]
    OutOfRange {
        /// The requested key.
        key: String,
        /// The requested instance index.
        index: usize,
        /// The number of instances actually present.
        len: usize,
    },
}

// =============================================================================
// Value
// =============================================================================

/// A single value stored under a bag key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// UTF-8 text.
    Text(String),
    /// Numeric scalar (all numbers are carried as `f64`).
    Number(f64),
    /// Boolean flag.
    Flag(bool),
    /// Nested sub-bag.
    Bag(Bag),
}

impl Value {
    /// Returns the text payload, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric payload, if this is a number value.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the flag payload, if this is a flag value.
    #[must_use]
    pub const fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the sub-bag, if this is a bag value.
    #[must_use]
    pub const fn as_bag(&self) -> Option<&Bag> {
        match self {
            Self::Bag(b) => Some(b),
            _ => None,
        }
    }

    /// Human-readable type name used in error reporting.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Number(_) => "number",
            Self::Flag(_) => "flag",
            Self::Bag(_) => "bag",
        }
    }
}

// =============================================================================
// Bag
// =============================================================================

/// A hierarchical property bag.
///
/// Keys are stored in a `BTreeMap` so iteration order is deterministic,
/// which keeps serialized output stable across runs. Each key maps to one
/// or more [`Value`] instances in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bag {
    entries: BTreeMap<String, Vec<Value>>,
}

impl Bag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the bag holds no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of distinct keys in the bag.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of instances stored under `key` (0 if absent).
    #[must_use]
    pub fn num_instances(&self, key: &str) -> usize {
        self.entries.get(key).map_or(0, Vec::len)
    }

    /// Appends a raw value instance under `key`.
    pub fn add(&mut self, key: impl Into<String>, value: Value) {
        self.entries.entry(key.into()).or_default().push(value);
    }

    /// Appends a text instance under `key`.
    pub fn add_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.add(key, Value::Text(value.into()));
    }

    /// Appends a numeric instance under `key`.
    pub fn add_number(&mut self, key: impl Into<String>, value: f64) {
        self.add(key, Value::Number(value));
    }

    /// Appends a flag instance under `key`.
    pub fn add_flag(&mut self, key: impl Into<String>, value: bool) {
        self.add(key, Value::Flag(value));
    }

    /// Appends a sub-bag instance under `key`.
    pub fn add_bag(&mut self, key: impl Into<String>, value: Bag) {
        self.add(key, Value::Bag(value));
    }

    /// Removes all instances of `key`, returning them if any existed.
    pub fn remove(&mut self, key: &str) -> Option<Vec<Value>> {
        self.entries.remove(key)
    }

    /// Returns the raw value at `(key, index)`.
    ///
    /// # Errors
    ///
    /// [`BagError::Missing`] if the key is absent, [`BagError::OutOfRange`]
    /// if fewer than `index + 1` instances exist.
    pub fn get_at(&self, key: &str, index: usize) -> Result<&Value, BagError> {
        let instances = self
            .entries
            .get(key)
            .ok_or_else(|| BagError::Missing(key.to_string()))?;
        instances.get(index).ok_or_else(|| BagError::OutOfRange {
            key: key.to_string(),
            index,
            len: instances.len(),
        })
    }

    /// Returns the first instance of `key` as text.
    ///
    /// # Errors
    ///
    /// [`BagError::Missing`] or [`BagError::WrongType`].
    pub fn text(&self, key: &str) -> Result<&str, BagError> {
        self.text_at(key, 0)
    }

    /// Returns the `index`-th instance of `key` as text.
    ///
    /// # Errors
    ///
    /// [`BagError::Missing`], [`BagError::OutOfRange`] or
    /// [`BagError::WrongType`].
    pub fn text_at(&self, key: &str, index: usize) -> Result<&str, BagError> {
        self.get_at(key, index)?
            .as_text()
            .ok_or_else(|| BagError::WrongType {
                key: key.to_string(),
                expected: "text",
            })
    }

    /// Returns the first instance of `key` as a number.
    ///
    /// # Errors
    ///
    /// [`BagError::Missing`] or [`BagError::WrongType`].
    pub fn number(&self, key: &str) -> Result<f64, BagError> {
        self.number_at(key, 0)
    }

    /// Returns the `index`-th instance of `key` as a number.
    ///
    /// # Errors
    ///
    /// [`BagError::Missing`], [`BagError::OutOfRange`] or
    /// [`BagError::WrongType`].
    pub fn number_at(&self, key: &str, index: usize) -> Result<f64, BagError> {
        self.get_at(key, index)?
            .as_number()
            .ok_or_else(|| BagError::WrongType {
                key: key.to_string(),
                expected: "number",
            })
    }

    /// Returns the first instance of `key` as a flag.
    ///
    /// # Errors
    ///
    /// [`BagError::Missing`] or [`BagError::WrongType`].
    pub fn flag(&self, key: &str) -> Result<bool, BagError> {
        self.get_at(key, 0)?
            .as_flag()
            .ok_or_else(|| BagError::WrongType {
                key: key.to_string(),
                expected: "flag",
            })
    }

    /// Returns the first instance of `key` as a sub-bag.
    ///
    /// # Errors
    ///
    /// [`BagError::Missing`] or [`BagError::WrongType`].
    pub fn bag(&self, key: &str) -> Result<&Bag, BagError> {
        self.bag_at(key, 0)
    }

    /// Returns the `index`-th instance of `key` as a sub-bag.
    ///
    /// # Errors
    ///
    /// [`BagError::Missing`], [`BagError::OutOfRange`] or
    /// [`BagError::WrongType`].
    pub fn bag_at(&self, key: &str, index: usize) -> Result<&Bag, BagError> {
        self.get_at(key, index)?
            .as_bag()
            .ok_or_else(|| BagError::WrongType {
                key: key.to_string(),
                expected: "bag",
            })
    }

    /// Iterates over every sub-bag instance stored under `key`.
    pub fn bags<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a Bag> + 'a {
        self.entries
            .get(key)
            .into_iter()
            .flatten()
            .filter_map(Value::as_bag)
    }

    /// Iterates over the bag's keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl fmt::Display for Bag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bag({} keys)", self.entries.len())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod accessor_tests {
        use super::*;

        #[test]
        fn new_bag_is_empty() {
            let bag = Bag::new();
            assert!(bag.is_empty());
            assert_eq!(bag.key_count(), 0);
            assert_eq!(bag.num_instances("anything"), 0);
        }

        #[test]
        fn scalar_roundtrip() {
            let mut bag = Bag::new();
            bag.add_text("name", "crate");
            bag.add_number("x", 12.5);
            bag.add_flag("solid", true);

            assert_eq!(bag.text("name").unwrap(), "crate");
            assert_eq!(bag.number("x").unwrap(), 12.5);
            assert!(bag.flag("solid").unwrap());
        }

        #[test]
        fn missing_key_is_reported() {
            let bag = Bag::new();
            assert_eq!(bag.text("nope"), Err(BagError::Missing("nope".into())));
        }

        #[test]
        fn wrong_type_is_reported() {
            let mut bag = Bag::new();
            bag.add_number("x", 1.0);
            assert_eq!(
                bag.text("x"),
                Err(BagError::WrongType {
                    key: "x".into(),
                    expected: "text"
                })
            );
        }

        #[test]
        fn repeated_keys_are_indexed() {
            let mut bag = Bag::new();
            bag.add_number("slot", 1.0);
            bag.add_number("slot", 2.0);
            bag.add_number("slot", 3.0);

            assert_eq!(bag.num_instances("slot"), 3);
            assert_eq!(bag.number_at("slot", 0).unwrap(), 1.0);
            assert_eq!(bag.number_at("slot", 2).unwrap(), 3.0);
        }

        #[test]
        fn out_of_range_index_is_reported() {
            let mut bag = Bag::new();
            bag.add_number("slot", 1.0);
            assert_eq!(
                bag.number_at("slot", 4),
                Err(BagError::OutOfRange {
                    key: "slot".into(),
                    index: 4,
                    len: 1
                })
            );
        }

        #[test]
        fn nested_bags() {
            let mut inner = Bag::new();
            inner.add_text("kind", "torch");

            let mut outer = Bag::new();
            outer.add_bag("object", inner.clone());
            outer.add_bag("object", inner);

            assert_eq!(outer.num_instances("object"), 2);
            assert_eq!(outer.bag_at("object", 1).unwrap().text("kind").unwrap(), "torch");
            assert_eq!(outer.bags("object").count(), 2);
        }

        #[test]
        fn remove_deletes_all_instances() {
            let mut bag = Bag::new();
            bag.add_number("slot", 1.0);
            bag.add_number("slot", 2.0);

            let removed = bag.remove("slot").unwrap();
            assert_eq!(removed.len(), 2);
            assert_eq!(bag.num_instances("slot"), 0);
            assert!(bag.remove("slot").is_none());
        }

        #[test]
        fn keys_are_sorted() {
            let mut bag = Bag::new();
            bag.add_number("zeta", 0.0);
            bag.add_number("alpha", 0.0);
            let keys: Vec<_> = bag.keys().collect();
            assert_eq!(keys, vec!["alpha", "zeta"]);
        }
    }

    mod serialization_tests {
        use super::*;

        #[test]
        fn serde_roundtrip_preserves_structure() {
            let mut inner = Bag::new();
            inner.add_text("kind", "barrel");
            inner.add_number("x", -3.25);

            let mut bag = Bag::new();
            bag.add_bag("object", inner);
            bag.add_flag("editor", false);

            let json = serde_json::to_string(&bag).unwrap();
            let back: Bag = serde_json::from_str(&json).unwrap();
            assert_eq!(bag, back);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn scalar_value() -> impl Strategy<Value = Value> {
            prop_oneof![
                "[a-z]{0,12}".prop_map(Value::Text),
                proptest::num::f64::NORMAL.prop_map(Value::Number),
                any::<bool>().prop_map(Value::Flag),
            ]
        }

        proptest! {
            #[test]
            fn serde_roundtrip_any_flat_bag(
                fields in proptest::collection::vec(("[a-z]{1,8}", scalar_value()), 0..16)
            ) {
                let mut bag = Bag::new();
                for (key, value) in fields {
                    bag.add(key, value);
                }
                let json = serde_json::to_string(&bag).unwrap();
                let back: Bag = serde_json::from_str(&json).unwrap();
                prop_assert_eq!(bag, back);
            }

            #[test]
            fn num_instances_counts_adds(n in 0usize..24) {
                let mut bag = Bag::new();
                for i in 0..n {
                    bag.add_number("slot", i as f64);
                }
                prop_assert_eq!(bag.num_instances("slot"), n);
            }
        }
    }
}
