//! Record Semantics: Core Record Types
//!
//! Pure data. Flat records hold only primitives; nested records are held
//! through a `Shared` handle so that an attribute-wise copy aliases them.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::inspect::{inspect_node, inspect_serialize, InspectOptions, Node};

/// Shared, interior-mutable handle. Cloning the handle never clones the record.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wrap a record in a fresh `Shared` handle.
pub fn shared<T>(record: T) -> Shared<T> {
    Rc::new(RefCell::new(record))
}

// ── Flat record ────────────────────────────────────────────────────

/// A person: every attribute is a primitive value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Person {
    pub name: String,
    pub age: i64,
}

impl Person {
    pub fn new(name: impl Into<String>, age: i64) -> Self {
        Self {
            name: name.into(),
            age,
        }
    }
}

// ── Nested record ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Occupation {
    pub title: String,
    pub company: String,
}

impl Occupation {
    pub fn new(title: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
        }
    }
}

/// An employee with a nested occupation.
///
/// `Clone` is attribute-wise: the clone gets its own `name` and `age`
/// but the same `occupation` handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Employee {
    pub name: String,
    pub age: i64,
    pub occupation: Shared<Occupation>,
}

impl Employee {
    pub fn new(name: impl Into<String>, age: i64, occupation: Occupation) -> Self {
        Self {
            name: name.into(),
            age,
            occupation: shared(occupation),
        }
    }

    /// Overwrite the nested occupation title through this record's handle.
    pub fn set_title(&self, title: impl Into<String>) {
        self.occupation.borrow_mut().title = title.into();
    }

    pub fn title(&self) -> String {
        self.occupation.borrow().title.clone()
    }

    /// True when both records observe the same occupation record.
    pub fn shares_occupation_with(&self, other: &Employee) -> bool {
        Rc::ptr_eq(&self.occupation, &other.occupation)
    }
}

// ── Console rendering ──────────────────────────────────────────────

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered =
            inspect_serialize(self, &InspectOptions::default()).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

impl fmt::Display for Employee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = InspectOptions::default();
        let rendered = if self.occupation.try_borrow().is_ok() {
            inspect_serialize(self, &options).map_err(|_| fmt::Error)?
        } else {
            // Occupation is mid-update elsewhere; show the rest of the record.
            let node = Node::Object {
                reference: None,
                fields: vec![
                    ("name".to_string(), Node::Text(self.name.clone())),
                    ("age".to_string(), Node::Literal(self.age.to_string())),
                    (
                        "occupation".to_string(),
                        Node::Literal("[Object <borrowed>]".to_string()),
                    ),
                ],
            };
            inspect_node(&node, &options)
        };
        f.write_str(&rendered)
    }
}
