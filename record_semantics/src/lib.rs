#![forbid(unsafe_code)]

//! Record Semantics
//!
//! Mutating a record through a reference versus producing a copy, and
//! shallow versus deep copies of nested records.
//!
//! - `domain`:  typed records (`Person`, `Employee`, `Occupation`)
//! - `update`:  in-place and copy-based age updates
//! - `copy`:    the three named copy strategies
//! - `finite`:  non-finite float scan run before any JSON encoding
//! - `value`:   dynamic record graph with reference-typed lists and objects
//! - `inspect`: console-style rendering
//! - `hashing`: record fingerprints

pub mod domain;
pub mod error;
pub mod update;
pub mod copy;
pub mod finite;
pub mod value;
pub mod inspect;
pub mod hashing;

pub use copy::{deep_copy, shallow_copy, share, CopyStrategy};
pub use domain::{shared, Employee, Occupation, Person, Shared};
pub use error::{CopyError, UnsupportedKind};
pub use update::{update_age, update_age_immutable};
pub use value::Value;
