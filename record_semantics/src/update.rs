//! Record Semantics: Age Updates
//!
//! Two ways to "have a birthday": mutate the caller's record, or hand back
//! a one-level copy and leave the caller's record alone.

use tracing::debug;

use crate::copy::shallow_copy;
use crate::domain::Person;

/// Increment `age` on the caller's own record and return that same record.
pub fn update_age(person: &mut Person) -> &mut Person {
    person.age += 1;
    debug!(name = %person.name, age = person.age, "updated age in place");
    person
}

/// Increment `age` on an attribute-wise copy; `person` is left unchanged.
///
/// Only the top level is copied. A record type with nested handles would
/// still share them with the copy.
pub fn update_age_immutable(person: &Person) -> Person {
    let mut copy = shallow_copy(person);
    copy.age += 1;
    debug!(name = %copy.name, age = copy.age, "updated age on copy");
    copy
}
