//! Record Semantics: Fingerprints
//!
//! SHA-256 over a record's compact JSON encoding, lowercase hex.
//! Records with equal attributes in the same order share a fingerprint
//! whether or not they share any handle, so a fingerprint taken before and
//! after an operation tells whether the operation changed the record.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::copy::encode;
use crate::error::CopyError;
use crate::value::Value;

/// Fingerprint of any serializable record.
pub fn fingerprint<T: Serialize>(record: &T) -> Result<String, CopyError> {
    let json = encode(record)?;
    Ok(hex_digest(json.as_bytes()))
}

/// Fingerprint of a dynamic record graph. Fails on the same values a
/// strict deep copy fails on.
pub fn value_fingerprint(value: &Value) -> Result<String, CopyError> {
    fingerprint(&value.to_json()?)
}

fn hex_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::copy::{deep_copy, shallow_copy};
    use crate::domain::{Employee, Occupation, Person};

    #[test]
    fn digest_of_empty_input() {
        assert_eq!(
            hex_digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn equal_records_share_a_fingerprint() {
        let a = Person::new("sandra", 22);
        let b = Person::new("sandra", 22);
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn mutation_changes_the_fingerprint() {
        let josh = Employee::new("josh", 30, Occupation::new("a", "b"));
        let before = fingerprint(&josh).unwrap();
        shallow_copy(&josh).set_title("c");
        assert_ne!(fingerprint(&josh).unwrap(), before);
    }

    #[test]
    fn deep_copy_matches_fingerprint_at_copy_time() {
        let josh = Employee::new("josh", 30, Occupation::new("a", "b"));
        let copy = deep_copy(&josh).unwrap();
        assert_eq!(fingerprint(&copy).unwrap(), fingerprint(&josh).unwrap());
    }

    #[test]
    fn value_fingerprint_agrees_with_typed_fingerprint() {
        let person = Person::new("sandra", 22);
        let value = Value::object([("name", Value::from("sandra")), ("age", Value::from(22))]);
        assert_eq!(
            value_fingerprint(&value).unwrap(),
            fingerprint(&person).unwrap()
        );
    }

    #[test]
    fn value_fingerprint_rejects_functions() {
        let value = Value::object([("f", Value::function("f"))]);
        assert!(value_fingerprint(&value).is_err());
    }
}
