//! Record Semantics: Copy Strategies
//!
//! Three distinct ways to get "another" record. None of them is a
//! general-purpose `copy`; callers name the aliasing they want.
//!
//! - `share`:        same record, second handle
//! - `shallow_copy`: new top-level record, nested handles still shared
//! - `deep_copy`:    JSON round-trip, nothing shared

use std::fmt;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::domain::Shared;
use crate::error::CopyError;
use crate::finite::check_finite;

/// The construction strategy used to produce a record from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStrategy {
    Share,
    Shallow,
    Deep,
}

impl fmt::Display for CopyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CopyStrategy::Share => "share",
            CopyStrategy::Shallow => "shallow",
            CopyStrategy::Deep => "deep",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Share
// ---------------------------------------------------------------------------

/// Reference-sharing assignment: both handles observe the same record.
pub fn share<T>(record: &Shared<T>) -> Shared<T> {
    debug!(strategy = %CopyStrategy::Share, holders = Rc::strong_count(record) + 1, "copy");
    Rc::clone(record)
}

// ---------------------------------------------------------------------------
// Shallow
// ---------------------------------------------------------------------------

/// Attribute-wise duplication.
///
/// Primitive attributes are duplicated; `Shared` attributes are not, so a
/// mutation through a nested handle of the copy shows up in the source.
pub fn shallow_copy<T: Clone>(record: &T) -> T {
    debug!(strategy = %CopyStrategy::Shallow, "copy");
    record.clone()
}

// ---------------------------------------------------------------------------
// Deep
// ---------------------------------------------------------------------------

/// Full duplication: encode to JSON text, then parse a fresh record graph.
///
/// Every `Shared` handle in the result is newly allocated. JSON has no
/// form for NaN or ±Infinity, so a record holding one fails up front with
/// `CopyError::UnsupportedValue` naming its location; the copy never
/// comes back with the float silently replaced.
pub fn deep_copy<T>(record: &T) -> Result<T, CopyError>
where
    T: Serialize + DeserializeOwned,
{
    let json = encode(record)?;
    let copy = decode(&json)?;
    debug!(strategy = %CopyStrategy::Deep, bytes = json.len(), "copy");
    Ok(copy)
}

/// Encode a record to compact JSON. Field order follows declaration order.
///
/// Rejects non-finite floats instead of letting them encode as `null`.
pub fn encode<T: Serialize>(record: &T) -> Result<String, CopyError> {
    check_finite(record)?;
    serde_json::to_string(record).map_err(CopyError::Encode)
}

/// Decode a record from JSON. Unknown or missing fields are rejected.
pub fn decode<T: DeserializeOwned>(json: &str) -> Result<T, CopyError> {
    serde_json::from_str(json).map_err(CopyError::Decode)
}
