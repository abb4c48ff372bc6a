//! Record Semantics: Dynamic Record Graph
//!
//! An untyped record model where lists and objects are reference types,
//! the way they are in a scripting language. Cloning a `Value` shares its
//! lists and objects; graphs may contain functions, non-finite numbers and
//! cycles, which is exactly what a JSON round-trip cannot carry.
//!
//! Deep copies come in two modes:
//! - strict: the first unrepresentable value fails the copy
//! - lossy:  behaves like a scripting-language `JSON.stringify`, but
//!           every dropped or nulled location is reported

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::ser::Error as _;
use serde_json::{Map, Value as Json};
use tracing::debug;

use crate::copy::{decode, encode, CopyStrategy};
use crate::domain::{shared, Shared};
use crate::error::{CopyError, UnsupportedKind};
use crate::finite::child_path;
use crate::inspect::{format_number, inspect_node, InspectOptions, Node};

// ── Object ─────────────────────────────────────────────────────────

/// Insertion-ordered attribute list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object {
    entries: Vec<(String, Value)>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Overwrite an existing attribute in place, or append a new one.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut object = Object::new();
        for (key, value) in iter {
            object.set(key, value);
        }
        object
    }
}

// ── Value ──────────────────────────────────────────────────────────

/// A node of the record graph.
///
/// Equality is structural. Comparing two cyclic graphs does not terminate.
#[derive(Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Shared<Vec<Value>>),
    Object(Shared<Object>),
    /// A callable attribute, identified by name only.
    Function(String),
}

impl Value {
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(shared(fields.into_iter().collect()))
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(shared(items.into_iter().collect()))
    }

    pub fn function(name: impl Into<String>) -> Self {
        Value::Function(name.into())
    }

    pub fn as_object(&self) -> Option<&Shared<Object>> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Shared<Vec<Value>>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Read an attribute. Lists and objects come back as shared handles.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.as_object()?.borrow().get(key).cloned()
    }

    /// Write an attribute through this handle. Returns false on non-objects.
    pub fn set(&self, key: impl Into<String>, value: Value) -> bool {
        match self.as_object() {
            Some(object) => {
                object.borrow_mut().set(key, value);
                true
            }
            None => false,
        }
    }

    /// Follow a chain of attribute names, e.g. `["occupation", "title"]`.
    pub fn get_path(&self, path: &[&str]) -> Option<Value> {
        path.iter()
            .try_fold(self.clone(), |current, key| current.get(key))
    }

    /// Write the last attribute of `path` on the record reached by the rest.
    pub fn set_path(&self, path: &[&str], value: Value) -> bool {
        match path.split_last() {
            Some((last, parents)) => self
                .get_path(parents)
                .map_or(false, |parent| parent.set(*last, value)),
            None => false,
        }
    }

    /// True when both values are the same list or object.
    pub fn same_handle(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    // ---------------------------------------------------------------------
    // Copy strategies
    // ---------------------------------------------------------------------

    /// Reference-sharing assignment.
    pub fn share(&self) -> Value {
        debug!(strategy = %CopyStrategy::Share, "copy");
        self.clone()
    }

    /// New top-level list or object whose entries are shared with `self`.
    pub fn shallow_copy(&self) -> Value {
        debug!(strategy = %CopyStrategy::Shallow, "copy");
        match self {
            Value::List(items) => Value::List(shared(items.borrow().clone())),
            Value::Object(object) => Value::Object(shared(object.borrow().clone())),
            other => other.clone(),
        }
    }

    /// Strict JSON round-trip.
    ///
    /// Fails with `CopyError::UnsupportedValue` at the first function,
    /// non-finite number or cycle. A record reachable twice without a cycle
    /// is copied twice: the copy no longer shares it between its two paths.
    pub fn deep_copy(&self) -> Result<Value, CopyError> {
        let json = self.to_json()?;
        let copy = round_trip(&json)?;
        debug!(strategy = %CopyStrategy::Deep, "copy");
        Ok(copy)
    }

    /// JSON round-trip that drops what JSON cannot carry, and says so.
    ///
    /// Object attributes holding functions are omitted; list entries holding
    /// functions and non-finite numbers anywhere become `null`. Cycles and a
    /// function at the root still fail, since neither has any JSON form.
    pub fn deep_copy_lossy(&self) -> Result<LossyCopy, CopyError> {
        let mut encoder = Encoder::new(true);
        let json = encoder.encode_root(self)?;
        let value = round_trip(&json)?;
        debug!(
            strategy = %CopyStrategy::Deep,
            losses = encoder.losses.len(),
            "lossy copy"
        );
        Ok(LossyCopy {
            value,
            losses: encoder.losses,
        })
    }

    /// Strict conversion to a JSON value.
    pub fn to_json(&self) -> Result<Json, CopyError> {
        Encoder::new(false).encode_root(self)
    }

    /// Build a fresh graph from JSON. Every list and object is newly allocated.
    pub fn from_json(json: &Json) -> Value {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::Text(s.clone()),
            Json::Array(items) => Value::list(items.iter().map(Value::from_json)),
            Json::Object(map) => {
                Value::object(map.iter().map(|(k, v)| (k.clone(), Value::from_json(v))))
            }
        }
    }

    /// Render in console format. Back-references print as `[Circular *N]`.
    pub fn inspect(&self, options: &InspectOptions) -> String {
        let mut builder = NodeBuilder {
            max_depth: options.depth,
            on_path: Vec::new(),
            circular: HashMap::new(),
        };
        inspect_node(&builder.build(self, 0), options)
    }
}

fn round_trip(json: &Json) -> Result<Value, CopyError> {
    let text = encode(json)?;
    let parsed: Json = decode(&text)?;
    Ok(Value::from_json(&parsed))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect(&InspectOptions::default()))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

// ── Lossy copy report ──────────────────────────────────────────────

/// What happened to a value that had no JSON form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossOutcome {
    /// The attribute is missing from the copy.
    Omitted,
    /// The entry is `null` in the copy.
    Nulled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loss {
    pub path: String,
    pub kind: UnsupportedKind,
    pub outcome: LossOutcome,
}

#[derive(Debug, Clone)]
pub struct LossyCopy {
    pub value: Value,
    pub losses: Vec<Loss>,
}

impl LossyCopy {
    pub fn is_lossless(&self) -> bool {
        self.losses.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Largest integer an `f64` holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

struct Encoder {
    lossy: bool,
    losses: Vec<Loss>,
    /// Lists and objects currently being encoded, root first.
    on_path: Vec<*const ()>,
}

impl Encoder {
    fn new(lossy: bool) -> Self {
        Self {
            lossy,
            losses: Vec::new(),
            on_path: Vec::new(),
        }
    }

    fn encode_root(&mut self, value: &Value) -> Result<Json, CopyError> {
        self.encode(value, "$")?
            .ok_or_else(|| CopyError::unsupported("$", UnsupportedKind::Function))
    }

    /// `Ok(None)` means a function: the caller decides between omit and null.
    fn encode(&mut self, value: &Value, path: &str) -> Result<Option<Json>, CopyError> {
        let json = match value {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            // Integral values encode without a fraction, as `22` not `22.0`.
            Value::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
                Json::Number((*n as i64).into())
            }
            Value::Number(n) => match serde_json::Number::from_f64(*n) {
                Some(number) => Json::Number(number),
                None => {
                    self.lose(path, UnsupportedKind::NonFiniteNumber, LossOutcome::Nulled)?;
                    Json::Null
                }
            },
            Value::Text(s) => Json::String(s.clone()),
            Value::Function(_) => return Ok(None),
            Value::List(items) => {
                self.enter(Rc::as_ptr(items) as *const (), path)?;
                let items = items.try_borrow().map_err(|_| borrowed(path))?;
                let mut out = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    let item_path = format!("{}[{}]", path, idx);
                    match self.encode(item, &item_path)? {
                        Some(json) => out.push(json),
                        None => {
                            self.lose(&item_path, UnsupportedKind::Function, LossOutcome::Nulled)?;
                            out.push(Json::Null);
                        }
                    }
                }
                self.on_path.pop();
                Json::Array(out)
            }
            Value::Object(object) => {
                self.enter(Rc::as_ptr(object) as *const (), path)?;
                let object = object.try_borrow().map_err(|_| borrowed(path))?;
                let mut out = Map::new();
                for (key, item) in object.iter() {
                    let item_path = child_path(path, key);
                    match self.encode(item, &item_path)? {
                        Some(json) => {
                            out.insert(key.to_string(), json);
                        }
                        None => {
                            self.lose(&item_path, UnsupportedKind::Function, LossOutcome::Omitted)?;
                        }
                    }
                }
                self.on_path.pop();
                Json::Object(out)
            }
        };
        Ok(Some(json))
    }

    fn enter(&mut self, handle: *const (), path: &str) -> Result<(), CopyError> {
        if self.on_path.contains(&handle) {
            return Err(CopyError::unsupported(path, UnsupportedKind::Cycle));
        }
        self.on_path.push(handle);
        Ok(())
    }

    fn lose(
        &mut self,
        path: &str,
        kind: UnsupportedKind,
        outcome: LossOutcome,
    ) -> Result<(), CopyError> {
        if !self.lossy {
            return Err(CopyError::unsupported(path, kind));
        }
        debug!(path, %kind, ?outcome, "value lost in deep copy");
        self.losses.push(Loss {
            path: path.to_string(),
            kind,
            outcome,
        });
        Ok(())
    }
}

fn borrowed(path: &str) -> CopyError {
    CopyError::Encode(serde_json::Error::custom(format!(
        "record at {} is mutably borrowed",
        path
    )))
}

// ---------------------------------------------------------------------------
// Render tree builder
// ---------------------------------------------------------------------------

struct NodeBuilder {
    max_depth: usize,
    on_path: Vec<*const ()>,
    /// Handle -> `*N` index, numbered in discovery order.
    circular: HashMap<*const (), usize>,
}

impl NodeBuilder {
    fn build(&mut self, value: &Value, depth: usize) -> Node {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(*b),
            Value::Number(n) => Node::Literal(format_number(*n)),
            Value::Text(s) => Node::Text(s.clone()),
            Value::Function(name) => Node::Function(name.clone()),
            Value::List(items) => {
                let handle = Rc::as_ptr(items) as *const ();
                if let Some(node) = self.back_reference(handle) {
                    return node;
                }
                let Ok(items) = items.try_borrow() else {
                    return Node::Literal("[Array <borrowed>]".to_string());
                };
                if !items.is_empty() && depth > self.max_depth {
                    return Node::Literal("[Array]".to_string());
                }
                self.on_path.push(handle);
                let built = items.iter().map(|item| self.build(item, depth + 1)).collect();
                self.on_path.pop();
                Node::List {
                    reference: self.circular.get(&handle).copied(),
                    items: built,
                }
            }
            Value::Object(object) => {
                let handle = Rc::as_ptr(object) as *const ();
                if let Some(node) = self.back_reference(handle) {
                    return node;
                }
                let Ok(object) = object.try_borrow() else {
                    return Node::Literal("[Object <borrowed>]".to_string());
                };
                if !object.is_empty() && depth > self.max_depth {
                    return Node::Literal("[Object]".to_string());
                }
                self.on_path.push(handle);
                let fields = object
                    .iter()
                    .map(|(key, item)| (key.to_string(), self.build(item, depth + 1)))
                    .collect();
                self.on_path.pop();
                Node::Object {
                    reference: self.circular.get(&handle).copied(),
                    fields,
                }
            }
        }
    }

    fn back_reference(&mut self, handle: *const ()) -> Option<Node> {
        if !self.on_path.contains(&handle) {
            return None;
        }
        let next = self.circular.len() + 1;
        let index = *self.circular.entry(handle).or_insert(next);
        Some(Node::Circular(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn josh() -> Value {
        Value::object([
            ("name", Value::from("josh")),
            ("age", Value::from(30)),
            (
                "occupation",
                Value::object([
                    (
                        "title",
                        Value::from("Senior Analytics Implementation Consultant II"),
                    ),
                    ("company", Value::from("Blast Analytics")),
                ]),
            ),
        ])
    }

    fn title(record: &Value) -> String {
        record
            .get_path(&["occupation", "title"])
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    #[test]
    fn share_sees_every_mutation() {
        let original = josh();
        let alias = original.share();
        alias.set("age", Value::from(31));
        assert_eq!(original.get("age"), Some(Value::from(31)));
        assert!(alias.same_handle(&original));
    }

    #[test]
    fn shallow_copy_aliases_nested_objects() {
        let original = josh();
        let copy = original.shallow_copy();
        assert!(copy.set_path(&["occupation", "title"], Value::from("Analytics Strategist")));
        copy.set("name", Value::from("joshua"));

        assert_eq!(title(&original), "Analytics Strategist");
        assert_eq!(title(&copy), "Analytics Strategist");
        assert_eq!(original.get("name"), Some(Value::from("josh")));
        assert!(!copy.same_handle(&original));
    }

    #[test]
    fn deep_copy_isolates_nested_objects() {
        let original = josh();
        let copy = original.deep_copy().unwrap();
        copy.set_path(&["occupation", "title"], Value::from("Software Developer"));

        assert_eq!(title(&original), "Senior Analytics Implementation Consultant II");
        assert_eq!(title(&copy), "Software Developer");
        let (a, b) = (
            original.get("occupation").unwrap(),
            copy.get("occupation").unwrap(),
        );
        assert!(!a.same_handle(&b));
    }

    #[test]
    fn deep_copy_preserves_representable_structure() {
        let original = Value::object([
            ("name", Value::from("ada")),
            ("ratio", Value::from(0.25)),
            ("active", Value::from(true)),
            ("nothing", Value::Null),
            ("tags", Value::list([Value::from("a"), Value::from(2)])),
            ("nested", Value::object([("deeper", Value::list([]))])),
        ]);
        let copy = original.deep_copy().unwrap();
        assert_eq!(copy, original);
        assert_eq!(copy.get("ratio").and_then(|v| v.as_f64()), Some(0.25));
        assert!(!copy
            .get("tags")
            .unwrap()
            .same_handle(&original.get("tags").unwrap()));
    }

    #[test]
    fn deep_copy_splits_a_record_reachable_twice() {
        let shared_record = Value::object([("n", Value::from(1))]);
        let original = Value::object([("a", shared_record.share()), ("b", shared_record)]);
        let copy = original.deep_copy().unwrap();
        let (a, b) = (copy.get("a").unwrap(), copy.get("b").unwrap());
        assert_eq!(a, b);
        assert!(!a.same_handle(&b));
    }

    #[test]
    fn strict_copy_rejects_function() {
        let record = Value::object([("greet", Value::function("greet"))]);
        match record.deep_copy() {
            Err(CopyError::UnsupportedValue { path, kind }) => {
                assert_eq!(path, "$.greet");
                assert_eq!(kind, UnsupportedKind::Function);
            }
            other => panic!("Expected UnsupportedValue, got: {:?}", other),
        }
    }

    #[test]
    fn strict_copy_rejects_non_finite_numbers() {
        let record = Value::object([(
            "scores",
            Value::list([Value::from(1.0), Value::from(f64::INFINITY)]),
        )]);
        match record.deep_copy() {
            Err(CopyError::UnsupportedValue { path, kind }) => {
                assert_eq!(path, "$.scores[1]");
                assert_eq!(kind, UnsupportedKind::NonFiniteNumber);
            }
            other => panic!("Expected UnsupportedValue, got: {:?}", other),
        }
    }

    #[test]
    fn strict_copy_rejects_cycles() {
        let record = Value::object([("name", Value::from("loop"))]);
        record.set("self", record.share());
        match record.deep_copy() {
            Err(CopyError::UnsupportedValue { path, kind }) => {
                assert_eq!(path, "$.self");
                assert_eq!(kind, UnsupportedKind::Cycle);
            }
            other => panic!("Expected UnsupportedValue, got: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn strict_copy_quotes_non_identifier_keys_in_path() {
        let record = Value::object([("first name", Value::function("f"))]);
        let err = record.deep_copy().unwrap_err();
        assert_eq!(err.to_string(), "unsupported value at $[\"first name\"]: function");
    }

    #[test]
    fn function_at_root_fails_in_both_modes() {
        let f = Value::function("main");
        assert!(matches!(
            f.deep_copy(),
            Err(CopyError::UnsupportedValue { .. })
        ));
        assert!(matches!(
            f.deep_copy_lossy(),
            Err(CopyError::UnsupportedValue { .. })
        ));
    }

    #[test]
    fn lossy_copy_reports_every_loss() {
        let record = Value::object([
            ("name", Value::from("ada")),
            ("greet", Value::function("greet")),
            ("score", Value::from(f64::NAN)),
            ("tags", Value::list([Value::function("f"), Value::from(1)])),
        ]);
        let copy = record.deep_copy_lossy().unwrap();

        let expected = Value::object([
            ("name", Value::from("ada")),
            ("score", Value::Null),
            ("tags", Value::list([Value::Null, Value::from(1)])),
        ]);
        assert_eq!(copy.value, expected);
        assert!(!copy.is_lossless());
        assert_eq!(
            copy.losses,
            vec![
                Loss {
                    path: "$.greet".to_string(),
                    kind: UnsupportedKind::Function,
                    outcome: LossOutcome::Omitted,
                },
                Loss {
                    path: "$.score".to_string(),
                    kind: UnsupportedKind::NonFiniteNumber,
                    outcome: LossOutcome::Nulled,
                },
                Loss {
                    path: "$.tags[0]".to_string(),
                    kind: UnsupportedKind::Function,
                    outcome: LossOutcome::Nulled,
                },
            ]
        );
    }

    #[test]
    fn lossy_copy_of_plain_record_is_lossless() {
        let copy = josh().deep_copy_lossy().unwrap();
        assert!(copy.is_lossless());
        assert_eq!(copy.value, josh());
    }

    #[test]
    fn lossy_copy_still_rejects_cycles() {
        let items = Value::list([Value::from(1)]);
        items.as_list().unwrap().borrow_mut().push(items.share());
        match items.deep_copy_lossy() {
            Err(CopyError::UnsupportedValue { path, kind }) => {
                assert_eq!(path, "$[1]");
                assert_eq!(kind, UnsupportedKind::Cycle);
            }
            other => panic!("Expected UnsupportedValue, got: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn inspect_marks_circular_references() {
        let record = Value::object([("name", Value::from("loop"))]);
        record.set("self", record.share());
        assert_eq!(record.to_string(), "<ref *1> { name: 'loop', self: [Circular *1] }");
    }

    #[test]
    fn inspect_shows_unrepresentable_values_as_is() {
        let record = Value::object([
            ("greet", Value::function("greet")),
            ("score", Value::from(f64::NAN)),
        ]);
        assert_eq!(record.to_string(), "{ greet: [Function: greet], score: NaN }");
    }

    #[test]
    fn inspect_matches_typed_rendering() {
        let typed = crate::domain::Employee::new(
            "josh",
            30,
            crate::domain::Occupation::new(
                "Senior Analytics Implementation Consultant II",
                "Blast Analytics",
            ),
        );
        assert_eq!(josh().to_string(), typed.to_string());
    }

    #[test]
    fn set_on_non_object_is_refused() {
        assert!(!Value::from(1).set("a", Value::Null));
        assert!(!josh().set_path(&[], Value::Null));
        assert!(!josh().set_path(&["missing", "title"], Value::Null));
    }

    #[test]
    fn object_set_keeps_insertion_order() {
        let mut object: Object = [("a", Value::from(1)), ("b", Value::from(2))]
            .into_iter()
            .collect();
        object.set("a", Value::from(3));
        object.set("c", Value::from(4));
        let keys: Vec<&str> = object.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(object.remove("b"), Some(Value::from(2)));
        assert_eq!(object.len(), 2);
    }
}
