//! Named transform functions.
//!
//! A vertex is bound to one [`Transform`] at construction: a two-part
//! `module:function` reference plus the function it resolves to. The data
//! task calls it exactly once per incoming payload and relays the result.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::{Error, Result};

/// Validated `module:function` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransformRef {
    module: String,
    function: String,
}

impl TransformRef {
    /// The only way to build a reference, so every `TransformRef` is valid.
    pub fn new(module: impl Into<String>, function: impl Into<String>) -> Result<Self> {
        let module = module.into();
        let function = function.into();
        for part in [&module, &function] {
            if !is_identifier(part) {
                return Err(Error::InvalidTransform(format!("{}:{}", module, function)));
            }
        }
        Ok(Self { module, function })
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn function(&self) -> &str {
        &self.function
    }
}

fn is_identifier(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

impl fmt::Display for TransformRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.function)
    }
}

impl FromStr for TransformRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((module, function)) => Self::new(module, function),
            None => Err(Error::InvalidTransform(s.to_string())),
        }
    }
}

pub type TransformFn = dyn Fn(Value) -> Result<Value> + Send + Sync;

/// A resolved transform: its reference and the callable behind it.
#[derive(Clone)]
pub struct Transform {
    reference: TransformRef,
    func: Arc<TransformFn>,
}

impl Transform {
    pub fn new<F>(reference: TransformRef, func: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            reference,
            func: Arc::new(func),
        }
    }

    pub fn reference(&self) -> &TransformRef {
        &self.reference
    }

    /// Run the transform on one payload.
    pub fn invoke(&self, payload: Value) -> Result<Value> {
        (self.func)(payload)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Transform").field(&self.reference.to_string()).finish()
    }
}

/// Lookup table from references to transforms.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: HashMap<TransformRef, Transform>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with `core:identity`, `math:double`,
    /// `math:increment` and `math:square`.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let builtins: [(&str, &str, fn(Value) -> Result<Value>); 4] = [
            ("core", "identity", Ok),
            ("math", "double", |v| integer_op("math:double", v, |n| n.checked_mul(2), |f| f * 2.0)),
            ("math", "increment", |v| integer_op("math:increment", v, |n| n.checked_add(1), |f| f + 1.0)),
            ("math", "square", |v| integer_op("math:square", v, |n| n.checked_mul(n), |f| f * f)),
        ];
        for (module, function, func) in builtins {
            // Builtin names are static and well-formed.
            if let Ok(reference) = TransformRef::new(module, function) {
                registry.register(Transform::new(reference, func));
            }
        }
        registry
    }

    /// Add or replace a transform under its own reference.
    pub fn register(&mut self, transform: Transform) {
        self.entries.insert(transform.reference().clone(), transform);
    }

    pub fn get(&self, reference: &TransformRef) -> Option<&Transform> {
        self.entries.get(reference)
    }

    /// Parse `module:function` and look it up.
    pub fn resolve(&self, name: &str) -> Result<Transform> {
        let reference: TransformRef = name.parse()?;
        self.get(&reference)
            .cloned()
            .ok_or_else(|| Error::UnknownTransform(reference.to_string()))
    }

    /// Registered references, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().map(|r| r.to_string()).collect();
        names.sort();
        names
    }
}

fn integer_op(
    name: &str,
    value: Value,
    int: impl Fn(i64) -> Option<i64>,
    float: impl Fn(f64) -> f64,
) -> Result<Value> {
    if let Some(n) = value.as_i64() {
        return int(n)
            .map(|r| json!(r))
            .ok_or_else(|| Error::Transform(format!("{} overflowed on {}", name, n)));
    }
    if let Some(n) = value.as_u64() {
        return Err(Error::Transform(format!("{} overflowed on {}", name, n)));
    }
    if let Some(f) = value.as_f64() {
        let r = float(f);
        if !r.is_finite() {
            return Err(Error::Transform(format!("{} overflowed on {}", name, f)));
        }
        return Ok(json!(r));
    }
    Err(Error::Transform(format!("{} expects a number, got {}", name, value)))
}
