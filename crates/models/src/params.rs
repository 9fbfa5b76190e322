use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller input, keyed by field name.
pub type Params = serde_json::Map<String, Value>;

/// Reads a string parameter; non-string values count as absent.
pub fn param_str<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

/// Field used to match a login identifier during authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoginField(&'static str);

impl LoginField {
    pub const EMAIL: LoginField = LoginField("email");
    pub const USERNAME: LoginField = LoginField("username");

    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for LoginField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Field/value equality constraints for a lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clauses(BTreeMap<String, Value>);

impl Clauses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality constraint, replacing any previous one on `field`.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// True when every constraint equals the matching field of `fields`.
    /// A missing field only satisfies a `null` constraint.
    pub fn matches(&self, fields: &serde_json::Map<String, Value>) -> bool {
        self.iter()
            .all(|(field, expected)| fields.get(field).unwrap_or(&Value::Null) == expected)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Clauses {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
