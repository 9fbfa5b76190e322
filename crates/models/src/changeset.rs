//! Changesets: proposed field changes to a record plus per-field errors.
//!
//! Changes are kept as JSON values keyed by the record's serialized field
//! names, so `apply_changes` works for any [`Record`](crate::Record).

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::errors::ModelError;
use crate::params::Params;

/// Persistence action a changeset was submitted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Changeset<U> {
    data: U,
    changes: Map<String, Value>,
    errors: BTreeMap<String, Vec<String>>,
    action: Option<Action>,
}

impl<U> Changeset<U> {
    pub fn new(data: U) -> Self {
        Self { data, changes: Map::new(), errors: BTreeMap::new(), action: None }
    }

    pub fn data(&self) -> &U {
        &self.data
    }

    pub fn into_data(self) -> U {
        self.data
    }

    pub fn changes(&self) -> &Map<String, Value> {
        &self.changes
    }

    pub fn get_change(&self, field: &str) -> Option<&Value> {
        self.changes.get(field)
    }

    pub fn put_change(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.changes.insert(field.into(), value.into());
    }

    pub fn delete_change(&mut self, field: &str) -> Option<Value> {
        self.changes.remove(field)
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(field.into()).or_default().push(message.into());
    }

    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    pub fn errors_on(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn action(&self) -> Option<Action> {
        self.action
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// `field: message; ...` rendering of every error, for logs.
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{field}: {m}")))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl<U: Serialize + DeserializeOwned> Changeset<U> {
    /// Builds a changeset from `params`, keeping only `permitted` keys whose
    /// value differs from the current one.
    ///
    /// A value the record cannot hold (wrong JSON type, `null` for a
    /// non-optional field) is not kept; the field gets `"is invalid"`.
    pub fn cast(data: U, params: &Params, permitted: &[&str]) -> Self {
        let current = serde_json::to_value(&data).ok();
        let mut changeset = Self::new(data);
        for field in permitted {
            let Some(value) = params.get(*field) else { continue };
            let unchanged = current
                .as_ref()
                .and_then(|c| c.get(*field))
                .is_some_and(|existing| existing == value);
            if unchanged {
                continue;
            }
            if Self::accepts(current.as_ref(), field, value) {
                changeset.put_change(*field, value.clone());
            } else {
                changeset.add_error(*field, "is invalid");
            }
        }
        changeset
    }

    /// Whether the record still deserializes with `field` set to `value`.
    fn accepts(current: Option<&Value>, field: &str, value: &Value) -> bool {
        let Some(Value::Object(fields)) = current else { return false };
        let mut fields = fields.clone();
        fields.insert(field.to_string(), value.clone());
        serde_json::from_value::<U>(Value::Object(fields)).is_ok()
    }

    /// Current value of `field`: the pending change if any, else the data.
    pub fn get_field(&self, field: &str) -> Option<Value> {
        if let Some(value) = self.changes.get(field) {
            return Some(value.clone());
        }
        serde_json::to_value(&self.data).ok().and_then(|v| v.get(field).cloned())
    }

    /// Adds `"can't be blank"` for each field that is null or empty after changes.
    pub fn validate_required(&mut self, fields: &[&str]) {
        for field in fields {
            let blank = match self.get_field(field) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            };
            if blank && self.errors_on(field).is_empty() {
                self.add_error(*field, "can't be blank");
            }
        }
    }

    /// Length bounds on a string change; absent changes are not checked.
    pub fn validate_length(&mut self, field: &str, min: Option<usize>, max: Option<usize>) {
        let Some(Value::String(s)) = self.changes.get(field) else { return };
        let len = s.chars().count();
        if let Some(min) = min.filter(|min| len < *min) {
            self.add_error(field, format!("should be at least {min} character(s)"));
        } else if let Some(max) = max.filter(|max| len > *max) {
            self.add_error(field, format!("should be at most {max} character(s)"));
        }
    }

    /// Merges `changes` over the serialized data and deserializes the result.
    pub fn apply_changes(&self) -> Result<U, ModelError> {
        let mut value = serde_json::to_value(&self.data)?;
        if let Value::Object(fields) = &mut value {
            for (field, change) in &self.changes {
                fields.insert(field.clone(), change.clone());
            }
        }
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Account {
        email: String,
        name: String,
    }

    fn account() -> Account {
        Account { email: "a@b.com".into(), name: "A".into() }
    }

    fn params(v: Value) -> Params {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn cast_skips_unpermitted_and_unchanged() {
        let cs = Changeset::cast(
            account(),
            &params(json!({"email": "a@b.com", "name": "B", "admin": true})),
            &["email", "name"],
        );
        assert_eq!(cs.changes().len(), 1);
        assert_eq!(cs.get_change("name"), Some(&json!("B")));
        assert!(cs.is_valid());
    }

    #[test]
    fn cast_rejects_values_of_the_wrong_type() {
        let cs = Changeset::cast(account(), &params(json!({"email": 42, "name": null})), &["email", "name"]);
        assert!(cs.changes().is_empty());
        assert_eq!(cs.errors_on("email"), ["is invalid".to_string()]);
        assert_eq!(cs.errors_on("name"), ["is invalid".to_string()]);
        assert!(cs.apply_changes().is_ok());
    }

    #[test]
    fn apply_changes_overlays_data() {
        let cs = Changeset::cast(account(), &params(json!({"name": "B"})), &["name"]);
        let applied = cs.apply_changes().unwrap();
        assert_eq!(applied, Account { email: "a@b.com".into(), name: "B".into() });
        assert_eq!(cs.data(), &account());
    }

    #[test]
    fn validate_required_sees_changes_and_data() {
        let mut cs = Changeset::cast(account(), &params(json!({"name": "  "})), &["name"]);
        cs.validate_required(&["email", "name"]);
        assert!(cs.errors_on("email").is_empty());
        assert_eq!(cs.errors_on("name"), ["can't be blank".to_string()]);
        assert!(!cs.is_valid());
    }

    #[test]
    fn validate_length_reports_bounds() {
        let mut cs = Changeset::cast(account(), &params(json!({"name": "abc"})), &["name"]);
        cs.validate_length("name", Some(5), None);
        assert_eq!(cs.error_summary(), "name: should be at least 5 character(s)");
    }
}
