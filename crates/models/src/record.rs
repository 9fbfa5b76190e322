use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

/// A persisted record as seen by repositories.
///
/// Records round-trip through JSON so changesets can be applied without
/// knowing the concrete type.
pub trait Record: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn primary_key(&self) -> Uuid;

    /// Field map used for clause matching.
    fn fields(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}
