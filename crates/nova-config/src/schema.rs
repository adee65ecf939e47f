use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::ReflectConfig;

/// JSON schema for `nova-reflect.toml`.
#[must_use]
pub fn json_schema() -> RootSchema {
    schema_for!(ReflectConfig)
}

/// The schema rendered as a JSON value, for editor tooling.
pub fn json_schema_value() -> serde_json::Value {
    // A `RootSchema` is plain data; serialization cannot fail.
    serde_json::to_value(json_schema()).unwrap_or(serde_json::Value::Null)
}
